use crate::utils::parse_date;
use chrono::Datelike;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One-based calendar month slot, 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodIndex {
    month: u32,
}

impl PeriodIndex {
    pub fn new(month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { month })
        } else {
            None
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn quarter(&self) -> u32 {
        (self.month - 1) / 3 + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketMode {
    /// The date's calendar year must equal the target year.
    CalendarMatch,
    /// Calendar match, restricted to months up to and including the cutoff.
    CumulativeUpTo(u32),
}

/// Target year filter; carried on the wire as the plain string the
/// presentation layer sends ("All" or "2023").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportYear {
    All,
    Year(i32),
}

impl ReportYear {
    pub fn label(&self) -> String {
        match self {
            ReportYear::All => "All".to_string(),
            ReportYear::Year(y) => y.to_string(),
        }
    }
}

impl Serialize for ReportYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for ReportYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Ok(ReportYear::All);
        }
        raw.parse::<i32>().map(ReportYear::Year).map_err(|_| {
            D::Error::custom(format!("expected \"All\" or a year, got '{}'", raw))
        })
    }
}

/// Where a dated amount lands for a given target year.
///
/// `AnnualOnly` carries the "All periods" sentinel: the amount counts
/// toward annual-cumulative totals but produces no monthly detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Month(PeriodIndex),
    AnnualOnly,
    OutOfScope,
}

/// Resolves an optional date string against the target year. Missing or
/// malformed dates always resolve to `OutOfScope`, never an error.
pub fn bucket(date: Option<&str>, year: ReportYear, mode: BucketMode) -> Bucket {
    let parsed = match parse_date(date) {
        Some(d) => d,
        None => return Bucket::OutOfScope,
    };

    let target = match year {
        ReportYear::All => return Bucket::AnnualOnly,
        ReportYear::Year(y) => y,
    };

    if parsed.year() != target {
        return Bucket::OutOfScope;
    }

    let month = parsed.month();
    if let BucketMode::CumulativeUpTo(cutoff) = mode {
        if month > cutoff {
            return Bucket::OutOfScope;
        }
    }

    match PeriodIndex::new(month) {
        Some(index) => Bucket::Month(index),
        None => Bucket::OutOfScope,
    }
}

/// Resolves a bare month number (the `obligationMonth` style of input,
/// used when a record carries a month instead of a full date). The
/// month is taken to belong to the target year.
pub fn bucket_month(month: Option<u32>, year: ReportYear, mode: BucketMode) -> Bucket {
    let index = match month.and_then(PeriodIndex::new) {
        Some(index) => index,
        None => return Bucket::OutOfScope,
    };

    if year == ReportYear::All {
        return Bucket::AnnualOnly;
    }

    if let BucketMode::CumulativeUpTo(cutoff) = mode {
        if index.month() > cutoff {
            return Bucket::OutOfScope;
        }
    }

    Bucket::Month(index)
}

/// Twelve month slots. Quarter and annual sums are computed accessors,
/// so `quarter(q) == sum of its months` and `total() == sum of quarters`
/// hold for every counter ever constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PeriodCounter {
    months: [f64; 12],
}

impl PeriodCounter {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn with_month(index: PeriodIndex, amount: f64) -> Self {
        let mut months = [0.0; 12];
        months[(index.month() - 1) as usize] = amount;
        Self { months }
    }

    /// Field-by-field sum, returning a new counter.
    pub fn add(&self, other: &Self) -> Self {
        let mut months = [0.0; 12];
        for (slot, (a, b)) in months
            .iter_mut()
            .zip(self.months.iter().zip(other.months.iter()))
        {
            *slot = a + b;
        }
        Self { months }
    }

    /// One-based month lookup; out-of-range reads as zero.
    pub fn month(&self, month: u32) -> f64 {
        if (1..=12).contains(&month) {
            self.months[(month - 1) as usize]
        } else {
            0.0
        }
    }

    pub fn quarter(&self, quarter: u32) -> f64 {
        if !(1..=4).contains(&quarter) {
            return 0.0;
        }
        let start = (quarter - 1) * 3 + 1;
        (start..start + 3).map(|m| self.month(m)).sum()
    }

    pub fn total(&self) -> f64 {
        (1..=4).map(|q| self.quarter(q)).sum()
    }

    pub fn semestral(&self) -> f64 {
        self.quarter(1) + self.quarter(2)
    }

    pub fn as_of_september(&self) -> f64 {
        self.semestral() + self.quarter(3)
    }

    pub fn total_excluding_december(&self) -> f64 {
        self.total() - self.month(12)
    }

    pub fn is_zero(&self) -> bool {
        self.months.iter().all(|m| *m == 0.0)
    }
}

/// Parallel target/actual counters for one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BarItem {
    pub target: PeriodCounter,
    pub actual: PeriodCounter,
}

impl BarItem {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            target: self.target.add(&other.target),
            actual: self.actual.add(&other.actual),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(pairs: &[(u32, f64)]) -> PeriodCounter {
        pairs.iter().fold(PeriodCounter::zero(), |acc, (m, v)| {
            acc.add(&PeriodCounter::with_month(PeriodIndex::new(*m).unwrap(), *v))
        })
    }

    #[test]
    fn test_bucket_calendar_match() {
        let b = bucket(Some("2023-03-15"), ReportYear::Year(2023), BucketMode::CalendarMatch);
        match b {
            Bucket::Month(index) => {
                assert_eq!(index.month(), 3);
                assert_eq!(index.quarter(), 1);
            }
            _ => panic!("expected a month bucket, got {:?}", b),
        }

        assert_eq!(
            bucket(Some("2022-03-15"), ReportYear::Year(2023), BucketMode::CalendarMatch),
            Bucket::OutOfScope
        );
    }

    #[test]
    fn test_bucket_bad_dates_are_out_of_scope() {
        assert_eq!(
            bucket(None, ReportYear::Year(2023), BucketMode::CalendarMatch),
            Bucket::OutOfScope
        );
        assert_eq!(
            bucket(Some(""), ReportYear::Year(2023), BucketMode::CalendarMatch),
            Bucket::OutOfScope
        );
        assert_eq!(
            bucket(Some("garbage"), ReportYear::Year(2023), BucketMode::CalendarMatch),
            Bucket::OutOfScope
        );
    }

    #[test]
    fn test_bucket_all_years_is_annual_only() {
        assert_eq!(
            bucket(Some("2019-07-01"), ReportYear::All, BucketMode::CalendarMatch),
            Bucket::AnnualOnly
        );
        assert_eq!(
            bucket(Some("bad"), ReportYear::All, BucketMode::CalendarMatch),
            Bucket::OutOfScope
        );
    }

    #[test]
    fn test_bucket_cumulative_cutoff() {
        assert!(matches!(
            bucket(Some("2023-06-30"), ReportYear::Year(2023), BucketMode::CumulativeUpTo(6)),
            Bucket::Month(_)
        ));
        assert_eq!(
            bucket(Some("2023-07-01"), ReportYear::Year(2023), BucketMode::CumulativeUpTo(6)),
            Bucket::OutOfScope
        );
    }

    #[test]
    fn test_bucket_month_fallback() {
        assert!(matches!(
            bucket_month(Some(5), ReportYear::Year(2023), BucketMode::CalendarMatch),
            Bucket::Month(_)
        ));
        assert_eq!(
            bucket_month(Some(5), ReportYear::All, BucketMode::CalendarMatch),
            Bucket::AnnualOnly
        );
        assert_eq!(
            bucket_month(Some(13), ReportYear::Year(2023), BucketMode::CalendarMatch),
            Bucket::OutOfScope
        );
        assert_eq!(
            bucket_month(None, ReportYear::Year(2023), BucketMode::CalendarMatch),
            Bucket::OutOfScope
        );
        assert_eq!(
            bucket_month(Some(9), ReportYear::Year(2023), BucketMode::CumulativeUpTo(6)),
            Bucket::OutOfScope
        );
    }

    #[test]
    fn test_report_year_serde() {
        assert_eq!(
            serde_json::to_string(&ReportYear::Year(2023)).unwrap(),
            "\"2023\""
        );
        assert_eq!(serde_json::to_string(&ReportYear::All).unwrap(), "\"All\"");

        let year: ReportYear = serde_json::from_str("\"2023\"").unwrap();
        assert_eq!(year, ReportYear::Year(2023));
        let all: ReportYear = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, ReportYear::All);
        assert!(serde_json::from_str::<ReportYear>("\"soon\"").is_err());
    }

    #[test]
    fn test_quarter_identities() {
        let c = counter(&[(1, 1.0), (2, 2.0), (3, 3.0), (5, 4.0), (10, 7.0), (12, 1.0)]);
        assert_eq!(c.quarter(1), c.month(1) + c.month(2) + c.month(3));
        assert_eq!(c.quarter(2), c.month(4) + c.month(5) + c.month(6));
        assert_eq!(c.quarter(4), c.month(10) + c.month(11) + c.month(12));
        assert_eq!(c.total(), c.quarter(1) + c.quarter(2) + c.quarter(3) + c.quarter(4));
    }

    #[test]
    fn test_derived_rollups() {
        let c = counter(&[(2, 5.0), (4, 1.0), (8, 2.0), (12, 3.0)]);
        assert_eq!(c.semestral(), 6.0);
        assert_eq!(c.as_of_september(), 8.0);
        assert_eq!(c.total_excluding_december(), 8.0);
        assert_eq!(c.total(), 11.0);
    }

    #[test]
    fn test_add_preserves_identities() {
        let a = counter(&[(1, 1.0), (6, 2.0)]);
        let b = counter(&[(1, 0.5), (12, 4.0)]);
        let sum = a.add(&b);
        assert_eq!(sum.month(1), 1.5);
        assert_eq!(sum.total(), a.total() + b.total());
        assert_eq!(sum.quarter(4), 4.0);
    }

    #[test]
    fn test_period_index_bounds() {
        assert!(PeriodIndex::new(0).is_none());
        assert!(PeriodIndex::new(13).is_none());
        assert_eq!(PeriodIndex::new(12).unwrap().quarter(), 4);
    }
}
