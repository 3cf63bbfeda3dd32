use crate::classify::{classify, package_display_order, Classification, Component};
use crate::hierarchy::{Measures, ReportTree, TreeBuilder};
use crate::normalize::{merge_key, normalize_quantity};
use crate::object_codes::{CodeReference, ObjectType};
use crate::period::{bucket, bucket_month, Bucket, BucketMode, PeriodCounter};
use crate::schema::{ProgramRecord, RecordSet, ReportFilters};
use crate::utils::natural_cmp;
use log::debug;
use serde::{Deserialize, Serialize};

/// A record excluded from every total because its component tag matched
/// nothing. Surfaced rather than silently swallowed so callers can
/// treat it as a data-quality signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRecord {
    pub kind: String,
    pub indicator: String,
    pub component_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub tree: ReportTree,
    pub dropped: Vec<DroppedRecord>,
}

/// Pure transformation from a record snapshot to a rolled-up hierarchy.
/// One instance per (filters, reference) pair; every build allocates a
/// fresh tree.
pub struct ReportEngine<'a> {
    filters: &'a ReportFilters,
    reference: &'a CodeReference,
    mode: BucketMode,
}

impl<'a> ReportEngine<'a> {
    pub fn new(filters: &'a ReportFilters, reference: &'a CodeReference) -> Self {
        Self {
            filters,
            reference,
            mode: BucketMode::CalendarMatch,
        }
    }

    /// Switches temporal bucketing to the cumulative "up to and
    /// including" policy for as-of report builds.
    pub fn with_mode(mut self, mode: BucketMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn build_component_tree(&self, records: &RecordSet) -> ReportOutcome {
        let mut builder = TreeBuilder::new();
        for component in Component::ALL {
            builder.ensure_group(component.label(), component.order());
        }

        let mut dropped = Vec::new();
        for record in records.all_records() {
            if !self.admit(&record) {
                continue;
            }
            match classify(&record) {
                Classification::Placed(path) => {
                    let measures = self.derive_measures(&record);
                    builder.accumulate(
                        path.component.label(),
                        path.component.order(),
                        &path.package,
                        &merge_key(record.indicator()),
                        &measures,
                    );
                }
                Classification::Dropped => dropped.push(drop_record(&record)),
            }
        }

        debug!(
            "component tree built from {} records, {} dropped",
            records.len(),
            dropped.len()
        );

        ReportOutcome {
            tree: builder.finalize(package_display_order),
            dropped,
        }
    }

    /// Geographic rollup: province -> municipality -> indicator, with
    /// location names pushed through the same merge-key normalization
    /// so case variants of one place aggregate together.
    pub fn build_geographic_tree(&self, records: &RecordSet) -> ReportOutcome {
        let mut builder = TreeBuilder::new();
        let mut dropped = Vec::new();

        for record in records.all_records() {
            if !self.admit(&record) {
                continue;
            }
            match classify(&record) {
                Classification::Placed(_) => {
                    let measures = self.derive_measures(&record);
                    let province = location_key(record.province());
                    let municipality = location_key(record.municipality());
                    builder.accumulate(
                        &province,
                        0,
                        &municipality,
                        &merge_key(record.indicator()),
                        &measures,
                    );
                }
                Classification::Dropped => dropped.push(drop_record(&record)),
            }
        }

        debug!(
            "geographic tree built from {} records, {} dropped",
            records.len(),
            dropped.len()
        );

        ReportOutcome {
            tree: builder.finalize(|_, a, b| natural_cmp(a, b)),
            dropped,
        }
    }

    fn admit(&self, record: &ProgramRecord) -> bool {
        matches_filter(self.filters.operating_unit.as_deref(), record.operating_unit())
            && matches_filter(self.filters.fund_type.as_deref(), record.fund_type())
            && matches_filter(self.filters.tier.as_deref(), record.tier())
    }

    /// Folds one record into its measure set: one physical unit per
    /// record against the target/actual dates, each detail line against
    /// its own date (record target date as fallback), and the full
    /// record cost against the obligation/disbursement dates.
    fn derive_measures(&self, record: &ProgramRecord) -> Measures {
        let year = self.filters.year;
        let mut m = Measures::zero();

        let target = bucket(record.target_date(), year, self.mode);
        let (counter, annual) = apply_bucket(&m.output.target, target, 1.0);
        m.output.target = counter;
        m.output_totals.target += annual;

        let actual = bucket(record.actual_date(), year, self.mode);
        let (counter, annual) = apply_bucket(&m.output.actual, actual, 1.0);
        m.output.actual = counter;
        m.output_totals.actual += annual;

        for line in record.details() {
            let amount = line.line_amount();
            let line_date = line.date.as_deref().or_else(|| record.target_date());
            let line_bucket = bucket(line_date, year, self.mode);
            if line_bucket == Bucket::OutOfScope {
                continue;
            }

            let (counter, annual) = apply_bucket(&m.cost, line_bucket, amount);
            m.cost = counter;
            m.flow.cost += annual;

            match line
                .object_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
            {
                Some(code) => {
                    match self.reference.resolve(code).object_type {
                        ObjectType::Mooe => m.split.mooe += amount,
                        ObjectType::Co => m.split.co += amount,
                    }
                    *m.by_code.entry(code.to_string()).or_insert(0.0) += amount;
                }
                None => m.split.mooe += amount,
            }
        }

        let total_cost = record.total_cost();

        // a bare month number stands in when no full date is known
        let obligation = match record.obligation_date() {
            Some(date) => bucket(Some(date), year, self.mode),
            None => bucket_month(record.obligation_month(), year, self.mode),
        };
        let (counter, annual) = apply_bucket(&m.obligation, obligation, total_cost);
        m.obligation = counter;
        m.flow.obligation += annual;

        let disbursement = match record.disbursement_date() {
            Some(date) => bucket(Some(date), year, self.mode),
            None => bucket_month(record.disbursement_month(), year, self.mode),
        };
        let (counter, annual) = apply_bucket(&m.disbursement, disbursement, total_cost);
        m.disbursement = counter;
        m.flow.disbursement += annual;

        if self.record_in_scope(record) {
            if let ProgramRecord::Training(t) = record {
                m.participants += t.participants.unwrap_or(0.0);
            }
            if let ProgramRecord::Subproject(s) = record {
                if let Some(qty) = s.quantity {
                    let normalized = normalize_quantity(qty, s.unit.as_deref());
                    m.quantity += normalized.qty;
                    m.units.insert(normalized.unit);
                }
            }
        }

        m
    }

    fn record_in_scope(&self, record: &ProgramRecord) -> bool {
        bucket(record.target_date(), self.filters.year, self.mode) != Bucket::OutOfScope
            || bucket(record.actual_date(), self.filters.year, self.mode) != Bucket::OutOfScope
    }
}

fn apply_bucket(counter: &PeriodCounter, b: Bucket, amount: f64) -> (PeriodCounter, f64) {
    match b {
        Bucket::Month(index) => (
            counter.add(&PeriodCounter::with_month(index, amount)),
            amount,
        ),
        Bucket::AnnualOnly => (*counter, amount),
        Bucket::OutOfScope => (*counter, 0.0),
    }
}

fn matches_filter(wanted: Option<&str>, found: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(w) => found
            .map(|f| f.trim().eq_ignore_ascii_case(w.trim()))
            .unwrap_or(false),
    }
}

fn location_key(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => merge_key(name),
        None => "Unspecified".to_string(),
    }
}

fn drop_record(record: &ProgramRecord) -> DroppedRecord {
    DroppedRecord {
        kind: record.kind_label().to_string(),
        indicator: record.indicator().to_string(),
        component_tag: record.component_tag().unwrap_or("").to_string(),
    }
}
