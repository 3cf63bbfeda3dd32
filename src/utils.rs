use chrono::NaiveDate;
use std::cmp::Ordering;

/// Parses an optional `YYYY-MM-DD` date string. Absent, blank, or
/// malformed input is data, not an error, and resolves to `None`.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn month_label(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "",
    }
}

pub fn quarter_label(quarter: u32) -> &'static str {
    match quarter {
        1 => "Q1",
        2 => "Q2",
        3 => "Q3",
        4 => "Q4",
        _ => "",
    }
}

/// Numeric-aware lexicographic comparison, so "Package 2" sorts before
/// "Package 10". Case-insensitive on the alphabetic runs.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ac), Some(bc)) => {
                if ac.is_ascii_digit() && bc.is_ascii_digit() {
                    let a_run = take_digits(&mut a_chars);
                    let b_run = take_digits(&mut b_chars);
                    match compare_digit_runs(&a_run, &b_run) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }

                let a_low = ac.to_ascii_lowercase();
                let b_low = bc.to_ascii_lowercase();
                if a_low != b_low {
                    return a_low.cmp(&b_low);
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek() {
        if c.is_ascii_digit() {
            run.push(*c);
            chars.next();
        } else {
            break;
        }
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    match a_trim.len().cmp(&b_trim.len()) {
        Ordering::Equal => a_trim.cmp(b_trim),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2023-03-15")),
            NaiveDate::from_ymd_opt(2023, 3, 15)
        );
        assert_eq!(
            parse_date(Some(" 2023-03-15 ")),
            NaiveDate::from_ymd_opt(2023, 3, 15)
        );
        assert_eq!(parse_date(None), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("not-a-date")), None);
        assert_eq!(parse_date(Some("2023-13-01")), None);
    }

    #[test]
    fn test_natural_cmp_numeric_runs() {
        assert_eq!(natural_cmp("Package 2", "Package 10"), Ordering::Less);
        assert_eq!(natural_cmp("Package 10", "Package 2"), Ordering::Greater);
        assert_eq!(natural_cmp("Phase 02", "Phase 2"), Ordering::Equal);
    }

    #[test]
    fn test_natural_cmp_case_insensitive() {
        assert_eq!(natural_cmp("trainings", "Trainings"), Ordering::Equal);
        assert_eq!(natural_cmp("apple", "Banana"), Ordering::Less);
    }

    #[test]
    fn test_month_and_quarter_labels() {
        assert_eq!(month_label(1), "Jan");
        assert_eq!(month_label(12), "Dec");
        assert_eq!(quarter_label(4), "Q4");
        assert_eq!(month_label(13), "");
    }
}
