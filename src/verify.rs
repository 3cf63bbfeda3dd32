use crate::error::{ReportError, Result};
use crate::hierarchy::{Measures, ReportTree};

/// Outcome of a rollup consistency pass. Warnings carry data-quality
/// observations that are not violations, like an item aggregating more
/// than two distinct units.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub nodes_checked: usize,
    pub warnings: Vec<String>,
}

/// Walks the tree and checks that every summary equals the recomputed
/// sum of its children, field by field, within `tolerance`. The builder
/// produces trees that satisfy this by construction; the check guards
/// against anything downstream mutating a node in place.
pub fn verify_rollup(tree: &ReportTree, tolerance: f64) -> Result<VerificationReport> {
    let mut report = VerificationReport::default();

    for group in &tree.groups {
        for package in &group.packages {
            let expected = Measures::aggregate(package.items.iter().map(|i| &i.measures));
            compare_node(
                &format!("{}/{}", group.label, package.name),
                &package.summary,
                &expected,
                tolerance,
            )?;
            report.nodes_checked += 1;

            for item in &package.items {
                if item.measures.units.len() > 2 {
                    report.warnings.push(format!(
                        "item '{}' in {}/{} aggregates {} distinct units",
                        item.name,
                        group.label,
                        package.name,
                        item.measures.units.len()
                    ));
                }
            }
        }

        let expected = Measures::aggregate(group.packages.iter().map(|p| &p.summary));
        compare_node(&group.label, &group.summary, &expected, tolerance)?;
        report.nodes_checked += 1;
    }

    let expected = Measures::aggregate(tree.groups.iter().map(|g| &g.summary));
    compare_node("grand total", &tree.grand_total, &expected, tolerance)?;
    report.nodes_checked += 1;

    Ok(report)
}

fn compare_node(
    node: &str,
    found: &Measures,
    expected: &Measures,
    tolerance: f64,
) -> Result<()> {
    let mut checks: Vec<(String, f64, f64)> = vec![
        (
            "annual target".to_string(),
            found.output_totals.target,
            expected.output_totals.target,
        ),
        (
            "annual actual".to_string(),
            found.output_totals.actual,
            expected.output_totals.actual,
        ),
        ("cost".to_string(), found.flow.cost, expected.flow.cost),
        (
            "obligation".to_string(),
            found.flow.obligation,
            expected.flow.obligation,
        ),
        (
            "disbursement".to_string(),
            found.flow.disbursement,
            expected.flow.disbursement,
        ),
        ("mooe".to_string(), found.split.mooe, expected.split.mooe),
        ("co".to_string(), found.split.co, expected.split.co),
        (
            "participants".to_string(),
            found.participants,
            expected.participants,
        ),
        ("quantity".to_string(), found.quantity, expected.quantity),
    ];

    for month in 1..=12u32 {
        checks.push((
            format!("target month {}", month),
            found.output.target.month(month),
            expected.output.target.month(month),
        ));
        checks.push((
            format!("actual month {}", month),
            found.output.actual.month(month),
            expected.output.actual.month(month),
        ));
        checks.push((
            format!("cost month {}", month),
            found.cost.month(month),
            expected.cost.month(month),
        ));
        checks.push((
            format!("obligation month {}", month),
            found.obligation.month(month),
            expected.obligation.month(month),
        ));
        checks.push((
            format!("disbursement month {}", month),
            found.disbursement.month(month),
            expected.disbursement.month(month),
        ));
    }

    for (code, expected_amount) in &expected.by_code {
        checks.push((
            format!("code {}", code),
            found.code_amount(code),
            *expected_amount,
        ));
    }
    for (code, found_amount) in &found.by_code {
        if !expected.by_code.contains_key(code) {
            checks.push((format!("code {}", code), *found_amount, 0.0));
        }
    }

    for (field, found_value, expected_value) in checks {
        if (found_value - expected_value).abs() > tolerance {
            return Err(ReportError::RollupViolation {
                node: node.to_string(),
                field,
                expected: expected_value,
                found: found_value,
            });
        }
    }

    Ok(())
}
