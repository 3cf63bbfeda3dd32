use crate::period::{BarItem, PeriodCounter};
use crate::utils::natural_cmp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Annual target/actual pair, independent of monthly bucketing so
/// "All periods" builds still carry cumulative totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Bar {
    pub target: f64,
    pub actual: f64,
}

impl Bar {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            target: self.target + other.target,
            actual: self.actual + other.actual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CurrencySplit {
    pub mooe: f64,
    pub co: f64,
}

impl CurrencySplit {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            mooe: self.mooe + other.mooe,
            co: self.co + other.co,
        }
    }

    pub fn total(&self) -> f64 {
        self.mooe + self.co
    }
}

/// Annual cost/obligation/disbursement totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FundFlow {
    pub cost: f64,
    pub obligation: f64,
    pub disbursement: f64,
}

impl FundFlow {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            cost: self.cost + other.cost,
            obligation: self.obligation + other.obligation,
            disbursement: self.disbursement + other.disbursement,
        }
    }
}

/// Every numeric measure a hierarchy node carries. Summation is an
/// explicit immutable fold (`zero`/`add`), never an in-place mutation
/// of a shared accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Measures {
    /// Month-bucketed physical target vs. actual counts.
    pub output: BarItem,
    /// Annual physical counts, populated even when months are not.
    pub output_totals: Bar,
    /// Month-bucketed scheduled cost.
    pub cost: PeriodCounter,
    pub obligation: PeriodCounter,
    pub disbursement: PeriodCounter,
    pub flow: FundFlow,
    pub split: CurrencySplit,
    /// Object-use code -> amount.
    pub by_code: BTreeMap<String, f64>,
    pub participants: f64,
    pub quantity: f64,
    /// Distinct normalized units ever merged into this node.
    pub units: BTreeSet<String>,
}

impl Measures {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Field-by-field sum into a new value; maps merge by key, unit
    /// sets union.
    pub fn add(&self, other: &Self) -> Self {
        let mut by_code = self.by_code.clone();
        for (code, amount) in &other.by_code {
            *by_code.entry(code.clone()).or_insert(0.0) += amount;
        }

        let mut units = self.units.clone();
        units.extend(other.units.iter().cloned());

        Self {
            output: self.output.add(&other.output),
            output_totals: self.output_totals.add(&other.output_totals),
            cost: self.cost.add(&other.cost),
            obligation: self.obligation.add(&other.obligation),
            disbursement: self.disbursement.add(&other.disbursement),
            flow: self.flow.add(&other.flow),
            split: self.split.add(&other.split),
            by_code,
            participants: self.participants + other.participants,
            quantity: self.quantity + other.quantity,
            units,
        }
    }

    pub fn aggregate<'a, I>(items: I) -> Measures
    where
        I: IntoIterator<Item = &'a Measures>,
    {
        items
            .into_iter()
            .fold(Measures::zero(), |acc, m| acc.add(m))
    }

    pub fn code_amount(&self, code: &str) -> f64 {
        self.by_code.get(code).copied().unwrap_or(0.0)
    }

    pub fn has_data(&self) -> bool {
        self.output_totals.target != 0.0
            || self.output_totals.actual != 0.0
            || self.flow.cost != 0.0
            || self.flow.obligation != 0.0
            || self.flow.disbursement != 0.0
            || self.split.total() != 0.0
            || self.participants != 0.0
            || self.quantity != 0.0
            || !self.output.target.is_zero()
            || !self.output.actual.is_zero()
    }

    /// Compact unit tag for display: at most two distinct units, with a
    /// truncation indicator beyond that.
    pub fn unit_label(&self) -> String {
        let units: Vec<&str> = self.units.iter().map(String::as_str).collect();
        match units.len() {
            0 => String::new(),
            1 | 2 => units.join(" / "),
            _ => ">2 units, truncated".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub measures: Measures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageNode {
    pub name: String,
    pub items: Vec<Item>,
    pub summary: Measures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupNode {
    pub label: String,
    pub packages: Vec<PackageNode>,
    pub summary: Measures,
}

impl GroupNode {
    pub fn key(&self) -> String {
        self.label.clone()
    }

    pub fn package_key(&self, package: &str) -> String {
        format!("{}/{}", self.label, package)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTree {
    pub groups: Vec<GroupNode>,
    pub grand_total: Measures,
}

struct GroupDraft {
    order: usize,
    packages: BTreeMap<String, BTreeMap<String, Measures>>,
}

/// Collects classified measures and finalizes them into a tree whose
/// every summary is recomputed from its children. Leaf accumulation is
/// lookup-or-create on the normalized item name, so one indicator never
/// appears twice in a package.
#[derive(Default)]
pub struct TreeBuilder {
    groups: BTreeMap<String, GroupDraft>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group even if no record ever lands in it; empty
    /// groups still render a summary row.
    pub fn ensure_group(&mut self, label: &str, order: usize) {
        self.groups.entry(label.to_string()).or_insert(GroupDraft {
            order,
            packages: BTreeMap::new(),
        });
    }

    pub fn accumulate(
        &mut self,
        group_label: &str,
        group_order: usize,
        package: &str,
        item_name: &str,
        measures: &Measures,
    ) {
        let group = self
            .groups
            .entry(group_label.to_string())
            .or_insert(GroupDraft {
                order: group_order,
                packages: BTreeMap::new(),
            });

        let items = group.packages.entry(package.to_string()).or_default();
        let merged = match items.get(item_name) {
            Some(existing) => existing.add(measures),
            None => measures.clone(),
        };
        items.insert(item_name.to_string(), merged);
    }

    /// Sorts groups by rank then name, packages by the supplied
    /// comparator, items naturally, and rolls every summary up from the
    /// leaves.
    pub fn finalize<F>(self, package_order: F) -> ReportTree
    where
        F: Fn(&str, &str, &str) -> Ordering,
    {
        let mut drafts: Vec<(String, GroupDraft)> = self.groups.into_iter().collect();
        drafts.sort_by(|(a_label, a), (b_label, b)| {
            a.order
                .cmp(&b.order)
                .then_with(|| natural_cmp(a_label, b_label))
        });

        let mut groups = Vec::with_capacity(drafts.len());
        for (label, draft) in drafts {
            let mut packages: Vec<PackageNode> = draft
                .packages
                .into_iter()
                .map(|(name, items)| {
                    let mut items: Vec<Item> = items
                        .into_iter()
                        .map(|(name, measures)| Item { name, measures })
                        .collect();
                    items.sort_by(|a, b| natural_cmp(&a.name, &b.name));

                    let summary = Measures::aggregate(items.iter().map(|i| &i.measures));
                    PackageNode {
                        name,
                        items,
                        summary,
                    }
                })
                .collect();
            packages.sort_by(|a, b| package_order(&label, &a.name, &b.name));

            let summary = Measures::aggregate(packages.iter().map(|p| &p.summary));
            groups.push(GroupNode {
                label,
                packages,
                summary,
            });
        }

        let grand_total = Measures::aggregate(groups.iter().map(|g| &g.summary));
        ReportTree {
            groups,
            grand_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{PeriodCounter, PeriodIndex};

    fn measures_with_cost(amount: f64) -> Measures {
        let mut m = Measures::zero();
        m.flow.cost = amount;
        m.split.mooe = amount;
        m.output_totals.target = 1.0;
        m
    }

    #[test]
    fn test_add_is_field_by_field() {
        let mut a = Measures::zero();
        a.output.target = PeriodCounter::with_month(PeriodIndex::new(3).unwrap(), 1.0);
        a.by_code.insert("100".to_string(), 50.0);
        a.units.insert("kg".to_string());

        let mut b = Measures::zero();
        b.output.target = PeriodCounter::with_month(PeriodIndex::new(6).unwrap(), 2.0);
        b.by_code.insert("100".to_string(), 25.0);
        b.by_code.insert("200".to_string(), 10.0);
        b.units.insert("sacks".to_string());

        let sum = a.add(&b);
        assert_eq!(sum.output.target.month(3), 1.0);
        assert_eq!(sum.output.target.month(6), 2.0);
        assert_eq!(sum.output.target.total(), 3.0);
        assert_eq!(sum.code_amount("100"), 75.0);
        assert_eq!(sum.code_amount("200"), 10.0);
        assert_eq!(sum.units.len(), 2);

        // inputs untouched
        assert_eq!(a.code_amount("100"), 50.0);
        assert_eq!(b.output.target.month(3), 0.0);
    }

    #[test]
    fn test_aggregate_equals_sum_of_parts() {
        let parts = vec![
            measures_with_cost(100.0),
            measures_with_cost(250.0),
            measures_with_cost(50.0),
        ];
        let total = Measures::aggregate(parts.iter());
        assert_eq!(total.flow.cost, 400.0);
        assert_eq!(total.split.mooe, 400.0);
        assert_eq!(total.output_totals.target, 3.0);
    }

    #[test]
    fn test_merge_by_name_never_duplicates() {
        let mut builder = TreeBuilder::new();
        builder.accumulate("G", 0, "P", "Okra", &measures_with_cost(10.0));
        builder.accumulate("G", 0, "P", "Okra", &measures_with_cost(15.0));
        builder.accumulate("G", 0, "P", "Squash", &measures_with_cost(5.0));

        let tree = builder.finalize(|_, a, b| natural_cmp(a, b));
        assert_eq!(tree.groups.len(), 1);
        let package = &tree.groups[0].packages[0];
        assert_eq!(package.items.len(), 2);
        assert_eq!(package.items[0].name, "Okra");
        assert_eq!(package.items[0].measures.flow.cost, 25.0);
        assert_eq!(package.summary.flow.cost, 30.0);
        assert_eq!(tree.grand_total.flow.cost, 30.0);
    }

    #[test]
    fn test_rollup_recomputed_at_every_level() {
        let mut builder = TreeBuilder::new();
        builder.ensure_group("Empty", 0);
        builder.accumulate("Full", 1, "A", "One", &measures_with_cost(1.0));
        builder.accumulate("Full", 1, "B", "Two", &measures_with_cost(2.0));

        let tree = builder.finalize(|_, a, b| natural_cmp(a, b));
        assert_eq!(tree.groups.len(), 2);

        let empty = &tree.groups[0];
        assert_eq!(empty.label, "Empty");
        assert!(empty.packages.is_empty());
        assert!(!empty.summary.has_data());

        let full = &tree.groups[1];
        assert_eq!(full.summary.flow.cost, 3.0);
        assert_eq!(
            tree.grand_total.flow.cost,
            tree.groups.iter().map(|g| g.summary.flow.cost).sum::<f64>()
        );
    }

    #[test]
    fn test_unit_label_truncation() {
        let mut m = Measures::zero();
        assert_eq!(m.unit_label(), "");

        m.units.insert("kg".to_string());
        assert_eq!(m.unit_label(), "kg");

        m.units.insert("sacks".to_string());
        assert_eq!(m.unit_label(), "kg / sacks");

        m.units.insert("heads".to_string());
        assert_eq!(m.unit_label(), ">2 units, truncated");
    }
}
