use crate::error::{ReportError, Result};
use crate::hierarchy::{Measures, ReportTree};
use crate::object_codes::{CodeReference, ObjectType};
use crate::utils::{month_label, quarter_label};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The five report shapes the one engine serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    AnnualAccomplishment,
    PhysicalPlan,
    FinancialPlan,
    ByObjectCode,
    Geographic,
}

impl ReportKind {
    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::AnnualAccomplishment => "Annual Accomplishment",
            ReportKind::PhysicalPlan => "Physical Plan",
            ReportKind::FinancialPlan => "Financial Plan",
            ReportKind::ByObjectCode => "By Object Code",
            ReportKind::Geographic => "Geographic Distribution",
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            ReportKind::AnnualAccomplishment => "AnnualAccomplishment",
            ReportKind::PhysicalPlan => "PhysicalPlan",
            ReportKind::FinancialPlan => "FinancialPlan",
            ReportKind::ByObjectCode => "ByObjectCode",
            ReportKind::Geographic => "GeographicDistribution",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Percent(f64),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellRole {
    Header,
    Label,
    Data,
    Total,
    Percent,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
    pub role: CellRole,
}

/// Rectangular block of cells sharing one rendered value, inclusive on
/// both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    pub rows: Vec<Vec<Cell>>,
    pub merges: Vec<MergeRange>,
}

impl Grid {
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

/// Which rows are open, injected by the caller; the builder never asks
/// why a key is present. Package keys are "{group}/{package}".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpansionState {
    keys: BTreeSet<String>,
}

impl ExpansionState {
    /// Everything collapsed: component summary rows only.
    pub fn collapsed() -> Self {
        Self::default()
    }

    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Full expansion over one tree, for the flat export consumer.
    pub fn expand_all(tree: &ReportTree) -> Self {
        let mut keys = BTreeSet::new();
        for group in &tree.groups {
            keys.insert(group.key());
            for package in &group.packages {
                keys.insert(group.package_key(&package.name));
            }
        }
        Self { keys }
    }

    pub fn expand(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }

    pub fn expanded(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnField {
    /// "Target"/"Actual" sub-row tag; its presence switches the plan to
    /// two rows per node.
    Measure,
    Month(u32),
    Quarter(u32),
    PeriodTotal,
    Completion,
    AnnualTarget,
    AnnualActual,
    Variance,
    Cost,
    Obligation,
    Disbursement,
    QuarterObligation(u32),
    QuarterDisbursement(u32),
    ObligationRate,
    DisbursementRate,
    Mooe,
    Co,
    SplitTotal,
    Code(String),
    Participants,
    Quantity,
    UnitLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub field: ColumnField,
}

impl Column {
    fn new(label: &str, field: ColumnField) -> Self {
        Self {
            label: label.to_string(),
            field,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGroup {
    pub label: Option<String>,
    pub columns: Vec<Column>,
}

impl ColumnGroup {
    fn flat(columns: Vec<Column>) -> Self {
        Self {
            label: None,
            columns,
        }
    }

    fn labeled(label: &str, columns: Vec<Column>) -> Self {
        Self {
            label: Some(label.to_string()),
            columns,
        }
    }
}

/// The fixed multi-row header plan for one report shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    pub kind: ReportKind,
    pub label_header: String,
    pub groups: Vec<ColumnGroup>,
}

impl ColumnPlan {
    pub fn value_columns(&self) -> usize {
        self.groups.iter().map(|g| g.columns.len()).sum()
    }

    pub fn width(&self) -> usize {
        1 + self.value_columns()
    }

    fn dual_row(&self) -> bool {
        self.groups
            .iter()
            .flat_map(|g| g.columns.iter())
            .any(|c| c.field == ColumnField::Measure)
    }

    /// Builds the canonical plan for a report shape. The object-code
    /// pivot discovers its columns from the tree's grand-total code map.
    pub fn for_report(kind: ReportKind, tree: &ReportTree, reference: &CodeReference) -> Self {
        match kind {
            ReportKind::AnnualAccomplishment => Self {
                kind,
                label_header: "Particulars".to_string(),
                groups: vec![
                    ColumnGroup::labeled(
                        "Physical",
                        vec![
                            Column::new("Target", ColumnField::AnnualTarget),
                            Column::new("Accomplished", ColumnField::AnnualActual),
                            Column::new("Variance", ColumnField::Variance),
                            Column::new("%", ColumnField::Completion),
                            Column::new("Participants", ColumnField::Participants),
                        ],
                    ),
                    ColumnGroup::labeled(
                        "Financial",
                        vec![
                            Column::new("Cost", ColumnField::Cost),
                            Column::new("Obligations", ColumnField::Obligation),
                            Column::new("Disbursements", ColumnField::Disbursement),
                            Column::new("Obligation Rate", ColumnField::ObligationRate),
                            Column::new("Disbursement Rate", ColumnField::DisbursementRate),
                        ],
                    ),
                ],
            },
            ReportKind::PhysicalPlan => {
                let mut groups = vec![ColumnGroup::flat(vec![Column::new(
                    "",
                    ColumnField::Measure,
                )])];
                for quarter in 1..=4u32 {
                    let mut columns: Vec<Column> = ((quarter - 1) * 3 + 1..=quarter * 3)
                        .map(|m| Column::new(month_label(m), ColumnField::Month(m)))
                        .collect();
                    columns.push(Column::new("Total", ColumnField::Quarter(quarter)));
                    groups.push(ColumnGroup::labeled(quarter_group_label(quarter), columns));
                }
                groups.push(ColumnGroup::flat(vec![
                    Column::new("Total", ColumnField::PeriodTotal),
                    Column::new("%", ColumnField::Completion),
                ]));
                Self {
                    kind,
                    label_header: "Particulars".to_string(),
                    groups,
                }
            }
            ReportKind::FinancialPlan => {
                let quarters =
                    |f: fn(u32) -> ColumnField| -> Vec<Column> {
                        (1..=4u32)
                            .map(|q| Column::new(quarter_label(q), f(q)))
                            .collect()
                    };

                let mut obligations = quarters(ColumnField::QuarterObligation);
                obligations.push(Column::new("Total", ColumnField::Obligation));
                obligations.push(Column::new("Rate", ColumnField::ObligationRate));

                let mut disbursements = quarters(ColumnField::QuarterDisbursement);
                disbursements.push(Column::new("Total", ColumnField::Disbursement));
                disbursements.push(Column::new("Rate", ColumnField::DisbursementRate));

                Self {
                    kind,
                    label_header: "Particulars".to_string(),
                    groups: vec![
                        ColumnGroup::flat(vec![Column::new("Cost", ColumnField::Cost)]),
                        ColumnGroup::labeled("Obligations", obligations),
                        ColumnGroup::labeled("Disbursements", disbursements),
                    ],
                }
            }
            ReportKind::ByObjectCode => {
                let (mooe, co) = object_code_columns(tree, reference);
                let mut groups = Vec::new();
                if !mooe.is_empty() {
                    groups.push(ColumnGroup::labeled("MOOE", mooe));
                }
                if !co.is_empty() {
                    groups.push(ColumnGroup::labeled("CO", co));
                }
                groups.push(ColumnGroup::flat(vec![Column::new(
                    "Total",
                    ColumnField::SplitTotal,
                )]));
                Self {
                    kind,
                    label_header: "Particulars".to_string(),
                    groups,
                }
            }
            ReportKind::Geographic => Self {
                kind,
                label_header: "Location".to_string(),
                groups: vec![
                    ColumnGroup::flat(vec![
                        Column::new("Targets", ColumnField::AnnualTarget),
                        Column::new("Completed", ColumnField::AnnualActual),
                        Column::new("Quantity", ColumnField::Quantity),
                        Column::new("Unit", ColumnField::UnitLabel),
                    ]),
                    ColumnGroup::labeled(
                        "By Object Class",
                        vec![
                            Column::new("MOOE", ColumnField::Mooe),
                            Column::new("CO", ColumnField::Co),
                        ],
                    ),
                    ColumnGroup::flat(vec![Column::new("Total Cost", ColumnField::Cost)]),
                ],
            },
        }
    }
}

fn quarter_group_label(quarter: u32) -> &'static str {
    match quarter {
        1 => "First Quarter",
        2 => "Second Quarter",
        3 => "Third Quarter",
        _ => "Fourth Quarter",
    }
}

/// Dynamic pivot columns: codes observed in the tree, in reference
/// order per object class, with unknown codes appended under MOOE.
fn object_code_columns(
    tree: &ReportTree,
    reference: &CodeReference,
) -> (Vec<Column>, Vec<Column>) {
    let present: BTreeSet<String> = tree.grand_total.by_code.keys().cloned().collect();
    let mut seen = BTreeSet::new();

    let mut mooe = Vec::new();
    for (code, description) in reference.codes_for(ObjectType::Mooe) {
        if present.contains(&code) {
            seen.insert(code.clone());
            mooe.push(Column::new(&description, ColumnField::Code(code)));
        }
    }

    let mut co = Vec::new();
    for (code, description) in reference.codes_for(ObjectType::Co) {
        if present.contains(&code) {
            seen.insert(code.clone());
            co.push(Column::new(&description, ColumnField::Code(code)));
        }
    }

    for code in present {
        if !seen.contains(&code) {
            mooe.push(Column::new(&code, ColumnField::Code(code.clone())));
        }
    }

    (mooe, co)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowSide {
    Target,
    Actual,
}

/// Flattens a rolled-up tree into the rectangular grid one report shape
/// wants. Emission order is: group summary (always, a "No data" row
/// when the group is empty), then packages and items as gated by the
/// expansion set, then one grand-total row.
pub fn build_grid(
    tree: &ReportTree,
    plan: &ColumnPlan,
    expansion: &ExpansionState,
) -> Result<Grid> {
    validate_plan(plan)?;

    let mut builder = GridBuilder::new(plan);
    builder.header();

    for group in &tree.groups {
        if group.packages.is_empty() {
            builder.emit_no_data(&group.label);
            continue;
        }

        builder.emit_node(&group.label, 0, &group.summary, CellRole::Total);
        if !expansion.expanded(&group.key()) {
            continue;
        }
        for package in &group.packages {
            builder.emit_node(&package.name, 1, &package.summary, CellRole::Total);
            if !expansion.expanded(&group.package_key(&package.name)) {
                continue;
            }
            for item in &package.items {
                builder.emit_node(&item.name, 2, &item.measures, CellRole::Data);
            }
        }
    }

    builder.emit_node("GRAND TOTAL", 0, &tree.grand_total, CellRole::Total);

    Ok(builder.finish())
}

fn validate_plan(plan: &ColumnPlan) -> Result<()> {
    let invalid = |details: String| ReportError::InvalidColumnPlan {
        report: plan.kind.name().to_string(),
        details,
    };

    if plan.value_columns() == 0 {
        return Err(invalid("plan declares no value columns".to_string()));
    }

    let has_measure = plan.dual_row();
    for group in &plan.groups {
        for column in &group.columns {
            match &column.field {
                ColumnField::Month(m) if !(1..=12).contains(m) => {
                    return Err(invalid(format!("month column {} out of range", m)));
                }
                ColumnField::Quarter(q)
                | ColumnField::QuarterObligation(q)
                | ColumnField::QuarterDisbursement(q)
                    if !(1..=4).contains(q) =>
                {
                    return Err(invalid(format!("quarter column {} out of range", q)));
                }
                ColumnField::Month(_) | ColumnField::Quarter(_) | ColumnField::PeriodTotal
                    if !has_measure =>
                {
                    return Err(invalid(
                        "month/quarter columns require a target/actual measure column"
                            .to_string(),
                    ));
                }
                _ => {}
            }
        }
    }

    Ok(())
}

struct GridBuilder<'p> {
    plan: &'p ColumnPlan,
    width: usize,
    rows: Vec<Vec<Cell>>,
    merges: Vec<MergeRange>,
}

impl<'p> GridBuilder<'p> {
    fn new(plan: &'p ColumnPlan) -> Self {
        Self {
            plan,
            width: plan.width(),
            rows: Vec::new(),
            merges: Vec::new(),
        }
    }

    fn blank_row(&self, row: usize, role: CellRole) -> Vec<Cell> {
        (0..self.width)
            .map(|col| Cell {
                row,
                col,
                value: CellValue::Empty,
                role,
            })
            .collect()
    }

    fn header(&mut self) {
        let plan = self.plan;
        let two = plan.groups.iter().any(|g| g.label.is_some());

        let mut row0 = self.blank_row(0, CellRole::Header);
        row0[0].value = CellValue::Text(plan.label_header.clone());
        let mut row1 = if two {
            self.merges.push(MergeRange {
                start_row: 0,
                start_col: 0,
                end_row: 1,
                end_col: 0,
            });
            Some(self.blank_row(1, CellRole::Header))
        } else {
            None
        };

        let mut col = 1;
        for group in &plan.groups {
            let span = group.columns.len();
            match &group.label {
                Some(label) => {
                    row0[col].value = CellValue::Text(label.clone());
                    if span > 1 {
                        self.merges.push(MergeRange {
                            start_row: 0,
                            start_col: col,
                            end_row: 0,
                            end_col: col + span - 1,
                        });
                    }
                    if let Some(sub) = row1.as_mut() {
                        for (i, column) in group.columns.iter().enumerate() {
                            sub[col + i].value = CellValue::Text(column.label.clone());
                        }
                    }
                }
                None => {
                    for (i, column) in group.columns.iter().enumerate() {
                        row0[col + i].value = CellValue::Text(column.label.clone());
                        if two {
                            self.merges.push(MergeRange {
                                start_row: 0,
                                start_col: col + i,
                                end_row: 1,
                                end_col: col + i,
                            });
                        }
                    }
                }
            }
            col += span;
        }

        self.rows.push(row0);
        if let Some(sub) = row1 {
            self.rows.push(sub);
        }
    }

    fn emit_node(&mut self, label: &str, depth: usize, measures: &Measures, role: CellRole) {
        let plan = self.plan;
        let text = format!("{}{}", "  ".repeat(depth), label);

        if plan.dual_row() {
            let top = self.rows.len();
            let mut target_row = self.blank_row(top, role);
            let mut actual_row = self.blank_row(top + 1, role);

            target_row[0].value = CellValue::Text(text);
            target_row[0].role = CellRole::Label;
            actual_row[0].role = CellRole::Label;
            self.merges.push(MergeRange {
                start_row: top,
                start_col: 0,
                end_row: top + 1,
                end_col: 0,
            });

            let mut col = 1;
            for group in &plan.groups {
                for column in &group.columns {
                    let (value, cell_role) =
                        field_value(&column.field, measures, Some(RowSide::Target), role);
                    target_row[col].value = value;
                    target_row[col].role = cell_role;

                    let (value, cell_role) =
                        field_value(&column.field, measures, Some(RowSide::Actual), role);
                    actual_row[col].value = value;
                    actual_row[col].role = cell_role;

                    col += 1;
                }
            }

            self.rows.push(target_row);
            self.rows.push(actual_row);
        } else {
            let row_idx = self.rows.len();
            let mut row = self.blank_row(row_idx, role);
            row[0].value = CellValue::Text(text);
            row[0].role = CellRole::Label;

            let mut col = 1;
            for group in &plan.groups {
                for column in &group.columns {
                    let (value, cell_role) = field_value(&column.field, measures, None, role);
                    row[col].value = value;
                    row[col].role = cell_role;
                    col += 1;
                }
            }

            self.rows.push(row);
        }
    }

    /// One summary row spanning every value column with a "No data"
    /// marker, and nothing beneath it.
    fn emit_no_data(&mut self, label: &str) {
        let row_idx = self.rows.len();
        let mut row = self.blank_row(row_idx, CellRole::NoData);
        row[0].value = CellValue::Text(label.to_string());
        row[0].role = CellRole::Label;
        row[1].value = CellValue::Text("No data".to_string());
        if self.width > 2 {
            self.merges.push(MergeRange {
                start_row: row_idx,
                start_col: 1,
                end_row: row_idx,
                end_col: self.width - 1,
            });
        }
        self.rows.push(row);
    }

    fn finish(self) -> Grid {
        Grid {
            rows: self.rows,
            merges: self.merges,
        }
    }
}

fn side_counter<'m>(measures: &'m Measures, side: Option<RowSide>) -> &'m crate::period::PeriodCounter {
    match side {
        Some(RowSide::Actual) => &measures.output.actual,
        _ => &measures.output.target,
    }
}

fn field_value(
    field: &ColumnField,
    m: &Measures,
    side: Option<RowSide>,
    numeric_role: CellRole,
) -> (CellValue, CellRole) {
    match field {
        ColumnField::Measure => match side {
            Some(RowSide::Target) => (CellValue::Text("Target".to_string()), CellRole::Label),
            Some(RowSide::Actual) => (CellValue::Text("Actual".to_string()), CellRole::Label),
            None => (CellValue::Empty, numeric_role),
        },
        ColumnField::Month(month) => (
            CellValue::Number(side_counter(m, side).month(*month)),
            numeric_role,
        ),
        ColumnField::Quarter(quarter) => (
            CellValue::Number(side_counter(m, side).quarter(*quarter)),
            numeric_role,
        ),
        ColumnField::PeriodTotal => {
            let value = match side {
                Some(RowSide::Actual) => m.output_totals.actual,
                _ => m.output_totals.target,
            };
            (CellValue::Number(value), numeric_role)
        }
        ColumnField::Completion => match side {
            Some(RowSide::Target) => (CellValue::Empty, numeric_role),
            _ => (CellValue::Percent(m.rates().completion), CellRole::Percent),
        },
        ColumnField::AnnualTarget => (CellValue::Number(m.output_totals.target), numeric_role),
        ColumnField::AnnualActual => (CellValue::Number(m.output_totals.actual), numeric_role),
        ColumnField::Variance => (CellValue::Number(m.rates().variance), numeric_role),
        ColumnField::Cost => (CellValue::Number(m.flow.cost), numeric_role),
        ColumnField::Obligation => (CellValue::Number(m.flow.obligation), numeric_role),
        ColumnField::Disbursement => (CellValue::Number(m.flow.disbursement), numeric_role),
        ColumnField::QuarterObligation(quarter) => {
            (CellValue::Number(m.obligation.quarter(*quarter)), numeric_role)
        }
        ColumnField::QuarterDisbursement(quarter) => (
            CellValue::Number(m.disbursement.quarter(*quarter)),
            numeric_role,
        ),
        ColumnField::ObligationRate => (
            CellValue::Percent(m.rates().obligation_rate),
            CellRole::Percent,
        ),
        ColumnField::DisbursementRate => (
            CellValue::Percent(m.rates().disbursement_rate),
            CellRole::Percent,
        ),
        ColumnField::Mooe => (CellValue::Number(m.split.mooe), numeric_role),
        ColumnField::Co => (CellValue::Number(m.split.co), numeric_role),
        ColumnField::SplitTotal => (CellValue::Number(m.split.total()), numeric_role),
        ColumnField::Code(code) => (CellValue::Number(m.code_amount(code)), numeric_role),
        ColumnField::Participants => (CellValue::Number(m.participants), numeric_role),
        ColumnField::Quantity => (CellValue::Number(m.quantity), numeric_role),
        ColumnField::UnitLabel => (CellValue::Text(m.unit_label()), CellRole::Label),
    }
}
