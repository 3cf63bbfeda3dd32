use crate::period::ReportYear;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One dated monetary line of a record: either a flat `amount` or
/// `price_per_unit x number_of_units`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct DetailLine {
    #[serde(default)]
    #[schemars(description = "Free-text description of the line")]
    pub description: Option<String>,

    #[serde(default)]
    #[schemars(description = "Budget object-use (UACS) code, resolved against the reference table")]
    pub object_code: Option<String>,

    #[serde(default)]
    pub price_per_unit: Option<f64>,

    #[serde(default)]
    pub number_of_units: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Flat amount; takes precedence over price x units when present")]
    pub amount: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Scheduled date (YYYY-MM-DD); falls back to the record's target date")]
    pub date: Option<String>,
}

impl DetailLine {
    pub fn line_amount(&self) -> f64 {
        match self.amount {
            Some(a) => a,
            None => self.price_per_unit.unwrap_or(0.0) * self.number_of_units.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct SubprojectRecord {
    pub name: String,

    #[schemars(description = "Component tag; unknown tags drop the record from all totals")]
    pub component: String,

    #[serde(default)]
    #[schemars(description = "Declared package type; absent routes to the Others package")]
    pub package_type: Option<String>,

    #[serde(default)]
    pub operating_unit: Option<String>,

    #[serde(default)]
    pub fund_type: Option<String>,

    #[serde(default)]
    pub tier: Option<String>,

    #[serde(default)]
    pub province: Option<String>,

    #[serde(default)]
    pub municipality: Option<String>,

    #[serde(default)]
    pub target_date: Option<String>,

    #[serde(default)]
    #[schemars(description = "Completion date (YYYY-MM-DD)")]
    pub actual_date: Option<String>,

    #[serde(default)]
    pub obligation_date: Option<String>,

    #[serde(default)]
    pub disbursement_date: Option<String>,

    #[serde(default)]
    #[schemars(description = "Obligation month number 1-12 within the report year, used when no obligation date is known")]
    pub obligation_month: Option<u32>,

    #[serde(default)]
    pub disbursement_month: Option<u32>,

    #[serde(default)]
    #[schemars(description = "Physical deliverable quantity, in the declared unit")]
    pub quantity: Option<f64>,

    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    pub details: Vec<DetailLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct TrainingRecord {
    pub title: String,

    pub component: String,

    #[serde(default)]
    pub operating_unit: Option<String>,

    #[serde(default)]
    pub fund_type: Option<String>,

    #[serde(default)]
    pub tier: Option<String>,

    #[serde(default)]
    pub province: Option<String>,

    #[serde(default)]
    pub municipality: Option<String>,

    #[serde(default)]
    pub target_date: Option<String>,

    #[serde(default)]
    pub actual_date: Option<String>,

    #[serde(default)]
    pub obligation_date: Option<String>,

    #[serde(default)]
    pub disbursement_date: Option<String>,

    #[serde(default)]
    pub obligation_month: Option<u32>,

    #[serde(default)]
    pub disbursement_month: Option<u32>,

    #[serde(default)]
    pub participants: Option<f64>,

    #[serde(default)]
    pub details: Vec<DetailLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct ActivityRecord {
    pub title: String,

    pub component: String,

    #[serde(default)]
    pub operating_unit: Option<String>,

    #[serde(default)]
    pub fund_type: Option<String>,

    #[serde(default)]
    pub tier: Option<String>,

    #[serde(default)]
    pub province: Option<String>,

    #[serde(default)]
    pub municipality: Option<String>,

    #[serde(default)]
    pub target_date: Option<String>,

    #[serde(default)]
    pub actual_date: Option<String>,

    #[serde(default)]
    pub obligation_date: Option<String>,

    #[serde(default)]
    pub disbursement_date: Option<String>,

    #[serde(default)]
    pub obligation_month: Option<u32>,

    #[serde(default)]
    pub disbursement_month: Option<u32>,

    #[serde(default)]
    pub details: Vec<DetailLine>,
}

/// Always routed under Program Management regardless of any component tag.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct StaffingRecord {
    pub position: String,

    #[serde(default)]
    pub component: Option<String>,

    #[serde(default)]
    pub operating_unit: Option<String>,

    #[serde(default)]
    pub fund_type: Option<String>,

    #[serde(default)]
    pub tier: Option<String>,

    #[serde(default)]
    pub target_date: Option<String>,

    #[serde(default)]
    pub actual_date: Option<String>,

    #[serde(default)]
    pub obligation_date: Option<String>,

    #[serde(default)]
    pub disbursement_date: Option<String>,

    #[serde(default)]
    pub obligation_month: Option<u32>,

    #[serde(default)]
    pub disbursement_month: Option<u32>,

    #[serde(default)]
    pub details: Vec<DetailLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct OfficeRecord {
    pub item: String,

    #[serde(default)]
    pub component: Option<String>,

    #[serde(default)]
    pub operating_unit: Option<String>,

    #[serde(default)]
    pub fund_type: Option<String>,

    #[serde(default)]
    pub tier: Option<String>,

    #[serde(default)]
    pub target_date: Option<String>,

    #[serde(default)]
    pub actual_date: Option<String>,

    #[serde(default)]
    pub obligation_date: Option<String>,

    #[serde(default)]
    pub disbursement_date: Option<String>,

    #[serde(default)]
    pub obligation_month: Option<u32>,

    #[serde(default)]
    pub disbursement_month: Option<u32>,

    #[serde(default)]
    pub details: Vec<DetailLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct ExpenseRecord {
    pub particular: String,

    #[serde(default)]
    pub component: Option<String>,

    #[serde(default)]
    pub operating_unit: Option<String>,

    #[serde(default)]
    pub fund_type: Option<String>,

    #[serde(default)]
    pub tier: Option<String>,

    #[serde(default)]
    pub target_date: Option<String>,

    #[serde(default)]
    pub actual_date: Option<String>,

    #[serde(default)]
    pub obligation_date: Option<String>,

    #[serde(default)]
    pub disbursement_date: Option<String>,

    #[serde(default)]
    pub obligation_month: Option<u32>,

    #[serde(default)]
    pub disbursement_month: Option<u32>,

    #[serde(default)]
    pub details: Vec<DetailLine>,
}

/// One variant per record kind, dispatched exhaustively by the
/// classifier. The engine only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgramRecord {
    Subproject(SubprojectRecord),
    Training(TrainingRecord),
    OtherActivity(ActivityRecord),
    StaffingRequirement(StaffingRecord),
    OfficeRequirement(OfficeRecord),
    OtherExpense(ExpenseRecord),
}

impl ProgramRecord {
    pub fn kind_label(&self) -> &'static str {
        match self {
            ProgramRecord::Subproject(_) => "subproject",
            ProgramRecord::Training(_) => "training",
            ProgramRecord::OtherActivity(_) => "other_activity",
            ProgramRecord::StaffingRequirement(_) => "staffing_requirement",
            ProgramRecord::OfficeRequirement(_) => "office_requirement",
            ProgramRecord::OtherExpense(_) => "other_expense",
        }
    }

    /// The raw indicator name for this record, pre-normalization.
    pub fn indicator(&self) -> &str {
        match self {
            ProgramRecord::Subproject(r) => &r.name,
            ProgramRecord::Training(r) => &r.title,
            ProgramRecord::OtherActivity(r) => &r.title,
            ProgramRecord::StaffingRequirement(r) => &r.position,
            ProgramRecord::OfficeRequirement(r) => &r.item,
            ProgramRecord::OtherExpense(r) => &r.particular,
        }
    }

    pub fn component_tag(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => Some(&r.component),
            ProgramRecord::Training(r) => Some(&r.component),
            ProgramRecord::OtherActivity(r) => Some(&r.component),
            ProgramRecord::StaffingRequirement(r) => r.component.as_deref(),
            ProgramRecord::OfficeRequirement(r) => r.component.as_deref(),
            ProgramRecord::OtherExpense(r) => r.component.as_deref(),
        }
    }

    pub fn operating_unit(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.operating_unit.as_deref(),
            ProgramRecord::Training(r) => r.operating_unit.as_deref(),
            ProgramRecord::OtherActivity(r) => r.operating_unit.as_deref(),
            ProgramRecord::StaffingRequirement(r) => r.operating_unit.as_deref(),
            ProgramRecord::OfficeRequirement(r) => r.operating_unit.as_deref(),
            ProgramRecord::OtherExpense(r) => r.operating_unit.as_deref(),
        }
    }

    pub fn fund_type(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.fund_type.as_deref(),
            ProgramRecord::Training(r) => r.fund_type.as_deref(),
            ProgramRecord::OtherActivity(r) => r.fund_type.as_deref(),
            ProgramRecord::StaffingRequirement(r) => r.fund_type.as_deref(),
            ProgramRecord::OfficeRequirement(r) => r.fund_type.as_deref(),
            ProgramRecord::OtherExpense(r) => r.fund_type.as_deref(),
        }
    }

    pub fn tier(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.tier.as_deref(),
            ProgramRecord::Training(r) => r.tier.as_deref(),
            ProgramRecord::OtherActivity(r) => r.tier.as_deref(),
            ProgramRecord::StaffingRequirement(r) => r.tier.as_deref(),
            ProgramRecord::OfficeRequirement(r) => r.tier.as_deref(),
            ProgramRecord::OtherExpense(r) => r.tier.as_deref(),
        }
    }

    pub fn province(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.province.as_deref(),
            ProgramRecord::Training(r) => r.province.as_deref(),
            ProgramRecord::OtherActivity(r) => r.province.as_deref(),
            _ => None,
        }
    }

    pub fn municipality(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.municipality.as_deref(),
            ProgramRecord::Training(r) => r.municipality.as_deref(),
            ProgramRecord::OtherActivity(r) => r.municipality.as_deref(),
            _ => None,
        }
    }

    pub fn target_date(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.target_date.as_deref(),
            ProgramRecord::Training(r) => r.target_date.as_deref(),
            ProgramRecord::OtherActivity(r) => r.target_date.as_deref(),
            ProgramRecord::StaffingRequirement(r) => r.target_date.as_deref(),
            ProgramRecord::OfficeRequirement(r) => r.target_date.as_deref(),
            ProgramRecord::OtherExpense(r) => r.target_date.as_deref(),
        }
    }

    pub fn actual_date(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.actual_date.as_deref(),
            ProgramRecord::Training(r) => r.actual_date.as_deref(),
            ProgramRecord::OtherActivity(r) => r.actual_date.as_deref(),
            ProgramRecord::StaffingRequirement(r) => r.actual_date.as_deref(),
            ProgramRecord::OfficeRequirement(r) => r.actual_date.as_deref(),
            ProgramRecord::OtherExpense(r) => r.actual_date.as_deref(),
        }
    }

    pub fn obligation_date(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.obligation_date.as_deref(),
            ProgramRecord::Training(r) => r.obligation_date.as_deref(),
            ProgramRecord::OtherActivity(r) => r.obligation_date.as_deref(),
            ProgramRecord::StaffingRequirement(r) => r.obligation_date.as_deref(),
            ProgramRecord::OfficeRequirement(r) => r.obligation_date.as_deref(),
            ProgramRecord::OtherExpense(r) => r.obligation_date.as_deref(),
        }
    }

    pub fn disbursement_date(&self) -> Option<&str> {
        match self {
            ProgramRecord::Subproject(r) => r.disbursement_date.as_deref(),
            ProgramRecord::Training(r) => r.disbursement_date.as_deref(),
            ProgramRecord::OtherActivity(r) => r.disbursement_date.as_deref(),
            ProgramRecord::StaffingRequirement(r) => r.disbursement_date.as_deref(),
            ProgramRecord::OfficeRequirement(r) => r.disbursement_date.as_deref(),
            ProgramRecord::OtherExpense(r) => r.disbursement_date.as_deref(),
        }
    }

    pub fn obligation_month(&self) -> Option<u32> {
        match self {
            ProgramRecord::Subproject(r) => r.obligation_month,
            ProgramRecord::Training(r) => r.obligation_month,
            ProgramRecord::OtherActivity(r) => r.obligation_month,
            ProgramRecord::StaffingRequirement(r) => r.obligation_month,
            ProgramRecord::OfficeRequirement(r) => r.obligation_month,
            ProgramRecord::OtherExpense(r) => r.obligation_month,
        }
    }

    pub fn disbursement_month(&self) -> Option<u32> {
        match self {
            ProgramRecord::Subproject(r) => r.disbursement_month,
            ProgramRecord::Training(r) => r.disbursement_month,
            ProgramRecord::OtherActivity(r) => r.disbursement_month,
            ProgramRecord::StaffingRequirement(r) => r.disbursement_month,
            ProgramRecord::OfficeRequirement(r) => r.disbursement_month,
            ProgramRecord::OtherExpense(r) => r.disbursement_month,
        }
    }

    pub fn details(&self) -> &[DetailLine] {
        match self {
            ProgramRecord::Subproject(r) => &r.details,
            ProgramRecord::Training(r) => &r.details,
            ProgramRecord::OtherActivity(r) => &r.details,
            ProgramRecord::StaffingRequirement(r) => &r.details,
            ProgramRecord::OfficeRequirement(r) => &r.details,
            ProgramRecord::OtherExpense(r) => &r.details,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.details().iter().map(DetailLine::line_amount).sum()
    }
}

/// The flat input collections, one array per record kind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct RecordSet {
    #[serde(default)]
    pub subprojects: Vec<SubprojectRecord>,

    #[serde(default)]
    pub trainings: Vec<TrainingRecord>,

    #[serde(default)]
    pub other_activities: Vec<ActivityRecord>,

    #[serde(default)]
    pub staffing_requirements: Vec<StaffingRecord>,

    #[serde(default)]
    pub office_requirements: Vec<OfficeRecord>,

    #[serde(default)]
    pub other_expenses: Vec<ExpenseRecord>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.subprojects.len()
            + self.trainings.len()
            + self.other_activities.len()
            + self.staffing_requirements.len()
            + self.office_requirements.len()
            + self.other_expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One read pass over every collection, snapshotted into the tagged
    /// union so a build never observes a half-mutated source.
    pub fn all_records(&self) -> Vec<ProgramRecord> {
        let mut records = Vec::with_capacity(self.len());
        records.extend(self.subprojects.iter().cloned().map(ProgramRecord::Subproject));
        records.extend(self.trainings.iter().cloned().map(ProgramRecord::Training));
        records.extend(
            self.other_activities
                .iter()
                .cloned()
                .map(ProgramRecord::OtherActivity),
        );
        records.extend(
            self.staffing_requirements
                .iter()
                .cloned()
                .map(ProgramRecord::StaffingRequirement),
        );
        records.extend(
            self.office_requirements
                .iter()
                .cloned()
                .map(ProgramRecord::OfficeRequirement),
        );
        records.extend(
            self.other_expenses
                .iter()
                .cloned()
                .map(ProgramRecord::OtherExpense),
        );
        records
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RecordSet)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Filter configuration for one report build. `None` means "All" for
/// the optional dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFilters {
    pub year: ReportYear,

    #[serde(default)]
    pub operating_unit: Option<String>,

    #[serde(default)]
    pub fund_type: Option<String>,

    #[serde(default)]
    pub tier: Option<String>,
}

impl ReportFilters {
    pub fn for_year(year: ReportYear) -> Self {
        Self {
            year,
            operating_unit: None,
            fund_type: None,
            tier: None,
        }
    }

    pub fn operating_unit_label(&self) -> &str {
        self.operating_unit.as_deref().unwrap_or("All")
    }
}
