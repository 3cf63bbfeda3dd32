use crate::schema::ProgramRecord;
use crate::utils::natural_cmp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The fixed, closed set of top-level program areas. Records tagged
/// with anything else are dropped from every total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    ProductionAndLivelihood,
    InfrastructureSupport,
    ProgramManagement,
}

impl Component {
    pub const ALL: [Component; 3] = [
        Component::ProductionAndLivelihood,
        Component::InfrastructureSupport,
        Component::ProgramManagement,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Component::ProductionAndLivelihood => "Production and Livelihood",
            Component::InfrastructureSupport => "Infrastructure Support",
            Component::ProgramManagement => "Program Management",
        }
    }

    /// Display rank within the report; components always render in this
    /// fixed order.
    pub fn order(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    /// Case-insensitive tag lookup. Unknown tags resolve to `None`.
    pub fn parse(tag: &str) -> Option<Component> {
        let tag = tag.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(tag))
    }
}

pub const PKG_TRAININGS: &str = "Trainings";
pub const PKG_STAFF_REQUIREMENTS: &str = "Staff Requirements";
pub const PKG_OFFICE_REQUIREMENTS: &str = "Office Requirements";
pub const PKG_ACTIVITIES: &str = "Activities";
pub const PKG_OTHER_EXPENSES: &str = "Other Expenses";
pub const PKG_OTHERS: &str = "Others";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyPath {
    pub component: Component,
    pub package: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Placed(HierarchyPath),
    Dropped,
}

fn placed(component: Component, package: &str) -> Classification {
    Classification::Placed(HierarchyPath {
        component,
        package: package.to_string(),
    })
}

/// Maps a record to its two-level hierarchy path.
///
/// Subprojects carry their declared package type. Trainings and other
/// activities land in the Trainings/Activities package of their tagged
/// component. Staffing, office, and other-expense records always route
/// under Program Management, whatever their component tag says.
pub fn classify(record: &ProgramRecord) -> Classification {
    match record {
        ProgramRecord::Subproject(r) => match Component::parse(&r.component) {
            Some(component) => {
                let package = r
                    .package_type
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .unwrap_or(PKG_OTHERS);
                placed(component, package)
            }
            None => Classification::Dropped,
        },
        ProgramRecord::Training(r) => match Component::parse(&r.component) {
            Some(component) => placed(component, PKG_TRAININGS),
            None => Classification::Dropped,
        },
        ProgramRecord::OtherActivity(r) => match Component::parse(&r.component) {
            Some(component) => placed(component, PKG_ACTIVITIES),
            None => Classification::Dropped,
        },
        ProgramRecord::StaffingRequirement(_) => {
            placed(Component::ProgramManagement, PKG_STAFF_REQUIREMENTS)
        }
        ProgramRecord::OfficeRequirement(_) => {
            placed(Component::ProgramManagement, PKG_OFFICE_REQUIREMENTS)
        }
        ProgramRecord::OtherExpense(_) => {
            placed(Component::ProgramManagement, PKG_OTHER_EXPENSES)
        }
    }
}

/// Package display order within a component group: Production and
/// Livelihood pins its Trainings package first; everything else is
/// numeric-aware lexicographic.
pub fn package_display_order(group_label: &str, a: &str, b: &str) -> Ordering {
    if group_label == Component::ProductionAndLivelihood.label() {
        let a_pinned = a == PKG_TRAININGS;
        let b_pinned = b == PKG_TRAININGS;
        match (a_pinned, b_pinned) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    natural_cmp(a, b)
}
