use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Budget object class: maintenance-and-operating expense or capital
/// outlay.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ObjectType {
    #[serde(rename = "MOOE")]
    Mooe,
    #[serde(rename = "CO")]
    Co,
}

impl ObjectType {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectType::Mooe => "MOOE",
            ObjectType::Co => "CO",
        }
    }
}

/// Particular assigned to codes the reference table does not know.
pub const DEFAULT_PARTICULAR: &str = "Other Maintenance and Operating Expenses";

/// Read-only reference table: object type -> particular -> code ->
/// description. The engine never mutates it; resolution is a reverse
/// lookup by code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeReference {
    entries: BTreeMap<ObjectType, BTreeMap<String, BTreeMap<String, String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeResolution {
    pub object_type: ObjectType,
    pub particular: String,
    /// `None` when the code is absent from the reference.
    pub description: Option<String>,
}

impl CodeReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        object_type: ObjectType,
        particular: &str,
        code: &str,
        description: &str,
    ) {
        self.entries
            .entry(object_type)
            .or_default()
            .entry(particular.to_string())
            .or_default()
            .insert(code.to_string(), description.to_string());
    }

    /// Reverse lookup of a code through every particular. Unknown codes
    /// fall back to MOOE with the default particular, never an error.
    pub fn resolve(&self, code: &str) -> CodeResolution {
        let code = code.trim();
        for (object_type, particulars) in &self.entries {
            for (particular, codes) in particulars {
                if let Some(description) = codes.get(code) {
                    return CodeResolution {
                        object_type: *object_type,
                        particular: particular.clone(),
                        description: Some(description.clone()),
                    };
                }
            }
        }

        CodeResolution {
            object_type: ObjectType::Mooe,
            particular: DEFAULT_PARTICULAR.to_string(),
            description: None,
        }
    }

    pub fn description(&self, code: &str) -> Option<String> {
        self.resolve(code).description
    }

    /// Codes of one object type, in reference order, as (code,
    /// description) pairs. Drives the dynamic pivot columns.
    pub fn codes_for(&self, object_type: ObjectType) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(particulars) = self.entries.get(&object_type) {
            for codes in particulars.values() {
                for (code, description) in codes {
                    out.push((code.clone(), description.clone()));
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
