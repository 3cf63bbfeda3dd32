use serde::{Deserialize, Serialize};

/// Canonical merge key for free-text indicator names: trim, then
/// capitalize each word and lowercase the rest. "OKRA", "okra", and
/// " Okra " all collapse to "Okra" so they aggregate into one item.
pub fn merge_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<String>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub qty: f64,
    pub unit: String,
}

/// Canonicalizes a physical quantity. Gram variants convert to
/// kilograms; kilogram variants normalize the spelling only; anything
/// else passes through trimmed. A missing unit reads "unspecified".
pub fn normalize_quantity(qty: f64, unit: Option<&str>) -> Quantity {
    let unit = match unit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) => u,
        None => {
            return Quantity {
                qty,
                unit: "unspecified".to_string(),
            }
        }
    };

    match unit.to_lowercase().as_str() {
        "g" | "g." | "gm" | "gms" | "gram" | "grams" => Quantity {
            qty: qty / 1000.0,
            unit: "kg".to_string(),
        },
        "kg" | "kg." | "kilo" | "kilos" | "kilogram" | "kilograms" => Quantity {
            qty,
            unit: "kg".to_string(),
        },
        _ => Quantity {
            qty,
            unit: unit.to_string(),
        },
    }
}

pub fn normalize_unit(unit: Option<&str>) -> String {
    normalize_quantity(0.0, unit).unit
}
