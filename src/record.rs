//! Intake records as delivered by the gateway.
//!
//! The spreadsheet behind the gateway is loosely typed: a column can hold a
//! number in one row and text in the next, and any cell may be blank. Every
//! field is therefore read as optional text, whatever JSON scalar carried it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Token in the animal status that marks a live intake.
const ALIVE_TOKEN: &str = "vivo";
/// Token in the possible cause that marks an animal born at the centre.
const CAPTIVE_BIRTH_TOKEN: &str = "nacido en el centro";

/// One spreadsheet row describing a wildlife intake case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(
        rename = "numero_entrada",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub entry_number: Option<String>,

    #[serde(
        rename = "fecha",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,

    #[serde(
        rename = "especie_comun",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub species_common: Option<String>,

    #[serde(
        rename = "especie_cientifico",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub species_scientific: Option<String>,

    #[serde(
        rename = "municipio",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub municipality: Option<String>,

    #[serde(
        rename = "estado_animal",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub animal_status: Option<String>,

    #[serde(
        rename = "cumplimentado",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_by: Option<String>,

    #[serde(
        rename = "posible_causa",
        default,
        deserialize_with = "scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub possible_cause: Option<String>,
}

/// Alive/deceased classification of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vitality {
    Alive,
    Deceased,
}

impl Vitality {
    pub fn label(self) -> &'static str {
        match self {
            Vitality::Alive => "ALIVE",
            Vitality::Deceased => "DECEASED",
        }
    }
}

impl Record {
    pub fn entry_number(&self) -> Option<&str> {
        self.entry_number.as_deref()
    }

    /// Numeric sort key of the entry number.
    ///
    /// Reads an optional sign and the leading digits after any whitespace, so
    /// `"12b"` sorts as 12. Anything without leading digits, or no entry number
    /// at all, is 0.
    pub fn entry_key(&self) -> i64 {
        self.entry_number.as_deref().map(leading_int).unwrap_or(0)
    }

    /// Any status containing "vivo" (any case) is alive, everything else,
    /// including a missing status, is deceased.
    pub fn vitality(&self) -> Vitality {
        match &self.animal_status {
            Some(status) if status.to_lowercase().contains(ALIVE_TOKEN) => Vitality::Alive,
            _ => Vitality::Deceased,
        }
    }

    pub fn is_captive_born(&self) -> bool {
        self.possible_cause
            .as_deref()
            .is_some_and(|cause| cause.to_lowercase().contains(CAPTIVE_BIRTH_TOKEN))
    }

    /// Fields searched by free-text queries, in display order.
    pub fn searchable_fields(&self) -> [Option<&str>; 6] {
        [
            self.species_common.as_deref(),
            self.species_scientific.as_deref(),
            self.date.as_deref(),
            self.municipality.as_deref(),
            self.animal_status.as_deref(),
            self.completed_by.as_deref(),
        ]
    }
}

fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    match digits[..end].parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => 0,
    }
}

fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }))
}
