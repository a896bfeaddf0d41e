//! Extracted ID card data and persisted history rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Names of the fields the OCR program reports, in column order.
pub const FIELD_NAMES: [&str; 8] = [
    "first_name",
    "second_name",
    "full_name",
    "national_id",
    "address",
    "birth_date",
    "governorate",
    "gender",
];

/// Fields extracted from one ID card image.
///
/// Built from the JSON object printed by the OCR program. Missing keys stay
/// `None`; no field is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// 14-digit Egyptian national ID number, as read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub governorate: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Any other keys the OCR program printed (e.g. `status`).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ExtractedRecord {
    /// Build a record from a decoded JSON object.
    ///
    /// Scalars other than strings are kept in their JSON text form and
    /// `null` counts as absent.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut record = Self::default();

        for (key, value) in map {
            let slot = match key.as_str() {
                "first_name" => &mut record.first_name,
                "second_name" => &mut record.second_name,
                "full_name" => &mut record.full_name,
                "national_id" => &mut record.national_id,
                "address" => &mut record.address,
                "birth_date" => &mut record.birth_date,
                "governorate" => &mut record.governorate,
                "gender" => &mut record.gender,
                _ => {
                    record.extra.insert(key, value);
                    continue;
                }
            };
            *slot = value_to_text(value);
        }

        record
    }

    /// Get a known field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => self.first_name.as_deref(),
            "second_name" => self.second_name.as_deref(),
            "full_name" => self.full_name.as_deref(),
            "national_id" => self.national_id.as_deref(),
            "address" => self.address.as_deref(),
            "birth_date" => self.birth_date.as_deref(),
            "governorate" => self.governorate.as_deref(),
            "gender" => self.gender.as_deref(),
            _ => None,
        }
    }

    /// Known fields in column order, absent ones as empty strings.
    pub fn column_values(&self) -> [&str; 8] {
        FIELD_NAMES.map(|name| self.field(name).unwrap_or(""))
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// A persisted extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Row identifier.
    pub id: i64,

    /// Image URL or `file://` reference the record was extracted from.
    pub image_url: String,

    pub first_name: String,
    pub second_name: String,
    pub full_name: String,
    pub national_id: String,
    pub address: String,
    pub birth_date: String,
    pub governorate: String,
    pub gender: String,

    /// Assigned by the store when the row was written.
    pub created_at: DateTime<Utc>,
}
