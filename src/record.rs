//! Parsed run records and the golden reference
//!
//! These are the inputs handed over by the log-ingestion side: one
//! [`RunRecord`] per simulation run with typed field values, and a single
//! [`GoldenRecord`] describing the fault-free execution.

use crate::error::{AnalysisError, Result};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A parsed log value
///
/// Numeric variants compare numerically with each other (`Int(2) == Float(2.0)`),
/// strings compare lexically, and a number never equals a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Str(a), FieldValue::Str(b)) => a == b,
            (FieldValue::Str(_), _) | (_, FieldValue::Str(_)) => false,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

/// Where and when the bit-flip was injected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjectionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

/// One simulation run
///
/// `fields` keeps explicit nulls: a field parsed as `null` and a field that is
/// missing altogether are both reported as absent by [`RunRecord::get`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique run identifier (usually the run directory name)
    pub id: String,

    /// Target register path, delimiter-joined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,

    #[serde(default)]
    pub fields: BTreeMap<String, Option<FieldValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection: Option<InjectionMeta>,
}

impl RunRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            register: None,
            fields: BTreeMap::new(),
            injection: None,
        }
    }

    /// Builder: set the target register path
    pub fn with_register(mut self, path: impl Into<String>) -> Self {
        self.register = Some(path.into());
        self
    }

    /// Builder: set a parsed field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    /// Builder: record a field that failed to parse
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    pub fn with_injection(mut self, injection: InjectionMeta) -> Self {
        self.injection = Some(injection);
        self
    }

    /// Parsed value of a field, `None` if absent or null
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    /// Field rendered as a grouping key
    ///
    /// Parsed fields win; `register`, `bit` and `cycle` fall back to the
    /// target path and the injection metadata.
    pub fn key_value(&self, field: &str) -> Option<String> {
        if let Some(value) = self.get(field) {
            return Some(value.to_string());
        }

        let injection = self.injection.as_ref();
        match field {
            "register" => self.register.clone(),
            "bit" => injection.and_then(|i| i.bit).map(|b| b.to_string()),
            "cycle" => injection.and_then(|i| i.cycle).map(|c| c.to_string()),
            _ => None,
        }
    }

    /// Value used for ordering runs in time
    ///
    /// Looks at the named field first, then at the injection cycle.
    pub fn ordering_value(&self, field: &str) -> Option<f64> {
        self.get(field)
            .and_then(FieldValue::as_f64)
            .or_else(|| self.injection.as_ref().and_then(|i| i.cycle))
    }
}

/// Reference values of the fault-free execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoldenRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl GoldenRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Field names in sorted order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl FromIterator<(String, FieldValue)> for GoldenRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Ordered, id-unique collection of run records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RunTable {
    records: Vec<RunRecord>,
}

impl RunTable {
    /// Build a table, rejecting duplicate run identifiers
    pub fn new(records: Vec<RunRecord>) -> Result<Self> {
        let mut seen = FnvHashSet::default();
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(AnalysisError::Structural(format!(
                    "Duplicate run id '{}'",
                    record.id
                )));
            }
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if the field is carried (non-null) by at least one run
    pub fn any_has_field(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.get(name).is_some())
    }
}

impl<'de> Deserialize<'de> for RunTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let records = Vec::<RunRecord>::deserialize(deserializer)?;
        RunTable::new(records).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a RunTable {
    type Item = &'a RunRecord;
    type IntoIter = std::slice::Iter<'a, RunRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
