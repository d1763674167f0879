use crate::error::{ChartError, ChartResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;

/// A single scalar cell of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// Stringified form used for axis keys, group keys and slice names.
    ///
    /// Integral numbers print without a fractional part (`10`, not `10.0`),
    /// so a numeric `2024` and a textual `"2024"` land on the same key.
    pub fn to_key(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
        }
    }

    /// Standard numeric parsing. Surrounding whitespace is ignored; blank or
    /// unparseable text, NaN and infinities yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15
}

pub(crate) fn format_number(n: f64) -> String {
    if n == 0.0 {
        // covers -0.0 as well
        "0".to_string()
    } else if is_integral(n) {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One input row: field names in insertion order mapped to scalar values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, keeping the position of an existing key.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Stringified value of `name`, or `None` when the field is absent.
    pub fn key(&self, name: &str) -> Option<String> {
        self.get(name).map(FieldValue::to_key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// The ordered input rows of one chart invocation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct RecordSet {
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Create a RecordSet from a JSON array of flat objects.
    ///
    /// `null` is treated as an absent field and booleans become text.
    /// Nested arrays or objects are rejected.
    pub fn from_json(value: &Value) -> ChartResult<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| ChartError::data("Input data must be a JSON array of objects"))?;

        let mut records = Vec::with_capacity(array.len());
        for (idx, item) in array.iter().enumerate() {
            let obj = item.as_object().ok_or_else(|| {
                ChartError::data(format!("Item {} in data array is not an object", idx))
            })?;

            let mut record = Record::new();
            for (name, val) in obj {
                let field = match val {
                    Value::String(s) => FieldValue::Text(s.clone()),
                    Value::Number(n) => match n.as_f64() {
                        Some(f) => FieldValue::Number(f),
                        None => FieldValue::Text(n.to_string()),
                    },
                    Value::Bool(b) => FieldValue::Text(b.to_string()),
                    Value::Null => continue,
                    _ => {
                        return Err(ChartError::data(format!(
                            "Unsupported value type for field '{}' in item {}",
                            name, idx
                        )))
                    }
                };
                record.insert(name.clone(), field);
            }
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(&value)
    }

    /// Create a RecordSet from CSV with a header row.
    ///
    /// Cells that parse as finite numbers become numbers, empty cells are
    /// absent and everything else is text.
    pub fn from_csv<R: Read>(reader: R) -> ChartResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| ChartError::data(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut records = Vec::new();
        for (row_idx, row) in rdr.records().enumerate() {
            let row = row.map_err(|e| {
                ChartError::data(format!("Failed to read CSV row {}: {}", row_idx + 1, e))
            })?;

            let mut record = Record::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                if cell.is_empty() {
                    continue;
                }
                let field = match cell.parse::<f64>() {
                    Ok(n) if n.is_finite() => FieldValue::Number(n),
                    _ => FieldValue::Text(cell.to_string()),
                };
                record.insert(header.clone(), field);
            }
            records.push(record);
        }

        Ok(Self { records })
    }
}

impl TryFrom<Value> for RecordSet {
    type Error = ChartError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}
