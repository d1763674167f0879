use crate::data::FieldValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Chart kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl ChartKind {
    /// Whether the kind accepts a `z` field or several `y` fields.
    pub fn supports_grouping(self) -> bool {
        !matches!(self, ChartKind::Pie)
    }

    /// Axis ordering policy, `None` for kinds without an x axis.
    pub fn axis_policy(self) -> Option<AxisPolicy> {
        match self {
            ChartKind::Bar => Some(AxisPolicy::Category),
            ChartKind::Line => Some(AxisPolicy::Trend),
            ChartKind::Pie => None,
        }
    }

    pub fn fill_policy(self) -> FillPolicy {
        match self {
            ChartKind::Bar | ChartKind::Pie => FillPolicy::Zero,
            ChartKind::Line => FillPolicy::Gap,
        }
    }

    /// Inclusive record-count bounds, for kinds that have them.
    pub fn record_bounds(self) -> Option<(usize, usize)> {
        match self {
            ChartKind::Pie => Some((1, 10)),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "pie" => Ok(ChartKind::Pie),
            other => Err(format!("unknown chart kind '{}' (expected bar, line or pie)", other)),
        }
    }
}

// =============================================================================
// Phase 1: Encoding
// =============================================================================

/// `y` as supplied by the caller: a single field or an ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSelection {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for FieldSelection {
    fn from(s: &str) -> Self {
        FieldSelection::One(s.to_string())
    }
}

impl From<Vec<&str>> for FieldSelection {
    fn from(v: Vec<&str>) -> Self {
        FieldSelection::Many(v.into_iter().map(str::to_string).collect())
    }
}

/// Field mapping as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    pub x: String,
    pub y: FieldSelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<String>,
}

impl Encoding {
    pub fn new(x: &str, y: impl Into<FieldSelection>) -> Self {
        Self {
            x: x.to_string(),
            y: y.into(),
            z: None,
        }
    }

    pub fn with_group(mut self, z: &str) -> Self {
        self.z = Some(z.to_string());
        self
    }
}

/// Encoding after validation against a chart kind; `y` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEncoding {
    pub kind: ChartKind,
    pub x: String,
    pub y: Vec<String>,
    pub z: Option<String>,
}

// =============================================================================
// Phase 2: Axis domain & series
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPolicy {
    /// Stable first-seen order.
    Category,
    /// Ascending string order; chronological only for ISO-8601 keys.
    Trend,
}

/// Ordered, distinct stringified x keys every series is aligned against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AxisDomain {
    pub keys: Vec<String>,
}

impl AxisDomain {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.keys.iter()
    }
}

/// Coerced y cell, keeping real zeros apart from missing data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericCell {
    Value(f64),
    Zero,
    /// Field absent, not parseable, or no record at this position.
    Missing,
}

impl NumericCell {
    pub fn from_field(field: Option<&FieldValue>) -> Self {
        match field.and_then(FieldValue::as_number) {
            Some(n) if n == 0.0 => NumericCell::Zero,
            Some(n) => NumericCell::Value(n),
            None => NumericCell::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, NumericCell::Missing)
    }
}

/// What a series holds where a cell is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Missing cells become `0`.
    Zero,
    /// Missing cells become a gap (`None`).
    Gap,
}

impl FillPolicy {
    pub fn apply(self, cell: NumericCell) -> Option<f64> {
        match (cell, self) {
            (NumericCell::Value(v), _) => Some(v),
            (NumericCell::Zero, _) => Some(0.0),
            (NumericCell::Missing, FillPolicy::Zero) => Some(0.0),
            (NumericCell::Missing, FillPolicy::Gap) => None,
        }
    }
}

/// One plotted line or bar set. `values` always has one slot per domain key.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: Option<String>,
    pub kind: ChartKind,
    pub values: Vec<Option<f64>>,
}

/// Output of the transformation phase for axis-based charts.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSet {
    pub domain: AxisDomain,
    pub series: Vec<Series>,
}

/// One pie slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub name: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_policies() {
        assert_eq!(ChartKind::Bar.axis_policy(), Some(AxisPolicy::Category));
        assert_eq!(ChartKind::Line.axis_policy(), Some(AxisPolicy::Trend));
        assert_eq!(ChartKind::Pie.axis_policy(), None);
        assert_eq!(ChartKind::Line.fill_policy(), FillPolicy::Gap);
        assert!(!ChartKind::Pie.supports_grouping());
        assert_eq!(ChartKind::Pie.record_bounds(), Some((1, 10)));
        assert_eq!(ChartKind::Bar.record_bounds(), None);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Bar".parse::<ChartKind>(), Ok(ChartKind::Bar));
        assert!("scatter".parse::<ChartKind>().is_err());
    }

    #[test]
    fn test_numeric_cell_three_states() {
        assert_eq!(
            NumericCell::from_field(Some(&FieldValue::Number(0.0))),
            NumericCell::Zero
        );
        assert_eq!(
            NumericCell::from_field(Some(&FieldValue::Text("7".into()))),
            NumericCell::Value(7.0)
        );
        assert_eq!(
            NumericCell::from_field(Some(&FieldValue::Text("n/a".into()))),
            NumericCell::Missing
        );
        assert_eq!(NumericCell::from_field(None), NumericCell::Missing);
    }

    #[test]
    fn test_fill_policy() {
        assert_eq!(FillPolicy::Zero.apply(NumericCell::Missing), Some(0.0));
        assert_eq!(FillPolicy::Gap.apply(NumericCell::Missing), None);
        assert_eq!(FillPolicy::Gap.apply(NumericCell::Zero), Some(0.0));
        assert_eq!(FillPolicy::Gap.apply(NumericCell::Value(3.5)), Some(3.5));
    }

    #[test]
    fn test_encoding_deserializes_single_and_many_y() {
        let single: Encoding = serde_json::from_str(r#"{"x":"a","y":"b"}"#).unwrap();
        assert_eq!(single.y, FieldSelection::One("b".into()));
        assert_eq!(single.z, None);

        let many: Encoding =
            serde_json::from_str(r#"{"x":"a","y":["b","c"],"z":"g"}"#).unwrap();
        assert_eq!(many.y, FieldSelection::from(vec!["b", "c"]));
        assert_eq!(many.z.as_deref(), Some("g"));
    }
}
