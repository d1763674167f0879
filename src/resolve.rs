use crate::error::{ChartError, ChartResult};
use crate::ir::{ChartKind, Encoding, FieldSelection, ResolvedEncoding};

/// Validate an encoding against a chart kind and normalize `y` to a list.
pub fn resolve_encoding(encoding: &Encoding, kind: ChartKind) -> ChartResult<ResolvedEncoding> {
    let x = require_field("x", &encoding.x)?;

    let y = match &encoding.y {
        FieldSelection::One(field) => vec![require_field("y", field)?],
        FieldSelection::Many(fields) => {
            if fields.is_empty() {
                return Err(ChartError::configuration(
                    "y must name at least one field",
                ));
            }
            fields
                .iter()
                .map(|f| require_field("y", f))
                .collect::<ChartResult<Vec<_>>>()?
        }
    };

    let z = match &encoding.z {
        Some(field) => Some(require_field("z", field)?),
        None => None,
    };

    if !kind.supports_grouping() {
        if z.is_some() {
            return Err(ChartError::configuration(format!(
                "{} chart does not support a grouping (z) field",
                kind
            )));
        }
        if y.len() > 1 {
            return Err(ChartError::configuration(format!(
                "{} chart accepts a single y field, got {}",
                kind,
                y.len()
            )));
        }
    }

    Ok(ResolvedEncoding { kind, x, y, z })
}

fn require_field(role: &str, name: &str) -> ChartResult<String> {
    if name.trim().is_empty() {
        return Err(ChartError::configuration(format!(
            "{} must be a non-empty field name",
            role
        )));
    }
    Ok(name.to_string())
}
