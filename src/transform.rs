use crate::data::{Record, RecordSet};
use crate::error::{ChartError, ChartResult};
use crate::ir::{
    AxisDomain, AxisPolicy, NumericCell, ResolvedEncoding, Series, SeriesSet, Slice,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

/// Main entry point: turn records into a domain plus aligned series.
#[tracing::instrument(skip(data, encoding), fields(kind = %encoding.kind, records = data.len()))]
pub fn apply_transformations(data: &RecordSet, encoding: &ResolvedEncoding) -> ChartResult<SeriesSet> {
    let policy = encoding.kind.axis_policy().ok_or_else(|| {
        ChartError::configuration(format!("{} chart has no axis domain", encoding.kind))
    })?;

    let domain = build_axis_domain(data, &encoding.x, policy);
    let series = build_series(data, encoding, &domain);

    debug!(domain = domain.len(), series = series.len(), "built series");
    Ok(SeriesSet { domain, series })
}

/// Collect the x keys of `data` under the given ordering policy.
///
/// Records without the x field contribute nothing.
pub fn build_axis_domain(data: &RecordSet, x_field: &str, policy: AxisPolicy) -> AxisDomain {
    let keys = match policy {
        AxisPolicy::Category => distinct_in_order(data.iter(), x_field),
        AxisPolicy::Trend => data
            .iter()
            .filter_map(|r| r.key(x_field))
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect(),
    };
    AxisDomain { keys }
}

/// Distinct stringified values of `field` in first-seen order.
fn distinct_in_order<'a>(records: impl Iterator<Item = &'a Record>, field: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ordered = Vec::new();
    for key in records.filter_map(|r| r.key(field)) {
        if seen.insert(key.clone()) {
            ordered.push(key);
        }
    }
    ordered
}

/// First record per x key. Later records with the same key are ignored.
fn index_first_by_key<'a>(
    records: impl Iterator<Item = &'a Record>,
    x_field: &str,
) -> HashMap<String, &'a Record> {
    let mut index = HashMap::new();
    for record in records {
        if let Some(key) = record.key(x_field) {
            index.entry(key).or_insert(record);
        }
    }
    index
}

/// Cross y fields with z groups (group-major) and align each to `domain`.
pub fn build_series(data: &RecordSet, encoding: &ResolvedEncoding, domain: &AxisDomain) -> Vec<Series> {
    let mut series = Vec::new();

    if let Some(z_field) = &encoding.z {
        let groups = distinct_in_order(data.iter(), z_field);
        for group in &groups {
            let members = data
                .iter()
                .filter(|r| r.key(z_field).as_deref() == Some(group.as_str()));
            let index = index_first_by_key(members, &encoding.x);

            for y_field in &encoding.y {
                let name = if encoding.y.len() > 1 {
                    format!("{} - {}", group, y_field)
                } else {
                    group.clone()
                };
                series.push(align_series(Some(name), &index, y_field, domain, encoding));
            }
        }
    } else {
        let index = index_first_by_key(data.iter(), &encoding.x);
        if encoding.y.len() > 1 {
            for y_field in &encoding.y {
                series.push(align_series(Some(y_field.clone()), &index, y_field, domain, encoding));
            }
        } else if let Some(y_field) = encoding.y.first() {
            series.push(align_series(None, &index, y_field, domain, encoding));
        }
    }

    // An empty record set has nothing to align against.
    if domain.is_empty() {
        series.clear();
    }

    series
}

fn align_series(
    name: Option<String>,
    index: &HashMap<String, &Record>,
    y_field: &str,
    domain: &AxisDomain,
    encoding: &ResolvedEncoding,
) -> Series {
    let fill = encoding.kind.fill_policy();
    let mut filled = 0usize;

    let values = domain
        .iter()
        .map(|key| {
            let cell = NumericCell::from_field(index.get(key).and_then(|r| r.get(y_field)));
            if cell.is_missing() {
                filled += 1;
            }
            fill.apply(cell)
        })
        .collect();

    if filled > 0 {
        trace!(series = ?name, y_field, filled, "filled missing cells");
    }

    Series {
        name,
        kind: encoding.kind,
        values,
    }
}

/// Map every record to a `(name, value)` slice, in input order.
pub fn build_slices(data: &RecordSet, encoding: &ResolvedEncoding) -> Vec<Slice> {
    let fill = encoding.kind.fill_policy();
    let y_field = encoding.y.first().map(String::as_str).unwrap_or_default();

    data.iter()
        .map(|record| Slice {
            name: record.key(&encoding.x).unwrap_or_default(),
            value: fill
                .apply(NumericCell::from_field(record.get(y_field)))
                .unwrap_or(0.0),
        })
        .collect()
}

/// Look up the raw cell behind one series position without applying the
/// fill policy, so callers can tell a real zero from missing data.
///
/// `group` restricts the lookup to records whose z value matches; it is
/// ignored when the encoding has no z field.
pub fn cell_at(
    data: &RecordSet,
    encoding: &ResolvedEncoding,
    group: Option<&str>,
    y_field: &str,
    x_key: &str,
) -> NumericCell {
    let in_group = |r: &&Record| match (&encoding.z, group) {
        (Some(z), Some(g)) => r.key(z).as_deref() == Some(g),
        _ => true,
    };

    let record = data
        .iter()
        .filter(in_group)
        .find(|r| r.key(&encoding.x).as_deref() == Some(x_key));

    NumericCell::from_field(record.and_then(|r| r.get(y_field)))
}
