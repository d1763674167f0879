use crate::data::RecordSet;
use crate::error::{ChartError, ChartResult};
use crate::ir::{ChartKind, ResolvedEncoding, Series, SeriesSet, Slice};
use crate::transform::{apply_transformations, build_slices};
use crate::{BarPosition, StyleOptions};
use serde::Serialize;
use tracing::debug;

// =============================================================================
// Renderer-facing chart option
// =============================================================================

/// Renderer-agnostic chart description (ECharts option layout).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<TitleOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendOption>,
    pub series: Vec<SeriesOption>,
    pub tooltip: TooltipOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<AxisOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<AxisOption>,
}

impl ChartOption {
    /// Category labels of the x axis, empty for pie charts.
    pub fn categories(&self) -> &[String] {
        self.x_axis
            .as_ref()
            .and_then(|a| a.data.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleOption {
    pub left: &'static str,
    pub text: String,
    pub bottom: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendOption {
    pub left: &'static str,
    pub orient: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipTrigger {
    Axis,
    Item,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipOption {
    pub trigger: TooltipTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_gap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub axis_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SeriesOption {
    Bar(BarSeries),
    Line(LineSeries),
    Pie(PieSeries),
}

impl SeriesOption {
    pub fn name(&self) -> Option<&str> {
        match self {
            SeriesOption::Bar(b) => b.name.as_deref(),
            SeriesOption::Line(l) => l.name.as_deref(),
            SeriesOption::Pie(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSeries {
    /// `None` serializes as `null`, which renders as a gap.
    pub data: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub smooth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_style: Option<AreaStyle>,
    pub show_symbol: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AreaStyle {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSeries {
    pub data: Vec<Slice>,
    pub radius: PieRadius,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PieRadius {
    Outer(String),
    Ring([String; 2]),
}

impl PieRadius {
    /// (inner, outer) as fractions of the available radius.
    pub fn fractions(&self) -> (f64, f64) {
        fn pct(s: &str) -> f64 {
            s.trim_end_matches('%').parse::<f64>().unwrap_or(0.0) / 100.0
        }
        match self {
            PieRadius::Outer(outer) => (0.0, pct(outer)),
            PieRadius::Ring([inner, outer]) => (pct(inner), pct(outer)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Emphasis {
    pub item_style: ItemStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStyle {
    pub shadow_blur: u32,
    pub shadow_offset_x: u32,
    pub shadow_color: &'static str,
}

const OUTER_RADIUS: &str = "70%";
const STACK_KEY: &str = "total";

// =============================================================================
// Assembly
// =============================================================================

/// Reject record counts outside the bounds of `kind`.
pub fn check_cardinality(kind: ChartKind, count: usize) -> ChartResult<()> {
    if let Some((min, max)) = kind.record_bounds() {
        if count < min || count > max {
            return Err(ChartError::Cardinality {
                kind,
                count,
                min,
                max,
            });
        }
    }
    Ok(())
}

/// Run the transformation and assemble the renderer-facing option.
#[tracing::instrument(skip(data, encoding, style), fields(kind = %encoding.kind))]
pub fn compile_option(
    data: &RecordSet,
    encoding: &ResolvedEncoding,
    style: &StyleOptions,
) -> ChartResult<ChartOption> {
    style.validate()?;

    let option = match encoding.kind {
        ChartKind::Pie => {
            check_cardinality(encoding.kind, data.len())?;
            assemble_pie(build_slices(data, encoding), style)
        }
        ChartKind::Bar | ChartKind::Line => {
            let set = apply_transformations(data, encoding)?;
            assemble_axis_chart(set, encoding.kind, style)
        }
    };

    debug!(
        series = option.series.len(),
        legend = option.legend.is_some(),
        "assembled chart option"
    );
    Ok(option)
}

/// Wrap a domain and its series into a bar or line option.
pub fn assemble_axis_chart(set: SeriesSet, kind: ChartKind, style: &StyleOptions) -> ChartOption {
    let legend = (set.series.len() > 1).then(|| LegendOption {
        left: "center",
        orient: "horizontal",
        bottom: Some(10),
        top: None,
    });

    let series = set
        .series
        .into_iter()
        .map(|s| series_option(s, kind, style))
        .collect();

    ChartOption {
        title: style.title.as_deref().map(title_option),
        legend,
        series,
        tooltip: TooltipOption {
            trigger: TooltipTrigger::Axis,
            formatter: None,
        },
        x_axis: Some(AxisOption {
            boundary_gap: matches!(kind, ChartKind::Line).then_some(false),
            data: Some(set.domain.keys),
            axis_type: "category",
        }),
        y_axis: Some(AxisOption {
            boundary_gap: None,
            data: None,
            axis_type: "value",
        }),
    }
}

fn series_option(series: Series, kind: ChartKind, style: &StyleOptions) -> SeriesOption {
    match kind {
        ChartKind::Line => SeriesOption::Line(LineSeries {
            data: series.values,
            name: series.name,
            smooth: style.smooth,
            area_style: style.show_area.then(AreaStyle::default),
            show_symbol: style.show_symbol,
        }),
        _ => SeriesOption::Bar(BarSeries {
            data: series.values.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
            name: series.name,
            stack: matches!(style.position, BarPosition::Stack).then(|| STACK_KEY.to_string()),
        }),
    }
}

/// Build a pie option from slices; the legend is always shown.
pub fn assemble_pie(slices: Vec<Slice>, style: &StyleOptions) -> ChartOption {
    let radius = if style.inner_radius > 0.0 {
        PieRadius::Ring([
            format!(
                "{}%",
                crate::data::format_number((style.inner_radius * 100.0 * 1e6).round() / 1e6)
            ),
            OUTER_RADIUS.to_string(),
        ])
    } else {
        PieRadius::Outer(OUTER_RADIUS.to_string())
    };

    ChartOption {
        title: style.title.as_deref().map(title_option),
        legend: Some(LegendOption {
            left: "center",
            orient: "horizontal",
            bottom: None,
            top: Some(if style.title.is_some() { "bottom" } else { "center" }),
        }),
        series: vec![SeriesOption::Pie(PieSeries {
            data: slices,
            radius,
            emphasis: Emphasis {
                item_style: ItemStyle {
                    shadow_blur: 10,
                    shadow_offset_x: 0,
                    shadow_color: "rgba(0, 0, 0, 0.5)",
                },
            },
        })],
        tooltip: TooltipOption {
            trigger: TooltipTrigger::Item,
            formatter: Some("{a} <br/>{b}: {c} ({d}%)"),
        },
        x_axis: None,
        y_axis: None,
    }
}

fn title_option(text: &str) -> TitleOption {
    TitleOption {
        left: "center",
        text: text.to_string(),
        bottom: "85%",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Encoding;
    use crate::resolve::resolve_encoding;
    use serde_json::json;

    fn compile(data: serde_json::Value, encoding: Encoding, kind: ChartKind, style: &StyleOptions) -> ChartResult<ChartOption> {
        let data = RecordSet::from_json(&data).unwrap();
        let encoding = resolve_encoding(&encoding, kind)?;
        compile_option(&data, &encoding, style)
    }

    fn pie_data(n: usize) -> serde_json::Value {
        serde_json::Value::Array(
            (0..n)
                .map(|i| json!({"category": format!("Item {}", i), "value": i + 1}))
                .collect(),
        )
    }

    #[test]
    fn test_bar_option_has_no_null_for_infinite_text() {
        let option = compile(
            json!([{"c": "A", "v": "inf"}, {"c": "B", "v": "Infinity"}, {"c": "C", "v": 5}]),
            Encoding::new("c", "v"),
            ChartKind::Bar,
            &StyleOptions::default(),
        )
        .unwrap();
        let value = serde_json::to_value(&option).unwrap();
        let data = value["series"][0]["data"].as_array().unwrap();
        assert!(data.iter().all(|v| v.is_number()), "{:?}", data);
        assert_eq!(data[2].as_f64(), Some(5.0));
    }

    #[test]
    fn test_single_series_has_no_legend() {
        let option = compile(
            json!([{"category": "A", "value": 10}, {"category": "B", "value": 20}]),
            Encoding::new("category", "value"),
            ChartKind::Bar,
            &StyleOptions::default(),
        )
        .unwrap();

        assert!(option.legend.is_none());
        assert_eq!(option.tooltip.trigger, TooltipTrigger::Axis);
        assert_eq!(option.categories(), ["A".to_string(), "B".to_string()]);

        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["series"][0], json!({"data": [10.0, 20.0], "type": "bar"}));
        assert_eq!(json["xAxis"], json!({"data": ["A", "B"], "type": "category"}));
        assert_eq!(json["yAxis"], json!({"type": "value"}));
        assert!(json.get("legend").is_none());
    }

    #[test]
    fn test_multi_series_shows_legend() {
        let option = compile(
            json!([{"q": "Q1", "sales": 1, "marketing": 2}]),
            Encoding::new("q", vec!["sales", "marketing"]),
            ChartKind::Bar,
            &StyleOptions::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(
            json["legend"],
            json!({"left": "center", "orient": "horizontal", "bottom": 10})
        );
    }

    #[test]
    fn test_stacked_bars_share_stack_key() {
        let style = StyleOptions {
            position: BarPosition::Stack,
            ..Default::default()
        };
        let option = compile(
            json!([
                {"q": "Q1", "v": 1, "p": "A"},
                {"q": "Q1", "v": 2, "p": "B"}
            ]),
            Encoding::new("q", "v").with_group("p"),
            ChartKind::Bar,
            &style,
        )
        .unwrap();
        for series in &option.series {
            match series {
                SeriesOption::Bar(b) => assert_eq!(b.stack.as_deref(), Some("total")),
                other => panic!("expected bar series, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_line_option_shape() {
        let style = StyleOptions {
            smooth: true,
            show_area: true,
            ..Default::default()
        };
        let option = compile(
            json!([{"m": "Jan", "v": 1}, {"m": "Feb"}]),
            Encoding::new("m", "v"),
            ChartKind::Line,
            &style,
        )
        .unwrap();
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(
            json["series"][0],
            json!({
                "data": [null, 1.0],
                "type": "line",
                "smooth": true,
                "areaStyle": {},
                "showSymbol": true
            })
        );
        assert_eq!(json["xAxis"]["boundaryGap"], json!(false));
    }

    #[test]
    fn test_pie_option_shape() {
        let style = StyleOptions {
            title: Some("Share".into()),
            inner_radius: 0.4,
            ..Default::default()
        };
        let option = compile(pie_data(3), Encoding::new("category", "value"), ChartKind::Pie, &style).unwrap();
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["tooltip"]["trigger"], json!("item"));
        assert_eq!(json["legend"]["top"], json!("bottom"));
        assert_eq!(json["series"][0]["radius"], json!(["40%", "70%"]));
        assert_eq!(json["series"][0]["data"][0], json!({"name": "Item 0", "value": 1.0}));
        assert_eq!(json["title"]["text"], json!("Share"));
        assert!(json.get("xAxis").is_none());
    }

    #[test]
    fn test_pie_default_radius_and_legend() {
        let option = compile(pie_data(1), Encoding::new("category", "value"), ChartKind::Pie, &StyleOptions::default()).unwrap();
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["series"][0]["radius"], json!("70%"));
        assert_eq!(json["legend"]["top"], json!("center"));
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_pie_cardinality_bounds() {
        let style = StyleOptions::default();
        for n in [1, 10] {
            assert!(compile(pie_data(n), Encoding::new("category", "value"), ChartKind::Pie, &style).is_ok());
        }
        for n in [0, 11] {
            let err = compile(pie_data(n), Encoding::new("category", "value"), ChartKind::Pie, &style).unwrap_err();
            assert!(matches!(err, ChartError::Cardinality { count, .. } if count == n));
        }
    }

    #[test]
    fn test_check_cardinality_ignores_unbounded_kinds() {
        assert!(check_cardinality(ChartKind::Bar, 0).is_ok());
        assert!(check_cardinality(ChartKind::Line, 500).is_ok());
    }

    #[test]
    fn test_invalid_inner_radius() {
        let style = StyleOptions {
            inner_radius: 0.95,
            ..Default::default()
        };
        let err = compile(pie_data(2), Encoding::new("category", "value"), ChartKind::Pie, &style).unwrap_err();
        assert!(matches!(err, ChartError::Configuration(_)));
    }

    #[test]
    fn test_pie_radius_fractions() {
        assert_eq!(PieRadius::Outer("70%".into()).fractions(), (0.0, 0.7));
        let (inner, outer) = PieRadius::Ring(["40%".into(), "70%".into()]).fractions();
        assert!((inner - 0.4).abs() < 1e-9);
        assert!((outer - 0.7).abs() < 1e-9);
    }
}
