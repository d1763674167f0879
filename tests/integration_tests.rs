use chartspec::compiler::{compile_option, ChartOption, SeriesOption};
use chartspec::resolve::resolve_encoding;
use chartspec::{
    generate_chart, ChartError, ChartKind, ChartOutput, ChartRequest, ChartResult, Encoding,
    OutputFormat, RecordSet, RenderOptions, Renderer, StyleOptions,
};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

/// Helper function to run the chartspec binary with optional stdin input
fn run_chartspec(args: &[&str], stdin: Option<&str>) -> Result<Vec<u8>, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_chartspec"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle
                .write_all(input.as_bytes())
                .map_err(|e| format!("Failed to write to stdin: {}", e))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn quarterly() -> RecordSet {
    let csv = fs::read_to_string("tests/data/quarterly.csv").expect("Failed to read test CSV");
    RecordSet::from_csv(csv.as_bytes()).unwrap()
}

fn compile(kind: ChartKind, data: &RecordSet, encoding: &Encoding) -> ChartResult<ChartOption> {
    let resolved = resolve_encoding(encoding, kind)?;
    compile_option(data, &resolved, &StyleOptions::default())
}

fn bar_data(series: &SeriesOption) -> &[f64] {
    match series {
        SeriesOption::Bar(bar) => &bar.data,
        other => panic!("expected bar series, got {:?}", other),
    }
}

fn line_data(series: &SeriesOption) -> &[Option<f64>] {
    match series {
        SeriesOption::Line(line) => &line.data,
        other => panic!("expected line series, got {:?}", other),
    }
}

/// Stands in for an image backend
struct StubRenderer;

impl Renderer for StubRenderer {
    fn render(&self, _option: &ChartOption, _options: &RenderOptions) -> ChartResult<Vec<u8>> {
        Ok(vec![0u8; 4])
    }
}

#[test]
fn test_basic_bar_chart() {
    let data = RecordSet::from_json(&json!([
        {"category": "A", "value": 10},
        {"category": "B", "value": 20},
        {"category": "C", "value": 15}
    ]))
    .unwrap();
    let option = compile(ChartKind::Bar, &data, &Encoding::new("category", "value")).unwrap();

    assert_eq!(option.categories(), ["A", "B", "C"]);
    assert_eq!(option.series.len(), 1);
    assert_eq!(bar_data(&option.series[0]), [10.0, 20.0, 15.0]);
    assert!(option.legend.is_none());
}

#[test]
fn test_grouped_multi_field_bar_from_csv() {
    let data = quarterly();
    let enc = Encoding::new("quarter", vec!["sales", "profit"]).with_group("product");
    let option = compile(ChartKind::Bar, &data, &enc).unwrap();

    assert_eq!(option.categories(), ["Q1", "Q2", "Q3"]);
    let names: Vec<_> = option.series.iter().map(|s| s.name().unwrap_or("")).collect();
    assert_eq!(names, ["P1 - sales", "P1 - profit", "P2 - sales", "P2 - profit"]);

    // Empty CSV cell and absent record both fill with zero
    assert_eq!(bar_data(&option.series[2]), [80.0, 90.0, 0.0]);
    assert_eq!(bar_data(&option.series[3]), [15.0, 0.0, 0.0]);
    assert!(option.legend.is_some());
}

#[test]
fn test_grouped_line_keeps_gaps() {
    let data = quarterly();
    let enc = Encoding::new("quarter", "profit").with_group("product");
    let option = compile(ChartKind::Line, &data, &enc).unwrap();

    assert_eq!(option.series.len(), 2);
    assert_eq!(line_data(&option.series[0]), [Some(20.0), Some(25.0), Some(30.0)]);
    assert_eq!(line_data(&option.series[1]), [Some(15.0), None, None]);

    let value = serde_json::to_value(&option).unwrap();
    assert_eq!(value["xAxis"]["boundaryGap"], json!(false));
    assert_eq!(value["series"][1]["data"][1], Value::Null);
}

#[test]
fn test_line_axis_is_sorted() {
    let data = RecordSet::from_json(&json!([
        {"date": "2024-03", "v": 3},
        {"date": "2024-01", "v": 1},
        {"date": "2024-02", "v": 2}
    ]))
    .unwrap();
    let option = compile(ChartKind::Line, &data, &Encoding::new("date", "v")).unwrap();
    assert_eq!(option.categories(), ["2024-01", "2024-02", "2024-03"]);
    assert_eq!(line_data(&option.series[0]), [Some(1.0), Some(2.0), Some(3.0)]);
}

#[test]
fn test_duplicate_x_first_record_wins() {
    let data = RecordSet::from_json(&json!([
        {"x": "a", "v": 1},
        {"x": "a", "v": 2},
        {"x": "b", "v": 3}
    ]))
    .unwrap();
    let option = compile(ChartKind::Bar, &data, &Encoding::new("x", "v")).unwrap();
    assert_eq!(option.categories(), ["a", "b"]);
    assert_eq!(bar_data(&option.series[0]), [1.0, 3.0]);
}

#[test]
fn test_pie_cardinality_bounds() {
    let records = |n: usize| -> RecordSet {
        let values: Vec<Value> = (0..n).map(|i| json!({"name": format!("s{}", i), "v": i + 1})).collect();
        RecordSet::from_json(&Value::Array(values)).unwrap()
    };
    let enc = Encoding::new("name", "v");

    for n in [0, 11] {
        let err = compile(ChartKind::Pie, &records(n), &enc).unwrap_err();
        assert!(
            matches!(err, ChartError::Cardinality { count, min: 1, max: 10, .. } if count == n),
            "unexpected error for {} records: {}",
            n,
            err
        );
    }
    for n in [1, 10] {
        let option = compile(ChartKind::Pie, &records(n), &enc).unwrap();
        let value = serde_json::to_value(&option).unwrap();
        assert_eq!(value["series"][0]["data"].as_array().unwrap().len(), n);
        assert_eq!(value["tooltip"]["trigger"], json!("item"));
    }
}

#[test]
fn test_pie_rejects_grouping() {
    let data = RecordSet::from_json(&json!([{"n": "a", "v": 1, "g": "x"}])).unwrap();
    let err = compile(ChartKind::Pie, &data, &Encoding::new("n", "v").with_group("g")).unwrap_err();
    assert!(matches!(err, ChartError::Configuration(_)));
}

#[test]
fn test_option_output_echoes_request() {
    let request = ChartRequest::from_json_str(
        r#"{
            "data": [{"name": "A", "profitability": 89.02, "date": "2024-01-01"}],
            "encoding": {"x": "date", "y": "profitability"},
            "type": "option"
        }"#,
    )
    .unwrap();
    let output = generate_chart(ChartKind::Bar, &request).unwrap();
    let spec: Value = match output {
        ChartOutput::Specification(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected specification, got {:?}", other),
    };

    assert_eq!(
        spec["data"][0]["values"],
        json!([{"name": "A", "profitability": 89.02, "date": "2024-01-01"}])
    );
    assert_eq!(
        spec["view"]["main"]["layers"],
        json!([{"type": "bar", "encoding": {"x": "date", "y": "profitability"}}])
    );
}

#[test]
fn test_image_request_with_custom_renderer() {
    let mut request = ChartRequest::new(quarterly(), Encoding::new("quarter", "sales"));
    request.render.format = OutputFormat::Svg;
    let output = chartspec::runtime::generate_chart_with(ChartKind::Line, &request, &StubRenderer)
        .unwrap();
    assert_eq!(
        output,
        ChartOutput::Image {
            format: OutputFormat::Svg,
            bytes: vec![0u8; 4]
        }
    );
}

#[test]
fn test_svg_render() {
    let mut request = ChartRequest::new(quarterly(), Encoding::new("quarter", "sales"));
    request.render.format = OutputFormat::Svg;
    let output = generate_chart(ChartKind::Line, &request).unwrap();
    let svg = String::from_utf8(output.into_bytes()).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn test_cli_bar_option_from_csv() {
    let out = run_chartspec(
        &[
            "bar",
            "--encoding",
            "x: quarter, y: sales, z: product",
            "--input",
            "tests/data/quarterly.csv",
            "--csv",
            "--type",
            "option",
        ],
        None,
    )
    .unwrap();
    let spec: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(spec["data"][0]["values"].as_array().unwrap().len(), 5);
    assert_eq!(
        spec["view"]["main"]["layers"][0]["encoding"],
        json!({"x": "quarter", "y": "sales", "z": "product"})
    );
}

#[test]
fn test_cli_pie_png() {
    let out = run_chartspec(
        &[
            "pie",
            "--encoding",
            "x: browser, y: share",
            "--input",
            "tests/data/browsers.json",
            "--title",
            "Browser share",
            "--inner-radius",
            "0.4",
        ],
        None,
    );
    assert!(out.is_ok(), "Failed: {:?}", out.err());
    assert!(is_valid_png(&out.unwrap()), "Output is not a valid PNG");
}

#[test]
fn test_cli_reads_stdin() {
    let out = run_chartspec(
        &["line", "-e", "x: d, y: [a, b]", "--type", "option"],
        Some(r#"[{"d": "1", "a": 1, "b": 2}]"#),
    )
    .unwrap();
    let spec: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(spec["view"]["main"]["layers"][0]["type"], json!("line"));
}

#[test]
fn test_cli_pie_too_many_records() {
    let values: Vec<Value> = (0..11).map(|i| json!({"c": format!("c{}", i), "v": i})).collect();
    let input = Value::Array(values).to_string();
    let err = run_chartspec(&["pie", "-e", "x: c, y: v", "--type", "option"], Some(&input))
        .unwrap_err();
    assert!(err.contains("cardinality error"), "stderr: {}", err);
}

#[test]
fn test_cli_invalid_encoding() {
    let err = run_chartspec(&["bar", "-e", "x: a"], Some("[]")).unwrap_err();
    assert!(err.contains("y field"), "stderr: {}", err);
}

#[test]
fn test_cli_request_file() {
    let dir = std::env::temp_dir().join(format!("chartspec-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("request.json");
    fs::write(
        &path,
        r#"{"data": [{"k": "a", "v": 1}], "encoding": {"x": "k", "y": "v"}, "type": "option"}"#,
    )
    .unwrap();

    let out = run_chartspec(&["request", "pie", path.to_str().unwrap()], None).unwrap();
    let spec: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(spec["view"]["main"]["layers"][0]["type"], json!("pie"));

    fs::remove_dir_all(&dir).ok();
}
