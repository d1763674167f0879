// Runtime executor: request -> encoding -> series -> option -> output

use crate::compiler::{check_cardinality, compile_option, ChartOption};
use crate::data::RecordSet;
use crate::error::{ChartError, ChartResult};
use crate::graph;
use crate::ir::{ChartKind, Encoding};
use crate::resolve::resolve_encoding;
use crate::spec::ChartSpecification;
use crate::{OutputFormat, RenderOptions, StyleOptions};
use serde::Deserialize;
use tracing::{debug, info};

/// A complete chart request as accepted from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartRequest {
    pub data: RecordSet,
    pub encoding: Encoding,
    #[serde(flatten)]
    pub style: StyleOptions,
    #[serde(flatten)]
    pub render: RenderOptions,
}

impl ChartRequest {
    pub fn new(data: RecordSet, encoding: Encoding) -> Self {
        Self {
            data,
            encoding,
            style: StyleOptions::default(),
            render: RenderOptions::default(),
        }
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Result of one chart invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutput {
    /// Pretty-printed declarative specification.
    Specification(String),
    Image { format: OutputFormat, bytes: Vec<u8> },
}

impl ChartOutput {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ChartOutput::Specification(text) => text.as_bytes(),
            ChartOutput::Image { bytes, .. } => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ChartOutput::Specification(text) => text.into_bytes(),
            ChartOutput::Image { bytes, .. } => bytes,
        }
    }
}

/// Turns an assembled chart option into image bytes.
pub trait Renderer {
    fn render(&self, option: &ChartOption, options: &RenderOptions) -> ChartResult<Vec<u8>>;
}

/// PNG/SVG rendering with plotters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

impl Renderer for PlottersRenderer {
    fn render(&self, option: &ChartOption, options: &RenderOptions) -> ChartResult<Vec<u8>> {
        graph::render(option, options).map_err(|e| ChartError::render(format!("{:#}", e)))
    }
}

/// Generate a chart with the default plotters renderer.
pub fn generate_chart(kind: ChartKind, request: &ChartRequest) -> ChartResult<ChartOutput> {
    generate_chart_with(kind, request, &PlottersRenderer)
}

/// Generate a chart, handing image output to `renderer`.
#[tracing::instrument(skip(request, renderer), fields(records = request.data.len()))]
pub fn generate_chart_with<R: Renderer + ?Sized>(
    kind: ChartKind,
    request: &ChartRequest,
    renderer: &R,
) -> ChartResult<ChartOutput> {
    request.render.validate()?;
    request.style.validate()?;
    let encoding = resolve_encoding(&request.encoding, kind)?;

    if request.render.format == OutputFormat::Option {
        // Bounds apply to the specification output as well.
        check_cardinality(kind, request.data.len())?;
        let spec = ChartSpecification::new(kind, &request.data, &request.encoding);
        debug!("returning declarative specification");
        return Ok(ChartOutput::Specification(spec.to_json_pretty()?));
    }

    let option = compile_option(&request.data, &encoding, &request.style)?;
    let bytes = renderer.render(&option, &request.render)?;
    info!(
        format = ?request.render.format,
        bytes = bytes.len(),
        "rendered chart"
    );

    Ok(ChartOutput::Image {
        format: request.render.format,
        bytes,
    })
}
