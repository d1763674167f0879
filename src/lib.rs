// Library exports for chartspec

pub mod data;
pub mod error;
pub mod graph;
pub mod palette;
pub mod parser;
pub mod runtime;
pub mod spec;

// Pipeline phases
pub mod ir;
pub mod resolve;
pub mod transform;
pub mod compiler;

pub use compiler::ChartOption;
pub use data::{FieldValue, Record, RecordSet};
pub use error::{ChartError, ChartResult};
pub use ir::{ChartKind, Encoding, FieldSelection};
pub use runtime::{generate_chart, ChartOutput, ChartRequest, PlottersRenderer, Renderer};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
    /// Return the declarative specification instead of an image.
    #[serde(rename = "option")]
    Option,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    #[serde(default)]
    pub theme: Theme,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
            theme: Theme::Default,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> ChartResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ChartError::configuration(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// How bar series sharing a category are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BarPosition {
    #[default]
    Dodge,
    Stack,
}

/// Per-kind presentation settings. Fields that do not apply to a kind are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: BarPosition,
    #[serde(default)]
    pub smooth: bool,
    #[serde(default)]
    pub show_area: bool,
    #[serde(default = "default_show_symbol")]
    pub show_symbol: bool,
    /// Donut hole as a fraction of the radius, 0 to 0.9.
    #[serde(default)]
    pub inner_radius: f64,
}

fn default_show_symbol() -> bool { true }

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            title: None,
            position: BarPosition::Dodge,
            smooth: false,
            show_area: false,
            show_symbol: true,
            inner_radius: 0.0,
        }
    }
}

impl StyleOptions {
    pub fn validate(&self) -> ChartResult<()> {
        if !(0.0..=0.9).contains(&self.inner_radius) {
            return Err(ChartError::configuration(format!(
                "inner radius must be between 0 and 0.9, got {}",
                self.inner_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_defaults() {
        let opts: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, RenderOptions::default());

        let opts: RenderOptions =
            serde_json::from_str(r#"{"width": 400, "type": "option", "theme": "dark"}"#).unwrap();
        assert_eq!(opts.width, 400);
        assert_eq!(opts.height, 600);
        assert_eq!(opts.format, OutputFormat::Option);
        assert_eq!(opts.theme, Theme::Dark);
    }

    #[test]
    fn test_render_options_reject_zero_size() {
        let opts = RenderOptions {
            width: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_style_options_defaults() {
        let style: StyleOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(style, StyleOptions::default());
        assert!(style.show_symbol);

        let style: StyleOptions =
            serde_json::from_str(r#"{"showArea": true, "innerRadius": 0.6, "position": "stack"}"#)
                .unwrap();
        assert!(style.show_area);
        assert_eq!(style.position, BarPosition::Stack);
        assert!(style.validate().is_ok());
    }

    #[test]
    fn test_style_options_inner_radius_bounds() {
        for bad in [-0.1, 0.91] {
            let style = StyleOptions {
                inner_radius: bad,
                ..Default::default()
            };
            assert!(matches!(style.validate(), Err(ChartError::Configuration(_))));
        }
    }
}
