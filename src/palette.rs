use crate::Theme;
use plotters::style::RGBColor;

/// Ordered series colors, cycled by series index.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<RGBColor>,
}

impl ColorPalette {
    /// The default categorical palette used by ECharts.
    pub fn category10() -> Self {
        Self {
            colors: vec![
                RGBColor(0x54, 0x70, 0xc6),
                RGBColor(0x91, 0xcc, 0x75),
                RGBColor(0xfa, 0xc8, 0x58),
                RGBColor(0xee, 0x66, 0x66),
                RGBColor(0x73, 0xc0, 0xde),
                RGBColor(0x3b, 0xa2, 0x72),
                RGBColor(0xfc, 0x84, 0x52),
                RGBColor(0x9a, 0x60, 0xb4),
                RGBColor(0xea, 0x7c, 0xcc),
                RGBColor(0x5d, 0x6d, 0x7e),
            ],
        }
    }

    pub fn color(&self, index: usize) -> RGBColor {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Background and foreground (text, axes) colors for a theme.
pub fn theme_colors(theme: Theme) -> (RGBColor, RGBColor) {
    match theme {
        Theme::Default => (RGBColor(255, 255, 255), RGBColor(0x33, 0x33, 0x33)),
        Theme::Dark => (RGBColor(0x10, 0x0c, 0x2a), RGBColor(0xee, 0xee, 0xee)),
    }
}
