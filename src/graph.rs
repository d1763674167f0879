use crate::compiler::{BarSeries, ChartOption, LineSeries, PieSeries, SeriesOption};
use crate::palette::{theme_colors, ColorPalette};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const FONT: &str = "sans-serif";
const BAR_GROUP_WIDTH: f64 = 0.8;
const PIE_SEGMENTS: usize = 180;

/// Render an assembled chart option to PNG or SVG bytes.
pub fn render(option: &ChartOption, options: &RenderOptions) -> Result<Vec<u8>> {
    match options.format {
        OutputFormat::Png => render_png(option, options),
        OutputFormat::Svg => render_svg(option, options).map(String::into_bytes),
        OutputFormat::Option => {
            anyhow::bail!("the option output type is not an image format")
        }
    }
}

/// Draw into an RGB buffer and encode it as PNG
pub fn render_png(option: &ChartOption, options: &RenderOptions) -> Result<Vec<u8>> {
    let (width, height) = (options.width, options.height);
    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, option, options)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

pub fn render_svg(option: &ChartOption, options: &RenderOptions) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        draw_chart(&root, option, options)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

fn draw_chart<DB>(root: &DrawingArea<DB, Shift>, option: &ChartOption, options: &RenderOptions) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (background, foreground) = theme_colors(options.theme);
    root.fill(&background).context("Failed to fill background")?;

    let palette = ColorPalette::category10();

    match option.series.first() {
        Some(SeriesOption::Pie(pie)) => draw_pie(root, option, pie, &palette, foreground),
        _ => draw_axis_chart(root, option, &palette, background, foreground),
    }
}

// =============================================================================
// Bar / line
// =============================================================================

fn draw_axis_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    option: &ChartOption,
    palette: &ColorPalette,
    background: RGBColor,
    foreground: RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let categories = option.categories();
    let num_categories = categories.len().max(1);
    let (y_min, y_max) = value_range(option, num_categories)?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(10).x_label_area_size(40).y_label_area_size(50);
    if let Some(title) = &option.title {
        builder.caption(&title.text, (FONT, 20).into_font().color(&foreground));
    }
    let mut chart = builder
        .build_cartesian_2d(-0.5..(num_categories as f64 - 0.5), y_min..y_max)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_categories)
        .x_label_formatter(&|x| category_label(categories, *x))
        .axis_style(foreground.stroke_width(1))
        .label_style((FONT, 12).into_font().color(&foreground))
        .draw()
        .context("Failed to draw mesh")?;

    let bars: Vec<&BarSeries> = option
        .series
        .iter()
        .filter_map(|s| match s {
            SeriesOption::Bar(b) => Some(b),
            _ => None,
        })
        .collect();
    if !bars.is_empty() {
        draw_bars(&mut chart, &bars, palette)?;
    }

    for (idx, series) in option.series.iter().enumerate() {
        if let SeriesOption::Line(line) = series {
            draw_line(&mut chart, line, palette.color(idx))?;
        }
    }

    if option.legend.is_some() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerMiddle)
            .background_style(&background.mix(0.8))
            .border_style(&foreground)
            .label_font((FONT, 12).into_font().color(&foreground))
            .draw()
            .context("Failed to draw legend")?;
    }

    Ok(())
}

fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

/// Y range covering every value (stack totals included) and the zero baseline.
///
/// Non-finite values are skipped; a range that still cannot be represented
/// is an error rather than an axis plotters cannot lay out.
fn value_range(option: &ChartOption, num_categories: usize) -> Result<(f64, f64)> {
    let mut min: f64 = 0.0;
    let mut max: f64 = 0.0;
    let mut pos_stack = vec![0.0; num_categories];
    let mut neg_stack = vec![0.0; num_categories];
    let mut include = |v: f64| {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    };

    for series in &option.series {
        match series {
            SeriesOption::Bar(b) if b.stack.is_some() => {
                for (i, &v) in b.data.iter().enumerate().take(num_categories) {
                    if let Some((_, top)) = stack_step(&mut pos_stack[i], &mut neg_stack[i], v) {
                        include(top);
                    }
                }
            }
            SeriesOption::Bar(b) => b.data.iter().copied().for_each(&mut include),
            SeriesOption::Line(l) => l.data.iter().flatten().copied().for_each(&mut include),
            SeriesOption::Pie(_) => {}
        }
    }

    if min == max {
        return Ok((min - 1.0, max + 1.0));
    }
    // Halves keep the span finite for values near f64::MAX.
    let padding = (max / 2.0 - min / 2.0) * 0.1;
    let lower = if min < 0.0 { min - padding } else { min };
    let upper = max + padding;
    if !(lower.is_finite() && upper.is_finite()) {
        anyhow::bail!("value range {}..{} is too large to draw", min, max);
    }
    Ok((lower, upper))
}

/// Stack `value` onto the positive or negative running total of one category.
///
/// Returns the `(start, end)` of the stacked segment, or `None` when the value
/// or the new total is not finite (the total is then left unchanged).
fn stack_step(pos: &mut f64, neg: &mut f64, value: f64) -> Option<(f64, f64)> {
    let base = if value >= 0.0 { pos } else { neg };
    let end = *base + value;
    if !end.is_finite() {
        return None;
    }
    let start = std::mem::replace(base, end);
    Some((start, end))
}

fn draw_bars<DB>(chart: &mut Chart<'_, DB>, bars: &[&BarSeries], palette: &ColorPalette) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let num_series = bars.len();
    let stacked = bars.iter().any(|b| b.stack.is_some());
    let num_categories = bars.iter().map(|b| b.data.len()).max().unwrap_or(0);

    let mut pos_stack = vec![0.0; num_categories];
    let mut neg_stack = vec![0.0; num_categories];

    for (series_idx, bar) in bars.iter().enumerate() {
        let color = palette.color(series_idx);
        let mut rects = Vec::with_capacity(bar.data.len());

        for (cat_idx, &y_val) in bar.data.iter().enumerate() {
            let (x0, x1, y0, y1) = if stacked {
                let half = BAR_GROUP_WIDTH / 2.0;
                let Some((start, end)) =
                    stack_step(&mut pos_stack[cat_idx], &mut neg_stack[cat_idx], y_val)
                else {
                    continue;
                };
                (cat_idx as f64 - half, cat_idx as f64 + half, start, end)
            } else if y_val.is_finite() {
                // Side-by-side bars
                let slot = BAR_GROUP_WIDTH / num_series as f64;
                let offset = (series_idx as f64 - (num_series as f64 - 1.0) / 2.0) * slot;
                let center = cat_idx as f64 + offset;
                (center - slot / 2.0, center + slot / 2.0, 0.0, y_val)
            } else {
                continue;
            };
            rects.push(Rectangle::new([(x0, y1), (x1, y0)], color.filled()));
        }

        let anno = chart.draw_series(rects).context("Failed to draw bar series")?;
        if let Some(name) = &bar.name {
            anno.label(name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    Ok(())
}

/// Split a gappy series into runs of consecutive present values.
fn line_segments(data: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (i, value) in data.iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => current.push((i as f64, *v)),
            _ if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            _ => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn draw_line<DB>(chart: &mut Chart<'_, DB>, line: &LineSeries, color: RGBColor) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let segments = line_segments(&line.data);

    if line.area_style.is_some() {
        let areas = segments.iter().map(|seg| {
            let mut outline = seg.clone();
            if let (Some(first), Some(last)) = (seg.first(), seg.last()) {
                outline.push((last.0, 0.0));
                outline.push((first.0, 0.0));
            }
            Polygon::new(outline, color.mix(0.25).filled())
        });
        chart.draw_series(areas).context("Failed to draw area")?;
    }

    let anno = chart
        .draw_series(
            segments
                .iter()
                .map(|seg| PathElement::new(seg.clone(), color.stroke_width(2))),
        )
        .context("Failed to draw line series")?;
    if let Some(name) = &line.name {
        anno.label(name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(2)));
    }

    if line.show_symbol {
        chart
            .draw_series(
                segments
                    .iter()
                    .flatten()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )
            .context("Failed to draw line symbols")?;
    }

    Ok(())
}

// =============================================================================
// Pie
// =============================================================================

fn draw_pie<DB>(
    root: &DrawingArea<DB, Shift>,
    option: &ChartOption,
    pie: &PieSeries,
    palette: &ColorPalette,
    foreground: RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let area = match &option.title {
        Some(title) => root
            .titled(&title.text, (FONT, 20).into_font().color(&foreground))
            .context("Failed to draw title")?,
        None => root.clone(),
    };

    let (width, height) = area.dim_in_pixel();
    let legend_height = 30;
    let plot_height = height.saturating_sub(legend_height);
    let center = (width as f64 / 2.0, plot_height as f64 / 2.0);
    let (inner_frac, outer_frac) = pie.radius.fractions();
    let half_extent = width.min(plot_height) as f64 / 2.0;
    let (inner, outer) = (half_extent * inner_frac, half_extent * outer_frac);

    let total: f64 = pie.data.iter().map(|s| s.value.max(0.0)).sum();
    if total > 0.0 {
        // Clockwise from twelve o'clock.
        let mut start = -PI / 2.0;
        for (idx, slice) in pie.data.iter().enumerate() {
            let sweep = slice.value.max(0.0) / total * 2.0 * PI;
            if sweep <= 0.0 {
                continue;
            }
            let wedge = wedge_points(center, inner, outer, start, start + sweep);
            area.draw(&Polygon::new(wedge, palette.color(idx).filled()))
                .context("Failed to draw pie slice")?;
            start += sweep;
        }
    }

    // Legend row under the pie
    let entry_width = (width as i32 / pie.data.len().max(1) as i32).max(40);
    let legend_y = plot_height as i32 + legend_height as i32 / 2;
    for (idx, slice) in pie.data.iter().enumerate() {
        let x = idx as i32 * entry_width + 5;
        area.draw(&Rectangle::new(
            [(x, legend_y - 5), (x + 10, legend_y + 5)],
            palette.color(idx).filled(),
        ))
        .context("Failed to draw legend marker")?;
        area.draw(&Text::new(
            slice.name.clone(),
            (x + 14, legend_y - 6),
            (FONT, 12).into_font().color(&foreground),
        ))
        .context("Failed to draw legend label")?;
    }

    Ok(())
}

/// Outline of an annular sector in pixel coordinates.
fn wedge_points(center: (f64, f64), inner: f64, outer: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = ((end - start) / (2.0 * PI) * PIE_SEGMENTS as f64).ceil().max(1.0) as usize;
    let at = |r: f64, a: f64| {
        (
            (center.0 + r * a.cos()).round() as i32,
            (center.1 + r * a.sin()).round() as i32,
        )
    };

    let mut points = Vec::with_capacity(steps * 2 + 2);
    for i in 0..=steps {
        points.push(at(outer, start + (end - start) * i as f64 / steps as f64));
    }
    if inner > 0.0 {
        for i in (0..=steps).rev() {
            points.push(at(inner, start + (end - start) * i as f64 / steps as f64));
        }
    } else {
        points.push(at(0.0, start));
    }
    points
}
