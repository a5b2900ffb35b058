//! Chart elements drawn with `genpdf` primitives.
//!
//! `genpdf` ships no chart support, so the elements here draw directly on the render area: bars are
//! filled with closely spaced strokes, labels are printed with [`render::Area::print_str`], and
//! the correlation heatmap is rasterised with the [`image`] crate and embedded as an image.  Every
//! element claims the whole area it is given, so the element after it starts on a new page.

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};

use genpdf::elements::Image;
use genpdf::error::Error;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Element, Mm, Position, RenderResult, Scale};

use crate::model::{BarChart, BarOrientation, Heatmap, ValueFormat};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

/// Sky blue, shared by every bar.
pub const BAR_COLOR: Color = Color::Rgb(135, 206, 235);
const AXIS_COLOR: Color = Color::Rgb(70, 70, 70);
const GRID_COLOR: Color = Color::Rgb(225, 225, 225);
const MISSING_CELL_COLOR: [u8; 3] = [200, 200, 200];

const MIN_CHART_HEIGHT_MM: f64 = 60.0;
const FILL_STEP_MM: f64 = 0.2;
const TITLE_FONT_SIZE: u8 = 16;
const LABEL_FONT_SIZE: u8 = 9;
const SMALL_FONT_SIZE: u8 = 7;
const NOTICE_FONT_SIZE: u8 = 14;
const MAX_BAR_THICKNESS_MM: f64 = 14.0;
const HEATMAP_CELL_PX: u32 = 24;
const LEGEND_WIDTH_MM: f64 = 6.0;
const LEGEND_ROOM_MM: f64 = 28.0;

fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Drawing helpers working in plain millimetre coordinates relative to the area origin.
struct Canvas<'c, 'a> {
    context: &'c genpdf::Context,
    area: &'c render::Area<'a>,
}

impl<'c, 'a> Canvas<'c, 'a> {
    fn line(&self, points: &[(f64, f64)], color: Color) {
        let points: Vec<Position> = points
            .iter()
            .map(|(x, y)| Position::new(mm(*x), mm(*y)))
            .collect();
        self.area.draw_line(points, Style::new().with_color(color));
    }

    fn fill_rect(&self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        if width < height {
            let mut offset = 0.0;
            while offset <= width {
                self.line(&[(x + offset, y), (x + offset, y + height)], color);
                offset += FILL_STEP_MM;
            }
        } else {
            let mut offset = 0.0;
            while offset <= height {
                self.line(&[(x, y + offset), (x + width, y + offset)], color);
                offset += FILL_STEP_MM;
            }
        }
    }

    fn text_width(&self, text: &str, style: Style) -> f64 {
        mm_to_f64(StyledString::new(text.to_string(), style).width(&self.context.font_cache))
    }

    fn line_height(&self, style: Style) -> f64 {
        mm_to_f64(style.line_height(&self.context.font_cache))
    }

    /// Prints `text` with its top-left corner at `(x, y)`.
    fn text(&self, x: f64, y: f64, text: &str, style: Style) -> Result<(), Error> {
        self.area
            .print_str(&self.context.font_cache, Position::new(mm(x), mm(y)), style, text)?;
        Ok(())
    }

    fn text_centered(&self, center_x: f64, y: f64, text: &str, style: Style) -> Result<(), Error> {
        let x = center_x - self.text_width(text, style) / 2.0;
        self.text(x, y, text, style)
    }

    fn text_right(&self, right_x: f64, y: f64, text: &str, style: Style) -> Result<(), Error> {
        let x = right_x - self.text_width(text, style);
        self.text(x, y, text, style)
    }
}

fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let base = 10f64.powf(raw.log10().floor());
    let fraction = raw / base;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * base
}

/// Value axis covering zero and every bar, extended to round tick positions.
#[derive(Clone, Debug, PartialEq)]
struct ValueAxis {
    min: f64,
    max: f64,
    step: f64,
}

impl ValueAxis {
    fn for_values(values: impl IntoIterator<Item = f64>) -> Self {
        let (mut lo, mut hi) = (0.0f64, 0.0f64);
        for value in values.into_iter().filter(|value| value.is_finite()) {
            lo = lo.min(value);
            hi = hi.max(value);
        }
        if hi - lo <= 0.0 {
            hi = lo + 1.0;
        }
        let step = nice_step((hi - lo) / 5.0);
        Self {
            min: (lo / step).floor() * step,
            max: (hi / step).ceil() * step,
            step,
        }
    }

    /// Position of `value` as a fraction of the axis length.
    fn fraction(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    fn ticks(&self) -> Vec<f64> {
        let count = ((self.max - self.min) / self.step).round() as usize;
        (0..=count)
            .map(|index| self.min + index as f64 * self.step)
            .collect()
    }
}

fn chart_too_small(area: &render::Area<'_>) -> bool {
    mm_to_f64(area.size().height) < MIN_CHART_HEIGHT_MM
}

fn postpone() -> RenderResult {
    let mut result = RenderResult::default();
    result.has_more = true;
    result
}

fn fill_area(area: &render::Area<'_>) -> RenderResult {
    let mut result = RenderResult::default();
    result.size = area.size();
    result
}

/// Prints the chart title centered at the top and returns the height it used.
fn draw_title(
    canvas: &Canvas<'_, '_>,
    width: f64,
    title: &str,
    style: Style,
) -> Result<f64, Error> {
    let title_style = style.bold().with_font_size(TITLE_FONT_SIZE);
    canvas.text_centered(width / 2.0, 0.0, title, title_style)?;
    Ok(canvas.line_height(title_style))
}

/// Renders a [`BarChart`] over the full area it receives.
pub struct BarChartElement {
    chart: BarChart,
}

impl BarChartElement {
    pub fn new(chart: BarChart) -> Self {
        Self { chart }
    }

    fn render_horizontal(
        &self,
        canvas: &Canvas<'_, '_>,
        width: f64,
        height: f64,
        style: Style,
    ) -> Result<(), Error> {
        let label_style = style.with_font_size(LABEL_FONT_SIZE);
        let axis_style = label_style.italic();
        let line_height = canvas.line_height(label_style);

        let top = draw_title(canvas, width, self.chart.title(), style)? + 6.0;
        let bottom = height - 2.0 * line_height - 4.0;
        let bars = self.chart.bars();

        let label_width = bars
            .iter()
            .map(|bar| canvas.text_width(bar.label(), label_style))
            .fold(0.0, f64::max)
            .min(width * 0.35);
        let annotation_width = bars
            .iter()
            .map(|bar| canvas.text_width(bar.annotation(), label_style))
            .fold(0.0, f64::max);
        let left = label_width + 4.0;
        let right = width - annotation_width - 4.0;
        let plot_width = (right - left).max(1.0);

        canvas.text_centered(
            left + plot_width / 2.0,
            height - line_height,
            self.chart.value_axis(),
            axis_style,
        )?;

        if bars.is_empty() {
            canvas.text_centered(
                left + plot_width / 2.0,
                (top + bottom) / 2.0,
                "No champions to display.",
                label_style,
            )?;
            return Ok(());
        }

        let axis = ValueAxis::for_values(bars.iter().map(|bar| bar.value()));
        let x_of = |value: f64| left + axis.fraction(value) * plot_width;

        for tick in axis.ticks() {
            let x = x_of(tick);
            canvas.line(&[(x, top), (x, bottom)], GRID_COLOR);
            canvas.text_centered(x, bottom + 1.0, &ValueFormat::Natural.format(tick), label_style)?;
        }

        let band = (bottom - top) / bars.len() as f64;
        let thickness = (band * 0.7).min(MAX_BAR_THICKNESS_MM);
        let zero = x_of(0.0);

        // First bar at the top.
        for (index, bar) in bars.iter().enumerate() {
            let center = top + band * (index as f64 + 0.5);
            let end = x_of(bar.value());
            let (start, stop) = if end < zero { (end, zero) } else { (zero, end) };
            canvas.fill_rect(start, center - thickness / 2.0, stop - start, thickness, BAR_COLOR);

            let text_y = center - line_height / 2.0;
            canvas.text_right(left - 2.0, text_y, bar.label(), label_style)?;
            canvas.text(stop + 1.5, text_y, bar.annotation(), label_style)?;
        }

        canvas.line(&[(zero, top), (zero, bottom)], AXIS_COLOR);
        canvas.line(&[(left, bottom), (right, bottom)], AXIS_COLOR);
        Ok(())
    }

    fn render_vertical(
        &self,
        canvas: &Canvas<'_, '_>,
        width: f64,
        height: f64,
        style: Style,
    ) -> Result<(), Error> {
        let label_style = style.with_font_size(LABEL_FONT_SIZE);
        let axis_style = label_style.italic();
        let line_height = canvas.line_height(label_style);

        let title_height = draw_title(canvas, width, self.chart.title(), style)?;
        canvas.text(0.0, title_height + 2.0, self.chart.value_axis(), axis_style)?;
        let top = title_height + line_height + 8.0;
        let bottom = height - 2.0 * line_height - 4.0;
        let bars = self.chart.bars();

        let axis = ValueAxis::for_values(bars.iter().map(|bar| bar.value()));
        let ticks = axis.ticks();
        let tick_width = ticks
            .iter()
            .map(|tick| canvas.text_width(&ValueFormat::Natural.format(*tick), label_style))
            .fold(0.0, f64::max);
        let left = tick_width + 4.0;
        let right = width - 4.0;
        let plot_width = (right - left).max(1.0);

        if let Some(category_axis) = self.chart.category_axis() {
            canvas.text_centered(
                left + plot_width / 2.0,
                height - line_height,
                category_axis,
                axis_style,
            )?;
        }

        if bars.is_empty() {
            canvas.text_centered(
                left + plot_width / 2.0,
                (top + bottom) / 2.0,
                "No champions to display.",
                label_style,
            )?;
            return Ok(());
        }

        let y_of = |value: f64| bottom - axis.fraction(value) * (bottom - top);
        for tick in &ticks {
            let y = y_of(*tick);
            canvas.line(&[(left, y), (right, y)], GRID_COLOR);
            canvas.text_right(
                left - 2.0,
                y - line_height / 2.0,
                &ValueFormat::Natural.format(*tick),
                label_style,
            )?;
        }

        let band = plot_width / bars.len() as f64;
        let thickness = (band * 0.6).min(MAX_BAR_THICKNESS_MM * 2.0);
        let zero = y_of(0.0);

        for (index, bar) in bars.iter().enumerate() {
            let center = left + band * (index as f64 + 0.5);
            let end = y_of(bar.value());
            let (upper, lower) = if end < zero { (end, zero) } else { (zero, end) };
            canvas.fill_rect(center - thickness / 2.0, upper, thickness, lower - upper, BAR_COLOR);

            canvas.text_centered(center, upper - line_height - 1.0, bar.annotation(), label_style)?;
            canvas.text_centered(center, bottom + 1.0, bar.label(), label_style)?;
        }

        canvas.line(&[(left, zero), (right, zero)], AXIS_COLOR);
        canvas.line(&[(left, top), (left, bottom)], AXIS_COLOR);
        Ok(())
    }
}

impl Element for BarChartElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        if chart_too_small(&area) {
            return Ok(postpone());
        }

        let size = area.size();
        let (width, height) = (mm_to_f64(size.width), mm_to_f64(size.height));
        let canvas = Canvas {
            context,
            area: &area,
        };
        match self.chart.orientation() {
            BarOrientation::Horizontal => self.render_horizontal(&canvas, width, height, style)?,
            BarOrientation::Vertical => self.render_vertical(&canvas, width, height, style)?,
        }

        Ok(fill_area(&area))
    }
}

/// A single centered message on a page of its own.
pub struct NoticeElement {
    message: String,
}

impl NoticeElement {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Element for NoticeElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        if chart_too_small(&area) {
            return Ok(postpone());
        }

        let width = mm_to_f64(area.size().width);
        let canvas = Canvas {
            context,
            area: &area,
        };
        let notice_style = style.bold().with_font_size(NOTICE_FONT_SIZE);
        canvas.text_centered(width / 2.0, 30.0, &self.message, notice_style)?;

        Ok(fill_area(&area))
    }
}

/// Diverging blue-white-red colour for a coefficient in `[-1, 1]`; grey when undefined.
pub fn correlation_color(value: f64) -> [u8; 3] {
    if !value.is_finite() {
        return MISSING_CELL_COLOR;
    }
    const NEGATIVE: [f64; 3] = [59.0, 76.0, 192.0];
    const NEUTRAL: [f64; 3] = [245.0, 245.0, 245.0];
    const POSITIVE: [f64; 3] = [180.0, 4.0, 38.0];

    let value = value.clamp(-1.0, 1.0);
    let (from, to, mix) = if value < 0.0 {
        (NEUTRAL, NEGATIVE, -value)
    } else {
        (NEUTRAL, POSITIVE, value)
    };
    let mut channels = [0u8; 3];
    for (index, channel) in channels.iter_mut().enumerate() {
        *channel = (from[index] + (to[index] - from[index]) * mix)
            .round()
            .clamp(0.0, 255.0) as u8;
    }
    channels
}

fn rgb(channels: [u8; 3]) -> Color {
    Color::Rgb(channels[0], channels[1], channels[2])
}

/// Rasterises the matrix, one square block of pixels per cell.
fn heatmap_image(labels: usize, values: &[Vec<f64>]) -> DynamicImage {
    let side = labels as u32 * HEATMAP_CELL_PX;
    let buffer = ImageBuffer::from_fn(side, side, |x, y| {
        let row = (y / HEATMAP_CELL_PX) as usize;
        let column = (x / HEATMAP_CELL_PX) as usize;
        let value = values
            .get(row)
            .and_then(|cells| cells.get(column))
            .copied()
            .unwrap_or(f64::NAN);
        Rgb(correlation_color(value))
    });
    DynamicImage::ImageRgb8(buffer)
}

fn natural_width_mm(image: &DynamicImage) -> f64 {
    MM_PER_INCH * f64::from(image.width()) / DEFAULT_IMAGE_DPI
}

/// Renders a [`Heatmap`] with row and column labels, cell values and a colour legend.
pub struct HeatmapElement {
    title: String,
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
    image: Option<(Image, f64)>,
}

impl HeatmapElement {
    pub fn new(heatmap: &Heatmap) -> Result<Self, Error> {
        let matrix = heatmap.matrix();
        let labels = matrix.labels().to_vec();
        let values: Vec<Vec<f64>> = (0..labels.len())
            .map(|row| (0..labels.len()).map(|column| matrix.get(row, column)).collect())
            .collect();

        let image = if labels.is_empty() {
            None
        } else {
            let raster = heatmap_image(labels.len(), &values);
            let natural_width = natural_width_mm(&raster);
            Some((Image::from_dynamic_image(raster)?, natural_width))
        };

        Ok(Self {
            title: heatmap.title().to_string(),
            labels,
            values,
            image,
        })
    }

    fn draw_legend(
        &self,
        canvas: &Canvas<'_, '_>,
        x: f64,
        top: f64,
        side: f64,
        style: Style,
    ) -> Result<(), Error> {
        let mut offset = 0.0;
        while offset <= side {
            let value = 1.0 - 2.0 * offset / side;
            canvas.line(
                &[(x, top + offset), (x + LEGEND_WIDTH_MM, top + offset)],
                rgb(correlation_color(value)),
            );
            offset += FILL_STEP_MM;
        }

        let line_height = canvas.line_height(style);
        for (value, y) in [(1.0, top), (0.0, top + side / 2.0), (-1.0, top + side)] {
            canvas.text(
                x + LEGEND_WIDTH_MM + 1.5,
                y - line_height / 2.0,
                &format!("{value:.1}"),
                style,
            )?;
        }
        Ok(())
    }
}

impl Element for HeatmapElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        if chart_too_small(&area) {
            return Ok(postpone());
        }

        let size = area.size();
        let (width, height) = (mm_to_f64(size.width), mm_to_f64(size.height));
        let canvas = Canvas {
            context,
            area: &area,
        };

        let label_style = style.with_font_size(LABEL_FONT_SIZE);
        let small_style = style.with_font_size(SMALL_FONT_SIZE);
        let line_height = canvas.line_height(label_style);
        let small_line_height = canvas.line_height(small_style);
        let top = draw_title(&canvas, width, &self.title, style)? + 6.0;

        let Some((image, natural_width)) = self.image.as_mut() else {
            canvas.text_centered(
                width / 2.0,
                height / 2.0,
                "Not enough data to compute correlations.",
                label_style,
            )?;
            return Ok(fill_area(&area));
        };

        let label_width = self
            .labels
            .iter()
            .map(|label| canvas.text_width(label, label_style))
            .fold(0.0, f64::max);
        let left = label_width + 4.0;
        let available_width = width - left - LEGEND_ROOM_MM;
        let available_height = height - top - 2.0 * line_height - 4.0;
        let side = available_width.min(available_height).max(1.0) - 0.5;
        let cell = side / self.labels.len() as f64;

        let scale = side / *natural_width;
        image.set_scale(Scale::new(scale, scale));
        let mut image_area = area.clone();
        image_area.add_offset(Position::new(mm(left), mm(top)));
        image.render(context, image_area, style)?;

        for (row, label) in self.labels.iter().enumerate() {
            let center = top + cell * (row as f64 + 0.5);
            canvas.text_right(left - 2.0, center - line_height / 2.0, label, label_style)?;

            for column in 0..self.labels.len() {
                let value = self.values[row][column];
                if !value.is_finite() {
                    continue;
                }
                let color = if value.abs() > 0.6 {
                    Color::Rgb(255, 255, 255)
                } else {
                    Color::Rgb(0, 0, 0)
                };
                canvas.text_centered(
                    left + cell * (column as f64 + 0.5),
                    center - small_line_height / 2.0,
                    &format!("{value:.2}"),
                    small_style.with_color(color),
                )?;
            }
        }

        // Alternate rows so long neighbouring labels do not overlap.
        for (column, label) in self.labels.iter().enumerate() {
            let y = top + side + 1.5 + (column % 2) as f64 * line_height;
            canvas.text_centered(left + cell * (column as f64 + 0.5), y, label, label_style)?;
        }

        self.draw_legend(&canvas, left + side + 8.0, top, side, small_style)?;

        Ok(fill_area(&area))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nice_steps_round_to_one_two_five() {
        assert_eq!(nice_step(0.6), 1.0);
        assert_eq!(nice_step(1600.0), 2000.0);
        assert_eq!(nice_step(3.0), 5.0);
        assert!((nice_step(0.067) - 0.1).abs() < 1e-12);
        assert_eq!(nice_step(0.0), 1.0);
    }

    #[test]
    fn value_axis_spans_zero_and_values() {
        let axis = ValueAxis::for_values([3.0, 1.0, 2.0]);
        assert_eq!(axis.ticks(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(axis.fraction(0.0), 0.0);
        assert_eq!(axis.fraction(3.0), 1.0);

        let negative = ValueAxis::for_values([-50.0, 100.0]);
        assert!(negative.min <= -50.0 && negative.max >= 100.0);
        assert!(negative.fraction(0.0) > 0.0);
    }

    #[test]
    fn value_axis_of_no_values_is_unit() {
        let axis = ValueAxis::for_values(std::iter::empty());
        assert_eq!((axis.min, axis.max), (0.0, 1.0));
    }

    #[test]
    fn correlation_colors_diverge_from_neutral() {
        assert_eq!(correlation_color(0.0), [245, 245, 245]);
        assert_eq!(correlation_color(1.0), [180, 4, 38]);
        assert_eq!(correlation_color(-1.0), [59, 76, 192]);
        assert_eq!(correlation_color(f64::NAN), MISSING_CELL_COLOR);
    }

    #[test]
    fn heatmap_image_has_one_block_per_cell() {
        let values = vec![vec![1.0, -1.0], vec![-1.0, f64::NAN]];
        let image = heatmap_image(2, &values);
        assert_eq!(image.dimensions(), (2 * HEATMAP_CELL_PX, 2 * HEATMAP_CELL_PX));
        let rgb = image.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [180, 4, 38]);
        assert_eq!(rgb.get_pixel(HEATMAP_CELL_PX, 0).0, [59, 76, 192]);
        assert_eq!(
            rgb.get_pixel(HEATMAP_CELL_PX, HEATMAP_CELL_PX).0,
            MISSING_CELL_COLOR
        );
    }
}
