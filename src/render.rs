//! Drawing helpers shared by the latent and rate-map figures.

use std::ops::Range;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::config::PlotStyle;
use crate::error::{Error, Result};
use crate::latent::palette::Colormap;

/// Finite min/max of a set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// `None` when no value is finite.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        (min <= max).then_some(Self { min, max })
    }

    /// Position of `v` in [0, 1]; a constant range maps everything to 0.5.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < 1e-12 {
            0.5
        } else {
            ((v - self.min) / span).clamp(0.0, 1.0)
        }
    }

    /// Axis extent padded by `frac` of the span on each side.
    pub fn padded(&self, frac: f64) -> Range<f64> {
        let span = self.max - self.min;
        if span.abs() < 1e-12 {
            (self.min - 0.5)..(self.max + 0.5)
        } else {
            (self.min - frac * span)..(self.max + frac * span)
        }
    }
}

pub const MISSING_VALUE: RGBColor = RGBColor(160, 160, 160);

/// Color for one sample value; NaN draws in gray.
pub fn value_color(cmap: Colormap, range: Option<ValueRange>, v: f64) -> RGBColor {
    match range {
        Some(range) if v.is_finite() => cmap.color(range.normalize(v)),
        _ => MISSING_VALUE,
    }
}

const COLORBAR_STEPS: usize = 64;

/// Vertical colorbar spanning `range` on `area`.
pub fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cmap: Colormap,
    range: Option<ValueRange>,
    style: &PlotStyle,
) -> Result<()> {
    let range = range.unwrap_or(ValueRange { min: 0.0, max: 1.0 });
    let extent = range.padded(0.0);
    let mut builder = ChartBuilder::on(area);
    builder.margin_top(10).margin_bottom(10).margin_right(5);
    if style.annotate {
        builder.y_label_area_size(45);
    }
    let mut chart = builder
        .build_cartesian_2d(0.0f64..1.0f64, extent.clone())
        .map_err(Error::plot)?;

    if style.annotate {
        chart
            .configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(5)
            .draw()
            .map_err(Error::plot)?;
    }

    let step = (extent.end - extent.start) / COLORBAR_STEPS as f64;
    chart
        .draw_series((0..COLORBAR_STEPS).map(|i| {
            let y0 = extent.start + i as f64 * step;
            let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
            Rectangle::new([(0.0, y0), (1.0, y0 + step)], cmap.color(t).filled())
        }))
        .map_err(Error::plot)?;
    Ok(())
}

/// Split a panel into plot area and a colorbar strip on the right.
pub fn split_for_colorbar<DB: DrawingBackend>(
    panel: &DrawingArea<DB, Shift>,
) -> (DrawingArea<DB, Shift>, DrawingArea<DB, Shift>) {
    let (width, _) = panel.dim_in_pixel();
    let plot_width = (width as f64 * 0.85) as u32;
    panel.split_horizontally(plot_width)
}

/// Pixel size of a `rows` x `cols` grid of `panel`-sized cells.
pub fn grid_canvas(panel: (u32, u32), rows: usize, cols: usize) -> Result<(u32, u32)> {
    let side = |px: u32, count: usize| {
        u32::try_from(count)
            .ok()
            .and_then(|count| px.checked_mul(count))
    };
    match (side(panel.0, cols), side(panel.1, rows)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(Error::Validation(format!(
            "{rows} x {cols} panels of {} x {} px exceed the canvas size limit",
            panel.0, panel.1
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_ignores_non_finite() {
        let range = ValueRange::of([f64::NAN, 2.0, -1.0, f64::INFINITY]).unwrap();
        assert_eq!(range, ValueRange { min: -1.0, max: 2.0 });
        assert!(ValueRange::of([f64::NAN]).is_none());
    }

    #[test]
    fn constant_range_normalizes_to_middle() {
        let range = ValueRange { min: 3.0, max: 3.0 };
        assert_eq!(range.normalize(3.0), 0.5);
        assert_eq!(range.padded(0.1), 2.5..3.5);
    }

    #[test]
    fn normalize_spans_unit_interval() {
        let range = ValueRange { min: -2.0, max: 2.0 };
        assert_eq!(range.normalize(-2.0), 0.0);
        assert_eq!(range.normalize(0.0), 0.5);
        assert_eq!(range.normalize(5.0), 1.0);
    }

    #[test]
    fn nan_values_draw_gray() {
        let range = ValueRange::of([0.0, 1.0]);
        assert_eq!(value_color(Colormap::Viridis, range, f64::NAN), MISSING_VALUE);
        assert_eq!(value_color(Colormap::Viridis, None, 0.3), MISSING_VALUE);
    }

    #[test]
    fn grid_canvas_multiplies_panels() {
        assert_eq!(grid_canvas((200, 100), 4, 3).unwrap(), (600, 400));
    }

    #[test]
    fn oversized_grid_canvas_is_rejected() {
        assert!(matches!(
            grid_canvas((200, 200), 4, usize::MAX),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            grid_canvas((200, 200), 4, u32::MAX as usize),
            Err(Error::Validation(_))
        ));
    }
}
