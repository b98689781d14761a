use std::path::Path;

use ndarray::{ArrayView1, ArrayView2, Axis};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use super::labels::LabelTable;
use super::palette::{Colormap, PaletteRegistry};
use crate::config::PlotStyle;
use crate::error::{Error, Result};
use crate::render::{ValueRange, draw_colorbar, grid_canvas, split_for_colorbar, value_color};

/// Latent dimensionality, which decides the panel kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatentLayout {
    Line,
    Plane,
    Volume,
}

impl LatentLayout {
    pub fn for_dim(dim: usize) -> Result<Self> {
        match dim {
            1 => Ok(LatentLayout::Line),
            2 => Ok(LatentLayout::Plane),
            3 => Ok(LatentLayout::Volume),
            other => Err(Error::UnsupportedDimension(other)),
        }
    }

    /// Unscaled canvas size of one panel.
    fn panel_px(self) -> (u32, u32) {
        match self {
            LatentLayout::Line => (500, 400),
            LatentLayout::Plane => (1000, 1000),
            LatentLayout::Volume => (1000, 800),
        }
    }
}

/// One panel per label: its values and the colormap they go through.
struct LabelPanel<'a> {
    name: &'a str,
    values: &'a [f64],
    cmap: Colormap,
    range: Option<ValueRange>,
}

/// Panel grid for `n_labels`: `ceil(n_labels / 2) + 1` columns, one row
/// while that holds every label, more rows once it does not.
pub fn panel_grid(n_labels: usize) -> (usize, usize) {
    let cols = n_labels.div_ceil(2) + 1;
    (n_labels.div_ceil(cols).max(1), cols)
}

/// Scatter `points` (one row per sample) colored by each label column
/// and write the composite figure to `path`, replacing any existing file.
///
/// Every input check runs before the file is opened, so a rejected call
/// leaves `path` untouched.
pub fn plot_save_latent_space(
    path: &Path,
    points: ArrayView2<'_, f64>,
    labels: &LabelTable,
    registry: &PaletteRegistry,
    style: &PlotStyle,
) -> Result<()> {
    if points.nrows() != labels.n_rows() {
        return Err(Error::Validation(format!(
            "{} latent points but {} label rows",
            points.nrows(),
            labels.n_rows()
        )));
    }
    let names = labels.label_names();
    if names.is_empty() {
        return Err(Error::EmptyLabels);
    }
    let layout = LatentLayout::for_dim(points.ncols())?;

    let mut panels = Vec::with_capacity(names.len());
    for name in names {
        let values = labels
            .column(name)
            .ok_or_else(|| Error::Validation(format!("label column {name:?} vanished")))?;
        panels.push(LabelPanel {
            name,
            values,
            cmap: registry.lookup(name)?,
            range: ValueRange::of(values.iter().copied()),
        });
    }

    let (rows, cols) = panel_grid(panels.len());
    let (w, h) = layout.panel_px();
    let size = grid_canvas((style.scaled(w), style.scaled(h)), rows, cols)?;

    {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(Error::plot)?;
        let areas = root.split_evenly((rows, cols));
        for (area, panel) in areas.iter().zip(&panels) {
            let (plot_area, bar_area) = split_for_colorbar(area);
            match layout {
                LatentLayout::Line => draw_line_panel(&plot_area, points, panel, style)?,
                LatentLayout::Plane => draw_plane_panel(&plot_area, points, panel, style)?,
                LatentLayout::Volume => draw_volume_panel(&plot_area, points, panel, style)?,
            }
            draw_colorbar(&bar_area, panel.cmap, panel.range, style)?;
        }
        root.present().map_err(Error::plot)?;
    }

    info!(
        "saved {}D latent space with {} label panels to {}",
        points.ncols(),
        panels.len(),
        path.display()
    );
    Ok(())
}

fn axis_range(points: ArrayView2<'_, f64>, axis: usize) -> std::ops::Range<f64> {
    let column: ArrayView1<'_, f64> = points.index_axis(Axis(1), axis);
    ValueRange::of(column.iter().copied())
        .map(|r| r.padded(0.05))
        .unwrap_or(-1.0..1.0)
}

fn caption_size(style: &PlotStyle, base: u32) -> u32 {
    style.scaled(base).max(8)
}

fn draw_line_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    points: ArrayView2<'_, f64>,
    panel: &LabelPanel<'_>,
    style: &PlotStyle,
) -> Result<()> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if style.annotate {
        builder
            .caption(panel.name, ("sans-serif", caption_size(style, 30)))
            .x_label_area_size(30)
            .y_label_area_size(40);
    }
    let mut chart = builder
        .build_cartesian_2d(axis_range(points, 0), 0.0f64..2.0f64)
        .map_err(Error::plot)?;
    if style.annotate {
        chart.configure_mesh().x_desc("z0").draw().map_err(Error::plot)?;
    }

    let size = style.point_size as i32;
    chart
        .draw_series(points.rows().into_iter().zip(panel.values).map(|(row, &v)| {
            let color = value_color(panel.cmap, panel.range, v);
            Circle::new((row[0], 1.0), size, color.filled())
        }))
        .map_err(Error::plot)?;
    Ok(())
}

fn draw_plane_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    points: ArrayView2<'_, f64>,
    panel: &LabelPanel<'_>,
    style: &PlotStyle,
) -> Result<()> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if style.annotate {
        builder
            .caption(panel.name, ("sans-serif", caption_size(style, 30)))
            .x_label_area_size(40)
            .y_label_area_size(50);
    }
    let mut chart = builder
        .build_cartesian_2d(axis_range(points, 0), axis_range(points, 1))
        .map_err(Error::plot)?;
    if style.annotate {
        chart
            .configure_mesh()
            .x_desc("z0")
            .y_desc("z1")
            .draw()
            .map_err(Error::plot)?;
    }

    let size = style.point_size as i32;
    chart
        .draw_series(points.rows().into_iter().zip(panel.values).map(|(row, &v)| {
            let color = value_color(panel.cmap, panel.range, v);
            Circle::new((row[0], row[1]), size, color.filled())
        }))
        .map_err(Error::plot)?;
    Ok(())
}

fn draw_volume_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    points: ArrayView2<'_, f64>,
    panel: &LabelPanel<'_>,
    style: &PlotStyle,
) -> Result<()> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if style.annotate {
        builder.caption(panel.name, ("sans-serif", caption_size(style, 30)));
    }
    let mut chart = builder
        .build_cartesian_3d(
            axis_range(points, 0),
            axis_range(points, 1),
            axis_range(points, 2),
        )
        .map_err(Error::plot)?;
    if style.annotate {
        chart.configure_axes().draw().map_err(Error::plot)?;
    }

    let size = style.point_size as i32;
    chart
        .draw_series(points.rows().into_iter().zip(panel.values).map(|(row, &v)| {
            let color = value_color(panel.cmap, panel.range, v);
            Circle::new((row[0], row[1], row[2]), size, color.filled())
        }))
        .map_err(Error::plot)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_not_tightened() {
        assert_eq!(panel_grid(1), (1, 2));
        assert_eq!(panel_grid(2), (1, 2));
        assert_eq!(panel_grid(3), (1, 3));
        assert_eq!(panel_grid(4), (2, 3));
        assert_eq!(panel_grid(7), (2, 5));
    }

    #[test]
    fn layout_follows_dimension() {
        assert_eq!(LatentLayout::for_dim(1).unwrap(), LatentLayout::Line);
        assert_eq!(LatentLayout::for_dim(3).unwrap(), LatentLayout::Volume);
        assert!(matches!(
            LatentLayout::for_dim(0),
            Err(Error::UnsupportedDimension(0))
        ));
        assert!(matches!(
            LatentLayout::for_dim(4),
            Err(Error::UnsupportedDimension(4))
        ));
    }
}
