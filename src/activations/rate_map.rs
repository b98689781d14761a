use std::path::Path;

use ndarray::{Array2, Array3, ArrayD, Axis, Ix4};
use plotters::prelude::*;
use rand::Rng;
use tracing::info;

use super::cache::NpyArray;
use crate::config::{PlotStyle, RateMapConfig};
use crate::error::{Error, Result};
use crate::latent::palette::Colormap;
use crate::render::{ValueRange, grid_canvas, value_color};

/// Trajectory-averaged 2D rate map of one cell: `mean(activations[cell], axis=trajectory)`,
/// accumulated in `f64` whatever the stored element type.
pub fn mean_rate_map(activations: &NpyArray, cell: usize) -> Result<Array2<f64>> {
    let cell_acts = match activations {
        NpyArray::F32(array) => cell_slice(array, cell)?,
        NpyArray::F64(array) => cell_slice(array, cell)?,
    };
    cell_acts
        .mean_axis(Axis(2))
        .ok_or_else(|| Error::Validation("activations have no trajectories".to_string()))
}

/// `activations[cell]` as `[x, y, trajectory]`, widened to `f64`.
fn cell_slice<A: Copy + Into<f64>>(activations: &ArrayD<A>, cell: usize) -> Result<Array3<f64>> {
    let act = activations
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_| {
            Error::Validation(format!(
                "activations must be [cell, x, y, trajectory], got shape {:?}",
                activations.shape()
            ))
        })?;
    let n_cells = act.len_of(Axis(0));
    if cell >= n_cells {
        return Err(Error::Validation(format!(
            "cell {cell} out of range for {n_cells} cells"
        )));
    }
    Ok(act.index_axis(Axis(0), cell).mapv(|v| v.into()))
}

/// (rows, cols) of the grid holding `num_plots` panels.
pub fn grid_shape(num_plots: usize, rows: usize) -> (usize, usize) {
    let rows = rows.max(1);
    (rows, num_plots.div_ceil(rows))
}

/// Sample `num_plots` cells uniformly (with replacement) and draw their
/// rate maps in a grid, row-major, saved to `out_path`.
///
/// Returns the sampled cell indices in panel order.
pub fn plot_rate_map<R: Rng + ?Sized>(
    out_path: &Path,
    num_plots: usize,
    activations: &NpyArray,
    rng: &mut R,
    config: &RateMapConfig,
    style: &PlotStyle,
) -> Result<Vec<usize>> {
    if num_plots == 0 {
        return Err(Error::Validation("num_plots must be at least 1".to_string()));
    }
    if activations.ndim() != 4 {
        return Err(Error::Validation(format!(
            "activations must be [cell, x, y, trajectory], got shape {:?}",
            activations.shape()
        )));
    }
    let pool = config.cell_pool.min(activations.shape()[0]);
    if pool == 0 {
        return Err(Error::Validation("no cells to sample from".to_string()));
    }

    let (rows, cols) = grid_shape(num_plots, config.rows);
    let panel = style.scaled(config.panel_px);
    let size = grid_canvas((panel, panel), rows, cols)?;

    let idxs: Vec<usize> = (0..num_plots).map(|_| rng.random_range(0..pool)).collect();
    let maps = idxs
        .iter()
        .map(|&idx| mean_rate_map(activations, idx))
        .collect::<Result<Vec<_>>>()?;

    render_grid(out_path, size, rows, cols, &idxs, &maps, style)?;
    info!("saved {num_plots} rate maps to {}", out_path.display());
    Ok(idxs)
}

fn render_grid(
    out_path: &Path,
    size: (u32, u32),
    rows: usize,
    cols: usize,
    idxs: &[usize],
    maps: &[Array2<f64>],
    style: &PlotStyle,
) -> Result<()> {
    let root = BitMapBackend::new(out_path, size).into_drawing_area();
    root.fill(&WHITE).map_err(Error::plot)?;
    let panels = root.split_evenly((rows, cols));

    // Slots past the last map stay blank.
    for ((panel, map), idx) in panels.iter().zip(maps).zip(idxs) {
        draw_rate_map(panel, map, *idx, style)?;
    }

    root.present().map_err(Error::plot)?;
    Ok(())
}

fn draw_rate_map<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    map: &Array2<f64>,
    cell: usize,
    style: &PlotStyle,
) -> Result<()> {
    let (nx, ny) = map.dim();
    let range = ValueRange::of(map.iter().copied());

    let mut builder = ChartBuilder::on(area);
    builder.margin(4);
    if style.annotate {
        builder.caption(format!("grid cell id: {cell}"), ("sans-serif", 14));
    }
    let mut chart = builder
        .build_cartesian_2d(0.0..ny as f64, 0.0..nx as f64)
        .map_err(Error::plot)?;

    chart
        .draw_series(map.indexed_iter().map(|((i, j), &v)| {
            let color = value_color(Colormap::Viridis, range, v);
            // Image convention: row 0 at the top.
            let top = (nx - i) as f64;
            Rectangle::new([(j as f64, top - 1.0), (j as f64 + 1.0, top)], color.filled())
        }))
        .map_err(Error::plot)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn mean_rate_map_averages_trajectories() {
        let act = NpyArray::F32(Array::from_shape_fn(IxDyn(&[2, 2, 3, 4]), |ix| {
            (ix[0] * 100 + ix[1] * 10 + ix[2]) as f32 + ix[3] as f32
        }));
        let map = mean_rate_map(&act, 1).unwrap();
        assert_eq!(map.dim(), (2, 3));
        // mean over trajectories 0..4 adds 1.5
        assert_eq!(map[[0, 0]], 101.5);
        assert_eq!(map[[1, 2]], 113.5);
    }

    #[test]
    fn mean_rate_map_checks_cell_and_shape() {
        let act = NpyArray::F64(Array::zeros(IxDyn(&[2, 2, 2, 2])));
        assert!(mean_rate_map(&act, 2).is_err());
        let flat = NpyArray::F32(Array::zeros(IxDyn(&[2, 4])));
        assert!(mean_rate_map(&flat, 0).is_err());
    }

    #[test]
    fn mean_rate_map_of_f64_cells_keeps_precision() {
        let act = NpyArray::F64(Array::from_elem(IxDyn(&[1, 2, 2, 3]), 0.1f64));
        let map = mean_rate_map(&act, 0).unwrap();
        assert!(map.iter().all(|&v| (v - 0.1).abs() < 1e-15));
    }

    #[test]
    fn grid_has_four_rows_and_enough_columns() {
        assert_eq!(grid_shape(16, 4), (4, 4));
        assert_eq!(grid_shape(17, 4), (4, 5));
        assert_eq!(grid_shape(3, 4), (4, 1));
        assert_eq!(grid_shape(5, 0), (1, 5));
    }
}
