//! Latent-space scatter plots of a variational model, colored by labels.

pub mod labels;
pub mod palette;
pub mod plot;

use std::fs::File;
use std::path::Path;

use ndarray::Array2;
use ndarray_npy::{ReadNpyError, ReadNpyExt};

use crate::error::{Error, Result};

pub use labels::{INDEX_COLUMN, LabelTable};
pub use palette::{Colormap, PaletteRegistry};
pub use plot::{LatentLayout, panel_grid, plot_save_latent_space};

/// Read `[n_samples, latent_dim]` points from `.npy` (f64, or f32 widened).
pub fn read_points(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let open = || File::open(path).map_err(|err| Error::io(path, err));
    let read_err = |source: ReadNpyError| Error::ReadNpy {
        path: path.to_path_buf(),
        source,
    };
    match Array2::<f64>::read_npy(open()?) {
        Ok(points) => Ok(points),
        Err(ReadNpyError::WrongDescriptor(_)) => Array2::<f32>::read_npy(open()?)
            .map(|points| points.mapv(f64::from))
            .map_err(read_err),
        Err(source) => Err(read_err(source)),
    }
}
