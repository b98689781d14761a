use std::fs;
use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyExt};
use tracing::{debug, warn};

use super::{AgentType, Epoch};
use crate::config::CacheConfig;
use crate::error::{Error, Result};

/// The two files cached for one (agent, epoch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub activations: PathBuf,
    pub rate_map: PathBuf,
}

impl CachePaths {
    pub fn exists(&self) -> bool {
        self.activations.exists() && self.rate_map.exists()
    }

    /// Remove whichever of the two files is present.
    pub fn discard(&self) {
        for path in [&self.activations, &self.rate_map] {
            match fs::remove_file(path) {
                Ok(()) => debug!("discarded {}", path.display()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!("could not remove {}: {err}", path.display()),
            }
        }
    }
}

/// Directory layout of the activation cache:
/// `<root>/<model folder>/<run id>/activations/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
    single_model_folder: String,
    dual_model_folder: String,
    run_id: String,
}

impl CacheLayout {
    pub fn new(config: &CacheConfig, run_id: impl Into<String>) -> Self {
        Self {
            root: config.root.clone(),
            single_model_folder: config.single_model_folder.clone(),
            dual_model_folder: config.dual_model_folder.clone(),
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn dir(&self, agent: AgentType) -> PathBuf {
        let folder = match agent {
            AgentType::Single => &self.single_model_folder,
            AgentType::Dual => &self.dual_model_folder,
        };
        self.root.join(folder).join(&self.run_id).join("activations")
    }

    pub fn paths(&self, agent: AgentType, epoch: Epoch) -> CachePaths {
        let dir = self.dir(agent);
        CachePaths {
            activations: dir.join(format!("activations_{agent}_agent_epoch_{epoch}.npy")),
            rate_map: dir.join(format!("rate_map_{agent}_agent_epoch_{epoch}.npy")),
        }
    }
}

/// A cached array in the element type it was stored with, so a cache
/// hit hands back exactly the values on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum NpyArray {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl NpyArray {
    pub fn shape(&self) -> &[usize] {
        match self {
            NpyArray::F32(array) => array.shape(),
            NpyArray::F64(array) => array.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// numpy dtype name of the elements.
    pub fn dtype(&self) -> &'static str {
        match self {
            NpyArray::F32(_) => "float32",
            NpyArray::F64(_) => "float64",
        }
    }

    /// Lossless widening copy.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            NpyArray::F32(array) => array.mapv(f64::from),
            NpyArray::F64(array) => array.clone(),
        }
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            NpyArray::F32(array) => Some(array),
            NpyArray::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            NpyArray::F64(array) => Some(array),
            NpyArray::F32(_) => None,
        }
    }
}

impl From<ArrayD<f32>> for NpyArray {
    fn from(array: ArrayD<f32>) -> Self {
        NpyArray::F32(array)
    }
}

impl From<ArrayD<f64>> for NpyArray {
    fn from(array: ArrayD<f64>) -> Self {
        NpyArray::F64(array)
    }
}

/// Read an `.npy` array, keeping its `f32` or `f64` element type.
pub fn read_array(path: &Path) -> Result<NpyArray> {
    let open = |path: &Path| fs::File::open(path).map_err(|err| Error::io(path, err));
    let read_err = |source: ReadNpyError| Error::ReadNpy {
        path: path.to_path_buf(),
        source,
    };
    match ArrayD::<f32>::read_npy(open(path)?) {
        Ok(array) => Ok(NpyArray::F32(array)),
        Err(ReadNpyError::WrongDescriptor(_)) => {
            debug!("{} is not f32, reading as f64", path.display());
            ArrayD::<f64>::read_npy(open(path)?)
                .map(NpyArray::F64)
                .map_err(read_err)
        }
        Err(source) => Err(read_err(source)),
    }
}

/// Write `array` to `path` in its own element type, creating parent
/// directories.
pub fn write_array(path: &Path, array: &NpyArray) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    let file = fs::File::create(path).map_err(|err| Error::io(path, err))?;
    let written = match array {
        NpyArray::F32(array) => array.write_npy(file),
        NpyArray::F64(array) => array.write_npy(file),
    };
    written.map_err(|source| Error::WriteNpy {
        path: path.to_path_buf(),
        source,
    })
}
