use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::activations::options::RunOptions;
use crate::latent::palette::{Colormap, PaletteRegistry};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_root")]
    pub root: PathBuf,
    #[serde(default = "CacheConfig::default_single_model_folder")]
    pub single_model_folder: String,
    #[serde(default = "CacheConfig::default_dual_model_folder")]
    pub dual_model_folder: String,
}

impl CacheConfig {
    fn default_root() -> PathBuf {
        PathBuf::from("data/rnn_grid_cells")
    }
    fn default_single_model_folder() -> String {
        "Single agent path integration/Seed 1 weight decay 1e-06".to_string()
    }
    fn default_dual_model_folder() -> String {
        "Dual agent path integration disjoint PCs/Seed 1 weight decay 1e-06".to_string()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            single_model_folder: Self::default_single_model_folder(),
            dual_model_folder: Self::default_dual_model_folder(),
        }
    }
}

/// External program that produces activations on a cache miss.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments placed before the per-epoch arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotStyle {
    /// Multiplier on the per-panel canvas size.
    #[serde(default = "PlotStyle::default_scale")]
    pub scale: f64,
    /// Draw titles, axes and tick labels. Needs a system font.
    #[serde(default = "PlotStyle::default_annotate")]
    pub annotate: bool,
    #[serde(default = "PlotStyle::default_point_size")]
    pub point_size: u32,
}

impl PlotStyle {
    fn default_scale() -> f64 {
        1.0
    }
    fn default_annotate() -> bool {
        true
    }
    fn default_point_size() -> u32 {
        3
    }

    /// Canvas dimension after scaling, never below one pixel.
    pub fn scaled(&self, px: u32) -> u32 {
        ((px as f64) * self.scale).round().max(1.0) as u32
    }
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            scale: Self::default_scale(),
            annotate: Self::default_annotate(),
            point_size: Self::default_point_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateMapConfig {
    /// Cells are sampled from `0..cell_pool` (capped at the cell count).
    #[serde(default = "RateMapConfig::default_cell_pool")]
    pub cell_pool: usize,
    #[serde(default = "RateMapConfig::default_rows")]
    pub rows: usize,
    #[serde(default = "RateMapConfig::default_panel_px")]
    pub panel_px: u32,
}

impl RateMapConfig {
    fn default_cell_pool() -> usize {
        4095
    }
    fn default_rows() -> usize {
        4
    }
    fn default_panel_px() -> u32 {
        200
    }
}

impl Default for RateMapConfig {
    fn default() -> Self {
        Self {
            cell_pool: Self::default_cell_pool(),
            rows: Self::default_rows(),
            panel_px: Self::default_panel_px(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub run: RunOptions,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub plot: PlotStyle,
    #[serde(default)]
    pub rate_map: RateMapConfig,
    /// Label column -> colormap, layered over the built-in registry.
    #[serde(default)]
    pub palettes: BTreeMap<String, Colormap>,
}

impl AppConfig {
    pub fn palette_registry(&self) -> PaletteRegistry {
        PaletteRegistry::with_overrides(&self.palettes)
    }

    /// Read `path`, or write a commented template of the defaults there
    /// when it does not exist yet.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {}: {err}. Using defaults.", path.display());
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {}: {err}. Using defaults.", path.display());
                }
            }
            return Self::default();
        }

        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path, commented_template(&text)) {
                    warn!("Failed to write default config to {}: {err}", path.display());
                }
            }
            Err(err) => warn!("Failed to serialize default config: {err}"),
        }
        default_cfg
    }
}

// Section headers stay live so users only uncomment the keys they change.
fn commented_template(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push('\n');
        } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
            out.push_str(line);
            out.push('\n');
        } else {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
