//! Named continuous colormaps and the label -> colormap registry.

use std::collections::BTreeMap;

use plotters::style::{HSLColor, RGBColor};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Colormap {
    Hsv,
    Twilight,
    Winter,
    Cool,
    Viridis,
    Magma,
    Afmhot,
    Rainbow,
}

const VIRIDIS: [(f64, (u8, u8, u8)); 5] = [
    (0.0, (68, 1, 84)),
    (0.25, (59, 82, 139)),
    (0.5, (33, 145, 140)),
    (0.75, (94, 201, 98)),
    (1.0, (253, 231, 37)),
];

const MAGMA: [(f64, (u8, u8, u8)); 6] = [
    (0.0, (0, 0, 4)),
    (0.2, (59, 15, 112)),
    (0.4, (140, 41, 129)),
    (0.6, (222, 73, 104)),
    (0.8, (254, 159, 109)),
    (1.0, (252, 253, 191)),
];

// Cyclic: both ends are the same pale gray.
const TWILIGHT: [(f64, (u8, u8, u8)); 5] = [
    (0.0, (226, 217, 226)),
    (0.25, (96, 126, 192)),
    (0.5, (48, 20, 55)),
    (0.75, (176, 82, 67)),
    (1.0, (226, 217, 226)),
];

impl Colormap {
    /// Map `t` in [0, 1] to a color. Out-of-range input is clamped.
    pub fn color(self, t: f64) -> RGBColor {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            Colormap::Hsv => hsl_to_rgb(HSLColor(t, 1.0, 0.5)),
            Colormap::Twilight => interpolate(&TWILIGHT, t),
            Colormap::Viridis => interpolate(&VIRIDIS, t),
            Colormap::Magma => interpolate(&MAGMA, t),
            Colormap::Winter => rgb_unit(0.0, t, 1.0 - 0.5 * t),
            Colormap::Cool => rgb_unit(t, 1.0 - t, 1.0),
            Colormap::Afmhot => rgb_unit(2.0 * t, 2.0 * t - 0.5, 2.0 * t - 1.0),
            Colormap::Rainbow => rgb_unit(
                (2.0 * t - 0.5).abs(),
                (t * std::f64::consts::PI).sin(),
                (t * std::f64::consts::FRAC_PI_2).cos(),
            ),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Hsv => "hsv",
            Colormap::Twilight => "twilight",
            Colormap::Winter => "winter",
            Colormap::Cool => "cool",
            Colormap::Viridis => "viridis",
            Colormap::Magma => "magma",
            Colormap::Afmhot => "afmhot",
            Colormap::Rainbow => "rainbow",
        }
    }
}

fn rgb_unit(r: f64, g: f64, b: f64) -> RGBColor {
    let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    RGBColor(to_u8(r), to_u8(g), to_u8(b))
}

fn hsl_to_rgb(hsl: HSLColor) -> RGBColor {
    use plotters::style::Color;
    let (r, g, b) = hsl.rgb();
    RGBColor(r, g, b)
}

fn interpolate(stops: &[(f64, (u8, u8, u8))], t: f64) -> RGBColor {
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let w = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            let lerp = |a: u8, b: u8| (a as f64 + w * (b as f64 - a as f64)).round() as u8;
            return RGBColor(lerp(c0.0, c1.0), lerp(c0.1, c1.1), lerp(c0.2, c1.2));
        }
    }
    let (_, last) = stops[stops.len() - 1];
    RGBColor(last.0, last.1, last.2)
}

/// Label column name -> colormap.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteRegistry {
    entries: BTreeMap<String, Colormap>,
}

impl Default for PaletteRegistry {
    fn default() -> Self {
        use Colormap::*;
        let builtin = [
            // position angles
            ("angles", Hsv),
            ("angles_tracked", Twilight),
            // head direction
            ("angles_head", Hsv),
            ("rx_head", Hsv),
            ("ry_head", Hsv),
            ("rz_head", Hsv),
            ("times", Winter),
            ("gains", Cool),
            ("velocities", Viridis),
            ("radius2", Viridis),
            ("x", Viridis),
            ("y", Viridis),
            ("z", Viridis),
            ("scalars", Viridis),
            // uncertainty / success
            ("var", Magma),
            ("success", Afmhot),
            ("kappa", Magma),
        ];
        Self {
            entries: builtin
                .into_iter()
                .map(|(name, cmap)| (name.to_string(), cmap))
                .collect(),
        }
    }
}

impl PaletteRegistry {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Built-in entries with `overrides` layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, Colormap>) -> Self {
        let mut registry = Self::default();
        for (name, cmap) in overrides {
            registry.insert(name.clone(), *cmap);
        }
        registry
    }

    pub fn insert(&mut self, label: impl Into<String>, cmap: Colormap) {
        self.entries.insert(label.into(), cmap);
    }

    pub fn get(&self, label: &str) -> Option<Colormap> {
        self.entries.get(label).copied()
    }

    pub fn lookup(&self, label: &str) -> Result<Colormap> {
        self.get(label)
            .ok_or_else(|| Error::MissingPalette(label.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
