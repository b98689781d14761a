use std::fs;
use std::path::PathBuf;

use ndarray::Array2;
use neuroplot::Error;
use neuroplot::config::PlotStyle;
use neuroplot::latent::{Colormap, LabelTable, PaletteRegistry, plot_save_latent_space};

fn unique_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "neuroplot_latent_{}_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        name,
    ));
    path
}

// No text: rendering must not depend on system fonts.
fn bare_style() -> PlotStyle {
    PlotStyle {
        scale: 0.3,
        annotate: false,
        point_size: 2,
    }
}

fn points(n: usize, dim: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, dim), |(i, j)| {
        let t = i as f64 / n as f64 * std::f64::consts::TAU;
        if j % 2 == 0 { t.cos() } else { t.sin() * (j + 1) as f64 }
    })
}

fn labels(n: usize) -> LabelTable {
    LabelTable::new()
        .with_column("Unnamed: 0", (0..n).map(|i| i as f64).collect())
        .unwrap()
        .with_column("angles", (0..n).map(|i| i as f64 / n as f64).collect())
        .unwrap()
        .with_column("times", (0..n).map(|i| (i * i) as f64).collect())
        .unwrap()
        .with_column("success", (0..n).map(|i| (i % 2) as f64).collect())
        .unwrap()
}

#[test]
fn renders_non_empty_image_for_each_supported_dimension() {
    for dim in 1..=3 {
        let out = unique_path(&format!("d{dim}.png"));
        plot_save_latent_space(
            &out,
            points(40, dim).view(),
            &labels(40),
            &PaletteRegistry::default(),
            &bare_style(),
        )
        .unwrap_or_else(|err| panic!("dim {dim}: {err}"));
        let len = fs::metadata(&out).expect("image written").len();
        assert!(len > 0, "dim {dim} produced an empty file");
        let _ = fs::remove_file(&out);
    }
}

#[test]
fn overwrites_existing_file() {
    let out = unique_path("overwrite.png");
    fs::write(&out, b"stale").unwrap();
    plot_save_latent_space(
        &out,
        points(10, 2).view(),
        &labels(10),
        &PaletteRegistry::default(),
        &bare_style(),
    )
    .unwrap();
    let bytes = fs::read(&out).unwrap();
    assert_ne!(bytes, b"stale");
    assert!(bytes.starts_with(b"\x89PNG"));
    let _ = fs::remove_file(&out);
}

#[test]
fn mismatched_row_counts_are_rejected() {
    let out = unique_path("mismatch.png");
    let err = plot_save_latent_space(
        &out,
        points(10, 2).view(),
        &labels(9),
        &PaletteRegistry::default(),
        &bare_style(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
    assert!(!out.exists(), "no file on rejected input");
}

#[test]
fn four_dimensional_latents_are_unsupported() {
    let out = unique_path("d4.png");
    let err = plot_save_latent_space(
        &out,
        points(10, 4).view(),
        &labels(10),
        &PaletteRegistry::default(),
        &bare_style(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnsupportedDimension(4)), "got {err:?}");
    assert!(!out.exists());
}

#[test]
fn label_without_palette_is_rejected() {
    let out = unique_path("nopalette.png");
    let table = labels(5).with_column("speed", vec![1.0; 5]).unwrap();
    let err = plot_save_latent_space(
        &out,
        points(5, 1).view(),
        &table,
        &PaletteRegistry::default(),
        &bare_style(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingPalette(ref name) if name == "speed"));

    let mut registry = PaletteRegistry::default();
    registry.insert("speed", Colormap::Rainbow);
    plot_save_latent_space(&out, points(5, 1).view(), &table, &registry, &bare_style()).unwrap();
    assert!(out.exists());
    let _ = fs::remove_file(&out);
}

#[test]
fn index_only_table_has_no_labels() {
    let out = unique_path("empty.png");
    let table = LabelTable::new()
        .with_column("Unnamed: 0", vec![0.0, 1.0, 2.0])
        .unwrap();
    let err = plot_save_latent_space(
        &out,
        points(3, 2).view(),
        &table,
        &PaletteRegistry::default(),
        &bare_style(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::EmptyLabels));
}

#[test]
fn csv_labels_with_nan_and_constant_columns_render() {
    let out = unique_path("csv.png");
    let csv = "Unnamed: 0,x,kappa\n0,1.0,2.0\n1,nan,2.0\n2,3.0,2.0\n3,,2.0\n";
    let table = LabelTable::parse_csv(csv).unwrap();
    plot_save_latent_space(
        &out,
        points(4, 3).view(),
        &table,
        &PaletteRegistry::default(),
        &bare_style(),
    )
    .unwrap();
    assert!(fs::metadata(&out).unwrap().len() > 0);
    let _ = fs::remove_file(&out);
}
