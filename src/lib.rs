pub mod activations;
pub mod cli;
pub mod config;
pub mod error;
pub mod latent;
pub mod render;

pub use error::{Error, Result};
