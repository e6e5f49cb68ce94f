//! latbar - Generate latitude-aware distance scale bars for map-projected planetary imagery

pub mod bar;
pub mod config;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod render;
pub mod scale;
pub mod srs;

pub use bar::{ScaleBar, ScaleBarOptions};
pub use error::{LatbarError, Result};
