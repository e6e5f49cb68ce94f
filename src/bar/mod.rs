//! Scale-bar construction pipeline
//!
//! One-shot, synchronous, and allocation-owned: sample -> scale ->
//! layout -> render run as a single blocking pipeline and every
//! intermediate value is owned by the invocation. The two constructors
//! mirror the classic scalebar entry points: a map-projected image, or
//! a bare projection string plus a geographic extent.

pub mod layout;

use std::path::Path;

use crate::error::Result;
use crate::geometry::{GeoExtent, Projector, SampleNodes, sample_geographic, sample_projected};
use crate::raster::RasterMetadata;
use crate::render;
use crate::scale::scale_series;
use crate::srs::SpatialReference;

use layout::{BarLayout, LayoutParams, layout_ticks};

/// Scale-bar options with the conventional defaults
#[derive(Debug, Clone)]
pub struct ScaleBarOptions {
    /// Number of vertical sample nodes (forced odd)
    pub nnodes: usize,
    /// Latitude below which samples are discarded
    pub cliplat: f64,
    /// Latitude gridline step in degrees
    pub lat_tick_interval: f64,
    /// Map scale denominator, e.g. 1e6 for 1:1,000,000
    pub mapscale: f64,
    /// Unlabeled tick distances in km
    pub lon_minor_ticks: Vec<f64>,
    /// Labeled tick distances in km
    pub lon_major_ticks: Vec<f64>,
    /// Mirror the bar across the central vertical axis
    pub symmetrical: bool,
    /// Bar height in cm
    pub height: f64,
    /// Label font size in points
    pub fontsize: f64,
    /// Padding added to each edge, in cm
    pub padding: f64,
}

impl Default for ScaleBarOptions {
    fn default() -> Self {
        ScaleBarOptions {
            nnodes: 51,
            cliplat: 0.0,
            lat_tick_interval: 5.0,
            mapscale: 1_000_000.0,
            lon_minor_ticks: vec![12.5],
            lon_major_ticks: vec![25.0, 50.0, 75.0],
            symmetrical: true,
            height: 4.0,
            fontsize: 12.0,
            padding: 1.0,
        }
    }
}

/// A fully computed scale bar, ready to render
#[derive(Debug, Clone)]
pub struct ScaleBar {
    layout: BarLayout,
    fontsize: f64,
}

impl ScaleBar {
    /// Build a scale bar from a map-projected raster.
    ///
    /// The extent comes from the raster's geotransform and the spatial
    /// reference from its sidecar `.prj` unless `projection_override`
    /// supplies one.
    pub fn from_image(
        raster: &Path,
        projection_override: Option<&str>,
        options: &ScaleBarOptions,
    ) -> Result<ScaleBar> {
        let metadata = RasterMetadata::from_file(raster, projection_override)?;
        let projector = Projector::new(&metadata.srs)?;
        let nodes = sample_projected(&projector, &metadata.extent, options.nnodes, options.cliplat)?;
        Self::build(&metadata.srs, nodes, options)
    }

    /// Build a scale bar from a projection definition string and an
    /// explicit geographic extent
    pub fn from_projstring(
        projstring: &str,
        extent: &GeoExtent,
        options: &ScaleBarOptions,
    ) -> Result<ScaleBar> {
        let srs = SpatialReference::parse(projstring)?;
        let nodes = sample_geographic(extent, options.nnodes, options.cliplat)?;
        Self::build(&srs, nodes, options)
    }

    fn build(
        srs: &SpatialReference,
        nodes: SampleNodes,
        options: &ScaleBarOptions,
    ) -> Result<ScaleBar> {
        let series = scale_series(srs, nodes, options.cliplat)?;
        let params = LayoutParams {
            mapscale_denominator: options.mapscale,
            symmetrical: options.symmetrical,
            height: options.height,
            lat_tick_interval: options.lat_tick_interval,
            padding: options.padding,
        };
        let layout = layout_ticks(
            &series,
            &options.lon_major_ticks,
            &options.lon_minor_ticks,
            &params,
        )?;
        Ok(ScaleBar {
            layout,
            fontsize: options.fontsize,
        })
    }

    pub fn layout(&self) -> &BarLayout {
        &self.layout
    }

    /// Render to an SVG document string
    #[allow(dead_code)]
    pub fn to_svg(&self) -> String {
        render::to_svg(&self.layout, self.fontsize)
    }

    /// Render and write the SVG file. Nothing is written if any earlier
    /// stage failed, so a partial file never masquerades as output.
    pub fn save(&self, path: &Path) -> Result<()> {
        render::save_svg(&self.layout, self.fontsize, path)
    }
}
