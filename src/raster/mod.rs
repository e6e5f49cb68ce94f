//! Raster data source for image mode
//!
//! Opens a map-projected raster, derives the projected extent from its
//! geotransform the way GDAL does, and resolves the spatial reference
//! from a sidecar `.prj` file (WKT) or an explicit projection override.

pub mod tiff;

use std::path::Path;

use crate::error::{LatbarError, Result};
use crate::geometry::Extent;
use crate::srs::SpatialReference;

/// Everything the pipeline needs to know about a raster, extracted once
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub extent: Extent,
    pub srs: SpatialReference,
    /// (x, y) map units per pixel
    #[allow(dead_code)]
    pub pixel_size: (f64, f64),
    /// (width, height) in pixels
    #[allow(dead_code)]
    pub raster_size: (u32, u32),
}

impl RasterMetadata {
    /// Read geotransform and spatial reference for a raster.
    ///
    /// `projection_override` takes precedence over the sidecar `.prj`;
    /// with neither available this is a data-source error.
    pub fn from_file(path: &Path, projection_override: Option<&str>) -> Result<RasterMetadata> {
        let info = tiff::read_info(path)?;
        let scale = info.pixel_scale.ok_or_else(|| {
            LatbarError::data_source(format!(
                "{} has no ModelPixelScale tag; not a georeferenced raster",
                path.display()
            ))
        })?;
        let tiepoint = info.tiepoint.ok_or_else(|| {
            LatbarError::data_source(format!(
                "{} has no ModelTiepoint tag; not a georeferenced raster",
                path.display()
            ))
        })?;

        // geotransform from the tiepoint: raster (i, j) anchored at
        // model (x, y), pixels sized (sx, -sy)
        let (sx, sy) = (scale[0], scale[1]);
        if sx <= 0.0 || sy <= 0.0 {
            return Err(LatbarError::data_source(format!(
                "degenerate pixel size ({sx}, {sy})"
            )));
        }
        let minx = tiepoint[3] - tiepoint[0] * sx;
        let maxy = tiepoint[4] + tiepoint[1] * sy;
        let maxx = minx + sx * info.width as f64;
        let miny = maxy - sy * info.height as f64;

        let srs = match projection_override {
            Some(definition) => SpatialReference::parse(definition)?,
            None => read_sidecar_prj(path)?,
        };

        Ok(RasterMetadata {
            extent: Extent::new(minx, miny, maxx, maxy),
            srs,
            pixel_size: (sx, sy),
            raster_size: (info.width, info.height),
        })
    }
}

fn read_sidecar_prj(path: &Path) -> Result<SpatialReference> {
    let prj = path.with_extension("prj");
    let wkt = std::fs::read_to_string(&prj).map_err(|_| {
        LatbarError::data_source(format!(
            "no spatial reference: sidecar {} not found (or pass --projection)",
            prj.display()
        ))
    })?;
    SpatialReference::parse(&wkt)
}

#[cfg(test)]
mod tests {
    use super::tiff::test_support::build_geotiff;
    use super::*;
    use std::io::Write;

    const MARS_MERC_PROJ4: &str = "+proj=merc +lon_0=0 +lat_ts=0 +a=3396190 +b=3376200";

    fn mars_tiff() -> Vec<u8> {
        // 2304 x 1694 pixels at 4629.8 m/px anchored at (0, 3921610)
        build_geotiff(
            true,
            2304,
            1694,
            [4629.8, 4629.8, 0.0],
            [0.0, 0.0, 0.0, 0.0, 3921610.0, 0.0],
        )
    }

    #[test]
    fn test_extent_from_geotransform() {
        let mut f = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        f.write_all(&mars_tiff()).unwrap();
        f.flush().unwrap();

        let md = RasterMetadata::from_file(f.path(), Some(MARS_MERC_PROJ4)).unwrap();
        assert_eq!(md.raster_size, (2304, 1694));
        assert_eq!(md.extent.xmin, 0.0);
        assert_eq!(md.extent.ymax, 3921610.0);
        assert!((md.extent.xmax - 4629.8 * 2304.0).abs() < 1e-6);
        assert!((md.extent.ymin - (3921610.0 - 4629.8 * 1694.0)).abs() < 1e-6);
    }

    #[test]
    fn test_missing_spatial_reference() {
        let mut f = tempfile::NamedTempFile::with_suffix(".tif").unwrap();
        f.write_all(&mars_tiff()).unwrap();
        f.flush().unwrap();

        let err = RasterMetadata::from_file(f.path(), None).unwrap_err();
        assert!(matches!(err, LatbarError::DataSource { .. }));
    }
}
