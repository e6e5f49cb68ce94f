//! Vertical sample-node generation along the image edge
//!
//! Builds an odd-length ladder of projected y coordinates spanning the
//! extent, inverse-projects each rung to latitude, and masks out rungs
//! below the clip latitude.

use crate::error::{LatbarError, Result, Stage};
use crate::geometry::{Extent, GeoExtent, Projector};

/// Ordered vertical sample nodes.
///
/// `ys` holds the bar's vertical axis variable: projected y in image
/// mode, latitude in geographic mode (and after any resampling done by
/// the scale engine). `latitudes` are monotonic in projected space but
/// may run north-to-south; consumers must check the ends rather than
/// assume ascending order.
#[derive(Debug, Clone)]
pub struct SampleNodes {
    pub latitudes: Vec<f64>,
    pub ys: Vec<f64>,
    pub mask: Vec<bool>,
}

impl SampleNodes {
    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }

    /// True when the first sampled latitude is north of the last
    /// (south-up orientation)
    #[allow(dead_code)]
    pub fn is_south_up(&self) -> bool {
        self.latitudes[0] > self.latitudes[self.len() - 1]
    }

    #[allow(dead_code)]
    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }
}

/// Force an even node count up to the next odd value so the ladder has a
/// true midpoint
pub fn normalize_nnodes(nnodes: usize) -> usize {
    if nnodes % 2 == 0 { nnodes + 1 } else { nnodes }
}

/// Evenly subdivide `lo..hi` into `n` values, inclusive of both ends.
///
/// Uses the lerp form so a symmetric range has an exact zero midpoint.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    debug_assert!(n >= 2);
    let last = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let t = i as f64 / last;
            lo * (1.0 - t) + hi * t
        })
        .collect()
}

/// Sample latitudes along the extent's left edge (image mode).
///
/// `nnodes` projected y values are linspaced between ymin and ymax at
/// x = xmin and inverse-projected to latitude.
pub fn sample_projected(
    projector: &Projector,
    extent: &Extent,
    nnodes: usize,
    cliplat: f64,
) -> Result<SampleNodes> {
    let nnodes = normalize_nnodes(nnodes);
    let ys = linspace(extent.ymin, extent.ymax, nnodes);
    let mut latitudes = Vec::with_capacity(nnodes);
    for &y in &ys {
        let (_, lat) = projector.inverse(extent.xmin, y)?;
        latitudes.push(lat);
    }
    mask_nodes(latitudes, ys, cliplat)
}

/// Sample latitudes directly from a geographic extent (projstring mode)
pub fn sample_geographic(extent: &GeoExtent, nnodes: usize, cliplat: f64) -> Result<SampleNodes> {
    let nnodes = normalize_nnodes(nnodes);
    let latitudes = linspace(extent.minlat, extent.maxlat, nnodes);
    let ys = latitudes.clone();
    mask_nodes(latitudes, ys, cliplat)
}

fn mask_nodes(latitudes: Vec<f64>, ys: Vec<f64>, cliplat: f64) -> Result<SampleNodes> {
    // tolerance keeps grid points that land on the clip latitude up to
    // float error (linspace interior points are not exact)
    let mask: Vec<bool> = latitudes
        .iter()
        .map(|&lat| lat >= cliplat - 1e-9)
        .collect();
    if !mask.iter().any(|m| *m) {
        return Err(LatbarError::configuration(
            Stage::Sampling,
            format!(
                "clip latitude {cliplat} excludes every sample (latitude range {:.3}..{:.3})",
                latitudes.iter().cloned().fold(f64::INFINITY, f64::min),
                latitudes.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            ),
        ));
    }
    Ok(SampleNodes {
        latitudes,
        ys,
        mask,
    })
}
