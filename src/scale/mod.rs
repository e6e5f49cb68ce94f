//! Latitude-dependent distance scaling, the heart of the scale bar
//!
//! For each projection family there is a closed-form relation r(lat)
//! giving the ratio of true ground distance to map distance along a
//! parallel. The series is normalized at the family's reference parallel
//! so the bar is geometrically exact there and widens (or narrows) with
//! the projection's distortion away from it.
//!
//! Families whose reference latitude is a pole or interior parallel
//! (Transverse Mercator, Equirectangular, Stereographic) first re-derive
//! the node latitudes as a linspace running from the far extreme of the
//! sampled range toward the reference latitude, which keeps the series
//! monotonic for the ratio computation. The replacement latitudes become
//! the bar's vertical axis.

use std::f64::consts::{FRAC_PI_4, PI};

use crate::error::{LatbarError, Result, Stage};
use crate::geometry::SampleNodes;
use crate::geometry::sampler::linspace;
use crate::srs::{ProjectionFamily, SpatialReference};

/// Per-node scale factors plus the (possibly re-derived) nodes they
/// belong to. `factors[i]` pairs with `nodes.latitudes[i]`; only entries
/// where `nodes.mask[i]` holds are meaningful downstream.
#[derive(Debug, Clone)]
pub struct ScaleSeries {
    pub nodes: SampleNodes,
    pub factors: Vec<f64>,
}

/// Compute the per-node scale-factor series for the projection.
///
/// `cliplat` doubles as the Mercator reference parallel, so a bar
/// clipped at the equator is exact at the equator.
pub fn scale_series(
    srs: &SpatialReference,
    nodes: SampleNodes,
    cliplat: f64,
) -> Result<ScaleSeries> {
    let series = match srs.family() {
        ProjectionFamily::Mercator => mercator(nodes, cliplat),
        ProjectionFamily::TransverseMercator => transverse_mercator(srs, nodes, cliplat),
        ProjectionFamily::Equirectangular => equirectangular(srs, nodes, cliplat),
        ProjectionFamily::LambertConformalConic => lambert(srs, nodes),
        ProjectionFamily::Stereographic => stereographic(srs, nodes, cliplat),
    }?;
    for (i, f) in series.factors.iter().enumerate() {
        if !f.is_finite() {
            return Err(LatbarError::numeric(
                Stage::ScaleComputation,
                format!(
                    "scale relation is undefined at latitude {:.4} ({})",
                    series.nodes.latitudes[i],
                    srs.projection_name()
                ),
            ));
        }
    }
    Ok(series)
}

/// r(lat) = 1 / cos(lat); reference at the clip latitude
fn mercator(nodes: SampleNodes, cliplat: f64) -> Result<ScaleSeries> {
    let factors: Vec<f64> = nodes
        .latitudes
        .iter()
        .map(|lat| 1.0 / lat.to_radians().cos())
        .collect();
    normalize(nodes, factors, cliplat)
}

/// r(lat) = k0 / sqrt(1 - (cos(lon0) * sin(lat0 - lat))^2);
/// reference at the latitude of origin
fn transverse_mercator(
    srs: &SpatialReference,
    nodes: SampleNodes,
    cliplat: f64,
) -> Result<ScaleSeries> {
    let clat = srs.latitude_of_origin();
    let clon = srs.central_meridian().to_radians();
    let k0 = srs.scale_factor();
    let nodes = resample_toward(nodes, clat, cliplat)?;
    let factors: Vec<f64> = nodes
        .latitudes
        .iter()
        .map(|lat| {
            let b = clon.cos() * (clat.to_radians() - lat.to_radians()).sin();
            k0 / (1.0 - b * b).sqrt()
        })
        .collect();
    normalize(nodes, factors, clat)
}

/// r(lat) = cos(lat1) / cos(lat); reference at the first standard
/// parallel
fn equirectangular(srs: &SpatialReference, nodes: SampleNodes, cliplat: f64) -> Result<ScaleSeries> {
    let p1 = srs.standard_parallels()[0];
    let cos_p1 = p1.to_radians().cos();
    let nodes = resample_toward(nodes, p1, cliplat)?;
    let factors: Vec<f64> = nodes
        .latitudes
        .iter()
        .map(|lat| cos_p1 / lat.to_radians().cos())
        .collect();
    normalize(nodes, factors, p1)
}

/// Cone constant n for a two-parallel Lambert conformal conic.
///
/// The parallels must already be sorted ascending; feeding them reversed
/// flips the sign of n and silently corrupts the whole series.
pub(crate) fn cone_constant(p1_rad: f64, p2_rad: f64) -> Result<f64> {
    debug_assert!(p1_rad <= p2_rad, "standard parallels must be sorted ascending");
    let n = (p1_rad.cos() / p2_rad.cos()).ln()
        / ((FRAC_PI_4 + p2_rad / 2.0).tan() / (FRAC_PI_4 + p1_rad / 2.0).tan()).ln();
    if !n.is_finite() || n == 0.0 {
        return Err(LatbarError::numeric(
            Stage::ScaleComputation,
            format!(
                "Lambert cone constant is degenerate for parallels ({:.4}, {:.4})",
                p1_rad.to_degrees(),
                p2_rad.to_degrees()
            ),
        ));
    }
    Ok(n)
}

/// Two-parallel Lambert conformal conic. Self-anchoring: the relation is
/// 1 at the lower standard parallel by construction, and the series is
/// still divided through at that anchor so the invariant holds exactly.
fn lambert(srs: &SpatialReference, nodes: SampleNodes) -> Result<ScaleSeries> {
    let mut parallels = srs.standard_parallels();
    parallels.sort_by(f64::total_cmp);
    let p1 = parallels[0].to_radians();
    let p2 = parallels[1].to_radians();
    let n = cone_constant(p1, p2)?;

    let num = p1.cos() * (FRAC_PI_4 + p1 / 2.0).tan().powf(n);
    let factors: Vec<f64> = nodes
        .latitudes
        .iter()
        .map(|lat| {
            let phi = lat.to_radians();
            num / (phi.cos() * (FRAC_PI_4 + phi / 2.0).tan().powf(n))
        })
        .collect();
    normalize(nodes, factors, parallels[0])
}

/// r(lat) = 2 k0 / (1 + sin(clat) sin(lat) + cos(clat) cos(lat) cos(pi - lon0));
/// reference at the latitude of origin (the pole for polar aspects)
fn stereographic(srs: &SpatialReference, nodes: SampleNodes, cliplat: f64) -> Result<ScaleSeries> {
    let clat = srs.latitude_of_origin();
    let clon = srs.central_meridian().to_radians();
    let k0 = srs.scale_factor();
    let nodes = resample_toward(nodes, clat, cliplat)?;
    let (sin_c, cos_c) = clat.to_radians().sin_cos();
    let cos_dlon = (PI - clon).cos();
    let factors: Vec<f64> = nodes
        .latitudes
        .iter()
        .map(|lat| {
            let (sin_l, cos_l) = lat.to_radians().sin_cos();
            2.0 * k0 / (1.0 + sin_c * sin_l + cos_c * cos_l * cos_dlon)
        })
        .collect();
    normalize(nodes, factors, clat)
}

/// Re-derive the node latitudes as a linspace between the sampled
/// extreme on the far side of `reference` and the reference latitude
/// itself, then re-apply the clip mask. The replacement latitudes also
/// become the bar's vertical axis.
fn resample_toward(nodes: SampleNodes, reference: f64, cliplat: f64) -> Result<SampleNodes> {
    let n = nodes.len();
    let lo = nodes.latitudes.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = nodes
        .latitudes
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let start = if reference > 0.0 { lo } else { hi };
    let latitudes = linspace(start, reference, n);
    let mask: Vec<bool> = latitudes
        .iter()
        .map(|&lat| lat >= cliplat - 1e-9)
        .collect();
    if !mask.iter().any(|m| *m) {
        return Err(LatbarError::configuration(
            Stage::ScaleComputation,
            format!("clip latitude {cliplat} excludes every resampled node"),
        ));
    }
    let ys = latitudes.clone();
    Ok(SampleNodes {
        latitudes,
        ys,
        mask,
    })
}

/// Divide the series through by its value at the sample nearest the
/// reference parallel so the anchor is exactly 1.0 there
fn normalize(nodes: SampleNodes, mut factors: Vec<f64>, reference: f64) -> Result<ScaleSeries> {
    let ref_idx = nearest_index(&nodes.latitudes, reference);
    let anchor = factors[ref_idx];
    if !anchor.is_finite() || anchor == 0.0 {
        return Err(LatbarError::numeric(
            Stage::ScaleComputation,
            format!(
                "scale relation is {anchor} at the reference parallel {reference} \
                 and cannot anchor the series"
            ),
        ));
    }
    for f in &mut factors {
        *f /= anchor;
    }
    Ok(ScaleSeries { nodes, factors })
}

fn nearest_index(latitudes: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, lat) in latitudes.iter().enumerate() {
        let d = (lat - target).abs();
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}
