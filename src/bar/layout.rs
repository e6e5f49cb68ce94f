//! Tick and gridline layout in drawing space
//!
//! Combines tick distances with the per-latitude scale factors to place
//! each tick's polyline, mirrors everything for symmetrical bars, and
//! lays out the horizontal latitude gridlines. All coordinates are in
//! centimeters, relative to the bar's top-left corner; the renderer adds
//! the padding offset when it assembles the document.

use geo::{Coord, coord};

use crate::error::{LatbarError, Result, Stage};
use crate::scale::ScaleSeries;

/// A labeled or unlabeled tick distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSpec {
    pub km: f64,
    pub major: bool,
}

/// One drawable polyline (a tick curve or the central baseline)
#[derive(Debug, Clone)]
pub struct Polyline {
    pub points: Vec<Coord>,
}

/// Horizontal latitude gridline
#[derive(Debug, Clone)]
pub struct Gridline {
    pub start: Coord,
    pub end: Coord,
}

/// A text label with its anchor point
#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    pub anchor: Coord,
}

/// Layout knobs, all in the units the CLI exposes (cm, degrees, km)
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// Map scale denominator, e.g. 1e6 for 1:1,000,000
    pub mapscale_denominator: f64,
    pub symmetrical: bool,
    /// Bar height in cm
    pub height: f64,
    /// Latitude gridline step in degrees
    pub lat_tick_interval: f64,
    /// Padding around the bar in cm, used to position the label rows
    pub padding: f64,
}

/// Fully computed drawing geometry, consumed by the renderer.
/// Immutable once built; the drawing is assembled from this in one pass.
#[derive(Debug, Clone)]
pub struct BarLayout {
    /// Bar width in cm, excluding padding
    pub width: f64,
    /// Bar height in cm, excluding padding
    pub height: f64,
    /// Padding in cm added on every edge by the renderer
    pub padding: f64,
    pub baseline: Polyline,
    pub ticks: Vec<Polyline>,
    pub gridlines: Vec<Gridline>,
    pub labels: Vec<Label>,
}

/// Merge major and minor tick distances into one deduplicated set,
/// sorted descending so the outermost tick is processed first (it fixes
/// the drawing bounds) and shorter ticks draw on top.
pub fn merge_ticks(major_km: &[f64], minor_km: &[f64]) -> Vec<TickSpec> {
    let mut ticks: Vec<TickSpec> = Vec::new();
    for &km in major_km {
        ticks.push(TickSpec { km, major: true });
    }
    for &km in minor_km {
        // a distance listed as both major and minor is labeled
        if !ticks.iter().any(|t| t.km == km) {
            ticks.push(TickSpec { km, major: false });
        }
    }
    ticks.sort_by(|a, b| b.km.total_cmp(&a.km));
    ticks.dedup_by(|a, b| a.km == b.km);
    ticks
}

/// Lay out tick polylines, gridlines, and labels for the scale series
pub fn layout_ticks(
    series: &ScaleSeries,
    major_km: &[f64],
    minor_km: &[f64],
    params: &LayoutParams,
) -> Result<BarLayout> {
    let ticks = merge_ticks(major_km, minor_km);
    if ticks.is_empty() {
        return Err(LatbarError::configuration(
            Stage::Layout,
            "no tick distances configured",
        ));
    }

    let nodes = &series.nodes;
    let valid: Vec<usize> = (0..nodes.len()).filter(|&i| nodes.mask[i]).collect();
    if valid.len() < 2 {
        return Err(LatbarError::configuration(
            Stage::Layout,
            format!(
                "only {} sample(s) survive the clip latitude; need at least 2",
                valid.len()
            ),
        ));
    }

    let mapscale = 1.0 / params.mapscale_denominator;
    if !mapscale.is_finite() || mapscale <= 0.0 {
        return Err(LatbarError::configuration(
            Stage::Layout,
            format!("map scale denominator {} is not usable", params.mapscale_denominator),
        ));
    }

    // Vertical placement: normalize the axis variable over the valid
    // range and flip so increasing latitude is upward. This holds for
    // south-up node orders too, keeping the ticks and the gridlines
    // agreed on where each latitude sits; node order only decides which
    // end the distance labels attach to.
    let vs: Vec<f64> = valid.iter().map(|&i| nodes.ys[i]).collect();
    let vmin = vs.iter().cloned().fold(f64::INFINITY, f64::min);
    let vmax = vs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if vmax <= vmin {
        return Err(LatbarError::numeric(
            Stage::Layout,
            "sample nodes have no vertical spread",
        ));
    }
    let first_lat = nodes.latitudes[valid[0]];
    let last_lat = nodes.latitudes[valid[valid.len() - 1]];
    let drawing_y = |v: f64| {
        let t = (v - vmin) / (vmax - vmin);
        params.height * (1.0 - t)
    };
    let ys: Vec<f64> = vs.iter().map(|&v| drawing_y(v)).collect();

    // The first (largest) tick establishes the drawing bounds; every
    // later tick is laid out inside them.
    let offsets_for = |km: f64| -> Vec<f64> {
        valid
            .iter()
            .map(|&i| km * 1000.0 * 100.0 * mapscale * series.factors[i])
            .collect()
    };
    let first_offsets = offsets_for(ticks[0].km);
    let max_extent = first_offsets.iter().cloned().fold(0.0, f64::max);
    if !max_extent.is_finite() || max_extent <= 0.0 {
        return Err(LatbarError::numeric(
            Stage::Layout,
            format!("tick {} km has no drawable extent", ticks[0].km),
        ));
    }
    let (width, center_x) = if params.symmetrical {
        (2.0 * max_extent, max_extent)
    } else {
        (max_extent, 0.0)
    };

    let baseline = Polyline {
        points: ys.iter().map(|&y| coord! { x: center_x, y: y }).collect(),
    };

    // Label row sits just below the bar, inside the bottom padding
    let label_y = params.height + params.padding * 0.3;
    // Index (into the valid set) of the bar's bottom node, where the
    // distance labels attach
    let bottom = ys
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut tick_lines = Vec::new();
    let mut labels = Vec::new();
    labels.push(Label {
        text: "0".to_string(),
        anchor: coord! { x: center_x * 0.995, y: label_y },
    });

    for tick in &ticks {
        let offsets = offsets_for(tick.km);
        debug_assert!(
            offsets.iter().all(|o| *o <= max_extent * (1.0 + 1e-12)),
            "tick layout must not exceed the bounds fixed by the first tick"
        );
        let points: Vec<Coord> = offsets
            .iter()
            .zip(&ys)
            .map(|(&off, &y)| coord! { x: center_x + off, y: y })
            .collect();
        if tick.major {
            labels.push(Label {
                text: format!("{}km", tick.km),
                anchor: coord! { x: points[bottom].x, y: label_y },
            });
        }
        if params.symmetrical {
            let mirrored: Vec<Coord> = offsets
                .iter()
                .zip(&ys)
                .map(|(&off, &y)| coord! { x: center_x - off, y: y })
                .collect();
            if tick.major {
                labels.push(Label {
                    text: format!("{}km", tick.km),
                    anchor: coord! { x: mirrored[bottom].x, y: label_y },
                });
            }
            tick_lines.push(Polyline { points: mirrored });
        }
        tick_lines.push(Polyline { points });
    }

    let (gridlines, grid_labels) = layout_gridlines(
        first_lat,
        last_lat,
        params,
        width,
        center_x,
    );
    labels.extend(grid_labels);

    Ok(BarLayout {
        width,
        height: params.height,
        padding: params.padding,
        baseline,
        ticks: tick_lines,
        gridlines,
        labels,
    })
}

/// Horizontal latitude gridlines at `lat_tick_interval` steps, endpoints
/// included exactly even when off the interval grid, every other line
/// labeled with its latitude and a degree marker
fn layout_gridlines(
    first_lat: f64,
    last_lat: f64,
    params: &LayoutParams,
    width: f64,
    center_x: f64,
) -> (Vec<Gridline>, Vec<Label>) {
    let lo = first_lat.min(last_lat);
    let hi = first_lat.max(last_lat);
    let interval = params.lat_tick_interval;

    // endpoints rounded for display, interior ticks on the grid
    let lo_r = (lo * 10.0).round() / 10.0;
    let hi_r = (hi * 10.0).round() / 10.0;
    let mut values = vec![lo_r];
    if interval > 0.0 {
        let mut k = (lo / interval).floor() + 1.0;
        while k * interval < hi - 1e-9 {
            let v = k * interval;
            if v > lo + 1e-9 {
                values.push(v);
            }
            k += 1.0;
        }
    }
    values.push(hi_r);

    let vmin = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let vmax = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = vmax - vmin;

    let mut gridlines = Vec::new();
    let mut labels = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        let y = if span > 0.0 {
            params.height - params.height * (v - vmin) / span
        } else {
            params.height
        };
        gridlines.push(Gridline {
            start: coord! { x: center_x, y: y },
            end: coord! { x: width, y: y },
        });
        if center_x > 0.0 {
            gridlines.push(Gridline {
                start: coord! { x: 0.0, y: y },
                end: coord! { x: center_x, y: y },
            });
        }
        if i % 2 == 0 {
            labels.push(Label {
                text: format!("{v}\u{00b0}"),
                anchor: coord! { x: width + params.padding * 0.15, y: y },
            });
            if center_x > 0.0 {
                labels.push(Label {
                    text: format!("{v}\u{00b0}"),
                    anchor: coord! { x: -params.padding * 0.85, y: y },
                });
            }
        }
    }
    (gridlines, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SampleNodes;
    use crate::geometry::sampler::linspace;
    use crate::scale::{ScaleSeries, scale_series};
    use crate::srs::SpatialReference;
    use approx::assert_relative_eq;

    fn params() -> LayoutParams {
        LayoutParams {
            mapscale_denominator: 1e6,
            symmetrical: true,
            height: 4.0,
            lat_tick_interval: 5.0,
            padding: 1.0,
        }
    }

    fn mercator_series(lats: Vec<f64>, cliplat: f64) -> ScaleSeries {
        let srs =
            SpatialReference::from_proj4("+proj=merc +lon_0=0 +lat_ts=0 +a=3396190 +b=3376200")
                .unwrap();
        let ys = lats.clone();
        let mask = lats.iter().map(|&l| l >= cliplat).collect();
        let nodes = SampleNodes {
            latitudes: lats,
            ys,
            mask,
        };
        scale_series(&srs, nodes, cliplat).unwrap()
    }

    #[test]
    fn test_merge_ticks_dedup_and_order() {
        let ticks = merge_ticks(&[25.0, 50.0, 75.0], &[12.5, 25.0]);
        let kms: Vec<f64> = ticks.iter().map(|t| t.km).collect();
        assert_eq!(kms, vec![75.0, 50.0, 25.0, 12.5]);
        // 25 appears in both lists and stays major
        assert!(ticks.iter().find(|t| t.km == 25.0).unwrap().major);
        assert!(!ticks.iter().find(|t| t.km == 12.5).unwrap().major);
    }

    #[test]
    fn test_hundred_km_tick_is_ten_cm_at_equator() {
        let series = mercator_series(linspace(0.0, 40.0, 5), 0.0);
        let layout = layout_ticks(&series, &[50.0, 100.0], &[], &params()).unwrap();
        // first tick fixes bounds; equator node factor is exactly 1, so
        // 100 km * 100 * 1e-6 = 10 cm from the baseline
        let equator_point = &layout.ticks[1].points[0];
        let center = layout.width / 2.0;
        assert_relative_eq!(equator_point.x - center, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_offsets_descend_with_tick_distance() {
        let series = mercator_series(linspace(0.0, 40.0, 5), 0.0);
        let layout = layout_ticks(&series, &[100.0, 50.0], &[12.5], &params()).unwrap();
        let center = layout.width / 2.0;
        // right-hand polylines are every other entry (mirror comes first)
        let rights: Vec<f64> = layout
            .ticks
            .iter()
            .filter(|p| p.points[0].x >= center)
            .map(|p| p.points[0].x - center)
            .collect();
        assert!(rights.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_symmetry_law() {
        let series = mercator_series(linspace(0.0, 40.0, 5), 0.0);
        let layout = layout_ticks(&series, &[50.0, 100.0], &[12.5], &params()).unwrap();
        let center = layout.width / 2.0;
        for pair in layout.ticks.chunks(2) {
            let (mirror, right) = (&pair[0], &pair[1]);
            for (m, p) in mirror.points.iter().zip(&right.points) {
                assert_relative_eq!(center - (p.x - center), m.x, epsilon = 1e-12);
                assert_relative_eq!(m.y, p.y);
            }
        }
    }

    #[test]
    fn test_south_polar_bar_keeps_north_on_top() {
        let srs = SpatialReference::from_proj4(
            "+proj=stere +lat_0=-90 +lon_0=0 +k=1 +a=3396190 +b=3396190",
        )
        .unwrap();
        let lats = linspace(-85.0, -55.0, 7);
        let ys = lats.clone();
        let mask = vec![true; lats.len()];
        let nodes = SampleNodes {
            latitudes: lats,
            ys,
            mask,
        };
        let series = scale_series(&srs, nodes, -90.0).unwrap();
        // resampling toward the south pole leaves the nodes south-up
        assert!(series.nodes.latitudes[0] > *series.nodes.latitudes.last().unwrap());
        let layout = layout_ticks(&series, &[100.0], &[], &params()).unwrap();
        // the max-latitude node (-55) draws at the top, agreeing with
        // the gridline placed there
        assert_relative_eq!(layout.baseline.points[0].y, 0.0);
        assert_relative_eq!(layout.ticks[1].points[0].y, 0.0);
        let top_grid = layout
            .gridlines
            .iter()
            .map(|g| g.start.y)
            .fold(f64::INFINITY, f64::min);
        assert_relative_eq!(top_grid, 0.0);
        // the pole end sits at the bottom of the bar
        assert_relative_eq!(layout.baseline.points.last().unwrap().y, 4.0);
    }

    #[test]
    fn test_gridline_endpoints_included() {
        let series = mercator_series(linspace(0.0, 42.3, 9), 0.0);
        let layout = layout_ticks(&series, &[100.0], &[], &params()).unwrap();
        let ys: Vec<f64> = layout.gridlines.iter().map(|g| g.start.y).collect();
        // top gridline at the max latitude, bottom at the clip
        assert!(ys.iter().any(|&y| (y - 0.0).abs() < 1e-9));
        assert!(ys.iter().any(|&y| (y - 4.0).abs() < 1e-9));
    }

    #[test]
    fn test_asymmetric_bar_half_width() {
        let series = mercator_series(linspace(0.0, 40.0, 5), 0.0);
        let mut p = params();
        p.symmetrical = false;
        let sym = layout_ticks(&series, &[100.0], &[], &params()).unwrap();
        let asym = layout_ticks(&series, &[100.0], &[], &p).unwrap();
        assert_relative_eq!(sym.width, 2.0 * asym.width, epsilon = 1e-12);
        assert_relative_eq!(asym.baseline.points[0].x, 0.0);
    }
}
