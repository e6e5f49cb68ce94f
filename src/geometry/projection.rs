//! Forward/inverse cartographic projection on the sphere
//!
//! Closed-form spherical relations (Snyder, "Map Projections: A Working
//! Manual") for the five supported families. The sphere radius is the
//! body's semi-major axis; the scale-bar math only needs latitude along
//! a vertical line, where the spherical and ellipsoidal inverses agree
//! to well below one sample spacing.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::{LatbarError, Result, Stage};
use crate::srs::{ProjectionFamily, SpatialReference};

/// Per-family projection formulas, each variant carrying its
/// precomputed constants
#[derive(Debug, Clone)]
enum Kind {
    Mercator {
        r: f64,
        lon0: f64,
        /// cos(lat_ts), the cylinder scale at the true-scale parallel
        k: f64,
    },
    TransverseMercator {
        r: f64,
        lon0: f64,
        lat0: f64,
        k0: f64,
    },
    Equirectangular {
        r: f64,
        lon0: f64,
        lat0: f64,
        cos_p1: f64,
    },
    LambertConformalConic {
        r: f64,
        lon0: f64,
        n: f64,
        f: f64,
        rho0: f64,
    },
    Stereographic {
        r: f64,
        lon0: f64,
        lat_c: f64,
        k0: f64,
    },
}

/// Projection transformer: geographic degrees <-> projected meters
#[derive(Debug, Clone)]
pub struct Projector {
    kind: Kind,
    false_easting: f64,
    false_northing: f64,
}

impl Projector {
    /// Build the transformer for the spatial reference's family.
    ///
    /// Fails with a numeric-domain error for degenerate parameter sets
    /// (coincident-and-opposite standard parallels).
    pub fn new(srs: &SpatialReference) -> Result<Projector> {
        let r = srs.semimajor();
        let lon0 = srs.central_meridian().to_radians();
        let kind = match srs.family() {
            ProjectionFamily::Mercator => {
                let lat_ts = srs.standard_parallels()[0].to_radians();
                Kind::Mercator {
                    r,
                    lon0,
                    k: lat_ts.cos(),
                }
            }
            ProjectionFamily::TransverseMercator => Kind::TransverseMercator {
                r,
                lon0,
                lat0: srs.latitude_of_origin().to_radians(),
                k0: srs.scale_factor(),
            },
            ProjectionFamily::Equirectangular => Kind::Equirectangular {
                r,
                lon0,
                lat0: srs.latitude_of_origin().to_radians(),
                cos_p1: srs.standard_parallels()[0].to_radians().cos(),
            },
            ProjectionFamily::LambertConformalConic => {
                let mut parallels = srs.standard_parallels();
                parallels.sort_by(f64::total_cmp);
                let p1 = parallels[0].to_radians();
                let p2 = parallels[1].to_radians();
                let n = if (p1 - p2).abs() < 1e-12 {
                    p1.sin()
                } else {
                    (p1.cos() / p2.cos()).ln()
                        / ((FRAC_PI_4 + p2 / 2.0).tan() / (FRAC_PI_4 + p1 / 2.0).tan()).ln()
                };
                if !n.is_finite() || n == 0.0 {
                    return Err(LatbarError::numeric(
                        Stage::Metadata,
                        format!(
                            "degenerate Lambert standard parallels {:?} (cone constant {n})",
                            parallels
                        ),
                    ));
                }
                let f = p1.cos() * (FRAC_PI_4 + p1 / 2.0).tan().powf(n) / n;
                let lat0 = srs.latitude_of_origin().to_radians();
                let rho0 = r * f / (FRAC_PI_4 + lat0 / 2.0).tan().powf(n);
                Kind::LambertConformalConic {
                    r,
                    lon0,
                    n,
                    f,
                    rho0,
                }
            }
            ProjectionFamily::Stereographic => Kind::Stereographic {
                r,
                lon0,
                lat_c: srs.latitude_of_origin().to_radians(),
                k0: srs.scale_factor(),
            },
        };
        Ok(Projector {
            kind,
            false_easting: srs.false_easting(),
            false_northing: srs.false_northing(),
        })
    }
}

impl Projector {
    /// Project geographic degrees to map meters
    #[allow(dead_code)]
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let lam = lon.to_radians();
        let phi = lat.to_radians();
        let (x, y) = match &self.kind {
            Kind::Mercator { r, lon0, k } => {
                let x = r * k * (lam - lon0);
                let y = r * k * (FRAC_PI_4 + phi / 2.0).tan().ln();
                (x, y)
            }
            Kind::TransverseMercator { r, lon0, lat0, k0 } => {
                let b = phi.cos() * (lam - lon0).sin();
                let x = r * k0 / 2.0 * ((1.0 + b) / (1.0 - b)).ln();
                let y = r * k0 * ((phi.tan() / (lam - lon0).cos()).atan() - lat0);
                (x, y)
            }
            Kind::Equirectangular {
                r,
                lon0,
                lat0,
                cos_p1,
            } => {
                let x = r * (lam - lon0) * cos_p1;
                let y = r * (phi - lat0);
                (x, y)
            }
            Kind::LambertConformalConic { r, lon0, n, f, rho0 } => {
                let rho = r * f / (FRAC_PI_4 + phi / 2.0).tan().powf(*n);
                let theta = n * (lam - lon0);
                (rho * theta.sin(), rho0 - rho * theta.cos())
            }
            Kind::Stereographic { r, lon0, lat_c, k0 } => {
                let dlam = lam - lon0;
                let k = 2.0 * k0
                    / (1.0 + lat_c.sin() * phi.sin() + lat_c.cos() * phi.cos() * dlam.cos());
                let x = r * k * phi.cos() * dlam.sin();
                let y = r * k * (lat_c.cos() * phi.sin() - lat_c.sin() * phi.cos() * dlam.cos());
                (x, y)
            }
        };
        if !x.is_finite() || !y.is_finite() {
            return Err(LatbarError::numeric(
                Stage::Sampling,
                format!("forward projection of ({lon}, {lat}) is undefined"),
            ));
        }
        Ok((x + self.false_easting, y + self.false_northing))
    }

    /// Inverse-project map meters to geographic degrees
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let x = x - self.false_easting;
        let y = y - self.false_northing;
        let (lam, phi) = match &self.kind {
            Kind::Mercator { r, lon0, k } => {
                let phi = FRAC_PI_2 - 2.0 * (-y / (r * k)).exp().atan();
                let lam = lon0 + x / (r * k);
                (lam, phi)
            }
            Kind::TransverseMercator { r, lon0, lat0, k0 } => {
                let d = y / (r * k0) + lat0;
                let xs = x / (r * k0);
                let phi = (d.sin() / xs.cosh()).asin();
                let lam = lon0 + (xs.sinh() / d.cos()).atan();
                (lam, phi)
            }
            Kind::Equirectangular {
                r,
                lon0,
                lat0,
                cos_p1,
            } => {
                let phi = lat0 + y / r;
                let lam = lon0 + x / (r * cos_p1);
                (lam, phi)
            }
            Kind::LambertConformalConic { r, lon0, n, f, rho0 } => {
                let rho = n.signum() * (x * x + (rho0 - y) * (rho0 - y)).sqrt();
                let theta = (x * n.signum()).atan2((rho0 - y) * n.signum());
                let phi = 2.0 * (r * f / rho).powf(1.0 / n).atan() - FRAC_PI_2;
                (lon0 + theta / n, phi)
            }
            Kind::Stereographic { r, lon0, lat_c, k0 } => {
                let rho = (x * x + y * y).sqrt();
                if rho == 0.0 {
                    (*lon0, *lat_c)
                } else {
                    let c = 2.0 * (rho / (2.0 * r * k0)).atan();
                    let phi = (c.cos() * lat_c.sin() + y * c.sin() * lat_c.cos() / rho).asin();
                    let lam = lon0
                        + (x * c.sin())
                            .atan2(rho * lat_c.cos() * c.cos() - y * lat_c.sin() * c.sin());
                    (lam, phi)
                }
            }
        };
        if !lam.is_finite() || !phi.is_finite() {
            return Err(LatbarError::numeric(
                Stage::Sampling,
                format!("inverse projection of ({x}, {y}) is undefined"),
            ));
        }
        Ok((lam.to_degrees(), phi.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MARS_RADIUS: f64 = 3396190.0;

    fn mars_mercator() -> Projector {
        let srs = SpatialReference::from_proj4(&format!(
            "+proj=merc +lon_0=0 +lat_ts=0 +a={MARS_RADIUS} +b={MARS_RADIUS}"
        ))
        .unwrap();
        Projector::new(&srs).unwrap()
    }

    #[test]
    fn test_mercator_equator_is_y_zero() {
        let t = mars_mercator();
        let (x, y) = t.forward(10.0, 0.0).unwrap();
        assert_relative_eq!(y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(x, MARS_RADIUS * 10f64.to_radians(), epsilon = 1e-6);
    }

    #[test]
    fn test_mercator_inverse_of_forward() {
        let t = mars_mercator();
        let (x, y) = t.forward(45.0, 30.0).unwrap();
        let (lon, lat) = t.inverse(x, y).unwrap();
        assert_relative_eq!(lon, 45.0, epsilon = 1e-9);
        assert_relative_eq!(lat, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_polar_stereographic_pole_maps_to_origin() {
        let srs = SpatialReference::from_proj4(&format!(
            "+proj=stere +lat_0=90 +lon_0=0 +k=1 +a={MARS_RADIUS} +b={MARS_RADIUS}"
        ))
        .unwrap();
        let t = Projector::new(&srs).unwrap();
        let (x, y) = t.forward(0.0, 90.0).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
        let (_, lat) = t.inverse(0.0, 0.0).unwrap();
        assert_relative_eq!(lat, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lambert_inverse_of_forward() {
        let srs = SpatialReference::from_proj4(
            "+proj=lcc +lat_1=42 +lat_2=73 +lat_0=90 +lon_0=20 +a=1737400 +b=1737400",
        )
        .unwrap();
        let t = Projector::new(&srs).unwrap();
        let (x, y) = t.forward(25.0, 60.0).unwrap();
        let (lon, lat) = t.inverse(x, y).unwrap();
        assert_relative_eq!(lon, 25.0, epsilon = 1e-9);
        assert_relative_eq!(lat, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lambert_degenerate_parallels_rejected() {
        // opposite parallels give a zero cone constant
        let srs = SpatialReference::from_proj4(
            "+proj=lcc +lat_1=-30 +lat_2=30 +lat_0=0 +lon_0=0 +a=1737400 +b=1737400",
        )
        .unwrap();
        assert!(Projector::new(&srs).is_err());
    }

    #[test]
    fn test_equirectangular_inverse() {
        let srs = SpatialReference::from_proj4(
            "+proj=eqc +lat_ts=30 +lat_0=0 +lon_0=0 +a=3396190 +b=3396190",
        )
        .unwrap();
        let t = Projector::new(&srs).unwrap();
        let (_, lat) = t.inverse(0.0, MARS_RADIUS * 0.5).unwrap();
        assert_relative_eq!(lat, 0.5f64.to_degrees(), epsilon = 1e-9);
    }

    #[test]
    fn test_transverse_mercator_central_meridian() {
        let srs = SpatialReference::from_proj4(
            "+proj=tmerc +lat_0=0 +lon_0=0 +k=0.9996 +a=3396190 +b=3396190",
        )
        .unwrap();
        let t = Projector::new(&srs).unwrap();
        // on the central meridian y is k0 * R * lat
        let (x, y) = t.forward(0.0, 10.0).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.9996 * MARS_RADIUS * 10f64.to_radians(), epsilon = 1e-6);
        let (lon, lat) = t.inverse(x, y).unwrap();
        assert_relative_eq!(lon, 0.0, epsilon = 1e-9);
        assert_relative_eq!(lat, 10.0, epsilon = 1e-9);
    }
}
