//! Spatial reference parsing and projection metadata extraction
//!
//! Accepts both Proj4 strings (`+proj=merc +lon_0=0 +a=3396190 ...`) and
//! WKT (`PROJCS[... PROJECTION["Mercator"] PARAMETER[...] ...]`), and
//! normalizes them into an immutable [`SpatialReference`] carrying the
//! handful of parameters the scale-bar math needs.

use crate::error::{LatbarError, Result, Stage};

/// Closed set of projection families the scale engine knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionFamily {
    Mercator,
    TransverseMercator,
    /// Equirectangular, Equidistant Cylindrical, Plate Carree, and
    /// Simple Cylindrical are one family for scaling purposes
    Equirectangular,
    LambertConformalConic,
    /// Covers both oblique and polar stereographic
    Stereographic,
}

impl ProjectionFamily {
    /// Classify a projection name as reported by the spatial reference.
    ///
    /// Matches by substring on the conventional GDAL/ESRI names.
    /// Transverse Mercator must be checked before Mercator since the
    /// former contains the latter.
    pub fn from_projection_name(name: &str) -> Option<ProjectionFamily> {
        if name.contains("Transverse_Mercator") {
            Some(ProjectionFamily::TransverseMercator)
        } else if name.contains("Mercator") {
            Some(ProjectionFamily::Mercator)
        } else if name.contains("Equirectangular")
            || name.contains("Equidistant_Cylindrical")
            || name.contains("Plate_Carree")
            || name.contains("Simple_Cylindrical")
        {
            Some(ProjectionFamily::Equirectangular)
        } else if name.contains("Lambert_Conformal") {
            Some(ProjectionFamily::LambertConformalConic)
        } else if name.contains("Stereographic") {
            Some(ProjectionFamily::Stereographic)
        } else {
            None
        }
    }
}

/// Projection parameters extracted from a WKT or Proj4 definition.
/// Immutable once parsed.
#[derive(Debug, Clone)]
pub struct SpatialReference {
    name: String,
    family: ProjectionFamily,
    standard_parallels: [f64; 2],
    central_meridian: f64,
    latitude_of_origin: f64,
    scale_factor: f64,
    semimajor: f64,
    semiminor: f64,
    false_easting: f64,
    false_northing: f64,
}

impl SpatialReference {
    /// Parse a projection definition, auto-detecting the format.
    ///
    /// Tries each supported importer in turn, the way OSR cycles
    /// through its import options.
    pub fn parse(definition: &str) -> Result<SpatialReference> {
        let trimmed = definition.trim();
        let importers: [fn(&str) -> Result<SpatialReference>; 2] =
            [SpatialReference::from_proj4, SpatialReference::from_wkt];
        let mut last_err = None;
        for import in importers {
            match import(trimmed) {
                Ok(srs) => return Ok(srs),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            LatbarError::configuration(Stage::Metadata, "empty projection definition")
        }))
    }

    /// Parse a Proj4 string, e.g.
    /// `+proj=merc +lon_0=0 +lat_ts=0 +a=3396190 +b=3376200`.
    pub fn from_proj4(projstring: &str) -> Result<SpatialReference> {
        if !projstring.trim_start().starts_with('+') {
            return Err(LatbarError::configuration(
                Stage::Metadata,
                "not a proj4 string (expected leading '+key=value' tokens)",
            ));
        }

        let mut params = Params::default();
        let mut proj_code = None;
        for token in projstring.split_whitespace() {
            let token = match token.strip_prefix('+') {
                Some(t) => t,
                None => continue,
            };
            let (key, value) = match token.split_once('=') {
                Some(kv) => kv,
                None => continue, // bare flags like +no_defs
            };
            if key == "proj" {
                proj_code = Some(value.to_string());
                continue;
            }
            let value: f64 = match value.parse() {
                Ok(v) => v,
                Err(_) => continue, // non-numeric values (+units=m, +ellps=...)
            };
            match key {
                "lat_1" => params.standard_parallels[0] = value,
                "lat_2" => params.standard_parallels[1] = value,
                "lat_ts" => params.standard_parallels[0] = value,
                "lat_0" => params.latitude_of_origin = value,
                "lon_0" => params.central_meridian = value,
                "k" | "k_0" => params.scale_factor = value,
                "a" => params.semimajor = Some(value),
                "b" => params.semiminor = Some(value),
                "R" => {
                    params.semimajor = Some(value);
                    params.semiminor = Some(value);
                }
                "x_0" => params.false_easting = value,
                "y_0" => params.false_northing = value,
                _ => {}
            }
        }

        let proj_code = proj_code.ok_or_else(|| {
            LatbarError::configuration(Stage::Metadata, "proj4 string has no +proj parameter")
        })?;
        let name = match proj_code.as_str() {
            "merc" => "Mercator_1SP",
            "tmerc" => "Transverse_Mercator",
            "eqc" => "Equirectangular",
            "lcc" => "Lambert_Conformal_Conic_2SP",
            "stere" => {
                if params.latitude_of_origin.abs() == 90.0 {
                    "Polar_Stereographic"
                } else {
                    "Stereographic"
                }
            }
            "ups" => "Polar_Stereographic",
            other => {
                return Err(LatbarError::configuration(
                    Stage::Metadata,
                    format!("unsupported projection code: +proj={other}"),
                ));
            }
        };

        params.finish(name.to_string())
    }

    /// Parse a WKT projected coordinate system definition.
    pub fn from_wkt(wkt: &str) -> Result<SpatialReference> {
        if !wkt.contains("PROJCS") && !wkt.contains("PROJECTION") {
            return Err(LatbarError::configuration(
                Stage::Metadata,
                "not a projected WKT definition (no PROJCS/PROJECTION node)",
            ));
        }

        let name = wkt_node_name(wkt, "PROJECTION").ok_or_else(|| {
            LatbarError::configuration(Stage::Metadata, "WKT is missing a PROJECTION node")
        })?;

        let mut params = Params::default();
        if let Some((_, semimajor, invflattening)) = wkt_spheroid(wkt) {
            params.semimajor = Some(semimajor);
            // inverse flattening 0 denotes a sphere
            let semiminor = if invflattening == 0.0 {
                semimajor
            } else {
                semimajor * (1.0 - 1.0 / invflattening)
            };
            params.semiminor = Some(semiminor);
        }

        for (key, value) in wkt_parameters(wkt) {
            match key.to_ascii_lowercase().as_str() {
                "standard_parallel_1" => params.standard_parallels[0] = value,
                "standard_parallel_2" => params.standard_parallels[1] = value,
                "central_meridian" | "longitude_of_center" => params.central_meridian = value,
                "latitude_of_origin" | "latitude_of_center" => params.latitude_of_origin = value,
                "scale_factor" => params.scale_factor = value,
                "false_easting" => params.false_easting = value,
                "false_northing" => params.false_northing = value,
                _ => {}
            }
        }

        params.finish(name)
    }

    pub fn projection_name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> ProjectionFamily {
        self.family
    }

    /// Both standard parallels; unset parallels read as 0.0, matching
    /// how OSR defaults a missing PARAMETER node.
    pub fn standard_parallels(&self) -> [f64; 2] {
        self.standard_parallels
    }

    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    pub fn latitude_of_origin(&self) -> f64 {
        self.latitude_of_origin
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// (semi-major, semi-minor, inverse flattening); inverse flattening
    /// is 0.0 for a sphere
    #[allow(dead_code)]
    pub fn spheroid(&self) -> (f64, f64, f64) {
        let invf = if self.semimajor == self.semiminor {
            0.0
        } else {
            self.semimajor / (self.semimajor - self.semiminor)
        };
        (self.semimajor, self.semiminor, invf)
    }

    pub fn semimajor(&self) -> f64 {
        self.semimajor
    }

    pub fn false_easting(&self) -> f64 {
        self.false_easting
    }

    pub fn false_northing(&self) -> f64 {
        self.false_northing
    }
}

#[derive(Debug)]
struct Params {
    standard_parallels: [f64; 2],
    central_meridian: f64,
    latitude_of_origin: f64,
    scale_factor: f64,
    semimajor: Option<f64>,
    semiminor: Option<f64>,
    false_easting: f64,
    false_northing: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            standard_parallels: [0.0, 0.0],
            central_meridian: 0.0,
            latitude_of_origin: 0.0,
            scale_factor: 1.0,
            semimajor: None,
            semiminor: None,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }
}

impl Params {
    fn finish(self, name: String) -> Result<SpatialReference> {
        let family = ProjectionFamily::from_projection_name(&name).ok_or_else(|| {
            LatbarError::configuration(
                Stage::Metadata,
                format!("unsupported projection family: {name}"),
            )
        })?;
        let semimajor = self.semimajor.ok_or_else(|| {
            LatbarError::configuration(
                Stage::Metadata,
                "projection definition has no spheroid semi-major axis",
            )
        })?;
        let semiminor = self.semiminor.unwrap_or(semimajor);
        if semimajor <= 0.0 || semiminor <= 0.0 {
            return Err(LatbarError::numeric(
                Stage::Metadata,
                format!("degenerate spheroid: a={semimajor}, b={semiminor}"),
            ));
        }
        Ok(SpatialReference {
            name,
            family,
            standard_parallels: self.standard_parallels,
            central_meridian: self.central_meridian,
            latitude_of_origin: self.latitude_of_origin,
            scale_factor: self.scale_factor,
            semimajor,
            semiminor,
            false_easting: self.false_easting,
            false_northing: self.false_northing,
        })
    }
}

/// Extract the quoted name of the first `KEYWORD["name"...]` node
fn wkt_node_name(wkt: &str, keyword: &str) -> Option<String> {
    let start = wkt.find(&format!("{keyword}["))?;
    let rest = &wkt[start..];
    let open = rest.find('"')?;
    let rest = &rest[open + 1..];
    let close = rest.find('"')?;
    Some(rest[..close].to_string())
}

/// Iterate `PARAMETER["key",value]` pairs in document order
fn wkt_parameters(wkt: &str) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    let mut rest = wkt;
    while let Some(pos) = rest.find("PARAMETER[") {
        rest = &rest[pos + "PARAMETER[".len()..];
        let Some((key, after_key)) = quoted(rest) else {
            break;
        };
        let Some(end) = after_key.find(']') else {
            break;
        };
        let value_str = after_key[..end].trim_start_matches(',').trim();
        if let Ok(value) = value_str.parse::<f64>() {
            out.push((key.to_string(), value));
        }
        rest = &after_key[end..];
    }
    out
}

/// Extract `SPHEROID["name",semimajor,invflattening]`
fn wkt_spheroid(wkt: &str) -> Option<(String, f64, f64)> {
    let pos = wkt.find("SPHEROID[")?;
    let rest = &wkt[pos + "SPHEROID[".len()..];
    let (name, after_name) = quoted(rest)?;
    let end = after_name.find(']')?;
    let mut numbers = after_name[..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let semimajor: f64 = numbers.next()?.parse().ok()?;
    let invflattening: f64 = numbers.next()?.parse().ok()?;
    Some((name.to_string(), semimajor, invflattening))
}

/// Split a leading quoted string off `rest`, returning (contents, remainder)
fn quoted(rest: &str) -> Option<(&str, &str)> {
    let open = rest.find('"')?;
    let rest = &rest[open + 1..];
    let close = rest.find('"')?;
    Some((&rest[..close], &rest[close + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARS_MERC_WKT: &str = r#"PROJCS["Mars_Mercator",
        GEOGCS["GCS_Mars",DATUM["D_Mars",
            SPHEROID["Mars",3396190.0,169.894447223611]],
            PRIMEM["Reference_Meridian",0.0],
            UNIT["Degree",0.017453292519943295]],
        PROJECTION["Mercator"],
        PARAMETER["False_Easting",0.0],
        PARAMETER["False_Northing",0.0],
        PARAMETER["Central_Meridian",0.0],
        PARAMETER["Standard_Parallel_1",0.0],
        UNIT["Meter",1.0]]"#;

    #[test]
    fn test_family_from_name() {
        assert_eq!(
            ProjectionFamily::from_projection_name("Transverse_Mercator"),
            Some(ProjectionFamily::TransverseMercator)
        );
        assert_eq!(
            ProjectionFamily::from_projection_name("Mercator_1SP"),
            Some(ProjectionFamily::Mercator)
        );
        assert_eq!(
            ProjectionFamily::from_projection_name("Simple_Cylindrical"),
            Some(ProjectionFamily::Equirectangular)
        );
        assert_eq!(
            ProjectionFamily::from_projection_name("Lambert_Conformal_Conic_2SP"),
            Some(ProjectionFamily::LambertConformalConic)
        );
        assert_eq!(
            ProjectionFamily::from_projection_name("Polar_Stereographic"),
            Some(ProjectionFamily::Stereographic)
        );
        assert_eq!(ProjectionFamily::from_projection_name("Sinusoidal"), None);
    }

    #[test]
    fn test_proj4_mars_mercator() {
        let srs =
            SpatialReference::from_proj4("+proj=merc +lon_0=0 +lat_ts=0 +a=3396190 +b=3376200")
                .unwrap();
        assert_eq!(srs.family(), ProjectionFamily::Mercator);
        assert_eq!(srs.semimajor(), 3396190.0);
        assert_eq!(srs.standard_parallels(), [0.0, 0.0]);
        assert_eq!(srs.scale_factor(), 1.0);
    }

    #[test]
    fn test_proj4_lambert() {
        let srs = SpatialReference::from_proj4(
            "+proj=lcc +lat_1=73 +lat_2=42 +lat_0=90 +lon_0=20 +a=1737400 +b=1737400",
        )
        .unwrap();
        assert_eq!(srs.family(), ProjectionFamily::LambertConformalConic);
        assert_eq!(srs.standard_parallels(), [73.0, 42.0]);
        assert_eq!(srs.latitude_of_origin(), 90.0);
        let (_, _, invf) = srs.spheroid();
        assert_eq!(invf, 0.0);
    }

    #[test]
    fn test_proj4_polar_stereographic() {
        let srs = SpatialReference::from_proj4(
            "+proj=stere +lat_0=90 +lon_0=0 +k=1 +a=3396190 +b=3376200",
        )
        .unwrap();
        assert_eq!(srs.family(), ProjectionFamily::Stereographic);
        assert_eq!(srs.projection_name(), "Polar_Stereographic");
    }

    #[test]
    fn test_wkt_mars_mercator() {
        let srs = SpatialReference::from_wkt(MARS_MERC_WKT).unwrap();
        assert_eq!(srs.family(), ProjectionFamily::Mercator);
        assert_eq!(srs.semimajor(), 3396190.0);
        let (_, b, _) = srs.spheroid();
        assert!((b - 3376200.0).abs() < 100.0);
    }

    #[test]
    fn test_parse_auto_detects_format() {
        let from_wkt = SpatialReference::parse(MARS_MERC_WKT).unwrap();
        let from_proj4 =
            SpatialReference::parse("+proj=merc +lon_0=0 +lat_ts=0 +a=3396190 +b=3376200").unwrap();
        assert_eq!(from_wkt.family(), from_proj4.family());
        assert_eq!(from_wkt.semimajor(), from_proj4.semimajor());
        assert_eq!(from_wkt.central_meridian(), from_proj4.central_meridian());
    }

    #[test]
    fn test_unsupported_family_rejected() {
        let err = SpatialReference::from_proj4("+proj=sinu +lon_0=0 +a=3396190").unwrap_err();
        assert!(matches!(
            err,
            crate::error::LatbarError::Configuration { .. }
        ));
    }
}
