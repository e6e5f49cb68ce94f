pub mod projection;
pub mod sampler;

pub use projection::Projector;
pub use sampler::{SampleNodes, sample_geographic, sample_projected};

/// Bounding box in projected map coordinates (meters)
#[derive(Debug, Clone, Copy)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

/// Geographic bounding box in degrees, used by projstring mode where the
/// caller supplies the area of interest directly
#[derive(Debug, Clone, Copy)]
pub struct GeoExtent {
    pub minlat: f64,
    #[allow(dead_code)]
    pub minlon: f64,
    pub maxlat: f64,
    #[allow(dead_code)]
    pub maxlon: f64,
}

impl GeoExtent {
    pub fn new(minlat: f64, minlon: f64, maxlat: f64, maxlon: f64) -> Self {
        Self {
            minlat,
            minlon,
            maxlat,
            maxlon,
        }
    }
}
