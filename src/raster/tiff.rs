//! Minimal classic-TIFF tag reader
//!
//! Pulls just the handful of IFD entries the scale bar needs: raster
//! dimensions plus the GeoTIFF ModelPixelScale and ModelTiepoint tags
//! the geotransform is derived from. Both byte orders are handled;
//! BigTIFF is rejected with a data-source error. Pixel data is never
//! touched, so arbitrarily large rasters open instantly.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{LatbarError, Result};

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_DOUBLE: u16 = 12;

/// Raster dimensions and geo tags from IFD0
#[derive(Debug, Clone)]
pub struct TiffInfo {
    pub width: u32,
    pub height: u32,
    /// (sx, sy, sz) map units per pixel
    pub pixel_scale: Option<[f64; 3]>,
    /// (i, j, k, x, y, z) raster-to-model tiepoint
    pub tiepoint: Option<[f64; 6]>,
}

pub fn read_info(path: &Path) -> Result<TiffInfo> {
    let mut file = File::open(path).map_err(|e| {
        LatbarError::data_source(format!("cannot open raster {}: {e}", path.display()))
    })?;

    let mut header = [0u8; 8];
    file.read_exact(&mut header)
        .map_err(|_| LatbarError::data_source("file too short to be a TIFF"))?;
    let little = match &header[0..2] {
        b"II" => true,
        b"MM" => false,
        _ => return Err(LatbarError::data_source("not a TIFF (bad byte-order mark)")),
    };
    let order = ByteOrder { little };
    let magic = order.u16(&header[2..4]);
    if magic == 43 {
        return Err(LatbarError::data_source("BigTIFF is not supported"));
    }
    if magic != 42 {
        return Err(LatbarError::data_source(format!(
            "not a TIFF (magic {magic}, expected 42)"
        )));
    }
    let ifd_offset = order.u32(&header[4..8]) as u64;

    file.seek(SeekFrom::Start(ifd_offset))
        .map_err(|_| LatbarError::data_source("IFD offset points past end of file"))?;
    let mut count_buf = [0u8; 2];
    file.read_exact(&mut count_buf)
        .map_err(|_| LatbarError::data_source("truncated IFD"))?;
    let entry_count = order.u16(&count_buf) as usize;

    let mut entries = vec![0u8; entry_count * 12];
    file.read_exact(&mut entries)
        .map_err(|_| LatbarError::data_source("truncated IFD entries"))?;

    let mut info = TiffInfo {
        width: 0,
        height: 0,
        pixel_scale: None,
        tiepoint: None,
    };
    for entry in entries.chunks_exact(12) {
        let tag = order.u16(&entry[0..2]);
        let type_ = order.u16(&entry[2..4]);
        let count = order.u32(&entry[4..8]);
        let value = &entry[8..12];
        match tag {
            TAG_IMAGE_WIDTH => info.width = read_dimension(&order, type_, value)?,
            TAG_IMAGE_LENGTH => info.height = read_dimension(&order, type_, value)?,
            TAG_MODEL_PIXEL_SCALE if type_ == TYPE_DOUBLE && count >= 3 => {
                let values = read_doubles(&mut file, &order, value, 3)?;
                info.pixel_scale = Some([values[0], values[1], values[2]]);
            }
            TAG_MODEL_TIEPOINT if type_ == TYPE_DOUBLE && count >= 6 => {
                let values = read_doubles(&mut file, &order, value, 6)?;
                let mut tp = [0.0; 6];
                tp.copy_from_slice(&values[..6]);
                info.tiepoint = Some(tp);
            }
            _ => {}
        }
    }

    if info.width == 0 || info.height == 0 {
        return Err(LatbarError::data_source(
            "TIFF is missing ImageWidth/ImageLength",
        ));
    }
    Ok(info)
}

#[derive(Clone, Copy)]
struct ByteOrder {
    little: bool,
}

impl ByteOrder {
    fn u16(&self, b: &[u8]) -> u16 {
        let b: [u8; 2] = b[..2].try_into().unwrap_or_default();
        if self.little {
            u16::from_le_bytes(b)
        } else {
            u16::from_be_bytes(b)
        }
    }

    fn u32(&self, b: &[u8]) -> u32 {
        let b: [u8; 4] = b[..4].try_into().unwrap_or_default();
        if self.little {
            u32::from_le_bytes(b)
        } else {
            u32::from_be_bytes(b)
        }
    }

    fn f64(&self, b: &[u8]) -> f64 {
        let b: [u8; 8] = b[..8].try_into().unwrap_or_default();
        if self.little {
            f64::from_le_bytes(b)
        } else {
            f64::from_be_bytes(b)
        }
    }
}

/// SHORT or LONG dimension, inlined in the value field
fn read_dimension(order: &ByteOrder, type_: u16, value: &[u8]) -> Result<u32> {
    match type_ {
        TYPE_SHORT => Ok(order.u16(&value[..2]) as u32),
        TYPE_LONG => Ok(order.u32(value)),
        other => Err(LatbarError::data_source(format!(
            "unexpected dimension tag type {other}"
        ))),
    }
}

/// DOUBLE arrays never fit in the 4-byte value field, so the field holds
/// an offset to the data
fn read_doubles(file: &mut File, order: &ByteOrder, value: &[u8], n: usize) -> Result<Vec<f64>> {
    let offset = order.u32(value) as u64;
    let pos = file
        .stream_position()
        .map_err(|_| LatbarError::data_source("seek failed"))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|_| LatbarError::data_source("geo tag offset past end of file"))?;
    let mut buf = vec![0u8; n * 8];
    file.read_exact(&mut buf)
        .map_err(|_| LatbarError::data_source("truncated geo tag data"))?;
    file.seek(SeekFrom::Start(pos))
        .map_err(|_| LatbarError::data_source("seek failed"))?;
    Ok(buf.chunks_exact(8).map(|c| order.f64(c)).collect())
}


#[cfg(test)]
mod tests {
    use super::test_support::build_geotiff;
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_read_little_endian() {
        let bytes = build_geotiff(
            true,
            1000,
            500,
            [463.0, 463.0, 0.0],
            [0.0, 0.0, 0.0, -100000.0, 200000.0, 0.0],
        );
        let f = write_temp(&bytes);
        let info = read_info(f.path()).unwrap();
        assert_eq!(info.width, 1000);
        assert_eq!(info.height, 500);
        assert_eq!(info.pixel_scale, Some([463.0, 463.0, 0.0]));
        assert_eq!(
            info.tiepoint,
            Some([0.0, 0.0, 0.0, -100000.0, 200000.0, 0.0])
        );
    }

    #[test]
    fn test_read_big_endian() {
        let bytes = build_geotiff(
            false,
            64,
            32,
            [10.0, 10.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 320.0, 0.0],
        );
        let f = write_temp(&bytes);
        let info = read_info(f.path()).unwrap();
        assert_eq!(info.width, 64);
        assert_eq!(info.height, 32);
        assert_eq!(info.pixel_scale, Some([10.0, 10.0, 0.0]));
    }

    #[test]
    fn test_not_a_tiff() {
        let f = write_temp(b"PNG nonsense");
        assert!(matches!(
            read_info(f.path()),
            Err(LatbarError::DataSource { .. })
        ));
    }
}
