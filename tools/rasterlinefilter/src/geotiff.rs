//! GeoTIFF → RasterGrid loading.
//!
//! Georeferencing comes from ModelPixelScale (33550) + ModelTiepoint (33922),
//! falling back to an unrotated ModelTransformation (34264). The GDAL_NODATA
//! tag (42113) supplies the nodata value when present.
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use anyhow::{bail, Context, Result};
use linefilter_core::{CellData, GridExtent, RasterGrid};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const MODEL_TRANSFORMATION: Tag = Tag::ModelTransformationTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

pub fn read_grid(path: &Path, band: usize) -> Result<RasterGrid> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    decode_grid(BufReader::new(file), band)
        .with_context(|| format!("Cannot load raster {}", path.display()))
}

/// Decode the first image of a TIFF stream, keeping sample `band` of each pixel.
pub fn decode_grid<R: Read + Seek>(reader: R, band: usize) -> Result<RasterGrid> {
    let mut decoder = Decoder::new(reader).context("Not a valid TIFF")?;
    let (width, height) = decoder.dimensions().context("Cannot read dimensions")?;
    let (cols, rows) = (width as usize, height as usize);
    if cols == 0 || rows == 0 {
        bail!("Empty raster ({cols}x{rows})");
    }

    let image = decoder.read_image().context("Cannot read image data")?;
    let data = match image {
        DecodingResult::U8(v) => CellData::U8(select_band(v, rows * cols, band)?),
        DecodingResult::I8(v) => CellData::I8(select_band(v, rows * cols, band)?),
        DecodingResult::U16(v) => CellData::U16(select_band(v, rows * cols, band)?),
        DecodingResult::I16(v) => CellData::I16(select_band(v, rows * cols, band)?),
        _ => bail!("Unsupported cell type (expected 8- or 16-bit integers)"),
    };

    let extent = read_extent(&mut decoder, rows, cols)?;
    let nodata = read_nodata(&mut decoder);
    log::info!(
        "raster {cols}x{rows}, cell {}x{}, origin ({}, {}), nodata {:?}",
        extent.cell_size_x,
        extent.cell_size_y,
        extent.left,
        extent.top,
        nodata
    );

    Ok(RasterGrid::new(extent, data)?.with_nodata(nodata))
}

/// De-interleave sample `band` from chunky pixel data.
fn select_band<T: Copy>(data: Vec<T>, cells: usize, band: usize) -> Result<Vec<T>> {
    if data.len() % cells != 0 {
        bail!("{} samples do not divide into {} cells", data.len(), cells);
    }
    let samples = data.len() / cells;
    if band >= samples {
        bail!("Band {band} requested but raster has {samples} sample(s) per pixel");
    }
    if samples == 1 {
        return Ok(data);
    }
    Ok(data.into_iter().skip(band).step_by(samples).collect())
}

fn read_extent<R: Read + Seek>(decoder: &mut Decoder<R>, rows: usize, cols: usize) -> Result<GridExtent> {
    if let (Ok(scale), Ok(tie)) = (
        decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE),
        decoder.get_tag_f64_vec(MODEL_TIEPOINT),
    ) {
        if scale.len() >= 2 && tie.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z]; scale: [sx, sy, sz]
            let left = tie[3] - tie[0] * scale[0];
            let top = tie[4] + tie[1] * scale[1];
            return Ok(GridExtent::new(left, top, scale[0], scale[1], rows, cols));
        }
    }

    if let Ok(t) = decoder.get_tag_f64_vec(MODEL_TRANSFORMATION) {
        if t.len() >= 16 {
            if t[1] != 0.0 || t[4] != 0.0 {
                bail!("Rotated rasters are not supported");
            }
            return Ok(GridExtent::new(t[3], t[7], t[0], -t[5], rows, cols));
        }
    }

    bail!("Raster has no GeoTIFF georeferencing tags")
}

/// Integral GDAL_NODATA value, if declared.
fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<i64> {
    let text = decoder.get_tag_ascii_string(GDAL_NODATA).ok()?;
    let value: f64 = text.trim_end_matches('\0').trim().parse().ok()?;
    if value.fract() == 0.0 {
        Some(value as i64)
    } else {
        log::warn!("ignoring non-integral nodata value {value}");
        None
    }
}
