//! Minimal N5 reader: `attributes.json` plus big-endian block files.
//!
//! Supports 3-D uint16 datasets with `raw` or `gzip` block compression.
//! Missing block files read as background, per N5 semantics.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::{LabelVolume, VolumeError};

#[derive(Deserialize)]
struct DatasetAttributes {
    dimensions: Vec<u64>,
    #[serde(rename = "blockSize")]
    block_size: Vec<u32>,
    #[serde(rename = "dataType")]
    data_type: String,
    compression: CompressionAttributes,
}

#[derive(Deserialize)]
struct CompressionAttributes {
    #[serde(rename = "type")]
    kind: String,
}

/// Reads one 3-D uint16 dataset from an N5 root directory.
///
/// N5 lists dimensions fastest-first, so `dimensions[0]` maps to x and block
/// files live at `dataset/gx/gy/gz`.
pub fn read_n5_dataset(
    root: &Path,
    dataset: &str,
    voxel_size: [f64; 3],
) -> Result<LabelVolume, VolumeError> {
    let dataset_dir = root.join(dataset);
    let attr_path = dataset_dir.join("attributes.json");
    let attrs: DatasetAttributes =
        serde_json::from_reader(BufReader::new(File::open(&attr_path)?))?;

    if attrs.data_type != "uint16" {
        return Err(VolumeError::N5(format!(
            "unsupported data type {:?}, expected uint16",
            attrs.data_type
        )));
    }
    if attrs.dimensions.len() != 3 || attrs.block_size.len() != 3 {
        return Err(VolumeError::N5(format!(
            "expected a 3-d dataset, got {} dimensions",
            attrs.dimensions.len()
        )));
    }
    let gzip = match attrs.compression.kind.as_str() {
        "raw" => false,
        "gzip" => true,
        other => {
            return Err(VolumeError::N5(format!(
                "unsupported block compression {other:?}"
            )));
        }
    };

    let (sx, sy, sz) = (
        attrs.dimensions[0] as usize,
        attrs.dimensions[1] as usize,
        attrs.dimensions[2] as usize,
    );
    let (bx, by, bz) = (
        attrs.block_size[0] as usize,
        attrs.block_size[1] as usize,
        attrs.block_size[2] as usize,
    );
    if bx == 0 || by == 0 || bz == 0 {
        return Err(VolumeError::N5("zero block size".into()));
    }

    let mut vol = LabelVolume::new(sx, sy, sz, voxel_size);
    for gz in 0..sz.div_ceil(bz) {
        for gy in 0..sy.div_ceil(by) {
            for gx in 0..sx.div_ceil(bx) {
                let block_path = dataset_dir
                    .join(gx.to_string())
                    .join(gy.to_string())
                    .join(gz.to_string());
                if !block_path.is_file() {
                    continue;
                }
                let block = read_block(&block_path, gzip)?;
                copy_block(&mut vol, (gx * bx, gy * by, gz * bz), &block)?;
            }
        }
    }
    log::info!(
        target: "volume",
        "read n5 dataset {}/{} ({}x{}x{})",
        root.display(),
        dataset,
        sx,
        sy,
        sz
    );
    Ok(vol)
}

struct Block {
    nx: usize,
    ny: usize,
    nz: usize,
    data: Vec<u16>,
}

fn read_block(path: &Path, gzip: bool) -> Result<Block, VolumeError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mode = reader.read_u16::<BigEndian>()?;
    if mode > 1 {
        return Err(VolumeError::N5(format!("unsupported block mode {mode}")));
    }
    let ndim = reader.read_u16::<BigEndian>()? as usize;
    if ndim != 3 {
        return Err(VolumeError::N5(format!(
            "block at {} has {ndim} dimensions, expected 3",
            path.display()
        )));
    }
    let nx = reader.read_i32::<BigEndian>()? as usize;
    let ny = reader.read_i32::<BigEndian>()? as usize;
    let nz = reader.read_i32::<BigEndian>()? as usize;
    if mode == 1 {
        // Varlength blocks carry an explicit element count; for dense uint16
        // data it must equal the block extent.
        let n = reader.read_i32::<BigEndian>()? as usize;
        if n != nx * ny * nz {
            return Err(VolumeError::N5(format!(
                "varlength block at {} has {n} elements, expected {}",
                path.display(),
                nx * ny * nz
            )));
        }
    }

    let mut payload: Box<dyn Read> = if gzip {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };
    let mut data = vec![0u16; nx * ny * nz];
    payload.read_u16_into::<BigEndian>(&mut data)?;
    Ok(Block { nx, ny, nz, data })
}

fn copy_block(
    vol: &mut LabelVolume,
    offset: (usize, usize, usize),
    block: &Block,
) -> Result<(), VolumeError> {
    let (x0, y0, z0) = offset;
    if x0 + block.nx > vol.sx || y0 + block.ny > vol.sy || z0 + block.nz > vol.sz {
        return Err(VolumeError::N5(format!(
            "block of {}x{}x{} at offset ({x0}, {y0}, {z0}) exceeds dataset bounds",
            block.nx, block.ny, block.nz
        )));
    }
    // Block payload is d0-fastest, matching the volume's x-fastest layout.
    for z in 0..block.nz {
        for y in 0..block.ny {
            let src = (z * block.ny + y) * block.nx;
            let dst = vol.idx(x0, y0 + y, z0 + z);
            vol.labels[dst..dst + block.nx]
                .copy_from_slice(&block.data[src..src + block.nx]);
        }
    }
    Ok(())
}
