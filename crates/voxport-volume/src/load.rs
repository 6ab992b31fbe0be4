use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};

use crate::{LabelVolume, VolumeError};

/// Reads a label volume from a source image on disk.
///
/// Dispatch is by extension: `.tif`/`.tiff` for a single- or multi-page TIFF
/// stack, `.n5` for an N5 chunked store (dataset named by `n5_dataset`).
pub fn read_volume(
    path: &Path,
    n5_dataset: &str,
    voxel_size: [f64; 3],
) -> Result<LabelVolume, VolumeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("tif") | Some("tiff") => read_tiff_stack(path, voxel_size),
        Some("n5") => crate::n5::read_n5_dataset(path, n5_dataset, voxel_size),
        _ => Err(VolumeError::UnsupportedFormat(
            path.display().to_string(),
        )),
    }
}

/// Reads a u16 TIFF stack; each page becomes one z slice.
pub fn read_tiff_stack(path: &Path, voxel_size: [f64; 3]) -> Result<LabelVolume, VolumeError> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;
    let (sx, sy) = decoder.dimensions()?;
    let (sx, sy) = (sx as usize, sy as usize);

    let mut labels: Vec<u16> = Vec::new();
    let mut sz = 0usize;
    loop {
        let page = match decoder.read_image()? {
            DecodingResult::U16(v) => v,
            DecodingResult::U8(v) => v.into_iter().map(u16::from).collect(),
            _ => {
                return Err(VolumeError::UnsupportedFormat(format!(
                    "{}: tiff samples must be unsigned 8- or 16-bit",
                    path.display()
                )));
            }
        };
        if page.len() != sx * sy {
            return Err(VolumeError::UnsupportedFormat(format!(
                "{}: page {} has {} samples, expected {}",
                path.display(),
                sz,
                page.len(),
                sx * sy
            )));
        }
        labels.extend_from_slice(&page);
        sz += 1;
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    log::info!(
        target: "volume",
        "read tiff stack {} ({}x{}x{})",
        path.display(),
        sx,
        sy,
        sz
    );
    Ok(LabelVolume::from_labels(sx, sy, sz, voxel_size, labels))
}
