//! Neuroglancer precomputed volume writer and viewer metadata sidecars.
#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxport_volume::LabelVolume;

/// Chunk edge length of the single emitted scale.
pub const CHUNK_SIZE: usize = 64;

#[derive(Debug, Error)]
pub enum PrecomputedError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed info file: {0}")]
    MalformedInfo(&'static str),
}

#[derive(Serialize, Deserialize)]
struct ScaleInfo {
    key: String,
    size: [u64; 3],
    resolution: [f64; 3],
    chunk_sizes: Vec<[u32; 3]>,
    encoding: String,
    voxel_offset: [i64; 3],
}

#[derive(Serialize, Deserialize)]
struct VolumeInfo {
    #[serde(rename = "@type")]
    type_tag: String,
    #[serde(rename = "type")]
    kind: String,
    data_type: String,
    num_channels: u32,
    scales: Vec<ScaleInfo>,
}

/// Scale directory key derived from the resolution, e.g. `10_10_25`.
pub fn scale_key(resolution: [f64; 3]) -> String {
    format!("{}_{}_{}", resolution[0], resolution[1], resolution[2])
}

/// Writes the volume as a single-scale raw-encoded precomputed array:
/// an `info` file plus one chunk file per 64-cubed block.
pub fn write_volume(dir: &Path, vol: &LabelVolume) -> Result<(), PrecomputedError> {
    fs::create_dir_all(dir)?;
    let key = scale_key(vol.voxel_size);
    let info = VolumeInfo {
        type_tag: "neuroglancer_multiscale_volume".to_string(),
        kind: "image".to_string(),
        data_type: "uint16".to_string(),
        num_channels: 1,
        scales: vec![ScaleInfo {
            key: key.clone(),
            size: [vol.sx as u64, vol.sy as u64, vol.sz as u64],
            resolution: vol.voxel_size,
            chunk_sizes: vec![[CHUNK_SIZE as u32; 3]],
            encoding: "raw".to_string(),
            voxel_offset: [0, 0, 0],
        }],
    };
    fs::write(dir.join("info"), serde_json::to_string(&info)?)?;

    let scale_dir = dir.join(&key);
    fs::create_dir_all(&scale_dir)?;
    let mut chunks = 0usize;
    for z0 in (0..vol.sz).step_by(CHUNK_SIZE) {
        let z1 = (z0 + CHUNK_SIZE).min(vol.sz);
        for y0 in (0..vol.sy).step_by(CHUNK_SIZE) {
            let y1 = (y0 + CHUNK_SIZE).min(vol.sy);
            for x0 in (0..vol.sx).step_by(CHUNK_SIZE) {
                let x1 = (x0 + CHUNK_SIZE).min(vol.sx);
                let name = format!("{x0}-{x1}_{y0}-{y1}_{z0}-{z1}");
                fs::write(
                    scale_dir.join(name),
                    chunk_bytes(vol, (x0, x1), (y0, y1), (z0, z1)),
                )?;
                chunks += 1;
            }
        }
    }
    log::info!(
        target: "precomputed",
        "wrote {}x{}x{} volume as {} chunks under {}",
        vol.sx,
        vol.sy,
        vol.sz,
        chunks,
        dir.display()
    );
    Ok(())
}

/// Raw chunk encoding: u16 little-endian, x fastest, then y, then z.
fn chunk_bytes(
    vol: &LabelVolume,
    (x0, x1): (usize, usize),
    (y0, y1): (usize, usize),
    (z0, z1): (usize, usize),
) -> Vec<u8> {
    let mut out = Vec::with_capacity((x1 - x0) * (y1 - y0) * (z1 - z0) * 2);
    for z in z0..z1 {
        for y in y0..y1 {
            for x in x0..x1 {
                out.extend_from_slice(&vol.get(x, y, z).to_le_bytes());
            }
        }
    }
    out
}

/// Read-modify-write of the volume `info`, cross-linking it to the mesh and
/// segment-properties directories. Must run after `write_volume` returns.
pub fn patch_info(dir: &Path) -> Result<(), PrecomputedError> {
    let path = dir.join("info");
    let mut info: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let obj = info
        .as_object_mut()
        .ok_or(PrecomputedError::MalformedInfo("root must be a JSON object"))?;
    obj.insert("type".to_string(), "segmentation".into());
    obj.insert("mesh".to_string(), "mesh".into());
    obj.insert(
        "segment_properties".to_string(),
        "segment_properties".into(),
    );
    fs::write(path, serde_json::to_string(&info)?)?;
    Ok(())
}

#[derive(Serialize)]
struct SegmentPropertiesInfo {
    #[serde(rename = "@type")]
    type_tag: &'static str,
    inline: InlineProperties,
}

#[derive(Serialize)]
struct InlineProperties {
    ids: Vec<String>,
    properties: Vec<InlineProperty>,
}

#[derive(Serialize)]
struct InlineProperty {
    id: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    values: Vec<String>,
}

/// Emits `segment_properties/info` under `root`: every object id as a string,
/// with a `label` property whose values equal the ids.
pub fn write_segment_properties(root: &Path, ids: &[u64]) -> Result<(), PrecomputedError> {
    let strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    let info = SegmentPropertiesInfo {
        type_tag: "neuroglancer_segment_properties",
        inline: InlineProperties {
            ids: strings.clone(),
            properties: vec![InlineProperty {
                id: "label",
                kind: "label",
                values: strings,
            }],
        },
    };
    let dir = root.join("segment_properties");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("info"), serde_json::to_string(&info)?)?;
    Ok(())
}
