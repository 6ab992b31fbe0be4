//! Dense segmentation label volume and source-image loaders.
#![forbid(unsafe_code)]

mod load;
mod n5;

pub use load::{read_tiff_stack, read_volume};
pub use n5::read_n5_dataset;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tiff decode error: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("malformed n5 store: {0}")]
    N5(String),
}

/// Dense 3-D label array. Non-zero values identify segmented objects.
///
/// Storage is linearized x-fastest, then y, then z, which is also the order
/// the precomputed raw chunk encoding expects.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelVolume {
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    /// Physical voxel spacing per axis, in nanometres.
    pub voxel_size: [f64; 3],
    pub labels: Vec<u16>,
}

impl LabelVolume {
    pub fn new(sx: usize, sy: usize, sz: usize, voxel_size: [f64; 3]) -> Self {
        Self {
            sx,
            sy,
            sz,
            voxel_size,
            labels: vec![0; sx * sy * sz],
        }
    }

    pub fn from_labels(
        sx: usize,
        sy: usize,
        sz: usize,
        voxel_size: [f64; 3],
        labels: Vec<u16>,
    ) -> Self {
        let mut l = labels;
        let expect = sx * sy * sz;
        if l.len() != expect {
            l.resize(expect, 0);
        }
        Self {
            sx,
            sy,
            sz,
            voxel_size,
            labels: l,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.sy + y) * self.sx + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u16 {
        self.labels[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, label: u16) {
        let i = self.idx(x, y, z);
        self.labels[i] = label;
    }

    /// Label at (x, y, z), or 0 for coordinates outside the volume.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64, z: i64) -> u16 {
        if x < 0
            || y < 0
            || z < 0
            || x >= self.sx as i64
            || y >= self.sy as i64
            || z >= self.sz as i64
        {
            return 0;
        }
        self.get(x as usize, y as usize, z as usize)
    }

    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.sx * self.sy * self.sz
    }

    /// Distinct non-zero labels in ascending order.
    pub fn object_ids(&self) -> Vec<u64> {
        let mut seen = vec![false; u16::MAX as usize + 1];
        for &l in &self.labels {
            seen[l as usize] = true;
        }
        (1..=u16::MAX as usize)
            .filter(|&l| seen[l])
            .map(|l| l as u64)
            .collect()
    }

    #[inline]
    pub fn has_objects(&self) -> bool {
        self.labels.iter().any(|&l| l != 0)
    }
}
