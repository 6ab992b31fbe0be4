//! Per-object surface meshing and legacy precomputed mesh output.
#![forbid(unsafe_code)]

mod fragment;
mod mesher;
mod store;

pub use fragment::{decode_fragment, encode_fragment};
pub use mesher::{MeshSettings, mesh_labels};
pub use store::{fragment_name, manifest_name, write_mesh_dir};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("truncated mesh fragment: {0}")]
    TruncatedFragment(&'static str),
}

/// Triangulated surface for one object id. Positions are in physical units.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Mesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
