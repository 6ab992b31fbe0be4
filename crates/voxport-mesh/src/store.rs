//! Mesh directory layout consumed by the viewer.
//!
//! One `info` sidecar, then per object id a binary fragment
//! `{id}:0:0000000000000000` and a manifest `{id}:0` listing it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::fragment::encode_fragment;
use crate::{Mesh, MeshError};

pub fn fragment_name(id: u64) -> String {
    format!("{id}:0:0000000000000000")
}

pub fn manifest_name(id: u64) -> String {
    format!("{id}:0")
}

#[derive(Serialize)]
struct MeshDirInfo {
    #[serde(rename = "@type")]
    type_tag: &'static str,
}

#[derive(Serialize)]
struct FragmentManifest {
    fragments: Vec<String>,
}

/// Materializes the mesh mapping into `dir`, creating it if absent.
pub fn write_mesh_dir(dir: &Path, meshes: &BTreeMap<u64, Mesh>) -> Result<(), MeshError> {
    fs::create_dir_all(dir)?;
    let info = MeshDirInfo {
        type_tag: "neuroglancer_legacy_mesh",
    };
    fs::write(dir.join("info"), serde_json::to_string(&info)?)?;
    for (&id, mesh) in meshes {
        let manifest = FragmentManifest {
            fragments: vec![fragment_name(id)],
        };
        fs::write(dir.join(manifest_name(id)), serde_json::to_string(&manifest)?)?;
        fs::write(dir.join(fragment_name(id)), encode_fragment(mesh))?;
    }
    log::info!(
        target: "mesh",
        "wrote {} mesh fragments to {}",
        meshes.len(),
        dir.display()
    );
    Ok(())
}
