//! The conversion pipeline: load labels, mesh objects, stage the precomputed
//! tree, upload it, then clean up.

use std::fs;

use thiserror::Error;
use voxport_mesh::{MeshError, MeshSettings, mesh_labels, write_mesh_dir};
use voxport_precomputed::{
    PrecomputedError, patch_info, write_segment_properties, write_volume,
};
use voxport_s3::{S3Credentials, S3Target, S3Uploader, UploadError};
use voxport_volume::{VolumeError, read_volume};

use crate::config::JobConfig;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(&'static str),
    #[error(transparent)]
    Volume(#[from] VolumeError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Precomputed(#[from] PrecomputedError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn run(job: &JobConfig) -> Result<(), PipelineError> {
    let volume = read_volume(&job.input, &job.n5_dataset, job.voxel_size)?;
    let meshes = mesh_labels(&volume, &MeshSettings::default());

    let staging = &job.staging_dir;
    fs::create_dir_all(staging)?;
    write_volume(staging, &volume)?;
    patch_info(staging)?;
    write_mesh_dir(&staging.join("mesh"), &meshes)?;
    let ids: Vec<u64> = meshes.keys().copied().collect();
    write_segment_properties(staging, &ids)?;
    log::info!(
        target: "pipeline",
        "staged {} objects under {}",
        ids.len(),
        staging.display()
    );

    if job.skip_upload {
        log::info!(target: "pipeline", "skip_upload set, leaving staging tree in place");
        return Ok(());
    }

    let bucket = job
        .bucket
        .clone()
        .ok_or(PipelineError::Config("bucket is required unless skip_upload is set"))?;
    let prefix = job
        .prefix
        .clone()
        .ok_or(PipelineError::Config("prefix is required unless skip_upload is set"))?;
    let credentials = match (&job.access_key_id, &job.secret_access_key) {
        (Some(id), Some(secret)) => Some(S3Credentials {
            access_key_id: id.clone(),
            secret_access_key: secret.clone(),
        }),
        (None, None) => None,
        _ => {
            return Err(PipelineError::Config(
                "access_key_id and secret_access_key must be set together",
            ));
        }
    };

    let uploader = S3Uploader::connect(S3Target {
        bucket,
        prefix,
        credentials,
    })?;
    uploader.upload_tree(staging)?;

    // The staging tree only goes away once the upload has fully succeeded;
    // a failed upload propagates above and leaves it in place.
    if !job.keep_staging {
        fs::remove_dir_all(staging)?;
    }
    Ok(())
}
