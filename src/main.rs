//! voxport: convert a segmentation label volume to the neuroglancer
//! precomputed format and mirror it into an S3 bucket.

mod config;
mod pipeline;

use std::path::PathBuf;

use clap::Parser;

use crate::config::JobConfig;

#[derive(Parser, Debug)]
#[command(name = "voxport", version, about = "Segmentation volume to precomputed converter")]
struct Cli {
    /// TOML job file; mutually exclusive with the individual flags below.
    #[arg(long, conflicts_with_all = ["input", "bucket", "prefix"])]
    job: Option<PathBuf>,

    /// Source image: a TIFF stack or an N5 root.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Local staging directory for the precomputed tree.
    #[arg(long, default_value = "upload_dir")]
    staging_dir: PathBuf,

    /// Physical voxel spacing per axis in nanometres, e.g. 10,10,25.
    #[arg(long, value_delimiter = ',', default_values_t = [1.0, 1.0, 1.0])]
    voxel_size: Vec<f64>,

    /// N5 dataset name inside the store.
    #[arg(long, default_value = "volume")]
    n5_dataset: String,

    /// Destination S3 bucket.
    #[arg(long)]
    bucket: Option<String>,

    /// Key prefix inside the bucket.
    #[arg(long)]
    prefix: Option<String>,

    /// Explicit credentials; omit both to use the ambient provider chain.
    #[arg(long, requires = "secret_access_key")]
    access_key_id: Option<String>,
    #[arg(long, requires = "access_key_id")]
    secret_access_key: Option<String>,

    /// Leave the staging tree on disk after a successful upload.
    #[arg(long)]
    keep_staging: bool,

    /// Stage locally and skip the upload.
    #[arg(long)]
    skip_upload: bool,
}

fn job_from_cli(cli: Cli) -> Result<JobConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.job {
        return JobConfig::from_path(path);
    }
    let input = cli.input.ok_or("either --job or --input is required")?;
    Ok(JobConfig {
        input,
        staging_dir: cli.staging_dir,
        voxel_size: [cli.voxel_size[0], cli.voxel_size[1], cli.voxel_size[2]],
        n5_dataset: cli.n5_dataset,
        bucket: cli.bucket,
        prefix: cli.prefix,
        access_key_id: cli.access_key_id,
        secret_access_key: cli.secret_access_key,
        keep_staging: cli.keep_staging,
        skip_upload: cli.skip_upload,
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let job = match job_from_cli(cli) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("voxport: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = pipeline::run(&job) {
        log::error!(target: "pipeline", "conversion failed: {e}");
        std::process::exit(1);
    }
}
