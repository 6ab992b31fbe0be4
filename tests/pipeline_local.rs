// End-to-end staging run on the two-object example volume, upload skipped.
// Exercises the binary via `--skip-upload --keep-staging` against a generated
// TIFF stack and checks the full precomputed tree.

use std::fs;
use std::path::Path;
use std::process::Command;

use tiff::encoder::{TiffEncoder, colortype};

fn write_example_tiff(path: &Path) {
    // 10x10x10 with object 1 as a 3-cube and object 2 as a plate.
    let (sx, sy, sz) = (10usize, 10usize, 10usize);
    let mut labels = vec![0u16; sx * sy * sz];
    for z in 1..4 {
        for y in 1..4 {
            for x in 1..4 {
                labels[(z * sy + y) * sx + x] = 1;
            }
        }
    }
    for z in 6..9 {
        for y in 6..9 {
            labels[(z * sy + y) * sx + 6] = 2;
        }
    }
    let file = fs::File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    for z in 0..sz {
        let page = &labels[z * sx * sy..(z + 1) * sx * sy];
        encoder
            .write_image::<colortype::Gray16>(sx as u32, sy as u32, page)
            .unwrap();
    }
}

#[test]
fn staged_tree_matches_example_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("labels.tif");
    write_example_tiff(&input);
    let staging = dir.path().join("stage");

    let status = Command::new(env!("CARGO_BIN_EXE_voxport"))
        .args([
            "--input",
            input.to_str().unwrap(),
            "--staging-dir",
            staging.to_str().unwrap(),
            "--voxel-size",
            "10,10,10",
            "--skip-upload",
        ])
        .status()
        .unwrap();
    assert!(status.success());

    // volume info patched for the viewer
    let info: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(staging.join("info")).unwrap()).unwrap();
    assert_eq!(info["type"], "segmentation");
    assert_eq!(info["mesh"], "mesh");
    assert_eq!(info["segment_properties"], "segment_properties");
    assert!(staging.join("10_10_10").join("0-10_0-10_0-10").is_file());

    // mesh directory holds exactly the two objects
    let mut names: Vec<String> = fs::read_dir(staging.join("mesh"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["1:0", "1:0:0000000000000000", "2:0", "2:0:0000000000000000", "info"]
    );

    // segment properties list both ids, values identical
    let props: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(staging.join("segment_properties").join("info")).unwrap(),
    )
    .unwrap();
    assert_eq!(props["inline"]["ids"], serde_json::json!(["1", "2"]));
    assert_eq!(
        props["inline"]["properties"][0]["values"],
        serde_json::json!(["1", "2"])
    );
}

#[test]
fn missing_bucket_without_skip_upload_fails_before_staging_removal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("labels.tif");
    write_example_tiff(&input);
    let staging = dir.path().join("stage");

    let status = Command::new(env!("CARGO_BIN_EXE_voxport"))
        .args([
            "--input",
            input.to_str().unwrap(),
            "--staging-dir",
            staging.to_str().unwrap(),
        ])
        .status()
        .unwrap();
    assert!(!status.success());
    // the staged tree survives the failed run
    assert!(staging.join("info").is_file());
}
