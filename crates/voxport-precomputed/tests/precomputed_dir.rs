use std::fs;

use voxport_precomputed::{patch_info, scale_key, write_segment_properties, write_volume};
use voxport_volume::LabelVolume;

fn small_volume() -> LabelVolume {
    let mut vol = LabelVolume::new(3, 4, 5, [10.0, 10.0, 25.0]);
    for z in 0..5 {
        for y in 0..4 {
            for x in 0..3 {
                vol.set(x, y, z, (x + y * 3 + z * 12) as u16);
            }
        }
    }
    vol
}

#[test]
fn single_chunk_volume_layout() {
    let dir = tempfile::tempdir().unwrap();
    let vol = small_volume();
    write_volume(dir.path(), &vol).unwrap();

    let info: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("info")).unwrap()).unwrap();
    assert_eq!(info["@type"], "neuroglancer_multiscale_volume");
    assert_eq!(info["data_type"], "uint16");
    assert_eq!(info["num_channels"], 1);
    let scale = &info["scales"][0];
    assert_eq!(scale["key"], "10_10_25");
    assert_eq!(scale["size"], serde_json::json!([3, 4, 5]));
    assert_eq!(scale["resolution"], serde_json::json!([10.0, 10.0, 25.0]));
    assert_eq!(scale["encoding"], "raw");
    assert_eq!(scale["chunk_sizes"], serde_json::json!([[64, 64, 64]]));

    let chunk = fs::read(dir.path().join("10_10_25").join("0-3_0-4_0-5")).unwrap();
    assert_eq!(chunk.len(), 3 * 4 * 5 * 2);
    // x fastest: voxel (1,0,0) is the second u16, (0,1,0) the fourth.
    assert_eq!(u16::from_le_bytes([chunk[2], chunk[3]]), vol.get(1, 0, 0));
    assert_eq!(u16::from_le_bytes([chunk[6], chunk[7]]), vol.get(0, 1, 0));
    let last = chunk.len() - 2;
    assert_eq!(
        u16::from_le_bytes([chunk[last], chunk[last + 1]]),
        vol.get(2, 3, 4)
    );
}

#[test]
fn oversize_volume_splits_into_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let vol = LabelVolume::new(70, 10, 10, [4.0, 4.0, 4.0]);
    write_volume(dir.path(), &vol).unwrap();
    let scale = dir.path().join(scale_key([4.0, 4.0, 4.0]));
    assert!(scale.join("0-64_0-10_0-10").is_file());
    assert!(scale.join("64-70_0-10_0-10").is_file());
    assert_eq!(fs::read(scale.join("64-70_0-10_0-10")).unwrap().len(), 6 * 10 * 10 * 2);
}

#[test]
fn patched_info_links_mesh_and_properties() {
    let dir = tempfile::tempdir().unwrap();
    write_volume(dir.path(), &small_volume()).unwrap();
    patch_info(dir.path()).unwrap();

    let info: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("info")).unwrap()).unwrap();
    assert_eq!(info["type"], "segmentation");
    assert_eq!(info["mesh"], "mesh");
    assert_eq!(info["segment_properties"], "segment_properties");
    // tensorstore-era fields survive the patch
    assert_eq!(info["data_type"], "uint16");
    assert_eq!(info["scales"][0]["key"], "10_10_25");
}

#[test]
fn segment_properties_ids_equal_values() {
    let dir = tempfile::tempdir().unwrap();
    write_segment_properties(dir.path(), &[1, 2]).unwrap();
    let text = fs::read_to_string(dir.path().join("segment_properties").join("info")).unwrap();
    assert_eq!(
        text,
        r#"{"@type":"neuroglancer_segment_properties","inline":{"ids":["1","2"],"properties":[{"id":"label","type":"label","values":["1","2"]}]}}"#
    );
}

#[test]
fn rerun_is_byte_identical() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let vol = small_volume();
    for dir in [&a, &b] {
        write_volume(dir.path(), &vol).unwrap();
        patch_info(dir.path()).unwrap();
        write_segment_properties(dir.path(), &[3, 7, 11]).unwrap();
    }
    for rel in ["info", "segment_properties/info", "10_10_25/0-3_0-4_0-5"] {
        assert_eq!(
            fs::read(a.path().join(rel)).unwrap(),
            fs::read(b.path().join(rel)).unwrap(),
            "{rel} differs between runs"
        );
    }
}
