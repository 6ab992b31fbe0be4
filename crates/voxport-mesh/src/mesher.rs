//! Boundary-surface extraction over the label lattice.
//!
//! One closed surface per object id: every 6-neighbor label change (the
//! volume border counts as background) contributes a face. Coplanar faces are
//! greedy-merged into maximal rectangles, vertices are welded on lattice
//! corners, and positions are scaled by the per-axis voxel spacing.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use voxport_volume::LabelVolume;

use crate::Mesh;

#[derive(Clone, Copy, Debug)]
pub struct MeshSettings {
    /// Merge coplanar boundary faces into maximal rectangles.
    pub merge_faces: bool,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self { merge_faces: true }
    }
}

/// Axis the swept plane is perpendicular to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Axis {
    X,
    Y,
    Z,
}

/// Meshes every distinct non-zero label in the volume.
///
/// The result iterates in ascending id order, so artifact generation from it
/// is reproducible run to run.
pub fn mesh_labels(vol: &LabelVolume, settings: &MeshSettings) -> BTreeMap<u64, Mesh> {
    let mut meshes = BTreeMap::new();
    for id in vol.object_ids() {
        let mesh = mesh_object(vol, id as u16, settings);
        log::debug!(
            target: "mesh",
            "object {}: {} vertices, {} triangles",
            id,
            mesh.positions.len(),
            mesh.triangle_count()
        );
        meshes.insert(id, mesh);
    }
    log::info!(target: "mesh", "meshed {} objects", meshes.len());
    meshes
}

fn mesh_object(vol: &LabelVolume, label: u16, settings: &MeshSettings) -> Mesh {
    let mut builder = SurfaceBuilder::new(vol.voxel_size);
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        sweep_axis(vol, label, axis, settings.merge_faces, &mut builder);
    }
    builder.mesh
}

#[inline]
fn sample(vol: &LabelVolume, axis: Axis, s: i64, u: usize, v: usize) -> u16 {
    let (x, y, z) = match axis {
        Axis::X => (s, u as i64, v as i64),
        Axis::Y => (u as i64, s, v as i64),
        Axis::Z => (u as i64, v as i64, s),
    };
    vol.get_clamped(x, y, z)
}

fn sweep_axis(vol: &LabelVolume, label: u16, axis: Axis, merge: bool, out: &mut SurfaceBuilder) {
    let (slices, w, h) = match axis {
        Axis::X => (vol.sx, vol.sy, vol.sz),
        Axis::Y => (vol.sy, vol.sx, vol.sz),
        Axis::Z => (vol.sz, vol.sx, vol.sy),
    };
    let mut neg = vec![false; w * h];
    let mut pos = vec![false; w * h];
    for s in 0..slices {
        for v in 0..h {
            for u in 0..w {
                let i = v * w + u;
                if sample(vol, axis, s as i64, u, v) != label {
                    neg[i] = false;
                    pos[i] = false;
                    continue;
                }
                neg[i] = sample(vol, axis, s as i64 - 1, u, v) != label;
                pos[i] = sample(vol, axis, s as i64 + 1, u, v) != label;
            }
        }
        emit_rects(&mut neg, w, h, merge, |u0, v0, du, dv| {
            out.quad(axis, false, s, u0, v0, du, dv);
        });
        emit_rects(&mut pos, w, h, merge, |u0, v0, du, dv| {
            out.quad(axis, true, s + 1, u0, v0, du, dv);
        });
    }
}

/// Consumes a boundary mask, emitting maximal rectangles (or unit cells when
/// merging is off). Scan order is row-major, so output order is deterministic.
fn emit_rects(
    mask: &mut [bool],
    w: usize,
    h: usize,
    merge: bool,
    mut emit: impl FnMut(usize, usize, usize, usize),
) {
    for v in 0..h {
        for u in 0..w {
            if !mask[v * w + u] {
                continue;
            }
            let mut du = 1;
            let mut dv = 1;
            if merge {
                while u + du < w && mask[v * w + u + du] {
                    du += 1;
                }
                'grow: while v + dv < h {
                    for k in 0..du {
                        if !mask[(v + dv) * w + u + k] {
                            break 'grow;
                        }
                    }
                    dv += 1;
                }
            }
            for vv in v..v + dv {
                for uu in u..u + du {
                    mask[vv * w + uu] = false;
                }
            }
            emit(u, v, du, dv);
        }
    }
}

struct SurfaceBuilder {
    scale: [f32; 3],
    corners: HashMap<[u32; 3], u32>,
    mesh: Mesh,
}

impl SurfaceBuilder {
    fn new(voxel_size: [f64; 3]) -> Self {
        Self {
            scale: voxel_size.map(|s| s as f32),
            corners: HashMap::new(),
            mesh: Mesh::default(),
        }
    }

    fn vertex(&mut self, corner: [u32; 3]) -> u32 {
        if let Some(&i) = self.corners.get(&corner) {
            return i;
        }
        let i = self.mesh.positions.len() as u32;
        self.mesh.positions.push([
            corner[0] as f32 * self.scale[0],
            corner[1] as f32 * self.scale[1],
            corner[2] as f32 * self.scale[2],
        ]);
        self.corners.insert(corner, i);
        i
    }

    /// Emits one boundary rectangle as two triangles wound counter-clockwise
    /// seen from the outward side.
    fn quad(
        &mut self,
        axis: Axis,
        positive: bool,
        plane: usize,
        u0: usize,
        v0: usize,
        du: usize,
        dv: usize,
    ) {
        let corner = |u: usize, v: usize| -> [u32; 3] {
            match axis {
                Axis::X => [plane as u32, u as u32, v as u32],
                Axis::Y => [u as u32, plane as u32, v as u32],
                Axis::Z => [u as u32, v as u32, plane as u32],
            }
        };
        let mut c = [
            corner(u0, v0),
            corner(u0 + du, v0),
            corner(u0 + du, v0 + dv),
            corner(u0, v0 + dv),
        ];
        // The (u, v) basis is right-handed around +X and +Z but left-handed
        // around +Y, hence the asymmetric flip condition.
        let flip = match axis {
            Axis::X | Axis::Z => !positive,
            Axis::Y => positive,
        };
        if flip {
            c.swap(1, 3);
        }
        let idx = c.map(|corner| self.vertex(corner));
        self.mesh
            .indices
            .extend_from_slice(&[idx[0], idx[1], idx[2], idx[0], idx[2], idx[3]]);
    }
}
