//! Legacy precomputed mesh fragment codec.
//!
//! Layout: u32 LE vertex count, then xyz f32 LE triples, then u32 LE vertex
//! indices for the remainder of the buffer, three per triangle.

use crate::{Mesh, MeshError};

pub fn encode_fragment(mesh: &Mesh) -> Vec<u8> {
    let mut out =
        Vec::with_capacity(4 + mesh.positions.len() * 12 + mesh.indices.len() * 4);
    out.extend_from_slice(&(mesh.positions.len() as u32).to_le_bytes());
    for p in &mesh.positions {
        for c in p {
            out.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in &mesh.indices {
        out.extend_from_slice(&i.to_le_bytes());
    }
    out
}

pub fn decode_fragment(bytes: &[u8]) -> Result<Mesh, MeshError> {
    let (head, rest) = bytes
        .split_at_checked(4)
        .ok_or(MeshError::TruncatedFragment("missing vertex count"))?;
    let nv = u32::from_le_bytes([head[0], head[1], head[2], head[3]]) as usize;
    let (verts, idx) = rest
        .split_at_checked(nv * 12)
        .ok_or(MeshError::TruncatedFragment("vertex buffer short"))?;
    if idx.len() % 12 != 0 {
        return Err(MeshError::TruncatedFragment(
            "index buffer is not whole triangles",
        ));
    }

    let mut mesh = Mesh::default();
    mesh.positions.reserve(nv);
    for v in verts.chunks_exact(12) {
        let c = |o: usize| f32::from_le_bytes([v[o], v[o + 1], v[o + 2], v[o + 3]]);
        mesh.positions.push([c(0), c(4), c(8)]);
    }
    mesh.indices.reserve(idx.len() / 4);
    for i in idx.chunks_exact(4) {
        mesh.indices
            .push(u32::from_le_bytes([i[0], i[1], i[2], i[3]]));
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mesh() -> Mesh {
        Mesh {
            positions: vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 10.0, 0.0]],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn fragment_round_trips() {
        let mesh = sample_mesh();
        let bytes = encode_fragment(&mesh);
        assert_eq!(bytes.len(), 4 + 3 * 12 + 3 * 4);
        assert_eq!(&bytes[..4], &3u32.to_le_bytes());
        assert_eq!(decode_fragment(&bytes).unwrap(), mesh);
    }

    #[test]
    fn truncated_fragments_are_rejected() {
        let bytes = encode_fragment(&sample_mesh());
        assert!(decode_fragment(&bytes[..2]).is_err());
        assert!(decode_fragment(&bytes[..4 + 12]).is_err());
        assert!(decode_fragment(&bytes[..bytes.len() - 4]).is_err());
    }
}
