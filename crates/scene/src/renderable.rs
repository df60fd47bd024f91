use std::collections::HashMap;

use foundation::bounds::Aabb3;
use foundation::math::Vec3;
use formats::geometry::Mesh;

const FALLBACK_NORMAL: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Flat, non-indexed triangle soup ready for upload.
///
/// `positions` and `normals` are parallel `xyz` triples; every three
/// consecutive vertices form one triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderableMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
}

impl RenderableMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> Aabb3 {
        let mut b = Aabb3::empty();
        for p in self.positions.chunks_exact(3) {
            b.expand_point([p[0] as f64, p[1] as f64, p[2] as f64]);
        }
        b
    }
}

/// Expands an indexed mesh into a [`RenderableMesh`].
///
/// A triangle face `(a, b, c, c)` yields one triangle; a quad `(a, b, c, d)`
/// yields `(a, b, c)` and `(a, c, d)`. Faces that reference a missing vertex
/// are dropped whole.
pub fn to_renderable(mesh: &Mesh) -> RenderableMesh {
    let mut positions = Vec::with_capacity(mesh.triangle_count() * 9);
    for face in &mesh.faces {
        if face.iter().any(|&i| i as usize >= mesh.vertices.len()) {
            continue;
        }
        let [a, b, c, d] = *face;
        push_triangle(&mut positions, &mesh.vertices, a, b, c);
        if !Mesh::is_triangle(face) {
            push_triangle(&mut positions, &mesh.vertices, a, c, d);
        }
    }
    let normals = smooth_normals(&positions);
    RenderableMesh { positions, normals }
}

fn push_triangle(out: &mut Vec<f32>, vertices: &[[f32; 3]], a: u32, b: u32, c: u32) {
    let (Some(va), Some(vb), Some(vc)) = (
        vertices.get(a as usize),
        vertices.get(b as usize),
        vertices.get(c as usize),
    ) else {
        return;
    };
    out.extend_from_slice(va);
    out.extend_from_slice(vb);
    out.extend_from_slice(vc);
}

/// Per-vertex normals for a triangle soup.
///
/// Face normals are area weighted and summed over every vertex sharing the
/// same position, then normalized. Degenerate neighbourhoods fall back to the
/// triangle's own normal, and then to +Z.
fn smooth_normals(positions: &[f32]) -> Vec<f32> {
    let triangles: Vec<[Vec3; 3]> = positions
        .chunks_exact(9)
        .map(|t| {
            [
                Vec3::new(t[0] as f64, t[1] as f64, t[2] as f64),
                Vec3::new(t[3] as f64, t[4] as f64, t[5] as f64),
                Vec3::new(t[6] as f64, t[7] as f64, t[8] as f64),
            ]
        })
        .collect();

    // Cross product length is twice the area, which is the weight we want.
    let face_normals: Vec<Vec3> = triangles
        .iter()
        .map(|[p0, p1, p2]| (*p1 - *p0).cross(*p2 - *p0))
        .collect();

    let mut accum: HashMap<[u32; 3], Vec3> = HashMap::new();
    for (tri, n) in triangles.iter().zip(&face_normals) {
        for p in tri {
            *accum.entry(position_key(*p)).or_insert(Vec3::ZERO) += *n;
        }
    }

    let mut normals = Vec::with_capacity(positions.len());
    for (tri, n) in triangles.iter().zip(&face_normals) {
        let face = n.try_normalize().unwrap_or(FALLBACK_NORMAL);
        for p in tri {
            let smooth = accum
                .get(&position_key(*p))
                .and_then(|v| v.try_normalize())
                .unwrap_or(face);
            normals.extend_from_slice(&[smooth.x as f32, smooth.y as f32, smooth.z as f32]);
        }
    }
    normals
}

fn position_key(p: Vec3) -> [u32; 3] {
    // +0.0 and -0.0 must land in the same bucket.
    let bits = |v: f64| (v as f32 + 0.0).to_bits();
    [bits(p.x), bits(p.y), bits(p.z)]
}
