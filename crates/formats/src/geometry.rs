/// Indexed mesh as handed out by the geometry kernel.
///
/// Every face carries four vertex indices; `c == d` marks a triangle,
/// anything else is a quad `(a, b, c, d)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 4]>,
}

impl Mesh {
    pub fn new(vertices: Vec<[f32; 3]>, faces: Vec<[u32; 4]>) -> Self {
        Self { vertices, faces }
    }

    pub fn triangle_face(a: u32, b: u32, c: u32) -> [u32; 4] {
        [a, b, c, c]
    }

    pub fn is_triangle(face: &[u32; 4]) -> bool {
        face[2] == face[3]
    }

    /// Triangles this mesh turns into once quads are split.
    pub fn triangle_count(&self) -> usize {
        self.faces
            .iter()
            .map(|f| if Self::is_triangle(f) { 1 } else { 2 })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }
}

/// One trimmed surface of a boundary representation. The kernel may or may
/// not have a cached render mesh for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrepFace {
    pub render_mesh: Option<Mesh>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Brep {
    pub faces: Vec<BrepFace>,
}

/// Result of decoding one evaluation output item.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedObject {
    Mesh(Mesh),
    Brep(Brep),
    /// Anything the kernel does not recognise; callers skip it.
    Unknown,
}

impl DecodedObject {
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedObject::Mesh(_) => "mesh",
            DecodedObject::Brep(_) => "brep",
            DecodedObject::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Mesh;

    #[test]
    fn triangle_count_splits_quads() {
        let mesh = Mesh::new(
            vec![[0.0; 3]; 4],
            vec![Mesh::triangle_face(0, 1, 2), [0, 1, 2, 3]],
        );
        assert_eq!(mesh.triangle_count(), 3);
    }

    #[test]
    fn mesh_without_faces_is_empty() {
        let mesh = Mesh::new(vec![[1.0, 2.0, 3.0]], Vec::new());
        assert!(mesh.is_empty());
    }
}
