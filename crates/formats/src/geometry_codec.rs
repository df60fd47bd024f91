use crate::geometry::{Brep, BrepFace, DecodedObject, Mesh};

const MAGIC: [u8; 4] = *b"GMOB";
const VERSION_V1: u16 = 1;
const VERSION_LATEST: u16 = VERSION_V1;

// Upper bound on pre-allocation driven by untrusted counts.
const MAX_PREALLOC: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryCodecError {
    UnexpectedEof,
    InvalidMagic,
    UnsupportedVersion { found: u16 },
    InvalidVarint,
    UnknownKind { tag: u8 },
    InvalidFace { face: usize, reason: String },
    TrailingBytes { count: usize },
    NotEncodable,
}

impl std::fmt::Display for GeometryCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryCodecError::UnexpectedEof => write!(f, "unexpected EOF"),
            GeometryCodecError::InvalidMagic => write!(f, "invalid GMOB magic"),
            GeometryCodecError::UnsupportedVersion { found } => {
                write!(f, "unsupported GMOB version: {found}")
            }
            GeometryCodecError::InvalidVarint => write!(f, "invalid varint"),
            GeometryCodecError::UnknownKind { tag } => write!(f, "unknown object kind: {tag}"),
            GeometryCodecError::InvalidFace { face, reason } => {
                write!(f, "invalid face {face}: {reason}")
            }
            GeometryCodecError::TrailingBytes { count } => {
                write!(f, "{count} trailing bytes after object")
            }
            GeometryCodecError::NotEncodable => write!(f, "unknown objects cannot be encoded"),
        }
    }
}

impl std::error::Error for GeometryCodecError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
enum ObjectTag {
    Mesh = 1,
    Brep = 2,
}

pub fn encode_object(object: &DecodedObject) -> Result<Vec<u8>, GeometryCodecError> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION_LATEST.to_le_bytes());

    match object {
        DecodedObject::Mesh(mesh) => {
            out.push(ObjectTag::Mesh as u8);
            write_mesh(&mut out, mesh);
        }
        DecodedObject::Brep(brep) => {
            out.push(ObjectTag::Brep as u8);
            write_var_u64(&mut out, brep.faces.len() as u64);
            for face in &brep.faces {
                match &face.render_mesh {
                    Some(mesh) => {
                        out.push(1);
                        write_mesh(&mut out, mesh);
                    }
                    None => out.push(0),
                }
            }
        }
        DecodedObject::Unknown => return Err(GeometryCodecError::NotEncodable),
    }

    Ok(out)
}

pub fn decode_object(bytes: &[u8]) -> Result<DecodedObject, GeometryCodecError> {
    let mut r = Reader::new(bytes);

    if r.read_array::<4>()? != MAGIC {
        return Err(GeometryCodecError::InvalidMagic);
    }
    let version = u16::from_le_bytes(r.read_array::<2>()?);
    if version != VERSION_V1 {
        return Err(GeometryCodecError::UnsupportedVersion { found: version });
    }

    let tag = r.read_u8()?;
    let object = match tag {
        t if t == ObjectTag::Mesh as u8 => DecodedObject::Mesh(read_mesh(&mut r)?),
        t if t == ObjectTag::Brep as u8 => {
            let face_count = r.read_len()?;
            let mut faces = Vec::with_capacity(face_count.min(MAX_PREALLOC));
            for _ in 0..face_count {
                let render_mesh = match r.read_u8()? {
                    0 => None,
                    _ => Some(read_mesh(&mut r)?),
                };
                faces.push(BrepFace { render_mesh });
            }
            DecodedObject::Brep(Brep { faces })
        }
        other => return Err(GeometryCodecError::UnknownKind { tag: other }),
    };

    let rest = r.remaining();
    if rest != 0 {
        return Err(GeometryCodecError::TrailingBytes { count: rest });
    }
    Ok(object)
}

fn write_mesh(out: &mut Vec<u8>, mesh: &Mesh) {
    write_var_u64(out, mesh.vertices.len() as u64);
    for v in &mesh.vertices {
        for c in v {
            out.extend_from_slice(&c.to_le_bytes());
        }
    }
    write_var_u64(out, mesh.faces.len() as u64);
    for face in &mesh.faces {
        for idx in face {
            write_var_u64(out, *idx as u64);
        }
    }
}

fn read_mesh(r: &mut Reader<'_>) -> Result<Mesh, GeometryCodecError> {
    let vertex_count = r.read_len()?;
    let mut vertices = Vec::with_capacity(vertex_count.min(MAX_PREALLOC));
    for _ in 0..vertex_count {
        let x = f32::from_le_bytes(r.read_array::<4>()?);
        let y = f32::from_le_bytes(r.read_array::<4>()?);
        let z = f32::from_le_bytes(r.read_array::<4>()?);
        vertices.push([x, y, z]);
    }

    let face_count = r.read_len()?;
    let mut faces = Vec::with_capacity(face_count.min(MAX_PREALLOC));
    for face_index in 0..face_count {
        let mut face = [0u32; 4];
        for slot in face.iter_mut() {
            let idx = r.read_var_u64()?;
            if idx >= vertex_count as u64 {
                return Err(GeometryCodecError::InvalidFace {
                    face: face_index,
                    reason: format!("vertex index {idx} out of range ({vertex_count} vertices)"),
                });
            }
            *slot = idx as u32;
        }
        faces.push(face);
    }

    Ok(Mesh { vertices, faces })
}

fn write_var_u64(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push(((v as u8) & 0x7F) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8, GeometryCodecError> {
        if self.pos >= self.bytes.len() {
            return Err(GeometryCodecError::UnexpectedEof);
        }
        let b = self.bytes[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], GeometryCodecError> {
        if self.remaining() < N {
            return Err(GeometryCodecError::UnexpectedEof);
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    fn read_var_u64(&mut self) -> Result<u64, GeometryCodecError> {
        let mut out: u64 = 0;
        let mut shift = 0;
        for _ in 0..10 {
            let b = self.read_u8()?;
            out |= ((b & 0x7F) as u64) << shift;
            if (b & 0x80) == 0 {
                return Ok(out);
            }
            shift += 7;
        }
        Err(GeometryCodecError::InvalidVarint)
    }

    fn read_len(&mut self) -> Result<usize, GeometryCodecError> {
        let n = self.read_var_u64()?;
        usize::try_from(n).map_err(|_| GeometryCodecError::UnexpectedEof)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeometryCodecError, decode_object, encode_object};
    use crate::geometry::{Brep, BrepFace, DecodedObject, Mesh};
    use pretty_assertions::assert_eq;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![[0, 1, 2, 3]],
        )
    }

    #[test]
    fn brep_with_missing_face_mesh_survives_encoding() {
        let brep = DecodedObject::Brep(Brep {
            faces: vec![
                BrepFace {
                    render_mesh: Some(quad()),
                },
                BrepFace { render_mesh: None },
            ],
        });
        let bytes = encode_object(&brep).expect("encode");
        assert_eq!(decode_object(&bytes).expect("decode"), brep);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = encode_object(&DecodedObject::Mesh(quad())).expect("encode");
        bytes[0] = b'X';
        assert_eq!(decode_object(&bytes), Err(GeometryCodecError::InvalidMagic));
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = encode_object(&DecodedObject::Mesh(quad())).expect("encode");
        let cut = &bytes[..bytes.len() - 2];
        assert_eq!(decode_object(cut), Err(GeometryCodecError::UnexpectedEof));
    }

    #[test]
    fn rejects_out_of_range_face_index() {
        let mut mesh = quad();
        mesh.faces[0][3] = 9;
        let bytes = encode_object(&DecodedObject::Mesh(mesh)).expect("encode");
        assert!(matches!(
            decode_object(&bytes),
            Err(GeometryCodecError::InvalidFace { face: 0, .. })
        ));
    }

    #[test]
    fn rejects_unknown_kind() {
        let mut bytes = encode_object(&DecodedObject::Mesh(quad())).expect("encode");
        bytes[6] = 42;
        assert!(matches!(
            decode_object(&bytes),
            Err(GeometryCodecError::UnknownKind { tag: 42 })
        ));
    }

    #[test]
    fn unknown_is_not_encodable() {
        assert_eq!(
            encode_object(&DecodedObject::Unknown),
            Err(GeometryCodecError::NotEncodable)
        );
    }
}
