//! Adapter around the geometry kernel.
//!
//! All knowledge of how an evaluation output item is turned into geometry
//! lives behind [`GeometryKernel`]; the ingestion pipeline only ever sees the
//! tagged [`DecodedObject`].

use base64::Engine as _;
use serde_json::Value;
use tracing::debug;

use crate::geometry::{Brep, DecodedObject, Mesh};
use crate::geometry_codec::{GeometryCodecError, decode_object, encode_object};

pub trait GeometryKernel {
    /// Decodes one item payload. Never fails: anything unreadable is `Unknown`.
    fn decode(&self, data: &str) -> DecodedObject;

    /// Meshes a boundary representation. An empty result is valid.
    fn mesh_brep(&self, brep: &Brep) -> Vec<Mesh>;
}

/// Kernel for the `GMOB` object encoding, wrapped either in the Compute item
/// envelope (`{"version":..,"archive3dm":..,"data":"<base64>"}`) or as bare
/// base64 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeKernel;

impl NativeKernel {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryKernel for NativeKernel {
    fn decode(&self, data: &str) -> DecodedObject {
        let Some(bytes) = unwrap_envelope(data) else {
            debug!(len = data.len(), "item payload is not a geometry envelope");
            return DecodedObject::Unknown;
        };
        match decode_object(&bytes) {
            Ok(obj) => obj,
            Err(err) => {
                debug!(error = %err, "item payload did not decode");
                DecodedObject::Unknown
            }
        }
    }

    /// Returns the cached render mesh of every face that has one. Faces
    /// without a render mesh contribute nothing.
    fn mesh_brep(&self, brep: &Brep) -> Vec<Mesh> {
        brep.faces
            .iter()
            .filter_map(|face| face.render_mesh.clone())
            .filter(|mesh| !mesh.is_empty())
            .collect()
    }
}

/// Builds the envelope text [`NativeKernel::decode`] accepts.
pub fn encode_item_data(object: &DecodedObject) -> Result<String, GeometryCodecError> {
    let bytes = encode_object(object)?;
    let envelope = serde_json::json!({
        "version": 10000,
        "archive3dm": 70,
        "data": base64::engine::general_purpose::STANDARD.encode(bytes),
    });
    Ok(envelope.to_string())
}

fn unwrap_envelope(data: &str) -> Option<Vec<u8>> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(obj)) => obj
            .get("data")
            .and_then(|v| v.as_str())
            .and_then(decode_base64),
        // Compute sometimes double-encodes the envelope as a JSON string.
        Ok(Value::String(inner)) if inner.trim_start().starts_with('{') => unwrap_envelope(&inner),
        Ok(Value::String(inner)) => decode_base64(&inner),
        Ok(_) => None,
        Err(_) => decode_base64(trimmed),
    }
}

fn decode_base64(text: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::{GeometryKernel, NativeKernel, encode_item_data};
    use crate::geometry::{Brep, BrepFace, DecodedObject, Mesh};
    use crate::geometry_codec::encode_object;
    use base64::Engine as _;

    fn tri() -> Mesh {
        Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![Mesh::triangle_face(0, 1, 2)],
        )
    }

    #[test]
    fn decodes_envelope() {
        let data = encode_item_data(&DecodedObject::Mesh(tri())).expect("encode");
        assert_eq!(NativeKernel.decode(&data), DecodedObject::Mesh(tri()));
    }

    #[test]
    fn decodes_double_encoded_envelope() {
        let data = encode_item_data(&DecodedObject::Mesh(tri())).expect("encode");
        let wrapped = serde_json::to_string(&data).expect("json");
        assert_eq!(NativeKernel.decode(&wrapped), DecodedObject::Mesh(tri()));
    }

    #[test]
    fn decodes_bare_base64() {
        let bytes = encode_object(&DecodedObject::Mesh(tri())).expect("encode");
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        assert_eq!(NativeKernel.decode(&b64), DecodedObject::Mesh(tri()));
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(NativeKernel.decode(""), DecodedObject::Unknown);
        assert_eq!(NativeKernel.decode("42"), DecodedObject::Unknown);
        assert_eq!(NativeKernel.decode("not base64 !!"), DecodedObject::Unknown);
        assert_eq!(
            NativeKernel.decode(r#"{"version":10000,"data":"AAAA"}"#),
            DecodedObject::Unknown
        );
    }

    #[test]
    fn brep_meshing_skips_faces_without_render_mesh() {
        let brep = Brep {
            faces: vec![
                BrepFace {
                    render_mesh: Some(tri()),
                },
                BrepFace { render_mesh: None },
                BrepFace {
                    render_mesh: Some(tri()),
                },
            ],
        };
        assert_eq!(NativeKernel.mesh_brep(&brep).len(), 2);
        assert!(NativeKernel.mesh_brep(&Brep::default()).is_empty());
    }
}
