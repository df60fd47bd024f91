//! Building blocks of the `compute-eval` command line tool.

use compute::error::TransportError;
use compute::transport::{ReqwestTransport, Transport};
use formats::geometry::DecodedObject;
use formats::protocol::{EvaluationResponse, Param, ParamValue};
use scene::camera::Framing;
use scene::ingest::IngestReport;
use serde::Serialize;

pub fn is_url(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Parses `NAME=VALUE` or `NAME:TYPE=VALUE`.
///
/// Without a type, numbers become `System.Double` (sliders are always sent
/// as doubles), `true`/`false` become booleans and anything else is text.
/// `TYPE` is one of `double`, `int`, `bool`, `str`.
pub fn parse_param(arg: &str) -> Result<Param, String> {
    let Some((lhs, value)) = arg.split_once('=') else {
        return Err(format!("expected NAME=VALUE, got {arg:?}"));
    };
    let (name, ty) = match lhs.split_once(':') {
        Some((name, ty)) => (name.trim(), Some(ty.trim())),
        None => (lhs.trim(), None),
    };
    if name.is_empty() {
        return Err(format!("parameter name missing in {arg:?}"));
    }

    let value = match ty {
        None => infer_value(value),
        Some("double") => ParamValue::Number(
            value
                .trim()
                .parse()
                .map_err(|e| format!("{name}: {value:?} is not a number ({e})"))?,
        ),
        Some("int") => ParamValue::Integer(
            value
                .trim()
                .parse()
                .map_err(|e| format!("{name}: {value:?} is not an integer ({e})"))?,
        ),
        Some("bool") => ParamValue::Boolean(
            value
                .trim()
                .parse()
                .map_err(|e| format!("{name}: {value:?} is not a boolean ({e})"))?,
        ),
        Some("str") => ParamValue::Text(value.to_string()),
        Some(other) => return Err(format!("{name}: unknown type {other:?}")),
    };
    Ok(Param::new(name, value))
}

fn infer_value(raw: &str) -> ParamValue {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<f64>()
        && v.is_finite()
    {
        return ParamValue::Number(v);
    }
    match trimmed {
        "true" => ParamValue::Boolean(true),
        "false" => ParamValue::Boolean(false),
        _ => ParamValue::Text(raw.to_string()),
    }
}

/// Reqwest for URLs, the local filesystem for everything else.
#[derive(Debug, Clone)]
pub struct CliTransport {
    http: ReqwestTransport,
}

impl CliTransport {
    pub fn new(http: ReqwestTransport) -> Self {
        Self { http }
    }
}

impl Transport for CliTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<String, TransportError> {
        self.http.post_json(url, headers, body).await
    }

    async fn get_bytes(&self, location: &str) -> Result<Vec<u8>, TransportError> {
        if is_url(location) {
            return self.http.get_bytes(location).await;
        }
        tokio::fs::read(location)
            .await
            .map_err(|e| TransportError::network(format!("{location}: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsSummary {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraSummary {
    pub position: [f64; 3],
    pub target: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub definition_hash: String,
    pub items: usize,
    pub meshes: usize,
    pub triangles: usize,
    pub skipped: usize,
    pub warnings: usize,
    pub errors: usize,
    pub bounds: Option<BoundsSummary>,
    pub camera: Option<CameraSummary>,
}

impl EvaluationSummary {
    pub fn new(
        definition_hash: &str,
        response: &EvaluationResponse,
        report: &IngestReport,
        framing: Option<Framing>,
    ) -> Self {
        Self {
            definition_hash: definition_hash.to_string(),
            items: response.item_count(),
            meshes: report.meshes.len(),
            triangles: report.meshes.iter().map(|m| m.triangle_count()).sum(),
            skipped: report.skipped,
            warnings: response.warnings.len(),
            errors: response.errors.len(),
            bounds: (!report.bounds.is_empty()).then(|| BoundsSummary {
                min: report.bounds.min,
                max: report.bounds.max,
            }),
            camera: framing.map(|f| CameraSummary {
                position: f.position.to_array(),
                target: f.target.to_array(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadSummary {
    pub blake3: String,
    pub kind: &'static str,
    pub vertices: usize,
    pub faces: usize,
    pub brep_faces: usize,
    pub render_meshes: usize,
}

impl PayloadSummary {
    pub fn new(payload: &str, object: &DecodedObject) -> Self {
        let mut summary = Self {
            blake3: blake3::hash(payload.as_bytes()).to_hex().to_string(),
            kind: object.kind(),
            vertices: 0,
            faces: 0,
            brep_faces: 0,
            render_meshes: 0,
        };
        match object {
            DecodedObject::Mesh(mesh) => {
                summary.vertices = mesh.vertices.len();
                summary.faces = mesh.faces.len();
            }
            DecodedObject::Brep(brep) => {
                summary.brep_faces = brep.faces.len();
                for mesh in brep.faces.iter().filter_map(|f| f.render_mesh.as_ref()) {
                    summary.render_meshes += 1;
                    summary.vertices += mesh.vertices.len();
                    summary.faces += mesh.faces.len();
                }
            }
            DecodedObject::Unknown => {}
        }
        summary
    }
}
