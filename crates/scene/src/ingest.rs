use foundation::bounds::Aabb3;
use formats::geometry::{DecodedObject, Mesh};
use formats::kernel::GeometryKernel;
use formats::protocol::EvaluationResponse;
use tracing::{debug, info};

use crate::World;
use crate::entity::ObjectId;
use crate::renderable::{RenderableMesh, to_renderable};

/// Outcome of turning one evaluation response into scene objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Inserted objects, in response order.
    pub objects: Vec<ObjectId>,
    /// Meshes of `objects`, same order.
    pub meshes: Vec<RenderableMesh>,
    /// Union of all mesh bounds. Empty when nothing renderable came back.
    pub bounds: Aabb3,
    /// Items with a payload that the kernel could not turn into geometry.
    pub skipped: usize,
}

/// Replaces the world's contents with the geometry in `response`.
///
/// Items are visited group by group, branch by branch, in response order.
/// Null items are ignored, meshes are converted directly and breps go
/// through [`GeometryKernel::mesh_brep`]; anything else is counted in
/// [`IngestReport::skipped`]. Running it twice on the same response yields
/// the same meshes and bounds.
pub fn ingest(
    world: &mut World,
    response: &EvaluationResponse,
    kernel: &impl GeometryKernel,
) -> IngestReport {
    world.clear();
    let mut report = IngestReport::default();

    for (name, item) in response.named_items() {
        let Some(payload) = item.payload() else {
            continue;
        };
        match kernel.decode(&payload) {
            DecodedObject::Mesh(mesh) => add_mesh(world, &mut report, name, &mesh),
            DecodedObject::Brep(brep) => {
                let meshes = kernel.mesh_brep(&brep);
                if meshes.is_empty() {
                    debug!(param = name, faces = brep.faces.len(), "brep meshed to nothing");
                }
                for mesh in &meshes {
                    add_mesh(world, &mut report, name, mesh);
                }
            }
            DecodedObject::Unknown => {
                debug!(
                    param = name,
                    item_type = item.type_name.as_deref().unwrap_or("?"),
                    "skipping undecodable item"
                );
                report.skipped += 1;
            }
        }
    }

    info!(
        meshes = report.meshes.len(),
        skipped = report.skipped,
        "ingested evaluation results"
    );
    report
}

fn add_mesh(world: &mut World, report: &mut IngestReport, name: &str, mesh: &Mesh) {
    let renderable = to_renderable(mesh);
    report.bounds.expand(&renderable.bounds());
    report.objects.push(world.insert(Some(name), renderable.clone()));
    report.meshes.push(renderable);
}
