use foundation::bounds::Aabb3;

use crate::components::Visibility;
use crate::entity::ObjectId;
use crate::renderable::RenderableMesh;

/// One renderable in the scene, tagged with the output it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    /// Output parameter name, if the evaluator reported one.
    pub name: Option<String>,
    pub mesh: RenderableMesh,
    pub visibility: Visibility,
    pub bounds: Aabb3,
}

/// Result geometry of the latest evaluation.
#[derive(Debug, Default)]
pub struct World {
    next_index: u32,
    objects: Vec<SceneObject>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every object. Ids keep counting up.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn insert(&mut self, name: Option<&str>, mesh: RenderableMesh) -> ObjectId {
        let id = ObjectId(self.next_index);
        self.next_index += 1;
        let name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
        let bounds = mesh.bounds();
        self.objects.push(SceneObject {
            id,
            name,
            mesh,
            visibility: Visibility::visible(),
            bounds,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Returns `false` when `id` is not (or no longer) in the world.
    pub fn set_visibility(&mut self, id: ObjectId, visibility: Visibility) -> bool {
        match self.objects.iter_mut().find(|o| o.id == id) {
            Some(obj) => {
                obj.visibility = visibility;
                true
            }
            None => false,
        }
    }

    pub fn visible_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.visibility.visible)
    }

    /// Union of every object's bounds, hidden ones included.
    pub fn bounds(&self) -> Aabb3 {
        let mut b = Aabb3::empty();
        for obj in &self.objects {
            b.expand(&obj.bounds);
        }
        b
    }

    pub fn visible_bounds(&self) -> Aabb3 {
        let mut b = Aabb3::empty();
        for obj in self.visible_objects() {
            b.expand(&obj.bounds);
        }
        b
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::Visibility;
    use crate::renderable::RenderableMesh;
    use pretty_assertions::assert_eq;

    fn tri(z: f32) -> RenderableMesh {
        RenderableMesh {
            positions: vec![0.0, 0.0, z, 1.0, 0.0, z, 0.0, 1.0, z],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut world = World::new();
        let a = world.insert(Some("out"), tri(0.0));
        world.clear();
        assert!(world.is_empty());
        assert!(world.get(a).is_none());
        let b = world.insert(None, tri(0.0));
        assert!(b.index() > a.index());
    }

    #[test]
    fn blank_names_are_dropped() {
        let mut world = World::new();
        let id = world.insert(Some("  "), tri(0.0));
        assert_eq!(world.get(id).and_then(|o| o.name.clone()), None);
    }

    #[test]
    fn hidden_objects_leave_visible_bounds() {
        let mut world = World::new();
        let low = world.insert(None, tri(0.0));
        world.insert(None, tri(5.0));
        assert_eq!(world.bounds().max[2], 5.0);

        assert!(world.set_visibility(low, Visibility::hidden()));
        assert_eq!(world.visible_objects().count(), 1);
        assert_eq!(world.visible_bounds().min[2], 5.0);
        assert_eq!(world.bounds().min[2], 0.0);
    }

    #[test]
    fn unknown_id_is_reported() {
        let mut world = World::new();
        let id = world.insert(None, tri(0.0));
        world.clear();
        assert!(!world.set_visibility(id, Visibility::hidden()));
    }
}
