use crate::World;
use crate::components::Visibility;
use crate::entity::ObjectId;

/// Label of the single toggle offered when no object carries a name.
pub const WHOLE_MODEL_LABEL: &str = "Model";

/// A show/hide switch covering every object of one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityToggle {
    pub label: String,
    pub members: Vec<ObjectId>,
}

/// Groups item indices by trimmed, non-empty name in first-seen order.
///
/// Unnamed items get no group of their own. When nothing is named at all, one
/// [`WHOLE_MODEL_LABEL`] group covers every item. No items, no groups.
pub fn group_by_name<'a, I>(names: I) -> Vec<(String, Vec<usize>)>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut count = 0;
    for (index, name) in names.into_iter().enumerate() {
        count += 1;
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        match groups.iter_mut().find(|(label, _)| label.as_str() == name) {
            Some((_, members)) => members.push(index),
            None => groups.push((name.to_string(), vec![index])),
        }
    }

    if groups.is_empty() && count > 0 {
        groups.push((WHOLE_MODEL_LABEL.to_string(), (0..count).collect()));
    }
    groups
}

/// [`group_by_name`] over the world's objects.
pub fn build_toggles(world: &World) -> Vec<VisibilityToggle> {
    let objects = world.objects();
    group_by_name(objects.iter().map(|o| o.name.as_deref()))
        .into_iter()
        .map(|(label, indices)| VisibilityToggle {
            label,
            members: indices.into_iter().map(|i| objects[i].id).collect(),
        })
        .collect()
}

/// Shows or hides every member. Returns how many objects were updated.
pub fn apply_toggle(world: &mut World, toggle: &VisibilityToggle, visible: bool) -> usize {
    let vis = Visibility::from_flag(visible);
    toggle
        .members
        .iter()
        .filter(|id| world.set_visibility(**id, vis))
        .count()
}

#[cfg(test)]
mod tests {
    use super::{WHOLE_MODEL_LABEL, apply_toggle, build_toggles, group_by_name};
    use crate::World;
    use crate::renderable::RenderableMesh;
    use pretty_assertions::assert_eq;

    fn mesh() -> RenderableMesh {
        RenderableMesh {
            positions: vec![0.0; 9],
            normals: vec![0.0; 9],
        }
    }

    #[test]
    fn groups_by_name_in_first_seen_order() {
        let mut world = World::new();
        let horn = world.insert(Some("Horn"), mesh());
        let body = world.insert(Some(" Body "), mesh());
        world.insert(None, mesh());
        let horn2 = world.insert(Some("Horn"), mesh());

        let toggles = build_toggles(&world);
        let labels: Vec<&str> = toggles.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Horn", "Body"]);
        assert_eq!(toggles[0].members, vec![horn, horn2]);
        assert_eq!(toggles[1].members, vec![body]);
    }

    #[test]
    fn unnamed_world_gets_model_toggle() {
        let mut world = World::new();
        world.insert(None, mesh());
        world.insert(None, mesh());

        let toggles = build_toggles(&world);
        assert_eq!(toggles.len(), 1);
        assert_eq!(toggles[0].label, WHOLE_MODEL_LABEL);
        assert_eq!(toggles[0].members.len(), 2);

        assert_eq!(apply_toggle(&mut world, &toggles[0], false), 2);
        assert_eq!(world.visible_objects().count(), 0);
        apply_toggle(&mut world, &toggles[0], true);
        assert_eq!(world.visible_objects().count(), 2);
    }

    #[test]
    fn plain_names_group_by_index() {
        let groups = group_by_name([Some("a"), None, Some(""), Some("a"), Some("b")]);
        assert_eq!(
            groups,
            vec![("a".to_string(), vec![0, 3]), ("b".to_string(), vec![4])]
        );
        assert_eq!(
            group_by_name([None, Some("  ")]),
            vec![(WHOLE_MODEL_LABEL.to_string(), vec![0, 1])]
        );
    }

    #[test]
    fn empty_world_has_no_toggles() {
        assert!(build_toggles(&World::new()).is_empty());
    }
}
