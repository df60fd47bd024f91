/// Handle of one object in the [`crate::World`].
///
/// Ids are never reused, not even across [`crate::World::clear`], so a handle
/// kept by the page from an earlier run simply stops resolving.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub fn index(&self) -> u32 {
        self.0
    }
}
