use crate::math::Vec3;

/// Axis-aligned bounding boxes.
///
/// Both types start out *empty* (`min > max` on every axis) and grow as points
/// are folded in, so an accumulation pass never needs a special first case.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY; 2],
            max: [f64::NEG_INFINITY; 2],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn expand_point(&mut self, p: [f64; 2]) {
        for i in 0..2 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// `[[min_x, min_y], [max_x, max_y]]`, the shape map engines take for `fitBounds`.
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [self.min, self.max]
    }
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb3 {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Aabb3 { min, max }
    }

    pub fn empty() -> Self {
        Aabb3 {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn expand_point(&mut self, p: [f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn expand(&mut self, other: &Aabb3) {
        if other.is_empty() {
            return;
        }
        self.expand_point(other.min);
        self.expand_point(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (Vec3::from_array(self.min) + Vec3::from_array(self.max)) * 0.5
    }

    /// Per-axis extent. Zero for an empty box.
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        Vec3::from_array(self.max) - Vec3::from_array(self.min)
    }

    pub fn diagonal(&self) -> f64 {
        self.size().length()
    }

    pub fn max_dimension(&self) -> f64 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    /// Uniformly scales the box about the origin, as a scaled scene root would.
    pub fn scaled(&self, factor: f64) -> Aabb3 {
        if self.is_empty() {
            return *self;
        }
        let a = Vec3::from_array(self.min) * factor;
        let b = Vec3::from_array(self.max) * factor;
        Aabb3::new(a.min(b).to_array(), a.max(b).to_array())
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}
