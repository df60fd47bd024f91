//! Viewpoint selection for a bounding volume.
//!
//! Two policies exist. [`FramingPolicy::Diagonal`] frames evaluation results
//! by the box diagonal plus a fixed margin. [`FramingPolicy::MaxDimension`]
//! frames the static scene asset by its largest extent, slightly tighter.

use foundation::bounds::Aabb3;
use foundation::math::Vec3;

/// World units added to the fitted distance when framing results.
pub const FRAME_MARGIN: f64 = 1.0;

/// Unnormalized view direction, from target towards the camera.
pub const FRAME_DIRECTION: Vec3 = Vec3::new(1.0, 1.0, 1.0);

/// Uniform scale the static scene asset is displayed at.
pub const STATIC_ASSET_SCALE: f64 = 0.001;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Framing {
    pub position: Vec3,
    pub target: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FramingPolicy {
    /// `distance = diagonal / (2·tan(fov/2)) + margin`.
    Diagonal { margin: f64, direction: Vec3 },
    /// `distance = (max_dim·fit_mult) / (2·tan(fov/2)) · dist_mult`, with a
    /// flat box counting as size 1.
    MaxDimension {
        fit_mult: f64,
        dist_mult: f64,
        direction: Vec3,
    },
}

impl FramingPolicy {
    pub fn evaluation_results() -> Self {
        FramingPolicy::Diagonal {
            margin: FRAME_MARGIN,
            direction: FRAME_DIRECTION,
        }
    }

    pub fn static_asset() -> Self {
        FramingPolicy::MaxDimension {
            fit_mult: 0.95,
            dist_mult: 0.9,
            direction: Vec3::new(1.0, 0.7, 1.0),
        }
    }

    /// `None` for an empty box or a field of view outside `(0°, 180°)`.
    pub fn frame(&self, bounds: &Aabb3, fov_deg: f64) -> Option<Framing> {
        if bounds.is_empty() || !(fov_deg > 0.0 && fov_deg < 180.0) {
            return None;
        }
        let target = bounds.center();
        let half_tan = (fov_deg.to_radians() * 0.5).tan();

        let (direction, distance) = match *self {
            FramingPolicy::Diagonal { margin, direction } => {
                (direction, bounds.diagonal() / (2.0 * half_tan) + margin)
            }
            FramingPolicy::MaxDimension {
                fit_mult,
                dist_mult,
                direction,
            } => {
                let max_dim = bounds.max_dimension();
                let max_dim = if max_dim > 0.0 { max_dim } else { 1.0 };
                (direction, max_dim * fit_mult / (2.0 * half_tan) * dist_mult)
            }
        };

        let dir = direction.try_normalize()?;
        Some(Framing {
            position: target + dir * distance,
            target,
        })
    }
}

impl Default for FramingPolicy {
    fn default() -> Self {
        Self::evaluation_results()
    }
}

/// Frames evaluation results: diagonal fit plus [`FRAME_MARGIN`], looking
/// down [`FRAME_DIRECTION`].
pub fn frame(bounds: &Aabb3, fov_deg: f64) -> Option<Framing> {
    FramingPolicy::evaluation_results().frame(bounds, fov_deg)
}

/// Perspective camera state mirrored to the renderer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    pub fn evaluation_viewer() -> Self {
        Self {
            position: Vec3::new(6.0, 6.0, 6.0),
            target: Vec3::ZERO,
            fov_deg: 45.0,
            near: 0.01,
            far: 1000.0,
        }
    }

    pub fn static_asset_viewer() -> Self {
        Self {
            position: Vec3::new(7.0, 7.0, 7.0),
            target: Vec3::ZERO,
            fov_deg: 60.0,
            near: 0.1,
            far: 2000.0,
        }
    }

    pub fn apply(&mut self, framing: Framing) {
        self.position = framing.position;
        self.target = framing.target;
    }

    /// Frames `bounds` under `policy`. Leaves the camera untouched and
    /// returns `false` when there is nothing to frame.
    pub fn frame_bounds(&mut self, bounds: &Aabb3, policy: FramingPolicy) -> bool {
        match policy.frame(bounds, self.fov_deg) {
            Some(f) => {
                self.apply(f);
                true
            }
            None => false,
        }
    }

    pub fn distance(&self) -> f64 {
        (self.position - self.target).length()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::evaluation_viewer()
    }
}

#[cfg(test)]
mod tests {
    use super::{Camera, FRAME_MARGIN, FramingPolicy, STATIC_ASSET_SCALE, frame};
    use foundation::bounds::Aabb3;
    use foundation::math::Vec3;
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_bounds_leave_camera_alone() {
        assert_eq!(frame(&Aabb3::empty(), 45.0), None);

        let mut cam = Camera::default();
        let before = cam;
        assert!(!cam.frame_bounds(&Aabb3::empty(), FramingPolicy::default()));
        assert_eq!(cam, before);
    }

    #[test]
    fn diagonal_framing_matches_closed_form() {
        let bounds = Aabb3::new([0.0, 0.0, 0.0], [10.0, 0.0, 10.0]);
        let f = frame(&bounds, 45.0).expect("framing");
        assert_eq!(f.target, Vec3::new(5.0, 0.0, 5.0));

        let diagonal = 200.0_f64.sqrt();
        let expected = diagonal / (2.0 * (22.5_f64).to_radians().tan()) + FRAME_MARGIN;
        assert!(close((f.position - f.target).length(), expected));
        assert!(close(expected, 18.071067811865476));

        let step = expected / 3.0_f64.sqrt();
        assert!(close(f.position.x, 5.0 + step));
        assert!(close(f.position.y, step));
        assert!(close(f.position.z, 5.0 + step));
    }

    #[test]
    fn single_point_is_framed_at_margin() {
        let bounds = Aabb3::new([1.0, 2.0, 3.0], [1.0, 2.0, 3.0]);
        let f = frame(&bounds, 45.0).expect("framing");
        assert!(close((f.position - f.target).length(), FRAME_MARGIN));
    }

    #[test]
    fn invalid_fov_is_rejected() {
        let bounds = Aabb3::new([0.0; 3], [1.0; 3]);
        assert_eq!(frame(&bounds, 0.0), None);
        assert_eq!(frame(&bounds, 180.0), None);
        assert_eq!(frame(&bounds, f64::NAN), None);
    }

    #[test]
    fn static_asset_uses_max_dimension() {
        let bounds =
            Aabb3::new([0.0, 0.0, 0.0], [4000.0, 2000.0, 1000.0]).scaled(STATIC_ASSET_SCALE);
        let mut cam = Camera::static_asset_viewer();
        assert!(cam.frame_bounds(&bounds, FramingPolicy::static_asset()));

        let expected = 4.0 * 0.95 / (2.0 * 30.0_f64.to_radians().tan()) * 0.9;
        assert!(close(cam.distance(), expected));
        assert!(close(cam.target.x, 2.0));
        assert!(close(cam.target.y, 1.0));
        assert!(close(cam.target.z, 0.5));
        assert!(cam.position.y - cam.target.y < cam.position.x - cam.target.x);
    }

    #[test]
    fn flat_box_counts_as_unit_size() {
        let bounds = Aabb3::new([2.0; 3], [2.0; 3]);
        let f = FramingPolicy::static_asset()
            .frame(&bounds, 60.0)
            .expect("framing");
        let expected = 0.95 / (2.0 * 30.0_f64.to_radians().tan()) * 0.9;
        assert!(close((f.position - f.target).length(), expected));
    }
}
