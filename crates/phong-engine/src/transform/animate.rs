use glam::{Mat4, Vec3};

/// How far the object turns about its local Y axis per update.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RotationRate {
    /// Fixed step per frame; speed follows the frame rate.
    PerFrame(f32),
    /// Step scaled by elapsed time; speed is frame-rate independent.
    PerSecond(f32),
}

impl RotationRate {
    fn step(self, dt_seconds: f32) -> f32 {
        match self {
            RotationRate::PerFrame(deg) => deg,
            RotationRate::PerSecond(deg) => deg * dt_seconds,
        }
    }
}

impl Default for RotationRate {
    fn default() -> Self {
        RotationRate::PerFrame(0.7)
    }
}

/// Per-frame model matrix of the single scene object.
///
/// The accumulated angle is explicit state; nothing is kept process-wide.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTransform {
    position: Vec3,
    angle_deg: f32,
    rate: RotationRate,
}

impl SceneTransform {
    pub fn new(position: Vec3, rate: RotationRate) -> Self {
        Self {
            position,
            angle_deg: 0.0,
            rate,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Accumulated angle in degrees, in `[0, 360)`.
    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    pub fn rate(&self) -> RotationRate {
        self.rate
    }

    /// Current matrix without advancing.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_rotation_y(self.angle_deg.to_radians())
    }

    /// Advances the rotation by one step and returns the new model matrix.
    ///
    /// `dt_seconds` only matters for [`RotationRate::PerSecond`].
    pub fn advance(&mut self, dt_seconds: f32) -> Mat4 {
        self.angle_deg = (self.angle_deg + self.rate.step(dt_seconds)).rem_euclid(360.0);
        self.model_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn first_advance_rotates_by_one_step() {
        let mut t = SceneTransform::new(Vec3::ZERO, RotationRate::PerFrame(0.7));
        t.advance(0.0);
        assert!(approx(t.angle_deg(), 0.7));
    }

    #[test]
    fn angle_is_k_steps_mod_360() {
        let step = 0.7;
        let mut t = SceneTransform::new(Vec3::new(0.0, -30.0, 0.0), RotationRate::PerFrame(step));
        for _ in 0..1000 {
            t.advance(1.0 / 60.0);
        }
        let expected = (1000.0 * step).rem_euclid(360.0);
        // Summing 1000 f32 steps drifts slightly from the exact product.
        assert!((t.angle_deg() - expected).abs() < 0.05, "{} vs {expected}", t.angle_deg());
        assert!((0.0..360.0).contains(&t.angle_deg()));
    }

    #[test]
    fn translation_never_changes() {
        let pos = Vec3::new(0.0, -30.0, 0.0);
        let mut t = SceneTransform::new(pos, RotationRate::default());
        for _ in 0..600 {
            let m = t.advance(0.016);
            assert_eq!(m.w_axis.truncate(), pos);
        }
    }

    #[test]
    fn rotation_is_about_local_y_then_translated() {
        let pos = Vec3::new(5.0, 0.0, 0.0);
        let mut t = SceneTransform::new(pos, RotationRate::PerFrame(90.0));
        let m = t.advance(0.0);

        // +X in local space turns to -Z, then moves to the object's position.
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(5.0, 0.0, -1.0), 1e-5), "{p:?}");
        // The local up axis is untouched by the rotation.
        assert!(m.transform_vector3(Vec3::Y).abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn per_second_rate_scales_with_dt() {
        let mut t = SceneTransform::new(Vec3::ZERO, RotationRate::PerSecond(42.0));
        t.advance(0.5);
        assert!(approx(t.angle_deg(), 21.0));
        t.advance(0.0);
        assert!(approx(t.angle_deg(), 21.0));
    }

    #[test]
    fn equal_histories_give_equal_matrices() {
        let mut a = SceneTransform::new(Vec3::ONE, RotationRate::default());
        let mut b = a.clone();
        for _ in 0..37 {
            a.advance(0.1);
            b.advance(0.9);
        }
        assert_eq!(a.model_matrix(), b.model_matrix());
    }
}
