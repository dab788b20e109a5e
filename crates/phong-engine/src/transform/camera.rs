use glam::{Mat4, Vec3};

/// Fixed look-at camera and perspective frustum parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 100.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg: 45.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

/// View and projection matrices, computed once and never mutated.
///
/// Right-handed; the projection maps depth to `[0, 1]` as wgpu expects.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            view: Mat4::look_at_rh(config.eye, config.target, config.up),
            projection: Mat4::perspective_rh(
                config.fov_y_deg.to_radians(),
                aspect,
                config.near,
                config.far,
            ),
        }
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4Swizzles;

    use super::*;

    #[test]
    fn target_projects_to_screen_center() {
        let cam = Camera::new(&CameraConfig::default(), 1920.0 / 1080.0);
        let clip = *cam.projection() * *cam.view() * Vec3::ZERO.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn near_and_far_planes_map_to_depth_range() {
        let cfg = CameraConfig::default();
        let cam = Camera::new(&cfg, 1.0);
        let depth = |distance: f32| {
            let p = cfg.eye - Vec3::Z * distance;
            let clip = *cam.projection() * *cam.view() * p.extend(1.0);
            clip.z / clip.w
        };
        assert!(depth(cfg.near).abs() < 1e-4);
        assert!((depth(cfg.far) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn object_below_origin_is_in_lower_half() {
        let cam = Camera::new(&CameraConfig::default(), 16.0 / 9.0);
        let clip = *cam.projection() * *cam.view() * Vec3::new(0.0, -30.0, 0.0).extend(1.0);
        let ndc_y = clip.y / clip.w;
        assert!(ndc_y < 0.0 && ndc_y > -1.0);
    }
}
