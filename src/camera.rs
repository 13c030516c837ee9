// camera.rs — 环绕相机 (yaw / pitch / distance) 与屏幕坐标换算

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

const MIN_DISTANCE: f32 = 1.5;
const MAX_DISTANCE: f32 = 100.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;

/// Which way a walk key moves the camera, in its own frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Forward,
    Back,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub target: Vec3,
    /// Degrees around Y; 0 looks down -Z.
    pub yaw: f32,
    /// Degrees, clamped to ±89.
    pub pitch: f32,
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub sensitivity_scale: f32,
    pub walk_step: f32,
}

impl Camera {
    pub fn new(distance: f32, fov: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            fov,
            sensitivity_scale: 1.0,
            walk_step: 0.5,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_y, cos_y) = self.yaw.to_radians().sin_cos();
        let (sin_p, cos_p) = self.pitch.to_radians().sin_cos();
        self.target + self.distance * Vec3::new(cos_p * sin_y, sin_p, cos_p * cos_y)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, NEAR, FAR)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// Rotates around the target by a cursor delta in pixels.
    pub fn drag(&mut self, dx: f32, dy: f32, viewport: Vec2) {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return;
        }

        let v_f = self.fov.to_radians();
        let aspect = viewport.x / viewport.y;
        let h_f = 2.0 * ((v_f / 2.0).tan() * aspect).atan();

        let yaw_per_px_deg = (h_f / viewport.x).to_degrees();
        let pitch_per_px_deg = (v_f / viewport.y).to_degrees();

        self.yaw -= dx * yaw_per_px_deg * self.sensitivity_scale;
        self.pitch =
            (self.pitch + dy * pitch_per_px_deg * self.sensitivity_scale).clamp(-89.0, 89.0);
    }

    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * (1.0 - 0.1 * scroll)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Moves camera and target together, keeping the orbit.
    pub fn walk(&mut self, walk: Walk) {
        let forward = (self.target - self.position()).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let delta = match walk {
            Walk::Forward => forward,
            Walk::Back => -forward,
            Walk::Left => -right,
            Walk::Right => right,
        };
        self.target += delta * self.walk_step;
    }

    /// Pixel position (y down) of a world point, `None` behind the camera.
    pub fn world_to_screen(&self, point: Vec3, viewport: Vec2) -> Option<Vec2> {
        let clip = self.view_projection(viewport.x / viewport.y) * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        ))
    }

    /// Moves `point` parallel to the image plane so its projection follows
    /// the cursor from `from` to `to`.
    pub fn drag_point(&self, point: Vec3, from: Vec2, to: Vec2, viewport: Vec2) -> Vec3 {
        let view_proj = self.view_projection(viewport.x / viewport.y);
        let clip = view_proj * point.extend(1.0);
        if clip.w <= 0.0 {
            return point;
        }
        let depth = clip.z / clip.w;
        let inverse = view_proj.inverse();

        let unproject = |pixel: Vec2| {
            let ndc = Vec2::new(
                pixel.x / viewport.x * 2.0 - 1.0,
                1.0 - pixel.y / viewport.y * 2.0,
            );
            inverse.project_point3(ndc.extend(depth))
        };

        point + unproject(to) - unproject(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;
    const VIEWPORT: Vec2 = Vec2::new(1000.0, 800.0);

    #[test]
    fn test_default_position() {
        let camera = Camera::new(10.0, 45.0);
        assert!((camera.position() - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut camera = Camera::new(10.0, 45.0);
        camera.drag(0.0, 1e6, VIEWPORT);
        assert_eq!(camera.pitch, 89.0);
        camera.drag(0.0, -1e7, VIEWPORT);
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn test_drag_ignores_empty_viewport() {
        let mut camera = Camera::new(10.0, 45.0);
        camera.drag(50.0, 50.0, Vec2::ZERO);
        assert_eq!(camera, Camera::new(10.0, 45.0));
    }

    #[test]
    fn test_zoom_clamped() {
        let mut camera = Camera::new(10.0, 45.0);
        camera.zoom(-1000.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
        for _ in 0..200 {
            camera.zoom(5.0);
        }
        assert_eq!(camera.distance, MIN_DISTANCE);
    }

    #[test]
    fn test_walk_keeps_orbit() {
        let mut camera = Camera::new(10.0, 45.0);
        camera.walk(Walk::Forward);
        assert!((camera.target - Vec3::new(0.0, 0.0, -0.5)).length() < 1e-5);
        assert_eq!(camera.distance, 10.0);
        camera.walk(Walk::Right);
        assert!((camera.target - Vec3::new(0.5, 0.0, -0.5)).length() < 1e-5);
        camera.walk(Walk::Left);
        camera.walk(Walk::Back);
        assert!(camera.target.length() < 1e-5);
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::new(10.0, 45.0);
        let p = camera.world_to_screen(Vec3::ZERO, VIEWPORT).unwrap();
        assert!((p - VIEWPORT / 2.0).length() < EPSILON);
        assert!(camera
            .world_to_screen(Vec3::new(0.0, 0.0, 20.0), VIEWPORT)
            .is_none());
    }

    #[test]
    fn test_drag_point_follows_cursor() {
        let camera = Camera::new(10.0, 45.0);
        let light = Vec3::new(2.7, 2.3, 5.3);
        let from = camera.world_to_screen(light, VIEWPORT).unwrap();
        let to = from + Vec2::new(40.0, -25.0);
        let moved = camera.drag_point(light, from, to, VIEWPORT);
        let projected = camera.world_to_screen(moved, VIEWPORT).unwrap();
        assert!((projected - to).length() < 0.1, "{projected:?} != {to:?}");
    }
}
