// scene.rs — 应用状态、交互选择与地月轨道变换

use crate::camera::{Camera, Walk};
use crate::config::{AppConfig, SceneConfig};
use glam::{Mat4, Vec2, Vec3};
use std::time::Instant;

/// Cursor distance in logical pixels within which a press grabs the light.
pub const PICK_RADIUS: f32 = 12.0;

pub const USAGE: &str = "\
W: Move Camera Forward
A: Move Camera Left
S: Move Camera Backwards
D: Move Camera Right
R: Toggle Rotation Around Y-Axis
O: Increase Orbit Speed
P: Decrease Orbit Speed
M: Toggle Moon View
N: Toggle Night Sky View";

/// What the left mouse button is currently dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Light,
    Camera,
}

/// Keyboard actions, decoupled from the windowing key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Walk(Walk),
    ToggleRotation,
    OrbitFaster,
    OrbitSlower,
    ToggleMoonOnly,
    ToggleSky,
}

/// Model matrices for one frame. `None` means the body is hidden.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTransforms {
    /// Spin angle about Y in radians.
    pub rad_ang: f32,
    pub earth: Option<Mat4>,
    pub moon: Mat4,
    pub sky: Option<Mat4>,
}

pub struct AppState {
    pub camera: Camera,
    pub light: Vec3,
    pub selection: Selection,
    pub rotate_axis: bool,
    pub only_moon: bool,
    pub display_sky: bool,
    pub orbit_speed: f32,
    pub texture_scale: f32,
    scene: SceneConfig,
    last_cursor: Option<Vec2>,
    /// Physical pixels per logical pixel.
    scale_factor: f32,
    start: Instant,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let mut camera = Camera::new(config.camera.distance, config.camera.fov);
        camera.sensitivity_scale = config.camera.sensitivity;
        camera.walk_step = config.camera.walk_step;

        Self {
            camera,
            light: Vec3::from_array(config.scene.light),
            selection: Selection::None,
            rotate_axis: false,
            only_moon: false,
            display_sky: false,
            orbit_speed: config.scene.orbit_speed,
            texture_scale: config.scene.texture_scale,
            scene: config.scene.clone(),
            last_cursor: None,
            scale_factor: 1.0,
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    pub fn key(&mut self, command: Command) {
        match command {
            Command::Walk(walk) => self.camera.walk(walk),
            Command::ToggleRotation => self.rotate_axis = !self.rotate_axis,
            Command::OrbitFaster => self.orbit_speed += self.scene.orbit_speed_step,
            Command::OrbitSlower => {
                if self.orbit_speed > self.scene.orbit_speed_step {
                    self.orbit_speed -= self.scene.orbit_speed_step;
                }
            }
            Command::ToggleMoonOnly => self.only_moon = !self.only_moon,
            Command::ToggleSky => self.display_sky = !self.display_sky,
        }
        log::debug!("{command:?} -> orbit_speed={}", self.orbit_speed);
    }

    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        self.scale_factor = scale_factor.max(f32::EPSILON);
    }

    /// Left button change. A release always ends the drag, even when the UI
    /// took the event; a press the UI took starts nothing.
    pub fn left_button(&mut self, pressed: bool, cursor: Vec2, viewport: Vec2, ui_consumed: bool) {
        match (pressed, ui_consumed) {
            (false, _) => self.release(),
            (true, false) => self.press(cursor, viewport),
            (true, true) => {}
        }
    }

    /// Left button down at physical pixel `cursor` (y down).
    pub fn press(&mut self, cursor: Vec2, viewport: Vec2) {
        let radius = PICK_RADIUS * self.scale_factor;
        let over_light = self
            .camera
            .world_to_screen(self.light, viewport)
            .is_some_and(|p| p.distance(cursor) <= radius);

        self.selection = if over_light {
            Selection::Light
        } else {
            Selection::Camera
        };
        self.last_cursor = Some(cursor);
    }

    pub fn release(&mut self) {
        self.selection = Selection::None;
        self.last_cursor = None;
    }

    pub fn cursor_moved(&mut self, cursor: Vec2, viewport: Vec2) {
        let Some(last) = self.last_cursor else {
            return;
        };
        match self.selection {
            Selection::Light => {
                self.light = self.camera.drag_point(self.light, last, cursor, viewport);
            }
            Selection::Camera => {
                let delta = cursor - last;
                self.camera.drag(delta.x, delta.y, viewport);
            }
            Selection::None => {}
        }
        self.last_cursor = Some(cursor);
    }

    pub fn wheel(&mut self, scroll: f32) {
        self.camera.zoom(scroll);
    }

    pub fn frame(&self, elapsed_secs: f32) -> FrameTransforms {
        let rad_ang = elapsed_secs * self.scene.deg_per_sec.to_radians();
        let spin = if self.rotate_axis {
            Mat4::from_rotation_y(rad_ang)
        } else {
            Mat4::IDENTITY
        };

        let (sin0, cos0) = (rad_ang * self.orbit_speed).sin_cos();
        let [rx, rz] = self.scene.orbit_radius;
        let height = self.scene.moon_height;

        let (moon, earth) = if self.only_moon {
            (Mat4::from_translation(Vec3::new(0.0, height, 0.0)) * spin, None)
        } else {
            let orbit = Vec3::new(
                cos0 * rx + sin0 * rx,
                height,
                -sin0 * rz + cos0 * rz,
            );
            let moon = Mat4::from_translation(orbit)
                * Mat4::from_scale(Vec3::splat(self.scene.moon_scale))
                * spin;
            (moon, Some(spin))
        };

        let sky = self
            .display_sky
            .then(|| Mat4::from_scale(Vec3::splat(self.scene.sky_scale)));

        FrameTransforms {
            rad_ang,
            earth,
            moon,
            sky,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;
    const VIEWPORT: Vec2 = Vec2::new(1000.0, 800.0);

    fn state() -> AppState {
        AppState::new(&AppConfig::default())
    }

    fn translation(m: &Mat4) -> Vec3 {
        m.w_axis.truncate()
    }

    #[test]
    fn test_initial_frame() {
        let s = state();
        let f = s.frame(0.0);
        assert_eq!(f.rad_ang, 0.0);
        assert_eq!(f.earth, Some(Mat4::IDENTITY));
        assert!((translation(&f.moon) - Vec3::new(1.5, 0.3, 2.0)).length() < EPSILON);
        assert!(f.sky.is_none());
    }

    #[test]
    fn test_orbit_position() {
        let s = state();
        let t = 3.0;
        let f = s.frame(t);
        let a = t * 23.0f32.to_radians() * 2.0;
        let expected = Vec3::new(
            a.cos() * 1.5 + a.sin() * 1.5,
            0.3,
            -a.sin() * 2.0 + a.cos() * 2.0,
        );
        assert!((f.rad_ang - t * 23.0f32.to_radians()).abs() < EPSILON);
        assert!((translation(&f.moon) - expected).length() < EPSILON);
        // 缩放 0.3
        assert!((f.moon.x_axis.truncate().length() - 0.3).abs() < EPSILON);
    }

    #[test]
    fn test_moon_only_view() {
        let mut s = state();
        s.key(Command::ToggleMoonOnly);
        let f = s.frame(10.0);
        assert!(f.earth.is_none());
        assert_eq!(f.moon, Mat4::from_translation(Vec3::new(0.0, 0.3, 0.0)));
    }

    #[test]
    fn test_rotation_spins_bodies() {
        let mut s = state();
        s.key(Command::ToggleRotation);
        let t = 2.0;
        let f = s.frame(t);
        assert_eq!(f.earth, Some(Mat4::from_rotation_y(f.rad_ang)));
        assert!((translation(&f.moon) - translation(&state().frame(t).moon)).length() < EPSILON);
    }

    #[test]
    fn test_sky_toggle() {
        let mut s = state();
        s.key(Command::ToggleSky);
        assert_eq!(s.frame(0.0).sky, Some(Mat4::from_scale(Vec3::splat(25.0))));
        s.key(Command::ToggleSky);
        assert!(s.frame(0.0).sky.is_none());
    }

    #[test]
    fn test_orbit_speed_never_reaches_zero() {
        let mut s = state();
        s.key(Command::OrbitFaster);
        assert_eq!(s.orbit_speed, 2.5);
        for _ in 0..20 {
            s.key(Command::OrbitSlower);
        }
        assert_eq!(s.orbit_speed, 0.5);
    }

    #[test]
    fn test_press_selects_light_or_camera() {
        let mut s = state();
        let light_px = s.camera.world_to_screen(s.light, VIEWPORT).unwrap();

        s.press(light_px + Vec2::new(3.0, -4.0), VIEWPORT);
        assert_eq!(s.selection, Selection::Light);
        s.release();
        assert_eq!(s.selection, Selection::None);

        s.press(Vec2::new(10.0, 10.0), VIEWPORT);
        assert_eq!(s.selection, Selection::Camera);
    }

    #[test]
    fn test_drag_light() {
        let mut s = state();
        let start = s.camera.world_to_screen(s.light, VIEWPORT).unwrap();
        s.press(start, VIEWPORT);
        let target = start + Vec2::new(30.0, 20.0);
        s.cursor_moved(target, VIEWPORT);
        let now = s.camera.world_to_screen(s.light, VIEWPORT).unwrap();
        assert!((now - target).length() < 0.1);
        assert_eq!(s.camera.yaw, 0.0);
    }

    #[test]
    fn test_drag_camera() {
        let mut s = state();
        let light = s.light;
        s.press(Vec2::new(100.0, 700.0), VIEWPORT);
        s.cursor_moved(Vec2::new(150.0, 700.0), VIEWPORT);
        assert!(s.camera.yaw < 0.0);
        assert_eq!(s.light, light);

        s.release();
        let yaw = s.camera.yaw;
        s.cursor_moved(Vec2::new(300.0, 700.0), VIEWPORT);
        assert_eq!(s.camera.yaw, yaw);
    }

    #[test]
    fn test_release_over_ui_ends_drag() {
        let mut s = state();
        s.left_button(true, Vec2::new(100.0, 700.0), VIEWPORT, false);
        assert_eq!(s.selection, Selection::Camera);

        // 松开时光标在 egui 窗口上
        s.left_button(false, Vec2::new(100.0, 700.0), VIEWPORT, true);
        assert_eq!(s.selection, Selection::None);

        let yaw = s.camera.yaw;
        s.cursor_moved(Vec2::new(300.0, 700.0), VIEWPORT);
        assert_eq!(s.camera.yaw, yaw);
    }

    #[test]
    fn test_press_over_ui_selects_nothing() {
        let mut s = state();
        s.left_button(true, Vec2::new(100.0, 700.0), VIEWPORT, true);
        assert_eq!(s.selection, Selection::None);
    }

    #[test]
    fn test_pick_radius_follows_scale_factor() {
        let mut s = state();
        let light_px = s.camera.world_to_screen(s.light, VIEWPORT).unwrap();
        let near = light_px + Vec2::new(20.0, 0.0);

        s.press(near, VIEWPORT);
        assert_eq!(s.selection, Selection::Camera);
        s.release();

        s.set_scale_factor(2.0);
        s.press(near, VIEWPORT);
        assert_eq!(s.selection, Selection::Light);
    }
}
