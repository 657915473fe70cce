//! Pinhole camera and viewport basis
//!
//! The camera keeps its user-facing inputs (`look_from`, `look_at`, `vfov`,
//! viewport size) private and recomputes the derived viewport basis after
//! every mutation. The derived values are what the raytracing shader needs to
//! generate one primary ray per pixel.

use glam::Vec3;

/// World up vector used for the camera basis
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Smallest and largest vertical field of view in degrees
pub const MIN_VFOV: f32 = 1.0;
pub const MAX_VFOV: f32 = 120.0;

/// Pitch limit in degrees for mouse look
pub const MAX_PITCH: f32 = 89.0;

const DEFAULT_LOOK_FROM: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const DEFAULT_LOOK_AT: Vec3 = Vec3::ZERO;
const DEFAULT_VFOV: f32 = 90.0;

/// Direction of a single camera translation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MoveDirection {
    Forward,
    Left,
    Backward,
    Right,
    Up,
    Down,
}

impl MoveDirection {
    pub const ALL: [MoveDirection; 6] = [
        MoveDirection::Forward,
        MoveDirection::Left,
        MoveDirection::Backward,
        MoveDirection::Right,
        MoveDirection::Up,
        MoveDirection::Down,
    ];
}

/// Derived per-pixel ray generation data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Ray origin
    pub camera_center: Vec3,
    /// World-space offset between horizontally adjacent pixels
    pub pixel_delta_u: Vec3,
    /// World-space offset between vertically adjacent pixels
    pub pixel_delta_v: Vec3,
    /// Center of the first pixel; rows advance along `pixel_delta_v`
    pub pixel00_loc: Vec3,
}

/// Pinhole camera used by the raytracer
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    look_from: Vec3,
    look_at: Vec3,
    vfov: f32,

    zoom_speed: f32,
    turn_speed: f32,
    move_speed: f32,

    window_width: f32,
    window_height: f32,

    viewport: Viewport,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            look_from: DEFAULT_LOOK_FROM,
            look_at: DEFAULT_LOOK_AT,
            vfov: DEFAULT_VFOV,
            zoom_speed: 5.0,
            turn_speed: 0.05,
            move_speed: 0.25,
            window_width: 0.0,
            window_height: 0.0,
            viewport: Viewport::default(),
        };
        camera.update();
        camera
    }
}

impl Camera {
    pub fn new(look_from: Vec3, look_at: Vec3, vfov: f32) -> Self {
        let mut camera = Self::default();
        camera.look_from = look_from;
        camera.look_at = look_at;
        camera.vfov = vfov.clamp(MIN_VFOV, MAX_VFOV);
        camera.update();
        camera
    }

    pub fn look_from(&self) -> Vec3 {
        self.look_from
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn vfov(&self) -> f32 {
        self.vfov
    }

    pub fn zoom_speed(&self) -> f32 {
        self.zoom_speed
    }

    pub fn turn_speed(&self) -> f32 {
        self.turn_speed
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Viewport size the basis was computed for
    pub fn window_size(&self) -> (f32, f32) {
        (self.window_width, self.window_height)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Unit vector from `look_from` towards `look_at`
    pub fn forward(&self) -> Vec3 {
        (self.look_at - self.look_from).normalize_or_zero()
    }

    pub fn set_look_from(&mut self, look_from: Vec3) {
        self.look_from = look_from;
        self.update();
    }

    pub fn set_look_at(&mut self, look_at: Vec3) {
        self.look_at = look_at;
        self.update();
    }

    /// Set the vertical field of view in degrees, clamped to the zoom range
    pub fn set_vfov(&mut self, vfov: f32) {
        self.vfov = vfov.clamp(MIN_VFOV, MAX_VFOV);
        self.update();
    }

    pub fn set_zoom_speed(&mut self, speed: f32) {
        self.zoom_speed = speed.max(0.0);
    }

    pub fn set_turn_speed(&mut self, speed: f32) {
        self.turn_speed = speed.max(0.0);
    }

    pub fn set_move_speed(&mut self, speed: f32) {
        self.move_speed = speed.max(0.0);
    }

    /// Recompute the viewport basis from the current inputs.
    ///
    /// Degenerate inputs (empty viewport, `look_from == look_at`, or a view
    /// direction parallel to [`WORLD_UP`]) leave the previous basis in place.
    pub fn update(&mut self) {
        let offset = self.look_from - self.look_at;
        let focal_length = offset.length();

        if self.window_width <= 0.0 || self.window_height <= 0.0 {
            log::trace!(
                "Camera basis not updated: empty viewport {}x{}",
                self.window_width,
                self.window_height
            );
            return;
        }
        if focal_length <= f32::EPSILON {
            log::debug!("Camera basis not updated: look_from equals look_at");
            return;
        }

        let w = offset / focal_length;
        let side = WORLD_UP.cross(w);
        if side.length_squared() <= f32::EPSILON {
            log::debug!("Camera basis not updated: view direction parallel to world up");
            return;
        }
        let u = side.normalize();
        let v = w.cross(u);

        let h = (self.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h * focal_length;
        let viewport_width = viewport_height * (self.window_width / self.window_height);

        let viewport_u = viewport_width * u;
        let viewport_v = viewport_height * v;

        let pixel_delta_u = viewport_u / self.window_width;
        let pixel_delta_v = viewport_v / self.window_height;

        let viewport_corner =
            self.look_from - focal_length * w - viewport_u / 2.0 - viewport_v / 2.0;

        self.viewport = Viewport {
            camera_center: self.look_from,
            pixel_delta_u,
            pixel_delta_v,
            pixel00_loc: viewport_corner + 0.5 * (pixel_delta_u + pixel_delta_v),
        };
    }

    /// Set the viewport size (fractional sizes are allowed) and recompute
    pub fn update_window(&mut self, width: f32, height: f32) {
        self.window_width = width;
        self.window_height = height;
        self.update();
    }

    /// Narrow (positive `amount`) or widen the field of view
    pub fn zoom(&mut self, amount: f32) {
        self.vfov = (self.vfov - amount * self.zoom_speed).clamp(MIN_VFOV, MAX_VFOV);
        self.update();
    }

    /// Translate `look_from` one step and re-aim `look_at` one unit ahead
    pub fn move_toward(&mut self, direction: MoveDirection) {
        let forward = self.forward();
        let right = forward.cross(WORLD_UP).normalize_or_zero();

        let step = match direction {
            MoveDirection::Forward => forward,
            MoveDirection::Backward => -forward,
            MoveDirection::Left => -right,
            MoveDirection::Right => right,
            MoveDirection::Up => WORLD_UP,
            MoveDirection::Down => -WORLD_UP,
        };

        self.look_from += step * self.move_speed;
        self.look_at = self.look_from + forward;
        self.update();
    }

    /// Rotate the view by yaw/pitch offsets in turn-speed units
    pub fn turn(&mut self, x_offset: f32, y_offset: f32) {
        let forward = self.forward();
        if forward == Vec3::ZERO {
            return;
        }

        let yaw = forward.z.atan2(forward.x).to_degrees() + x_offset * self.turn_speed;
        let pitch = (forward.y.clamp(-1.0, 1.0).asin().to_degrees() + y_offset * self.turn_speed)
            .clamp(-MAX_PITCH, MAX_PITCH);

        let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
        let front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());

        self.look_at = self.look_from + front.normalize();
        self.update();
    }

    /// Restore the default position, target and field of view
    pub fn reset(&mut self) {
        self.look_from = DEFAULT_LOOK_FROM;
        self.look_at = DEFAULT_LOOK_AT;
        self.vfov = DEFAULT_VFOV;
        self.update();
    }

    /// Point the camera at once; used by scene presets
    pub fn set_view(&mut self, look_from: Vec3, look_at: Vec3, vfov: f32) {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vfov = vfov.clamp(MIN_VFOV, MAX_VFOV);
        self.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPS
    }

    fn camera_2x2() -> Camera {
        let mut camera = Camera::default();
        camera.update_window(2.0, 2.0);
        camera
    }

    #[test]
    fn default_basis_for_square_viewport() {
        let camera = camera_2x2();
        let viewport = camera.viewport();

        assert!(approx(viewport.camera_center, Vec3::new(0.0, 0.0, 1.0)));
        assert!(approx(viewport.pixel_delta_u, Vec3::new(1.0, 0.0, 0.0)));
        assert!(approx(viewport.pixel_delta_v, Vec3::new(0.0, 1.0, 0.0)));
        assert!(approx(viewport.pixel00_loc, Vec3::new(-0.5, -0.5, 0.0)));
    }

    #[test]
    fn aspect_ratio_stretches_horizontal_delta() {
        let mut camera = Camera::default();
        camera.update_window(200.0, 100.0);
        let viewport = camera.viewport();

        // vfov 90 at focal length 1 gives a viewport of 4 x 2 units
        assert!(approx(viewport.pixel_delta_u * 200.0, Vec3::new(4.0, 0.0, 0.0)));
        assert!(approx(viewport.pixel_delta_v * 100.0, Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn update_is_deterministic() {
        let mut a = Camera::new(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, 20.0);
        let mut b = a.clone();
        a.update_window(640.0, 400.0);
        b.update_window(640.0, 400.0);
        a.update();
        a.update();
        assert_eq!(a.viewport(), b.viewport());
    }

    #[test]
    fn fractional_window_size_is_accepted() {
        let mut camera = Camera::default();
        camera.update_window(640.5, 400.25);
        let viewport = camera.viewport();
        assert!(viewport.pixel_delta_u.x.is_finite());
        assert!((viewport.pixel_delta_u.length() * 640.5 - 2.0 * 640.5 / 400.25).abs() < 1e-3);
    }

    #[test]
    fn empty_viewport_keeps_previous_basis() {
        let mut camera = camera_2x2();
        let before = *camera.viewport();
        camera.update_window(0.0, 0.0);
        assert_eq!(*camera.viewport(), before);
    }

    #[test]
    fn coincident_points_keep_previous_basis() {
        let mut camera = camera_2x2();
        let before = *camera.viewport();
        camera.set_look_at(camera.look_from());
        assert_eq!(*camera.viewport(), before);
        assert!(camera.viewport().pixel00_loc.is_finite());
    }

    #[test]
    fn zoom_clamps_at_both_ends() {
        let mut camera = camera_2x2();

        camera.zoom(-100.0);
        assert_eq!(camera.vfov(), MAX_VFOV);
        let at_max = *camera.viewport();
        camera.zoom(-100.0);
        assert_eq!(camera.vfov(), MAX_VFOV);
        assert_eq!(*camera.viewport(), at_max);

        camera.zoom(100.0);
        assert_eq!(camera.vfov(), MIN_VFOV);
        camera.zoom(100.0);
        assert_eq!(camera.vfov(), MIN_VFOV);
    }

    #[test]
    fn zoom_scales_by_zoom_speed() {
        let mut camera = camera_2x2();
        camera.zoom(1.0);
        assert!((camera.vfov() - 85.0).abs() < EPS);
    }

    #[test]
    fn forward_move_from_default() {
        let mut camera = camera_2x2();
        camera.move_toward(MoveDirection::Forward);

        assert!((camera.look_from().z - 0.75).abs() < EPS);
        assert!((camera.look_at().z + 0.25).abs() < EPS);
        assert!(approx(camera.viewport().camera_center, camera.look_from()));
    }

    #[test]
    fn forward_then_backward_returns_home() {
        let mut camera = Camera::new(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, 20.0);
        camera.update_window(320.0, 200.0);
        let start = camera.look_from();

        camera.move_toward(MoveDirection::Forward);
        camera.move_toward(MoveDirection::Backward);
        assert!(approx(camera.look_from(), start));
    }

    #[test]
    fn strafe_and_vertical_moves() {
        let mut camera = camera_2x2();
        camera.move_toward(MoveDirection::Right);
        assert!(approx(camera.look_from(), Vec3::new(0.25, 0.0, 1.0)));
        camera.move_toward(MoveDirection::Left);
        camera.move_toward(MoveDirection::Up);
        assert!(approx(camera.look_from(), Vec3::new(0.0, 0.25, 1.0)));
        camera.move_toward(MoveDirection::Down);
        assert!(approx(camera.look_from(), Vec3::new(0.0, 0.0, 1.0)));
        assert!(approx(camera.forward(), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn turn_never_exceeds_pitch_limit() {
        let mut camera = camera_2x2();
        camera.set_turn_speed(1.0);

        for _ in 0..50 {
            camera.turn(3.0, 40.0);
            let pitch = camera.forward().y.asin().to_degrees();
            assert!(pitch <= MAX_PITCH + 1e-3, "pitch {pitch}");
        }
        for _ in 0..50 {
            camera.turn(-7.0, -40.0);
            let pitch = camera.forward().y.asin().to_degrees();
            assert!(pitch >= -MAX_PITCH - 1e-3, "pitch {pitch}");
        }
        assert!(camera.viewport().pixel00_loc.is_finite());
    }

    #[test]
    fn turn_keeps_position_and_unit_focal_length() {
        let mut camera = camera_2x2();
        camera.turn(100.0, 50.0);
        assert!(approx(camera.look_from(), Vec3::new(0.0, 0.0, 1.0)));
        assert!(((camera.look_at() - camera.look_from()).length() - 1.0).abs() < EPS);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut camera = camera_2x2();
        let home = *camera.viewport();
        camera.move_toward(MoveDirection::Up);
        camera.turn(20.0, 10.0);
        camera.zoom(3.0);

        camera.reset();
        assert_eq!(camera.look_from(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(camera.look_at(), Vec3::ZERO);
        assert_eq!(camera.vfov(), 90.0);
        assert!(approx(camera.viewport().pixel00_loc, home.pixel00_loc));
    }

    #[test]
    fn speeds_are_never_negative() {
        let mut camera = Camera::default();
        camera.set_move_speed(-1.0);
        camera.set_turn_speed(-1.0);
        camera.set_zoom_speed(-1.0);
        assert_eq!(camera.move_speed(), 0.0);
        assert_eq!(camera.turn_speed(), 0.0);
        assert_eq!(camera.zoom_speed(), 0.0);
    }
}
