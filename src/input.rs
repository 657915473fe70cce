//! Input-to-motion mapping
//!
//! Translates window input into camera motion, gated by the interaction
//! mode:
//! - Edit: pointer is free and the UI is interactive, the camera stays put
//! - Play: pointer is captured, WASD/Space/Ctrl move, mouse turns, scroll zooms
//!
//! The mapper never talks to the window directly. Effects that need the
//! window (pointer capture, fullscreen) are returned as [`WindowRequest`]s.

use std::collections::BTreeSet;

use winit::keyboard::KeyCode;

use crate::scene::{MoveDirection, Scene};

/// Interaction mode of the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Edit,
    Play,
}

/// Input event decoupled from the windowing library
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key {
        code: KeyCode,
        pressed: bool,
        repeat: bool,
    },
    /// Scroll amount, positive away from the user
    Scroll { delta: f32 },
    /// Absolute pointer sample in physical pixels
    PointerMoved { x: f64, y: f64 },
    FocusLost,
}

/// Effect the session has to apply to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    CapturePointer,
    ReleasePointer,
    ToggleFullscreen,
    ReloadShaders,
}

/// What a bound key does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Move(MoveDirection),
    TogglePlay,
    Cancel,
    ToggleFullscreen,
    ReloadShaders,
}

/// Key binding table
pub fn key_action(code: KeyCode) -> Option<KeyAction> {
    let action = match code {
        KeyCode::KeyW => KeyAction::Move(MoveDirection::Forward),
        KeyCode::KeyS => KeyAction::Move(MoveDirection::Backward),
        KeyCode::KeyA => KeyAction::Move(MoveDirection::Left),
        KeyCode::KeyD => KeyAction::Move(MoveDirection::Right),
        KeyCode::Space => KeyAction::Move(MoveDirection::Up),
        KeyCode::ControlLeft => KeyAction::Move(MoveDirection::Down),
        KeyCode::Enter => KeyAction::TogglePlay,
        KeyCode::Escape => KeyAction::Cancel,
        KeyCode::KeyF => KeyAction::ToggleFullscreen,
        KeyCode::F5 => KeyAction::ReloadShaders,
        _ => return None,
    };
    Some(action)
}

/// Maps input events onto camera motion and mode changes
#[derive(Debug, Default)]
pub struct InputMapper {
    mode: InteractionMode,
    pressed: BTreeSet<MoveDirection>,
    last_pointer: Option<(f64, f64)>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == InteractionMode::Play
    }

    /// Directions currently held down
    pub fn pressed(&self) -> impl Iterator<Item = MoveDirection> + '_ {
        self.pressed.iter().copied()
    }

    /// Switch mode. Held keys never survive a mode change.
    pub fn set_mode(&mut self, mode: InteractionMode) -> Option<WindowRequest> {
        if self.mode == mode {
            return None;
        }
        self.mode = mode;
        self.pressed.clear();
        log::info!("Interaction mode: {:?}", mode);

        Some(match mode {
            InteractionMode::Play => WindowRequest::CapturePointer,
            InteractionMode::Edit => WindowRequest::ReleasePointer,
        })
    }

    pub fn toggle_play(&mut self) -> Option<WindowRequest> {
        match self.mode {
            InteractionMode::Edit => self.set_mode(InteractionMode::Play),
            InteractionMode::Play => self.set_mode(InteractionMode::Edit),
        }
    }

    /// Feed one input event. Camera changes go through `scene` and only
    /// happen in Play mode.
    pub fn handle_event(&mut self, event: &InputEvent, scene: &mut Scene) -> Option<WindowRequest> {
        match *event {
            InputEvent::Key {
                code,
                pressed,
                repeat,
            } => self.handle_key(code, pressed, repeat),
            InputEvent::Scroll { delta } => {
                if self.is_playing() && delta != 0.0 {
                    scene.camera_mut().zoom(delta);
                }
                None
            }
            InputEvent::PointerMoved { x, y } => {
                let (dx, dy) = match self.last_pointer.replace((x, y)) {
                    Some((last_x, last_y)) => (x - last_x, last_y - y),
                    None => (0.0, 0.0),
                };
                if self.is_playing() && (dx != 0.0 || dy != 0.0) {
                    scene.camera_mut().turn(dx as f32, dy as f32);
                }
                None
            }
            InputEvent::FocusLost => {
                self.last_pointer = None;
                self.set_mode(InteractionMode::Edit)
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool, repeat: bool) -> Option<WindowRequest> {
        match key_action(code)? {
            KeyAction::Move(direction) => {
                if !pressed {
                    self.pressed.remove(&direction);
                } else if self.is_playing() {
                    self.pressed.insert(direction);
                }
                None
            }
            _ if !pressed || repeat => None,
            KeyAction::TogglePlay => self.toggle_play(),
            KeyAction::Cancel => self.set_mode(InteractionMode::Edit),
            KeyAction::ToggleFullscreen => Some(WindowRequest::ToggleFullscreen),
            KeyAction::ReloadShaders => Some(WindowRequest::ReloadShaders),
        }
    }

    /// Apply one movement step per held direction. Call once per frame.
    pub fn apply_held_keys(&self, scene: &mut Scene) -> bool {
        if !self.is_playing() || self.pressed.is_empty() {
            return false;
        }
        let camera = scene.camera_mut();
        for &direction in &self.pressed {
            camera.move_toward(direction);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn key(code: KeyCode, pressed: bool) -> InputEvent {
        InputEvent::Key {
            code,
            pressed,
            repeat: false,
        }
    }

    fn playing() -> (InputMapper, Scene) {
        let mut mapper = InputMapper::new();
        let mut scene = Scene::new();
        scene.fit_camera(2.0, 2.0);
        mapper.handle_event(&key(KeyCode::Enter, true), &mut scene);
        assert!(mapper.is_playing());
        (mapper, scene)
    }

    #[rstest]
    #[case(KeyCode::KeyW, MoveDirection::Forward)]
    #[case(KeyCode::KeyS, MoveDirection::Backward)]
    #[case(KeyCode::KeyA, MoveDirection::Left)]
    #[case(KeyCode::KeyD, MoveDirection::Right)]
    #[case(KeyCode::Space, MoveDirection::Up)]
    #[case(KeyCode::ControlLeft, MoveDirection::Down)]
    fn movement_bindings(#[case] code: KeyCode, #[case] direction: MoveDirection) {
        assert_eq!(key_action(code), Some(KeyAction::Move(direction)));
    }

    #[test]
    fn enter_toggles_and_escape_cancels() {
        let mut mapper = InputMapper::new();
        let mut scene = Scene::new();

        let request = mapper.handle_event(&key(KeyCode::Enter, true), &mut scene);
        assert_eq!(request, Some(WindowRequest::CapturePointer));
        assert_eq!(mapper.mode(), InteractionMode::Play);

        let request = mapper.handle_event(&key(KeyCode::Escape, true), &mut scene);
        assert_eq!(request, Some(WindowRequest::ReleasePointer));
        assert_eq!(mapper.mode(), InteractionMode::Edit);

        // cancel in Edit mode changes nothing
        assert_eq!(mapper.handle_event(&key(KeyCode::Escape, true), &mut scene), None);
    }

    #[test]
    fn repeated_enter_does_not_toggle() {
        let (mut mapper, mut scene) = playing();
        let repeat = InputEvent::Key {
            code: KeyCode::Enter,
            pressed: true,
            repeat: true,
        };
        assert_eq!(mapper.handle_event(&repeat, &mut scene), None);
        assert!(mapper.is_playing());
    }

    #[test]
    fn fullscreen_key_keeps_mode() {
        let (mut mapper, mut scene) = playing();
        let request = mapper.handle_event(&key(KeyCode::KeyF, true), &mut scene);
        assert_eq!(request, Some(WindowRequest::ToggleFullscreen));
        assert!(mapper.is_playing());
    }

    #[test]
    fn held_keys_move_only_in_play() {
        let mut mapper = InputMapper::new();
        let mut scene = Scene::new();
        scene.fit_camera(2.0, 2.0);

        mapper.handle_event(&key(KeyCode::KeyW, true), &mut scene);
        assert!(!mapper.apply_held_keys(&mut scene));
        assert_eq!(scene.camera().look_from().z, 1.0);

        let (mut mapper, mut scene) = playing();
        mapper.handle_event(&key(KeyCode::KeyW, true), &mut scene);
        assert!(mapper.apply_held_keys(&mut scene));
        assert!((scene.camera().look_from().z - 0.75).abs() < 1e-5);

        mapper.handle_event(&key(KeyCode::KeyW, false), &mut scene);
        assert!(!mapper.apply_held_keys(&mut scene));
    }

    #[test]
    fn leaving_play_drops_held_keys() {
        let (mut mapper, mut scene) = playing();
        mapper.handle_event(&key(KeyCode::KeyW, true), &mut scene);
        mapper.handle_event(&key(KeyCode::KeyD, true), &mut scene);

        mapper.handle_event(&key(KeyCode::Enter, true), &mut scene);
        assert_eq!(mapper.pressed().count(), 0);

        // W was released while in Edit mode; its release event never reaches Play
        mapper.handle_event(&key(KeyCode::KeyW, false), &mut scene);
        mapper.handle_event(&key(KeyCode::Enter, true), &mut scene);

        let before = scene.camera().look_from();
        for _ in 0..10 {
            mapper.apply_held_keys(&mut scene);
        }
        assert_eq!(scene.camera().look_from(), before);
    }

    #[test]
    fn scroll_zooms_only_in_play() {
        let mut mapper = InputMapper::new();
        let mut scene = Scene::new();
        mapper.handle_event(&InputEvent::Scroll { delta: 1.0 }, &mut scene);
        assert_eq!(scene.camera().vfov(), 90.0);

        let (mut mapper, mut scene) = playing();
        mapper.handle_event(&InputEvent::Scroll { delta: 1.0 }, &mut scene);
        assert_eq!(scene.camera().vfov(), 85.0);
    }

    #[test]
    fn first_pointer_sample_is_a_baseline() {
        let (mut mapper, mut scene) = playing();
        let look_at = scene.camera().look_at();

        mapper.handle_event(&InputEvent::PointerMoved { x: 500.0, y: 300.0 }, &mut scene);
        assert_eq!(scene.camera().look_at(), look_at);

        // moving the pointer up raises the view
        mapper.handle_event(&InputEvent::PointerMoved { x: 500.0, y: 200.0 }, &mut scene);
        assert!(scene.camera().forward().y > 0.0);
    }

    #[test]
    fn pointer_is_tracked_but_ignored_in_edit() {
        let mut mapper = InputMapper::new();
        let mut scene = Scene::new();
        scene.take_dirty();

        mapper.handle_event(&InputEvent::PointerMoved { x: 0.0, y: 0.0 }, &mut scene);
        mapper.handle_event(&InputEvent::PointerMoved { x: 80.0, y: 10.0 }, &mut scene);
        assert_eq!(scene.camera().look_at(), glam::Vec3::ZERO);
        assert!(!scene.is_dirty());
    }

    #[test]
    fn focus_loss_returns_to_edit() {
        let (mut mapper, mut scene) = playing();
        mapper.handle_event(&key(KeyCode::KeyA, true), &mut scene);

        let request = mapper.handle_event(&InputEvent::FocusLost, &mut scene);
        assert_eq!(request, Some(WindowRequest::ReleasePointer));
        assert_eq!(mapper.pressed().count(), 0);
    }
}
