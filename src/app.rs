//! Viewer session
//!
//! Owns the window, the engine, the scene and the input mapper, and drives
//! them from the winit event loop:
//! - window and device events become [`InputEvent`]s for the mapper
//! - `AboutToWait` applies held movement keys and requests a redraw
//! - `RedrawRequested` runs the UI (edit mode only), renders and presents

use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    event::{DeviceEvent, ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::PhysicalKey,
};

use crate::backend::{BackendError, GraphicsBackend};
use crate::engine::Engine;
use crate::error::ViewerResult;
use crate::input::{InputEvent, InputMapper, WindowRequest};
use crate::scene::{Preset, Scene};
use crate::shader::ShaderLibrary;
use crate::ui::{UiActions, ViewerUi};
use crate::{ViewerConfig, WgpuBackend, WgpuEguiIntegration, Window};

/// Pixel scroll distance treated as one wheel line
const PIXELS_PER_SCROLL_LINE: f64 = 100.0;

/// Scroll amount of a wheel event, positive away from the user
pub fn scroll_amount(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_SCROLL_LINE) as f32,
    }
}

/// The interactive viewer
pub struct Viewer {
    window: Window,
    engine: Engine<WgpuBackend>,
    egui: WgpuEguiIntegration,
    ui: ViewerUi,
    scene: Scene,
    input: InputMapper,
    rng: StdRng,
    shaders: ShaderLibrary,
    /// Accumulated raw mouse motion, unaffected by pointer capture
    pointer: (f64, f64),
    frames: u64,
    max_frames: Option<u64>,
}

impl Viewer {
    pub fn new(target: &EventLoopWindowTarget<()>, config: ViewerConfig) -> ViewerResult<Self> {
        let window = Window::new(
            target,
            &config.title,
            config.width,
            config.height,
            config.fullscreen,
        )?;

        let backend = WgpuBackend::new(window.window_arc(), config.vsync)?;
        let mut egui = WgpuEguiIntegration::new(&backend, window.window());
        let (window_width, window_height) = window.dimensions();
        let (surface_width, surface_height) = backend.surface_size();
        egui.set_surface_scale(window_width, window_height, surface_width, surface_height);

        let shaders = match &config.shader_dir {
            Some(dir) => {
                log::info!("Loading shaders from {}", dir.display());
                ShaderLibrary::with_override_dir(dir)
            }
            None => ShaderLibrary::embedded(),
        };
        let engine = Engine::new(backend, config.render, &shaders)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scene = Scene::with_preset(Preset::A, &mut rng);

        Ok(Self {
            window,
            engine,
            egui,
            ui: ViewerUi::new(config.show_tooltip),
            scene,
            input: InputMapper::new(),
            rng,
            shaders,
            pointer: (0.0, 0.0),
            frames: 0,
            max_frames: config.max_frames,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn feed(&mut self, event: InputEvent) {
        if let Some(request) = self.input.handle_event(&event, &mut self.scene) {
            self.apply_request(request);
        }
    }

    fn apply_request(&mut self, request: WindowRequest) {
        match request {
            WindowRequest::CapturePointer => self.window.set_pointer_captured(true),
            WindowRequest::ReleasePointer => self.window.set_pointer_captured(false),
            WindowRequest::ToggleFullscreen => self.window.toggle_fullscreen(),
            WindowRequest::ReloadShaders => {
                self.engine.reload_shaders(&self.shaders);
            }
        }
    }

    fn apply_ui_actions(&mut self, actions: UiActions) {
        if let Some(preset) = actions.preset {
            self.scene.apply_preset(preset, &mut self.rng);
        }
        if actions.toggle_play {
            if let Some(request) = self.input.toggle_play() {
                self.apply_request(request);
            }
        }
    }

    /// Returns an error only for failures that end the session
    fn handle_window_event(
        &mut self,
        event: WindowEvent,
        elwt: &EventLoopWindowTarget<()>,
    ) -> Result<(), BackendError> {
        // egui only sees input while the pointer is free
        if !self.input.is_playing() {
            self.egui.on_window_event(self.window.window(), &event);
        }
        self.window.handle_event(&event);
        if self.window.should_close() {
            elwt.exit();
            return Ok(());
        }

        match event {
            WindowEvent::Resized(size) => {
                self.engine.resize(size.width, size.height);
                let (surface_width, surface_height) = self.engine.backend().surface_size();
                self.egui
                    .set_surface_scale(size.width, size.height, surface_width, surface_height);
            }
            WindowEvent::Focused(false) => self.feed(InputEvent::FocusLost),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                // A focused text field keeps its keys, but releases always get through
                if !pressed || self.input.is_playing() || !self.egui.wants_keyboard_input() {
                    self.feed(InputEvent::Key {
                        code,
                        pressed,
                        repeat,
                    });
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.feed(InputEvent::Scroll {
                    delta: scroll_amount(delta),
                });
            }
            WindowEvent::RedrawRequested => {
                self.render_frame()?;
                if self.max_frames.is_some_and(|max| self.frames >= max) {
                    log::info!("Rendered {} frames, exiting", self.frames);
                    elwt.exit();
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn handle_device_event(&mut self, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.pointer.0 += dx;
            self.pointer.1 += dy;
            self.feed(InputEvent::PointerMoved {
                x: self.pointer.0,
                y: self.pointer.1,
            });
        }
    }

    fn about_to_wait(&mut self) {
        self.input.apply_held_keys(&mut self.scene);
        self.window.request_redraw();
    }

    fn render_frame(&mut self) -> Result<(), BackendError> {
        let playing = self.input.is_playing();
        self.window.set_pointer_captured(playing);

        if playing {
            self.egui.clear();
        } else {
            let mut settings = self.engine.settings();
            self.egui.fit_to_width(self.engine.backend().surface_size().0);
            self.egui.begin_frame(self.window.window());
            let actions = self
                .ui
                .show(self.egui.context(), &mut self.scene, &mut settings);
            self.egui.end_frame(self.window.window());

            self.engine.set_settings(settings);
            self.apply_ui_actions(actions);
        }

        let report = match self
            .engine
            .render_scene(&mut self.scene, self.input.is_playing())
        {
            Ok(report) => report,
            Err(e) if e.is_transient() => {
                log::debug!("Skipping frame: {}", e);
                if !matches!(e, BackendError::Timeout) {
                    let (width, height) = self.window.dimensions();
                    self.engine.resize(width, height);
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.egui.render(
            self.engine.backend_mut(),
            report.frame.width,
            report.frame.height,
        );
        self.engine.end_frame()?;
        self.frames += 1;
        Ok(())
    }
}

/// Open the window and run the viewer until it is closed
pub fn run(config: ViewerConfig) -> ViewerResult<()> {
    let event_loop = EventLoop::new()?;
    let mut viewer = Viewer::new(&event_loop, config)?;
    let mut fatal = None;

    log::info!(
        "Viewer ready on {}: {} objects, press Enter to fly, Escape to edit",
        viewer.engine.backend().adapter_summary(),
        viewer.scene().len()
    );

    event_loop.run(|event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => {
                if let Err(e) = viewer.handle_window_event(event, elwt) {
                    log::error!("Fatal render error: {}", e);
                    fatal = Some(e);
                    elwt.exit();
                }
            }
            Event::DeviceEvent { event, .. } => viewer.handle_device_event(event),
            Event::AboutToWait => viewer.about_to_wait(),
            _ => {}
        }
    })?;

    match fatal {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
