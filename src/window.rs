//! Window management using winit

use std::sync::Arc;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::WindowEvent,
    event_loop::EventLoopWindowTarget,
    window::{CursorGrabMode, Fullscreen, Window as WinitWindow, WindowBuilder},
};

use crate::error::ViewerResult;

/// Windowed placement restored when leaving fullscreen
pub const WINDOWED_POSITION: PhysicalPosition<i32> = PhysicalPosition::new(100, 100);

/// Wrapper around winit window with additional state
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
    windowed_size: PhysicalSize<u32>,
    close_requested: bool,
    pointer_captured: bool,
}

impl Window {
    /// Create a new window with the given title and dimensions
    pub fn new(
        target: &EventLoopWindowTarget<()>,
        title: &str,
        width: u32,
        height: u32,
        fullscreen: bool,
    ) -> ViewerResult<Self> {
        let windowed_size = PhysicalSize::new(width.max(1), height.max(1));
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(windowed_size)
                .with_position(WINDOWED_POSITION)
                .with_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)))
                .build(target)?,
        );

        let size = window.inner_size();
        Ok(Self {
            window,
            width: size.width,
            height: size.height,
            windowed_size,
            close_requested: false,
            pointer_captured: false,
        })
    }

    /// Get the raw window for backend initialization
    pub fn window(&self) -> &WinitWindow {
        &self.window
    }

    /// Get arc reference to window
    pub fn window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    /// Get current window dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check if close was requested
    pub fn should_close(&self) -> bool {
        self.close_requested
    }

    /// Handle window events
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                self.width = size.width;
                self.height = size.height;
            }
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            _ => {}
        }
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn is_fullscreen(&self) -> bool {
        self.window.fullscreen().is_some()
    }

    /// Switch between borderless fullscreen and the initial windowed placement
    pub fn toggle_fullscreen(&mut self) {
        if self.is_fullscreen() {
            self.window.set_fullscreen(None);
            let _ = self.window.request_inner_size(self.windowed_size);
            self.window.set_outer_position(WINDOWED_POSITION);
            log::info!(
                "Leaving fullscreen ({}x{})",
                self.windowed_size.width,
                self.windowed_size.height
            );
        } else {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            log::info!("Entering fullscreen");
        }
    }

    /// Capture and hide the pointer, or release and show it
    pub fn set_pointer_captured(&mut self, captured: bool) {
        if self.pointer_captured == captured {
            return;
        }

        if captured {
            // Not every platform supports both grab modes
            let grabbed = self
                .window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked));
            if let Err(e) = grabbed {
                log::warn!("Could not grab the pointer: {}", e);
            }
        } else if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Could not release the pointer: {}", e);
        }

        self.window.set_cursor_visible(!captured);
        self.pointer_captured = captured;
    }
}
