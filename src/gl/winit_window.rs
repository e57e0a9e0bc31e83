//! Winit-backed surface provider for interactive platforms.
//!
//! Owns an event loop and a registry of windows keyed by surface id.
//! Callers compose this with their own graphics binding into a
//! [`Platform`]; the provider only covers the surface half of context
//! creation.
//!
//! [`Platform`]: crate::gl::device::Platform

use std::collections::HashMap;

use raw_window_handle::HasRawWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

use super::device::SurfaceProvider;
use super::error::{ContextError, Result};
use super::structs::{Surface, SurfaceInfo};

pub struct WinitSurfaces {
    event_loop: EventLoop<()>,
    windows: HashMap<String, Window>,
}

impl WinitSurfaces {
    /// Requires a display connection; constructing this in a headless
    /// environment follows winit's own failure behavior.
    pub fn new() -> Self {
        Self {
            event_loop: EventLoop::new(),
            windows: HashMap::new(),
        }
    }

    pub fn event_loop(&self) -> &EventLoop<()> {
        &self.event_loop
    }

    /// Register a window the caller created, making it resolvable by id.
    pub fn insert(&mut self, id: impl Into<String>, window: Window) {
        self.windows.insert(id.into(), window);
    }

    pub fn window(&self, id: &str) -> Option<&Window> {
        self.windows.get(id)
    }
}

impl Default for WinitSurfaces {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceProvider for WinitSurfaces {
    fn resolve_surface(&mut self, id: &str) -> Option<Surface> {
        self.windows.get(id).map(|window| surface_from(id, window))
    }

    fn create_default_surface(&mut self, info: &SurfaceInfo) -> Result<Surface> {
        let window = WindowBuilder::new()
            .with_title(info.id.clone())
            .with_inner_size(PhysicalSize::new(info.width, info.height))
            .with_visible(false)
            .build(&self.event_loop)
            .map_err(|err| ContextError::NoSurface(err.to_string()))?;
        let surface = surface_from(&info.id, &window);
        self.windows.insert(info.id.clone(), window);
        Ok(surface)
    }
}

fn surface_from(id: &str, window: &Window) -> Surface {
    let size = window.inner_size();
    Surface {
        id: id.to_string(),
        width: size.width,
        height: size.height,
        raw: Some(window.raw_window_handle()),
    }
}
