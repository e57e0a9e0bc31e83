use std::collections::HashMap;

use bitflags::bitflags;
use raw_window_handle::RawWindowHandle;

#[cfg(feature = "glint-serde")]
use serde::{Deserialize, Serialize};

/// API feature tier a context supports.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub enum Version {
    V1,
    V2,
}

/// Execution environment a context was created against.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub enum BackendKind {
    Interactive,
    Headless,
}

/// Named slot in device state whose bound resource is cacheable.
///
/// Texture bindings are keyed per unit, so two units never alias one
/// cache entry.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub enum BindingPoint {
    ArrayBuffer,
    ElementArrayBuffer,
    UniformBuffer,
    Framebuffer,
    Renderbuffer,
    VertexArray,
    Program,
    Texture { unit: u32 },
}

/// Kind of asynchronous device query.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub enum QueryTarget {
    TimeElapsed,
    AnySamplesPassed,
    TransformFeedbackPrimitivesWritten,
}

/// Sticky device error codes, read-and-clear semantics.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub enum ErrorCode {
    #[default]
    NoError,
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    OutOfMemory,
    ContextLost,
}

bitflags! {
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        const COLOR   = 0x0000_4000;
        const DEPTH   = 0x0000_0100;
        const STENCIL = 0x0000_0400;
    }
}

/// Vendor and renderer strings reported by the device, when obtainable.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub struct DriverInfo {
    pub vendor: String,
    pub renderer: String,
}

/// A drawable surface resolved by a [`SurfaceProvider`].
///
/// `raw` carries the native window handle for backends that need one;
/// headless surfaces and mocks leave it empty.
///
/// [`SurfaceProvider`]: crate::gl::device::SurfaceProvider
#[derive(Clone, Debug)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub struct Surface {
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[cfg_attr(feature = "glint-serde", serde(skip))]
    pub raw: Option<RawWindowHandle>,
}

/// Parameters for creating a default surface.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub struct SurfaceInfo {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceInfo {
    fn default() -> Self {
        Self {
            id: "glint-surface".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// How the factory obtains a surface on interactive platforms.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub enum SurfaceSpec {
    /// Create a default surface sized per the creation options.
    #[default]
    Auto,
    /// Resolve an existing surface by identifier.
    Id(String),
    /// Use a surface the caller already holds.
    Handle(Surface),
}

/// How construction failures propagate out of the factory.
///
/// Only construction failures are subject to this mode; capability
/// assertions and debug validation always fail as errors.
#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub enum FailureMode {
    /// Fail with a creation error carrying the diagnostic message.
    Throw,
    /// Log the diagnostic and return a null context.
    ReturnNull,
}

/// Caller-supplied overrides for context creation.
///
/// Every field is optional; unset fields fall back to the process-wide
/// defaults (see [`set_context_defaults`]). `backend_options` is handed
/// through to the backend creation call without validation.
///
/// [`set_context_defaults`]: crate::gl::context::set_context_defaults
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub struct ContextOptions {
    /// Attempt to allocate a version 2 context.
    pub want_v2: Option<bool>,
    /// Permit falling back to a version 1 context (false to fail when
    /// version 2 is unavailable).
    pub allow_v1: Option<bool>,
    pub throw_on_failure: Option<bool>,
    pub manage_state: Option<bool>,
    /// Instrument the context, at the expense of performance.
    pub debug: Option<bool>,
    pub surface: Option<SurfaceSpec>,
    /// Offscreen surface width, headless backends only.
    pub width: Option<u32>,
    /// Offscreen surface height, headless backends only.
    pub height: Option<u32>,
    pub backend_options: HashMap<String, String>,
}

/// A creation-options snapshot with every field resolved.
///
/// Produced by merging [`ContextOptions`] over the process defaults;
/// immutable once handed to a backend.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "glint-serde", derive(Serialize, Deserialize))]
pub struct ContextConfig {
    pub want_v2: bool,
    pub allow_v1: bool,
    pub throw_on_failure: bool,
    pub manage_state: bool,
    pub debug: bool,
    pub surface: SurfaceSpec,
    pub width: u32,
    pub height: u32,
    pub backend_options: HashMap<String, String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            want_v2: true,
            allow_v1: true,
            throw_on_failure: true,
            manage_state: true,
            debug: false,
            surface: SurfaceSpec::Auto,
            width: 800,
            height: 600,
            backend_options: HashMap::new(),
        }
    }
}

impl ContextConfig {
    /// The failure mode the `throw_on_failure` option resolves to.
    pub fn failure_mode(&self) -> FailureMode {
        if self.throw_on_failure {
            FailureMode::Throw
        } else {
            FailureMode::ReturnNull
        }
    }

    /// Apply the set fields of `opts` on top of this snapshot.
    pub fn merge(&self, opts: &ContextOptions) -> Self {
        let mut merged = self.clone();
        if let Some(want_v2) = opts.want_v2 {
            merged.want_v2 = want_v2;
        }
        if let Some(allow_v1) = opts.allow_v1 {
            merged.allow_v1 = allow_v1;
        }
        if let Some(throw_on_failure) = opts.throw_on_failure {
            merged.throw_on_failure = throw_on_failure;
        }
        if let Some(manage_state) = opts.manage_state {
            merged.manage_state = manage_state;
        }
        if let Some(debug) = opts.debug {
            merged.debug = debug;
        }
        if let Some(surface) = &opts.surface {
            merged.surface = surface.clone();
        }
        if let Some(width) = opts.width {
            merged.width = width;
        }
        if let Some(height) = opts.height {
            merged.height = height;
        }
        for (key, value) in &opts.backend_options {
            merged
                .backend_options
                .insert(key.clone(), value.clone());
        }
        merged
    }
}
