use std::any::Any;

use super::error::Result;
use super::structs::{
    BindingPoint, ClearMask, ContextConfig, DriverInfo, ErrorCode, QueryTarget, Surface,
    SurfaceInfo,
};

/// Numeric value of the buffer-binding constant every context version
/// defines.
pub const GL_ARRAY_BUFFER: u32 = 0x8892;
/// Numeric value of the 3D-texture-binding constant only version 2
/// contexts define.
pub const GL_TEXTURE_BINDING_3D: u32 = 0x806A;

pub const CONST_ARRAY_BUFFER: &str = "ARRAY_BUFFER";
pub const CONST_TEXTURE_BINDING_3D: &str = "TEXTURE_BINDING_3D";
/// Limit constant the debug layer probes to validate texture units.
pub const CONST_MAX_COMBINED_TEXTURE_IMAGE_UNITS: &str = "MAX_COMBINED_TEXTURE_IMAGE_UNITS";

/// Capability surface every context handle exposes, however deeply it is
/// wrapped.
///
/// The prober never assumes a concrete type behind this trait: debug and
/// state-tracking wrappers, mocks, and offscreen stand-ins all answer the
/// same constant lookups. The namespace is an open set of API constant
/// names, so foreign handles can define (or omit) version-defining
/// constants without inheriting anything from this crate.
pub trait Capabilities {
    /// Numeric value of a named API constant, if this handle defines it.
    fn constant(&self, name: &str) -> Option<u32>;

    fn as_any(&self) -> &dyn Any;
}

/// Identifier of a device query object.
pub type QueryId = u32;

/// Minimal mutating-call surface of a context device.
///
/// This is the seam the decorators preserve: [`StateTracker`] and
/// [`DebugDevice`] both implement it over an inner boxed device and can
/// be stacked in either order. Binding mutations are the cacheable calls;
/// everything else passes through wrappers untouched apart from debug
/// validation and logging.
///
/// [`StateTracker`]: crate::gl::state::StateTracker
/// [`DebugDevice`]: crate::gl::debug::DebugDevice
pub trait GlDevice: Capabilities {
    fn bind(&mut self, point: BindingPoint, resource: u32) -> Result<()>;

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()>;

    fn clear(&mut self, mask: ClearMask) -> Result<()>;

    fn create_query(&mut self) -> Result<QueryId>;

    fn begin_query(&mut self, target: QueryTarget, query: QueryId) -> Result<()>;

    fn end_query(&mut self, target: QueryTarget) -> Result<()>;

    /// Non-blocking availability check for an issued query.
    fn query_available(&mut self, query: QueryId) -> Result<bool>;

    fn query_result(&mut self, query: QueryId) -> Result<u64>;

    fn delete_query(&mut self, query: QueryId) -> Result<()>;

    /// Read and clear the sticky error flag.
    fn error_flag(&mut self) -> ErrorCode;

    fn driver_info(&self) -> Option<DriverInfo> {
        None
    }

    /// Last-known binding for `point`, if a state-tracking wrapper in the
    /// stack caches it. Raw devices answer `None`.
    fn cached_binding(&self, point: BindingPoint) -> Option<u32> {
        let _ = point;
        None
    }
}

/// Surface lookup and creation, used only during context creation.
pub trait SurfaceProvider {
    fn resolve_surface(&mut self, id: &str) -> Option<Surface>;

    fn create_default_surface(&mut self, info: &SurfaceInfo) -> Result<Surface>;
}

/// Environment a context is created against.
///
/// One creation path per backend; each returns `Ok(Some(device))` on
/// success, `Ok(None)` when the call nominally succeeds without producing
/// a handle, and `Err` when construction itself fails. Version tiering
/// (`want_v2`/`allow_v1`) is the backend's job; the factory never retries
/// a failed creation with different parameters.
pub trait Platform {
    /// The surface provider of an interactive environment, or `None` for
    /// a headless one.
    fn surfaces(&mut self) -> Option<&mut dyn SurfaceProvider>;

    fn create_interactive_context(
        &mut self,
        surface: &Surface,
        config: &ContextConfig,
    ) -> Result<Option<Box<dyn GlDevice>>>;

    fn create_headless_context(
        &mut self,
        config: &ContextConfig,
    ) -> Result<Option<Box<dyn GlDevice>>>;
}
