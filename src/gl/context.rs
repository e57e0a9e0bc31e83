//! Context creation, teardown and the process-wide creation defaults.
//!
//! [`create_context`] is the one entry point both execution environments
//! share: it resolves a surface on interactive platforms, invokes the
//! backend-specific creation path, composes the state-tracking and debug
//! decorators around the raw device and returns one normalized
//! [`Context`]. Teardown is explicit and at-most-once.

use std::any::Any;
use std::sync::{Mutex, OnceLock};

use log::{Level, LevelFilter};

use super::capability::classify;
use super::debug::{DebugDevice, DebugOptions};
use super::device::{Capabilities, GlDevice, Platform, QueryId};
use super::error::{ContextError, Result};
use super::query::{Delivery, QueryOutcome, QueryRegistry, QuerySlot};
use super::state::{StateTracker, TrackerOptions};
use super::structs::{
    BackendKind, ContextConfig, ContextOptions, FailureMode, QueryTarget, Surface, SurfaceInfo,
    SurfaceSpec, Version,
};
use crate::utils::logging;

/// Environment variable that force-enables debug instrumentation.
pub const DEBUG_ENV_VAR: &str = "GLINT_DEBUG";

const DEFAULT_SURFACE_ID: &str = "glint-surface";

/// Wrapper that lets the defaults singleton be a valid `Sync` static.
///
/// `ContextConfig` can carry a `RawWindowHandle`, which is not `Send`, so
/// `Mutex<ContextConfig>` is not auto-`Sync`. The process-wide defaults are
/// only ever touched from the single render-control thread (see the
/// single-threaded cooperative model in the spec), and the `Mutex`
/// serializes the interior mutation regardless.
struct Defaults(Mutex<ContextConfig>);

// SAFETY: access is confined to the single control thread per the crate's
// documented single-threaded contract; the inner Mutex still guards the
// interior mutation.
unsafe impl Sync for Defaults {}
// SAFETY: see above — single-threaded contract; the OnceLock also requires
// the stored value to be `Send`.
unsafe impl Send for Defaults {}

static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

fn defaults() -> &'static Mutex<ContextConfig> {
    &DEFAULTS
        .get_or_init(|| Defaults(Mutex::new(ContextConfig::default())))
        .0
}

/// Change the process-wide context creation defaults.
///
/// Main use case is regression test suites, so the surface size is
/// clamped to 1x1 first; pass explicit `width`/`height` to override the
/// clamp.
pub fn set_context_defaults(opts: &ContextOptions) {
    let mut config = defaults().lock().unwrap_or_else(|poison| poison.into_inner());
    config.width = 1;
    config.height = 1;
    let merged = config.merge(opts);
    *config = merged;
}

/// Restore the factory defaults, for test isolation.
pub fn reset_context_defaults() {
    let mut config = defaults().lock().unwrap_or_else(|poison| poison.into_inner());
    *config = ContextConfig::default();
}

/// Snapshot of the current process-wide defaults.
pub fn context_defaults() -> ContextConfig {
    defaults()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
        .clone()
}

/// Handle for one issued, not-yet-registered query.
#[derive(Debug, Clone, Copy)]
pub struct QueryToken {
    query: QueryId,
    target: QueryTarget,
}

/// A normalized GPU context over an interactive or headless backend.
pub struct Context {
    device: Box<dyn GlDevice>,
    version: Version,
    backend: BackendKind,
    debug: bool,
    surface_size: [u32; 2],
    queries: QueryRegistry,
    destroyed: bool,
}

impl Context {
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn surface_size(&self) -> [u32; 2] {
        self.surface_size
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn device(&self) -> &dyn GlDevice {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> &mut dyn GlDevice {
        self.device.as_mut()
    }

    /// Number of in-flight queries still registered.
    pub fn pending_queries(&self) -> usize {
        self.queries.len()
    }

    /// Issue a query of `target` and start it on the device.
    pub fn begin_query(&mut self, target: QueryTarget) -> Result<QueryToken> {
        if self.destroyed {
            return Err(ContextError::QueryDiscarded);
        }
        let query = self.device.create_query()?;
        if let Err(err) = self.device.begin_query(target, query) {
            let _ = self.device.delete_query(query);
            return Err(err);
        }
        Ok(QueryToken { query, target })
    }

    /// Stop the query and register it for polling; `on_result` fires
    /// exactly once when the result (or the failure that ended the
    /// query) is known.
    pub fn end_query<F>(&mut self, token: QueryToken, on_result: F) -> Result<()>
    where
        F: FnOnce(QueryOutcome) + 'static,
    {
        self.finish_query(token, Delivery::Callback(Box::new(on_result)))
    }

    /// Stop the query and register it for polling; the returned slot is
    /// fulfilled when the result is known.
    pub fn end_query_into(&mut self, token: QueryToken) -> Result<QuerySlot> {
        let slot = QuerySlot::default();
        self.finish_query(token, Delivery::Slot(slot.clone()))?;
        Ok(slot)
    }

    fn finish_query(&mut self, token: QueryToken, delivery: Delivery) -> Result<()> {
        if self.destroyed {
            return Err(ContextError::QueryDiscarded);
        }
        self.device.end_query(token.target)?;
        self.queries.track(token.query, token.target, delivery);
        Ok(())
    }

    /// Run one completion pass over the registered queries. No-op on a
    /// destroyed context.
    pub fn poll_queries(&mut self) {
        if self.destroyed {
            return;
        }
        let Self {
            device, queries, ..
        } = self;
        queries.poll(device.as_mut());
    }

    /// Tear the context down: discard in-flight queries and release the
    /// factory's bookkeeping. Safe to call at most once; repeated calls
    /// are a no-op, not an error. The native handle itself remains the
    /// backend's to free.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        let Self {
            device, queries, ..
        } = self;
        queries.discard_all(device.as_mut());
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("version", &self.version)
            .field("backend", &self.backend)
            .field("debug", &self.debug)
            .field("surface_size", &self.surface_size)
            .field("pending_queries", &self.queries.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl Capabilities for Context {
    fn constant(&self, name: &str) -> Option<u32> {
        self.device.constant(name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::ops::Deref for Context {
    type Target = dyn GlDevice;

    fn deref(&self) -> &Self::Target {
        self.device.as_ref()
    }
}

impl std::ops::DerefMut for Context {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.device.as_mut()
    }
}

/// Create a context on `platform` per `opts` merged over the process
/// defaults.
///
/// Returns `Ok(None)` instead of an error on backend construction
/// failure when `throw_on_failure` is off. A backend call that nominally
/// succeeds but hands back no context returns `Ok(None)` in either mode;
/// only construction failures are throwable.
pub fn create_context(
    platform: &mut dyn Platform,
    opts: &ContextOptions,
) -> Result<Option<Context>> {
    let mut config = context_defaults().merge(opts);
    if std::env::var(DEBUG_ENV_VAR).map(|v| v == "1").unwrap_or(false) {
        config.debug = true;
    }

    let interactive = platform.surfaces().is_some();
    let (created, backend, surface_size) = if interactive {
        let surface = match resolve_surface(platform, &config) {
            Ok(surface) => surface,
            Err(err) => return creation_failure(config.failure_mode(), err.to_string()),
        };
        let size = [surface.width, surface.height];
        (
            platform.create_interactive_context(&surface, &config),
            BackendKind::Interactive,
            size,
        )
    } else {
        (
            platform.create_headless_context(&config),
            BackendKind::Headless,
            [config.width, config.height],
        )
    };

    let device = match created {
        Err(err) => return creation_failure(config.failure_mode(), err.to_string()),
        Ok(None) => {
            // Nominal success without a handle: not throwable, but not
            // silent either.
            log::warn!("context backend returned no handle");
            return Ok(None);
        }
        Ok(Some(device)) => device,
    };

    let classification = classify(device.as_ref());
    let version = if classification.v2 {
        Version::V2
    } else if classification.v1 {
        Version::V1
    } else {
        return creation_failure(
            config.failure_mode(),
            "backend handle fails both capability probes".to_string(),
        );
    };

    let mut device = device;
    if config.manage_state {
        device = StateTracker::wrap(
            device,
            TrackerOptions {
                copy_state: false,
                on_change: Some(Box::new(|point, resource| {
                    log::trace!("bind {:?} -> {}", point, resource);
                })),
            },
        );
    }

    let debug = interactive && config.debug;
    if debug {
        device = DebugDevice::wrap(device, DebugOptions::default());
        // Debug raises the verbosity floor, never lowers it.
        logging::raise_verbosity_floor(LevelFilter::Debug);
    }

    log_context_info(device.as_ref(), version, debug);

    Ok(Some(Context {
        device,
        version,
        backend,
        debug,
        surface_size,
        queries: QueryRegistry::default(),
        destroyed: false,
    }))
}

/// Tear down a context produced by [`create_context`].
pub fn destroy_context(context: &mut Context) {
    context.destroy();
}

/// Check all pending queries of `context` for completion. Expected to be
/// invoked once per frame or tick by the embedding render loop.
pub fn poll_queries(context: &mut Context) {
    context.poll_queries();
}

fn creation_failure(mode: FailureMode, message: String) -> Result<Option<Context>> {
    match mode {
        FailureMode::Throw => Err(ContextError::CreationFailed(message)),
        FailureMode::ReturnNull => {
            log::error!("context creation failed: {}", message);
            Ok(None)
        }
    }
}

fn resolve_surface(platform: &mut dyn Platform, config: &ContextConfig) -> Result<Surface> {
    let surfaces = platform
        .surfaces()
        .ok_or_else(|| ContextError::NoSurface("platform has no surface provider".to_string()))?;
    match &config.surface {
        SurfaceSpec::Handle(surface) => Ok(surface.clone()),
        SurfaceSpec::Id(id) => surfaces
            .resolve_surface(id)
            .ok_or_else(|| ContextError::NoSurface(format!("no surface with id {:?}", id))),
        SurfaceSpec::Auto => surfaces.create_default_surface(&SurfaceInfo {
            id: DEFAULT_SURFACE_ID.to_string(),
            width: config.width,
            height: config.height,
        }),
    }
}

/// One informational line per distinct context configuration.
fn log_context_info(device: &dyn GlDevice, version: Version, debug: bool) {
    let tier = match version {
        Version::V2 => "v2",
        Version::V1 => "v1",
    };
    let driver = device
        .driver_info()
        .map(|info| format!(" ({},{})", info.vendor, info.renderer))
        .unwrap_or_default();
    let debug = if debug { " debug" } else { "" };
    logging::log_once(
        Level::Info,
        &format!("{}{} context{}", tier, debug, driver),
    );
}
