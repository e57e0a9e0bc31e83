//! Cached shadow of device binding state.
//!
//! Wrapping a device with [`StateTracker`] makes every binding mutation
//! compare against a per-context cache first; an unchanged binding is not
//! forwarded to the device at all. That short-circuit is the point of the
//! layer. The cache only sees mutations routed through the wrapper:
//! callers that mutate the inner device directly get cache divergence,
//! which is out of contract and not detected.

use std::any::Any;
use std::collections::HashMap;

use super::device::{Capabilities, GlDevice, QueryId};
use super::error::Result;
use super::structs::{BindingPoint, ClearMask, DriverInfo, ErrorCode, QueryTarget};

pub type BindingCallback = Box<dyn FnMut(BindingPoint, u32)>;

/// Options for [`StateTracker::wrap`].
#[derive(Default)]
pub struct TrackerOptions {
    /// Forward every binding mutation to the device even on a cache hit.
    pub copy_state: bool,
    /// Invoked once per applied binding change, for observability only.
    pub on_change: Option<BindingCallback>,
}

pub struct StateTracker {
    inner: Box<dyn GlDevice>,
    cache: HashMap<BindingPoint, u32>,
    copy_state: bool,
    on_change: Option<BindingCallback>,
}

impl StateTracker {
    /// Wrap `inner` so binding mutations route through the cache.
    pub fn wrap(inner: Box<dyn GlDevice>, options: TrackerOptions) -> Box<dyn GlDevice> {
        Box::new(Self {
            inner,
            cache: HashMap::new(),
            copy_state: options.copy_state,
            on_change: options.on_change,
        })
    }
}

impl Capabilities for StateTracker {
    fn constant(&self, name: &str) -> Option<u32> {
        self.inner.constant(name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl GlDevice for StateTracker {
    fn bind(&mut self, point: BindingPoint, resource: u32) -> Result<()> {
        if !self.copy_state && self.cache.get(&point) == Some(&resource) {
            return Ok(());
        }
        self.inner.bind(point, resource)?;
        // The cache must never run ahead of the device, so it is updated
        // only once the call went through.
        self.cache.insert(point, resource);
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(point, resource);
        }
        Ok(())
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        self.inner.viewport(x, y, width, height)
    }

    fn clear(&mut self, mask: ClearMask) -> Result<()> {
        self.inner.clear(mask)
    }

    fn create_query(&mut self) -> Result<QueryId> {
        self.inner.create_query()
    }

    fn begin_query(&mut self, target: QueryTarget, query: QueryId) -> Result<()> {
        self.inner.begin_query(target, query)
    }

    fn end_query(&mut self, target: QueryTarget) -> Result<()> {
        self.inner.end_query(target)
    }

    fn query_available(&mut self, query: QueryId) -> Result<bool> {
        self.inner.query_available(query)
    }

    fn query_result(&mut self, query: QueryId) -> Result<u64> {
        self.inner.query_result(query)
    }

    fn delete_query(&mut self, query: QueryId) -> Result<()> {
        self.inner.delete_query(query)
    }

    fn error_flag(&mut self) -> ErrorCode {
        self.inner.error_flag()
    }

    fn driver_info(&self) -> Option<DriverInfo> {
        self.inner.driver_info()
    }

    fn cached_binding(&self, point: BindingPoint) -> Option<u32> {
        self.cache.get(&point).copied()
    }
}
