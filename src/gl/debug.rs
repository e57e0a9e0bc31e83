//! Diagnostic instrumentation of a context device.
//!
//! [`DebugDevice`] trades throughput for diagnosability: every call is
//! argument-checked before it is forwarded, the device's sticky error
//! flag is inspected after it returns, and the call is logged with its
//! arguments. On success the wrapper is transparent; the entry points of
//! the inner device stay available and semantically identical.

use std::any::Any;

use log::Level;

use super::device::{
    Capabilities, GlDevice, QueryId, CONST_MAX_COMBINED_TEXTURE_IMAGE_UNITS,
};
use super::error::{ContextError, Result};
use super::structs::{BindingPoint, ClearMask, DriverInfo, ErrorCode, QueryTarget};

/// Options for [`DebugDevice::wrap`].
#[derive(Clone, Copy, Debug)]
pub struct DebugOptions {
    /// Verbosity the per-call log lines are emitted at.
    pub level: Level,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self { level: Level::Debug }
    }
}

pub struct DebugDevice {
    inner: Box<dyn GlDevice>,
    level: Level,
    /// Targets with a begun, not-yet-ended query, for pairing checks.
    active_queries: Vec<QueryTarget>,
}

impl DebugDevice {
    pub fn wrap(inner: Box<dyn GlDevice>, options: DebugOptions) -> Box<dyn GlDevice> {
        Box::new(Self {
            inner,
            level: options.level,
            active_queries: Vec::new(),
        })
    }

    /// Surface a sticky error left behind by `call` as a validation
    /// failure.
    fn check_error_flag(&mut self, call: &str) -> Result<()> {
        let code = self.inner.error_flag();
        if code == ErrorCode::NoError {
            Ok(())
        } else {
            Err(ContextError::Validation(format!(
                "{} left the device error flag set to {:?}",
                call, code
            )))
        }
    }

    fn trace(&self, line: String) {
        log::log!(self.level, "{}", line);
    }
}

impl Capabilities for DebugDevice {
    fn constant(&self, name: &str) -> Option<u32> {
        self.inner.constant(name)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl GlDevice for DebugDevice {
    fn bind(&mut self, point: BindingPoint, resource: u32) -> Result<()> {
        self.trace(format!("bind({:?}, {})", point, resource));
        if let BindingPoint::Texture { unit } = point {
            // Validate against the device limit when the device reports
            // one; a device without the constant degrades to pass-through.
            if let Some(max) = self.inner.constant(CONST_MAX_COMBINED_TEXTURE_IMAGE_UNITS) {
                if unit >= max {
                    return Err(ContextError::Validation(format!(
                        "bind: texture unit {} exceeds device limit {}",
                        unit, max
                    )));
                }
            }
        }
        self.inner.bind(point, resource)?;
        self.check_error_flag("bind")
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        self.trace(format!("viewport({}, {}, {}, {})", x, y, width, height));
        self.inner.viewport(x, y, width, height)?;
        self.check_error_flag("viewport")
    }

    fn clear(&mut self, mask: ClearMask) -> Result<()> {
        self.trace(format!("clear({:?})", mask));
        if mask.is_empty() {
            return Err(ContextError::Validation(
                "clear: empty buffer mask".to_string(),
            ));
        }
        self.inner.clear(mask)?;
        self.check_error_flag("clear")
    }

    fn create_query(&mut self) -> Result<QueryId> {
        self.trace("create_query()".to_string());
        let query = self.inner.create_query()?;
        self.check_error_flag("create_query")?;
        Ok(query)
    }

    fn begin_query(&mut self, target: QueryTarget, query: QueryId) -> Result<()> {
        self.trace(format!("begin_query({:?}, {})", target, query));
        if self.active_queries.contains(&target) {
            return Err(ContextError::Validation(format!(
                "begin_query: a {:?} query is already active",
                target
            )));
        }
        self.inner.begin_query(target, query)?;
        self.check_error_flag("begin_query")?;
        self.active_queries.push(target);
        Ok(())
    }

    fn end_query(&mut self, target: QueryTarget) -> Result<()> {
        self.trace(format!("end_query({:?})", target));
        let Some(index) = self.active_queries.iter().position(|t| *t == target) else {
            return Err(ContextError::Validation(format!(
                "end_query: no active {:?} query",
                target
            )));
        };
        self.inner.end_query(target)?;
        self.check_error_flag("end_query")?;
        self.active_queries.swap_remove(index);
        Ok(())
    }

    fn query_available(&mut self, query: QueryId) -> Result<bool> {
        let available = self.inner.query_available(query)?;
        self.check_error_flag("query_available")?;
        Ok(available)
    }

    fn query_result(&mut self, query: QueryId) -> Result<u64> {
        self.trace(format!("query_result({})", query));
        let value = self.inner.query_result(query)?;
        self.check_error_flag("query_result")?;
        Ok(value)
    }

    fn delete_query(&mut self, query: QueryId) -> Result<()> {
        self.trace(format!("delete_query({})", query));
        self.inner.delete_query(query)?;
        self.check_error_flag("delete_query")
    }

    fn error_flag(&mut self) -> ErrorCode {
        self.inner.error_flag()
    }

    fn driver_info(&self) -> Option<DriverInfo> {
        self.inner.driver_info()
    }

    fn cached_binding(&self, point: BindingPoint) -> Option<u32> {
        self.inner.cached_binding(point)
    }
}
