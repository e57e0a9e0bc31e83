//! Built-in offscreen backend for environments without a GPU.
//!
//! [`HeadlessDevice`] keeps real device semantics in process memory:
//! bindings are recorded, invalid calls set the sticky error flag
//! instead of failing the call, and queries complete after a
//! configurable number of polls. Query results report the number of
//! mutating calls recorded between `begin` and `end`, which makes the
//! completion pipeline observable without hardware.

use std::any::Any;
use std::collections::HashMap;

use super::device::{
    Capabilities, GlDevice, Platform, QueryId, SurfaceProvider, CONST_ARRAY_BUFFER,
    CONST_MAX_COMBINED_TEXTURE_IMAGE_UNITS, CONST_TEXTURE_BINDING_3D, GL_ARRAY_BUFFER,
    GL_TEXTURE_BINDING_3D,
};
use super::error::{ContextError, Result};
use super::structs::{
    BindingPoint, ClearMask, ContextConfig, DriverInfo, ErrorCode, QueryTarget, Surface, Version,
};

const MAX_TEXTURE_UNITS: u32 = 32;

struct SimQuery {
    begun_at: u64,
    value: u64,
    ended: bool,
    polls_left: u32,
}

pub struct HeadlessDevice {
    version: Version,
    size: [u32; 2],
    bindings: HashMap<BindingPoint, u32>,
    sticky: ErrorCode,
    queries: HashMap<QueryId, SimQuery>,
    active: HashMap<QueryTarget, QueryId>,
    next_query: QueryId,
    query_latency: u32,
    work_counter: u64,
}

impl HeadlessDevice {
    pub fn new(version: Version, size: [u32; 2], query_latency: u32) -> Self {
        Self {
            version,
            size,
            bindings: HashMap::new(),
            sticky: ErrorCode::NoError,
            queries: HashMap::new(),
            active: HashMap::new(),
            next_query: 1,
            query_latency,
            work_counter: 0,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Last bound resource for `point`, as the device itself saw it.
    pub fn binding(&self, point: BindingPoint) -> Option<u32> {
        self.bindings.get(&point).copied()
    }

    /// Raise the sticky flag unless an earlier error is still unread.
    fn raise_error(&mut self, code: ErrorCode) {
        if self.sticky == ErrorCode::NoError {
            self.sticky = code;
        }
    }
}

impl Capabilities for HeadlessDevice {
    fn constant(&self, name: &str) -> Option<u32> {
        match name {
            CONST_ARRAY_BUFFER => Some(GL_ARRAY_BUFFER),
            CONST_TEXTURE_BINDING_3D if self.version == Version::V2 => {
                Some(GL_TEXTURE_BINDING_3D)
            }
            CONST_MAX_COMBINED_TEXTURE_IMAGE_UNITS => Some(MAX_TEXTURE_UNITS),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl GlDevice for HeadlessDevice {
    fn bind(&mut self, point: BindingPoint, resource: u32) -> Result<()> {
        if let BindingPoint::Texture { unit } = point {
            if unit >= MAX_TEXTURE_UNITS {
                // The call itself succeeds; the flag records the misuse.
                self.raise_error(ErrorCode::InvalidValue);
                return Ok(());
            }
        }
        self.bindings.insert(point, resource);
        self.work_counter += 1;
        Ok(())
    }

    fn viewport(&mut self, _x: i32, _y: i32, _width: u32, _height: u32) -> Result<()> {
        self.work_counter += 1;
        Ok(())
    }

    fn clear(&mut self, mask: ClearMask) -> Result<()> {
        if mask.is_empty() {
            self.raise_error(ErrorCode::InvalidValue);
            return Ok(());
        }
        self.work_counter += 1;
        Ok(())
    }

    fn create_query(&mut self) -> Result<QueryId> {
        let query = self.next_query;
        self.next_query += 1;
        self.queries.insert(
            query,
            SimQuery {
                begun_at: 0,
                value: 0,
                ended: false,
                polls_left: 0,
            },
        );
        Ok(query)
    }

    fn begin_query(&mut self, target: QueryTarget, query: QueryId) -> Result<()> {
        if self.active.contains_key(&target) || !self.queries.contains_key(&query) {
            self.raise_error(ErrorCode::InvalidOperation);
            return Ok(());
        }
        let begun_at = self.work_counter;
        if let Some(entry) = self.queries.get_mut(&query) {
            entry.begun_at = begun_at;
        }
        self.active.insert(target, query);
        Ok(())
    }

    fn end_query(&mut self, target: QueryTarget) -> Result<()> {
        let Some(query) = self.active.remove(&target) else {
            self.raise_error(ErrorCode::InvalidOperation);
            return Ok(());
        };
        let work_counter = self.work_counter;
        let query_latency = self.query_latency;
        if let Some(entry) = self.queries.get_mut(&query) {
            entry.value = work_counter - entry.begun_at;
            entry.ended = true;
            entry.polls_left = query_latency;
        }
        Ok(())
    }

    fn query_available(&mut self, query: QueryId) -> Result<bool> {
        let entry = self
            .queries
            .get_mut(&query)
            .ok_or(ContextError::Api(ErrorCode::InvalidOperation))?;
        if !entry.ended {
            return Ok(false);
        }
        if entry.polls_left > 0 {
            entry.polls_left -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn query_result(&mut self, query: QueryId) -> Result<u64> {
        let entry = self
            .queries
            .get(&query)
            .ok_or(ContextError::Api(ErrorCode::InvalidOperation))?;
        if !entry.ended {
            return Err(ContextError::Api(ErrorCode::InvalidOperation));
        }
        Ok(entry.value)
    }

    fn delete_query(&mut self, query: QueryId) -> Result<()> {
        self.queries.remove(&query);
        self.active.retain(|_, active| *active != query);
        Ok(())
    }

    fn error_flag(&mut self) -> ErrorCode {
        std::mem::take(&mut self.sticky)
    }

    fn driver_info(&self) -> Option<DriverInfo> {
        Some(DriverInfo {
            vendor: "glint".to_string(),
            renderer: "headless".to_string(),
        })
    }
}

/// Platform producing [`HeadlessDevice`] contexts.
pub struct HeadlessPlatform {
    /// Whether the simulated device can offer a version 2 context.
    pub supports_v2: bool,
    /// Polls an ended query stays unavailable for, to exercise the
    /// completion protocol.
    pub query_latency: u32,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self {
            supports_v2: true,
            query_latency: 0,
        }
    }
}

impl Platform for HeadlessPlatform {
    fn surfaces(&mut self) -> Option<&mut dyn SurfaceProvider> {
        None
    }

    fn create_interactive_context(
        &mut self,
        _surface: &Surface,
        _config: &ContextConfig,
    ) -> Result<Option<Box<dyn GlDevice>>> {
        Err(ContextError::Unimplemented(
            "headless platform cannot create interactive contexts",
        ))
    }

    fn create_headless_context(
        &mut self,
        config: &ContextConfig,
    ) -> Result<Option<Box<dyn GlDevice>>> {
        // Version tiering happens here, never in the factory: try the
        // requested tier, fall back only where the options permit.
        let version = if config.want_v2 && self.supports_v2 {
            Version::V2
        } else if config.allow_v1 {
            Version::V1
        } else if config.want_v2 {
            return Err(ContextError::CreationFailed(
                "version 2 context unavailable and version 1 fallback disabled".to_string(),
            ));
        } else {
            return Err(ContextError::CreationFailed(
                "no context version permitted by the creation options".to_string(),
            ));
        };
        Ok(Some(Box::new(HeadlessDevice::new(
            version,
            [config.width, config.height],
            self.query_latency,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> HeadlessDevice {
        HeadlessDevice::new(Version::V2, [4, 4], 0)
    }

    #[test]
    fn tiering_prefers_v2_and_falls_back() {
        let mut platform = HeadlessPlatform::default();
        let config = ContextConfig::default();
        let created = platform.create_headless_context(&config).unwrap().unwrap();
        assert_eq!(
            created.constant(CONST_TEXTURE_BINDING_3D),
            Some(GL_TEXTURE_BINDING_3D)
        );

        platform.supports_v2 = false;
        let created = platform.create_headless_context(&config).unwrap().unwrap();
        assert_eq!(created.constant(CONST_TEXTURE_BINDING_3D), None);
        assert_eq!(created.constant(CONST_ARRAY_BUFFER), Some(GL_ARRAY_BUFFER));
    }

    #[test]
    fn tiering_fails_without_a_permitted_version() {
        let mut platform = HeadlessPlatform {
            supports_v2: false,
            ..Default::default()
        };
        let config = ContextConfig {
            allow_v1: false,
            ..Default::default()
        };
        assert!(matches!(
            platform.create_headless_context(&config),
            Err(ContextError::CreationFailed(_))
        ));
    }

    #[test]
    fn invalid_texture_unit_sets_the_sticky_flag() {
        let mut device = device();
        device.bind(BindingPoint::Texture { unit: 40 }, 1).unwrap();
        assert_eq!(device.error_flag(), ErrorCode::InvalidValue);
        assert_eq!(device.error_flag(), ErrorCode::NoError);
    }

    #[test]
    fn query_reports_work_between_begin_and_end() {
        let mut device = device();
        let query = device.create_query().unwrap();
        device.begin_query(QueryTarget::TimeElapsed, query).unwrap();
        device.bind(BindingPoint::ArrayBuffer, 1).unwrap();
        device.clear(ClearMask::COLOR).unwrap();
        device.end_query(QueryTarget::TimeElapsed).unwrap();

        assert!(device.query_available(query).unwrap());
        assert_eq!(device.query_result(query).unwrap(), 2);
    }

    #[test]
    fn query_latency_delays_availability() {
        let mut device = HeadlessDevice::new(Version::V1, [4, 4], 2);
        let query = device.create_query().unwrap();
        device.begin_query(QueryTarget::AnySamplesPassed, query).unwrap();
        device.end_query(QueryTarget::AnySamplesPassed).unwrap();

        assert!(!device.query_available(query).unwrap());
        assert!(!device.query_available(query).unwrap());
        assert!(device.query_available(query).unwrap());
    }

    #[test]
    fn unended_query_is_never_available() {
        let mut device = device();
        let query = device.create_query().unwrap();
        device.begin_query(QueryTarget::TimeElapsed, query).unwrap();
        assert!(!device.query_available(query).unwrap());
        assert!(device.query_result(query).is_err());
    }
}
