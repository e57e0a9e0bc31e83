#![allow(dead_code)]

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glint::*;

/// Scripted device standing in for a real graphics binding.
///
/// Calls are recorded into a shared log the test inspects after the
/// device disappears behind the factory's wrappers. Query availability
/// follows `polls`: the number of availability checks a query stays
/// pending for, or a negative count to fail the check itself. Results
/// are `100 + query id`.
pub struct FakeDevice {
    version: Version,
    calls: Rc<RefCell<Vec<String>>>,
    sticky: Rc<RefCell<Option<ErrorCode>>>,
    polls: Rc<RefCell<HashMap<QueryId, i32>>>,
    next_query: QueryId,
}

impl FakeDevice {
    pub fn new(
        version: Version,
        calls: Rc<RefCell<Vec<String>>>,
        sticky: Rc<RefCell<Option<ErrorCode>>>,
        polls: Rc<RefCell<HashMap<QueryId, i32>>>,
    ) -> Self {
        Self {
            version,
            calls,
            sticky,
            polls,
            next_query: 1,
        }
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Capabilities for FakeDevice {
    fn constant(&self, name: &str) -> Option<u32> {
        match name {
            CONST_ARRAY_BUFFER => Some(GL_ARRAY_BUFFER),
            CONST_TEXTURE_BINDING_3D if self.version == Version::V2 => {
                Some(GL_TEXTURE_BINDING_3D)
            }
            CONST_MAX_COMBINED_TEXTURE_IMAGE_UNITS => Some(32),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl GlDevice for FakeDevice {
    fn bind(&mut self, point: BindingPoint, resource: u32) -> Result<()> {
        self.record(format!("bind {:?} {}", point, resource));
        Ok(())
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        self.record(format!("viewport {} {} {} {}", x, y, width, height));
        Ok(())
    }

    fn clear(&mut self, mask: ClearMask) -> Result<()> {
        self.record(format!("clear {:?}", mask));
        Ok(())
    }

    fn create_query(&mut self) -> Result<QueryId> {
        let query = self.next_query;
        self.next_query += 1;
        self.record(format!("create_query {}", query));
        Ok(query)
    }

    fn begin_query(&mut self, target: QueryTarget, query: QueryId) -> Result<()> {
        self.record(format!("begin_query {:?} {}", target, query));
        Ok(())
    }

    fn end_query(&mut self, target: QueryTarget) -> Result<()> {
        self.record(format!("end_query {:?}", target));
        Ok(())
    }

    fn query_available(&mut self, query: QueryId) -> Result<bool> {
        let mut polls = self.polls.borrow_mut();
        match polls.get_mut(&query) {
            None => Ok(true),
            Some(remaining) if *remaining < 0 => Err(ContextError::ContextLost),
            Some(remaining) if *remaining == 0 => Ok(true),
            Some(remaining) => {
                *remaining -= 1;
                Ok(false)
            }
        }
    }

    fn query_result(&mut self, query: QueryId) -> Result<u64> {
        Ok(100 + u64::from(query))
    }

    fn delete_query(&mut self, query: QueryId) -> Result<()> {
        self.record(format!("delete_query {}", query));
        Ok(())
    }

    fn error_flag(&mut self) -> ErrorCode {
        self.sticky.borrow_mut().take().unwrap_or_default()
    }

    fn driver_info(&self) -> Option<DriverInfo> {
        Some(DriverInfo {
            vendor: "fake".to_string(),
            renderer: "scripted".to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeSurfaces {
    pub known: HashMap<String, Surface>,
    pub created: Vec<SurfaceInfo>,
    pub fail_create: bool,
}

impl SurfaceProvider for FakeSurfaces {
    fn resolve_surface(&mut self, id: &str) -> Option<Surface> {
        self.known.get(id).cloned()
    }

    fn create_default_surface(&mut self, info: &SurfaceInfo) -> Result<Surface> {
        if self.fail_create {
            return Err(ContextError::NoSurface("display unavailable".to_string()));
        }
        self.created.push(info.clone());
        Ok(Surface {
            id: info.id.clone(),
            width: info.width,
            height: info.height,
            raw: None,
        })
    }
}

/// What the platform's creation path should do.
pub enum Outcome {
    Device,
    NoHandle,
    Fail(&'static str),
}

pub struct FakePlatform {
    pub interactive: bool,
    pub outcome: Outcome,
    pub device_version: Version,
    pub provider: FakeSurfaces,
    pub calls: Rc<RefCell<Vec<String>>>,
    pub sticky: Rc<RefCell<Option<ErrorCode>>>,
    pub polls: Rc<RefCell<HashMap<QueryId, i32>>>,
    pub last_config: Option<ContextConfig>,
}

impl FakePlatform {
    pub fn headless() -> Self {
        Self::new(false)
    }

    pub fn interactive() -> Self {
        Self::new(true)
    }

    fn new(interactive: bool) -> Self {
        Self {
            interactive,
            outcome: Outcome::Device,
            device_version: Version::V2,
            provider: FakeSurfaces::default(),
            calls: Rc::new(RefCell::new(Vec::new())),
            sticky: Rc::new(RefCell::new(None)),
            polls: Rc::new(RefCell::new(HashMap::new())),
            last_config: None,
        }
    }

    fn create(&mut self, config: &ContextConfig) -> Result<Option<Box<dyn GlDevice>>> {
        self.last_config = Some(config.clone());
        match self.outcome {
            Outcome::Device => Ok(Some(Box::new(FakeDevice::new(
                self.device_version,
                self.calls.clone(),
                self.sticky.clone(),
                self.polls.clone(),
            )))),
            Outcome::NoHandle => Ok(None),
            Outcome::Fail(message) => Err(ContextError::CreationFailed(message.to_string())),
        }
    }
}

impl Platform for FakePlatform {
    fn surfaces(&mut self) -> Option<&mut dyn SurfaceProvider> {
        if self.interactive {
            Some(&mut self.provider)
        } else {
            None
        }
    }

    fn create_interactive_context(
        &mut self,
        _surface: &Surface,
        config: &ContextConfig,
    ) -> Result<Option<Box<dyn GlDevice>>> {
        self.calls.borrow_mut().push("create interactive".to_string());
        self.create(config)
    }

    fn create_headless_context(
        &mut self,
        config: &ContextConfig,
    ) -> Result<Option<Box<dyn GlDevice>>> {
        self.calls.borrow_mut().push("create headless".to_string());
        self.create(config)
    }
}

/// Count the device-level calls whose log line starts with `prefix`.
pub fn calls_with_prefix(calls: &Rc<RefCell<Vec<String>>>, prefix: &str) -> usize {
    calls
        .borrow()
        .iter()
        .filter(|line| line.starts_with(prefix))
        .count()
}
