pub mod capability;
pub mod context;
pub mod debug;
pub mod device;
pub mod error;
pub mod headless;
pub mod query;
pub mod state;
pub mod structs;
#[cfg(feature = "glint-winit")]
pub mod winit_window;

pub use capability::*;
pub use context::*;
pub use debug::*;
pub use device::*;
pub use error::*;
pub use headless::*;
pub use query::*;
pub use state::*;
pub use structs::*;
#[cfg(feature = "glint-winit")]
pub use winit_window::*;
