pub mod gl;
pub mod utils;

pub use gl::*;
