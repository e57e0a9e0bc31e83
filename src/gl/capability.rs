//! Version classification of opaque context handles.
//!
//! Identity checks against concrete device types break as soon as a
//! handle is wrapped by debug instrumentation or replaced by an offscreen
//! stand-in, so classification runs in two tiers: a structural check
//! against the crate's own context type first, then a duck-typed probe of
//! version-defining API constants that every wrapper forwards.

use super::context::Context;
use super::device::{
    Capabilities, CONST_ARRAY_BUFFER, CONST_TEXTURE_BINDING_3D, GL_ARRAY_BUFFER,
    GL_TEXTURE_BINDING_3D,
};
use super::error::{ContextError, Result};
use super::structs::Version;

/// Outcome of [`classify`]. Not mutually exclusive: a version 2 handle
/// satisfies the version 1 probe as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub v1: bool,
    pub v2: bool,
}

/// Classify a handle by feature tier.
pub fn classify<H: Capabilities + ?Sized>(handle: &H) -> Classification {
    // Structural tier: contexts built by this crate carry a version tag.
    if let Some(ctx) = handle.as_any().downcast_ref::<Context>() {
        return Classification {
            v1: true,
            v2: ctx.version() == Version::V2,
        };
    }
    // Duck-typed tier: wrappers, mocks and foreign handles answer for the
    // constants their interface defines.
    let v2 = handle.constant(CONST_TEXTURE_BINDING_3D) == Some(GL_TEXTURE_BINDING_3D);
    let v1 = v2 || handle.constant(CONST_ARRAY_BUFFER) == Some(GL_ARRAY_BUFFER);
    Classification { v1, v2 }
}

pub fn is_version1<H: Capabilities + ?Sized>(handle: &H) -> bool {
    classify(handle).v1
}

pub fn is_version2<H: Capabilities + ?Sized>(handle: &H) -> bool {
    classify(handle).v2
}

/// Fail with [`ContextError::InvalidContext`] unless `handle` is a
/// context of any version.
pub fn assert_version1<H: Capabilities + ?Sized>(handle: &H) -> Result<()> {
    if is_version1(handle) {
        Ok(())
    } else {
        Err(ContextError::InvalidContext)
    }
}

/// Fail with [`ContextError::RequiresVersion2`] unless `handle` is a
/// version 2 context.
pub fn assert_version2<H: Capabilities + ?Sized>(handle: &H) -> Result<()> {
    if is_version2(handle) {
        Ok(())
    } else {
        Err(ContextError::RequiresVersion2)
    }
}
