//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`ProxyError`] covers two very different kinds of failure:
//! - **Allocation failure**: the texture provider could not satisfy a request.
//!   This is the only "normal" runtime outcome and may be retried later.
//! - **Invariant violations**: producer ordering broken, a realized surface larger
//!   than its worst-case estimate, a surface with no usable capability. These are
//!   programming errors in the surrounding pipeline and are reported only while
//!   [`ValidationMode::Strict`](crate::settings::ValidationMode::Strict) is active
//!   (capability mismatches are always reported).
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_surface::errors::{ProxyError, Result};
//!
//! match graph.instantiate(proxy, &mut provider) {
//!     Ok(surface) => { /* record GPU work */ }
//!     Err(e) if e.is_recoverable() => { /* free budgeted resources and retry */ }
//!     Err(e) => panic!("render graph bug: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::graph::OpListId;
use crate::proxy::ProxyId;

/// The main error type for surface proxies and the proxy graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    // ========================================================================
    // Recoverable
    // ========================================================================
    /// The texture provider refused or could not satisfy the allocation.
    #[error("Surface allocation failed: {width}x{height} {format:?}")]
    AllocationFailed {
        /// Requested width (after any approximate-fit rounding)
        width: u32,
        /// Requested height (after any approximate-fit rounding)
        height: u32,
        /// Requested pixel format
        format: wgpu::TextureFormat,
    },

    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// The surface descriptor is malformed (zero extent, zero samples, ...).
    #[error("Invalid surface descriptor: {0}")]
    InvalidDescriptor(String),

    /// A surface or op list does not support the capability an operation needs.
    #[error("Capability mismatch: {0}")]
    CapabilityMismatch(String),

    /// Initial pixel data does not cover the described surface.
    #[error("Invalid pixel data: {0}")]
    InvalidPixelData(String),

    // ========================================================================
    // Invariant Violations (strict validation)
    // ========================================================================
    /// A new producer was registered while the previous one was still open.
    #[error("Proxy {proxy:?}: previous producer {previous:?} is still open")]
    ProducerStillOpen {
        /// The proxy whose producer was being replaced
        proxy: ProxyId,
        /// The producer that had not been closed yet
        previous: OpListId,
    },

    /// The realized surface is larger than the previously reported worst case.
    #[error("Proxy {proxy:?}: realized size {actual} bytes exceeds worst-case estimate {estimate} bytes")]
    SizeEstimateExceeded {
        /// The proxy being instantiated
        proxy: ProxyId,
        /// Footprint reported by the realized surface
        actual: u64,
        /// Cached worst-case estimate
        estimate: u64,
    },

    /// A registry association points at something inconsistent.
    #[error("Graph validation failed: {0}")]
    Validation(String),

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// The proxy handle is stale or was never issued by this graph.
    #[error("Unknown proxy handle")]
    UnknownProxy,

    /// The op-list handle is stale or was never issued by this graph.
    #[error("Unknown op list handle")]
    UnknownOpList,

    /// An op was recorded into an op list that has already been closed.
    #[error("Op list {0:?} is closed")]
    OpListClosed(OpListId),
}

impl ProxyError {
    /// Returns `true` for failures the caller may retry (allocation failure only).
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }

    /// Build a [`ProxyError::InvalidDescriptor`] value.
    pub fn invalid_descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// Build a [`ProxyError::CapabilityMismatch`] value.
    pub fn capability_mismatch(msg: impl Into<String>) -> Self {
        Self::CapabilityMismatch(msg.into())
    }
}

/// Alias for `Result<T, ProxyError>`.
pub type Result<T> = std::result::Result<T, ProxyError>;
