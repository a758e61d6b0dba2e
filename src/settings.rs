//! Proxy & Provider Settings
//!
//! Configuration passed explicitly to proxy factories, the proxy graph and the
//! pooled texture provider.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_surface::settings::{ProxySettings, ValidationMode};
//!
//! // Default: strict validation (full dependency tracking)
//! let settings = ProxySettings::default();
//!
//! // Single open render pass at a time, producer ordering not checked
//! let settings = ProxySettings {
//!     validation: ValidationMode::Relaxed,
//! };
//! ```

// ---------------------------------------------------------------------------
// ValidationMode
// ---------------------------------------------------------------------------

/// Controls whether internal-consistency invariants are checked.
///
/// | Check                                   | `Strict`          | `Relaxed`       |
/// |-----------------------------------------|-------------------|-----------------|
/// | Previous producer closed before replace | error             | not checked     |
/// | Realized size ≤ worst-case estimate     | error             | logged warning  |
/// | Wrapped surface has a capability        | error             | error           |
///
/// `Relaxed` matches pipelines where only one render pass is open at a time and
/// passes are never explicitly closed, so the ordering check cannot hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Every invariant is checked and reported as an error.
    #[default]
    Strict,
    /// Ordering and size invariants are not enforced.
    Relaxed,
}

impl ValidationMode {
    #[inline]
    #[must_use]
    pub fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

// ---------------------------------------------------------------------------
// ProxySettings
// ---------------------------------------------------------------------------

/// Settings recorded by every proxy at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProxySettings {
    pub validation: ValidationMode,
}

impl ProxySettings {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            validation: ValidationMode::Strict,
        }
    }

    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            validation: ValidationMode::Relaxed,
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderSettings
// ---------------------------------------------------------------------------

/// Configuration for [`PooledTextureProvider`](crate::provider::PooledTextureProvider).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Maximum bytes held by budgeted surfaces.
    pub budget_bytes: u64,
    /// Maximum number of scratch surfaces retained per pool key.
    pub max_scratch_per_key: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            budget_bytes: 256 * 1024 * 1024,
            max_scratch_per_key: 8,
        }
    }
}
