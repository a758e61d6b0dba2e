//! Pooled Texture Provider
//!
//! In-process [`TextureProvider`] with budget accounting and scratch reuse.
//!
//! # Design
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 PooledTextureProvider                     │
//! │                                                          │
//! │  scratch:  HashMap<Key, Vec<Arc<GpuSurface>>>            │
//! │  exact:    Vec<Arc<GpuSurface>>  (budgeted only)         │
//! │                                                          │
//! │  create_approx_texture() → reuse idle scratch or grow    │
//! │  create_texture()        → always a new surface          │
//! │  purge_unreferenced()    → drop everything idle          │
//! │  trim()                  → cap idle scratch per key      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A surface is *idle* when the pool holds the only reference to it. Idle
//! scratch surfaces are handed out again for requests with an identical key;
//! idle exact surfaces are simply dead weight waiting to be reclaimed.
//!
//! # Budget
//!
//! Every budgeted surface (all scratch surfaces, plus exact surfaces created
//! with `budgeted = true`) counts against
//! [`ProviderSettings::budget_bytes`]. A request that does not fit first purges
//! idle surfaces and fails only if it still does not fit.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{PixelData, TextureProvider};
use crate::settings::ProviderSettings;
use crate::surface::{GpuSurface, SurfaceDesc};

// ─── Internal Types ───────────────────────────────────────────────────────────

/// Key for scratch recycling. The label is deliberately not part of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    sample_count: u32,
    mip_level_count: u32,
}

impl PoolKey {
    fn from_desc(desc: &SurfaceDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
            sample_count: desc.sample_count,
            mip_level_count: desc.mip_level_count,
        }
    }
}

#[inline]
fn is_idle(surface: &Arc<GpuSurface>) -> bool {
    Arc::strong_count(surface) == 1
}

// ─── Public Types ─────────────────────────────────────────────────────────────

/// Counters describing provider activity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProviderStats {
    /// Surfaces created (exact and scratch).
    pub allocations: u64,
    /// Approximate requests served from an idle scratch surface.
    pub reuse_hits: u64,
    /// Requests refused (budget exhausted or invalid request).
    pub failures: u64,
    /// Bytes currently held by budgeted surfaces.
    pub budgeted_bytes: u64,
    /// Scratch surfaces currently retained.
    pub scratch_surfaces: usize,
}

/// Budget-tracking texture provider with a scratch pool for approximate fits.
pub struct PooledTextureProvider {
    settings: ProviderSettings,
    scratch: FxHashMap<PoolKey, Vec<Arc<GpuSurface>>>,
    exact: Vec<Arc<GpuSurface>>,
    budgeted_bytes: u64,
    stats: ProviderStats,
}

impl PooledTextureProvider {
    #[must_use]
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            scratch: FxHashMap::default(),
            exact: Vec::new(),
            budgeted_bytes: 0,
            stats: ProviderStats::default(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    #[must_use]
    pub fn stats(&self) -> ProviderStats {
        ProviderStats {
            budgeted_bytes: self.budgeted_bytes,
            scratch_surfaces: self.scratch.values().map(Vec::len).sum(),
            ..self.stats.clone()
        }
    }

    #[inline]
    #[must_use]
    pub fn budgeted_bytes(&self) -> u64 {
        self.budgeted_bytes
    }

    #[inline]
    #[must_use]
    pub fn budget_remaining(&self) -> u64 {
        self.settings.budget_bytes.saturating_sub(self.budgeted_bytes)
    }

    /// Releases every idle surface. Returns the number of bytes freed.
    pub fn purge_unreferenced(&mut self) -> u64 {
        let before = self.budgeted_bytes;
        self.reclaim_exact();

        let mut freed = 0u64;
        for bucket in self.scratch.values_mut() {
            bucket.retain(|s| {
                if is_idle(s) {
                    freed += s.gpu_memory_size();
                    false
                } else {
                    true
                }
            });
        }
        self.scratch.retain(|_, bucket| !bucket.is_empty());
        self.budgeted_bytes = self.budgeted_bytes.saturating_sub(freed);

        let total = before - self.budgeted_bytes;
        if total > 0 {
            log::debug!("PooledTextureProvider: purged {total} bytes of idle surfaces");
        }
        total
    }

    /// Keeps at most `max_scratch_per_key` idle scratch surfaces per key.
    ///
    /// Call this periodically (e.g., after a resolution change) to avoid
    /// holding stale memory.
    pub fn trim(&mut self) {
        let cap = self.settings.max_scratch_per_key;
        let mut freed = 0u64;
        for bucket in self.scratch.values_mut() {
            let mut idle_kept = 0usize;
            bucket.retain(|s| {
                if !is_idle(s) {
                    return true;
                }
                if idle_kept < cap {
                    idle_kept += 1;
                    return true;
                }
                freed += s.gpu_memory_size();
                false
            });
        }
        self.scratch.retain(|_, bucket| !bucket.is_empty());
        self.budgeted_bytes = self.budgeted_bytes.saturating_sub(freed);
    }

    /// Drops exact budgeted surfaces nobody references anymore.
    fn reclaim_exact(&mut self) {
        let mut freed = 0u64;
        self.exact.retain(|s| {
            if is_idle(s) {
                freed += s.gpu_memory_size();
                false
            } else {
                true
            }
        });
        self.budgeted_bytes = self.budgeted_bytes.saturating_sub(freed);
    }

    /// Makes room for `bytes` more budgeted memory, purging idle surfaces if needed.
    fn reserve(&mut self, bytes: u64) -> bool {
        self.reclaim_exact();
        if self.budgeted_bytes + bytes <= self.settings.budget_bytes {
            return true;
        }
        self.purge_unreferenced();
        self.budgeted_bytes + bytes <= self.settings.budget_bytes
    }

    fn refuse(&mut self, desc: &SurfaceDesc, reason: &str) -> Option<Arc<GpuSurface>> {
        self.stats.failures += 1;
        log::warn!(
            "PooledTextureProvider: refused '{}' {}x{} {:?}: {reason}",
            desc.label,
            desc.width,
            desc.height,
            desc.format
        );
        None
    }
}

impl Default for PooledTextureProvider {
    fn default() -> Self {
        Self::new(ProviderSettings::default())
    }
}

impl TextureProvider for PooledTextureProvider {
    fn create_texture(
        &mut self,
        desc: &SurfaceDesc,
        budgeted: bool,
        pixels: Option<PixelData<'_>>,
    ) -> Option<Arc<GpuSurface>> {
        if let Err(e) = desc.validate() {
            return self.refuse(desc, &e.to_string());
        }
        if let Some(pixels) = &pixels
            && let Err(e) = pixels.check(desc)
        {
            return self.refuse(desc, &e.to_string());
        }

        let size = desc.memory_size(desc.width, desc.height);
        if budgeted && !self.reserve(size) {
            return self.refuse(desc, "budget exhausted");
        }

        let surface = Arc::new(GpuSurface::new(*desc, budgeted));
        if budgeted {
            self.budgeted_bytes += size;
            self.exact.push(Arc::clone(&surface));
        }

        self.stats.allocations += 1;
        log::debug!(
            "PooledTextureProvider: created '{}' {}x{} ({size} bytes, budgeted: {budgeted}, upload: {})",
            desc.label,
            desc.width,
            desc.height,
            pixels.is_some()
        );
        Some(surface)
    }

    fn create_approx_texture(&mut self, desc: &SurfaceDesc) -> Option<Arc<GpuSurface>> {
        if let Err(e) = desc.validate() {
            return self.refuse(desc, &e.to_string());
        }

        let rounded = desc.approx_rounded();
        let key = PoolKey::from_desc(&rounded);

        if let Some(bucket) = self.scratch.get(&key)
            && let Some(idle) = bucket.iter().find(|s| is_idle(s))
        {
            self.stats.reuse_hits += 1;
            log::trace!(
                "PooledTextureProvider: reused scratch {:?} for '{}'",
                idle.id(),
                desc.label
            );
            return Some(Arc::clone(idle));
        }

        let size = rounded.memory_size(rounded.width, rounded.height);
        if !self.reserve(size) {
            return self.refuse(&rounded, "budget exhausted");
        }

        let surface = Arc::new(GpuSurface::new(rounded, true));
        self.budgeted_bytes += size;
        self.scratch
            .entry(key)
            .or_default()
            .push(Arc::clone(&surface));

        self.stats.allocations += 1;
        log::debug!(
            "PooledTextureProvider: created scratch '{}' {}x{} for {}x{} ({size} bytes)",
            desc.label,
            rounded.width,
            rounded.height,
            desc.width,
            desc.height
        );
        Some(surface)
    }
}
