//! Physical Surface Record
//!
//! [`GpuSurface`] stands for an allocated surface handed out by a
//! [`TextureProvider`](crate::provider::TextureProvider). It is always shared
//! as `Arc<GpuSurface>` between the proxy that instantiated it and any other
//! holder (the provider's pool, the caller that wrapped it).

use std::sync::atomic::{AtomicU64, Ordering};

use super::desc::SurfaceDesc;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Draws the next process-wide unique resource id.
///
/// Shared by physical surfaces and deferred proxies so a deferred proxy never
/// collides with any surface id.
pub fn generate_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Unique identifier of a physical surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub(crate) u64);

impl SurfaceId {
    #[inline]
    #[must_use]
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

/// An allocated GPU surface.
#[derive(Debug)]
pub struct GpuSurface {
    id: SurfaceId,
    desc: SurfaceDesc,
    budgeted: bool,
}

impl GpuSurface {
    /// Records a freshly allocated surface with a new unique id.
    #[must_use]
    pub fn new(desc: SurfaceDesc, budgeted: bool) -> Self {
        Self {
            id: SurfaceId(generate_resource_id()),
            desc,
            budgeted,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &SurfaceDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    #[inline]
    #[must_use]
    pub fn is_budgeted(&self) -> bool {
        self.budgeted
    }

    #[inline]
    #[must_use]
    pub fn is_texturable(&self) -> bool {
        self.desc.is_texturable()
    }

    #[inline]
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.desc.is_renderable()
    }

    /// Actual GPU memory footprint of this surface.
    #[must_use]
    pub fn gpu_memory_size(&self) -> u64 {
        self.desc.memory_size(self.desc.width, self.desc.height)
    }
}
