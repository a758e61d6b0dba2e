//! Surface Proxies
//!
//! A [`SurfaceProxy`] stands for a GPU surface that may not exist yet. It
//! carries everything consumers need to plan around the surface (descriptor,
//! fit policy, budget flag, identity, worst-case extent and footprint) and
//! turns into a physical surface exactly once, through
//! [`SurfaceProxy::instantiate`].
//!
//! # Lifecycle
//!
//! ```text
//!   make_deferred ──► Deferred ──instantiate()──► Instantiated(Arc<GpuSurface>)
//!                        ▲  │                             ▲
//!                        └──┘ allocation failed           │
//!   make_wrapped ─────────────────────────────────────────┘
//! ```
//!
//! Once instantiated the backing surface is never replaced: further
//! `instantiate` calls return the same `Arc` without touching the provider.
//!
//! # Variants
//!
//! [`ProxyKind`] is derived from capability flags, never picked by callers:
//!
//! | Kind                  | Samplable | Drawable |
//! |-----------------------|-----------|----------|
//! | `Texture`             | ✅        | ❌       |
//! | `RenderTarget`        | ❌        | ✅       |
//! | `TextureRenderTarget` | ✅        | ✅       |

mod factory;

use std::cell::OnceCell;
use std::sync::Arc;

use crate::errors::{ProxyError, Result};
use crate::graph::OpListId;
use crate::provider::TextureProvider;
use crate::settings::{ProxySettings, ValidationMode};
use crate::surface::{BackingFit, GpuSurface, SurfaceDesc, SurfaceId, generate_resource_id};

// ─── Identity ─────────────────────────────────────────────────────────────────

/// Identity of a proxy, usable before any physical surface exists.
///
/// Drawn from the same counter as [`SurfaceId`]: a wrapped proxy takes the id
/// of the surface it wraps, a deferred proxy mints a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u64);

impl ProxyId {
    fn mint() -> Self {
        Self(generate_resource_id())
    }

    #[inline]
    #[must_use]
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl From<SurfaceId> for ProxyId {
    fn from(id: SurfaceId) -> Self {
        Self(id.to_u64())
    }
}

// ─── Variants ─────────────────────────────────────────────────────────────────

/// Capability subset the eventual physical surface must support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    Texture,
    RenderTarget,
    TextureRenderTarget,
}

impl ProxyKind {
    /// Selects the variant for the given capabilities, `None` if neither is present.
    #[must_use]
    pub fn from_capabilities(texturable: bool, renderable: bool) -> Option<Self> {
        match (texturable, renderable) {
            (true, true) => Some(Self::TextureRenderTarget),
            (true, false) => Some(Self::Texture),
            (false, true) => Some(Self::RenderTarget),
            (false, false) => None,
        }
    }

    /// Samplable as a texture.
    #[inline]
    #[must_use]
    pub fn is_texture(self) -> bool {
        matches!(self, Self::Texture | Self::TextureRenderTarget)
    }

    /// Drawable as a render target.
    #[inline]
    #[must_use]
    pub fn is_render_target(self) -> bool {
        matches!(self, Self::RenderTarget | Self::TextureRenderTarget)
    }

    /// Usage flags a backing surface must carry for this variant.
    #[must_use]
    pub fn required_usage(self) -> wgpu::TextureUsages {
        let mut usage = wgpu::TextureUsages::empty();
        if self.is_texture() {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if self.is_render_target() {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        usage
    }
}

// ─── Proxy ────────────────────────────────────────────────────────────────────

/// Backing state. `instantiate` is the only transition out of `Deferred`.
#[derive(Debug)]
enum Backing {
    Deferred,
    Instantiated(Arc<GpuSurface>),
}

/// Placeholder for a GPU surface whose allocation may be deferred.
///
/// Proxies are confined to the thread building their frame graph: the cached
/// memory size makes them `!Sync`.
#[derive(Debug)]
pub struct SurfaceProxy {
    id: ProxyId,
    kind: ProxyKind,
    desc: SurfaceDesc,
    fit: BackingFit,
    budgeted: bool,
    validation: ValidationMode,
    backing: Backing,
    /// Non-owning: the op list lives in the owning [`ProxyGraph`](crate::graph::ProxyGraph).
    last_producer: Option<OpListId>,
    /// Worst-case (or actual, once backed) footprint, computed on first query.
    memory_size: OnceCell<u64>,
}

impl SurfaceProxy {
    /// Proxy over an already allocated surface. Descriptor, budget flag and
    /// identity all come from the surface.
    fn wrapped(
        kind: ProxyKind,
        surface: Arc<GpuSurface>,
        fit: BackingFit,
        settings: &ProxySettings,
    ) -> Self {
        Self {
            id: ProxyId::from(surface.id()),
            kind,
            desc: *surface.desc(),
            fit,
            budgeted: surface.is_budgeted(),
            validation: settings.validation,
            backing: Backing::Instantiated(surface),
            last_producer: None,
            memory_size: OnceCell::new(),
        }
    }

    /// Purely descriptive proxy; nothing is allocated until `instantiate`.
    fn deferred(
        kind: ProxyKind,
        desc: SurfaceDesc,
        fit: BackingFit,
        budgeted: bool,
        settings: &ProxySettings,
    ) -> Self {
        Self {
            id: ProxyId::mint(),
            kind,
            desc,
            fit,
            budgeted,
            validation: settings.validation,
            backing: Backing::Deferred,
            last_producer: None,
            memory_size: OnceCell::new(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn id(&self) -> ProxyId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &SurfaceDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn fit(&self) -> BackingFit {
        self.fit
    }

    #[inline]
    #[must_use]
    pub fn is_budgeted(&self) -> bool {
        self.budgeted
    }

    #[inline]
    #[must_use]
    pub fn validation(&self) -> ValidationMode {
        self.validation
    }

    #[inline]
    #[must_use]
    pub fn is_instantiated(&self) -> bool {
        matches!(self.backing, Backing::Instantiated(_))
    }

    /// The op list that most recently wrote this proxy, if any.
    #[inline]
    #[must_use]
    pub fn last_producer(&self) -> Option<OpListId> {
        self.last_producer
    }

    /// Replaces the producer association, returning the previous one.
    /// Ordering checks live in [`ProxyGraph::set_last_producer`](crate::graph::ProxyGraph::set_last_producer).
    pub(crate) fn replace_last_producer(&mut self, producer: Option<OpListId>) -> Option<OpListId> {
        std::mem::replace(&mut self.last_producer, producer)
    }

    /// Backing surface dimensions, without instantiating.
    pub(crate) fn backing_extent(&self) -> Option<(u32, u32)> {
        match &self.backing {
            Backing::Instantiated(s) => Some((s.width(), s.height())),
            Backing::Deferred => None,
        }
    }

    // ── Worst-case sizing ──────────────────────────────────────────────────

    /// Largest width this proxy can occupy once instantiated.
    #[must_use]
    pub fn worst_case_width(&self) -> u32 {
        match (&self.backing, self.fit) {
            (Backing::Instantiated(s), _) => s.width(),
            (Backing::Deferred, BackingFit::Exact) => self.desc.width,
            (Backing::Deferred, BackingFit::Approximate) => self.desc.approx_rounded().width,
        }
    }

    /// Largest height this proxy can occupy once instantiated.
    #[must_use]
    pub fn worst_case_height(&self) -> u32 {
        match (&self.backing, self.fit) {
            (Backing::Instantiated(s), _) => s.height(),
            (Backing::Deferred, BackingFit::Exact) => self.desc.height,
            (Backing::Deferred, BackingFit::Approximate) => self.desc.approx_rounded().height,
        }
    }

    /// GPU memory footprint: the backing surface's when instantiated, otherwise
    /// the worst-case estimate. Computed once and cached.
    #[must_use]
    pub fn gpu_memory_size(&self) -> u64 {
        *self.memory_size.get_or_init(|| match &self.backing {
            Backing::Instantiated(s) => s.gpu_memory_size(),
            Backing::Deferred => self
                .desc
                .memory_size(self.worst_case_width(), self.worst_case_height()),
        })
    }

    // ── Instantiation ──────────────────────────────────────────────────────

    /// Returns the physical surface backing this proxy, allocating it from
    /// `provider` on first call.
    ///
    /// On allocation failure the proxy stays deferred and the call may be
    /// retried. A later call after success never reaches the provider.
    pub fn instantiate<P>(&mut self, provider: &mut P) -> Result<Arc<GpuSurface>>
    where
        P: TextureProvider + ?Sized,
    {
        if let Backing::Instantiated(surface) = &self.backing {
            return Ok(Arc::clone(surface));
        }

        let (request, surface) = match self.fit {
            BackingFit::Approximate => {
                let request = self.desc.approx_rounded();
                let surface = provider.create_approx_texture(&request);
                (request, surface)
            }
            BackingFit::Exact => {
                let surface = provider.create_texture(&self.desc, self.budgeted, None);
                (self.desc, surface)
            }
        };

        let Some(surface) = surface else {
            log::warn!(
                "Proxy {:?} ('{}'): allocation of {}x{} failed, staying deferred",
                self.id,
                self.desc.label,
                request.width,
                request.height
            );
            return Err(ProxyError::AllocationFailed {
                width: request.width,
                height: request.height,
                format: request.format,
            });
        };

        self.reconcile(&surface)?;

        log::debug!(
            "Proxy {:?} ('{}') instantiated as {:?} ({}x{})",
            self.id,
            self.desc.label,
            surface.id(),
            surface.width(),
            surface.height()
        );
        self.backing = Backing::Instantiated(Arc::clone(&surface));
        Ok(surface)
    }

    /// Cross-checks a freshly allocated surface against what this proxy
    /// promised: required capabilities and the cached worst-case footprint.
    fn reconcile(&self, surface: &GpuSurface) -> Result<()> {
        let strict = self.validation.is_strict();

        let required = self.kind.required_usage();
        if !surface.desc().usage.contains(required) {
            let msg = format!(
                "proxy {:?} needs {required:?} but surface {:?} has {:?}",
                self.id,
                surface.id(),
                surface.desc().usage
            );
            if strict {
                return Err(ProxyError::capability_mismatch(msg));
            }
            log::warn!("{msg}");
        }

        if let Some(&estimate) = self.memory_size.get() {
            let actual = surface.gpu_memory_size();
            if actual > estimate {
                if strict {
                    return Err(ProxyError::SizeEstimateExceeded {
                        proxy: self.id,
                        actual,
                        estimate,
                    });
                }
                log::warn!(
                    "Proxy {:?}: realized size {actual} exceeds worst-case estimate {estimate}",
                    self.id
                );
            }
        }
        Ok(())
    }
}
