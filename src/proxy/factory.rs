//! Proxy factories
//!
//! Variant selection is a pure function of capability flags. Callers describe
//! the surface; the factory decides whether it becomes a `Texture`,
//! `RenderTarget` or `TextureRenderTarget` proxy.

use std::sync::Arc;

use super::{ProxyKind, SurfaceProxy};
use crate::errors::{ProxyError, Result};
use crate::provider::{PixelData, TextureProvider};
use crate::settings::ProxySettings;
use crate::surface::{BackingFit, GpuSurface, SurfaceDesc};

impl SurfaceProxy {
    /// Wraps an already allocated surface.
    ///
    /// The proxy takes the surface's id, so wrapping one surface twice yields
    /// two proxies with equal [`ProxyId`](super::ProxyId)s.
    ///
    /// Fails with [`ProxyError::CapabilityMismatch`] if the surface is neither
    /// samplable nor drawable.
    pub fn make_wrapped(surface: Arc<GpuSurface>, settings: &ProxySettings) -> Result<Self> {
        let kind = ProxyKind::from_capabilities(surface.is_texturable(), surface.is_renderable())
            .ok_or_else(|| {
                ProxyError::capability_mismatch(format!(
                    "surface {:?} ('{}') is neither a texture nor a render target (usage {:?})",
                    surface.id(),
                    surface.desc().label,
                    surface.desc().usage
                ))
            })?;

        log::debug!(
            "Wrapped surface {:?} ('{}') as {kind:?} proxy",
            surface.id(),
            surface.desc().label
        );
        Ok(Self::wrapped(kind, surface, BackingFit::Exact, settings))
    }

    /// Describes a surface without allocating it.
    ///
    /// A descriptor asking for render-target capability yields a
    /// `TextureRenderTarget` proxy (anything allocated later through this path
    /// is also samplable); everything else yields a `Texture` proxy.
    pub fn make_deferred(
        desc: &SurfaceDesc,
        fit: BackingFit,
        budgeted: bool,
        settings: &ProxySettings,
    ) -> Result<Self> {
        desc.validate()?;

        let kind = if desc.is_renderable() {
            ProxyKind::TextureRenderTarget
        } else {
            ProxyKind::Texture
        };
        let desc = desc.with_usage(desc.usage | kind.required_usage());

        Ok(Self::deferred(kind, desc, fit, budgeted, settings))
    }

    /// Like [`make_deferred`](Self::make_deferred) with an exact fit, except that
    /// initial pixel data bypasses deferral: the provider allocates and uploads
    /// immediately and the result is a wrapped, already instantiated proxy.
    ///
    /// Pixel data that does not cover `desc` is rejected with
    /// [`ProxyError::InvalidPixelData`] before the provider is asked.
    pub fn make_deferred_with_data<P>(
        provider: &mut P,
        desc: &SurfaceDesc,
        budgeted: bool,
        pixels: Option<PixelData<'_>>,
        settings: &ProxySettings,
    ) -> Result<Self>
    where
        P: TextureProvider + ?Sized,
    {
        let Some(pixels) = pixels else {
            return Self::make_deferred(desc, BackingFit::Exact, budgeted, settings);
        };

        desc.validate()?;
        pixels.check(desc)?;
        // Uploads land in a sampled texture.
        let desc = desc.with_usage(
            desc.usage | wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );

        let surface = provider
            .create_texture(&desc, budgeted, Some(pixels))
            .ok_or(ProxyError::AllocationFailed {
                width: desc.width,
                height: desc.height,
                format: desc.format,
            })?;

        Self::make_wrapped(surface, settings)
    }
}
