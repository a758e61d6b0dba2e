//! Texture Adjuster
//!
//! Wraps a proxy whose meaningful pixels may only cover part of the surface
//! (the *content area*). Texels outside the content area are undefined and
//! must never be sampled, whatever the filter or wrap mode.
//!
//! # Decision
//!
//! | Content area         | Sampling                        | Result                       |
//! |----------------------|---------------------------------|------------------------------|
//! | whole surface / none | any                             | source, offset (0, 0)        |
//! | strict subset        | nearest/linear + clamp          | source, offset = area origin |
//! | strict subset        | mipmapped, or repeat/mirror     | tight copy, offset (0, 0)    |
//!
//! Copies are cached in the [`ProxyGraph`] under a [`CopyKey`], so repeated
//! requests for the same area reuse one copy.

use std::sync::Arc;

use glam::UVec2;

use crate::errors::{ProxyError, Result};
use crate::graph::{CopyKey, ProxyGraph, ProxyKey};
use crate::provider::TextureProvider;
use crate::surface::{BackingFit, GpuSurface, IRect, SurfaceDesc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
    /// Trilinear across a mip chain.
    MipMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
    MirrorRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerParams {
    pub filter: FilterMode,
    pub wrap: WrapMode,
}

impl SamplerParams {
    #[must_use]
    pub fn new(filter: FilterMode, wrap: WrapMode) -> Self {
        Self { filter, wrap }
    }

    /// Whether sampling a sub-rectangle could reach texels outside it.
    #[must_use]
    pub fn reads_outside_subset(&self) -> bool {
        self.filter == FilterMode::MipMap || self.wrap != WrapMode::Clamp
    }
}

/// A texture safe for the requested sampler params.
#[derive(Debug, Clone)]
pub struct AdjustedTexture {
    pub proxy: ProxyKey,
    pub surface: Arc<GpuSurface>,
    /// Top-left of the content inside `surface`.
    pub offset: UVec2,
}

/// Proxy-backed texture producer with an optional content area.
#[derive(Debug, Clone, Copy)]
pub struct TextureAdjuster {
    source: ProxyKey,
    content_area: Option<IRect>,
}

/// Mip levels of a full chain for the given extent.
fn full_mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

impl TextureAdjuster {
    /// `content_area` of `None`, or equal to the whole surface, means every
    /// texel is valid.
    pub fn new(graph: &ProxyGraph, source: ProxyKey, content_area: Option<IRect>) -> Result<Self> {
        let proxy = graph.proxy(source).ok_or(ProxyError::UnknownProxy)?;
        if !proxy.kind().is_texture() {
            return Err(ProxyError::capability_mismatch(format!(
                "proxy {:?} is not samplable",
                proxy.id()
            )));
        }

        let full = IRect::from_size(proxy.desc().width, proxy.desc().height);
        let content_area = match content_area {
            Some(area) if area.is_empty() || !full.contains(&area) => {
                return Err(ProxyError::invalid_descriptor(format!(
                    "content area {area:?} is not inside {}x{}",
                    full.width, full.height
                )));
            }
            Some(area) if area == full => None,
            other => other,
        };

        Ok(Self {
            source,
            content_area,
        })
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> ProxyKey {
        self.source
    }

    #[inline]
    #[must_use]
    pub fn content_area(&self) -> Option<IRect> {
        self.content_area
    }

    /// Returns a texture whose sampling under `params` never reads undefined
    /// texels, instantiating the source (or its copy) as needed.
    pub fn ref_texture_safe_for_params<P>(
        &self,
        graph: &mut ProxyGraph,
        provider: &mut P,
        params: SamplerParams,
    ) -> Result<AdjustedTexture>
    where
        P: TextureProvider + ?Sized,
    {
        let area = match self.content_area {
            Some(area) if params.reads_outside_subset() => area,
            other => {
                let surface = graph.instantiate(self.source, provider)?;
                return Ok(AdjustedTexture {
                    proxy: self.source,
                    surface,
                    offset: other.map_or(UVec2::ZERO, |a| a.origin()),
                });
            }
        };

        let copy = self.ref_copy(graph, area, params.filter == FilterMode::MipMap)?;
        let surface = graph.instantiate(copy, provider)?;
        Ok(AdjustedTexture {
            proxy: copy,
            surface,
            offset: UVec2::ZERO,
        })
    }

    /// Finds or records a tight copy of `area`.
    fn ref_copy(&self, graph: &mut ProxyGraph, area: IRect, mipped: bool) -> Result<ProxyKey> {
        let source = graph.proxy(self.source).ok_or(ProxyError::UnknownProxy)?;
        let key = CopyKey {
            source: self.source,
            area,
            mipped,
        };
        if let Some(copy) = graph.cached_copy(&key) {
            log::trace!("TextureAdjuster: copy cache hit for {:?}", key.source);
            return Ok(copy);
        }

        let mip_level_count = if mipped {
            full_mip_count(area.width, area.height)
        } else {
            1
        };
        let desc = SurfaceDesc::new(
            "Adjuster Copy",
            area.width,
            area.height,
            source.desc().format,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        )
        .with_mip_level_count(mip_level_count);

        let copy = graph.make_deferred(&desc, BackingFit::Exact, true)?;
        let list = graph.add_texture_op_list("Adjuster Copy", copy)?;
        if let Some(texture_list) = graph
            .op_list_mut(list)
            .and_then(|l| l.as_texture_op_list_mut())
        {
            texture_list.copy_surface(self.source, area, UVec2::ZERO)?;
        }
        graph.close_op_list(list)?;

        // The cache keeps the copy alive; drop the creation reference.
        graph.cache_copy(key, copy)?;
        graph.release(copy)?;

        log::debug!(
            "TextureAdjuster: copied {area:?} of {:?} ({} mips)",
            key.source,
            mip_level_count
        );
        Ok(copy)
    }
}
