//! Surface Descriptor
//!
//! Immutable description of a wanted surface: extent, pixel format, sample
//! count, mip count and capability flags. Proxies hold one of these from
//! construction onwards; physical surfaces carry the one they were allocated with.

use crate::errors::{ProxyError, Result};

// ─── Backing Fit ──────────────────────────────────────────────────────────────

/// Whether physical allocation must match the descriptor exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackingFit {
    /// Allocate exactly the described extent.
    #[default]
    Exact,
    /// Allocation may be rounded up to a reusable pooled size
    /// (next power of two in each dimension).
    Approximate,
}

/// Largest width or height a descriptor may request.
///
/// Keeps power-of-two rounding and byte sizes inside integer range.
pub const MAX_SURFACE_DIMENSION: u32 = 1 << 16;

/// Rounds up to the next power of two. `0` rounds to `1`.
#[inline]
#[must_use]
pub fn next_pow2(value: u32) -> u32 {
    value.max(1).next_power_of_two()
}

// ─── Descriptor ───────────────────────────────────────────────────────────────

/// Descriptor for a GPU surface.
///
/// Capability flags use [`wgpu::TextureUsages`]: `TEXTURE_BINDING` marks a
/// surface samplable as a texture, `RENDER_ATTACHMENT` marks it drawable as a
/// render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub sample_count: u32,
    pub mip_level_count: u32,
}

impl SurfaceDesc {
    /// Single-sampled, single-mip descriptor.
    #[must_use]
    pub fn new(
        label: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        Self {
            label,
            width,
            height,
            format,
            usage,
            sample_count: 1,
            mip_level_count: 1,
        }
    }

    #[must_use]
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    #[must_use]
    pub fn with_mip_level_count(mut self, mip_level_count: u32) -> Self {
        self.mip_level_count = mip_level_count;
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    /// Checks the descriptor invariants (extent within
    /// `1..=MAX_SURFACE_DIMENSION`, non-zero samples and mips).
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ProxyError::invalid_descriptor(format!(
                "'{}' has zero extent ({}x{})",
                self.label, self.width, self.height
            )));
        }
        if self.width > MAX_SURFACE_DIMENSION || self.height > MAX_SURFACE_DIMENSION {
            return Err(ProxyError::invalid_descriptor(format!(
                "'{}' extent {}x{} exceeds {MAX_SURFACE_DIMENSION}",
                self.label, self.width, self.height
            )));
        }
        if self.sample_count == 0 {
            return Err(ProxyError::invalid_descriptor(format!(
                "'{}' has a sample count of 0",
                self.label
            )));
        }
        if self.mip_level_count == 0 {
            return Err(ProxyError::invalid_descriptor(format!(
                "'{}' has a mip level count of 0",
                self.label
            )));
        }
        Ok(())
    }

    /// Samplable as a texture.
    #[inline]
    #[must_use]
    pub fn is_texturable(&self) -> bool {
        self.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING)
    }

    /// Drawable as a render target.
    #[inline]
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    }

    /// Copy of this descriptor with both dimensions rounded to the next power of two.
    #[must_use]
    pub fn approx_rounded(&self) -> Self {
        Self {
            width: next_pow2(self.width),
            height: next_pow2(self.height),
            ..*self
        }
    }

    /// Bytes per block of the pixel format.
    ///
    /// Formats without a single copy size (combined depth/stencil, `Depth24Plus`,
    /// multi-planar) fall back to 4 bytes of depth plus 1 byte of stencil.
    #[must_use]
    pub fn bytes_per_block(&self) -> u32 {
        if let Some(size) = self.format.block_copy_size(None) {
            return size;
        }

        let depth = if self.format.has_depth_aspect() {
            self.format
                .block_copy_size(Some(wgpu::TextureAspect::DepthOnly))
                .unwrap_or(4)
        } else {
            0
        };
        let stencil = if self.format.has_stencil_aspect() {
            self.format
                .block_copy_size(Some(wgpu::TextureAspect::StencilOnly))
                .unwrap_or(1)
        } else {
            0
        };

        match depth + stencil {
            0 => 4,
            n => n,
        }
    }

    /// Bytes one row of `width` texels occupies, tightly packed.
    #[must_use]
    pub fn tight_row_bytes(&self, width: u32) -> usize {
        let (block_w, _) = self.format.block_dimensions();
        width.div_ceil(block_w) as usize * self.bytes_per_block() as usize
    }

    /// GPU memory footprint of a surface with this descriptor's format, samples
    /// and mips at the given extent.
    #[must_use]
    pub fn memory_size(&self, width: u32, height: u32) -> u64 {
        let (block_w, block_h) = self.format.block_dimensions();
        let blocks = u64::from(width.div_ceil(block_w)) * u64::from(height.div_ceil(block_h));
        let texel_bytes = blocks.saturating_mul(u64::from(self.bytes_per_block()));

        // Multisampled targets also keep a resolve copy.
        let colour_values = if self.sample_count > 1 && self.is_renderable() {
            u64::from(self.sample_count) + 1
        } else {
            1
        };

        let mut size = texel_bytes.saturating_mul(colour_values);
        if self.mip_level_count > 1 {
            size += size / 3;
        }
        size
    }
}
