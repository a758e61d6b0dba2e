//! Texture Provider boundary
//!
//! Proxies never allocate on their own: at instantiation they hand a
//! descriptor (and budget flag) to a [`TextureProvider`] and keep whatever
//! surface comes back. A provider signals failure by returning `None`.

mod pool;

use std::sync::Arc;

use crate::errors::{ProxyError, Result};
use crate::surface::{GpuSurface, SurfaceDesc};

pub use pool::{PooledTextureProvider, ProviderStats};

/// Initial pixel contents for a synchronously uploaded texture.
#[derive(Debug, Clone, Copy)]
pub struct PixelData<'a> {
    pub bytes: &'a [u8],
    /// Distance in bytes between the starts of two consecutive rows.
    pub row_bytes: usize,
}

impl<'a> PixelData<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8], row_bytes: usize) -> Self {
        Self { bytes, row_bytes }
    }

    /// Tightly packed rows for the given descriptor.
    #[must_use]
    pub fn tight(bytes: &'a [u8], desc: &SurfaceDesc) -> Self {
        Self {
            bytes,
            row_bytes: desc.tight_row_bytes(desc.width),
        }
    }

    /// Checks that the rows cover `desc`. The last row may be unpadded.
    pub fn check(&self, desc: &SurfaceDesc) -> Result<()> {
        let tight = desc.tight_row_bytes(desc.width);
        if self.row_bytes < tight {
            return Err(ProxyError::InvalidPixelData(format!(
                "row stride {} is smaller than a packed row ({tight} bytes)",
                self.row_bytes
            )));
        }
        let (_, block_h) = desc.format.block_dimensions();
        let rows = desc.height.div_ceil(block_h).max(1) as usize;
        let needed = self
            .row_bytes
            .checked_mul(rows - 1)
            .and_then(|padded| padded.checked_add(tight))
            .ok_or_else(|| {
                ProxyError::InvalidPixelData(format!(
                    "row stride {} over {rows} rows overflows",
                    self.row_bytes
                ))
            })?;
        if self.bytes.len() < needed {
            return Err(ProxyError::InvalidPixelData(format!(
                "{} bytes supplied, {needed} bytes required",
                self.bytes.len()
            )));
        }
        Ok(())
    }
}

/// Performs physical surface allocation.
pub trait TextureProvider {
    /// Allocates a surface exactly matching `desc`.
    ///
    /// When `pixels` is present the contents are uploaded synchronously.
    fn create_texture(
        &mut self,
        desc: &SurfaceDesc,
        budgeted: bool,
        pixels: Option<PixelData<'_>>,
    ) -> Option<Arc<GpuSurface>>;

    /// Allocates a surface at least as large as `desc`, possibly served from a
    /// reusable pool. Approximate surfaces always count against the budget.
    fn create_approx_texture(&mut self, desc: &SurfaceDesc) -> Option<Arc<GpuSurface>> {
        self.create_texture(&desc.approx_rounded(), true, None)
    }
}
