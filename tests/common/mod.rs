//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use myth_surface::provider::{PixelData, TextureProvider};
use myth_surface::surface::{GpuSurface, SurfaceDesc};

/// Routes `log` output through the test harness. Set `RUST_LOG=debug` to see it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn rgba_texture(width: u32, height: u32) -> SurfaceDesc {
    SurfaceDesc::new(
        "Test Texture",
        width,
        height,
        wgpu::TextureFormat::Rgba8Unorm,
        wgpu::TextureUsages::TEXTURE_BINDING,
    )
}

pub fn rgba_target(width: u32, height: u32) -> SurfaceDesc {
    SurfaceDesc::new(
        "Test Target",
        width,
        height,
        wgpu::TextureFormat::Rgba8Unorm,
        wgpu::TextureUsages::RENDER_ATTACHMENT,
    )
}

pub fn surface_with_usage(width: u32, height: u32, usage: wgpu::TextureUsages) -> Arc<GpuSurface> {
    Arc::new(GpuSurface::new(rgba_texture(width, height).with_usage(usage), true))
}

/// Provider that records every request.
///
/// - `fail`: refuse every request
/// - `approx_only`: refuse exact requests
/// - `grow`: widen approximate surfaces by this many texels
#[derive(Default)]
pub struct RecordingProvider {
    pub exact_requests: Vec<(SurfaceDesc, bool, bool)>,
    pub approx_requests: Vec<SurfaceDesc>,
    pub fail: bool,
    pub approx_only: bool,
    pub grow: u32,
}

impl RecordingProvider {
    pub fn approx_only() -> Self {
        Self {
            approx_only: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.exact_requests.len() + self.approx_requests.len()
    }
}

impl TextureProvider for RecordingProvider {
    fn create_texture(
        &mut self,
        desc: &SurfaceDesc,
        budgeted: bool,
        pixels: Option<PixelData<'_>>,
    ) -> Option<Arc<GpuSurface>> {
        self.exact_requests.push((*desc, budgeted, pixels.is_some()));
        if self.fail || self.approx_only {
            return None;
        }
        Some(Arc::new(GpuSurface::new(*desc, budgeted)))
    }

    fn create_approx_texture(&mut self, desc: &SurfaceDesc) -> Option<Arc<GpuSurface>> {
        self.approx_requests.push(*desc);
        if self.fail {
            return None;
        }
        let realized = SurfaceDesc {
            width: desc.width + self.grow,
            ..*desc
        };
        Some(Arc::new(GpuSurface::new(realized, true)))
    }
}
