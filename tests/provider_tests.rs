//! Pooled Texture Provider Tests
//!
//! Tests for:
//! - Scratch reuse for approximate requests
//! - Budget accounting, exhaustion and purging
//! - Pixel data validation on upload
//! - Trim policy
//! - End-to-end instantiation of proxies through the pool

mod common;

use std::sync::Arc;

use common::{init_logging, rgba_target, rgba_texture};
use myth_surface::graph::ProxyGraph;
use myth_surface::provider::{PixelData, PooledTextureProvider, TextureProvider};
use myth_surface::settings::ProviderSettings;
use myth_surface::surface::{BackingFit, SurfaceDesc};

const RGBA_64: u64 = 64 * 64 * 4;

fn pooled() -> PooledTextureProvider {
    init_logging();
    PooledTextureProvider::default()
}

fn provider_with_budget(budget_bytes: u64) -> PooledTextureProvider {
    init_logging();
    PooledTextureProvider::new(ProviderSettings {
        budget_bytes,
        ..ProviderSettings::default()
    })
}

// ============================================================================
// Scratch Reuse
// ============================================================================

#[test]
fn idle_scratch_surface_is_reused() {
    let mut provider = pooled();

    let first = provider.create_approx_texture(&rgba_texture(50, 40)).unwrap();
    assert_eq!((first.width(), first.height()), (64, 64));
    let first_id = first.id();
    drop(first);

    // Different request, same rounded key.
    let second = provider.create_approx_texture(&rgba_texture(60, 33)).unwrap();
    assert_eq!(second.id(), first_id);

    let stats = provider.stats();
    assert_eq!(stats.allocations, 1);
    assert_eq!(stats.reuse_hits, 1);
    assert_eq!(stats.scratch_surfaces, 1);
}

#[test]
fn scratch_surface_in_use_is_not_shared() {
    let mut provider = pooled();

    let first = provider.create_approx_texture(&rgba_texture(64, 64)).unwrap();
    let second = provider.create_approx_texture(&rgba_texture(64, 64)).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.id(), second.id());
    assert_eq!(provider.stats().reuse_hits, 0);
    assert_eq!(provider.budgeted_bytes(), 2 * RGBA_64);
}

#[test]
fn scratch_key_includes_format() {
    let mut provider = pooled();

    let rgba = provider.create_approx_texture(&rgba_texture(64, 64)).unwrap();
    let rgba_id = rgba.id();
    drop(rgba);

    let float_desc = SurfaceDesc {
        format: wgpu::TextureFormat::Rgba16Float,
        ..rgba_texture(64, 64)
    };
    let float = provider.create_approx_texture(&float_desc).unwrap();
    assert_ne!(float.id(), rgba_id);
    assert_eq!(provider.stats().reuse_hits, 0);
}

#[test]
fn exact_requests_never_reuse() {
    let mut provider = pooled();

    let first = provider.create_texture(&rgba_texture(64, 64), true, None).unwrap();
    let first_id = first.id();
    drop(first);

    let second = provider.create_texture(&rgba_texture(64, 64), true, None).unwrap();
    assert_ne!(second.id(), first_id);
    assert_eq!(provider.stats().allocations, 2);
}

// ============================================================================
// Budget
// ============================================================================

#[test]
fn request_over_budget_is_refused() {
    let mut provider = provider_with_budget(RGBA_64);

    let held = provider.create_texture(&rgba_texture(64, 64), true, None).unwrap();
    assert_eq!(provider.budget_remaining(), 0);

    assert!(provider.create_texture(&rgba_texture(64, 64), true, None).is_none());
    assert!(provider.create_approx_texture(&rgba_texture(64, 64)).is_none());
    assert_eq!(provider.stats().failures, 2);

    // Once released, the memory can be reclaimed for the next request.
    drop(held);
    assert!(provider.create_texture(&rgba_texture(64, 64), true, None).is_some());
    assert_eq!(provider.budgeted_bytes(), RGBA_64);
}

#[test]
fn over_budget_request_purges_idle_scratch() {
    let mut provider = provider_with_budget(RGBA_64);

    let scratch = provider.create_approx_texture(&rgba_texture(64, 64)).unwrap();
    drop(scratch);
    assert_eq!(provider.stats().scratch_surfaces, 1);

    // Different key, so reuse is impossible and the idle surface must go.
    let other = provider.create_approx_texture(&rgba_target(64, 64)).unwrap();
    assert_eq!((other.width(), other.height()), (64, 64));
    assert_eq!(provider.stats().scratch_surfaces, 1);
    assert_eq!(provider.budgeted_bytes(), RGBA_64);
}

#[test]
fn purge_frees_only_idle_surfaces() {
    let mut provider = pooled();

    let kept = provider.create_approx_texture(&rgba_texture(64, 64)).unwrap();
    let idle = provider.create_approx_texture(&rgba_texture(64, 64)).unwrap();
    let exact = provider.create_texture(&rgba_texture(64, 64), true, None).unwrap();
    drop(idle);
    drop(exact);

    assert_eq!(provider.purge_unreferenced(), 2 * RGBA_64);
    assert_eq!(provider.budgeted_bytes(), RGBA_64);
    assert_eq!(provider.stats().scratch_surfaces, 1);
    assert_eq!(provider.purge_unreferenced(), 0);
    drop(kept);
}

#[test]
fn unbudgeted_surfaces_do_not_count() {
    let mut provider = provider_with_budget(RGBA_64);

    let a = provider.create_texture(&rgba_texture(64, 64), false, None).unwrap();
    let b = provider.create_texture(&rgba_texture(128, 128), false, None).unwrap();

    assert!(!a.is_budgeted());
    assert!(!b.is_budgeted());
    assert_eq!(provider.budgeted_bytes(), 0);
    assert_eq!(provider.budget_remaining(), RGBA_64);
}

// ============================================================================
// Pixel Data
// ============================================================================

#[test]
fn upload_with_tight_rows_succeeds() {
    let mut provider = pooled();
    let desc = rgba_texture(4, 4);
    let bytes = [0u8; 64];

    let surface = provider
        .create_texture(&desc, true, Some(PixelData::tight(&bytes, &desc)))
        .unwrap();
    assert_eq!((surface.width(), surface.height()), (4, 4));
}

#[test]
fn upload_with_padded_rows_succeeds() {
    let mut provider = pooled();
    let desc = rgba_texture(4, 4);
    // Three padded rows plus one packed last row.
    let bytes = [0u8; 3 * 32 + 16];

    assert!(
        provider
            .create_texture(&desc, true, Some(PixelData::new(&bytes, 32)))
            .is_some()
    );
}

#[test]
fn malformed_pixel_data_is_refused() {
    let mut provider = pooled();
    let desc = rgba_texture(4, 4);
    let short = [0u8; 32];
    let full = [0u8; 64];

    assert!(
        provider
            .create_texture(&desc, true, Some(PixelData::tight(&short, &desc)))
            .is_none()
    );
    assert!(
        provider
            .create_texture(&desc, true, Some(PixelData::new(&full, 8)))
            .is_none()
    );

    let stats = provider.stats();
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.allocations, 0);
    assert_eq!(stats.budgeted_bytes, 0);
}

#[test]
fn overflowing_row_stride_is_refused() {
    let mut provider = pooled();
    let desc = rgba_texture(4, 4);
    let bytes = [0u8; 64];

    assert!(
        provider
            .create_texture(&desc, true, Some(PixelData::new(&bytes, usize::MAX / 2)))
            .is_none()
    );
    assert_eq!(provider.stats().failures, 1);
}

#[test]
fn invalid_descriptor_is_refused() {
    let mut provider = pooled();
    assert!(provider.create_texture(&rgba_texture(0, 16), true, None).is_none());
    assert!(provider.create_approx_texture(&rgba_texture(16, 0)).is_none());
    assert!(provider.create_approx_texture(&rgba_texture(3_000_000_000, 4)).is_none());
    assert_eq!(provider.stats().failures, 3);
}

// ============================================================================
// Trim
// ============================================================================

#[test]
fn trim_caps_idle_scratch_per_key() {
    let mut provider = PooledTextureProvider::new(ProviderSettings {
        max_scratch_per_key: 1,
        ..ProviderSettings::default()
    });

    let surfaces: Vec<_> = (0..3)
        .map(|_| provider.create_approx_texture(&rgba_texture(32, 32)).unwrap())
        .collect();
    assert_eq!(provider.stats().scratch_surfaces, 3);

    // Nothing is idle yet.
    provider.trim();
    assert_eq!(provider.stats().scratch_surfaces, 3);

    drop(surfaces);
    provider.trim();
    assert_eq!(provider.stats().scratch_surfaces, 1);
    assert_eq!(provider.budgeted_bytes(), 32 * 32 * 4);
}

// ============================================================================
// Proxy Integration
// ============================================================================

#[test]
fn released_proxy_returns_scratch_to_pool() {
    let mut graph = ProxyGraph::default();
    let mut provider = pooled();

    let first = graph
        .make_deferred(&rgba_target(300, 200), BackingFit::Approximate, true)
        .unwrap();
    let first_id = graph.instantiate(first, &mut provider).unwrap().id();
    assert!(graph.release(first).unwrap());

    let second = graph
        .make_deferred(&rgba_target(400, 256), BackingFit::Approximate, true)
        .unwrap();
    let surface = graph.instantiate(second, &mut provider).unwrap();

    assert_eq!(surface.id(), first_id);
    assert_eq!((surface.width(), surface.height()), (512, 256));
    assert_eq!(provider.stats().reuse_hits, 1);
    graph.validate().unwrap();
}

#[test]
fn exact_proxy_reserves_its_worst_case() {
    let mut graph = ProxyGraph::default();
    let mut provider = pooled();

    let proxy = graph
        .make_deferred(&rgba_texture(100, 60), BackingFit::Exact, true)
        .unwrap();
    let estimate = graph.proxy(proxy).unwrap().gpu_memory_size();
    graph.instantiate(proxy, &mut provider).unwrap();

    assert_eq!(provider.budgeted_bytes(), estimate);
}

#[test]
fn proxy_instantiation_fails_when_budget_is_exhausted() {
    let mut graph = ProxyGraph::default();
    let mut provider = provider_with_budget(RGBA_64);

    let big = graph
        .make_deferred(&rgba_texture(128, 128), BackingFit::Exact, true)
        .unwrap();
    let err = graph.instantiate(big, &mut provider).unwrap_err();

    assert!(err.is_recoverable());
    assert!(!graph.proxy(big).unwrap().is_instantiated());
}

#[test]
fn uploaded_proxy_is_already_backed() {
    let mut graph = ProxyGraph::default();
    let mut provider = pooled();
    let desc = rgba_texture(8, 8);
    let bytes = vec![255u8; 8 * 8 * 4];

    let proxy = graph
        .make_deferred_with_data(&mut provider, &desc, true, Some(PixelData::tight(&bytes, &desc)))
        .unwrap();

    assert!(graph.proxy(proxy).unwrap().is_instantiated());
    assert_eq!(provider.stats().allocations, 1);
    assert_eq!(provider.budgeted_bytes(), 8 * 8 * 4);
}
