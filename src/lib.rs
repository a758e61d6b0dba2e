//! Deferred GPU surface proxies for the Myth render graph.
//!
//! A [`SurfaceProxy`] describes a surface a rendering operation will need
//! before any GPU memory exists for it. The [`ProxyGraph`] owns the proxies of
//! one frame graph together with the op lists that write them, tracks each
//! proxy's last producer and instantiates proxies on demand through a
//! [`TextureProvider`].
//!
//! ```rust,ignore
//! use myth_surface::{BackingFit, ProxyGraph, PooledTextureProvider, SurfaceDesc};
//!
//! let mut graph = ProxyGraph::default();
//! let mut provider = PooledTextureProvider::default();
//!
//! let desc = SurfaceDesc::new(
//!     "Bloom Mip",
//!     300,
//!     200,
//!     wgpu::TextureFormat::Rgba16Float,
//!     wgpu::TextureUsages::RENDER_ATTACHMENT,
//! );
//! let proxy = graph.make_deferred(&desc, BackingFit::Approximate, true)?;
//! assert_eq!(graph.proxy(proxy).unwrap().worst_case_width(), 512);
//!
//! let pass = graph.add_render_target_op_list("Bloom Downsample", proxy)?;
//! let surface = graph.instantiate(proxy, &mut provider)?;
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod graph;
pub mod producer;
pub mod provider;
pub mod proxy;
pub mod settings;
pub mod surface;

pub use errors::{ProxyError, Result};
pub use graph::{CopyKey, OpList, OpListId, ProxyGraph, ProxyKey, RenderTargetOpList, TextureOpList};
pub use producer::{AdjustedTexture, FilterMode, SamplerParams, TextureAdjuster, WrapMode};
pub use provider::{PixelData, PooledTextureProvider, ProviderStats, TextureProvider};
pub use proxy::{ProxyId, ProxyKind, SurfaceProxy};
pub use settings::{ProviderSettings, ProxySettings, ValidationMode};
pub use surface::{BackingFit, GpuSurface, IRect, SurfaceDesc, SurfaceId};
