//! Surface descriptors and physical surface records.

pub mod desc;
pub mod gpu_surface;
mod rect;

pub use desc::{BackingFit, MAX_SURFACE_DIMENSION, SurfaceDesc, next_pow2};
pub use gpu_surface::{GpuSurface, SurfaceId, generate_resource_id};
pub use rect::IRect;
