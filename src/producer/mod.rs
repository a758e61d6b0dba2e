//! Texture producers
//!
//! Consumers of the proxy core that hand out textures safe for a given
//! sampling setup. Only the proxy-backed adjuster lives here.

mod adjuster;

pub use adjuster::{AdjustedTexture, FilterMode, SamplerParams, TextureAdjuster, WrapMode};
