//! Proxy Graph
//!
//! Owning registry for the proxies and op lists of one frame graph:
//! - [`ProxyGraph`]: proxy lifetimes, instantiation, last-producer tracking
//! - [`OpList`]: render-target and texture op lists (the producers)
//!
//! Proxies refer to their producer by [`OpListId`] and op lists refer to their
//! target by [`ProxyKey`]. Neither side owns the other; the graph outlives both
//! and routes teardown so no association is left dangling.

mod op_list;
mod proxy_graph;

use slotmap::new_key_type;

pub use op_list::{CopyRegion, OpList, RenderTargetOp, RenderTargetOpList, TextureOp, TextureOpList};
pub use proxy_graph::{CopyKey, ProxyGraph};

new_key_type! {
    /// Handle to a proxy owned by a [`ProxyGraph`].
    pub struct ProxyKey;
    /// Handle to an op list owned by a [`ProxyGraph`].
    pub struct OpListId;
}
