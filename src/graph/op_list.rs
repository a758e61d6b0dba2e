//! Op Lists
//!
//! An op list is a batch of GPU work targeting one proxy. The proxy graph
//! only cares about three things: which proxy it targets, whether it is
//! closed, and which capability it has (render pass vs texture upload/copy).
//! [`OpList`] is a closed enum over the two kinds; the narrowing queries
//! return `None` on mismatch.

use glam::UVec2;
use smallvec::SmallVec;

use super::{OpListId, ProxyKey};
use crate::errors::{ProxyError, Result};
use crate::surface::IRect;

// ─── Recorded ops ─────────────────────────────────────────────────────────────

/// Surface-to-surface copy of `src_rect` to `dst_point` in the op list's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRegion {
    pub src: ProxyKey,
    pub src_rect: IRect,
    pub dst_point: UVec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderTargetOp {
    Clear { color: wgpu::Color },
    Discard,
    Draw { label: &'static str },
    CopySurface(CopyRegion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureOp {
    CopySurface(CopyRegion),
    WritePixels { rect: IRect, byte_len: usize },
}

// ─── Shared state ─────────────────────────────────────────────────────────────

#[derive(Debug)]
struct OpListState {
    id: OpListId,
    label: &'static str,
    target: Option<ProxyKey>,
    closed: bool,
}

impl OpListState {
    fn new(id: OpListId, label: &'static str) -> Self {
        Self {
            id,
            label,
            target: None,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(ProxyError::OpListClosed(self.id));
        }
        Ok(())
    }
}

// ─── Render-target op list ────────────────────────────────────────────────────

/// Render pass writing a drawable proxy.
#[derive(Debug)]
pub struct RenderTargetOpList {
    state: OpListState,
    ops: SmallVec<[RenderTargetOp; 8]>,
}

impl RenderTargetOpList {
    fn record(&mut self, op: RenderTargetOp) -> Result<()> {
        self.state.ensure_open()?;
        self.ops.push(op);
        Ok(())
    }

    /// Clears the entire render target.
    pub fn full_clear(&mut self, color: wgpu::Color) -> Result<()> {
        // Anything recorded before a full clear is dead.
        self.state.ensure_open()?;
        self.ops.clear();
        self.record(RenderTargetOp::Clear { color })
    }

    /// Discards the contents of the render target.
    pub fn discard(&mut self) -> Result<()> {
        self.record(RenderTargetOp::Discard)
    }

    pub fn draw(&mut self, label: &'static str) -> Result<()> {
        self.record(RenderTargetOp::Draw { label })
    }

    pub fn copy_surface(&mut self, src: ProxyKey, src_rect: IRect, dst_point: UVec2) -> Result<()> {
        self.record(RenderTargetOp::CopySurface(CopyRegion {
            src,
            src_rect,
            dst_point,
        }))
    }

    #[must_use]
    pub fn ops(&self) -> &[RenderTargetOp] {
        &self.ops
    }
}

// ─── Texture op list ──────────────────────────────────────────────────────────

/// Uploads and copies into a samplable proxy.
#[derive(Debug)]
pub struct TextureOpList {
    state: OpListState,
    ops: SmallVec<[TextureOp; 4]>,
}

impl TextureOpList {
    fn record(&mut self, op: TextureOp) -> Result<()> {
        self.state.ensure_open()?;
        self.ops.push(op);
        Ok(())
    }

    pub fn copy_surface(&mut self, src: ProxyKey, src_rect: IRect, dst_point: UVec2) -> Result<()> {
        self.record(TextureOp::CopySurface(CopyRegion {
            src,
            src_rect,
            dst_point,
        }))
    }

    pub fn write_pixels(&mut self, rect: IRect, byte_len: usize) -> Result<()> {
        self.record(TextureOp::WritePixels { rect, byte_len })
    }

    #[must_use]
    pub fn ops(&self) -> &[TextureOp] {
        &self.ops
    }
}

// ─── OpList ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum OpList {
    RenderTarget(RenderTargetOpList),
    Texture(TextureOpList),
}

impl OpList {
    pub(crate) fn new_render_target(id: OpListId, label: &'static str) -> Self {
        Self::RenderTarget(RenderTargetOpList {
            state: OpListState::new(id, label),
            ops: SmallVec::new(),
        })
    }

    pub(crate) fn new_texture(id: OpListId, label: &'static str) -> Self {
        Self::Texture(TextureOpList {
            state: OpListState::new(id, label),
            ops: SmallVec::new(),
        })
    }

    fn state(&self) -> &OpListState {
        match self {
            Self::RenderTarget(l) => &l.state,
            Self::Texture(l) => &l.state,
        }
    }

    fn state_mut(&mut self) -> &mut OpListState {
        match self {
            Self::RenderTarget(l) => &mut l.state,
            Self::Texture(l) => &mut l.state,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> OpListId {
        self.state().id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.state().label
    }

    /// No further writes are pending.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn make_closed(&mut self) {
        self.state_mut().closed = true;
    }

    /// The proxy this op list writes, while that proxy is alive and still
    /// names this op list as its producer.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<ProxyKey> {
        self.state().target
    }

    /// Notifies the op list that its target proxy is going away.
    pub fn clear_target(&mut self) {
        self.state_mut().target = None;
    }

    pub(crate) fn set_target(&mut self, target: ProxyKey) {
        self.state_mut().target = Some(target);
    }

    #[must_use]
    pub fn op_count(&self) -> usize {
        match self {
            Self::RenderTarget(l) => l.ops.len(),
            Self::Texture(l) => l.ops.len(),
        }
    }

    // ── Narrowing ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn as_render_target_op_list(&self) -> Option<&RenderTargetOpList> {
        match self {
            Self::RenderTarget(l) => Some(l),
            Self::Texture(_) => None,
        }
    }

    pub fn as_render_target_op_list_mut(&mut self) -> Option<&mut RenderTargetOpList> {
        match self {
            Self::RenderTarget(l) => Some(l),
            Self::Texture(_) => None,
        }
    }

    #[must_use]
    pub fn as_texture_op_list(&self) -> Option<&TextureOpList> {
        match self {
            Self::Texture(l) => Some(l),
            Self::RenderTarget(_) => None,
        }
    }

    pub fn as_texture_op_list_mut(&mut self) -> Option<&mut TextureOpList> {
        match self {
            Self::Texture(l) => Some(l),
            Self::RenderTarget(_) => None,
        }
    }
}

impl RenderTargetOpList {
    #[inline]
    #[must_use]
    pub fn id(&self) -> OpListId {
        self.state.id
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.closed
    }
}

impl TextureOpList {
    #[inline]
    #[must_use]
    pub fn id(&self) -> OpListId {
        self.state.id
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.closed
    }
}
