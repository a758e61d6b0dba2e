use glam::UVec2;

/// Integer texel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl IRect {
    #[must_use]
    pub const fn from_xywh(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole surface of the given extent.
    #[must_use]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::from_xywh(0, 0, width, height)
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> UVec2 {
        UVec2::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(&self, other: &IRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}
