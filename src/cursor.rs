//! Standard cursors and custom cursors.

use crate::image::RgbaImage;
use crate::Vec2;

/// Identifies a cursor created by a `Display`.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CursorId(pub(crate) u64);

/// Cursor shapes most platforms provide.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum StandardCursor {
    Arrow,
    IBeam,
    Crosshair,
    PointingHand,
    ResizeEW,
    ResizeNS,
    ResizeNWSE,
    ResizeNESW,
    ResizeAll,
    NotAllowed,
}

/// What a cursor looks like.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum CursorSource {
    /// An alpha-blended image. `hotspot` is relative to its top-left corner.
    Image { image: RgbaImage, hotspot: Vec2<i32> },
    #[allow(missing_docs)]
    Standard(StandardCursor),
}

/// A cursor, which windows may share.
#[derive(Debug)]
pub struct Cursor {
    pub(crate) id: CursorId,
    pub(crate) source: CursorSource,
}

impl Cursor {
    #[allow(missing_docs)]
    pub fn id(&self) -> CursorId { self.id }
    #[allow(missing_docs)]
    pub fn source(&self) -> &CursorSource { &self.source }
}

/// The image a backend should show over a window's content area.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum CursorImage {
    /// The platform's default arrow.
    Arrow,
    #[allow(missing_docs)]
    Hidden,
    #[allow(missing_docs)]
    Custom(CursorId),
}
