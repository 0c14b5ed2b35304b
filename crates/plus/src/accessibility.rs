//! Accessibility tree access.
//!
//! The browser exposes its UI chrome (tab strip, toolbar, bookmark bar, menus) as an
//! MSAA tree. Nodes are reference counted by the host: in this crate a node value
//! holds one reference, `Clone` adds one and `Drop` releases it, so every node the
//! walker hands out is released on every path.

pub mod walker;

#[cfg(test)]
pub(crate) mod mock;

pub use walker::{
    Flow, Mode, PAGE_SIZE, bounding_box, find_element_with_role, has_state, is_visible, parent,
    traverse,
};

use browser_plus_event::input::InputPosition;

/// MSAA object role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Role(pub u32);

impl Role {
    pub const MENU_ITEM: Role = Role(0x0C);
    pub const DOCUMENT: Role = Role(0x0F);
    pub const PANE: Role = Role(0x10);
    pub const GROUPING: Role = Role(0x14);
    pub const TOOLBAR: Role = Role(0x16);
    pub const PAGE_TAB: Role = Role(0x25);
    pub const TEXT: Role = Role(0x2A);
    pub const PUSH_BUTTON: Role = Role(0x2B);
    pub const PAGE_TAB_LIST: Role = Role(0x3C);
}

bitflags::bitflags! {
    /// MSAA object state bits.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct State: u32 {
        const SELECTED = 0x2;
        const FOCUSED = 0x4;
        const PRESSED = 0x8;
        const EXPANDED = 0x200;
        const COLLAPSED = 0x400;
        const INVISIBLE = 0x8000;
        const OFFSCREEN = 0x10000;
        const FOCUSABLE = 0x100000;

        const _ = !0;
    }
}

/// Screen location as reported by the host: origin plus extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Screen rectangle. Left and top edges are inside, right and bottom edges outside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub const fn contains(&self, point: InputPosition) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

impl From<Location> for Rect {
    fn from(loc: Location) -> Self {
        Rect {
            left: loc.x,
            top: loc.y,
            right: loc.x.saturating_add(loc.width),
            bottom: loc.y.saturating_add(loc.height),
        }
    }
}

/// A node of the host accessibility tree.
///
/// Every query may fail; a failure is reported as `None` and never as a panic.
pub trait Accessible: Clone {
    fn child_count(&self) -> Option<usize>;

    /// Up to `count` children starting at index `start`.
    fn children(&self, start: usize, count: usize) -> Option<Vec<Self>>;

    fn parent(&self) -> Option<Self>;

    fn role(&self) -> Option<Role>;

    fn state(&self) -> Option<State>;

    fn name(&self) -> Option<String>;

    fn description(&self) -> Option<String>;

    fn value(&self) -> Option<String>;

    fn location(&self) -> Option<Location>;
}
