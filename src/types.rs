/*
 * Platform-agnostic types shared between the portable frame logic and the
 * Win32 glue: opaque window/item identifiers, the logical system-button roles,
 * simple integer geometry that mirrors the native POINT/SIZE/RECT layouts, and
 * the per-context configuration.
 */
use std::fmt;

/// Opaque native window handle. Stable for the lifetime of the native window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const fn new(raw: isize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> isize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Null handles are printed too; they show up in diagnostics for half-built windows.
        write!(f, "0x{:08X}", self.0 as usize)
    }
}

/// Identifies a toolkit object (widget, item) known to the surrounding layer.
/// The crate never dereferences it; geometry questions go through the delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Logical role of a custom-drawn title bar button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemButton {
    Unknown,
    WindowIcon,
    Help,
    Minimize,
    Maximize,
    Close,
}

impl SystemButton {
    /// Roles that can actually be bound to an item, in hit-test priority order.
    pub const ALL: [SystemButton; 5] = [
        SystemButton::WindowIcon,
        SystemButton::Help,
        SystemButton::Minimize,
        SystemButton::Maximize,
        SystemButton::Close,
    ];
}

/// Monitor edge, used for auto-hide taskbar detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenEdge {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Edge-based rectangle with the native convention: `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
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

    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(
            origin.x,
            origin.y,
            origin.x + size.width,
            origin.y + size.height,
        )
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// A rectangle is valid when it encloses at least one pixel.
    pub const fn is_valid(&self) -> bool {
        self.left < self.right && self.top < self.bottom
    }

    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

/// How emulated client-area messages are delivered to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmulationDelivery {
    /// Queue the message so it is processed on a later turn of the message loop.
    #[default]
    Post,
    /// Dispatch synchronously, re-entering the window procedure.
    Send,
}

/// Per-window tuning for the frame handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Pixels left uncovered on the edge holding an auto-hide taskbar while
    /// maximized or full screen.
    pub auto_hide_taskbar_thickness: i32,
    pub emulation_delivery: EmulationDelivery,
}

/// Thickness of the reveal strip kept free for an auto-hide taskbar.
pub const AUTO_HIDE_TASKBAR_THICKNESS: i32 = 2;

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            auto_hide_taskbar_thickness: AUTO_HIDE_TASKBAR_THICKNESS,
            emulation_delivery: EmulationDelivery::Post,
        }
    }
}
