/*
 * The seam between the portable frame handlers and the operating system.
 * Handlers describe what they need (window state, monitor/taskbar layout, live
 * key state, message delivery) through `WindowSystem`; the Win32 build provides
 * the real implementation and the unit tests a recording fake.
 */
use crate::types::{EmulationDelivery, Point, Rect, ScreenEdge, Size, WindowHandle};

/// One native window message as delivered to a window procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeMessage {
    pub hwnd: WindowHandle,
    pub msg: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl NativeMessage {
    pub const fn new(hwnd: WindowHandle, msg: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            hwnd,
            msg,
            wparam,
            lparam,
        }
    }
}

/// Running OS version, as reported by the kernel (not the compatibility-shimmed value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct OsVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

const WIN11_FIRST_BUILD: u32 = 22000;

impl OsVersion {
    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }

    pub const fn windows_10() -> Self {
        Self::new(10, 0, 19045)
    }

    pub const fn windows_11() -> Self {
        Self::new(10, 0, WIN11_FIRST_BUILD)
    }

    pub fn is_win8_1_or_greater(&self) -> bool {
        (self.major, self.minor) >= (6, 3)
    }

    /// Windows 10 is the first build that draws the frame itself through DWM and
    /// handles per-monitor frame sizing when maximized.
    pub fn is_win10_or_greater(&self) -> bool {
        self.major >= 10
    }

    pub fn is_win11_or_greater(&self) -> bool {
        self.major >= 10 && self.build >= WIN11_FIRST_BUILD
    }
}

pub trait WindowSystem {
    fn os_version(&self) -> OsVersion;

    /// Window exists, is enabled, is not a tool window, has a non-empty rect and is top level.
    fn is_valid_top_level_window(&self, hwnd: WindowHandle) -> bool;

    fn is_maximized(&self, hwnd: WindowHandle) -> bool;

    /// Window rect covers the full monitor rect (not just the work area).
    fn is_full_screen(&self, hwnd: WindowHandle) -> bool;

    fn dpi_for_window(&self, hwnd: WindowHandle) -> u32;

    /// Sizing frame plus padded border, in physical pixels at the window's DPI.
    fn resize_border_thickness(&self, hwnd: WindowHandle) -> i32;

    fn is_auto_hide_taskbar_enabled(&self) -> bool;

    /// Per-monitor auto-hide appbar query. Only meaningful on Windows 8.1 and later.
    fn has_auto_hide_taskbar_on_edge(&self, hwnd: WindowHandle, edge: ScreenEdge) -> bool;

    /// Edge of the shell taskbar if it lives on the same monitor as the window.
    /// Pre-8.1 heuristic.
    fn taskbar_edge_on_window_monitor(&self, hwnd: WindowHandle) -> Option<ScreenEdge>;

    /// Live `MK_*` mouse/modifier state.
    fn key_state(&self) -> usize;

    fn client_size(&self, hwnd: WindowHandle) -> Size;

    fn screen_to_client(&self, hwnd: WindowHandle, point: Point) -> Point;

    /// Screen position of the cursor when the current message was generated.
    fn message_pos(&self) -> Point;

    fn deliver_message(&self, message: NativeMessage, delivery: EmulationDelivery);

    /// Ask for a (non-)client mouse-leave notification on the next exit.
    fn track_mouse_leave(&self, hwnd: WindowHandle, non_client: bool);

    fn default_window_proc(&self, message: NativeMessage) -> isize;

    /// Proposed window rectangle carried by a WM_NCCALCSIZE message (first rect of the rich form).
    fn read_calc_size_rect(&self, message: NativeMessage) -> Rect;

    /// Stores the computed client rectangle back into the WM_NCCALCSIZE payload.
    fn write_calc_size_rect(&self, message: NativeMessage, rect: Rect);
}
