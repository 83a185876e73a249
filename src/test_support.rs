/*
 * Recording fakes for the OS and toolkit seams. They let the handler tests
 * drive message sequences and inspect exactly what would have been posted,
 * tracked or forwarded to the default window procedure.
 */
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::delegate::WindowItemDelegate;
use crate::messages::WM_NCCALCSIZE;
use crate::platform::{NativeMessage, OsVersion, WindowSystem};
use crate::types::{EmulationDelivery, ItemId, Point, Rect, ScreenEdge, Size, WindowHandle};

pub(crate) const TEST_HWND: WindowHandle = WindowHandle::new(0x00C0_FFEE);

pub(crate) struct FakeWindowSystem {
    pub version: Cell<OsVersion>,
    pub valid: Cell<bool>,
    pub maximized: Cell<bool>,
    pub full_screen: Cell<bool>,
    pub dpi: Cell<u32>,
    pub resize_border: Cell<i32>,
    pub auto_hide_enabled: Cell<bool>,
    pub auto_hide_edges: RefCell<Vec<ScreenEdge>>,
    pub legacy_taskbar_edge: Cell<Option<ScreenEdge>>,
    pub key_state: Cell<usize>,
    /// Screen position of the client area's top-left corner.
    pub client_origin: Cell<Point>,
    pub client_size: Cell<Size>,
    pub message_pos: Cell<Point>,
    pub default_result: Cell<isize>,
    /// Payload of the WM_NCCALCSIZE message being processed.
    pub calc_rect: Cell<Rect>,
    /// Insets (left, top, right, bottom) the default procedure applies to `calc_rect`.
    pub default_frame_insets: Cell<(i32, i32, i32, i32)>,
    pub delivered: RefCell<Vec<(NativeMessage, EmulationDelivery)>>,
    pub track_requests: RefCell<Vec<(WindowHandle, bool)>>,
    pub default_calls: RefCell<Vec<NativeMessage>>,
}

impl FakeWindowSystem {
    pub(crate) fn new() -> Self {
        Self {
            version: Cell::new(OsVersion::windows_10()),
            valid: Cell::new(true),
            maximized: Cell::new(false),
            full_screen: Cell::new(false),
            dpi: Cell::new(96),
            resize_border: Cell::new(8),
            auto_hide_enabled: Cell::new(false),
            auto_hide_edges: RefCell::new(Vec::new()),
            legacy_taskbar_edge: Cell::new(None),
            key_state: Cell::new(0),
            client_origin: Cell::new(Point::new(100, 50)),
            client_size: Cell::new(Size::new(800, 600)),
            message_pos: Cell::new(Point::default()),
            default_result: Cell::new(0),
            calc_rect: Cell::new(Rect::default()),
            default_frame_insets: Cell::new((0, 0, 0, 0)),
            delivered: RefCell::new(Vec::new()),
            track_requests: RefCell::new(Vec::new()),
            default_calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn delivered_messages(&self) -> Vec<u32> {
        self.delivered.borrow().iter().map(|(m, _)| m.msg).collect()
    }

    pub(crate) fn clear_records(&self) {
        self.delivered.borrow_mut().clear();
        self.track_requests.borrow_mut().clear();
        self.default_calls.borrow_mut().clear();
    }
}

impl WindowSystem for FakeWindowSystem {
    fn os_version(&self) -> OsVersion {
        self.version.get()
    }

    fn is_valid_top_level_window(&self, _hwnd: WindowHandle) -> bool {
        self.valid.get()
    }

    fn is_maximized(&self, _hwnd: WindowHandle) -> bool {
        self.maximized.get()
    }

    fn is_full_screen(&self, _hwnd: WindowHandle) -> bool {
        self.full_screen.get()
    }

    fn dpi_for_window(&self, _hwnd: WindowHandle) -> u32 {
        self.dpi.get()
    }

    fn resize_border_thickness(&self, _hwnd: WindowHandle) -> i32 {
        self.resize_border.get()
    }

    fn is_auto_hide_taskbar_enabled(&self) -> bool {
        self.auto_hide_enabled.get()
    }

    fn has_auto_hide_taskbar_on_edge(&self, _hwnd: WindowHandle, edge: ScreenEdge) -> bool {
        self.auto_hide_edges.borrow().contains(&edge)
    }

    fn taskbar_edge_on_window_monitor(&self, _hwnd: WindowHandle) -> Option<ScreenEdge> {
        self.legacy_taskbar_edge.get()
    }

    fn key_state(&self) -> usize {
        self.key_state.get()
    }

    fn client_size(&self, _hwnd: WindowHandle) -> Size {
        self.client_size.get()
    }

    fn screen_to_client(&self, _hwnd: WindowHandle, point: Point) -> Point {
        let origin = self.client_origin.get();
        Point::new(point.x - origin.x, point.y - origin.y)
    }

    fn message_pos(&self) -> Point {
        self.message_pos.get()
    }

    fn deliver_message(&self, message: NativeMessage, delivery: EmulationDelivery) {
        self.delivered.borrow_mut().push((message, delivery));
    }

    fn track_mouse_leave(&self, hwnd: WindowHandle, non_client: bool) {
        self.track_requests.borrow_mut().push((hwnd, non_client));
    }

    fn default_window_proc(&self, message: NativeMessage) -> isize {
        self.default_calls.borrow_mut().push(message);
        if message.msg == WM_NCCALCSIZE {
            let (left, top, right, bottom) = self.default_frame_insets.get();
            let rect = self.calc_rect.get();
            self.calc_rect.set(Rect::new(
                rect.left + left,
                rect.top + top,
                rect.right - right,
                rect.bottom - bottom,
            ));
        }
        self.default_result.get()
    }

    fn read_calc_size_rect(&self, _message: NativeMessage) -> Rect {
        self.calc_rect.get()
    }

    fn write_calc_size_rect(&self, _message: NativeMessage, rect: Rect) {
        self.calc_rect.set(rect);
    }
}

/// Toolkit stand-in: items have fixed scene rects, scene space equals client space.
pub(crate) struct FakeDelegate {
    pub geometry: RefCell<HashMap<ItemId, Rect>>,
    pub grab_resets: Cell<u32>,
}

impl FakeDelegate {
    pub(crate) fn new() -> Self {
        Self {
            geometry: RefCell::new(HashMap::new()),
            grab_resets: Cell::new(0),
        }
    }

    pub(crate) fn with_item(self, item: ItemId, rect: Rect) -> Self {
        self.geometry.borrow_mut().insert(item, rect);
        self
    }
}

impl WindowItemDelegate for FakeDelegate {
    fn item_geometry(&self, item: ItemId) -> Option<Rect> {
        self.geometry.borrow().get(&item).copied()
    }

    fn reset_grabbed_control(&self) -> bool {
        self.grab_resets.set(self.grab_resets.get() + 1);
        true
    }

    fn map_from_native(&self, native_local: Point) -> Point {
        native_local
    }
}
