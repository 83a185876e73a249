/*
 * Per-window state for one custom-framed top-level window.
 *
 * `WindowContext` records which toolkit items make up the custom chrome (title
 * bar, system buttons, embedded hit-test-visible controls) and carries the two
 * pieces of mutable emulation state: the part of the window the cursor was
 * last classified over, and whether the last client mouse-leave was
 * swallowed. Its `window_proc` is the message interceptor the hook calls for
 * every message delivered to the window.
 *
 * All state sits behind `Cell`/`RefCell` with short borrows: default-procedure
 * calls made from inside the handlers can re-enter the window procedure.
 */
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::delegate::WindowItemDelegate;
use crate::handlers::{frame_sizing_handler, hit_test_handler, snap_layout_handler};
use crate::hit_test::WindowPart;
use crate::hook_registry::HookRegistry;
use crate::messages::{WM_NCCALCSIZE, WM_NCHITTEST, is_teardown_message};
use crate::platform::{NativeMessage, WindowSystem};
use crate::types::{FrameConfig, ItemId, Point, Rect, SystemButton, WindowHandle};

/// Baseline DPI; DPI-dependent sizes scale from it.
pub(crate) const USER_DEFAULT_SCREEN_DPI: u32 = 96;

pub struct WindowContext {
    hwnd: Cell<WindowHandle>,
    config: FrameConfig,
    delegate: Rc<dyn WindowItemDelegate>,
    last_hit_test_result: Cell<WindowPart>,
    mouse_leave_blocked: Cell<bool>,
    hit_test_visible_items: RefCell<HashSet<ItemId>>,
    hit_test_visible_rects: RefCell<Vec<Rect>>,
    system_buttons: RefCell<HashMap<SystemButton, ItemId>>,
    title_bar: Cell<Option<ItemId>>,
    registry: RefCell<Weak<HookRegistry>>,
}

impl std::fmt::Debug for WindowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowContext")
            .field("hwnd", &self.hwnd.get())
            .field("last_hit_test_result", &self.last_hit_test_result.get())
            .field("mouse_leave_blocked", &self.mouse_leave_blocked.get())
            .field("title_bar", &self.title_bar.get())
            .finish_non_exhaustive()
    }
}

impl Drop for WindowContext {
    fn drop(&mut self) {
        let hwnd = self.hwnd.get();
        let registry = self.registry.get_mut().upgrade();
        if let Some(registry) = registry
            && !hwnd.is_null()
            && registry.release_context(hwnd, self)
        {
            log::debug!("Context of {hwnd} dropped while attached; unhooked.");
        }
    }
}

impl WindowContext {
    pub fn new(delegate: Rc<dyn WindowItemDelegate>, config: FrameConfig) -> Self {
        Self {
            hwnd: Cell::new(WindowHandle::new(0)),
            config,
            delegate,
            last_hit_test_result: Cell::new(WindowPart::Outside),
            mouse_leave_blocked: Cell::new(false),
            hit_test_visible_items: RefCell::new(HashSet::new()),
            hit_test_visible_rects: RefCell::new(Vec::new()),
            system_buttons: RefCell::new(HashMap::new()),
            title_bar: Cell::new(None),
            registry: RefCell::new(Weak::new()),
        }
    }

    pub fn handle(&self) -> WindowHandle {
        self.hwnd.get()
    }

    pub(crate) fn set_handle(&self, hwnd: WindowHandle) {
        self.hwnd.set(hwnd);
    }

    pub(crate) fn set_registry(&self, registry: Weak<HookRegistry>) {
        *self.registry.borrow_mut() = registry;
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub(crate) fn delegate(&self) -> &dyn WindowItemDelegate {
        self.delegate.as_ref()
    }

    pub fn last_hit_test_result(&self) -> WindowPart {
        self.last_hit_test_result.get()
    }

    pub(crate) fn set_last_hit_test_result(&self, part: WindowPart) {
        self.last_hit_test_result.set(part);
    }

    pub fn is_mouse_leave_blocked(&self) -> bool {
        self.mouse_leave_blocked.get()
    }

    pub(crate) fn set_mouse_leave_blocked(&self, blocked: bool) {
        self.mouse_leave_blocked.set(blocked);
    }

    /// Marks a toolkit item as receiving ordinary client input even when it sits
    /// inside the title bar.
    pub fn set_hit_test_visible_item(&self, item: ItemId, visible: bool) -> bool {
        let mut items = self.hit_test_visible_items.borrow_mut();
        if visible {
            items.insert(item);
        } else {
            items.remove(&item);
        }
        true
    }

    /// Same as `set_hit_test_visible_item` for a scene-space rectangle. Invalid rects are rejected.
    pub fn set_hit_test_visible_rect(&self, rect: Rect, visible: bool) -> bool {
        if !rect.is_valid() {
            log::debug!("Rejecting invalid hit-test-visible rect {rect:?}");
            return false;
        }
        let mut rects = self.hit_test_visible_rects.borrow_mut();
        if visible {
            rects.push(rect);
        } else {
            rects.retain(|r| *r != rect);
        }
        true
    }

    /// Binds `item` to a system-button role. Returns `false` for `Unknown` or an unchanged binding.
    pub fn set_system_button(&self, button: SystemButton, item: ItemId) -> bool {
        if button == SystemButton::Unknown {
            log::debug!("Rejecting system button binding for the Unknown role");
            return false;
        }
        let mut buttons = self.system_buttons.borrow_mut();
        if buttons.get(&button) == Some(&item) {
            return false;
        }
        buttons.insert(button, item);
        true
    }

    pub fn set_title_bar(&self, item: ItemId) -> bool {
        if self.title_bar.get() == Some(item) {
            return false;
        }
        self.title_bar.set(Some(item));
        true
    }

    pub fn title_bar(&self) -> Option<ItemId> {
        self.title_bar.get()
    }

    pub fn system_button(&self, button: SystemButton) -> Option<ItemId> {
        self.system_buttons.borrow().get(&button).copied()
    }

    pub fn system_button_role(&self, item: ItemId) -> SystemButton {
        self.system_buttons
            .borrow()
            .iter()
            .find_map(|(role, bound)| (*bound == item).then_some(*role))
            .unwrap_or(SystemButton::Unknown)
    }

    /// The system button under `scene_pos`, if any.
    pub fn system_button_at(&self, scene_pos: Point) -> Option<SystemButton> {
        let buttons: Vec<(SystemButton, ItemId)> = SystemButton::ALL
            .into_iter()
            .filter_map(|role| self.system_button(role).map(|item| (role, item)))
            .collect();
        buttons
            .into_iter()
            .find(|(_, item)| self.delegate.item_contains(*item, scene_pos))
            .map(|(role, _)| role)
    }

    pub fn is_hit_test_visible_at(&self, scene_pos: Point) -> bool {
        let items: Vec<ItemId> = self.hit_test_visible_items.borrow().iter().copied().collect();
        if items
            .into_iter()
            .any(|item| self.delegate.item_contains(item, scene_pos))
        {
            return true;
        }
        self.hit_test_visible_rects
            .borrow()
            .iter()
            .any(|rect| rect.contains(scene_pos))
    }

    /// Part of the title bar that should drag the window: not a button, not an embedded control.
    pub fn is_in_title_bar_dragging_area(&self, scene_pos: Point) -> bool {
        let Some(title_bar) = self.title_bar.get() else {
            return false;
        };
        self.delegate.item_contains(title_bar, scene_pos)
            && self.system_button_at(scene_pos).is_none()
            && !self.is_hit_test_visible_at(scene_pos)
    }

    pub(crate) fn scene_pos_from_screen(&self, system: &dyn WindowSystem, screen: Point) -> Point {
        let native_local = system.screen_to_client(self.handle(), screen);
        self.delegate.map_from_native(native_local)
    }

    /// Whether the surrounding layer must paint the top border itself.
    /// Only Windows 10 loses it; Windows 11 keeps drawing its own.
    pub fn need_border_painter(&self, system: &dyn WindowSystem) -> bool {
        let version = system.os_version();
        version.is_win10_or_greater() && !version.is_win11_or_greater()
    }

    /// Thickness of that top border in physical pixels, 0 when no painter is needed.
    pub fn border_thickness(&self, system: &dyn WindowSystem) -> i32 {
        if !self.need_border_painter(system) {
            return 0;
        }
        let dpi = system.dpi_for_window(self.handle());
        // One logical pixel, rounded to the nearest physical pixel.
        ((dpi + USER_DEFAULT_SCREEN_DPI / 2) / USER_DEFAULT_SCREEN_DPI).max(1) as i32
    }

    /// Message interceptor. `Some(result)` means the message was handled and
    /// `result` should be reported to the toolkit's dispatch.
    pub fn window_proc(&self, system: &dyn WindowSystem, message: NativeMessage) -> Option<isize> {
        if is_teardown_message(message.msg) {
            return None;
        }
        if !system.is_valid_top_level_window(message.hwnd) {
            return None;
        }

        if let Some(result) = snap_layout_handler::handle_snap_layout(self, system, message) {
            return Some(result);
        }

        match message.msg {
            WM_NCCALCSIZE => Some(frame_sizing_handler::handle_nc_calc_size(
                system,
                message,
                &self.config,
            )),
            WM_NCHITTEST => Some(hit_test_handler::handle_nc_hit_test(self, system, message)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{WM_CLOSE, WM_DESTROY, WM_NCDESTROY, WM_NCMOUSEMOVE};
    use crate::platform::OsVersion;
    use crate::test_support::{FakeDelegate, FakeWindowSystem, TEST_HWND};

    const TITLE_BAR: ItemId = ItemId::new(1);
    const CLOSE_BUTTON: ItemId = ItemId::new(2);
    const SEARCH_BOX: ItemId = ItemId::new(3);

    fn context() -> WindowContext {
        let delegate = FakeDelegate::new()
            .with_item(TITLE_BAR, Rect::new(0, 0, 800, 32))
            .with_item(CLOSE_BUTTON, Rect::new(760, 0, 800, 32))
            .with_item(SEARCH_BOX, Rect::new(300, 4, 500, 28));
        let ctx = WindowContext::new(Rc::new(delegate), FrameConfig::default());
        ctx.set_handle(TEST_HWND);
        ctx
    }

    #[test]
    fn new_context_starts_outside_without_suppression() {
        let ctx = context();
        assert_eq!(ctx.last_hit_test_result(), WindowPart::Outside);
        assert!(!ctx.is_mouse_leave_blocked());
        assert_eq!(ctx.title_bar(), None);
    }

    #[test]
    fn unknown_system_button_role_is_rejected() {
        let ctx = context();
        assert!(!ctx.set_system_button(SystemButton::Unknown, CLOSE_BUTTON));
        assert_eq!(ctx.system_button(SystemButton::Unknown), None);
    }

    #[test]
    fn rebinding_same_system_button_reports_no_change() {
        let ctx = context();
        assert!(ctx.set_system_button(SystemButton::Close, CLOSE_BUTTON));
        assert!(!ctx.set_system_button(SystemButton::Close, CLOSE_BUTTON));
        assert_eq!(ctx.system_button(SystemButton::Close), Some(CLOSE_BUTTON));
        assert_eq!(ctx.system_button_role(CLOSE_BUTTON), SystemButton::Close);
        assert_eq!(ctx.system_button_role(TITLE_BAR), SystemButton::Unknown);
    }

    #[test]
    fn title_bar_binding_is_idempotent() {
        let ctx = context();
        assert!(ctx.set_title_bar(TITLE_BAR));
        assert!(!ctx.set_title_bar(TITLE_BAR));
        assert_eq!(ctx.title_bar(), Some(TITLE_BAR));
    }

    #[test]
    fn invalid_hit_test_rect_is_rejected_without_mutation() {
        let ctx = context();
        assert!(!ctx.set_hit_test_visible_rect(Rect::new(10, 10, 10, 20), true));
        assert!(!ctx.is_hit_test_visible_at(Point::new(10, 15)));
    }

    #[test]
    fn hit_test_visible_rect_can_be_added_and_removed() {
        let ctx = context();
        let rect = Rect::new(40, 0, 80, 32);
        assert!(ctx.set_hit_test_visible_rect(rect, true));
        assert!(ctx.is_hit_test_visible_at(Point::new(50, 10)));
        assert!(ctx.set_hit_test_visible_rect(rect, false));
        assert!(!ctx.is_hit_test_visible_at(Point::new(50, 10)));
    }

    #[test]
    fn title_bar_dragging_area_excludes_buttons_and_embedded_controls() {
        let ctx = context();
        ctx.set_title_bar(TITLE_BAR);
        ctx.set_system_button(SystemButton::Close, CLOSE_BUTTON);
        ctx.set_hit_test_visible_item(SEARCH_BOX, true);

        assert!(ctx.is_in_title_bar_dragging_area(Point::new(100, 10)));
        assert!(!ctx.is_in_title_bar_dragging_area(Point::new(780, 10)));
        assert!(!ctx.is_in_title_bar_dragging_area(Point::new(400, 10)));
        assert!(!ctx.is_in_title_bar_dragging_area(Point::new(100, 100)));
        assert_eq!(
            ctx.system_button_at(Point::new(780, 10)),
            Some(SystemButton::Close)
        );
    }

    #[test]
    fn border_painter_only_needed_on_windows_10() {
        let ctx = context();
        let system = FakeWindowSystem::new();
        system.dpi.set(144);
        assert!(ctx.need_border_painter(&system));
        assert_eq!(ctx.border_thickness(&system), 2);

        system.version.set(OsVersion::windows_11());
        assert!(!ctx.need_border_painter(&system));
        assert_eq!(ctx.border_thickness(&system), 0);

        system.version.set(OsVersion::new(6, 3, 9600));
        assert!(!ctx.need_border_painter(&system));
    }

    #[test]
    fn teardown_messages_pass_through_untouched() {
        let ctx = context();
        ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        ctx.set_mouse_leave_blocked(true);
        let system = FakeWindowSystem::new();

        for msg in [WM_CLOSE, WM_DESTROY, WM_NCDESTROY] {
            assert_eq!(
                ctx.window_proc(&system, NativeMessage::new(TEST_HWND, msg, 0, 0)),
                None
            );
        }

        assert_eq!(ctx.last_hit_test_result(), WindowPart::ChromeButton);
        assert!(ctx.is_mouse_leave_blocked());
        assert!(system.delivered.borrow().is_empty());
        assert!(system.default_calls.borrow().is_empty());
    }

    #[test]
    fn invalid_window_is_not_intercepted() {
        let ctx = context();
        ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        let system = FakeWindowSystem::new();
        system.valid.set(false);

        let result = ctx.window_proc(&system, NativeMessage::new(TEST_HWND, WM_NCMOUSEMOVE, 0, 0));

        assert_eq!(result, None);
        assert_eq!(ctx.last_hit_test_result(), WindowPart::ChromeButton);
    }
}
