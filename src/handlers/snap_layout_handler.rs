/*
 * Client-area emulation for custom chrome buttons.
 *
 * To get the OS snap-layout flyout, the maximize button must be reported to
 * the OS as a real non-client button (HTZOOM). From then on the OS only sends
 * non-client mouse messages for it, which the toolkit never turns into widget
 * input. This handler re-emits them as their client-area twins so the
 * custom-drawn buttons still hover and click, and filters the spurious
 * WM_MOUSELEAVE the toolkit's own leave tracking produces as a side effect.
 */
use crate::hit_test::WindowPart;
use crate::messages::*;
use crate::platform::{NativeMessage, WindowSystem};
use crate::types::FrameConfig;
use crate::window_context::WindowContext;

pub(crate) fn handle_snap_layout(
    ctx: &WindowContext,
    system: &dyn WindowSystem,
    message: NativeMessage,
) -> Option<isize> {
    match message.msg {
        WM_MOUSELEAVE => handle_client_mouse_leave(ctx, system, message),
        WM_MOUSEMOVE => {
            // The toolkit only re-arms leave tracking after it sees a leave; when we swallowed
            // one it never will, so do it on its behalf.
            if ctx.last_hit_test_result() != WindowPart::ChromeButton
                && ctx.is_mouse_leave_blocked()
            {
                ctx.set_mouse_leave_blocked(false);
                system.track_mouse_leave(message.hwnd, false);
                log::trace!("WM_MOUSEMOVE: re-armed leave tracking for {}", message.hwnd);
            }
            None
        }
        WM_NCMOUSEMOVE | WM_NCLBUTTONDOWN | WM_NCLBUTTONUP | WM_NCLBUTTONDBLCLK
        | WM_NCRBUTTONDOWN | WM_NCRBUTTONUP | WM_NCRBUTTONDBLCLK | WM_NCMBUTTONDOWN
        | WM_NCMBUTTONUP | WM_NCMBUTTONDBLCLK | WM_NCXBUTTONDOWN | WM_NCXBUTTONUP
        | WM_NCXBUTTONDBLCLK | WM_NCMOUSEHOVER => handle_nc_mouse_input(ctx, system, message),
        WM_NCMOUSELEAVE => {
            handle_nc_mouse_leave(ctx, system, message);
            None
        }
        _ => None,
    }
}

fn handle_client_mouse_leave(
    ctx: &WindowContext,
    system: &dyn WindowSystem,
    message: NativeMessage,
) -> Option<isize> {
    if !is_emulated_message(message.wparam) {
        // Re-emitting WM_NCMOUSEMOVE as WM_MOUSEMOVE makes the toolkit track leaves, and the
        // OS answers with a leave as soon as the cursor is back over non-client chrome.
        let scene_pos = ctx.scene_pos_from_screen(system, system.message_pos());
        if let Some(button) = ctx.system_button_at(scene_pos) {
            ctx.set_mouse_leave_blocked(true);
            log::trace!("WM_MOUSELEAVE over {button:?} suppressed for {}", message.hwnd);
            return Some(0);
        }
    }
    ctx.set_mouse_leave_blocked(false);
    None
}

fn handle_nc_mouse_input(
    ctx: &WindowContext,
    system: &dyn WindowSystem,
    message: NativeMessage,
) -> Option<isize> {
    let current_part = ctx.last_hit_test_result();

    if message.msg == WM_NCMOUSEMOVE {
        if current_part != WindowPart::ChromeButton {
            ctx.delegate().reset_grabbed_control();
            if ctx.is_mouse_leave_blocked() {
                emulate_client_area_message(system, ctx.config(), message, Some(WM_NCMOUSELEAVE));
            }
        }
        // A fresh WM_NCHITTEST precedes the next WM_NCMOUSELEAVE when the cursor enters the
        // client area; if it leaves the window instead the part correctly stays Outside.
        ctx.set_last_hit_test_result(WindowPart::Outside);
    }

    if current_part != WindowPart::ChromeButton {
        return None;
    }

    emulate_client_area_message(system, ctx.config(), message, None);
    let result = if message.msg == WM_NCMOUSEMOVE {
        // Keeps the OS cursor and snap-layout hover feedback alive.
        system.default_window_proc(message)
    } else if is_nc_xbutton_message(message.msg) {
        // X-button messages must report TRUE when handled.
        1
    } else {
        0
    };
    Some(result)
}

fn handle_nc_mouse_leave(ctx: &WindowContext, system: &dyn WindowSystem, message: NativeMessage) {
    let current_part = ctx.last_hit_test_result();
    if current_part == WindowPart::ChromeButton {
        // Pressing a chrome button and dragging makes the OS treat the area as client and
        // send a leave right away, followed by client moves: track them ahead of time.
        if ctx.is_mouse_leave_blocked() {
            ctx.set_mouse_leave_blocked(false);
            system.track_mouse_leave(message.hwnd, false);
        }
        return;
    }

    if ctx.is_mouse_leave_blocked() {
        // Moving from a chrome button to other chrome: the button's client twin needs its leave.
        emulate_client_area_message(system, ctx.config(), message, Some(WM_NCMOUSELEAVE));
    }
    if current_part == WindowPart::Outside {
        ctx.delegate().reset_grabbed_control();
    }
}

/// Posts (or sends) the client-area twin of a non-client mouse message.
///
/// The key-state word is rebuilt from live key state, since the OS fills the
/// non-client WPARAM with a hit-test code instead. Leave messages carry
/// `EMULATED_MESSAGE_TAG` so they can be recognised when they come back.
pub(crate) fn emulate_client_area_message(
    system: &dyn WindowSystem,
    config: &FrameConfig,
    message: NativeMessage,
    override_msg: Option<u32>,
) {
    let source_msg = override_msg.unwrap_or(message.msg);
    let Some(client_msg) = client_equivalent(source_msg) else {
        return;
    };

    let (wparam, lparam) = if source_msg == WM_NCMOUSELEAVE {
        (EMULATED_MESSAGE_TAG, 0)
    } else {
        let key_state = system.key_state();
        let wparam = if is_nc_xbutton_message(source_msg) {
            make_wparam(key_state as u16, xbutton_from_wparam(message.wparam))
        } else {
            key_state
        };
        let screen_pos = point_from_lparam(message.lparam);
        let client_pos = system.screen_to_client(message.hwnd, screen_pos);
        (wparam, lparam_from_point(client_pos))
    };

    log::trace!(
        "Emulating {client_msg:#06X} from {source_msg:#06X} for {}",
        message.hwnd
    );
    system.deliver_message(
        NativeMessage::new(message.hwnd, client_msg, wparam, lparam),
        config.emulation_delivery,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeDelegate, FakeWindowSystem, TEST_HWND};
    use crate::types::{EmulationDelivery, ItemId, Point, Rect, SystemButton};
    use std::rc::Rc;

    const MAXIMIZE_BUTTON: ItemId = ItemId::new(10);

    // Client origin in the fake is (100, 50); the maximize button covers client (700..740, 0..32).
    const OVER_BUTTON_SCREEN: Point = Point::new(810, 60);
    const OVER_TITLE_SCREEN: Point = Point::new(300, 60);

    struct Fixture {
        ctx: WindowContext,
        system: FakeWindowSystem,
        delegate: Rc<FakeDelegate>,
    }

    fn fixture() -> Fixture {
        let delegate =
            Rc::new(FakeDelegate::new().with_item(MAXIMIZE_BUTTON, Rect::new(700, 0, 740, 32)));
        let ctx = WindowContext::new(delegate.clone(), FrameConfig::default());
        ctx.set_handle(TEST_HWND);
        ctx.set_system_button(SystemButton::Maximize, MAXIMIZE_BUTTON);
        Fixture {
            ctx,
            system: FakeWindowSystem::new(),
            delegate,
        }
    }

    fn nc_message(msg: u32, wparam: usize, screen: Point) -> NativeMessage {
        NativeMessage::new(TEST_HWND, msg, wparam, lparam_from_point(screen))
    }

    impl Fixture {
        fn dispatch(&self, message: NativeMessage) -> Option<isize> {
            handle_snap_layout(&self.ctx, &self.system, message)
        }
    }

    #[test]
    fn nc_move_over_chrome_button_becomes_client_move() {
        let f = fixture();
        f.ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        f.system.key_state.set(MK_SHIFT);
        f.system.default_result.set(0x55);

        let result = f.dispatch(nc_message(WM_NCMOUSEMOVE, 9, OVER_BUTTON_SCREEN));

        assert_eq!(result, Some(0x55));
        let delivered = f.system.delivered.borrow();
        assert_eq!(delivered.len(), 1);
        let (emulated, delivery) = delivered[0];
        assert_eq!(emulated.msg, WM_MOUSEMOVE);
        assert_eq!(emulated.wparam, MK_SHIFT);
        assert_eq!(point_from_lparam(emulated.lparam), Point::new(710, 10));
        assert_eq!(delivery, EmulationDelivery::Post);
        assert_eq!(f.system.default_calls.borrow().len(), 1);
        assert_eq!(f.ctx.last_hit_test_result(), WindowPart::Outside);
    }

    #[test]
    fn key_state_comes_from_live_state_not_nc_wparam() {
        let f = fixture();
        f.ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        f.system.key_state.set(MK_LBUTTON | MK_CONTROL);

        // The non-client WPARAM is a hit-test code (HTZOOM), never a key state.
        let result = f.dispatch(nc_message(WM_NCLBUTTONDOWN, 9, OVER_BUTTON_SCREEN));

        assert_eq!(result, Some(0));
        let delivered = f.system.delivered.borrow();
        assert_eq!(delivered[0].0.msg, WM_LBUTTONDOWN);
        assert_eq!(delivered[0].0.wparam, MK_LBUTTON | MK_CONTROL);
        assert!(f.system.default_calls.borrow().is_empty());
    }

    #[test]
    fn each_button_message_emits_exactly_one_client_twin() {
        let f = fixture();
        let sequence = [
            (WM_NCLBUTTONDOWN, WM_LBUTTONDOWN),
            (WM_NCLBUTTONUP, WM_LBUTTONUP),
            (WM_NCLBUTTONDBLCLK, WM_LBUTTONDBLCLK),
            (WM_NCRBUTTONDOWN, WM_RBUTTONDOWN),
            (WM_NCMBUTTONUP, WM_MBUTTONUP),
            (WM_NCMOUSEHOVER, WM_MOUSEHOVER),
        ];
        for (nc, _) in sequence {
            f.ctx.set_last_hit_test_result(WindowPart::ChromeButton);
            assert_eq!(f.dispatch(nc_message(nc, 0, OVER_BUTTON_SCREEN)), Some(0));
        }
        let expected: Vec<u32> = sequence.iter().map(|(_, client)| *client).collect();
        assert_eq!(f.system.delivered_messages(), expected);
    }

    #[test]
    fn xbutton_messages_report_true_and_keep_button_selector() {
        let f = fixture();
        f.ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        f.system.key_state.set(MK_XBUTTON2);

        let result = f.dispatch(nc_message(
            WM_NCXBUTTONDOWN,
            make_wparam(9, 2),
            OVER_BUTTON_SCREEN,
        ));

        assert_eq!(result, Some(1));
        let delivered = f.system.delivered.borrow();
        assert_eq!(delivered[0].0.msg, WM_XBUTTONDOWN);
        assert_eq!(delivered[0].0.wparam, make_wparam(MK_XBUTTON2 as u16, 2));
    }

    #[test]
    fn nc_input_outside_chrome_button_is_not_handled() {
        let f = fixture();
        f.ctx.set_last_hit_test_result(WindowPart::TitleBar);

        assert_eq!(
            f.dispatch(nc_message(WM_NCLBUTTONDOWN, 2, OVER_TITLE_SCREEN)),
            None
        );
        assert!(f.system.delivered.borrow().is_empty());
        assert_eq!(f.ctx.last_hit_test_result(), WindowPart::TitleBar);
    }

    #[test]
    fn nc_move_away_from_button_resets_grab_and_flushes_pending_leave() {
        let f = fixture();
        f.ctx.set_last_hit_test_result(WindowPart::TitleBar);
        f.ctx.set_mouse_leave_blocked(true);

        let result = f.dispatch(nc_message(WM_NCMOUSEMOVE, 2, OVER_TITLE_SCREEN));

        assert_eq!(result, None);
        assert_eq!(f.delegate.grab_resets.get(), 1);
        let delivered = f.system.delivered.borrow();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0.msg, WM_MOUSELEAVE);
        assert_eq!(delivered[0].0.wparam, EMULATED_MESSAGE_TAG);
        assert_eq!(delivered[0].0.lparam, 0);
        assert_eq!(f.ctx.last_hit_test_result(), WindowPart::Outside);
    }

    #[test]
    fn os_leave_over_system_button_is_suppressed() {
        let f = fixture();
        f.system.message_pos.set(OVER_BUTTON_SCREEN);

        let result = f.dispatch(NativeMessage::new(TEST_HWND, WM_MOUSELEAVE, 0, 0));

        assert_eq!(result, Some(0));
        assert!(f.ctx.is_mouse_leave_blocked());
    }

    #[test]
    fn os_leave_elsewhere_clears_suppression_and_propagates() {
        let f = fixture();
        f.ctx.set_mouse_leave_blocked(true);
        f.system.message_pos.set(OVER_TITLE_SCREEN);

        let result = f.dispatch(NativeMessage::new(TEST_HWND, WM_MOUSELEAVE, 0, 0));

        assert_eq!(result, None);
        assert!(!f.ctx.is_mouse_leave_blocked());
    }

    #[test]
    fn emulated_leave_is_never_suppressed() {
        let f = fixture();
        f.ctx.set_mouse_leave_blocked(true);
        f.system.message_pos.set(OVER_BUTTON_SCREEN);

        let result = f.dispatch(NativeMessage::new(
            TEST_HWND,
            WM_MOUSELEAVE,
            EMULATED_MESSAGE_TAG,
            0,
        ));

        assert_eq!(result, None);
        assert!(!f.ctx.is_mouse_leave_blocked());
    }

    #[test]
    fn client_move_after_suppressed_leave_rearms_tracking() {
        let f = fixture();
        f.system.message_pos.set(OVER_BUTTON_SCREEN);
        f.dispatch(NativeMessage::new(TEST_HWND, WM_MOUSELEAVE, 0, 0));
        assert!(f.ctx.is_mouse_leave_blocked());

        f.ctx.set_last_hit_test_result(WindowPart::ClientArea);
        let result = f.dispatch(NativeMessage::new(TEST_HWND, WM_MOUSEMOVE, 0, 0));

        assert_eq!(result, None);
        assert!(!f.ctx.is_mouse_leave_blocked());
        assert_eq!(*f.system.track_requests.borrow(), vec![(TEST_HWND, false)]);
    }

    #[test]
    fn client_move_over_chrome_button_keeps_suppression() {
        let f = fixture();
        f.ctx.set_mouse_leave_blocked(true);
        f.ctx.set_last_hit_test_result(WindowPart::ChromeButton);

        f.dispatch(NativeMessage::new(TEST_HWND, WM_MOUSEMOVE, 0, 0));

        assert!(f.ctx.is_mouse_leave_blocked());
        assert!(f.system.track_requests.borrow().is_empty());
    }

    #[test]
    fn nc_leave_over_chrome_button_rearms_tracking_once() {
        let f = fixture();
        f.ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        f.ctx.set_mouse_leave_blocked(true);

        let result = f.dispatch(NativeMessage::new(TEST_HWND, WM_NCMOUSELEAVE, 0, 0));

        assert_eq!(result, None);
        assert!(!f.ctx.is_mouse_leave_blocked());
        assert_eq!(f.system.track_requests.borrow().len(), 1);
        assert!(f.system.delivered.borrow().is_empty());
    }

    #[test]
    fn nc_leave_outside_resets_grab_without_pending_leave() {
        let f = fixture();

        let result = f.dispatch(NativeMessage::new(TEST_HWND, WM_NCMOUSELEAVE, 0, 0));

        assert_eq!(result, None);
        assert_eq!(f.delegate.grab_resets.get(), 1);
        assert!(f.system.delivered.borrow().is_empty());
    }

    #[test]
    fn nc_leave_over_title_bar_keeps_grab() {
        let f = fixture();
        f.ctx.set_last_hit_test_result(WindowPart::TitleBar);

        f.dispatch(NativeMessage::new(TEST_HWND, WM_NCMOUSELEAVE, 0, 0));

        assert_eq!(f.delegate.grab_resets.get(), 0);
    }

    #[test]
    fn hover_then_leave_button_synthesizes_exactly_one_leave() {
        let f = fixture();
        f.system.message_pos.set(OVER_BUTTON_SCREEN);

        // The hit test put the cursor over the maximize button.
        f.ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        f.dispatch(nc_message(WM_NCMOUSEMOVE, 9, OVER_BUTTON_SCREEN));
        // The toolkit's leave tracking fires while the cursor is still on the button.
        f.dispatch(NativeMessage::new(TEST_HWND, WM_MOUSELEAVE, 0, 0));
        assert!(f.ctx.is_mouse_leave_blocked());
        f.system.clear_records();

        f.dispatch(NativeMessage::new(TEST_HWND, WM_NCMOUSELEAVE, 0, 0));

        assert_eq!(f.system.delivered_messages(), vec![WM_MOUSELEAVE]);
        assert_eq!(f.ctx.last_hit_test_result(), WindowPart::Outside);
        // The synthesized leave comes back tagged and lifts the suppression.
        let (emulated, _) = f.system.delivered.borrow()[0];
        f.dispatch(emulated);
        assert!(!f.ctx.is_mouse_leave_blocked());
    }

    #[test]
    fn send_delivery_is_honoured() {
        let delegate = Rc::new(FakeDelegate::new());
        let config = FrameConfig {
            emulation_delivery: EmulationDelivery::Send,
            ..FrameConfig::default()
        };
        let ctx = WindowContext::new(delegate, config);
        ctx.set_handle(TEST_HWND);
        ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        let system = FakeWindowSystem::new();

        handle_snap_layout(&ctx, &system, nc_message(WM_NCMOUSEHOVER, 0, OVER_BUTTON_SCREEN));

        assert_eq!(system.delivered.borrow()[0].1, EmulationDelivery::Send);
    }

    #[test]
    fn unrelated_messages_fall_through() {
        let f = fixture();
        f.ctx.set_last_hit_test_result(WindowPart::ChromeButton);
        assert_eq!(
            f.dispatch(NativeMessage::new(TEST_HWND, WM_NCCALCSIZE, 0, 0)),
            None
        );
        assert!(f.system.delivered.borrow().is_empty());
    }
}
