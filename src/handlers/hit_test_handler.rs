/*
 * WM_NCHITTEST: tells the OS which part of the custom frame is under the
 * cursor and records the answer as the context's last hit-test result, which
 * drives the client-area emulation on the following mouse messages.
 */
use crate::hit_test::{
    HTBOTTOM, HTBOTTOMLEFT, HTBOTTOMRIGHT, HTCAPTION, HTCLIENT, HTLEFT, HTRIGHT, HTTOP,
    HTTOPLEFT, HTTOPRIGHT, hit_test_code_for_button, is_frame_hit_test,
    window_part_from_hit_test,
};
use crate::messages::point_from_lparam;
use crate::platform::{NativeMessage, WindowSystem};
use crate::types::{Point, Size};
use crate::window_context::WindowContext;

pub(crate) fn handle_nc_hit_test(
    ctx: &WindowContext,
    system: &dyn WindowSystem,
    message: NativeMessage,
) -> isize {
    let code = compute_hit_test(ctx, system, message);
    ctx.set_last_hit_test_result(window_part_from_hit_test(code));
    code
}

fn compute_hit_test(
    ctx: &WindowContext,
    system: &dyn WindowSystem,
    message: NativeMessage,
) -> isize {
    let hwnd = message.hwnd;

    // On Windows 10 the OS still reports the left, right and bottom frame.
    let default_code = system.default_window_proc(message);
    if is_frame_hit_test(default_code) {
        return default_code;
    }

    let screen_pos = point_from_lparam(message.lparam);
    let native_local = system.screen_to_client(hwnd, screen_pos);
    let scene_pos = ctx.delegate().map_from_native(native_local);

    if let Some(button) = ctx.system_button_at(scene_pos) {
        return hit_test_code_for_button(button);
    }
    if ctx.is_hit_test_visible_at(scene_pos) {
        return HTCLIENT;
    }

    // The frame was folded into the client area, so its resize strips are ours to report.
    let restored = !system.is_maximized(hwnd) && !system.is_full_screen(hwnd);
    if restored {
        let frame = system.resize_border_thickness(hwnd);
        if system.os_version().is_win10_or_greater() {
            if native_local.y >= 0 && native_local.y < frame {
                return HTTOP;
            }
        } else {
            let client = system.client_size(hwnd);
            if let Some(code) = resize_edge_at(native_local, client, frame) {
                return code;
            }
        }
    }

    if ctx.is_in_title_bar_dragging_area(scene_pos) {
        return HTCAPTION;
    }
    HTCLIENT
}

/// Resize code for a client position within `frame` pixels of any client edge.
fn resize_edge_at(pos: Point, client: Size, frame: i32) -> Option<isize> {
    if pos.x < 0 || pos.y < 0 || pos.x >= client.width || pos.y >= client.height {
        return None;
    }
    let left = pos.x < frame;
    let right = pos.x >= client.width - frame;
    let top = pos.y < frame;
    let bottom = pos.y >= client.height - frame;
    let code = match (top, bottom, left, right) {
        (true, _, true, _) => HTTOPLEFT,
        (true, _, _, true) => HTTOPRIGHT,
        (_, true, true, _) => HTBOTTOMLEFT,
        (_, true, _, true) => HTBOTTOMRIGHT,
        (true, _, _, _) => HTTOP,
        (_, true, _, _) => HTBOTTOM,
        (_, _, true, _) => HTLEFT,
        (_, _, _, true) => HTRIGHT,
        _ => return None,
    };
    Some(code)
}
