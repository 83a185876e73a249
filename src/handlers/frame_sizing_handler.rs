/*
 * WM_NCCALCSIZE: decides how much of the window rectangle is client area.
 *
 * The title bar is removed by handing its vertical space back to the client
 * area, while the left/right/bottom frame (resize borders, rounded corners,
 * shadow) computed by the default procedure is kept. Maximized windows are
 * deliberately oversized by the OS past the monitor edges, so the hidden part
 * has to be trimmed again, and an auto-hide taskbar needs a thin strip left
 * uncovered or it can never be revealed.
 */
use crate::hit_test::{HTERROR, HTNOWHERE};
use crate::platform::{NativeMessage, WindowSystem};
use crate::types::{FrameConfig, Rect, ScreenEdge, WindowHandle};

/// `WVR_REDRAW`: redraw the whole window after a size change.
pub(crate) const WVR_REDRAW: isize = 0x0300;
// All WVR_* flags together (ALIGNTOP..VALIDRECTS).
const WVR_MASK: isize = 0x07F0;

const TASKBAR_EDGE_PRIORITY: [ScreenEdge; 4] = [
    ScreenEdge::Top,
    ScreenEdge::Bottom,
    ScreenEdge::Left,
    ScreenEdge::Right,
];

pub(crate) fn handle_nc_calc_size(
    system: &dyn WindowSystem,
    message: NativeMessage,
    config: &FrameConfig,
) -> isize {
    // WPARAM FALSE: lParam is a bare RECT. TRUE: lParam is NCCALCSIZE_PARAMS.
    let rich = message.wparam != 0;
    let hwnd = message.hwnd;
    let version = system.os_version();

    let proposed = system.read_calc_size_rect(message);
    let mut client_rect = proposed;

    if version.is_win10_or_greater() {
        let default_result = system.default_window_proc(message);
        client_rect = system.read_calc_size_rect(message);
        if is_documented_default_result(default_result, rich) {
            // The whole top frame goes; the top border cannot be kept by adjusting the margin.
            client_rect.top = proposed.top;
        } else {
            log::warn!(
                "WM_NCCALCSIZE: unexpected default result {default_result} for {hwnd}; using the proposed rect."
            );
            client_rect = proposed;
        }
    }

    let maximized = system.is_maximized(hwnd);
    let full_screen = system.is_full_screen(hwnd);

    if maximized && !full_screen {
        let frame = system.resize_border_thickness(hwnd);
        client_rect.top += frame;
        if !version.is_win10_or_greater() {
            client_rect.bottom -= frame;
            client_rect.left += frame;
            client_rect.right -= frame;
        }
    }

    if maximized || full_screen {
        if let Some(edge) = auto_hide_taskbar_edge(system, hwnd) {
            reserve_taskbar_strip(&mut client_rect, edge, config.auto_hide_taskbar_thickness);
            log::trace!("WM_NCCALCSIZE: reserving auto-hide taskbar strip on {edge:?} for {hwnd}");
        }
    }

    system.write_calc_size_rect(message, client_rect);

    // Anything but 0 for the bare-RECT form is invalid; only WVR_REDRAW is safe
    // for the rich form.
    if rich { WVR_REDRAW } else { 0 }
}

fn is_documented_default_result(result: isize, rich: bool) -> bool {
    if result == HTNOWHERE || result == HTERROR {
        return true;
    }
    rich && result > 0 && (result & !WVR_MASK) == 0
}

/// The single monitor edge holding an auto-hide taskbar, if any.
fn auto_hide_taskbar_edge(system: &dyn WindowSystem, hwnd: WindowHandle) -> Option<ScreenEdge> {
    if !system.is_auto_hide_taskbar_enabled() {
        return None;
    }
    if system.os_version().is_win8_1_or_greater() {
        TASKBAR_EDGE_PRIORITY
            .into_iter()
            .find(|edge| system.has_auto_hide_taskbar_on_edge(hwnd, *edge))
    } else {
        system.taskbar_edge_on_window_monitor(hwnd)
    }
}

fn reserve_taskbar_strip(rect: &mut Rect, edge: ScreenEdge, thickness: i32) {
    match edge {
        ScreenEdge::Top => rect.top += thickness,
        ScreenEdge::Bottom => rect.bottom -= thickness,
        ScreenEdge::Left => rect.left += thickness,
        ScreenEdge::Right => rect.right -= thickness,
    }
}
