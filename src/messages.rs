/*
 * The native window-message vocabulary the frame handlers interpret. The
 * numeric values are fixed by the OS ABI; they are spelled out here (instead
 * of pulled from windows-rs) so the portable handlers and their tests compile
 * on every platform, and because a few of them are undocumented and have no
 * binding at all.
 *
 * Also hosts the bit-packing helpers for WPARAM/LPARAM words and the
 * reconstruction of the mouse/modifier key-state word.
 */
use crate::types::Point;

pub const WM_DESTROY: u32 = 0x0002;
pub const WM_CLOSE: u32 = 0x0010;
pub const WM_NCDESTROY: u32 = 0x0082;
pub const WM_NCCALCSIZE: u32 = 0x0083;
pub const WM_NCHITTEST: u32 = 0x0084;
// Undocumented, sent while a window with a themed frame is torn down.
pub const WM_UAHDESTROYWINDOW: u32 = 0x0090;

pub const WM_NCMOUSEMOVE: u32 = 0x00A0;
pub const WM_NCLBUTTONDOWN: u32 = 0x00A1;
pub const WM_NCLBUTTONUP: u32 = 0x00A2;
pub const WM_NCLBUTTONDBLCLK: u32 = 0x00A3;
pub const WM_NCRBUTTONDOWN: u32 = 0x00A4;
pub const WM_NCRBUTTONUP: u32 = 0x00A5;
pub const WM_NCRBUTTONDBLCLK: u32 = 0x00A6;
pub const WM_NCMBUTTONDOWN: u32 = 0x00A7;
pub const WM_NCMBUTTONUP: u32 = 0x00A8;
pub const WM_NCMBUTTONDBLCLK: u32 = 0x00A9;
pub const WM_NCXBUTTONDOWN: u32 = 0x00AB;
pub const WM_NCXBUTTONUP: u32 = 0x00AC;
pub const WM_NCXBUTTONDBLCLK: u32 = 0x00AD;

pub const WM_MOUSEMOVE: u32 = 0x0200;
pub const WM_LBUTTONDOWN: u32 = 0x0201;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_LBUTTONDBLCLK: u32 = 0x0203;
pub const WM_RBUTTONDOWN: u32 = 0x0204;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const WM_RBUTTONDBLCLK: u32 = 0x0206;
pub const WM_MBUTTONDOWN: u32 = 0x0207;
pub const WM_MBUTTONUP: u32 = 0x0208;
pub const WM_MBUTTONDBLCLK: u32 = 0x0209;
pub const WM_XBUTTONDOWN: u32 = 0x020B;
pub const WM_XBUTTONUP: u32 = 0x020C;
pub const WM_XBUTTONDBLCLK: u32 = 0x020D;

// Undocumented, sent by the shell during window destruction.
pub const WM_UNREGISTER_WINDOW_SERVICES: u32 = 0x0272;

pub const WM_NCMOUSEHOVER: u32 = 0x02A0;
pub const WM_MOUSEHOVER: u32 = 0x02A1;
pub const WM_NCMOUSELEAVE: u32 = 0x02A2;
pub const WM_MOUSELEAVE: u32 = 0x02A3;

// Key-state flags carried in the WPARAM of client mouse messages.
pub const MK_LBUTTON: usize = 0x0001;
pub const MK_RBUTTON: usize = 0x0002;
pub const MK_SHIFT: usize = 0x0004;
pub const MK_CONTROL: usize = 0x0008;
pub const MK_MBUTTON: usize = 0x0010;
pub const MK_XBUTTON1: usize = 0x0020;
pub const MK_XBUTTON2: usize = 0x0040;

// Virtual key codes queried when rebuilding the key-state word.
pub const VK_LBUTTON: i32 = 0x01;
pub const VK_RBUTTON: i32 = 0x02;
pub const VK_MBUTTON: i32 = 0x04;
pub const VK_XBUTTON1: i32 = 0x05;
pub const VK_XBUTTON2: i32 = 0x06;
pub const VK_SHIFT: i32 = 0x10;
pub const VK_CONTROL: i32 = 0x11;

/// WPARAM value stamped on mouse-leave messages we synthesize ourselves.
/// The OS ignores the WPARAM of a leave message, so it is free to carry a marker.
pub const EMULATED_MESSAGE_TAG: usize = 0x97CC_EA99;

pub const fn is_emulated_message(wparam: usize) -> bool {
    wparam == EMULATED_MESSAGE_TAG
}

/// Messages that must reach the toolkit untouched because the window is going away.
pub const fn is_teardown_message(msg: u32) -> bool {
    matches!(
        msg,
        WM_CLOSE | WM_DESTROY | WM_NCDESTROY | WM_UAHDESTROYWINDOW | WM_UNREGISTER_WINDOW_SERVICES
    )
}

pub const fn is_nc_xbutton_message(msg: u32) -> bool {
    msg >= WM_NCXBUTTONDOWN && msg <= WM_NCXBUTTONDBLCLK
}

/// Client-area twin of a non-client mouse message, if it has one.
/// A hit test is treated as a mouse move.
pub const fn client_equivalent(msg: u32) -> Option<u32> {
    let client = match msg {
        WM_NCHITTEST | WM_NCMOUSEMOVE => WM_MOUSEMOVE,
        WM_NCLBUTTONDOWN => WM_LBUTTONDOWN,
        WM_NCLBUTTONUP => WM_LBUTTONUP,
        WM_NCLBUTTONDBLCLK => WM_LBUTTONDBLCLK,
        WM_NCRBUTTONDOWN => WM_RBUTTONDOWN,
        WM_NCRBUTTONUP => WM_RBUTTONUP,
        WM_NCRBUTTONDBLCLK => WM_RBUTTONDBLCLK,
        WM_NCMBUTTONDOWN => WM_MBUTTONDOWN,
        WM_NCMBUTTONUP => WM_MBUTTONUP,
        WM_NCMBUTTONDBLCLK => WM_MBUTTONDBLCLK,
        WM_NCXBUTTONDOWN => WM_XBUTTONDOWN,
        WM_NCXBUTTONUP => WM_XBUTTONUP,
        WM_NCXBUTTONDBLCLK => WM_XBUTTONDBLCLK,
        WM_NCMOUSEHOVER => WM_MOUSEHOVER,
        WM_NCMOUSELEAVE => WM_MOUSELEAVE,
        _ => return None,
    };
    Some(client)
}

#[inline]
pub const fn loword(value: usize) -> u16 {
    (value & 0xFFFF) as u16
}

#[inline]
pub const fn hiword(value: usize) -> u16 {
    ((value >> 16) & 0xFFFF) as u16
}

#[inline]
pub const fn make_wparam(low: u16, high: u16) -> usize {
    (low as usize) | ((high as usize) << 16)
}

/// Signed x coordinate packed in the low word of an LPARAM.
#[inline]
pub const fn get_x_lparam(lparam: isize) -> i32 {
    (lparam as usize & 0xFFFF) as u16 as i16 as i32
}

/// Signed y coordinate packed in the high word of an LPARAM.
#[inline]
pub const fn get_y_lparam(lparam: isize) -> i32 {
    ((lparam as usize >> 16) & 0xFFFF) as u16 as i16 as i32
}

pub const fn point_from_lparam(lparam: isize) -> Point {
    Point::new(get_x_lparam(lparam), get_y_lparam(lparam))
}

/// Packs a point the way `MAKELPARAM` does: each coordinate truncated to 16 bits.
pub const fn lparam_from_point(point: Point) -> isize {
    let low = (point.x as u32) & 0xFFFF;
    let high = (point.y as u32) & 0xFFFF;
    (low | (high << 16)) as i32 as isize
}

/// The XBUTTON1/XBUTTON2 selector carried in the high word of an X-button WPARAM.
pub const fn xbutton_from_wparam(wparam: usize) -> u16 {
    hiword(wparam)
}

/// Builds the `MK_*` key-state word from live key state.
///
/// `is_pressed` answers whether a virtual key is currently down. When the user
/// has swapped the primary mouse button the physical left/right keys map to the
/// opposite logical flags.
pub fn compose_key_state(buttons_swapped: bool, is_pressed: impl Fn(i32) -> bool) -> usize {
    let mut state = 0;
    if is_pressed(VK_LBUTTON) {
        state |= if buttons_swapped { MK_RBUTTON } else { MK_LBUTTON };
    }
    if is_pressed(VK_RBUTTON) {
        state |= if buttons_swapped { MK_LBUTTON } else { MK_RBUTTON };
    }
    if is_pressed(VK_SHIFT) {
        state |= MK_SHIFT;
    }
    if is_pressed(VK_CONTROL) {
        state |= MK_CONTROL;
    }
    if is_pressed(VK_MBUTTON) {
        state |= MK_MBUTTON;
    }
    if is_pressed(VK_XBUTTON1) {
        state |= MK_XBUTTON1;
    }
    if is_pressed(VK_XBUTTON2) {
        state |= MK_XBUTTON2;
    }
    state
}
