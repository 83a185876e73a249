/*
 * Win32 implementation of `WindowSystem`.
 *
 * Optional entry points (per-window/per-monitor DPI, per-DPI system metrics,
 * DwmFlush, RtlGetVersion) are resolved once per process with LoadLibraryW +
 * GetProcAddress and cached in a `OnceLock`; everything else is linked
 * statically through windows-rs. Conversions between the crate's portable
 * geometry and the native POINT/SIZE/RECT layouts also live here.
 */
use std::ffi::c_void;
use std::sync::OnceLock;

use windows::Win32::{
    Foundation::{HWND, LPARAM, POINT, RECT, SIZE, WPARAM},
    Graphics::Gdi::{
        GetDC, GetDeviceCaps, GetMonitorInfoW, HMONITOR, LOGPIXELSX, MONITOR_DEFAULTTONEAREST,
        MONITOR_DEFAULTTOPRIMARY, MONITORINFO, MonitorFromWindow, ReleaseDC, ScreenToClient,
    },
    System::{
        LibraryLoader::{GetProcAddress, LoadLibraryW},
        SystemInformation::OSVERSIONINFOW,
    },
    UI::{
        Input::KeyboardAndMouse::{
            GetAsyncKeyState, TME_LEAVE, TME_NONCLIENT, TRACKMOUSEEVENT, TrackMouseEvent,
        },
        Shell::{
            ABE_BOTTOM, ABE_LEFT, ABE_RIGHT, ABE_TOP, ABM_GETAUTOHIDEBAREX, ABM_GETSTATE,
            ABM_GETTASKBARPOS, ABS_AUTOHIDE, APPBARDATA, SHAppBarMessage,
        },
        WindowsAndMessaging::{
            DefWindowProcW, FindWindowW, GA_ROOT, GWL_EXSTYLE, GWL_STYLE, GetAncestor,
            GetClientRect, GetMessagePos, GetSystemMetrics, GetWindowLongPtrW, GetWindowRect,
            IsWindow, IsZoomed, NCCALCSIZE_PARAMS, PostMessageW, SM_CXPADDEDBORDER,
            SM_CXSIZEFRAME, SM_SWAPBUTTON, SYSTEM_METRICS_INDEX, SendMessageW, WS_DISABLED,
            WS_EX_TOOLWINDOW,
        },
    },
};
use windows::core::{HRESULT, HSTRING, PCSTR, PCWSTR, w};

use crate::capabilities::{
    Capability, CapabilitySet, DWM_FLUSH, DWMAPI_DLL, DpiSource, GET_DPI_FOR_MONITOR,
    GET_DPI_FOR_WINDOW, GET_SYSTEM_METRICS_FOR_DPI, NTDLL_DLL, RTL_GET_VERSION, SHCORE_DLL,
    USER32_DLL, resolve_capability_set,
};
use crate::messages::{compose_key_state, point_from_lparam};
use crate::platform::{NativeMessage, OsVersion, WindowSystem};
use crate::types::{EmulationDelivery, Point, Rect, ScreenEdge, Size, WindowHandle};
use crate::window_context::USER_DEFAULT_SCREEN_DPI;

/// `HOVER_DEFAULT` is not exported by windows-rs.
const HOVER_DEFAULT: u32 = 0xFFFF_FFFF;

const MDT_EFFECTIVE_DPI: i32 = 0;

type GetDpiForWindowFn = unsafe extern "system" fn(HWND) -> u32;
type GetSystemMetricsForDpiFn = unsafe extern "system" fn(SYSTEM_METRICS_INDEX, u32) -> i32;
type GetDpiForMonitorFn = unsafe extern "system" fn(HMONITOR, i32, *mut u32, *mut u32) -> HRESULT;
type DwmFlushFn = unsafe extern "system" fn() -> HRESULT;
type RtlGetVersionFn = unsafe extern "system" fn(*mut OSVERSIONINFOW) -> i32;

/*
 * Entry points that older Windows builds do not export. Resolved lazily on
 * first use and never again; a missing export selects the fallback path.
 */
#[derive(Debug, Clone, Copy)]
struct DynamicApis {
    get_dpi_for_window: Capability<GetDpiForWindowFn>,
    get_system_metrics_for_dpi: Capability<GetSystemMetricsForDpiFn>,
    get_dpi_for_monitor: Capability<GetDpiForMonitorFn>,
    dwm_flush: Capability<DwmFlushFn>,
    os_version: OsVersion,
}

impl DynamicApis {
    fn get() -> &'static DynamicApis {
        static APIS: OnceLock<DynamicApis> = OnceLock::new();
        APIS.get_or_init(DynamicApis::load)
    }

    fn load() -> DynamicApis {
        let get_dpi_for_window = load_export(USER32_DLL, GET_DPI_FOR_WINDOW)
            .map(|ptr| unsafe { std::mem::transmute::<*const c_void, GetDpiForWindowFn>(ptr) });
        let get_system_metrics_for_dpi =
            load_export(USER32_DLL, GET_SYSTEM_METRICS_FOR_DPI).map(|ptr| unsafe {
                std::mem::transmute::<*const c_void, GetSystemMetricsForDpiFn>(ptr)
            });
        let get_dpi_for_monitor = load_export(SHCORE_DLL, GET_DPI_FOR_MONITOR)
            .map(|ptr| unsafe { std::mem::transmute::<*const c_void, GetDpiForMonitorFn>(ptr) });
        let dwm_flush = load_export(DWMAPI_DLL, DWM_FLUSH)
            .map(|ptr| unsafe { std::mem::transmute::<*const c_void, DwmFlushFn>(ptr) });

        let os_version = query_os_version().unwrap_or_else(|| {
            log::warn!("RtlGetVersion unavailable; assuming a pre-Windows 8.1 system.");
            OsVersion::new(6, 1, 7601)
        });

        let apis = DynamicApis {
            get_dpi_for_window: Capability::from_option(get_dpi_for_window),
            get_system_metrics_for_dpi: Capability::from_option(get_system_metrics_for_dpi),
            get_dpi_for_monitor: Capability::from_option(get_dpi_for_monitor),
            dwm_flush: Capability::from_option(dwm_flush),
            os_version,
        };
        log::debug!(
            "Resolved platform capabilities: {:?} on Windows {}.{}.{}",
            apis.capability_set(),
            os_version.major,
            os_version.minor,
            os_version.build
        );
        apis
    }

    fn capability_set(&self) -> CapabilitySet {
        resolve_capability_set(|module, export| match (module, export) {
            (USER32_DLL, GET_DPI_FOR_WINDOW) => self.get_dpi_for_window.is_available(),
            (USER32_DLL, GET_SYSTEM_METRICS_FOR_DPI) => {
                self.get_system_metrics_for_dpi.is_available()
            }
            (SHCORE_DLL, GET_DPI_FOR_MONITOR) => self.get_dpi_for_monitor.is_available(),
            (DWMAPI_DLL, DWM_FLUSH) => self.dwm_flush.is_available(),
            _ => false,
        })
    }
}

fn load_export(module: &str, export: &str) -> Option<*const c_void> {
    let module = unsafe { LoadLibraryW(&HSTRING::from(module)) }.ok()?;
    let name = std::ffi::CString::new(export).ok()?;
    unsafe { GetProcAddress(module, PCSTR(name.as_ptr() as *const u8)) }
        .map(|func| func as *const c_void)
}

/// Kernel-reported version; `GetVersionEx` lies to unmanifested processes.
fn query_os_version() -> Option<OsVersion> {
    let ptr = load_export(NTDLL_DLL, RTL_GET_VERSION)?;
    let rtl_get_version = unsafe { std::mem::transmute::<*const c_void, RtlGetVersionFn>(ptr) };
    let mut info = OSVERSIONINFOW {
        dwOSVersionInfoSize: std::mem::size_of::<OSVERSIONINFOW>() as u32,
        ..Default::default()
    };
    // STATUS_SUCCESS
    if unsafe { rtl_get_version(&mut info) } != 0 {
        return None;
    }
    Some(OsVersion::new(
        info.dwMajorVersion,
        info.dwMinorVersion,
        info.dwBuildNumber,
    ))
}

#[inline]
pub(crate) fn hwnd_from_handle(handle: WindowHandle) -> HWND {
    HWND(handle.raw() as *mut c_void)
}

#[inline]
pub(crate) fn handle_from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle::new(hwnd.0 as isize)
}

impl From<POINT> for Point {
    fn from(value: POINT) -> Self {
        Point::new(value.x, value.y)
    }
}

impl From<Point> for POINT {
    fn from(value: Point) -> Self {
        POINT {
            x: value.x,
            y: value.y,
        }
    }
}

impl From<SIZE> for Size {
    fn from(value: SIZE) -> Self {
        Size::new(value.cx, value.cy)
    }
}

impl From<Size> for SIZE {
    fn from(value: Size) -> Self {
        SIZE {
            cx: value.width,
            cy: value.height,
        }
    }
}

impl From<RECT> for Rect {
    fn from(value: RECT) -> Self {
        Rect::new(value.left, value.top, value.right, value.bottom)
    }
}

impl From<Rect> for RECT {
    fn from(value: Rect) -> Self {
        RECT {
            left: value.left,
            top: value.top,
            right: value.right,
            bottom: value.bottom,
        }
    }
}

fn screen_edge_from_abe(edge: u32) -> Option<ScreenEdge> {
    match edge {
        ABE_TOP => Some(ScreenEdge::Top),
        ABE_BOTTOM => Some(ScreenEdge::Bottom),
        ABE_LEFT => Some(ScreenEdge::Left),
        ABE_RIGHT => Some(ScreenEdge::Right),
        _ => None,
    }
}

fn abe_from_screen_edge(edge: ScreenEdge) -> u32 {
    match edge {
        ScreenEdge::Top => ABE_TOP,
        ScreenEdge::Bottom => ABE_BOTTOM,
        ScreenEdge::Left => ABE_LEFT,
        ScreenEdge::Right => ABE_RIGHT,
    }
}

fn app_bar_data(hwnd: Option<HWND>) -> APPBARDATA {
    APPBARDATA {
        cbSize: std::mem::size_of::<APPBARDATA>() as u32,
        hWnd: hwnd.unwrap_or_default(),
        ..Default::default()
    }
}

/// Live root window, regardless of its current style or size.
pub(crate) fn is_top_level_window(handle: WindowHandle) -> bool {
    if handle.is_null() {
        return false;
    }
    let hwnd = hwnd_from_handle(handle);
    unsafe { IsWindow(Some(hwnd)).as_bool() && GetAncestor(hwnd, GA_ROOT) == hwnd }
}

fn monitor_rect(hwnd: HWND) -> Option<RECT> {
    let monitor = unsafe { MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST) };
    if monitor.is_invalid() {
        return None;
    }
    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if unsafe { GetMonitorInfoW(monitor, &mut info) }.as_bool() {
        Some(info.rcMonitor)
    } else {
        None
    }
}

/// The real OS behind `WindowSystem`. Stateless: the resolved entry points are process-wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }

    /// Optional entry points found on the running OS.
    pub fn capabilities(&self) -> CapabilitySet {
        DynamicApis::get().capability_set()
    }

    /// Blocks until the compositor has presented the current frame. Returns
    /// `false` when the compositor API is unavailable or the call failed.
    pub fn flush_compositor(&self) -> bool {
        match DynamicApis::get().dwm_flush.get() {
            Some(dwm_flush) => unsafe { dwm_flush() }.is_ok(),
            None => false,
        }
    }

    fn system_metric(&self, index: SYSTEM_METRICS_INDEX, dpi: u32) -> i32 {
        match DynamicApis::get().get_system_metrics_for_dpi.get() {
            Some(get_system_metrics_for_dpi) => unsafe { get_system_metrics_for_dpi(index, dpi) },
            None => unsafe { GetSystemMetrics(index) },
        }
    }

    fn dpi_from_monitor(&self, hwnd: HWND) -> Option<u32> {
        let get_dpi_for_monitor = DynamicApis::get().get_dpi_for_monitor.get()?;
        let monitor = unsafe { MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST) };
        if monitor.is_invalid() {
            return None;
        }
        let (mut dpi_x, mut dpi_y) = (0_u32, 0_u32);
        let hr = unsafe { get_dpi_for_monitor(monitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y) };
        (hr.is_ok() && dpi_x > 0).then_some(dpi_x)
    }

    fn dpi_from_screen_dc(&self) -> u32 {
        unsafe {
            let hdc = GetDC(None);
            if hdc.is_invalid() {
                return USER_DEFAULT_SCREEN_DPI;
            }
            let dpi = GetDeviceCaps(Some(hdc), LOGPIXELSX);
            let _ = ReleaseDC(None, hdc);
            if dpi > 0 {
                dpi as u32
            } else {
                USER_DEFAULT_SCREEN_DPI
            }
        }
    }
}

impl WindowSystem for Win32WindowSystem {
    fn os_version(&self) -> OsVersion {
        DynamicApis::get().os_version
    }

    fn is_valid_top_level_window(&self, handle: WindowHandle) -> bool {
        if !is_top_level_window(handle) {
            return false;
        }
        let hwnd = hwnd_from_handle(handle);
        let style = unsafe { GetWindowLongPtrW(hwnd, GWL_STYLE) } as u32;
        if style & WS_DISABLED.0 != 0 {
            return false;
        }
        let ex_style = unsafe { GetWindowLongPtrW(hwnd, GWL_EXSTYLE) } as u32;
        if ex_style & WS_EX_TOOLWINDOW.0 != 0 {
            return false;
        }
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }.is_ok() && Rect::from(rect).is_valid()
    }

    fn is_maximized(&self, hwnd: WindowHandle) -> bool {
        unsafe { IsZoomed(hwnd_from_handle(hwnd)).as_bool() }
    }

    fn is_full_screen(&self, hwnd: WindowHandle) -> bool {
        let hwnd = hwnd_from_handle(hwnd);
        let mut window = RECT::default();
        if unsafe { GetWindowRect(hwnd, &mut window) }.is_err() {
            return false;
        }
        monitor_rect(hwnd).is_some_and(|monitor| Rect::from(monitor) == Rect::from(window))
    }

    fn dpi_for_window(&self, hwnd: WindowHandle) -> u32 {
        let native = hwnd_from_handle(hwnd);
        let apis = DynamicApis::get();
        match apis.capability_set().dpi_source() {
            DpiSource::PerWindow => match apis.get_dpi_for_window.get() {
                Some(get_dpi_for_window) => match unsafe { get_dpi_for_window(native) } {
                    0 => self.dpi_from_screen_dc(),
                    dpi => dpi,
                },
                None => self.dpi_from_screen_dc(),
            },
            DpiSource::PerMonitor => self
                .dpi_from_monitor(native)
                .unwrap_or_else(|| self.dpi_from_screen_dc()),
            DpiSource::ScreenDc => self.dpi_from_screen_dc(),
        }
    }

    fn resize_border_thickness(&self, hwnd: WindowHandle) -> i32 {
        let dpi = self.dpi_for_window(hwnd);
        self.system_metric(SM_CXSIZEFRAME, dpi) + self.system_metric(SM_CXPADDEDBORDER, dpi)
    }

    fn is_auto_hide_taskbar_enabled(&self) -> bool {
        let mut data = app_bar_data(None);
        let state = unsafe { SHAppBarMessage(ABM_GETSTATE, &mut data) };
        (state as u32 & ABS_AUTOHIDE) != 0
    }

    fn has_auto_hide_taskbar_on_edge(&self, hwnd: WindowHandle, edge: ScreenEdge) -> bool {
        let hwnd = hwnd_from_handle(hwnd);
        let Some(monitor) = monitor_rect(hwnd) else {
            return false;
        };
        let mut data = app_bar_data(None);
        data.uEdge = abe_from_screen_edge(edge);
        data.rc = monitor;
        unsafe { SHAppBarMessage(ABM_GETAUTOHIDEBAREX, &mut data) != 0 }
    }

    fn taskbar_edge_on_window_monitor(&self, hwnd: WindowHandle) -> Option<ScreenEdge> {
        let hwnd = hwnd_from_handle(hwnd);
        let tray = unsafe { FindWindowW(w!("Shell_TrayWnd"), PCWSTR::null()) }.ok()?;
        let window_monitor = unsafe { MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST) };
        let tray_monitor = unsafe { MonitorFromWindow(tray, MONITOR_DEFAULTTOPRIMARY) };
        if window_monitor != tray_monitor {
            return None;
        }
        let mut data = app_bar_data(Some(tray));
        if unsafe { SHAppBarMessage(ABM_GETTASKBARPOS, &mut data) } == 0 {
            return None;
        }
        screen_edge_from_abe(data.uEdge)
    }

    fn key_state(&self) -> usize {
        let swapped = unsafe { GetSystemMetrics(SM_SWAPBUTTON) } != 0;
        compose_key_state(swapped, |vk| unsafe { GetAsyncKeyState(vk) } < 0)
    }

    fn client_size(&self, hwnd: WindowHandle) -> Size {
        let mut rect = RECT::default();
        match unsafe { GetClientRect(hwnd_from_handle(hwnd), &mut rect) } {
            Ok(()) => Rect::from(rect).size(),
            Err(err) => {
                log::trace!("GetClientRect failed for {hwnd}: {err}");
                Size::default()
            }
        }
    }

    fn screen_to_client(&self, hwnd: WindowHandle, point: Point) -> Point {
        let mut native = POINT::from(point);
        if unsafe { ScreenToClient(hwnd_from_handle(hwnd), &mut native) }.as_bool() {
            Point::from(native)
        } else {
            log::trace!("ScreenToClient failed for {hwnd}; using the screen position.");
            point
        }
    }

    fn message_pos(&self) -> Point {
        let packed = unsafe { GetMessagePos() };
        point_from_lparam(packed as isize)
    }

    fn deliver_message(&self, message: NativeMessage, delivery: EmulationDelivery) {
        let hwnd = hwnd_from_handle(message.hwnd);
        let wparam = WPARAM(message.wparam);
        let lparam = LPARAM(message.lparam);
        match delivery {
            EmulationDelivery::Post => {
                if let Err(err) = unsafe { PostMessageW(Some(hwnd), message.msg, wparam, lparam) } {
                    log::warn!(
                        "Failed to post emulated message 0x{:04X} to {}: {err}",
                        message.msg,
                        message.hwnd
                    );
                }
            }
            EmulationDelivery::Send => {
                let _ = unsafe { SendMessageW(hwnd, message.msg, Some(wparam), Some(lparam)) };
            }
        }
    }

    fn track_mouse_leave(&self, hwnd: WindowHandle, non_client: bool) {
        let flags = if non_client {
            TME_LEAVE | TME_NONCLIENT
        } else {
            TME_LEAVE
        };
        let mut tme = TRACKMOUSEEVENT {
            cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
            dwFlags: flags,
            hwndTrack: hwnd_from_handle(hwnd),
            dwHoverTime: HOVER_DEFAULT,
        };
        if let Err(err) = unsafe { TrackMouseEvent(&mut tme) } {
            log::warn!("TrackMouseEvent failed for {hwnd}: {err}");
        }
    }

    fn default_window_proc(&self, message: NativeMessage) -> isize {
        unsafe {
            DefWindowProcW(
                hwnd_from_handle(message.hwnd),
                message.msg,
                WPARAM(message.wparam),
                LPARAM(message.lparam),
            )
        }
        .0
    }

    fn read_calc_size_rect(&self, message: NativeMessage) -> Rect {
        let Some(rect) = calc_size_rect_ptr(message) else {
            return Rect::default();
        };
        Rect::from(unsafe { *rect })
    }

    fn write_calc_size_rect(&self, message: NativeMessage, rect: Rect) {
        if let Some(target) = calc_size_rect_ptr(message) {
            unsafe { *target = RECT::from(rect) };
        }
    }
}

/*
 * WM_NCCALCSIZE carries either a bare RECT (wParam == FALSE) or an
 * NCCALCSIZE_PARAMS whose first rectangle is the proposed window rect.
 * Both are owned by the sender for the duration of the message.
 */
fn calc_size_rect_ptr(message: NativeMessage) -> Option<*mut RECT> {
    if message.lparam == 0 {
        return None;
    }
    if message.wparam != 0 {
        let params = message.lparam as *mut NCCALCSIZE_PARAMS;
        Some(unsafe { std::ptr::addr_of_mut!((*params).rgrc[0]) })
    } else {
        Some(message.lparam as *mut RECT)
    }
}
