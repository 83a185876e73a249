/*
 * Optional platform entry points resolved at runtime. Newer OS builds export
 * per-window/per-monitor DPI queries and a compositor flush; older builds do
 * not, and every caller must fall back to a simpler computation instead of
 * failing. The Win32 side loads the actual function pointers; this module
 * holds the availability model and the fallback ordering so both can be tested
 * without an OS.
 */

/// A runtime-resolved entry point that may be missing on the running OS build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<F> {
    Available(F),
    Unavailable,
}

impl<F: Copy> Capability<F> {
    pub fn from_option(value: Option<F>) -> Self {
        match value {
            Some(f) => Capability::Available(f),
            None => Capability::Unavailable,
        }
    }

    pub fn get(&self) -> Option<F> {
        match self {
            Capability::Available(f) => Some(*f),
            Capability::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }
}

/// (module, export) pairs resolved at startup.
pub(crate) const USER32_DLL: &str = "user32.dll";
pub(crate) const SHCORE_DLL: &str = "shcore.dll";
pub(crate) const DWMAPI_DLL: &str = "dwmapi.dll";
pub(crate) const NTDLL_DLL: &str = "ntdll.dll";

pub(crate) const GET_DPI_FOR_WINDOW: &str = "GetDpiForWindow";
pub(crate) const GET_SYSTEM_METRICS_FOR_DPI: &str = "GetSystemMetricsForDpi";
pub(crate) const GET_DPI_FOR_MONITOR: &str = "GetDpiForMonitor";
pub(crate) const DWM_FLUSH: &str = "DwmFlush";
pub(crate) const RTL_GET_VERSION: &str = "RtlGetVersion";

/// Which optional entry points the running OS provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    pub dpi_for_window: bool,
    pub system_metrics_for_dpi: bool,
    pub dpi_for_monitor: bool,
    pub compositor_flush: bool,
}

pub(crate) fn resolve_capability_set(has_export: impl Fn(&str, &str) -> bool) -> CapabilitySet {
    CapabilitySet {
        dpi_for_window: has_export(USER32_DLL, GET_DPI_FOR_WINDOW),
        system_metrics_for_dpi: has_export(USER32_DLL, GET_SYSTEM_METRICS_FOR_DPI),
        dpi_for_monitor: has_export(SHCORE_DLL, GET_DPI_FOR_MONITOR),
        compositor_flush: has_export(DWMAPI_DLL, DWM_FLUSH),
    }
}

/// Where the window DPI is read from, best source first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpiSource {
    /// Windows 10 1607+.
    PerWindow,
    /// Windows 8.1+: effective DPI of the nearest monitor.
    PerMonitor,
    /// System DPI from the screen device context.
    ScreenDc,
}

impl CapabilitySet {
    pub fn dpi_source(&self) -> DpiSource {
        if self.dpi_for_window {
            DpiSource::PerWindow
        } else if self.dpi_for_monitor {
            DpiSource::PerMonitor
        } else {
            DpiSource::ScreenDc
        }
    }
}
