/*
 * Public entry point for chromekit, the Win32 side of a custom window frame for
 * a retained-mode UI toolkit. The toolkit draws its own title bar and system
 * buttons; this crate hooks each top-level window's procedure so the OS still
 * sees a real frame: hit-testing, WM_NCCALCSIZE sizing (including maximized and
 * auto-hide taskbar cases) and the client-area emulation that keeps the
 * Windows 11 snap layout flyout and hover states working.
 *
 * Everything that decides *what* to answer is portable and tested against a
 * fake `WindowSystem`; only `window_common` and `window_hook` touch Win32 and
 * are compiled on Windows alone.
 */
pub mod capabilities;
pub mod delegate;
pub mod error;
pub(crate) mod handlers;
pub mod hook_registry;
pub mod messages;
pub mod platform;
#[cfg(test)]
mod test_support;
pub mod types;
#[cfg(target_os = "windows")]
pub(crate) mod window_common;
pub mod window_context;
#[cfg(target_os = "windows")]
pub(crate) mod window_hook;

pub use capabilities::{Capability, CapabilitySet, DpiSource};
pub use delegate::WindowItemDelegate;
pub use error::{PlatformError, Result as PlatformResult};
pub use hit_test::WindowPart;
pub use hook_registry::{EventDispatchHost, HookRegistry, Interception, NativeProcHook};
pub use platform::{NativeMessage, OsVersion, WindowSystem};
pub use types::{
    EmulationDelivery, FrameConfig, ItemId, Point, Rect, ScreenEdge, Size, SystemButton,
    WindowHandle,
};
#[cfg(target_os = "windows")]
pub use window_common::Win32WindowSystem;
pub use window_context::WindowContext;
#[cfg(target_os = "windows")]
pub use window_hook::FramePlatform;
