/*
 * Installs the crate's window procedure on toolkit windows.
 *
 * `FramePlatform` is the application's handle on the hook: it owns the
 * `HookRegistry` and publishes it to a thread-local slot that
 * `hooked_wnd_proc` consults, because a window procedure receives nothing
 * but the raw message. Window procedures run on the thread that created the
 * window, so one published registry per UI thread is enough.
 *
 * The hooked procedure always forwards to the toolkit's original procedure,
 * even when a handler produced a result; the toolkit's result filter then
 * answers with that result instead of computing its own.
 */
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use windows::Win32::{
    Foundation::{HWND, LPARAM, LRESULT, WPARAM},
    UI::WindowsAndMessaging::{
        CallWindowProcW, DefWindowProcW, GWLP_WNDPROC, GetWindowLongPtrW, SetWindowLongPtrW,
        WNDPROC,
    },
};

use crate::capabilities::CapabilitySet;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::hook_registry::{EventDispatchHost, HookRegistry, Interception, NativeProcHook};
use crate::messages::WM_NCDESTROY;
use crate::platform::NativeMessage;
use crate::types::WindowHandle;
use crate::window_common::{
    Win32WindowSystem, handle_from_hwnd, hwnd_from_handle, is_top_level_window,
};
use crate::window_context::WindowContext;

thread_local! {
    static ACTIVE_REGISTRY: RefCell<Weak<HookRegistry>> = RefCell::new(Weak::new());
}

fn active_registry() -> Option<Rc<HookRegistry>> {
    ACTIVE_REGISTRY.with(|slot| slot.borrow().upgrade())
}

unsafe extern "system" fn hooked_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let Some(registry) = active_registry() else {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    };

    let system = Win32WindowSystem::new();
    let message = NativeMessage::new(handle_from_hwnd(hwnd), msg, wparam.0, lparam.0);
    match registry.intercept(&system, message) {
        Interception::Unmanaged => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        Interception::Forward {
            original_proc,
            handled,
        } => {
            if let Some(result) = handled {
                log::trace!("Message 0x{msg:04X} on {} handled with {result}.", message.hwnd);
            }
            let previous = registry.enter_forwarding(handled);
            let result = unsafe {
                let original: WNDPROC = std::mem::transmute(original_proc);
                CallWindowProcW(original, hwnd, msg, wparam, lparam)
            };
            registry.leave_forwarding(previous);

            // The handle may be reused by a new window once this returns.
            if msg == WM_NCDESTROY {
                registry.uninstall(message.hwnd);
            }
            result
        }
    }
}

/// Swaps `GWLP_WNDPROC` on real windows.
struct Win32ProcHook;

impl NativeProcHook for Win32ProcHook {
    fn current_window_proc(&self, hwnd: WindowHandle) -> usize {
        unsafe { GetWindowLongPtrW(hwnd_from_handle(hwnd), GWLP_WNDPROC) as usize }
    }

    fn install_hook_proc(&self, hwnd: WindowHandle) -> PlatformResult<()> {
        let native = hwnd_from_handle(hwnd);
        #[allow(clippy::fn_to_numeric_cast)]
        let hook = hooked_wnd_proc as isize;
        unsafe { SetWindowLongPtrW(native, GWLP_WNDPROC, hook) };
        if unsafe { GetWindowLongPtrW(native, GWLP_WNDPROC) } != hook {
            return Err(PlatformError::OperationFailed(format!(
                "could not replace the window procedure of {hwnd}"
            )));
        }
        Ok(())
    }

    fn restore_window_proc(&self, hwnd: WindowHandle, original: usize) {
        unsafe { SetWindowLongPtrW(hwnd_from_handle(hwnd), GWLP_WNDPROC, original as isize) };
    }

    fn is_window_alive(&self, hwnd: WindowHandle) -> bool {
        is_top_level_window(hwnd)
    }
}

/// Entry point for the hosting toolkit on the UI thread.
///
/// Create one per UI thread, attach each top-level window together with its
/// `WindowContext`, and have the toolkit's native event filter answer with
/// [`FramePlatform::filter_native_event`] while it is installed.
pub struct FramePlatform {
    registry: Rc<HookRegistry>,
    system: Win32WindowSystem,
}

impl FramePlatform {
    pub fn new(host: Rc<dyn EventDispatchHost>) -> PlatformResult<Self> {
        let registry = HookRegistry::new(Box::new(Win32ProcHook), host);
        ACTIVE_REGISTRY.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.upgrade().is_some() {
                return Err(PlatformError::OperationFailed(
                    "a FramePlatform is already active on this thread".to_string(),
                ));
            }
            *slot = Rc::downgrade(&registry);
            Ok(())
        })?;
        log::debug!("FramePlatform created.");
        Ok(Self {
            registry,
            system: Win32WindowSystem::new(),
        })
    }

    /// Starts intercepting messages of `hwnd` on behalf of `context`.
    pub fn attach(&self, hwnd: WindowHandle, context: &Rc<WindowContext>) -> PlatformResult<()> {
        if !is_top_level_window(hwnd) {
            log::warn!("Refusing to hook {hwnd}: not a live top-level window.");
            return Err(PlatformError::InvalidHandle(hwnd));
        }
        self.registry
            .install(hwnd, context)
            .inspect_err(|err| log::error!("Failed to hook {hwnd}: {err}"))
    }

    /// Stops intercepting `hwnd`. Returns `false` when it was not attached.
    pub fn detach(&self, hwnd: WindowHandle) -> bool {
        self.registry.uninstall(hwnd)
    }

    pub fn is_attached(&self, hwnd: WindowHandle) -> bool {
        self.registry.is_managed(hwnd)
    }

    /// Result the toolkit's native event filter must report for the message it
    /// is currently dispatching, or `None` to let the toolkit decide.
    pub fn filter_native_event(&self) -> Option<isize> {
        self.registry.last_result()
    }

    pub fn window_system(&self) -> &Win32WindowSystem {
        &self.system
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.system.capabilities()
    }

    /// Border width the toolkit should paint itself for `context` (Windows 10 only).
    pub fn border_thickness(&self, context: &WindowContext) -> i32 {
        context.border_thickness(&self.system)
    }
}

impl Drop for FramePlatform {
    fn drop(&mut self) {
        let attached: Vec<WindowHandle> = self.registry.managed_windows();
        for hwnd in attached {
            self.detach(hwnd);
        }
        ACTIVE_REGISTRY.with(|slot| *slot.borrow_mut() = Weak::new());
        log::debug!("FramePlatform dropped.");
    }
}

impl std::fmt::Debug for FramePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePlatform")
            .field("attached_windows", &self.registry.managed_window_count())
            .field("filter_installed", &self.registry.is_filter_installed())
            .finish()
    }
}
