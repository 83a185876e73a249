/*
 * Registry of hooked windows.
 *
 * Maps each managed native window to its `WindowContext` (non-owning: the
 * application owns the contexts), remembers the toolkit's original window
 * procedure, and keeps the toolkit-side result filter installed exactly while
 * at least one window is managed.
 *
 * The toolkit dispatches every message again after our interceptor has seen
 * it and would otherwise recompute a conflicting result. The filter it
 * consults reads `last_result()`, which the hooked procedure sets for the
 * duration of the forwarded call and restores afterwards so nested messages
 * do not leak their result into the outer one.
 */
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::error::{PlatformError, Result as PlatformResult};
use crate::platform::{NativeMessage, WindowSystem};
use crate::types::WindowHandle;
use crate::window_context::WindowContext;

/// Swaps window procedures on native windows.
pub trait NativeProcHook {
    /// Address of the window procedure currently installed on `hwnd`.
    fn current_window_proc(&self, hwnd: WindowHandle) -> usize;

    /// Installs the crate's hooked procedure on `hwnd`.
    fn install_hook_proc(&self, hwnd: WindowHandle) -> PlatformResult<()>;

    /// Puts `original` back on a window that is being detached while still alive.
    fn restore_window_proc(&self, hwnd: WindowHandle, original: usize);

    fn is_window_alive(&self, hwnd: WindowHandle) -> bool;
}

/// The host toolkit's native event pipeline.
pub trait EventDispatchHost {
    /// Installs a filter that answers with `HookRegistry::last_result()` when it is `Some`.
    fn install_result_filter(&self);

    fn remove_result_filter(&self);
}

/// What the hooked window procedure should do after interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// The window is not managed: hand the message to the OS default procedure.
    Unmanaged,
    /// Forward to the toolkit's original procedure, reporting `handled` to its filter meanwhile.
    Forward {
        original_proc: usize,
        handled: Option<isize>,
    },
}

pub struct HookRegistry {
    this: Weak<HookRegistry>,
    proc_hook: Box<dyn NativeProcHook>,
    host: Rc<dyn EventDispatchHost>,
    contexts: RefCell<HashMap<WindowHandle, Weak<WindowContext>>>,
    original_proc: Cell<Option<usize>>,
    filter_installed: Cell<bool>,
    last_result: Cell<Option<isize>>,
}

impl HookRegistry {
    pub fn new(proc_hook: Box<dyn NativeProcHook>, host: Rc<dyn EventDispatchHost>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            proc_hook,
            host,
            contexts: RefCell::new(HashMap::new()),
            original_proc: Cell::new(None),
            filter_installed: Cell::new(false),
            last_result: Cell::new(None),
        })
    }

    /// Hooks `hwnd` and routes its messages to `context`. Attaching an already
    /// managed window is a no-op.
    pub fn install(&self, hwnd: WindowHandle, context: &Rc<WindowContext>) -> PlatformResult<()> {
        if hwnd.is_null() {
            return Err(PlatformError::InvalidHandle(hwnd));
        }
        if self.contexts.borrow().contains_key(&hwnd) {
            log::debug!("Window {hwnd} is already hooked; ignoring repeated attach.");
            return Ok(());
        }

        // Every window of the toolkit shares one window class, so one procedure address.
        if self.original_proc.get().is_none() {
            let original = self.proc_hook.current_window_proc(hwnd);
            if original == 0 {
                return Err(PlatformError::OperationFailed(format!(
                    "window {hwnd} has no window procedure to forward to"
                )));
            }
            self.original_proc.set(Some(original));
        }

        self.proc_hook.install_hook_proc(hwnd)?;

        if !self.filter_installed.get() {
            self.host.install_result_filter();
            self.filter_installed.set(true);
            log::debug!("Native result filter installed.");
        }

        context.set_handle(hwnd);
        context.set_registry(self.this.clone());
        self.contexts
            .borrow_mut()
            .insert(hwnd, Rc::downgrade(context));
        log::debug!("Window {hwnd} hooked.");
        Ok(())
    }

    /// Unhooks `hwnd`, putting the original procedure back if the window is
    /// still alive. Returns `false` when it was not managed.
    pub fn uninstall(&self, hwnd: WindowHandle) -> bool {
        let removed = self.contexts.borrow_mut().remove(&hwnd);
        let Some(removed) = removed else {
            return false;
        };
        if let Some(context) = removed.upgrade() {
            context.set_registry(Weak::new());
        }
        if self.proc_hook.is_window_alive(hwnd) {
            if let Some(original) = self.original_proc.get() {
                self.proc_hook.restore_window_proc(hwnd, original);
            }
        }
        log::debug!("Window {hwnd} unhooked.");

        if self.contexts.borrow().is_empty() && self.filter_installed.get() {
            self.host.remove_result_filter();
            self.filter_installed.set(false);
            log::debug!("Native result filter removed; no hooked windows remain.");
        }
        true
    }

    /// Called when `context` is destroyed while still attached to `hwnd`.
    /// Ignored if `hwnd` has since been re-attached to another context.
    pub(crate) fn release_context(&self, hwnd: WindowHandle, context: &WindowContext) -> bool {
        let owned = self
            .contexts
            .borrow()
            .get(&hwnd)
            .is_some_and(|entry| std::ptr::eq(entry.as_ptr(), context));
        owned && self.uninstall(hwnd)
    }

    pub fn context(&self, hwnd: WindowHandle) -> Option<Rc<WindowContext>> {
        self.contexts.borrow().get(&hwnd).and_then(Weak::upgrade)
    }

    pub fn is_managed(&self, hwnd: WindowHandle) -> bool {
        self.contexts.borrow().contains_key(&hwnd)
    }

    pub fn managed_windows(&self) -> Vec<WindowHandle> {
        self.contexts.borrow().keys().copied().collect()
    }

    pub fn managed_window_count(&self) -> usize {
        self.contexts.borrow().len()
    }

    pub fn original_window_proc(&self) -> Option<usize> {
        self.original_proc.get()
    }

    pub fn is_filter_installed(&self) -> bool {
        self.filter_installed.get()
    }

    /// Result the toolkit's filter should report for the message it is dispatching.
    pub fn last_result(&self) -> Option<isize> {
        self.last_result.get()
    }

    /// Publishes `handled` for the duration of a forwarded call; returns the value to restore.
    pub fn enter_forwarding(&self, handled: Option<isize>) -> Option<isize> {
        self.last_result.replace(handled)
    }

    pub fn leave_forwarding(&self, previous: Option<isize>) {
        self.last_result.set(previous);
    }

    /// Runs the window's interceptor. The registry borrow is released before
    /// the context runs, since handlers may re-enter the window procedure.
    pub fn intercept(&self, system: &dyn WindowSystem, message: NativeMessage) -> Interception {
        let entry = self.contexts.borrow().get(&message.hwnd).cloned();
        let Some(entry) = entry else {
            return Interception::Unmanaged;
        };
        let Some(original_proc) = self.original_proc.get() else {
            return Interception::Unmanaged;
        };
        let Some(context) = entry.upgrade() else {
            // The context went away without detaching; hand the window back to the toolkit.
            log::debug!("Context of {} is gone; unhooking.", message.hwnd);
            self.uninstall(message.hwnd);
            return Interception::Forward {
                original_proc,
                handled: None,
            };
        };
        let handled = context.window_proc(system, message);
        Interception::Forward {
            original_proc,
            handled,
        }
    }
}
