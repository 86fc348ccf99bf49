//! Contexts and their per-thread "current" binding.

use std::fmt;
use std::os::raw::c_void;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use super::{ContextAttribs, ContextConfig, ContextCreationApi};
use super::introspect::{self, EntryPoints};
use crate::error::{self, Error, Result};
use crate::os::NativeContext;
use crate::registry::ThreadSlots;
use crate::window::WindowId;

/// Where a context is in its life.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ContextState {
    /// The window has no context (yet).
    Uncreated,
    /// Created, and not current on any thread.
    NotCurrent,
    /// Current on the given thread.
    Current(ThreadId),
    /// The native context is gone.
    Destroyed,
}

struct Inner {
    attribs: ContextAttribs,
    state: ContextState,
    entry_points: Option<EntryPoints>,
    swap_interval: Option<i32>,
}

/// A window's rendering context.
pub struct Context {
    window: WindowId,
    doublebuffer: bool,
    config: ContextConfig,
    native: Box<dyn NativeContext>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Context")
            .field("window", &self.window)
            .field("doublebuffer", &self.doublebuffer)
            .field("native", &self.native)
            .field("attribs", &inner.attribs)
            .field("state", &inner.state)
            .field("swap_interval", &inner.swap_interval)
            .finish()
    }
}

impl Context {
    pub(crate) fn new(window: WindowId, doublebuffer: bool, native: Box<dyn NativeContext>, config: ContextConfig) -> Self {
        Self {
            window,
            doublebuffer,
            config,
            native,
            inner: Mutex::new(Inner {
                attribs: ContextAttribs::requested(&config),
                state: ContextState::NotCurrent,
                entry_points: None,
                swap_interval: None,
            }),
        }
    }
    fn lock(&self) -> MutexGuard<Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
    /// The window this context renders to.
    pub fn window(&self) -> WindowId { self.window }
    /// Whether the framebuffer has a back buffer.
    pub fn is_doublebuffered(&self) -> bool { self.doublebuffer }
    /// What the driver reported after creation.
    pub fn attribs(&self) -> ContextAttribs { self.lock().attribs }
    #[allow(missing_docs)]
    pub fn state(&self) -> ContextState { self.lock().state }
    /// The last swap interval that was asked for, if any.
    pub fn swap_interval(&self) -> Option<i32> { self.lock().swap_interval }
    #[allow(missing_docs)]
    pub fn creation_api(&self) -> ContextCreationApi { self.native.creation_api() }

    pub(crate) fn native(&self) -> &dyn NativeContext { &*self.native }
    pub(crate) fn config(&self) -> &ContextConfig { &self.config }
    pub(crate) fn set_attribs(&self, attribs: ContextAttribs) { self.lock().attribs = attribs; }
    pub(crate) fn entry_points(&self) -> Option<EntryPoints> { self.lock().entry_points }
    pub(crate) fn set_entry_points(&self, e: EntryPoints) { self.lock().entry_points = Some(e); }
    fn set_state(&self, state: ContextState) { self.lock().state = state; }

    fn is_current_here(&self) -> bool {
        self.state() == ContextState::Current(thread::current().id())
    }

    /// Remembers the interval and applies it if the backend can.
    pub(crate) fn apply_swap_interval(&self, interval: i32) -> Result<()> {
        self.lock().swap_interval = Some(interval);
        if self.native.swap_interval_supported() {
            self.native.set_swap_interval(interval)
        } else {
            debug!("Ignoring swap interval {} for window {:?}: no swap control", interval, self.window);
            Ok(())
        }
    }

    /// Destroys the native context. Calling this again does nothing.
    pub(crate) fn destroy(&self) {
        {
            let mut inner = self.lock();
            if inner.state == ContextState::Destroyed {
                return;
            }
            inner.state = ContextState::Destroyed;
            inner.entry_points = None;
        }
        trace!("Destroying context of window {:?}", self.window);
        self.native.destroy();
    }
}

/// Makes `target` current on the calling thread, or makes no context current.
///
/// The previously current context is only detached natively when nothing
/// replaces it or when the replacement uses another creation API, since
/// binding a context of the same API implicitly unbinds the old one.
pub(crate) fn make_current(slots: &ThreadSlots, target: Option<&Arc<Context>>) -> Result<()> {
    let thread = thread::current().id();
    let mut bound = slots.contexts();

    if let Some(t) = target {
        match t.state() {
            ContextState::Destroyed => return Err(Error::invalid_handle("The context was destroyed")),
            ContextState::Current(owner) if owner != thread => {
                return error::platform_failed(format!("The context of window {:?} is current on another thread", t.window()));
            },
            _ => (),
        }
    }

    if let Some(previous) = bound.get(&thread).cloned() {
        if let Some(t) = target {
            if Arc::ptr_eq(t, &previous) {
                return Ok(());
            }
        }
        let must_detach = match target {
            None => true,
            Some(t) => t.creation_api() != previous.creation_api(),
        };
        bound.remove(&thread);
        previous.set_state(ContextState::NotCurrent);
        if must_detach {
            debug!("Detaching context of window {:?}", previous.window());
            previous.native().detach()?;
        }
    }

    if let Some(t) = target {
        debug!("Making context of window {:?} current", t.window());
        t.native().make_current()?;
        t.set_state(ContextState::Current(thread));
        bound.insert(thread, t.clone());
    }
    Ok(())
}

/// Forgets `context` in every thread's slot, for destruction.
pub(crate) fn unbind_everywhere(slots: &ThreadSlots, context: &Arc<Context>) -> Result<()> {
    if context.is_current_here() {
        make_current(slots, None)?;
    }
    let mut bound = slots.contexts();
    bound.retain(|thread, c| {
        let keep = !Arc::ptr_eq(c, context);
        if !keep {
            warn!("Destroying the context of window {:?} while it is current on {:?}", context.window(), thread);
        }
        keep
    });
    Ok(())
}

/// Swaps a context's buffers, which is only meaningful while some context is
/// current on the calling thread.
pub(crate) fn swap_buffers(slots: &ThreadSlots, context: &Context) -> Result<()> {
    if context.state() == ContextState::Destroyed {
        return Err(Error::invalid_handle("The context was destroyed"));
    }
    if slots.current_context().is_none() {
        debug!("Not swapping buffers of window {:?}: no context is current on this thread", context.window());
        return Ok(());
    }
    context.native().swap_buffers()
}

/// Sets the swap interval of the context current on the calling thread.
pub(crate) fn set_swap_interval(slots: &ThreadSlots, interval: i32) -> Result<()> {
    match slots.current_context() {
        Some(c) => c.apply_swap_interval(interval),
        None => Err(Error::no_current_context()),
    }
}

/// Looks up an extension of the context current on the calling thread.
pub(crate) fn current_extension_supported(slots: &ThreadSlots, name: &str) -> Result<bool> {
    match slots.current_context() {
        Some(c) => introspect::extension_supported(&c, name),
        None => Err(Error::no_current_context()),
    }
}

/// Resolves a function of the context current on the calling thread.
pub(crate) fn current_proc_address(slots: &ThreadSlots, name: &str) -> Result<Option<*const c_void>> {
    match slots.current_context() {
        Some(c) => Ok(c.native().get_proc_address(name)),
        None => Err(Error::no_current_context()),
    }
}

/// A handle to a window's context that render threads may own.
///
/// Windows stay on the thread that created them, but their contexts may be
/// made current anywhere, one thread at a time.
#[derive(Debug, Clone)]
pub struct ContextHandle {
    context: Arc<Context>,
    slots: Arc<ThreadSlots>,
}

impl ContextHandle {
    pub(crate) fn new(context: Arc<Context>, slots: Arc<ThreadSlots>) -> Self {
        Self { context, slots }
    }
    /// The window this context renders to.
    pub fn window(&self) -> WindowId { self.context.window() }
    /// What the driver reported after creation.
    pub fn attribs(&self) -> ContextAttribs { self.context.attribs() }
    #[allow(missing_docs)]
    pub fn state(&self) -> ContextState { self.context.state() }
    /// Whether this context is current on the calling thread.
    pub fn is_current(&self) -> bool { self.context.is_current_here() }

    /// The last error of the calling thread, if any. Taking it clears it.
    pub fn take_error(&self) -> Option<Error> {
        self.slots.take_error()
    }
    /// Makes this context current on the calling thread.
    pub fn make_current(&self) -> Result<()> {
        let r = make_current(&self.slots, Some(&self.context));
        self.slots.report(r)
    }
    /// Makes no context current on the calling thread, if this one was.
    pub fn release(&self) -> Result<()> {
        if !self.is_current() {
            return Ok(());
        }
        let r = make_current(&self.slots, None);
        self.slots.report(r)
    }
    /// Presents the back buffer.
    pub fn swap_buffers(&self) -> Result<()> {
        let r = swap_buffers(&self.slots, &self.context);
        self.slots.report(r)
    }
    /// Sets how many screen updates to wait for before swapping. This
    /// context must be current on the calling thread.
    pub fn set_swap_interval(&self, interval: i32) -> Result<()> {
        let r = if self.is_current() {
            self.context.apply_swap_interval(interval)
        } else {
            Err(Error::no_current_context())
        };
        self.slots.report(r)
    }
    /// Whether the context supports an extension. This context must be
    /// current on the calling thread.
    pub fn extension_supported(&self, name: &str) -> Result<bool> {
        let r = if self.is_current() {
            introspect::extension_supported(&self.context, name)
        } else {
            Err(Error::no_current_context())
        };
        self.slots.report(r)
    }
    /// Retrieves a function of this context, which must be current on the
    /// calling thread.
    pub fn get_proc_address(&self, name: &str) -> Result<Option<*const c_void>> {
        let r = if self.is_current() {
            Ok(self.context.native().get_proc_address(name))
        } else {
            Err(Error::no_current_context())
        };
        self.slots.report(r)
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        self.slots.forget_current_thread();
    }
}
