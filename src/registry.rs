//! Everything a `Display` keeps track of: live windows, cursors and
//! monitors, pointer grabs, and the per-thread error and context slots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::cursor::{Cursor, CursorId};
use crate::error::{Error, ErrorKind, Result};
use crate::gl::Context;
use crate::input::PointerGrab;
use crate::monitor::{Monitor, MonitorId};
use crate::window::{Window, WindowId};

/// Slots keyed by thread, shared by a display and its context handles.
///
/// The last error of a thread stays here until that thread takes it. Slots
/// of other threads than the display's are also cleared when they drop
/// their `ContextHandle`.
#[derive(Debug)]
pub(crate) struct ThreadSlots {
    owner: ThreadId,
    contexts: Mutex<HashMap<ThreadId, Arc<Context>>>,
    errors: Mutex<HashMap<ThreadId, Error>>,
}

impl ThreadSlots {
    pub(crate) fn new() -> Self {
        Self {
            owner: thread::current().id(),
            contexts: Mutex::default(),
            errors: Mutex::default(),
        }
    }
    /// The thread-to-current-context map. Every change of a context's
    /// current state happens while this is held.
    pub(crate) fn contexts(&self) -> MutexGuard<HashMap<ThreadId, Arc<Context>>> {
        self.contexts.lock().unwrap_or_else(PoisonError::into_inner)
    }
    pub(crate) fn current_context(&self) -> Option<Arc<Context>> {
        self.contexts().get(&thread::current().id()).cloned()
    }
    pub(crate) fn record_error(&self, e: &Error) {
        let mut errors = self.errors.lock().unwrap_or_else(PoisonError::into_inner);
        errors.insert(thread::current().id(), e.clone());
    }
    pub(crate) fn take_error(&self) -> Option<Error> {
        let mut errors = self.errors.lock().unwrap_or_else(PoisonError::into_inner);
        errors.remove(&thread::current().id())
    }
    /// Drops the error slot of the calling thread, unless it is the
    /// display's own thread.
    pub(crate) fn forget_current_thread(&self) {
        if thread::current().id() != self.owner {
            let _ = self.take_error();
        }
    }
    /// Records the error of a failed operation, if any, and passes the
    /// result through.
    pub(crate) fn report<T>(&self, r: Result<T>) -> Result<T> {
        if let Err(ref e) = r {
            self.record_error(e);
        }
        r
    }
}

/// Live objects, most recently created first.
#[derive(Debug)]
pub(crate) struct Registry {
    pub windows: Vec<Window>,
    pub cursors: Vec<Cursor>,
    pub monitors: Vec<Monitor>,
    pub grab: PointerGrab,
    pub slots: Arc<ThreadSlots>,
    next_id: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            windows: Vec::new(),
            cursors: Vec::new(),
            monitors: Vec::new(),
            grab: PointerGrab::default(),
            slots: Arc::new(ThreadSlots::new()),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
    pub(crate) fn next_window_id(&mut self) -> WindowId { WindowId(self.next_id()) }
    pub(crate) fn next_cursor_id(&mut self) -> CursorId { CursorId(self.next_id()) }
    pub(crate) fn next_monitor_id(&mut self) -> MonitorId { MonitorId(self.next_id()) }

    pub(crate) fn window(&self, id: WindowId) -> Result<&Window> {
        self.windows.iter().find(|w| w.id() == id).ok_or_else(|| invalid_window(id))
    }
    pub(crate) fn window_mut(&mut self, id: WindowId) -> Result<&mut Window> {
        self.windows.iter_mut().find(|w| w.id() == id).ok_or_else(|| invalid_window(id))
    }
    pub(crate) fn monitor_index(&self, id: MonitorId) -> Result<usize> {
        self.monitors.iter().position(|m| m.id() == id)
            .ok_or_else(|| Error::new(ErrorKind::InvalidHandle, format!("{:?} is not connected", id)))
    }
    pub(crate) fn cursor_index(&self, id: CursorId) -> Result<usize> {
        self.cursors.iter().position(|c| c.id() == id)
            .ok_or_else(|| Error::new(ErrorKind::InvalidHandle, format!("{:?} does not exist", id)))
    }
}

fn invalid_window(id: WindowId) -> Error {
    Error::invalid_handle(format!("{:?} does not exist", id))
}
