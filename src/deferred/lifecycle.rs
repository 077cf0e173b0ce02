//! Shared lifecycle state machine of deferred resources.
//!
//! ```text
//!                 ensure_created              destroy
//!  Uninitialized ───────────────▶ Created ───────────▶ Destroyed
//!        │                                                 ▲
//!        └─────────────────── destroy ─────────────────────┘
//!
//!  disposed: false ──dispose()──▶ true      (any thread, once)
//! ```
//!
//! The logical `disposed` flag is the only piece of state written from
//! producer threads besides the display name. Native state is only touched by
//! the context thread, through the [`ContextScope`] handed out by the
//! executor.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::backend::{checked, NativeHandle, ObjectKind};
use crate::error::GraphicsError;
use crate::executor::ContextScope;

/// Physical state of the native object behind a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NativeState {
    Uninitialized,
    Created(NativeHandle),
    Destroyed,
}

#[derive(Debug)]
struct NameState {
    name: String,
    dirty: bool,
}

/// Lifecycle bookkeeping embedded in every deferred resource.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    kind: ObjectKind,
    disposed: AtomicBool,
    name: Mutex<NameState>,
    native: Mutex<NativeState>,
}

impl Lifecycle {
    pub(crate) fn new(kind: ObjectKind, label: Option<String>) -> Self {
        let dirty = label.is_some();
        Self {
            kind,
            disposed: AtomicBool::new(false),
            name: Mutex::new(NameState {
                name: label.unwrap_or_default(),
                dirty,
            }),
            native: Mutex::new(NativeState::Uninitialized),
        }
    }

    pub(crate) fn name(&self) -> String {
        self.name.lock().name.clone()
    }

    pub(crate) fn set_name(&self, name: String) {
        let mut state = self.name.lock();
        state.name = name;
        state.dirty = true;
    }

    /// Flip the logical disposal flag.
    ///
    /// Returns `true` for exactly one caller over the lifetime of the resource.
    pub(crate) fn request_dispose(&self) -> bool {
        self.disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn is_created(&self) -> bool {
        matches!(*self.native.lock(), NativeState::Created(_))
    }

    #[cfg(test)]
    pub(crate) fn is_destroyed(&self) -> bool {
        matches!(*self.native.lock(), NativeState::Destroyed)
    }

    pub(crate) fn native_handle(&self) -> Option<NativeHandle> {
        match *self.native.lock() {
            NativeState::Created(handle) => Some(handle),
            _ => None,
        }
    }

    /// Run `create` if the native object does not exist yet, then push a
    /// pending name change to the native object.
    ///
    /// A logically disposed resource is never created.
    pub(crate) fn ensure_created(
        &self,
        scope: &ContextScope<'_>,
        create: impl FnOnce() -> Result<NativeHandle, GraphicsError>,
    ) -> Result<NativeHandle, GraphicsError> {
        if self.is_disposed() {
            return Err(GraphicsError::ResourceDisposed { name: self.name() });
        }

        let handle = {
            let mut native = self.native.lock();
            match *native {
                NativeState::Created(handle) => handle,
                NativeState::Uninitialized => {
                    let handle = create()?;
                    *native = NativeState::Created(handle);
                    log::trace!("{:?} [{}]: created {:?}", self.kind, self.name(), handle);
                    handle
                }
                NativeState::Destroyed => {
                    return Err(GraphicsError::ResourceDestroyed { name: self.name() });
                }
            }
        };

        self.sync_label(scope, handle);
        Ok(handle)
    }

    fn sync_label(&self, scope: &ContextScope<'_>, handle: NativeHandle) {
        let label = {
            let mut state = self.name.lock();
            if !state.dirty {
                return;
            }
            state.dirty = false;
            state.name.clone()
        };

        if !scope.capabilities().debug_labeling {
            return;
        }

        let kind = self.kind;
        match checked(scope.gl(), "glObjectLabel", |gl| {
            gl.object_label(kind, handle, &label)
        }) {
            Ok(()) => log::trace!("{:?} [{}]: labeled {:?}", kind, label, handle),
            Err(e) => log::warn!("{:?} [{}]: failed to apply debug label: {}", kind, label, e),
        }
    }

    /// Move to the terminal state, releasing whatever the resource holds.
    ///
    /// `delete` runs if a native object exists, `reclaim` if creation never
    /// happened. Neither runs on a second call. The state is terminal even if
    /// `delete` reports an error.
    pub(crate) fn destroy(
        &self,
        delete: impl FnOnce(NativeHandle) -> Result<(), GraphicsError>,
        reclaim: impl FnOnce(),
    ) -> Result<(), GraphicsError> {
        let previous = std::mem::replace(&mut *self.native.lock(), NativeState::Destroyed);
        match previous {
            NativeState::Created(handle) => {
                log::trace!("{:?} [{}]: destroying {:?}", self.kind, self.name(), handle);
                delete(handle)
            }
            NativeState::Uninitialized => {
                log::trace!(
                    "{:?} [{}]: destroyed before creation",
                    self.kind,
                    self.name()
                );
                reclaim();
                Ok(())
            }
            NativeState::Destroyed => Ok(()),
        }
    }
}
