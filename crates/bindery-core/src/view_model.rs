#![forbid(unsafe_code)]

//! Observable view-model core.
//!
//! # Design
//!
//! Application view-models are ordinary structs that own a [`ViewModelCore`]
//! and implement [`ViewModel`]. The core holds the busy flag, the listener
//! registry, the lifecycle state and the ordered lifecycle hooks. Lifecycle
//! entry points live on [`ViewModelExt`], which is blanket-implemented and
//! therefore cannot be overridden: base initialization always runs first and
//! base disposal always runs last.
//!
//! ```text
//! init():    base (Created -> Active) -> init hooks -> ViewModel::on_init
//! dispose(): ViewModel::on_dispose -> dispose hooks -> base (Disposed)
//! ```
//!
//! # Invariants
//!
//! 1. The registry is an insertion-ordered set: a listener appears at most once.
//! 2. `notify()` calls listeners in registration order, with no registry
//!    borrow held while a listener runs.
//! 3. A listener removed during a pass is not called later in that pass.
//! 4. `set_loading(v)` with `v == is_loading()` never notifies.
//! 5. After `dispose()` every mutating operation returns [`BindError::Disposed`].
//!
//! # Failure Modes
//!
//! - **Deep re-entrancy**: a listener that mutates state triggers a nested
//!   `notify()`. Passes nested deeper than `max_notify_depth` are rejected
//!   with [`BindError::NotifyDepthExceeded`] before any state changes.
//! - **Shared view-model**: [`ViewModelCore::claim`] allows one mounted view
//!   at a time.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::config::{BindConfig, DEFAULT_MAX_NOTIFY_DEPTH};
use crate::error::BindError;
use crate::listener::Listener;

type Hook = Box<dyn FnOnce()>;

/// Lifecycle of a view-model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, `init()` not yet called.
    Created,
    /// Initialized and usable.
    Active,
    /// `dispose()` is running its hooks.
    Disposing,
    /// Retired; all mutation is rejected.
    Disposed,
}

impl LifecycleState {
    /// True for `Disposing` and `Disposed`.
    #[must_use]
    pub const fn is_retiring(self) -> bool {
        matches!(self, Self::Disposing | Self::Disposed)
    }
}

struct CoreInner {
    is_loading: bool,
    state: LifecycleState,
    listeners: Vec<Listener>,
    version: u64,
    notify_depth: usize,
    max_notify_depth: usize,
    claims: usize,
    init_hooks: Vec<Hook>,
    dispose_hooks: Vec<Hook>,
}

impl CoreInner {
    fn ensure_usable(&self) -> Result<(), BindError> {
        if self.state == LifecycleState::Disposed {
            Err(BindError::Disposed)
        } else {
            Ok(())
        }
    }

    fn ensure_can_notify(&self) -> Result<(), BindError> {
        self.ensure_usable()?;
        if self.notify_depth >= self.max_notify_depth {
            return Err(BindError::NotifyDepthExceeded {
                depth: self.notify_depth + 1,
            });
        }
        Ok(())
    }

    fn contains(&self, listener: &Listener) -> bool {
        self.listeners.iter().any(|l| l.same(listener))
    }
}

/// Shared state behind every view-model.
///
/// Cloning a `ViewModelCore` creates another handle to the **same** state,
/// which is how [`Property`](crate::Property) fields reach the registry.
pub struct ViewModelCore {
    inner: Rc<RefCell<CoreInner>>,
}

impl Clone for ViewModelCore {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for ViewModelCore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewModelCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ViewModelCore")
            .field("is_loading", &inner.is_loading)
            .field("state", &inner.state)
            .field("version", &inner.version)
            .field("listener_count", &inner.listeners.len())
            .field("claims", &inner.claims)
            .finish()
    }
}

/// Decrements the notify depth when a pass ends, including on unwind.
struct DepthGuard<'a> {
    inner: &'a RefCell<CoreInner>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.notify_depth = inner.notify_depth.saturating_sub(1);
    }
}

impl ViewModelCore {
    /// Create a core with `is_loading == false` and the default notify limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_notify_depth(DEFAULT_MAX_NOTIFY_DEPTH)
    }

    /// Create a core using the notify limit from `config`.
    #[must_use]
    pub fn with_config(config: &BindConfig) -> Self {
        Self::with_max_notify_depth(config.max_notify_depth)
    }

    fn with_max_notify_depth(max_notify_depth: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CoreInner {
                is_loading: false,
                state: LifecycleState::Created,
                listeners: Vec::new(),
                version: 0,
                notify_depth: 0,
                max_notify_depth: max_notify_depth.max(1),
                claims: 0,
                init_hooks: Vec::new(),
                dispose_hooks: Vec::new(),
            })),
        }
    }

    /// Current busy flag.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.borrow().is_loading
    }

    /// Set the busy flag, notifying listeners only if the value changed.
    pub fn set_loading(&self, value: bool) -> Result<(), BindError> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.ensure_usable()?;
            if inner.is_loading == value {
                return Ok(());
            }
            inner.ensure_can_notify()?;
            inner.is_loading = value;
        }
        trace!(is_loading = value, "busy flag changed");
        self.notify()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.borrow().state
    }

    /// Number of notification passes delivered so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// True if `listener` is registered.
    #[must_use]
    pub fn is_subscribed(&self, listener: &Listener) -> bool {
        self.inner.borrow().contains(listener)
    }

    /// Register `listener`.
    ///
    /// Returns `Ok(true)` if it was added, `Ok(false)` if it was already
    /// registered (the registry is a set).
    pub fn subscribe(&self, listener: &Listener) -> Result<bool, BindError> {
        let mut inner = self.inner.borrow_mut();
        inner.ensure_usable()?;
        if inner.contains(listener) {
            trace!("listener already subscribed");
            return Ok(false);
        }
        inner.listeners.push(listener.clone());
        trace!(listener_count = inner.listeners.len(), "listener subscribed");
        Ok(true)
    }

    /// Register `listener` and return a guard that unsubscribes it on drop.
    pub fn subscribe_guard(&self, listener: &Listener) -> Result<Subscription, BindError> {
        self.subscribe(listener)?;
        Ok(Subscription {
            core: Rc::downgrade(&self.inner),
            listener: listener.clone(),
        })
    }

    /// Remove `listener`. Unknown listeners are ignored; returns whether one
    /// was removed.
    pub fn unsubscribe(&self, listener: &Listener) -> bool {
        remove_listener(&self.inner, listener)
    }

    /// Call every registered listener, in registration order.
    pub fn notify(&self) -> Result<(), BindError> {
        let snapshot = {
            let mut inner = self.inner.borrow_mut();
            if let Err(err) = inner.ensure_can_notify() {
                warn!(error = %err, "notify rejected");
                return Err(err);
            }
            inner.notify_depth += 1;
            inner.version += 1;
            trace!(
                depth = inner.notify_depth,
                listeners = inner.listeners.len(),
                "notify"
            );
            inner.listeners.clone()
        };
        let _depth = DepthGuard { inner: &self.inner };

        for listener in &snapshot {
            // Listeners may unsubscribe each other or dispose the view-model.
            let still_registered = {
                let inner = self.inner.borrow();
                inner.state != LifecycleState::Disposed && inner.contains(listener)
            };
            if still_registered {
                listener.call();
            }
        }
        Ok(())
    }

    /// Add a hook that runs during `init()`, after base initialization.
    ///
    /// Hooks run in registration order.
    pub fn add_init_hook(&self, hook: impl FnOnce() + 'static) -> Result<(), BindError> {
        let mut inner = self.inner.borrow_mut();
        match inner.state {
            LifecycleState::Created => {
                inner.init_hooks.push(Box::new(hook));
                Ok(())
            }
            LifecycleState::Active => Err(BindError::AlreadyInitialized),
            LifecycleState::Disposing | LifecycleState::Disposed => Err(BindError::Disposed),
        }
    }

    /// Add a hook that runs during `dispose()`, before base disposal.
    ///
    /// Hooks run in registration order.
    pub fn add_dispose_hook(&self, hook: impl FnOnce() + 'static) -> Result<(), BindError> {
        let mut inner = self.inner.borrow_mut();
        if inner.state.is_retiring() {
            return Err(BindError::Disposed);
        }
        inner.dispose_hooks.push(Box::new(hook));
        Ok(())
    }

    /// Claim the view-model for a mounting view.
    ///
    /// Only one mounted view may hold a claim at a time.
    pub fn claim(&self) -> Result<(), BindError> {
        let mut inner = self.inner.borrow_mut();
        if inner.state.is_retiring() {
            return Err(BindError::Disposed);
        }
        if inner.claims > 0 {
            warn!("view-model is already bound to a mounted view");
            return Err(BindError::AlreadyBound);
        }
        inner.claims += 1;
        Ok(())
    }

    /// Release a claim taken with [`claim`](Self::claim).
    pub fn release(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.claims = inner.claims.saturating_sub(1);
    }

    /// Number of mounted views currently holding a claim.
    #[must_use]
    pub fn claim_count(&self) -> usize {
        self.inner.borrow().claims
    }

    /// Base initialization. Returns the init hooks to run.
    fn begin_init(&self) -> Result<Vec<Hook>, BindError> {
        let mut inner = self.inner.borrow_mut();
        match inner.state {
            LifecycleState::Created => {
                inner.state = LifecycleState::Active;
                debug!("view-model initialized");
                Ok(std::mem::take(&mut inner.init_hooks))
            }
            LifecycleState::Active => Err(BindError::AlreadyInitialized),
            LifecycleState::Disposing | LifecycleState::Disposed => Err(BindError::Disposed),
        }
    }

    fn begin_dispose(&self) -> Result<(), BindError> {
        let mut inner = self.inner.borrow_mut();
        if inner.state.is_retiring() {
            warn!(state = ?inner.state, "dispose called twice");
            return Err(BindError::Disposed);
        }
        inner.state = LifecycleState::Disposing;
        Ok(())
    }

    fn take_dispose_hooks(&self) -> Vec<Hook> {
        std::mem::take(&mut self.inner.borrow_mut().dispose_hooks)
    }

    /// Base disposal: clear the busy flag silently, drop all listeners and
    /// pending hooks.
    fn finish_dispose(&self) {
        let (listeners, init_hooks) = {
            let mut inner = self.inner.borrow_mut();
            inner.is_loading = false;
            inner.state = LifecycleState::Disposed;
            (
                std::mem::take(&mut inner.listeners),
                std::mem::take(&mut inner.init_hooks),
            )
        };
        debug!(dropped_listeners = listeners.len(), "view-model disposed");
        // Dropped outside the borrow: captured state may hold other cores.
        drop(listeners);
        drop(init_hooks);
    }
}

fn remove_listener(inner: &RefCell<CoreInner>, listener: &Listener) -> bool {
    let mut inner = inner.borrow_mut();
    let before = inner.listeners.len();
    inner.listeners.retain(|l| !l.same(listener));
    let removed = inner.listeners.len() != before;
    if removed {
        trace!(listener_count = inner.listeners.len(), "listener unsubscribed");
    }
    removed
}

/// RAII guard for a listener registration.
///
/// Dropping the guard unsubscribes the listener. The guard holds the core
/// weakly, so it never keeps a view-model alive.
pub struct Subscription {
    core: Weak<RefCell<CoreInner>>,
    listener: Listener,
}

impl Subscription {
    /// The guarded listener.
    #[must_use]
    pub fn listener(&self) -> &Listener {
        &self.listener
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.core.upgrade() {
            remove_listener(&inner, &self.listener);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// An application view-model.
///
/// Implementors own a [`ViewModelCore`] and may override the two hooks. The
/// lifecycle itself is driven through [`ViewModelExt`].
pub trait ViewModel {
    /// The shared core holding busy flag, listeners and lifecycle state.
    fn core(&self) -> &ViewModelCore;

    /// Called by `init()` after base initialization and registered init hooks.
    fn on_init(&self) {}

    /// Called by `dispose()` before registered dispose hooks and base disposal.
    fn on_dispose(&self) {}
}

/// Lifecycle and notification operations available on every [`ViewModel`].
pub trait ViewModelExt {
    /// Current busy flag.
    fn is_loading(&self) -> bool;

    /// Set the busy flag; notifies only on change.
    fn set_loading(&self, value: bool) -> Result<(), BindError>;

    /// Register a listener.
    fn subscribe(&self, listener: &Listener) -> Result<bool, BindError>;

    /// Remove a listener; unknown listeners are ignored.
    fn unsubscribe(&self, listener: &Listener) -> bool;

    /// Notify all listeners in registration order.
    fn notify(&self) -> Result<(), BindError>;

    /// Initialize once: base step, init hooks, then `on_init`.
    fn init(&self) -> Result<(), BindError>;

    /// Retire once: `on_dispose`, dispose hooks, then the base step.
    fn dispose(&self) -> Result<(), BindError>;
}

impl<T: ViewModel + ?Sized> ViewModelExt for T {
    fn is_loading(&self) -> bool {
        self.core().is_loading()
    }

    fn set_loading(&self, value: bool) -> Result<(), BindError> {
        self.core().set_loading(value)
    }

    fn subscribe(&self, listener: &Listener) -> Result<bool, BindError> {
        self.core().subscribe(listener)
    }

    fn unsubscribe(&self, listener: &Listener) -> bool {
        self.core().unsubscribe(listener)
    }

    fn notify(&self) -> Result<(), BindError> {
        self.core().notify()
    }

    fn init(&self) -> Result<(), BindError> {
        let hooks = self.core().begin_init()?;
        for hook in hooks {
            hook();
        }
        self.on_init();
        Ok(())
    }

    fn dispose(&self) -> Result<(), BindError> {
        let core = self.core();
        core.begin_dispose()?;
        self.on_dispose();
        for hook in core.take_dispose_hooks() {
            hook();
        }
        core.finish_dispose();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
