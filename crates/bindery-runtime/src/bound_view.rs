#![forbid(unsafe_code)]

//! Bound views: the lifecycle glue between a [`View`] and its view-model.
//!
//! # Lifecycle
//!
//! ```text
//! new ──mount()──▶ Mounted ──unmount()──▶ Unmounted (view-model disposed)
//!                    │  ▲
//!                    └──┘ reconfigure(new_vm)
//! ```
//!
//! - `mount()` claims the view-model, subscribes the rebuild listener and
//!   calls `init()` if the view-model is still `Created`.
//! - Every notification asks the [`RebuildScheduler`] for a rebuild, but only
//!   while the view is live.
//! - `unmount()` unsubscribes, releases the claim and disposes the view-model.
//!   The view-model cannot outlive its last mounted view.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `AlreadyBound` | View-model mounted in another view | `mount()`/`reconfigure()` rejected |
//! | `Disposed` | View-model already retired | `mount()`/`render()` rejected |
//! | `RebindRejected` | `RebindPolicy::Reject` | Binding unchanged |
//! | Late notification | Async work finishes after unmount | Rejected by the view-model; no rebuild |

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use bindery_core::{
    BindConfig, BindError, LifecycleState, Listener, RebindPolicy, ViewModel, ViewModelExt,
};
use tracing::{debug, trace, warn};

use crate::scheduler::{RebuildScheduler, ViewId};
use crate::view::View;

/// A view bound to exactly one view-model.
pub struct BoundView<V: View> {
    id: ViewId,
    view: V,
    vm: Rc<V::ViewModel>,
    scheduler: Rc<dyn RebuildScheduler>,
    config: BindConfig,
    live: Rc<Cell<bool>>,
    listener: Listener,
    mounted: bool,
}

impl<V: View> fmt::Debug for BoundView<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundView")
            .field("id", &self.id)
            .field("mounted", &self.mounted)
            .field("view_model", self.vm.core())
            .finish_non_exhaustive()
    }
}

impl<V: View> BoundView<V> {
    /// Bind `view` to `vm` with the default configuration. Nothing is
    /// subscribed until [`mount`](Self::mount).
    pub fn new(view: V, vm: Rc<V::ViewModel>, scheduler: Rc<dyn RebuildScheduler>) -> Self {
        Self::with_config(view, vm, scheduler, BindConfig::default())
    }

    /// Bind `view` to `vm` with an explicit configuration.
    pub fn with_config(
        view: V,
        vm: Rc<V::ViewModel>,
        scheduler: Rc<dyn RebuildScheduler>,
        config: BindConfig,
    ) -> Self {
        let id = ViewId::next();
        let live = Rc::new(Cell::new(false));
        let listener = rebuild_listener(id, Rc::clone(&live), Rc::downgrade(&scheduler));
        Self {
            id,
            view,
            vm,
            scheduler,
            config,
            live,
            listener,
            mounted: false,
        }
    }

    /// Identifier used for rebuild requests.
    #[must_use]
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The application view.
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The currently bound view-model.
    #[must_use]
    pub fn view_model(&self) -> &Rc<V::ViewModel> {
        &self.vm
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// True between `mount()` and `unmount()`.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Attach to the view-model: claim, subscribe, then `init()` on first
    /// attachment.
    pub fn mount(&mut self) -> Result<(), BindError> {
        if self.mounted {
            return Err(BindError::AlreadyMounted);
        }
        let core = self.vm.core();
        core.claim()?;
        if let Err(err) = core.subscribe(&self.listener) {
            core.release();
            return Err(err);
        }
        self.live.set(true);
        self.mounted = true;
        debug!(id = %self.id, "view mounted");

        if core.state() == LifecycleState::Created {
            if let Err(err) = self.vm.init() {
                self.detach_listener();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Point the view at a different view-model.
    ///
    /// Returns the previous view-model when the binding changed (its disposal
    /// is the caller's responsibility), or `None` when `vm` is the one already
    /// bound. On a mounted view the old subscription is removed before the
    /// new one is installed; whether `init()` runs on the new view-model is
    /// decided by [`RebindPolicy`].
    pub fn reconfigure(
        &mut self,
        vm: Rc<V::ViewModel>,
    ) -> Result<Option<Rc<V::ViewModel>>, BindError> {
        if Rc::ptr_eq(&self.vm, &vm) {
            return Ok(None);
        }
        if !self.mounted {
            return Ok(Some(std::mem::replace(&mut self.vm, vm)));
        }
        if self.config.rebind_policy == RebindPolicy::Reject {
            warn!(id = %self.id, "rebind rejected by policy");
            return Err(BindError::RebindRejected);
        }

        vm.core().claim()?;
        let old_core = self.vm.core();
        old_core.unsubscribe(&self.listener);
        old_core.release();
        if let Err(err) = vm.core().subscribe(&self.listener) {
            vm.core().release();
            // Restore the old binding; it was valid a moment ago.
            old_core.claim()?;
            old_core.subscribe(&self.listener)?;
            return Err(err);
        }

        let old = std::mem::replace(&mut self.vm, vm);
        debug!(
            id = %self.id,
            policy = self.config.rebind_policy.as_str(),
            "view rebound"
        );
        if self.config.rebind_policy == RebindPolicy::Reinitialize
            && self.vm.core().state() == LifecycleState::Created
        {
            self.vm.init()?;
        }
        self.scheduler.schedule_rebuild(self.id);
        Ok(Some(old))
    }

    /// Render the current view-model state.
    pub fn render(&self) -> Result<V::Output, BindError> {
        if !self.mounted {
            return Err(BindError::NotMounted);
        }
        if self.vm.core().state() == LifecycleState::Disposed {
            return Err(BindError::Disposed);
        }
        Ok(self.view.render(&self.vm))
    }

    /// Detach permanently: unsubscribe, then dispose the view-model.
    pub fn unmount(&mut self) -> Result<(), BindError> {
        if !self.mounted {
            return Err(BindError::NotMounted);
        }
        self.detach_listener();
        debug!(id = %self.id, "view unmounted");
        self.vm.dispose()
    }

    fn detach_listener(&mut self) {
        self.live.set(false);
        self.mounted = false;
        let core = self.vm.core();
        core.unsubscribe(&self.listener);
        core.release();
    }
}

impl<V: View> Drop for BoundView<V> {
    fn drop(&mut self) {
        if self.mounted {
            if let Err(err) = self.unmount() {
                warn!(id = %self.id, error = %err, "unmount on drop failed");
            }
        }
    }
}

fn rebuild_listener(
    id: ViewId,
    live: Rc<Cell<bool>>,
    scheduler: Weak<dyn RebuildScheduler>,
) -> Listener {
    Listener::new(move || {
        if !live.get() {
            trace!(%id, "notification after unmount ignored");
            return;
        }
        match scheduler.upgrade() {
            Some(scheduler) => scheduler.schedule_rebuild(id),
            None => trace!(%id, "scheduler gone, rebuild dropped"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::RebuildQueue;
    use bindery_core::ViewModelCore;
    use std::cell::RefCell;

    struct Counter {
        core: ViewModelCore,
        calls: RefCell<Vec<&'static str>>,
    }

    impl Counter {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                core: ViewModelCore::new(),
                calls: RefCell::new(Vec::new()),
            })
        }
    }

    impl ViewModel for Counter {
        fn core(&self) -> &ViewModelCore {
            &self.core
        }

        fn on_init(&self) {
            self.calls.borrow_mut().push("init");
        }

        fn on_dispose(&self) {
            self.calls.borrow_mut().push("dispose");
        }
    }

    struct Label;

    impl View for Label {
        type ViewModel = Counter;
        type Output = String;

        fn render(&self, vm: &Counter) -> String {
            if vm.is_loading() {
                "loading".into()
            } else {
                "idle".into()
            }
        }
    }

    fn setup() -> (Rc<RebuildQueue>, Rc<Counter>, BoundView<Label>) {
        let queue = Rc::new(RebuildQueue::new());
        let vm = Counter::new();
        let view = BoundView::new(Label, Rc::clone(&vm), queue.clone());
        (queue, vm, view)
    }

    #[test]
    fn mount_subscribes_and_inits_once() {
        let (_, vm, mut view) = setup();
        view.mount().unwrap();
        assert!(view.is_mounted());
        assert_eq!(vm.core.listener_count(), 1);
        assert_eq!(vm.core.claim_count(), 1);
        assert_eq!(*vm.calls.borrow(), vec!["init"]);
        assert_eq!(view.mount(), Err(BindError::AlreadyMounted));
    }

    #[test]
    fn notification_schedules_rebuild() {
        let (queue, vm, mut view) = setup();
        view.mount().unwrap();
        vm.set_loading(true).unwrap();
        assert_eq!(queue.drain(), vec![view.id()]);
        assert_eq!(view.render().unwrap(), "loading");
    }

    #[test]
    fn render_requires_mount() {
        let (_, _, view) = setup();
        assert_eq!(view.render(), Err(BindError::NotMounted));
    }

    #[test]
    fn unmount_disposes_and_stops_rebuilds() {
        let (queue, vm, mut view) = setup();
        view.mount().unwrap();
        view.unmount().unwrap();

        assert_eq!(*vm.calls.borrow(), vec!["init", "dispose"]);
        assert_eq!(vm.core.listener_count(), 0);
        assert_eq!(vm.set_loading(true), Err(BindError::Disposed));
        assert!(queue.is_empty());
        assert_eq!(view.unmount(), Err(BindError::NotMounted));
        assert_eq!(view.mount(), Err(BindError::Disposed));
    }

    #[test]
    fn drop_unmounts() {
        let (_, vm, mut view) = setup();
        view.mount().unwrap();
        drop(view);
        assert_eq!(vm.core.state(), LifecycleState::Disposed);
    }

    #[test]
    fn dropping_unmounted_view_leaves_view_model_alone() {
        let (_, vm, view) = setup();
        drop(view);
        assert_eq!(vm.core.state(), LifecycleState::Created);
    }

    #[test]
    fn stale_listener_is_inert() {
        let (queue, vm, mut view) = setup();
        view.mount().unwrap();
        let listener = view.listener.clone();
        view.unmount().unwrap();

        // Even if someone kept the listener around, it no longer schedules.
        listener.call();
        assert!(queue.is_empty());
        drop(vm);
    }

    #[test]
    fn reconfigure_unmounted_swaps_silently() {
        let (_, old, mut view) = setup();
        let new = Counter::new();
        let prev = view.reconfigure(Rc::clone(&new)).unwrap().unwrap();
        assert!(Rc::ptr_eq(&prev, &old));
        assert_eq!(new.core.listener_count(), 0);
        assert!(view.reconfigure(Rc::clone(&new)).unwrap().is_none());
    }
}
