#![forbid(unsafe_code)]

//! Headless host with a virtual clock.
//!
//! [`HeadlessHost`] plays the part of a UI framework: it mounts bound views,
//! renders them into strings, runs delayed tasks against a virtual clock and
//! rebuilds whatever the views asked for. Everything is single-threaded and
//! deterministic, so tests can assert on exact frame sequences.
//!
//! # Frame loop
//!
//! ```text
//! advance(d):
//!     while a timer is due within d:
//!         now = timer.due
//!         run timer            (may mutate view-models -> rebuild requests)
//!         pump()               (render each requested, still-attached view)
//!     now += remaining
//! ```
//!
//! # Invariants
//!
//! 1. Timers run in `(due, insertion)` order and never before they are due.
//! 2. Every frame in the log is stamped with the virtual time it was rendered.
//! 3. Detached views are never rendered again, even if a rebuild was pending.
//! 4. Timer errors are collected, never panicked on.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use bindery_core::BindError;
use bindery_runtime::{BoundView, RebuildQueue, RebuildScheduler, View, ViewId};
use tracing::{debug, trace, warn};

type Task = Box<dyn FnOnce() -> Result<(), BindError>>;

/// One rendered frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    /// Virtual time of the render, in milliseconds.
    pub at_ms: u64,
    /// View that was rendered.
    pub view: ViewId,
    /// Rendered output.
    pub content: String,
}

/// An error raised by a timer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    /// Virtual time the task ran at.
    pub at_ms: u64,
    /// The error it returned.
    pub error: BindError,
}

struct Timer {
    due_ms: u64,
    seq: u64,
    task: Task,
}

/// Type-erased bound view as seen by the host.
trait HostedView {
    fn render_frame(&self) -> Result<String, BindError>;
    fn unmount(&mut self) -> Result<(), BindError>;
}

impl<V> HostedView for BoundView<V>
where
    V: View,
    V::Output: fmt::Display,
{
    fn render_frame(&self) -> Result<String, BindError> {
        self.render().map(|out| out.to_string())
    }

    fn unmount(&mut self) -> Result<(), BindError> {
        BoundView::unmount(self)
    }
}

/// Deterministic single-threaded host.
pub struct HeadlessHost {
    queue: Rc<RebuildQueue>,
    now_ms: u64,
    next_seq: u64,
    timers: Vec<Timer>,
    views: BTreeMap<ViewId, Box<dyn HostedView>>,
    frames: Vec<FrameRecord>,
    errors: Vec<TaskError>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeadlessHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessHost")
            .field("now_ms", &self.now_ms)
            .field("timers", &self.timers.len())
            .field("views", &self.views.len())
            .field("frames", &self.frames.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl HeadlessHost {
    /// Create a host at virtual time 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RebuildQueue::new()),
            now_ms: 0,
            next_seq: 0,
            timers: Vec::new(),
            views: BTreeMap::new(),
            frames: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Scheduler to hand to [`BoundView::new`] for views this host will own.
    #[must_use]
    pub fn scheduler(&self) -> Rc<dyn RebuildScheduler> {
        self.queue.clone()
    }

    /// Current virtual time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of views currently attached.
    #[must_use]
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// True if `id` is attached.
    #[must_use]
    pub fn is_attached(&self, id: ViewId) -> bool {
        self.views.contains_key(&id)
    }

    /// Mount `view`, render its first frame and keep it until [`detach`](Self::detach).
    ///
    /// `view` should have been built with [`scheduler`](Self::scheduler);
    /// otherwise its rebuild requests never reach this host.
    pub fn attach<V>(&mut self, mut view: BoundView<V>) -> Result<ViewId, BindError>
    where
        V: View + 'static,
        V::Output: fmt::Display,
    {
        view.mount()?;
        let id = view.id();
        let content = view.render()?.to_string();
        self.record(id, content);
        self.views.insert(id, Box::new(view));
        debug!(%id, at_ms = self.now_ms, "view attached");
        Ok(id)
    }

    /// Unmount and drop view `id`.
    pub fn detach(&mut self, id: ViewId) -> Result<(), BindError> {
        let mut view = self.views.remove(&id).ok_or(BindError::NotMounted)?;
        self.queue.cancel(id);
        debug!(%id, at_ms = self.now_ms, "view detached");
        view.unmount()
    }

    /// Run `task` once the virtual clock reaches `now + delay`.
    pub fn schedule_after(
        &mut self,
        delay: Duration,
        task: impl FnOnce() -> Result<(), BindError> + 'static,
    ) {
        let due_ms = self.now_ms.saturating_add(duration_ms(delay));
        let seq = self.next_seq;
        self.next_seq += 1;
        trace!(due_ms, seq, "timer scheduled");
        self.timers.push(Timer {
            due_ms,
            seq,
            task: Box::new(task),
        });
    }

    /// Number of timers not yet run.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Advance the clock by `by`, running due timers and rebuilding after
    /// each one.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now_ms.saturating_add(duration_ms(by));
        while let Some(idx) = self.next_due(target) {
            let timer = self.timers.swap_remove(idx);
            self.now_ms = timer.due_ms;
            trace!(at_ms = self.now_ms, seq = timer.seq, "timer fired");
            if let Err(error) = (timer.task)() {
                warn!(at_ms = self.now_ms, %error, "timer task failed");
                self.errors.push(TaskError {
                    at_ms: self.now_ms,
                    error,
                });
            }
            self.pump();
        }
        self.now_ms = target;
        self.pump();
    }

    /// Render every view with a pending rebuild. Returns how many frames
    /// were produced.
    pub fn pump(&mut self) -> usize {
        let mut rendered = 0;
        for id in self.queue.drain() {
            let Some(view) = self.views.get(&id) else {
                trace!(%id, "rebuild for detached view skipped");
                continue;
            };
            match view.render_frame() {
                Ok(content) => {
                    self.record(id, content);
                    rendered += 1;
                }
                Err(err) => warn!(%id, error = %err, "rebuild failed"),
            }
        }
        rendered
    }

    /// Every frame rendered so far, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Frames rendered for `id`, oldest first.
    pub fn frames_for(&self, id: ViewId) -> impl Iterator<Item = &FrameRecord> {
        self.frames.iter().filter(move |f| f.view == id)
    }

    /// Most recent frame of `id`.
    #[must_use]
    pub fn last_frame(&self, id: ViewId) -> Option<&str> {
        self.frames_for(id).last().map(|f| f.content.as_str())
    }

    /// Errors returned by timer tasks.
    #[must_use]
    pub fn errors(&self) -> &[TaskError] {
        &self.errors
    }

    fn next_due(&self, target: u64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= target)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(idx, _)| idx)
    }

    fn record(&mut self, view: ViewId, content: String) {
        trace!(%view, at_ms = self.now_ms, "frame rendered");
        self.frames.push(FrameRecord {
            at_ms: self.now_ms,
            view,
            content,
        });
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
