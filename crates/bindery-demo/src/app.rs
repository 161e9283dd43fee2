#![forbid(unsafe_code)]

//! The demo screen: a feed that loads, settles and is torn down.

use std::rc::Rc;
use std::time::Duration;

use bindery_core::{BindConfig, BindError, Property, ViewModel, ViewModelCore, ViewModelExt};
use bindery_harness::HeadlessHost;
use bindery_runtime::{BoundView, View};
use tracing::info;

use crate::cli::Opts;

/// Feed state: busy flag plus the fetched items.
pub struct FeedViewModel {
    core: ViewModelCore,
    items: Property<Vec<String>>,
}

impl FeedViewModel {
    #[must_use]
    pub fn new(config: &BindConfig) -> Rc<Self> {
        let core = ViewModelCore::with_config(config);
        let items = Property::new(&core, Vec::new());
        Rc::new(Self { core, items })
    }

    /// Begin a fetch.
    pub fn start_loading(&self) -> Result<(), BindError> {
        self.set_loading(true)
    }

    /// Finish a fetch with `items`.
    pub fn finish_loading(&self, items: Vec<String>) -> Result<(), BindError> {
        self.items.set(items)?;
        self.set_loading(false)
    }
}

impl ViewModel for FeedViewModel {
    fn core(&self) -> &ViewModelCore {
        &self.core
    }

    fn on_init(&self) {
        info!("feed initialized");
    }

    fn on_dispose(&self) {
        info!(items = self.items.with(Vec::len), "feed disposed");
    }
}

/// Renders the feed as a few lines of text.
pub struct FeedView;

impl View for FeedView {
    type ViewModel = FeedViewModel;
    type Output = String;

    fn render(&self, vm: &FeedViewModel) -> String {
        if vm.is_loading() {
            return "[ loading... ]".to_string();
        }
        vm.items.with(|items| {
            if items.is_empty() {
                "[ no items ]".to_string()
            } else {
                items
                    .iter()
                    .map(|item| format!("* {item}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        })
    }
}

/// Run the scenario and return the rendered transcript.
pub fn run(opts: &Opts, config: BindConfig) -> Result<Vec<String>, BindError> {
    let mut host = HeadlessHost::new();
    let vm = FeedViewModel::new(&config);
    let view = BoundView::with_config(FeedView, Rc::clone(&vm), host.scheduler(), config);
    let id = host.attach(view)?;

    vm.start_loading()?;
    host.pump();

    let fetch_vm = Rc::clone(&vm);
    let items: Vec<String> = (1..=opts.items).map(|n| format!("item {n}")).collect();
    host.schedule_after(Duration::from_millis(opts.delay_ms), move || {
        fetch_vm.finish_loading(items)
    });
    host.advance(Duration::from_millis(opts.delay_ms));

    host.detach(id)?;

    // A straggling update after teardown is rejected, not rendered.
    let late_vm = Rc::clone(&vm);
    host.schedule_after(Duration::from_millis(1), move || late_vm.start_loading());
    host.advance(Duration::from_millis(1));

    let mut transcript: Vec<String> = host
        .frames()
        .iter()
        .map(|frame| format!("t={}ms\n{}", frame.at_ms, frame.content))
        .collect();
    for err in host.errors() {
        transcript.push(format!("t={}ms rejected: {}", err.at_ms, err.error));
    }
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_shows_load_cycle() {
        let opts = Opts {
            delay_ms: 10,
            items: 2,
        };
        let transcript = run(&opts, BindConfig::default()).unwrap();
        assert_eq!(
            transcript,
            vec![
                "t=0ms\n[ no items ]".to_string(),
                "t=0ms\n[ loading... ]".to_string(),
                "t=10ms\n* item 1\n* item 2".to_string(),
                "t=11ms rejected: view-model used after dispose".to_string(),
            ]
        );
    }

    #[test]
    fn zero_items_renders_placeholder() {
        let opts = Opts {
            delay_ms: 0,
            items: 0,
        };
        let transcript = run(&opts, BindConfig::default()).unwrap();
        // Loading frame is replaced by the empty placeholder once settled.
        assert_eq!(transcript[2], "t=0ms\n[ no items ]");
    }
}
