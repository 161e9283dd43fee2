#![forbid(unsafe_code)]

//! Core: observable view-models for Bindery.
//!
//! # Role in Bindery
//! `bindery-core` owns everything a view-model needs: the busy flag, the
//! listener registry, the `init`/`dispose` lifecycle and binding
//! configuration. It knows nothing about views; `bindery-runtime` builds the
//! bound-view lifecycle on top of it.
//!
//! # Primary responsibilities
//! - **ViewModelCore**: shared state with set-semantics listener registry and
//!   synchronous, ordered `notify()`.
//! - **ViewModel / ViewModelExt**: extension point and non-overridable
//!   lifecycle with ordered hooks.
//! - **Property**: notify-on-change application fields.
//! - **BindConfig**: rebind policy and re-entrancy limit, with env overrides.

pub mod config;
pub mod error;
pub mod listener;
pub mod property;
pub mod view_model;

pub use config::{BindConfig, RebindPolicy};
pub use error::BindError;
pub use listener::Listener;
pub use property::Property;
pub use view_model::{LifecycleState, Subscription, ViewModel, ViewModelCore, ViewModelExt};
