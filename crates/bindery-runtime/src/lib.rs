#![forbid(unsafe_code)]

//! Runtime: bound views and rebuild scheduling for Bindery.
//!
//! A host framework supplies a [`RebuildScheduler`] and renders views when
//! asked. Application code implements [`View`] and hands a view plus its
//! view-model to [`BoundView`], which owns the subscription lifecycle.

pub mod bound_view;
pub mod scheduler;
pub mod view;

pub use bound_view::BoundView;
pub use scheduler::{RebuildQueue, RebuildScheduler, ViewId};
pub use view::View;

pub use bindery_core::{BindConfig, BindError, RebindPolicy};
