#![forbid(unsafe_code)]

//! The render side of a binding.

use bindery_core::ViewModel;

/// An application view: a pure function from view-model state to output.
///
/// `render` only reads the view-model. Mutating it from here would notify
/// listeners in the middle of a render.
pub trait View {
    /// The view-model this view reads.
    type ViewModel: ViewModel + 'static;
    /// What a render produces (a widget tree, a string, a frame...).
    type Output;

    /// Render the current state.
    fn render(&self, vm: &Self::ViewModel) -> Self::Output;
}
