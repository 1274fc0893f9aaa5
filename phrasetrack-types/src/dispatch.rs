//! Dispatch abstraction for transport actions.

use crate::TransportAction;

/// Trait for dispatching transport actions to the sequencer.
///
/// The local implementation forwards actions to the sequencer thread; tests
/// can record them instead.
pub trait Dispatcher {
    /// Dispatch an action. Failures are absorbed by the sequencer and logged.
    fn dispatch(&mut self, action: &TransportAction);
}
