//! Input hook dispatching.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, HandlerId, Pipeline};

use browser_plus_event::input::InputEvent;

/// Whether an input reaches the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forward to the next hook.
    Pass,
    /// Suppress the input.
    Consume,
}

impl Disposition {
    #[inline]
    pub const fn is_consumed(self) -> bool {
        matches!(self, Disposition::Consume)
    }
}

/// Handler order. Lower tiers run first; registration order breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u8);

impl Priority {
    pub const HIGH: Priority = Priority(0);
    pub const NORMAL: Priority = Priority(128);
    pub const LOW: Priority = Priority(255);
}

/// A behavior reacting to input, with shared state `S`.
pub trait InputHandler<S> {
    fn handle(&mut self, cx: &mut S, event: &InputEvent) -> Disposition;
}

impl<S, F> InputHandler<S> for F
where
    F: FnMut(&mut S, &InputEvent) -> Disposition,
{
    fn handle(&mut self, cx: &mut S, event: &InputEvent) -> Disposition {
        self(cx, event)
    }
}
