use core::num::NonZeroU32;

use browser_plus_event::input::{
    CursorAction, CursorInputState, InputEvent, InputPosition,
};
use tracing::trace;

use super::{Disposition, InputHandler, Priority};

/// Registration handle returned by [`Dispatcher::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(NonZeroU32);

struct Entry<S> {
    id: HandlerId,
    priority: Priority,
    handler: Box<dyn InputHandler<S> + Send>,
}

/// Ordered chain of input handlers.
///
/// The first handler consuming an event ends the chain. Synthetic input skips the
/// chain, and a left button release that ends a drag is forwarded untouched.
pub struct Dispatcher<S> {
    entries: Vec<Entry<S>>,
    next_id: NonZeroU32,
    drag_threshold: (i32, i32),
    left_down: Option<InputPosition>,
}

impl<S> Dispatcher<S> {
    pub fn new() -> Self {
        Self::with_drag_threshold((0, 0))
    }

    /// `threshold` is the distance per axis a pressed cursor may move and still click.
    pub fn with_drag_threshold(threshold: (i32, i32)) -> Self {
        Self {
            entries: Vec::new(),
            next_id: NonZeroU32::MIN,
            drag_threshold: threshold,
            left_down: None,
        }
    }

    pub fn register(
        &mut self,
        priority: Priority,
        handler: impl InputHandler<S> + Send + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let index = self
            .entries
            .partition_point(|entry| entry.priority <= priority);
        self.entries.insert(
            index,
            Entry {
                id,
                priority,
                handler: Box::new(handler),
            },
        );

        id
    }

    pub fn deregister(&mut self, id: HandlerId) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dispatch(&mut self, cx: &mut S, event: &InputEvent) -> Disposition {
        if event.is_synthetic() {
            return Disposition::Pass;
        }

        if let InputEvent::Cursor(input) = event {
            match input.action_state(CursorAction::Left) {
                Some(CursorInputState::Pressed { .. }) => self.left_down = Some(input.point),

                Some(CursorInputState::Released) => {
                    if let Some(down) = self.left_down.take() {
                        if self.is_drag(down, input.point) {
                            trace!("drag from {down:?} to {:?}", input.point);
                            return Disposition::Pass;
                        }
                    }
                }

                None => {}
            }
        }

        for entry in &mut self.entries {
            if entry.handler.handle(cx, event).is_consumed() {
                trace!(id = ?entry.id, "input consumed: {event:?}");
                return Disposition::Consume;
            }
        }

        Disposition::Pass
    }

    fn is_drag(&self, from: InputPosition, to: InputPosition) -> bool {
        let (dx, dy) = self.drag_threshold;
        to.x.abs_diff(from.x) > dx.unsigned_abs() || to.y.abs_diff(from.y) > dy.unsigned_abs()
    }
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler chain with the state it runs against.
pub struct Pipeline<S> {
    pub state: S,
    pub dispatcher: Dispatcher<S>,
}

impl<S> Pipeline<S> {
    pub fn new(state: S, dispatcher: Dispatcher<S>) -> Self {
        Self { state, dispatcher }
    }

    #[inline]
    pub fn dispatch(&mut self, event: &InputEvent) -> Disposition {
        self.dispatcher.dispatch(&mut self.state, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_plus_event::{
        input::{CursorInput, KeyInputState, KeyboardInput, SYNTHETIC_INPUT_MARKER},
        key::Key,
    };

    fn recorder(tag: &'static str, result: Disposition) -> impl InputHandler<Vec<&'static str>> + Send {
        move |log: &mut Vec<&'static str>, _: &InputEvent| {
            log.push(tag);
            result
        }
    }

    fn key_down() -> InputEvent {
        KeyboardInput::new(Key::RETURN, KeyInputState::Pressed).into()
    }

    #[test]
    fn runs_in_priority_then_registration_order() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Priority::LOW, recorder("low", Disposition::Pass));
        dispatcher.register(Priority::NORMAL, recorder("normal 1", Disposition::Pass));
        dispatcher.register(Priority::HIGH, recorder("high", Disposition::Pass));
        dispatcher.register(Priority::NORMAL, recorder("normal 2", Disposition::Pass));

        let mut log = Vec::new();
        assert_eq!(dispatcher.dispatch(&mut log, &key_down()), Disposition::Pass);
        assert_eq!(log, ["high", "normal 1", "normal 2", "low"]);
    }

    #[test]
    fn first_consumer_short_circuits() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Priority::NORMAL, recorder("a", Disposition::Pass));
        let consumer = dispatcher.register(Priority::NORMAL, recorder("b", Disposition::Consume));
        dispatcher.register(Priority::NORMAL, recorder("c", Disposition::Pass));

        let mut log = Vec::new();
        assert_eq!(dispatcher.dispatch(&mut log, &key_down()), Disposition::Consume);
        assert_eq!(log, ["a", "b"]);

        assert!(dispatcher.deregister(consumer));
        assert!(!dispatcher.deregister(consumer));

        log.clear();
        assert_eq!(dispatcher.dispatch(&mut log, &key_down()), Disposition::Pass);
        assert_eq!(log, ["a", "c"]);
    }

    #[test]
    fn synthetic_input_skips_handlers() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Priority::NORMAL, recorder("a", Disposition::Consume));

        let mut input = KeyboardInput::new(Key::RETURN, KeyInputState::Pressed);
        input.extra_info = SYNTHETIC_INPUT_MARKER;

        let mut log = Vec::new();
        assert_eq!(
            dispatcher.dispatch(&mut log, &input.into()),
            Disposition::Pass
        );
        assert!(log.is_empty());
    }

    #[test]
    fn drag_release_is_forwarded() {
        let mut dispatcher = Dispatcher::with_drag_threshold((4, 4));
        dispatcher.register(Priority::NORMAL, recorder("a", Disposition::Pass));

        let mut log = Vec::new();
        let down = CursorInput::pressed(CursorAction::Left, InputPosition::new(10, 10));
        let dragged = CursorInput::released(CursorAction::Left, InputPosition::new(30, 10));
        dispatcher.dispatch(&mut log, &down.into());
        dispatcher.dispatch(&mut log, &dragged.into());
        assert_eq!(log, ["a"]);

        log.clear();
        let clicked = CursorInput::released(CursorAction::Left, InputPosition::new(13, 7));
        dispatcher.dispatch(&mut log, &down.into());
        dispatcher.dispatch(&mut log, &clicked.into());
        assert_eq!(log, ["a", "a"]);
    }

    #[test]
    fn extreme_coordinates_count_as_drag() {
        let mut dispatcher = Dispatcher::with_drag_threshold((4, 4));
        dispatcher.register(Priority::NORMAL, recorder("a", Disposition::Pass));

        let mut log = Vec::new();
        let down = CursorInput::pressed(CursorAction::Left, InputPosition::new(i32::MIN, 0));
        let up = CursorInput::released(CursorAction::Left, InputPosition::new(i32::MAX, 0));
        dispatcher.dispatch(&mut log, &down.into());
        assert_eq!(dispatcher.dispatch(&mut log, &up.into()), Disposition::Pass);
        assert_eq!(log, ["a"]);
    }

    #[test]
    fn pipeline_owns_state() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            Priority::NORMAL,
            |count: &mut u32, _: &InputEvent| {
                *count += 1;
                Disposition::Pass
            },
        );

        let mut pipeline = Pipeline::new(0, dispatcher);
        pipeline.dispatch(&key_down());
        pipeline.dispatch(&key_down());
        assert_eq!(pipeline.state, 2);
    }
}
