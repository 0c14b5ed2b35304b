//! Low-level keyboard remapping.

use browser_plus_common::KeyMapping;
use browser_plus_event::{
    input::{InputEvent, KeyInputState},
    key::Key,
};
use tracing::trace;

use crate::{
    desktop::{Desktop, Tap, chord},
    input::{Disposition, InputHandler},
};

/// Replays a configured accelerator when its trigger key goes down.
///
/// The trigger itself never reaches the host: its press and its matching release
/// are both swallowed.
#[derive(Debug, Default)]
pub struct KeyRemapper {
    mappings: Vec<KeyMapping>,
    held: Vec<Key>,
}

impl KeyRemapper {
    pub fn new(mappings: Vec<KeyMapping>) -> Self {
        Self {
            mappings,
            held: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn mapping(&self, key: Key) -> Option<&KeyMapping> {
        self.mappings.iter().find(|mapping| mapping.trigger == key)
    }
}

impl<D: Desktop> InputHandler<D> for KeyRemapper {
    fn handle(&mut self, desktop: &mut D, event: &InputEvent) -> Disposition {
        let InputEvent::Keyboard(input) = event else {
            return Disposition::Pass;
        };

        match input.state {
            KeyInputState::Pressed => {
                let Some(target) = self.mapping(input.key).map(|mapping| mapping.target) else {
                    return Disposition::Pass;
                };

                trace!("remapping {:?} to {target}", input.key);
                desktop.send_input(&chord(target.modifiers.keys(), Tap::Key(target.key)));
                if !self.held.contains(&input.key) {
                    self.held.push(input.key);
                }
                Disposition::Consume
            }

            KeyInputState::Released => {
                match self.held.iter().position(|&key| key == input.key) {
                    Some(index) => {
                        self.held.swap_remove(index);
                        Disposition::Consume
                    }
                    None => Disposition::Pass,
                }
            }
        }
    }
}
