//! Input event types shared by the hook glue and the behavior handlers.
//!
//! Events are produced from OS hook callbacks and consumed by the input dispatcher
//! in `browser-plus`.

pub mod input;
pub mod key;
