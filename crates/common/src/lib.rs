//! Configuration and text formats shared by the browser-plus crates.
//!
//! Everything here is platform independent: accelerator strings, the ini
//! configuration and the portable-mode command line.

pub mod cmdline;
pub mod config;
pub mod hotkey;

pub use config::Config;
pub use hotkey::{Hotkey, KeyMapping};
