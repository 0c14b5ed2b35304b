//! Browser behavior modification core.
//!
//! Policy code (accessibility queries, input dispatch, behaviors, export table
//! redirection) is platform independent and generic over [`desktop::Desktop`].
//! The Win32 backends, hook glue and [`initialize`] only build on Windows.

pub mod accessibility;
pub mod behavior;
pub mod context;
pub mod desktop;
pub mod export;
pub mod input;
pub mod query;

#[cfg(windows)]
mod backend;
#[cfg(windows)]
mod bootstrap;
#[cfg(windows)]
mod hook;

#[cfg(windows)]
pub use bootstrap::initialize;
