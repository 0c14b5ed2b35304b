//! Win32 implementations of the platform seams.

pub mod code;
pub mod desktop;
pub mod msaa;
pub mod process;
pub mod shell;
pub mod worker;
