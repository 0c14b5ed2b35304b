//! Debugger output for the proxy dll.
//!
//! The browser has no console, so debug builds route `tracing` events to
//! `OutputDebugStringW`. Attach a debugger or DebugView to read them.

use std::io::{self, Write};

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use windows::{Win32::System::Diagnostics::Debug::OutputDebugStringW, core::PCWSTR};

/// Emits every formatted event as one debug string.
pub struct DebugOutput {
    /// Reused UTF-16 conversion buffer. Also serializes output across threads.
    wide: Mutex<Vec<u16>>,
}

impl DebugOutput {
    pub fn new() -> Self {
        Self {
            wide: Mutex::new(Vec::new()),
        }
    }

    fn emit(&self, text: &[u8]) {
        if text.is_empty() {
            return;
        }

        let mut wide = self.wide.lock();
        wide.clear();
        wide.extend(String::from_utf8_lossy(text).encode_utf16());
        wide.push(0);

        unsafe { OutputDebugStringW(PCWSTR(wide.as_ptr())) };
    }
}

impl<'a> MakeWriter<'a> for DebugOutput {
    type Writer = EventWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            output: self,
            text: Vec::new(),
        }
    }
}

/// Collects one event. The text is emitted on drop.
pub struct EventWriter<'a> {
    output: &'a DebugOutput,
    text: Vec<u8>,
}

impl Write for EventWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.text.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter<'_> {
    fn drop(&mut self) {
        self.output.emit(&self.text);
    }
}
