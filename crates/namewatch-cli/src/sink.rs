// # Terminal Notification Sink
//
// Prints became-available notifications to the interactive terminal with an
// audible cue. Once the session detaches (EOF or shutdown) notifications are
// dropped.

use namewatch_core::NotificationSink;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

use crate::render;

/// Sink bound to the process's stdout
#[derive(Debug)]
pub struct TerminalSink {
    attached: AtomicBool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            attached: AtomicBool::new(true),
        }
    }

    /// Stop delivering notifications
    pub fn detach(&self) {
        if self.attached.swap(false, Ordering::SeqCst) {
            debug!("Terminal session detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for TerminalSink {
    fn name_available(&self, name: &str) {
        if !self.is_attached() {
            trace!("No terminal attached, dropping notification for {}", name);
            return;
        }

        let mut stdout = std::io::stdout().lock();
        // BEL for the audible cue
        let _ = writeln!(stdout, "\x07{}", render::name_available(name));
        let _ = stdout.flush();
    }
}
