// # Notification Sink Trait
//
// Delivery side of the became-available notification. The poller only decides
// when to notify; the sink decides how (text, audible cue) and whether anyone
// is there to see it.

/// Trait for notification delivery
///
/// Implementations must be non-blocking: the poller calls this from inside a
/// sweep. A sink with no active session should silently do nothing.
pub trait NotificationSink: Send + Sync {
    /// A watched name went from taken to available
    fn name_available(&self, name: &str);
}

/// Sink that drops every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn name_available(&self, name: &str) {
        tracing::trace!("Dropping availability notification for {}", name);
    }
}
