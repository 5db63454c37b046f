/// Severity of a message shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageLevel {
    Error,
    Warning,
    Message,
}

/// Where the writer posts user-facing messages that stay visible until
/// cleared, such as a bad filename.
pub trait MessageSink: Send + Sync {
    fn set_persistent_message(&self, level: MessageLevel, message: &str);

    fn clear_persistent_message(&self);
}

/// Drops every message.
pub struct NullMessageSink;

impl MessageSink for NullMessageSink {
    fn set_persistent_message(&self, _level: MessageLevel, _message: &str) {}

    fn clear_persistent_message(&self) {}
}

impl<S: MessageSink + ?Sized> MessageSink for std::sync::Arc<S> {
    fn set_persistent_message(&self, level: MessageLevel, message: &str) {
        (**self).set_persistent_message(level, message)
    }

    fn clear_persistent_message(&self) {
        (**self).clear_persistent_message()
    }
}
