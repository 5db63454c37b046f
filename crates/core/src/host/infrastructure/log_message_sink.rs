use std::sync::{Mutex, PoisonError};

use crate::host::domain::message_sink::{MessageLevel, MessageSink};

/// Mirrors persistent messages to the `log` facade and remembers the one
/// currently shown.
#[derive(Default)]
pub struct LogMessageSink {
    current: Mutex<Option<(MessageLevel, String)>>,
}

impl LogMessageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<(MessageLevel, String)> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MessageSink for LogMessageSink {
    fn set_persistent_message(&self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Error => log::error!("{message}"),
            MessageLevel::Warning => log::warn!("{message}"),
            MessageLevel::Message => log::info!("{message}"),
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((level, message.to_owned()));
    }

    fn clear_persistent_message(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.take().is_some() {
            log::debug!("Persistent message cleared");
        }
    }
}
