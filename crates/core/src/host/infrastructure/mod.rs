pub mod fixed_timeline;
pub mod log_message_sink;
