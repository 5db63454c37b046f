pub mod message_sink;
pub mod timeline;
