pub mod frame_range;
pub mod generic_writer;
pub mod render_error;
pub mod render_request;
pub mod render_sequence_use_case;
pub mod writer_config;
