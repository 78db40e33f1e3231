pub mod manifest;
pub mod stream_writer;
