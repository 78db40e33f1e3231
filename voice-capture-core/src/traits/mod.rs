pub mod capture_delegate;
pub mod decryptor;
pub mod formatter;
pub mod voice_source;
