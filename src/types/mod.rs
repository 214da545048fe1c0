pub mod batch;
pub mod chat;
pub mod file;
