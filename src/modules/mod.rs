pub mod appointments;
pub mod chat;
