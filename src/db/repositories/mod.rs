mod appointment_repository;
mod chat_repository;

pub use appointment_repository::PgAppointmentStore;
pub use chat_repository::PgChatStore;
