mod appointment;
mod chat;
mod time_range;
mod typing_indicator;

pub use appointment::*;
pub use chat::*;
pub use time_range::*;
pub use typing_indicator::*;
