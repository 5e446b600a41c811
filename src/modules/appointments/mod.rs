pub mod conflict;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod store;
