mod routes;
mod ws_handler;

pub use routes::websocket_routes;
