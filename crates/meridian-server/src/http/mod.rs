pub mod handlers;
pub mod routes;

pub use handlers::ServerState;
pub use routes::create_router;
