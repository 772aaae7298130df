pub mod convert;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use convert::ErrorResponse;
pub use routes::create_router;
