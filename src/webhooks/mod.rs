pub mod event;
pub mod handlers;
pub mod ingest;
pub mod repo;
pub mod signature;

pub use handlers::router;
