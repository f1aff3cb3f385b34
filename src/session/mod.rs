pub mod extractor;
pub mod handlers;

pub use extractor::{Session, SESSION_COOKIE};
pub use handlers::router;
