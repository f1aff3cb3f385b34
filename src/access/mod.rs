pub mod gate;
pub mod repo;
pub mod role;

pub use gate::{authorize, Grant};
pub use role::{route_for, Role};
