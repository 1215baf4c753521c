pub mod auth;
pub mod policy;

pub use auth::{authenticate, Principal};
pub use policy::{enforce, Access, RoutePolicy};
