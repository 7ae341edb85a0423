//! Resolves the user behind each API request from its bearer token.

mod middleware;
mod token;

pub use middleware::{AuthState, auth_guard};
pub use token::hash_token;
