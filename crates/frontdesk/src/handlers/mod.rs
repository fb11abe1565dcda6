//! HTTP request handlers.

mod admin;
pub mod admin_auth;
mod chat;
mod health;
pub(crate) mod problem_details;
mod version;

pub use admin::{get_config, put_config, reload};
pub use chat::{chat, status};
pub use health::{livez, root};
pub use version::version;
