mod admin_auth;

pub use admin_auth::{AdminContext, admin_auth};
