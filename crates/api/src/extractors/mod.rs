//! Custom Axum extractors.

pub mod admin_auth;
pub mod client_ip;

pub use admin_auth::AdminAuth;
pub use client_ip::ClientIp;
