//! syncgate server: configuration and HTTP routing around
//! [`syncgate_auth::TokenService`].

pub mod app;
pub mod config;
