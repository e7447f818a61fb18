//! Resource modules: typed wrappers over [`crate::api::ApiClient`].

pub mod auth;

pub use auth::{
    session_client, AuthApi, AuthRefreshHandler, AuthSession, AuthUser, Credentials, Registration,
};
