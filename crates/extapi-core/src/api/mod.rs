//! HTTP side of the external API.
//!
//! `LoginClient` performs the username/password login exchange that yields a
//! bearer token. `AuthorizedClient` is a `reqwest` client carrying that token
//! for subsequent calls.

pub mod authorized;
pub mod client;
pub mod error;

pub use authorized::AuthorizedClient;
pub use client::{LoginClient, LoginGrant};
pub use error::AuthError;
