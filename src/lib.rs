// src/lib.rs
//! Client library for the ShadowGuard privacy dashboard backend.
//!
//! The interesting part is [`resolver`], which decides the app's entry
//! screen from local state and a single device-check round trip. The rest
//! is the REST surface ([`api`]), durable storage ([`store`]) and the
//! account flows built on them ([`session`]).

pub mod api;
pub mod config;
pub mod error;
pub mod resolver;
pub mod scan;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;

pub use api::{ApiClient, DeviceGateway};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, StoreError};
pub use resolver::{resolve, NavigationTarget, SessionResolver};
pub use session::Session;
pub use store::{CredentialStore, DeviceCache, MemoryStore, SqliteStore};
