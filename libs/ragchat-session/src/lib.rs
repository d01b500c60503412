#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Session store and authenticated request gateway
//!
//! The gateway wraps [`ragchat_http::HttpClient`] with bearer-token
//! injection and transparent recovery from expired access tokens. Recovery
//! is single-flight: when a burst of requests fails with 401, exactly one
//! token refresh reaches the backend and every other request waits for its
//! outcome, then replays once with the fresh token.
//!
//! # Example
//!
//! ```ignore
//! use ragchat_session::{AuthGateway, MemorySessionStore, NoopNavigator};
//! use std::sync::Arc;
//!
//! let http = ragchat_http::HttpClient::new()?;
//! let gateway = AuthGateway::new(
//!     http,
//!     "https://api.example.com",
//!     Arc::new(MemorySessionStore::new()),
//!     Arc::new(NoopNavigator),
//! );
//!
//! let answer = gateway
//!     .get("/rag/data")
//!     .send()
//!     .await?
//!     .json::<Answer>()
//!     .await?;
//! ```

mod error;
mod gateway;
mod navigator;
mod refresh;
mod store;
mod token;

pub use error::{RefreshError, SessionError};
pub use gateway::{AuthGateway, GatewayRequest};
pub use navigator::{Navigator, NoopNavigator, redirect_unless_on_auth_page};
pub use store::{FileSessionStore, MemorySessionStore, SessionKey, SessionStore};
pub use token::BearerToken;
