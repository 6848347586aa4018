//! Common test infrastructure
//!
//! Each test gets a server wired to real upstream clients, which talk to an
//! in-process fake of the catalog, generation and video APIs.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestClient, TestServer, HAPPY_GENERATION};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_recommend() {
//!     let server = TestServer::spawn().await;
//!     server.upstreams.set_generation(HAPPY_GENERATION);
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.get_recommendations("happy", "rock").await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fake_services;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fake_services::FakeUpstreams;
pub use server::TestServer;
