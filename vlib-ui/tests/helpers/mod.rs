//! Test Helper Utilities
//!
//! Shared utilities for testing vlib-ui

#![allow(dead_code)]

pub mod mock_api;
pub mod mock_server;

pub use mock_api::{list_item, search_response, MockApi};
pub use mock_server::MockServer;

use vlib_ui::api::{ApiClient, ClientSettings};

/// Client for `server` with compiled defaults
pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(ClientSettings::new(server.base_url())).expect("build client")
}
