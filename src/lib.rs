//! Thin HTTP client for internal microservices: base URL composition, default headers, cached
//! bearer tokens, and forgiving JSON responses behind a pluggable transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod response;
pub mod store;
pub mod token;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::Client,
		config::Config,
		http::ReqwestTransport,
		store::{MemoryStore, TokenStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = Client<ReqwestTransport>;

	/// Client identifier used by test configurations.
	pub const TEST_CLIENT_ID: &str = "test-client";
	/// Client secret used by test configurations.
	pub const TEST_CLIENT_SECRET: &str = "test-secret";

	/// Builds a valid configuration whose token endpoint points at `token_uri`.
	pub fn test_config(token_uri: &str) -> Config {
		Config::builder()
			.client_id(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.token_uri(token_uri)
			.app_name("test-app")
			.build()
			.expect("Failed to build test configuration.")
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`Client`] targeting `host` over plain HTTP, backed by an in-memory store and
	/// the reqwest transport used across integration tests.
	pub fn build_reqwest_test_client(
		host: &str,
		config: Config,
	) -> (ReqwestTestClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let client =
			Client::with_transport("http://", host, config, store, test_reqwest_transport())
				.expect("Failed to build reqwest test client.");

		(client, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
