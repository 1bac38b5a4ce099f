//! Calls a mocked service twice with the default reqwest transport and in-memory store, showing
//! that the bearer token is requested once and reused from the cache.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use microservices_client::{
	client::Client,
	config::Config,
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"data\":{\"AuthorizationBearerToken\":\"demo-token\",\"expire_in\":900000}}",
			);
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/profile").header("authorization", "Bearer demo-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"demo\",\"active\":true}");
		})
		.await;
	let config = Config::builder()
		.client_id("demo-client")
		.client_secret("demo-secret")
		.token_uri(server.url("/token"))
		.app_name("demo")
		.build()?;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let client = Client::new("http", server.address().to_string(), config, store)?;
	let first = client.get("/v1/profile").await?;
	let second = client.get("/v1/profile").await?;

	println!("first:  {:?}", first.as_map());
	println!("second: active={:?}", second.get_bool("active"));

	token_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(2).await;

	Ok(())
}
