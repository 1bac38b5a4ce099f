// crates.io
use serde_json::json;
// self
use microservices_client::{
	_preludet::*,
	client::{ApiRequest, Client, TokenOutcome},
	config::Config,
	error::TokenError,
	http::{
		FormData, HttpTransport, OutboundRequest, RawResponse, RequestBody, TransportFuture,
		headers::{header_str, names},
	},
	response::DecodeOutcome,
	store::{MemoryStore, StoreError, StoreFuture, TokenStore},
	token::{StoreTokenHandler, Token, TokenHandler},
};

const TOKEN_PATH: &str = "/token";
const ISSUED_TOKEN: &str =
	"{\"data\":{\"AuthorizationBearerToken\":\"abc\",\"expire_in\":600000,\"Session-Id\":\"s-1\",\"user\":{\"id\":7}}}";

const TOKEN_KEY: &str = "microservices_client_token";

type Responder = dyn Fn(&OutboundRequest) -> RawResponse + Send + Sync;

/// Transport double that records every request and answers from a closure.
struct RecordingTransport {
	requests: Mutex<Vec<OutboundRequest>>,
	responder: Box<Responder>,
}
impl RecordingTransport {
	fn new(responder: impl 'static + Fn(&OutboundRequest) -> RawResponse + Send + Sync) -> Self {
		Self { requests: Mutex::new(Vec::new()), responder: Box::new(responder) }
	}

	/// Issues [`ISSUED_TOKEN`] on the token path and `api_body` everywhere else.
	fn issuing(api_body: &'static str) -> Self {
		Self::new(move |request| match request.url.path() {
			TOKEN_PATH => RawResponse::new(StatusCode::OK, ISSUED_TOKEN),
			_ => RawResponse::new(StatusCode::OK, api_body),
		})
	}

	fn requests(&self) -> Vec<OutboundRequest> {
		self.requests.lock().clone()
	}

	fn token_calls(&self) -> usize {
		self.requests.lock().iter().filter(|request| request.url.path() == TOKEN_PATH).count()
	}
}
impl HttpTransport for RecordingTransport {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = (self.responder)(&request);

			self.requests.lock().push(request);

			Ok(response)
		})
	}
}

fn header<'a>(request: &'a OutboundRequest, name: &str) -> Option<&'a str> {
	header_str(&request.headers, name)
}

/// Store wrapper that records every write.
#[derive(Default)]
struct RecordingStore {
	inner: MemoryStore,
	writes: Mutex<Vec<(String, String, Duration)>>,
}
impl TokenStore for RecordingStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		self.inner.get(key)
	}

	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> StoreFuture<'a, ()> {
		self.writes.lock().push((key.to_owned(), value.clone(), ttl));

		self.inner.set(key, value, ttl)
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		self.inner.remove(key)
	}
}

fn config() -> Config {
	Config::builder()
		.client_id(TEST_CLIENT_ID)
		.client_secret(TEST_CLIENT_SECRET)
		.token_uri("https://auth.internal/token")
		.app_name("orders")
		.app_version("2.4.1")
		.build()
		.expect("Fixture configuration should build.")
}

fn client_with(
	transport: Arc<RecordingTransport>,
	store: Arc<dyn TokenStore>,
) -> Client<RecordingTransport> {
	Client::with_transport("https", "orders.internal", config(), store, transport)
		.expect("Fixture client should build.")
}

#[tokio::test]
async fn token_grant_precedes_target_call() {
	let transport = Arc::new(RecordingTransport::issuing("{\"id\":1}"));
	let store = Arc::new(RecordingStore::default());
	let client = client_with(transport.clone(), store.clone());
	let response = client
		.post("/v1/orders", json!({ "sku": "A-1" }))
		.await
		.expect("Call should succeed.");
	let requests = transport.requests();

	assert_eq!(response.get_i64("id"), Some(1));
	assert_eq!(requests.len(), 2);

	let grant = &requests[0];

	assert_eq!(grant.method, Method::POST);
	assert_eq!(grant.url.as_str(), "https://auth.internal/token");
	assert_eq!(
		header(grant, "authorization"),
		Some("Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=")
	);
	assert_eq!(grant.body, RequestBody::Json(json!({ "grant_type": "client_credentials" })));

	let target = &requests[1];

	assert_eq!(target.url.as_str(), "https://orders.internal/v1/orders");
	assert_eq!(header(target, "authorization"), Some("Bearer abc"));
	assert_eq!(header(target, "content-type"), Some("application/json"));
	assert_eq!(header(target, "app-name"), Some("orders"));
	assert_eq!(header(target, "app-version"), Some("2.4.1"));
	assert!(!target.headers.contains_key(names::APP_PLATFORM));
	assert_eq!(target.body, RequestBody::Json(json!({ "sku": "A-1" })));

	let writes = store.writes.lock().clone();

	assert_eq!(writes[0], (TOKEN_KEY.into(), "abc".into(), Duration::milliseconds(540_000)));
	assert_eq!(writes[1].0, "microservices_client_token_expire_in");
}

#[tokio::test]
async fn missing_expiry_sends_call_without_authorization() {
	let transport = Arc::new(RecordingTransport::new(|request| match request.url.path() {
		TOKEN_PATH =>
			RawResponse::new(StatusCode::OK, "{\"data\":{\"AuthorizationBearerToken\":\"abc\"}}"),
		_ => RawResponse::new(StatusCode::OK, "{}"),
	}));
	let store = Arc::new(RecordingStore::default());
	let client = client_with(transport.clone(), store.clone());

	client.get("/v1/orders").await.expect("Degraded call should still be sent.");

	let requests = transport.requests();

	assert_eq!(requests.len(), 2);
	assert!(!requests[1].headers.contains_key(names::AUTHORIZATION));
	assert!(store.writes.lock().is_empty());

	match client.ensure_token().await.expect("Store should stay healthy.") {
		TokenOutcome::Unavailable(TokenError::MissingExpiry) => {},
		other => panic!("Unexpected outcome: {other:?}."),
	}
}

#[tokio::test]
async fn caller_authorization_skips_token_grant() {
	let transport = Arc::new(RecordingTransport::issuing("{}"));
	let client = client_with(transport.clone(), Arc::new(MemoryStore::default()));

	client
		.send(
			ApiRequest::get("/v1/orders")
				.header(names::AUTHORIZATION, HeaderValue::from_static("Bearer mine")),
		)
		.await
		.expect("Call should succeed.");

	let requests = transport.requests();

	assert_eq!(transport.token_calls(), 0);
	assert_eq!(header(&requests[0], "authorization"), Some("Bearer mine"));
}

#[tokio::test]
async fn caller_headers_win_over_defaults() {
	const TENANT: HeaderName = HeaderName::from_static("x-tenant");

	let transport = Arc::new(RecordingTransport::issuing("{}"));
	let mut client = client_with(transport.clone(), Arc::new(MemoryStore::default()));

	client
		.add_headers([("0", "dropped"), ("X-Tenant", "acme")])
		.expect("Well-formed headers should be accepted.")
		.add_header("app-name", "gateway")
		.expect("Well-formed header should be accepted.");
	client
		.send(
			ApiRequest::get("/v1/orders")
				.header(names::ACCEPT, HeaderValue::from_static("text/csv"))
				.header(names::USER_AGENT, HeaderValue::from_static("orders-cli/1"))
				.append_header(TENANT, HeaderValue::from_static("beta"))
				.append_header(TENANT, HeaderValue::from_static("gamma")),
		)
		.await
		.expect("Call should succeed.");
	client.get("/v1/orders").await.expect("Second call should succeed.");

	let requests = transport.requests();
	let first = &requests[1];
	let second = &requests[2];

	assert_eq!(header(first, "accept"), Some("text/csv"));
	assert_eq!(header(first, "user-agent"), Some("orders-cli/1"));
	assert_eq!(header(first, "app-name"), Some("gateway"));
	assert_eq!(
		first.headers.get_all("x-tenant").iter().collect::<Vec<_>>(),
		vec!["beta", "gamma"]
	);
	assert!(!first.headers.contains_key("0"));
	assert_eq!(header(second, "accept"), Some("application/json"));
	assert_eq!(header(second, "X-Tenant"), Some("acme"));
}

#[tokio::test]
async fn multipart_upload_leaves_content_type_to_transport() {
	let transport = Arc::new(RecordingTransport::issuing("{\"stored\":true}"));
	let client = client_with(transport.clone(), Arc::new(MemoryStore::default()));
	let form = FormData::new().text("kind", "invoice").file_with_type(
		"file",
		"invoice.pdf",
		"application/pdf",
		b"%PDF-1.7".to_vec(),
	);
	let response =
		client.post_form_data("/v1/uploads", form.clone()).await.expect("Upload should succeed.");
	let upload = transport.requests().pop().expect("Upload request should be recorded.");

	assert_eq!(response.get_bool("stored"), Some(true));
	assert_eq!(upload.method, Method::POST);
	assert!(!upload.headers.contains_key(names::CONTENT_TYPE));
	assert_eq!(header(&upload, "authorization"), Some("Bearer abc"));
	assert_eq!(upload.body, RequestBody::Form(form));
}

#[tokio::test]
async fn query_parameters_are_encoded() {
	let transport = Arc::new(RecordingTransport::issuing("{}"));
	let client = client_with(transport.clone(), Arc::new(MemoryStore::default()));

	client
		.get_with_params("v1//orders", &[("status", "open"), ("q", "a&b")])
		.await
		.expect("Call should succeed.");

	let target = transport.requests().pop().expect("Target request should be recorded.");

	assert_eq!(target.url.as_str(), "https://orders.internal/v1/orders?status=open&q=a%26b");
}

#[tokio::test]
async fn undecodable_bodies_yield_empty_responses() {
	let transport = Arc::new(RecordingTransport::new(|request| match request.url.path() {
		TOKEN_PATH => RawResponse::new(StatusCode::OK, ISSUED_TOKEN),
		"/v1/html" => RawResponse::new(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
		_ => RawResponse::new(StatusCode::OK, "[1,2,3]"),
	}));
	let client = client_with(transport, Arc::new(MemoryStore::default()));
	let html = client.get("/v1/html").await.expect("Invalid JSON should not fail the call.");
	let array = client.get("/v1/array").await.expect("Non-object JSON should not fail the call.");

	assert!(html.is_empty());
	assert_eq!(html.status(), StatusCode::BAD_GATEWAY);
	assert_eq!(html.decode_outcome(), DecodeOutcome::Invalid);
	assert!(array.is_empty());
	assert_eq!(array.decode_outcome(), DecodeOutcome::NotAnObject);
}

#[tokio::test]
async fn issued_token_reaches_handler() {
	let transport = Arc::new(RecordingTransport::issuing("{}"));
	let handler = Arc::new(StoreTokenHandler::new(
		"orders_token_payload",
		Arc::new(MemoryStore::default()),
	));
	let client = client_with(transport, Arc::new(MemoryStore::default()))
		.with_token_handler(handler.clone());

	client.get("/v1/orders").await.expect("Call should succeed.");

	let kept = handler.get_token().await.expect("Kept token should decode.");

	assert_eq!(kept.str_field("AuthorizationBearerToken"), "abc");
	assert_eq!(kept.session_id(), "s-1");
	assert_eq!(kept.expire_in(), 600_000);
	assert_eq!(kept.user_field("id"), Some(&json!(7)));
	assert_eq!(kept.user_field("email"), None);
}

#[tokio::test]
async fn forgotten_token_is_requested_again() {
	let transport = Arc::new(RecordingTransport::issuing("{}"));
	let client = client_with(transport.clone(), Arc::new(MemoryStore::default()));

	client.get("/v1/orders").await.expect("First call should succeed.");
	client.get("/v1/orders").await.expect("Second call should succeed.");

	assert_eq!(transport.token_calls(), 1);

	client.forget_token().await.expect("Forgetting the token should succeed.");
	client.get("/v1/orders").await.expect("Third call should succeed.");

	assert_eq!(transport.token_calls(), 2);
}

#[tokio::test]
async fn malformed_grant_reports_json_path() {
	let transport = Arc::new(RecordingTransport::new(|_| {
		RawResponse::new(StatusCode::OK, "{\"data\":{\"expire_in\":1},\"extra\":")
	}));
	let client = client_with(transport, Arc::new(MemoryStore::default()));

	match client.ensure_token().await.expect("Store should stay healthy.") {
		TokenOutcome::Unavailable(TokenError::Malformed { .. }) => {},
		other => panic!("Unexpected outcome: {other:?}."),
	}
}

#[tokio::test]
async fn concurrent_callers_share_one_grant() {
	let transport = Arc::new(RecordingTransport::issuing("{}"));
	let client = client_with(transport.clone(), Arc::new(MemoryStore::default()));
	let (first, second, third) =
		tokio::join!(client.get("/v1/a"), client.get("/v1/b"), client.get("/v1/c"));

	for response in [first, second, third] {
		response.expect("Concurrent call should succeed.");
	}

	assert_eq!(transport.token_calls(), 1);
	assert_eq!(transport.requests().len(), 4);
}

#[tokio::test]
async fn store_failures_abort_the_call() {
	struct BrokenStore;
	impl TokenStore for BrokenStore {
		fn get<'a>(&'a self, _: &'a str) -> StoreFuture<'a, Option<String>> {
			Box::pin(async { Err(StoreError::Backend { message: "disk unavailable".into() }) })
		}

		fn set<'a>(&'a self, _: &'a str, _: String, _: Duration) -> StoreFuture<'a, ()> {
			Box::pin(async { Ok(()) })
		}

		fn remove<'a>(&'a self, _: &'a str) -> StoreFuture<'a, ()> {
			Box::pin(async { Ok(()) })
		}
	}

	let transport = Arc::new(RecordingTransport::issuing("{}"));
	let client = client_with(transport.clone(), Arc::new(BrokenStore));
	let err = client.get("/v1/orders").await.expect_err("Store failure must surface.");

	assert!(matches!(err, Error::Storage(StoreError::Backend { .. })));
	assert!(transport.requests().is_empty());
}

fn granting(token_body: impl Into<String>) -> RecordingTransport {
	let token_body = token_body.into();

	RecordingTransport::new(move |request| match request.url.path() {
		TOKEN_PATH => RawResponse::new(StatusCode::OK, token_body.clone()),
		_ => RawResponse::new(StatusCode::OK, "{}"),
	})
}

#[tokio::test]
async fn short_lived_token_is_used_but_not_cached() {
	for expire_in in [60_000, 30_000] {
		let body = format!(
			"{{\"data\":{{\"AuthorizationBearerToken\":\"abc\",\"expire_in\":{expire_in}}}}}"
		);
		let transport = Arc::new(granting(body));
		let store = Arc::new(RecordingStore::default());
		let client = client_with(transport.clone(), store.clone());

		match client.ensure_token().await.expect("Store should stay healthy.") {
			TokenOutcome::Issued { secret, ttl: None, token } => {
				assert_eq!(secret.expose(), "abc");
				assert_eq!(token.expire_in(), expire_in);
			},
			other => panic!("Unexpected outcome for expire_in {expire_in}: {other:?}."),
		}

		client.get("/v1/orders").await.expect("Call should succeed.");

		let target = transport.requests().pop().expect("Target request should be recorded.");

		assert_eq!(header(&target, "authorization"), Some("Bearer abc"));
		assert!(store.writes.lock().is_empty());
		assert_eq!(store.get(TOKEN_KEY).await.expect("Store should stay healthy."), None);
		assert_eq!(transport.token_calls(), 2);
	}
}

#[tokio::test]
async fn oversized_expiry_is_rejected() {
	let transport = Arc::new(granting(
		"{\"data\":{\"AuthorizationBearerToken\":\"abc\",\"expire_in\":1000000000000000}}",
	));
	let store = Arc::new(RecordingStore::default());
	let client = client_with(transport.clone(), store.clone());

	match client.ensure_token().await.expect("Store should stay healthy.") {
		TokenOutcome::Unavailable(TokenError::ExpiryOutOfRange { expire_in }) =>
			assert_eq!(expire_in, 1_000_000_000_000_000),
		other => panic!("Unexpected outcome: {other:?}."),
	}

	client.get("/v1/orders").await.expect("Degraded call should still be sent.");

	let target = transport.requests().pop().expect("Target request should be recorded.");

	assert!(!target.headers.contains_key(names::AUTHORIZATION));
	assert!(store.writes.lock().is_empty());
}

#[tokio::test]
async fn unsendable_bearer_is_rejected() {
	let transport = Arc::new(granting(
		"{\"data\":{\"AuthorizationBearerToken\":\"a\\nb\",\"expire_in\":600000}}",
	));
	let store = Arc::new(RecordingStore::default());
	let client = client_with(transport, store.clone());

	match client.ensure_token().await.expect("Store should stay healthy.") {
		TokenOutcome::Unavailable(TokenError::InvalidBearer) => {},
		other => panic!("Unexpected outcome: {other:?}."),
	}

	assert!(store.writes.lock().is_empty());
}

#[tokio::test]
async fn handler_failures_do_not_abort_the_call() {
	struct RefusingHandler;
	impl TokenHandler for RefusingHandler {
		fn storage_key(&self) -> &str {
			"refused"
		}

		fn keep_token(&self, _: Token) -> StoreFuture<'_, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "quota exceeded".into() }) })
		}

		fn get_token(&self) -> StoreFuture<'_, Token> {
			Box::pin(async { Ok(Token::default()) })
		}
	}

	let transport = Arc::new(RecordingTransport::issuing("{\"ok\":true}"));
	let store = Arc::new(RecordingStore::default());
	let client =
		client_with(transport.clone(), store.clone()).with_token_handler(Arc::new(RefusingHandler));
	let response = client.get("/v1/orders").await.expect("Handler failure must not fail the call.");
	let target = transport.requests().pop().expect("Target request should be recorded.");

	assert_eq!(response.get_bool("ok"), Some(true));
	assert_eq!(header(&target, "authorization"), Some("Bearer abc"));
	assert_eq!(store.get(TOKEN_KEY).await.expect("Store should stay healthy."), Some("abc".into()));
}
