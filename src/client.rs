//! Service client: URL composition, header management, and dispatch.

pub mod auth;
pub mod request;
pub mod url;

pub use self::url::*;
pub use auth::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	config::{self, Config, TokenFailurePolicy},
	error::ConfigError,
	http::{
		FormData, HttpTransport, OutboundRequest, RequestBody,
		headers::{self, names},
	},
	obs::{self, CallKind, CallOutcome, CallSpan},
	response::Response,
	store::TokenStore,
	token::{TokenHandler, TokenSecret},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestServiceClient = Client<ReqwestTransport>;

/// `User-Agent` sent when the configuration does not name one.
pub const DEFAULT_USER_AGENT: &str = concat!("microservices-client/", env!("CARGO_PKG_VERSION"));

const JSON_MIME: &str = "application/json";

/// HTTP client bound to one service host.
///
/// The client owns the transport, token store, and configuration references so each call only
/// describes what differs: verb, path, body, and call-specific headers. Headers added through
/// [`add_header`](Self::add_header) persist for every later call on the same instance; headers
/// attached to an [`ApiRequest`] apply to that call only. No other state is mutated per call, so a
/// shared `&Client` may serve concurrent requests.
pub struct Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Scheme prefix such as `https://`.
	pub scheme: String,
	/// Host (and optional port or base path) of the target service.
	pub host: String,
	/// Shared, read-only configuration.
	pub config: Arc<Config>,
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Store caching the bearer token.
	pub store: Arc<dyn TokenStore>,
	/// Optional sink receiving every freshly issued token payload.
	pub token_handler: Option<Arc<dyn TokenHandler>>,
	headers: HeaderMap,
	defaults: HeaderMap,
	basic_credentials: HeaderValue,
	token_uri: Url,
	token_policy: TokenFailurePolicy,
	token_guard: Arc<AsyncMutex<()>>,
}
impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// Fails with [`ConfigError`] when `config` does not validate or one of its header values
	/// cannot be sent. Headers declared under the config's `headers` key seed the persistent
	/// header set.
	pub fn with_transport(
		scheme: impl Into<String>,
		host: impl Into<String>,
		config: impl Into<Arc<Config>>,
		store: Arc<dyn TokenStore>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self> {
		let config = config.into();

		config.validate()?;

		let token_uri = config.token_uri()?;
		let token_policy = config.token_failure_policy()?;
		let defaults = default_headers(&config)?;
		let basic_credentials = auth::basic_credentials(&config)?;
		let configured = config
			.headers()
			.map(|(name, value)| (name.to_owned(), value.to_owned()))
			.collect::<Vec<_>>();
		let mut client = Self {
			scheme: scheme.into(),
			host: host.into(),
			config,
			transport: transport.into(),
			store,
			token_handler: None,
			headers: HeaderMap::new(),
			defaults,
			basic_credentials,
			token_uri,
			token_policy,
			token_guard: Default::default(),
		};

		client.add_headers(configured)?;

		Ok(client)
	}

	/// Forwards every freshly issued token payload to `handler`.
	pub fn with_token_handler(mut self, handler: Arc<dyn TokenHandler>) -> Self {
		self.token_handler = Some(handler);

		self
	}

	/// Sets a header sent with every later call, replacing earlier values of the same name.
	///
	/// Fails with [`ConfigError::InvalidHeader`] when the pair cannot be sent; the header set is
	/// left unchanged in that case.
	pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
		let (name, value) = headers::parse_header(name, value)?;

		self.headers.insert(name, value);

		Ok(self)
	}

	/// Merges headers sent with every later call, skipping positional keys such as `"0"`.
	///
	/// Every pair is validated before any is applied.
	pub fn add_headers<I, K, V>(&mut self, headers: I) -> Result<&mut Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let parsed = headers
			.into_iter()
			.filter(|(name, _)| !headers::is_positional_key(name.as_ref()))
			.map(|(name, value)| headers::parse_header(name.as_ref(), value.as_ref()))
			.collect::<Result<Vec<_>, _>>()?;

		for (name, value) in parsed {
			self.headers.insert(name, value);
		}

		Ok(self)
	}

	/// Persistent headers configured on this client.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Resolves `uri` against the client's scheme and host.
	pub fn url(&self, uri: &str) -> Result<Url> {
		let raw = build_url(&self.scheme, &self.host, uri);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source }.into())
	}

	/// Sends a `GET` request.
	pub async fn get(&self, uri: &str) -> Result<Response> {
		self.send(ApiRequest::get(uri)).await
	}

	/// Sends a `GET` request with query parameters.
	pub async fn get_with_params<K, V>(&self, uri: &str, params: &[(K, V)]) -> Result<Response>
	where
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let request = params
			.iter()
			.fold(ApiRequest::get(uri), |request, (key, value)| {
				request.query(key.as_ref(), value.as_ref())
			});

		self.send(request).await
	}

	/// Sends a `POST` request.
	pub async fn post(&self, uri: &str, body: impl Into<RequestBody>) -> Result<Response> {
		self.send(ApiRequest::post(uri).body(body)).await
	}

	/// Sends a `PUT` request.
	pub async fn put(&self, uri: &str, body: impl Into<RequestBody>) -> Result<Response> {
		self.send(ApiRequest::put(uri).body(body)).await
	}

	/// Sends a `PATCH` request.
	pub async fn patch(&self, uri: &str, body: impl Into<RequestBody>) -> Result<Response> {
		self.send(ApiRequest::patch(uri).body(body)).await
	}

	/// Sends a `DELETE` request.
	pub async fn delete(&self, uri: &str, body: impl Into<RequestBody>) -> Result<Response> {
		self.send(ApiRequest::delete(uri).body(body)).await
	}

	/// Sends a multipart `POST` request; `Content-Type` is left to the transport.
	pub async fn post_form_data(&self, uri: &str, form: FormData) -> Result<Response> {
		self.send(ApiRequest::post(uri).form(form)).await
	}

	/// Sends a fully described request.
	///
	/// Unless the request (or the client) already carries `Authorization`, a bearer token is
	/// ensured first. Defaults fill only the headers nobody set. Non-2xx statuses are returned as
	/// regular responses; undecodable bodies yield an empty [`Response`].
	pub async fn send(&self, request: ApiRequest) -> Result<Response> {
		const KIND: CallKind = CallKind::Api;

		let ApiRequest { method, uri, query, headers, body } = request;

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = match self.resolve(&uri, &query) {
			Ok(url) => {
				let span = CallSpan::new(KIND, method.as_str(), url.host_str().unwrap_or_default());

				span.instrument(self.dispatch(method, url, headers, body)).await
			},
			Err(err) => Err(err),
		};

		match &result {
			Ok(response) if response.decode_outcome().is_degraded() =>
				obs::record_call_outcome(KIND, CallOutcome::Degraded),
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn dispatch(
		&self,
		method: Method,
		url: Url,
		call_headers: HeaderMap,
		body: RequestBody,
	) -> Result<Response> {
		let mut headers = self.headers.clone();

		// Call headers replace persistent ones name by name; repeated call values all survive.
		headers.extend(call_headers);

		let bearer = match headers.contains_key(names::AUTHORIZATION) {
			true => None,
			false => self.bearer_token().await?,
		};

		if let Some(value) = bearer.as_ref().and_then(TokenSecret::bearer_header) {
			headers.insert(names::AUTHORIZATION, value);
		}

		self.apply_default_headers(&mut headers, &body);

		let raw = self.transport.execute(OutboundRequest { method, url, headers, body }).await?;

		Ok(Response::from_raw(raw))
	}

	fn resolve(&self, uri: &str, query: &[(String, String)]) -> Result<Url> {
		let mut url = self.url(uri)?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		Ok(url)
	}

	pub(crate) fn apply_default_headers(&self, headers: &mut HeaderMap, body: &RequestBody) {
		if !body.is_form() {
			headers::insert_if_absent(
				headers,
				&names::CONTENT_TYPE,
				&HeaderValue::from_static(JSON_MIME),
			);
		}

		for (name, value) in &self.defaults {
			headers::insert_if_absent(headers, name, value);
		}
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a client backed by a reqwest transport honoring the configured timeouts.
	pub fn new(
		scheme: impl Into<String>,
		host: impl Into<String>,
		config: impl Into<Arc<Config>>,
		store: Arc<dyn TokenStore>,
	) -> Result<Self> {
		let config = config.into();

		config.validate()?;

		let transport = ReqwestTransport::from_config(&config)?;

		Self::with_transport(scheme, host, config, store, transport)
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			scheme: self.scheme.clone(),
			host: self.host.clone(),
			config: self.config.clone(),
			transport: self.transport.clone(),
			store: self.store.clone(),
			token_handler: self.token_handler.clone(),
			headers: self.headers.clone(),
			defaults: self.defaults.clone(),
			basic_credentials: self.basic_credentials.clone(),
			token_uri: self.token_uri.clone(),
			token_policy: self.token_policy,
			token_guard: self.token_guard.clone(),
		}
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("scheme", &self.scheme)
			.field("host", &self.host)
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("token_policy", &self.token_policy)
			.field("token_handler_set", &self.token_handler.is_some())
			.finish()
	}
}

fn default_headers(config: &Config) -> Result<HeaderMap, ConfigError> {
	let mut defaults = HeaderMap::new();
	let mut set = |name: HeaderName, value: &str| {
		let value = HeaderValue::from_str(value)
			.map_err(|_| ConfigError::InvalidHeader { name: name.to_string() })?;

		defaults.insert(name, value);

		Ok::<_, ConfigError>(())
	};

	set(names::ACCEPT, JSON_MIME)?;
	set(names::USER_AGENT, config.get_str_or(config::USER_AGENT, DEFAULT_USER_AGENT))?;

	for (name, key) in [
		(names::APP_NAME, config::APP_NAME),
		(names::APP_VERSION, config::APP_VERSION),
		(names::APP_PLATFORM, config::APP_PLATFORM),
		(names::OS_PLATFORM_VERSION, config::OS_PLATFORM_VERSION),
	] {
		if config.has(key) {
			set(name, config.get_str_or(key, ""))?;
		}
	}

	Ok(defaults)
}
