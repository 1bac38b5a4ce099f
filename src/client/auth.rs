//! Bearer token acquisition with store caching + singleflight guard.
//!
//! Before each call the client looks for a cached token under the configured store key. On a
//! miss it performs a client-credentials request against the token endpoint, caches the bearer
//! for `expire_in` minus the configured safety margin, and hands the full payload to the optional
//! [`TokenHandler`](crate::token::TokenHandler). A guard serializes grants per client so
//! concurrent callers piggy-back on the same token instead of stampeding the endpoint.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	client::Client,
	config::{Config, TokenFailurePolicy},
	error::{ConfigError, TokenError},
	http::{HttpTransport, OutboundRequest, RequestBody, headers::names},
	obs::{self, CallKind, CallOutcome, CallSpan},
	token::{EXPIRE_IN, MAX_EXPIRE_IN, Token, TokenSecret},
};

/// Result of ensuring a bearer token before a call.
#[derive(Debug)]
pub enum TokenOutcome {
	/// A live token was found in the store.
	Cached(TokenSecret),
	/// A token was issued by the token endpoint.
	Issued {
		/// Bearer token attached to the call.
		secret: TokenSecret,
		/// Lifetime the token was cached for; `None` when `expire_in` did not exceed the margin.
		ttl: Option<Duration>,
		/// Full payload returned by the token endpoint.
		token: Token,
	},
	/// No token could be obtained.
	Unavailable(TokenError),
}
impl TokenOutcome {
	/// Bearer token to attach, if any.
	pub fn secret(&self) -> Option<&TokenSecret> {
		match self {
			Self::Cached(secret) | Self::Issued { secret, .. } => Some(secret),
			Self::Unavailable(_) => None,
		}
	}
}

#[derive(Deserialize)]
struct TokenEnvelope {
	data: Map<String, Value>,
}

struct IssuedToken {
	secret: TokenSecret,
	expire_in: Duration,
	token: Token,
}

impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Returns a cached bearer token or requests a new one from the token endpoint.
	///
	/// Only store failures are returned as errors; token endpoint problems surface as
	/// [`TokenOutcome::Unavailable`].
	pub async fn ensure_token(&self) -> Result<TokenOutcome> {
		let key = self.config.token_store_key();

		if let Some(secret) = self.cached_token(key).await? {
			return Ok(TokenOutcome::Cached(secret));
		}

		let _singleflight = self.token_guard.lock().await;

		if let Some(secret) = self.cached_token(key).await? {
			return Ok(TokenOutcome::Cached(secret));
		}

		self.request_token(key).await
	}

	/// Drops the cached token so the next call requests a fresh one.
	pub async fn forget_token(&self) -> Result<()> {
		let key = self.config.token_store_key();

		self.store.remove(key).await?;
		self.store.remove(&expiry_key(key)).await?;

		Ok(())
	}

	pub(crate) async fn bearer_token(&self) -> Result<Option<TokenSecret>> {
		match self.ensure_token().await? {
			TokenOutcome::Cached(secret) | TokenOutcome::Issued { secret, .. } => Ok(Some(secret)),
			TokenOutcome::Unavailable(err) => match self.token_policy {
				TokenFailurePolicy::Degrade => {
					obs::warn_degraded(CallKind::TokenGrant, &err);
					obs::record_call_outcome(CallKind::TokenGrant, CallOutcome::Degraded);

					Ok(None)
				},
				TokenFailurePolicy::Fail => Err(err.into()),
			},
		}
	}

	async fn cached_token(&self, key: &str) -> Result<Option<TokenSecret>> {
		let cached = self.store.get(key).await?;

		// Values that cannot travel as a header count as a miss.
		Ok(cached
			.map(TokenSecret::new)
			.filter(|secret| !secret.is_empty() && secret.bearer_header().is_some()))
	}

	async fn request_token(&self, key: &str) -> Result<TokenOutcome> {
		const KIND: CallKind = CallKind::TokenGrant;

		let target = self.token_uri.host_str().unwrap_or_default();
		let span = CallSpan::new(KIND, "client_credentials", target);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let issued = match span.instrument(self.exchange_client_credentials()).await {
			Ok(issued) => issued,
			Err(err) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);

				return Ok(TokenOutcome::Unavailable(err));
			},
		};
		let ttl = issued.expire_in - self.config.token_expiry_margin();
		let ttl = ttl.is_positive().then_some(ttl);
		let cached = match ttl {
			Some(ttl) => self.cache_token(key, &issued, ttl).await,
			None => Ok(()),
		};

		if let Err(err) = cached {
			obs::record_call_outcome(KIND, CallOutcome::Failure);

			return Err(err);
		}

		// The bearer is already usable; a handler that cannot keep the payload only degrades.
		let kept = match &self.token_handler {
			Some(handler) => handler.keep_token(issued.token.clone()).await,
			None => Ok(()),
		};
		let outcome = match kept {
			Ok(()) => CallOutcome::Success,
			Err(err) => {
				obs::warn_degraded(KIND, &err);

				CallOutcome::Degraded
			},
		};

		obs::record_call_outcome(KIND, outcome);

		Ok(TokenOutcome::Issued { secret: issued.secret, ttl, token: issued.token })
	}

	async fn cache_token(&self, key: &str, issued: &IssuedToken, ttl: Duration) -> Result<()> {
		self.store.set(key, issued.secret.expose().to_owned(), ttl).await?;
		self.store
			.set(&expiry_key(key), issued.expire_in.whole_milliseconds().to_string(), ttl)
			.await?;

		Ok(())
	}

	async fn exchange_client_credentials(&self) -> Result<IssuedToken, TokenError> {
		let body = RequestBody::Json(json!({ "grant_type": "client_credentials" }));
		let mut headers = HeaderMap::new();

		headers.insert(names::AUTHORIZATION, self.basic_credentials.clone());
		self.apply_default_headers(&mut headers, &body);

		let raw = self
			.transport
			.execute(OutboundRequest {
				method: Method::POST,
				url: self.token_uri.clone(),
				headers,
				body,
			})
			.await
			.map_err(TokenError::Transport)?;

		if !raw.is_success() {
			return Err(TokenError::Status { status: raw.status });
		}

		let mut deserializer = serde_json::Deserializer::from_str(&raw.body);
		let envelope: TokenEnvelope = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TokenError::Malformed { source })?;
		let token = Token::new(envelope.data);
		let bearer = match token.token_param_name() {
			"" => token.str_field(self.config.token_param_name()),
			_ => token.authorization_bearer_token(),
		};

		if bearer.is_empty() {
			let field = match token.token_param_name() {
				"" => self.config.token_param_name(),
				named => named,
			};

			return Err(TokenError::MissingBearer { field: field.to_owned() });
		}

		let secret = TokenSecret::new(bearer);

		if secret.bearer_header().is_none() {
			return Err(TokenError::InvalidBearer);
		}

		let expire_in = token
			.as_map()
			.get(EXPIRE_IN)
			.and_then(Value::as_i64)
			.ok_or(TokenError::MissingExpiry)?;

		if expire_in <= 0 {
			return Err(TokenError::NonPositiveExpiry);
		}

		let lifetime = Duration::milliseconds(expire_in);

		if lifetime > MAX_EXPIRE_IN {
			return Err(TokenError::ExpiryOutOfRange { expire_in });
		}

		Ok(IssuedToken { secret, expire_in: lifetime, token })
	}
}

/// Sensitive `Basic` header value built from the configured client credentials.
pub(crate) fn basic_credentials(config: &Config) -> Result<HeaderValue, ConfigError> {
	let encoded = STANDARD.encode(format!("{}:{}", config.client_id(), config.client_secret()));
	let mut value = HeaderValue::try_from(format!("Basic {encoded}"))
		.map_err(|_| ConfigError::InvalidHeader { name: names::AUTHORIZATION.to_string() })?;

	value.set_sensitive(true);

	Ok(value)
}

/// Store key holding the raw `expire_in` of the cached token.
pub fn expiry_key(key: &str) -> String {
	format!("{key}_expire_in")
}
