//! Target URL composition.

/// Scheme used when neither `scheme` nor `host` names one.
pub const DEFAULT_SCHEME: &str = "https://";

/// Joins `scheme`, `host`, and `uri` into an absolute URL string.
///
/// The scheme may be given with or without its `://` suffix. Repeated `/` in the path portion
/// collapse into one, so a leading separator on `uri` (or a trailing one on `host`) never
/// produces a doubled or missing separator. Query strings and fragments are left untouched.
pub fn build_url(scheme: &str, host: &str, uri: &str) -> String {
	let (scheme, host) = match normalize_scheme(scheme) {
		Some(scheme) => (scheme, host),
		None => match host.split_once("://") {
			Some((embedded, rest)) if !embedded.is_empty() => (format!("{embedded}://"), rest),
			_ => (DEFAULT_SCHEME.to_owned(), host),
		},
	};

	format!("{scheme}{}", normalize_path(&format!("{host}/{uri}")))
}

/// Collapses repeated `/` before the first `?` or `#`; idempotent.
pub fn normalize_path(raw: &str) -> String {
	let split = raw.find(['?', '#']).unwrap_or(raw.len());
	let (path, tail) = raw.split_at(split);
	let mut out = String::with_capacity(raw.len());
	let mut previous_slash = false;

	for c in path.chars() {
		if c == '/' && previous_slash {
			continue;
		}

		previous_slash = c == '/';
		out.push(c);
	}

	out.push_str(tail);

	out
}

fn normalize_scheme(scheme: &str) -> Option<String> {
	let bare = scheme.trim().trim_end_matches('/').trim_end_matches(':');

	(!bare.is_empty()).then(|| format!("{bare}://"))
}
