pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classified failure of a single log search attempt.
///
/// The `Display` text is safe to show to callers. Status codes and response bodies are kept for
/// logging only.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Authentication failed. Check the configured API key and application key.")]
	Authentication { status: u16, body: String },
	#[error("Permission denied. The application key is missing the logs read scope.")]
	Permission { status: u16, body: String },
	#[error("Rate limited by the log search service.")]
	RateLimited { status: u16, body: String },
	#[error("Log search request timed out.")]
	Timeout { status: Option<u16> },
	#[error("Log search service error (status {status}).")]
	UpstreamServer { status: u16, body: String },
	#[error("Log search request was rejected (status {status}).")]
	Request { status: u16, body: String },
	#[error("Log search response is malformed: {message}")]
	MalformedResponse { message: String },
	#[error("Log search transport failed.")]
	Transport(#[source] reqwest::Error),
	#[error("Failed to encode log search request.")]
	Encode(#[from] serde_json::Error),
	#[error("{message}")]
	InvalidConfig { message: String },
}
impl Error {
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Authentication { status, .. }
			| Self::Permission { status, .. }
			| Self::RateLimited { status, .. }
			| Self::UpstreamServer { status, .. }
			| Self::Request { status, .. } => Some(*status),
			Self::Timeout { status } => *status,
			Self::Transport(err) => err.status().map(|status| status.as_u16()),
			_ => None,
		}
	}

	pub fn response_body(&self) -> Option<&str> {
		match self {
			Self::Authentication { body, .. }
			| Self::Permission { body, .. }
			| Self::RateLimited { body, .. }
			| Self::UpstreamServer { body, .. }
			| Self::Request { body, .. } => Some(body.as_str()),
			_ => None,
		}
	}

	pub fn is_rate_limited(&self) -> bool {
		matches!(self, Self::RateLimited { .. })
	}
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			Self::Timeout { status: None }
		} else if err.is_decode() {
			Self::MalformedResponse { message: err.to_string() }
		} else {
			Self::Transport(err)
		}
	}
}
impl From<reqwest::header::InvalidHeaderName> for Error {
	fn from(err: reqwest::header::InvalidHeaderName) -> Self {
		Self::InvalidConfig { message: format!("Invalid header name: {err}.") }
	}
}
impl From<reqwest::header::InvalidHeaderValue> for Error {
	fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
		Self::InvalidConfig { message: format!("Invalid header value: {err}.") }
	}
}
