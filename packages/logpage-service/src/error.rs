pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("{message}")]
	Authentication { message: String },
	#[error("{message}")]
	Permission { message: String },
	#[error("{message}")]
	RateLimited { message: String },
	#[error("Rate limit exceeded after {retries} retries.")]
	RateLimitExceeded { retries: u32 },
	#[error("{message}")]
	Timeout { message: String },
	#[error("Log search was cancelled.")]
	Cancelled,
	#[error("{message}")]
	UpstreamServer { status: u16, message: String },
	#[error("{message}")]
	MalformedResponse { message: String },
	#[error("Upstream error: {message}")]
	Upstream { message: String },
	#[error("Configuration error: {message}")]
	Config { message: String },
}
impl Error {
	pub fn is_rate_limit(&self) -> bool {
		matches!(self, Self::RateLimited { .. } | Self::RateLimitExceeded { .. })
	}
}
impl From<logpage_providers::Error> for Error {
	fn from(err: logpage_providers::Error) -> Self {
		use logpage_providers::Error as ProviderError;

		let message = err.to_string();

		match err {
			ProviderError::Authentication { .. } => Self::Authentication { message },
			ProviderError::Permission { .. } => Self::Permission { message },
			ProviderError::RateLimited { .. } => Self::RateLimited { message },
			ProviderError::Timeout { .. } => Self::Timeout { message },
			ProviderError::UpstreamServer { status, .. } => Self::UpstreamServer { status, message },
			ProviderError::MalformedResponse { .. } => Self::MalformedResponse { message },
			ProviderError::InvalidConfig { .. } | ProviderError::Encode(_) =>
				Self::Config { message },
			ProviderError::Request { .. } | ProviderError::Transport(_) => Self::Upstream { message },
		}
	}
}
