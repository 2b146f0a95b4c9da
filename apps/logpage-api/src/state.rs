use std::sync::Arc;

use logpage_service::LogService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LogService>,
}
impl AppState {
	pub fn new(config: logpage_config::Config) -> color_eyre::Result<Self> {
		let service = LogService::new(config)?;

		Ok(Self::with_service(service))
	}

	pub fn with_service(service: LogService) -> Self {
		Self { service: Arc::new(service) }
	}
}
