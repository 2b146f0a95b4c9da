use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Fixed-capacity permit pool bounding concurrent upstream calls.
///
/// Clones share the same pool, so one gate can be handed to every path that talks to the
/// upstream service.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
	semaphore: Arc<Semaphore>,
	capacity: usize,
}
impl ConcurrencyGate {
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);

		Self { semaphore: Arc::new(Semaphore::new(capacity)), capacity }
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn available(&self) -> usize {
		self.semaphore.available_permits()
	}

	/// Waits for a free permit. Cancellation wins over a permit that becomes free at the same
	/// time.
	pub async fn acquire(&self, cancel: &CancellationToken) -> Result<GatePermit> {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(Error::Cancelled),
			permit = self.semaphore.clone().acquire_owned() => permit
				.map(|permit| GatePermit { _permit: permit })
				.map_err(|_| Error::Upstream { message: "Concurrency gate is closed.".to_string() }),
		}
	}
}

/// Held for one fetch, retries included. Dropping it returns the permit.
#[derive(Debug)]
pub struct GatePermit {
	_permit: OwnedSemaphorePermit,
}
impl GatePermit {
	pub fn release(self) {}
}
