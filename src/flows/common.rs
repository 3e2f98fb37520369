//! Shared helpers for flow implementations.

// crates.io
use async_lock::MutexGuard;
// self
use crate::{
	_prelude::*, auth::UserId, flows::Broker, http::TokenHttpClient, oauth::TransportErrorMapper,
};

pub(crate) type GuardMap = Arc<Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>>;

/// Per-user single-flight handle; the map entry is dropped once no other flow holds it.
pub(crate) struct UserFlowGuard {
	guards: GuardMap,
	user: UserId,
	lock: Arc<AsyncMutex<()>>,
}
impl UserFlowGuard {
	pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
		self.lock.lock().await
	}
}
impl Drop for UserFlowGuard {
	fn drop(&mut self) {
		let mut guards = self.guards.lock();

		// Clones only happen under the map lock, so two owners means the map and this handle.
		if Arc::strong_count(&self.lock) == 2
			&& guards.get(&self.user).is_some_and(|entry| Arc::ptr_eq(entry, &self.lock))
		{
			guards.remove(&self.user);
		}
	}
}

/// Returns (and creates on demand) the single-flight guard for a user.
pub(crate) fn flow_guard<C, M>(broker: &Broker<C, M>, user: &UserId) -> UserFlowGuard
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let lock = broker
		.flow_guards
		.lock()
		.entry(user.clone())
		.or_insert_with(|| Arc::new(AsyncMutex::new(())))
		.clone();

	UserFlowGuard { guards: broker.flow_guards.clone(), user: user.clone(), lock }
}
