//! Debounced repaint scheduling.
//!
//! Bursts of invalidation signals are coalesced into a single redraw. The
//! first signal arms the scheduler; every further signal ORs its flags into
//! the pending set and pushes the deadline out by one quiet period. When the
//! deadline passes without a new signal, the flags are taken and reset under
//! the lock and the handler runs exactly once.
//!
//! ```text
//! Idle --request--> Armed --request--> Armed (deadline restarted)
//!                   Armed --quiet period elapsed--> Idle (handler fires)
//! ```
//!
//! There is no way to cancel a pending repaint; dropping the last
//! [`RepaintScheduler`] handle stops the timer task on teardown.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

bitflags::bitflags! {
	/// Caches to clear before the next redraw.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct RepaintFlags: u8 {
		/// Drop the merged mark set and line index.
		const MARKS = 1 << 0;
		/// Drop the line-to-pixel cache.
		const COORDINATES = 1 << 1;
	}
}

/// Something that accepts repaint requests.
pub trait RepaintTrigger: Send + Sync {
	/// Requests a repaint, clearing the caches named by `flags` first.
	fn request(&self, flags: RepaintFlags);
}

/// Receives the coalesced repaint once the quiet period has elapsed.
pub trait RepaintHandler: Send + Sync + 'static {
	/// Clears the caches named by `flags` and enqueues one redraw.
	fn repaint(&self, flags: RepaintFlags);
}

/// Scheduler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
	/// Nothing pending.
	Idle,
	/// A repaint fires at `deadline` unless pushed out by another request.
	Armed {
		/// When the pending repaint fires.
		deadline: Instant,
		/// Accumulated flags.
		flags: RepaintFlags,
	},
}

struct Shared {
	state: Mutex<SchedulerState>,
	wake: Notify,
	quiet: Duration,
}

struct Owner {
	shared: Arc<Shared>,
	cancel: CancellationToken,
}

impl Drop for Owner {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

/// Handle to a per-view debounce timer.
///
/// Clones share the same timer task.
#[derive(Clone)]
pub struct RepaintScheduler {
	owner: Arc<Owner>,
}

impl RepaintScheduler {
	/// Spawns the timer task on `runtime`.
	pub fn spawn(runtime: &Handle, quiet: Duration, handler: Arc<dyn RepaintHandler>) -> Self {
		let shared = Arc::new(Shared {
			state: Mutex::new(SchedulerState::Idle),
			wake: Notify::new(),
			quiet,
		});
		let cancel = CancellationToken::new();
		runtime.spawn(run(Arc::clone(&shared), handler, cancel.clone()));
		Self {
			owner: Arc::new(Owner { shared, cancel }),
		}
	}

	/// Current state.
	pub fn state(&self) -> SchedulerState {
		*self.owner.shared.state.lock()
	}

	/// Returns true while a repaint is pending.
	pub fn is_armed(&self) -> bool {
		matches!(self.state(), SchedulerState::Armed { .. })
	}
}

impl RepaintTrigger for RepaintScheduler {
	fn request(&self, flags: RepaintFlags) {
		let shared = &self.owner.shared;
		let deadline = Instant::now() + shared.quiet;
		{
			let mut state = shared.state.lock();
			*state = match *state {
				SchedulerState::Idle => SchedulerState::Armed { deadline, flags },
				SchedulerState::Armed { flags: pending, .. } => SchedulerState::Armed {
					deadline,
					flags: pending | flags,
				},
			};
		}
		shared.wake.notify_one();
	}
}

/// Timer task: sleeps until the current deadline and fires if it still holds.
async fn run(shared: Arc<Shared>, handler: Arc<dyn RepaintHandler>, cancel: CancellationToken) {
	loop {
		let deadline = match *shared.state.lock() {
			SchedulerState::Idle => None,
			SchedulerState::Armed { deadline, .. } => Some(deadline),
		};

		let Some(deadline) = deadline else {
			tokio::select! {
				_ = cancel.cancelled() => return,
				_ = shared.wake.notified() => continue,
			}
		};

		tokio::select! {
			_ = cancel.cancelled() => return,
			_ = tokio::time::sleep_until(deadline) => {}
		}

		let fired = {
			let mut state = shared.state.lock();
			match *state {
				SchedulerState::Armed { deadline: current, flags } if current <= Instant::now() => {
					*state = SchedulerState::Idle;
					Some(flags)
				}
				_ => None,
			}
		};

		if let Some(flags) = fired {
			trace!(?flags, "Repaint quiet period elapsed");
			handler.repaint(flags);
		}
	}
}

#[cfg(test)]
mod tests;
