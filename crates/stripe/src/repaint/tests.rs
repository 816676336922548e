use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::sleep;

use super::*;

const QUIET: Duration = Duration::from_millis(50);

#[derive(Default)]
struct Recorder {
	fired: Mutex<Vec<RepaintFlags>>,
}

impl RepaintHandler for Recorder {
	fn repaint(&self, flags: RepaintFlags) {
		self.fired.lock().push(flags);
	}
}

fn scheduler() -> (RepaintScheduler, Arc<Recorder>) {
	let recorder = Arc::new(Recorder::default());
	let scheduler = RepaintScheduler::spawn(&Handle::current(), QUIET, recorder.clone());
	(scheduler, recorder)
}

#[tokio::test(start_paused = true)]
async fn burst_coalesces_into_one_repaint() {
	let (scheduler, recorder) = scheduler();

	scheduler.request(RepaintFlags::MARKS);
	for _ in 0..10 {
		scheduler.request(RepaintFlags::empty());
		sleep(QUIET / 10).await;
	}
	scheduler.request(RepaintFlags::COORDINATES);
	assert!(recorder.fired.lock().is_empty());
	assert!(scheduler.is_armed());

	sleep(QUIET * 2).await;

	assert_eq!(
		*recorder.fired.lock(),
		vec![RepaintFlags::MARKS | RepaintFlags::COORDINATES]
	);
	assert_eq!(scheduler.state(), SchedulerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn request_while_armed_restarts_quiet_window() {
	let (scheduler, recorder) = scheduler();

	scheduler.request(RepaintFlags::MARKS);
	sleep(QUIET * 3 / 4).await;
	scheduler.request(RepaintFlags::empty());
	sleep(QUIET * 3 / 4).await;
	assert!(recorder.fired.lock().is_empty());

	sleep(QUIET / 2).await;
	assert_eq!(*recorder.fired.lock(), vec![RepaintFlags::MARKS]);
}

#[tokio::test(start_paused = true)]
async fn separate_bursts_fire_separately() {
	let (scheduler, recorder) = scheduler();

	scheduler.request(RepaintFlags::MARKS);
	sleep(QUIET * 2).await;
	scheduler.request(RepaintFlags::COORDINATES);
	sleep(QUIET * 2).await;

	assert_eq!(
		*recorder.fired.lock(),
		vec![RepaintFlags::MARKS, RepaintFlags::COORDINATES]
	);
}

#[tokio::test(start_paused = true)]
async fn flags_reset_after_firing() {
	let (scheduler, recorder) = scheduler();

	scheduler.request(RepaintFlags::all());
	sleep(QUIET * 2).await;
	scheduler.request(RepaintFlags::empty());
	sleep(QUIET * 2).await;

	assert_eq!(
		*recorder.fired.lock(),
		vec![RepaintFlags::all(), RepaintFlags::empty()]
	);
}

#[tokio::test(start_paused = true)]
async fn idle_scheduler_never_fires() {
	let (scheduler, recorder) = scheduler();

	sleep(QUIET * 10).await;

	assert!(recorder.fired.lock().is_empty());
	assert!(!scheduler.is_armed());
}
