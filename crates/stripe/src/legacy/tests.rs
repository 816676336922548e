use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use xeno_marks::Status;

use super::*;

/// Well-behaved store backed by a sorted map.
#[derive(Default)]
struct MapStore {
	lines: BTreeMap<usize, (Option<LegacyAnnotation>, Vec<LegacyAnnotation>)>,
}

impl MapStore {
	fn with(mut self, annotation: LegacyAnnotation) -> Self {
		let entry = self.lines.entry(annotation.line).or_default();
		if annotation.active {
			entry.0 = Some(annotation);
		} else {
			entry.1.push(annotation);
		}
		self
	}
}

impl AnnotationStore for MapStore {
	fn active_annotation(&self, line: usize) -> Option<LegacyAnnotation> {
		self.lines.get(&line).and_then(|(active, _)| active.clone())
	}

	fn passive_annotations(&self, line: usize) -> Vec<LegacyAnnotation> {
		self.lines.get(&line).map(|(_, passive)| passive.clone()).unwrap_or_default()
	}

	fn next_line_with_annotation(&self, line: usize) -> Option<usize> {
		self.lines.range(line..).next().map(|(l, _)| *l)
	}
}

/// Store that always answers with the same line.
struct StuckStore {
	line: usize,
	calls: AtomicUsize,
}

impl AnnotationStore for StuckStore {
	fn active_annotation(&self, line: usize) -> Option<LegacyAnnotation> {
		Some(LegacyAnnotation::new(line, Status::Warning))
	}

	fn passive_annotations(&self, _line: usize) -> Vec<LegacyAnnotation> {
		Vec::new()
	}

	fn next_line_with_annotation(&self, _line: usize) -> Option<usize> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Some(self.line)
	}
}

/// Store whose answers go backwards after the first one.
struct BackwardsStore {
	answers: parking_lot::Mutex<Vec<usize>>,
}

impl AnnotationStore for BackwardsStore {
	fn active_annotation(&self, line: usize) -> Option<LegacyAnnotation> {
		Some(LegacyAnnotation::new(line, Status::Error))
	}

	fn passive_annotations(&self, _line: usize) -> Vec<LegacyAnnotation> {
		Vec::new()
	}

	fn next_line_with_annotation(&self, _line: usize) -> Option<usize> {
		self.answers.lock().pop()
	}
}

#[test]
fn yields_active_then_passive_in_line_order() {
	let store = MapStore::default()
		.with(LegacyAnnotation::new(7, Status::Ok))
		.with(LegacyAnnotation::new(2, Status::Warning).passive())
		.with(LegacyAnnotation::new(2, Status::Error));

	let scan = LegacyScan::new(&store, 0, 10, 100);
	let seen: Vec<_> = scan.iter().map(|a| (a.line, a.status, a.active)).collect();

	assert_eq!(
		seen,
		vec![
			(2, Status::Error, true),
			(2, Status::Warning, false),
			(7, Status::Ok, true),
		]
	);
}

#[test]
fn respects_range_bounds() {
	let store = MapStore::default()
		.with(LegacyAnnotation::new(1, Status::Error))
		.with(LegacyAnnotation::new(5, Status::Error))
		.with(LegacyAnnotation::new(9, Status::Error));

	let lines: Vec<_> = LegacyScan::new(&store, 2, 8, 100).iter().map(|a| a.line).collect();
	assert_eq!(lines, vec![5]);
	assert_eq!(LegacyScan::new(&store, 6, 2, 100).iter().count(), 0);
}

#[test]
fn scan_is_restartable() {
	let store = MapStore::default()
		.with(LegacyAnnotation::new(3, Status::Error))
		.with(LegacyAnnotation::new(4, Status::Warning));

	let scan = LegacyScan::all(&store, 100);
	let first: Vec<_> = scan.iter().collect();
	let second: Vec<_> = (&scan).into_iter().collect();
	assert_eq!(first, second);
	assert_eq!(first.len(), 2);
}

#[test]
fn stuck_store_aborts_instead_of_looping() {
	let store = StuckStore {
		line: 3,
		calls: AtomicUsize::new(0),
	};

	let seen: Vec<_> = LegacyScan::new(&store, 0, 1000, 100).iter().collect();

	assert_eq!(seen.len(), 1);
	assert_eq!(seen[0].line, 3);
	// One accepted answer, then at most `limit + 1` stalled ones.
	assert!(store.calls.load(Ordering::SeqCst) <= 102);
}

#[test]
fn backwards_store_aborts() {
	// Popped from the back: 5, then 2.
	let store = BackwardsStore {
		answers: parking_lot::Mutex::new(vec![8, 2, 5]),
	};

	let lines: Vec<_> = LegacyScan::new(&store, 0, 100, 100).iter().map(|a| a.line).collect();
	assert_eq!(lines, vec![5]);
}

#[test]
fn most_important_skips_none_and_ranks() {
	let store = MapStore::default()
		.with(LegacyAnnotation::new(1, Status::None).with_priority(-10))
		.with(LegacyAnnotation::new(2, Status::Warning).with_priority(3))
		.with(LegacyAnnotation::new(3, Status::Warning).with_priority(1))
		.with(LegacyAnnotation::new(4, Status::Ok));

	let best = LegacyScan::all(&store, 100).most_important().unwrap();
	assert_eq!((best.line, best.status, best.priority), (3, Status::Warning, 1));

	let none_only = MapStore::default().with(LegacyAnnotation::new(1, Status::None));
	assert!(LegacyScan::all(&none_only, 100).most_important().is_none());
}

#[test]
fn first_line_reports_next_annotated_line() {
	let store = MapStore::default()
		.with(LegacyAnnotation::new(4, Status::Ok))
		.with(LegacyAnnotation::new(12, Status::Ok));

	assert_eq!(LegacyScan::all(&store, 100).first_line(), Some(4));
	assert_eq!(LegacyScan::new(&store, 5, usize::MAX, 100).first_line(), Some(12));
	assert_eq!(LegacyScan::new(&store, 13, usize::MAX, 100).first_line(), None);
}
