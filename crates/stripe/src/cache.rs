//! Caches shared by the aggregator, the coordinate mapper and the repaint
//! handler.
//!
//! All of them sit behind one mutex so that clearing and rebuilding never
//! interleave inconsistently.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;
use xeno_marks::{Mark, MarkId};

use crate::coords::CoordinateCache;

/// Deduplicated set of every current mark, keyed by identity.
pub type MergedMarks = FxHashMap<MarkId, Arc<Mark>>;

/// Sorted `line -> marks` index over every line any mark spans.
pub type LineIndex = BTreeMap<usize, Vec<Arc<Mark>>>;

/// Everything guarded by the stripe's cache mutex.
#[derive(Debug, Default)]
pub struct StripeCaches {
	pub(crate) marks: MarkCache,
	pub(crate) coords: CoordinateCache,
}

/// Handle to the shared caches.
pub type SharedCaches = Arc<Mutex<StripeCaches>>;

/// Lazily built merged set and line index.
///
/// `index` is only ever present together with `merged` and always reflects it
/// exactly. `owners` counts how many sources publish each merged id, so a mark
/// shared by several sources survives until the last of them drops it. `epoch`
/// advances on every change so that a merged set gathered outside the lock is
/// never installed over a newer notification.
#[derive(Debug, Default)]
pub(crate) struct MarkCache {
	merged: Option<MergedMarks>,
	owners: FxHashMap<MarkId, u32>,
	index: Option<LineIndex>,
	epoch: u64,
}

/// A merged set gathered outside the cache lock, with per-id owner counts.
#[derive(Debug, Default)]
pub(crate) struct Gathered {
	marks: MergedMarks,
	owners: FxHashMap<MarkId, u32>,
}

impl Gathered {
	pub(crate) fn into_marks(self) -> MergedMarks {
		self.marks
	}
}

impl MarkCache {
	pub(crate) fn epoch(&self) -> u64 {
		self.epoch
	}

	pub(crate) fn merged(&self) -> Option<&MergedMarks> {
		self.merged.as_ref()
	}

	pub(crate) fn is_built(&self) -> bool {
		self.merged.is_some()
	}

	/// Drops both structures back to "not built".
	pub(crate) fn invalidate(&mut self) {
		self.merged = None;
		self.owners.clear();
		self.index = None;
		self.epoch += 1;
	}

	/// Installs a set gathered at `epoch`.
	///
	/// Returns the installed (or concurrently installed) set, or hands the
	/// gathered set back when a change arrived in the meantime.
	pub(crate) fn try_install(
		&mut self,
		epoch: u64,
		gathered: Gathered,
	) -> Result<&MergedMarks, Gathered> {
		if epoch != self.epoch {
			return Err(gathered);
		}
		if self.merged.is_none() {
			self.owners = gathered.owners;
			self.merged = Some(gathered.marks);
		}
		Ok(self.merged.get_or_insert_with(MergedMarks::default))
	}

	/// The line index, built from the merged set on first use.
	pub(crate) fn index(&mut self) -> Option<&LineIndex> {
		let merged = self.merged.as_ref()?;
		Some(self.index.get_or_insert_with(|| build_index(merged)))
	}

	/// Applies the difference between two snapshots of one source in place.
	///
	/// Identity decides membership. A dropped id leaves the merged set only
	/// when no other source still publishes it. A mark whose id survives but
	/// whose instance was replaced is re-indexed.
	pub(crate) fn patch(&mut self, old: &[Arc<Mark>], new: &[Arc<Mark>]) {
		self.epoch += 1;
		let Self {
			merged,
			owners,
			index,
			..
		} = self;
		let Some(merged) = merged.as_mut() else {
			return;
		};

		let old_by_id: FxHashMap<MarkId, &Arc<Mark>> = old.iter().map(|m| (m.id, m)).collect();
		let new_by_id: FxHashMap<MarkId, &Arc<Mark>> = new.iter().map(|m| (m.id, m)).collect();

		let mut released = Vec::new();
		let mut replaced = Vec::new();
		for (id, mark) in &old_by_id {
			match new_by_id.get(id) {
				None => released.push(*id),
				Some(replacement) if !Arc::ptr_eq(replacement, mark) => replaced.push(*replacement),
				Some(_) => {}
			}
		}
		let acquired: Vec<&Arc<Mark>> = new_by_id
			.iter()
			.filter(|(id, _)| !old_by_id.contains_key(id))
			.map(|(_, mark)| *mark)
			.collect();

		trace!(
			released = released.len(),
			acquired = acquired.len(),
			replaced = replaced.len(),
			"Patching mark cache"
		);

		for id in released {
			if release(owners, id)
				&& let Some(stored) = merged.remove(&id)
				&& let Some(index) = index.as_mut()
			{
				unindex(index, &stored);
			}
		}
		for mark in acquired {
			*owners.entry(mark.id).or_default() += 1;
			if !merged.contains_key(&mark.id) {
				merged.insert(mark.id, Arc::clone(mark));
				if let Some(index) = index.as_mut() {
					insert_into_index(index, mark);
				}
			}
		}
		for mark in replaced {
			let previous = merged.insert(mark.id, Arc::clone(mark));
			if let Some(index) = index.as_mut() {
				if let Some(previous) = previous {
					unindex(index, &previous);
				}
				insert_into_index(index, mark);
			}
		}
	}
}

/// Drops one owner of `id`. Returns true when none is left.
fn release(owners: &mut FxHashMap<MarkId, u32>, id: MarkId) -> bool {
	match owners.get_mut(&id) {
		Some(count) if *count > 1 => {
			*count -= 1;
			false
		}
		_ => {
			owners.remove(&id);
			true
		}
	}
}

/// Merges per-source snapshots, counting each source once per id.
pub(crate) fn merge<S>(sources: impl IntoIterator<Item = S>) -> Gathered
where
	S: IntoIterator<Item = Arc<Mark>>,
{
	let mut gathered = Gathered::default();
	for source in sources {
		let mut seen = FxHashSet::default();
		for mark in source {
			if seen.insert(mark.id) {
				*gathered.owners.entry(mark.id).or_default() += 1;
			}
			gathered.marks.insert(mark.id, mark);
		}
	}
	gathered
}

/// Builds a line index from a merged set.
pub(crate) fn build_index(merged: &MergedMarks) -> LineIndex {
	let mut index = LineIndex::new();
	for mark in merged.values() {
		insert_into_index(&mut index, mark);
	}
	index
}

fn insert_into_index(index: &mut LineIndex, mark: &Arc<Mark>) {
	for line in mark.span.lines() {
		index.entry(line).or_default().push(Arc::clone(mark));
	}
}

fn unindex(index: &mut LineIndex, mark: &Mark) {
	for line in mark.span.lines() {
		if let Some(marks) = index.get_mut(&line) {
			marks.retain(|m| m.id != mark.id);
			if marks.is_empty() {
				index.remove(&line);
			}
		}
	}
}
