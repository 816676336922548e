use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use super::*;
use crate::cache::StripeCaches;

const CHARS_PER_LINE: usize = 10;

/// Uniform-height lines, `CHARS_PER_LINE` characters each.
struct Grid {
	lines: usize,
	line_height: u32,
	viewport: u32,
	/// Lines the view refuses to place.
	hidden: Vec<usize>,
}

impl Grid {
	fn new(lines: usize, line_height: u32, viewport: u32) -> Self {
		Self {
			lines,
			line_height,
			viewport,
			hidden: Vec::new(),
		}
	}
}

impl DocumentGeometry for Grid {
	fn line_count(&self) -> usize {
		self.lines
	}

	fn viewport_height(&self) -> u32 {
		self.viewport
	}

	fn content_height(&self) -> u32 {
		self.lines as u32 * self.line_height
	}

	fn line_start_offset(&self, line: usize) -> Option<usize> {
		(line < self.lines).then_some(line * CHARS_PER_LINE)
	}

	fn offset_to_line(&self, offset: usize) -> Option<usize> {
		let line = offset / CHARS_PER_LINE;
		(line < self.lines).then_some(line)
	}

	fn offset_to_y(&self, offset: usize) -> Option<u32> {
		let line = offset / CHARS_PER_LINE;
		(!self.hidden.contains(&line)).then_some(line as u32 * self.line_height)
	}

	fn y_to_offset(&self, y: u32) -> Option<usize> {
		(y < self.content_height()).then_some((y / self.line_height) as usize * CHARS_PER_LINE)
	}
}

fn layout() -> StripeLayout {
	StripeLayout::from(&StripeConfig::default())
}

fn mapper() -> (CoordinateMapper, SharedCaches) {
	let caches: SharedCaches = Arc::new(Mutex::new(StripeCaches::default()));
	(CoordinateMapper::new(Arc::clone(&caches), layout()), caches)
}

#[test]
fn one_to_one_uses_rendered_offsets() {
	let (mapper, _) = mapper();
	let grid = Grid::new(10, 16, 400);

	assert_eq!(mapper.regime(&grid), Some(Regime::OneToOne));
	assert_eq!(mapper.line_to_y(&grid, 0), Some(16));
	assert_eq!(mapper.line_to_y(&grid, 3), Some(3 * 16 + 16));
	assert_eq!(mapper.line_to_y(&grid, 10), None);
}

#[test]
fn one_to_one_inverse_and_dead_space() {
	let (mapper, _) = mapper();
	let grid = Grid::new(10, 16, 400);
	let y = mapper.line_to_y(&grid, 3).unwrap();

	assert_eq!(mapper.y_to_line_range(&grid, y), Some(3..=3));
	assert_eq!(mapper.y_to_line_range(&grid, y + 2), Some(3..=3));
	assert_eq!(mapper.y_to_line_range(&grid, y + 3), None);
	assert_eq!(mapper.y_to_line_range(&grid, y + 15), None);
	assert_eq!(mapper.y_to_line_range(&grid, 5), None);
	assert_eq!(mapper.y_to_line_range(&grid, 10 * 16 + 16), None);
}

#[test]
fn block_compressed_groups_lines() {
	let (mapper, _) = mapper();
	// 160_000 px of content into 400 usable px: 100 rows of 4 px.
	let grid = Grid::new(10_000, 16, 420);

	assert_eq!(mapper.regime(&grid), Some(Regime::BlockCompressed { blocks: 100 }));
	assert_eq!(mapper.line_to_y(&grid, 0), Some(16));
	assert_eq!(mapper.line_to_y(&grid, 99), Some(16));
	assert_eq!(mapper.line_to_y(&grid, 100), Some(20));
	assert_eq!(mapper.line_to_y(&grid, 9_999), Some(99 * 4 + 16));

	assert_eq!(mapper.y_to_line_range(&grid, 16), Some(0..=99));
	assert_eq!(mapper.y_to_line_range(&grid, 18), Some(0..=99));
	assert_eq!(mapper.y_to_line_range(&grid, 21), Some(100..=199));
	assert_eq!(mapper.y_to_line_range(&grid, 99 * 4 + 16), Some(9_900..=9_999));
}

#[test]
fn block_compressed_separator_and_tail_are_dead() {
	let (mapper, _) = mapper();
	let grid = Grid::new(10_000, 16, 420);

	// Fourth pixel of each 4 px pitch is the separator.
	assert_eq!(mapper.y_to_line_range(&grid, 19), None);
	assert_eq!(mapper.y_to_line_range(&grid, 100 * 4 + 16), None);
}

#[test]
fn rows_without_a_starting_line_are_dead() {
	let (mapper, _) = mapper();
	// 20 lines of 100 px into 40 rows: each line spans two rows.
	let grid = Grid::new(20, 100, 180);
	assert_eq!(mapper.regime(&grid), Some(Regime::BlockCompressed { blocks: 40 }));

	assert_eq!(mapper.y_to_line_range(&grid, 16), Some(0..=0));
	assert_eq!(mapper.y_to_line_range(&grid, 20), None);
	assert_eq!(mapper.y_to_line_range(&grid, 24), Some(1..=1));
}

#[test]
fn unmappable_viewports_yield_none() {
	let (mapper, _) = mapper();

	assert_eq!(mapper.line_to_y(&Grid::new(10, 16, 0), 1), None);
	assert_eq!(mapper.line_to_y(&Grid::new(10, 16, 20), 1), None);
	assert_eq!(mapper.line_to_y(&Grid::new(0, 16, 400), 0), None);
	assert_eq!(mapper.y_to_line_range(&Grid::new(10, 16, 0), 16), None);
}

#[test]
fn unmappable_line_is_cached_as_such() {
	let (mapper, caches) = mapper();
	let mut grid = Grid::new(10, 16, 400);
	grid.hidden.push(4);

	assert_eq!(mapper.line_to_y(&grid, 4), None);
	assert_eq!(mapper.line_to_y(&grid, 5), Some(5 * 16 + 16));

	let caches = caches.lock();
	assert_eq!(caches.coords.slot(4), PixelSlot::Unmappable);
	assert_eq!(caches.coords.slot(5), PixelSlot::At(80));
	assert_eq!(caches.coords.slot(6), PixelSlot::Uncomputed);
}

#[test]
fn cache_tracks_line_count_and_viewport() {
	let (mapper, caches) = mapper();

	mapper.line_to_y(&Grid::new(10, 16, 400), 1);
	assert_eq!(caches.lock().coords.len(), 12);

	mapper.line_to_y(&Grid::new(25, 16, 600), 1);
	assert_eq!(caches.lock().coords.len(), 27);
	assert_eq!(caches.lock().coords.slot(2), PixelSlot::Uncomputed);

	// Same line count, taller viewport: still rebuilt.
	mapper.line_to_y(&Grid::new(25, 16, 800), 2);
	assert_eq!(caches.lock().coords.slot(1), PixelSlot::Uncomputed);
	assert_eq!(caches.lock().coords.slot(2), PixelSlot::At(32));

	mapper.clear();
	assert!(caches.lock().coords.is_empty());
}

proptest! {
	#[test]
	fn one_to_one_round_trip(lines in 1usize..40, line_height in 1u32..12, line in 0usize..40) {
		let (mapper, _) = mapper();
		let grid = Grid::new(lines, line_height, 16 + 4 + lines as u32 * line_height + 7);
		prop_assume!(line < lines);

		if let Some(y) = mapper.line_to_y(&grid, line) {
			let range = mapper.y_to_line_range(&grid, y);
			prop_assert!(range.is_some_and(|r| r.contains(&line)));
		}
	}

	#[test]
	fn block_round_trip(lines in 200usize..5_000, line in 0usize..5_000) {
		let (mapper, _) = mapper();
		let grid = Grid::new(lines, 16, 420);
		prop_assume!(line < lines);
		prop_assume!(matches!(mapper.regime(&grid), Some(Regime::BlockCompressed { .. })));

		let y = mapper.line_to_y(&grid, line).unwrap();
		let range = mapper.y_to_line_range(&grid, y);
		prop_assert!(range.is_some_and(|r| r.contains(&line)));
	}
}
