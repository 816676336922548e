//! Line-to-pixel mapping for the stripe.
//!
//! Two regimes:
//!
//! - **1:1**: the whole rendered document fits into the usable stripe height.
//!   A line maps to its own rendered pixel offset plus the top offset.
//! - **Block-compressed**: the document is taller than the stripe. The stripe
//!   is cut into rows of `mark_height + separator` pixels and each line maps to
//!   the row covering its relative position, so many lines can share one row.
//!
//! Raw per-line pixel offsets are cached in a [`CoordinateCache`] that is
//! rebuilt whenever the viewport height or the line count changes.

use std::ops::RangeInclusive;

use crate::cache::SharedCaches;
use crate::config::StripeConfig;
use crate::document::DocumentGeometry;

/// Slots reserved beyond the line count; slot `line + 1` holds `line`.
const PADDING: usize = 2;

/// Cached raw pixel offset of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelSlot {
	/// Not computed yet.
	#[default]
	Uncomputed,
	/// The view could not place the line.
	Unmappable,
	/// Top pixel of the line in content coordinates.
	At(u32),
}

impl PixelSlot {
	/// The pixel, if the line was mapped.
	pub fn pixel(self) -> Option<u32> {
		match self {
			Self::At(y) => Some(y),
			Self::Uncomputed | Self::Unmappable => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
	viewport_height: u32,
	line_count: usize,
}

/// Raw per-line pixel offsets, keyed by viewport height and line count.
#[derive(Debug, Default)]
pub struct CoordinateCache {
	slots: Vec<PixelSlot>,
	key: Option<CacheKey>,
}

impl CoordinateCache {
	/// Drops every slot.
	pub fn clear(&mut self) {
		self.slots = Vec::new();
		self.key = None;
	}

	/// Number of slots; `line_count + 2` once built, zero when cleared.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Cached slot for `line`.
	pub fn slot(&self, line: usize) -> PixelSlot {
		self.slots.get(line + 1).copied().unwrap_or_default()
	}

	fn ensure(&mut self, key: CacheKey) {
		if self.key != Some(key) {
			self.slots = vec![PixelSlot::Uncomputed; key.line_count + PADDING];
			self.key = Some(key);
		}
	}

	fn store(&mut self, line: usize, slot: PixelSlot) {
		if let Some(entry) = self.slots.get_mut(line + 1) {
			*entry = slot;
		}
	}
}

/// Which mapping applies to the current geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
	/// Each line keeps its own pixel row.
	OneToOne,
	/// Lines share `blocks` rows of `mark_height + separator` pixels.
	BlockCompressed {
		/// Number of rows available.
		blocks: u32,
	},
}

/// Pixel layout of the stripe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeLayout {
	/// Height of one mark row.
	pub mark_height: u32,
	/// Gap between rows in the block-compressed regime.
	pub separator: u32,
	/// Pixels reserved above the first row.
	pub top_offset: u32,
	/// Pixels reserved below the last row.
	pub bottom_offset: u32,
}

impl From<&StripeConfig> for StripeLayout {
	fn from(config: &StripeConfig) -> Self {
		Self {
			mark_height: config.mark_height,
			separator: config.separator,
			top_offset: config.top_offset,
			bottom_offset: config.bottom_offset,
		}
	}
}

impl StripeLayout {
	fn block_size(&self) -> u32 {
		self.mark_height + self.separator
	}

	/// Stripe pixels available for rows.
	pub fn usable_height(&self, viewport_height: u32) -> u32 {
		viewport_height.saturating_sub(self.top_offset + self.bottom_offset)
	}
}

/// Maps document lines to stripe pixel rows and back.
///
/// Every query takes a [`DocumentGeometry`] snapshot; the caller holds the
/// document read-lock for the duration of the call.
pub struct CoordinateMapper {
	caches: SharedCaches,
	layout: StripeLayout,
}

impl CoordinateMapper {
	/// Creates a mapper over the shared caches.
	pub fn new(caches: SharedCaches, layout: StripeLayout) -> Self {
		Self { caches, layout }
	}

	/// The pixel layout.
	pub fn layout(&self) -> StripeLayout {
		self.layout
	}

	/// Regime for `geom`, or `None` when nothing can be mapped.
	pub fn regime(&self, geom: &dyn DocumentGeometry) -> Option<Regime> {
		regime(&self.layout, geom)
	}

	/// Top pixel of the row painted for `line`.
	pub fn line_to_y(&self, geom: &dyn DocumentGeometry, line: usize) -> Option<u32> {
		let mut caches = self.caches.lock();
		Mapping::new(&self.layout, &mut caches.coords, geom)?.line_to_y(line)
	}

	/// Lines painted on the row containing pixel `y`.
	///
	/// Returns `None` when `y` falls outside the rows or into the gap between
	/// two rows. In both regimes a hit must lie within `mark_height` pixels
	/// below the row's top, so in the 1:1 regime the rest of a tall text line
	/// is dead space.
	pub fn y_to_line_range(
		&self,
		geom: &dyn DocumentGeometry,
		y: u32,
	) -> Option<RangeInclusive<usize>> {
		let mut caches = self.caches.lock();
		Mapping::new(&self.layout, &mut caches.coords, geom)?.y_to_line_range(y)
	}

	/// Drops every cached pixel offset.
	pub fn clear(&self) {
		self.caches.lock().coords.clear();
	}
}

fn regime(layout: &StripeLayout, geom: &dyn DocumentGeometry) -> Option<Regime> {
	let usable = layout.usable_height(geom.viewport_height());
	let content = geom.content_height();
	if usable == 0 || content == 0 {
		return None;
	}
	if content <= usable {
		return Some(Regime::OneToOne);
	}
	match usable / layout.block_size() {
		0 => None,
		blocks => Some(Regime::BlockCompressed { blocks }),
	}
}

/// One query's view of the cache, with the regime resolved up front.
struct Mapping<'a> {
	layout: &'a StripeLayout,
	cache: &'a mut CoordinateCache,
	geom: &'a dyn DocumentGeometry,
	regime: Regime,
	line_count: usize,
}

impl<'a> Mapping<'a> {
	fn new(
		layout: &'a StripeLayout,
		cache: &'a mut CoordinateCache,
		geom: &'a dyn DocumentGeometry,
	) -> Option<Self> {
		let regime = regime(layout, geom)?;
		let line_count = geom.line_count();
		cache.ensure(CacheKey {
			viewport_height: geom.viewport_height(),
			line_count,
		});
		Some(Self {
			layout,
			cache,
			geom,
			regime,
			line_count,
		})
	}

	fn raw_pixel(&mut self, line: usize) -> Option<u32> {
		match self.cache.slot(line) {
			PixelSlot::At(y) => Some(y),
			PixelSlot::Unmappable => None,
			PixelSlot::Uncomputed => {
				let slot = self
					.geom
					.line_start_offset(line)
					.and_then(|offset| self.geom.offset_to_y(offset))
					.map_or(PixelSlot::Unmappable, PixelSlot::At);
				self.cache.store(line, slot);
				slot.pixel()
			}
		}
	}

	fn line_to_y(&mut self, line: usize) -> Option<u32> {
		if line >= self.line_count {
			return None;
		}
		let raw = self.raw_pixel(line)?;
		match self.regime {
			Regime::OneToOne => raw.checked_add(self.layout.top_offset),
			Regime::BlockCompressed { blocks } => {
				// floor(raw / content * blocks), kept in integers.
				let content = u64::from(self.geom.content_height());
				let block = (u64::from(raw) * u64::from(blocks) / content).min(u64::from(blocks - 1));
				Some(block as u32 * self.layout.block_size() + self.layout.top_offset)
			}
		}
	}

	fn y_to_line_range(&mut self, y: u32) -> Option<RangeInclusive<usize>> {
		let relative = y.checked_sub(self.layout.top_offset)?;
		let line = match self.regime {
			Regime::OneToOne => {
				let offset = self.geom.y_to_offset(relative)?;
				self.geom.offset_to_line(offset)?
			}
			Regime::BlockCompressed { blocks } => {
				let block_size = self.layout.block_size();
				let block = relative / block_size;
				if block >= blocks || relative % block_size >= self.layout.mark_height {
					return None;
				}
				let row_y = block * block_size + self.layout.top_offset;
				// Probe the content pixel at the middle of the row.
				let content = u64::from(self.geom.content_height());
				let probe = (u64::from(2 * block + 1) * content / u64::from(2 * blocks)).min(content - 1);
				let probe = probe as u32;
				let line = self.geom.offset_to_line(self.geom.y_to_offset(probe)?)?;
				// The probe can land on a line that started in an earlier row;
				// the first line starting in this row is then the next one.
				match self.line_to_y(line) {
					Some(found) if found < row_y => line + 1,
					_ => line,
				}
			}
		};

		// Only the painted mark is hittable, not the whole text line.
		let row = self.line_to_y(line)?;
		if y < row || y - row >= self.layout.mark_height {
			return None;
		}

		let mut first = line;
		while first > 0 && self.line_to_y(first - 1) == Some(row) {
			first -= 1;
		}
		let mut last = line;
		while last + 1 < self.line_count && self.line_to_y(last + 1) == Some(row) {
			last += 1;
		}
		Some(first..=last)
	}
}

#[cfg(test)]
mod tests;
