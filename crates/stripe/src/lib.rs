//! Error stripe engine for Xeno.
//!
//! Aggregates positional status marks from any number of pluggable sources
//! into one line-indexed cache, answers ranked range queries over it, maps
//! lines to stripe pixels and back, and coalesces invalidation bursts into a
//! single redraw.
//!
//! # Data flow
//!
//! ```text
//! MarkSource change -> MarkAggregator patches caches -> RepaintScheduler armed
//!   -> quiet period -> caches cleared -> RedrawRequest -> view queries
//!      StatusSummarizer / CoordinateMapper and paints
//! ```
//!
//! [`ErrorStripe`] owns one of each component for a (document, viewer)
//! pairing. Producers are registered once in a shared [`SourceRegistry`].
//!
//! # Configuration
//!
//! Geometry, timing and scan limits come from [`StripeConfig`], read from
//! TOML:
//!
//! ```toml
//! mark_height = 3
//! quiet_period_ms = 50
//!
//! [colors]
//! warning = "#e0b000"
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod coords;
pub mod document;
pub mod error;
pub mod legacy;
pub mod observer;
pub mod registry;
pub mod repaint;
pub mod source;
pub mod stats;
pub mod stripe;
pub mod summary;

pub use aggregator::MarkAggregator;
pub use cache::{LineIndex, MergedMarks};
pub use config::{StatusColors, StripeConfig};
pub use coords::{CoordinateMapper, PixelSlot, Regime, StripeLayout};
pub use document::{AnnotationStore, DocumentGeometry, LegacyAnnotation, StripeDocument};
pub use error::{ConfigError, Result};
pub use legacy::LegacyScan;
pub use observer::{ListenerSet, SubscriptionId};
pub use registry::{MarkSourceFactory, SourceRegistry, StatusProviderFactory};
pub use repaint::{RepaintFlags, RepaintHandler, RepaintScheduler, RepaintTrigger, SchedulerState};
pub use source::{MarkChange, MarkListener, MarkSet, MarkSource, StatusCell, StatusListener, StatusProvider};
pub use stats::{Histogram, HistogramDisplay, StripeStatistics};
pub use stripe::{ErrorStripe, RedrawReceiver, RedrawRequest};
pub use summary::{StatusSummarizer, StripeMark};
pub use xeno_marks::{LineSpan, Mark, MarkId, MarkKind, Status, UpToDate};
