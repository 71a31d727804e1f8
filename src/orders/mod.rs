//! # Order data model, sources and list presentation.
//!
//! - [`Order`] / [`Platform`] - the immutable offer record
//! - [`OrderSource`] - capability the emitter pulls candidates from
//! - [`FnSource`], [`MockSource`] - closure-backed and mock sources
//! - [`OrderSort`], [`sorted`], [`summary`] - derived views for the order list

mod list;
mod order;
mod source;

pub use list::{ListSummary, OrderSort, sorted, summary};
pub use order::{Order, Platform};
pub use source::{FnSource, MockSource, OrderSource, SourceRef};
