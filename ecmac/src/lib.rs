//! Turns ECMAScript 262 conformance suite JSON (`ch<NN>.json`) into C sources that embed the
//! positive test snippets, for compiling into an engine's parser test binary.
//!
//! Suites are read in order, filtered through a [`Denylist`], decoded from base64 and
//! rendered in one of the [`OutputMode`]s.

pub mod denylist;
pub mod escape;
pub mod export;
pub mod render;
pub mod suite;

pub use denylist::{AcceptAll, ContentFilter, Denylist, SubstringFilter};
pub use export::{export, Case, ExportOptions, ExportSummary, SkipReason, SuiteSummary};
pub use render::{OutputMode, DEFAULT_ARRAY_NAME};
pub use suite::SuiteCode;
