//! Services for the detail-extraction engine.

pub mod batch;
pub mod extract;
pub mod fetch;
pub mod headers;
pub mod pipeline;
pub mod repair;

pub use batch::{BatchCoordinator, BatchReport};
pub use extract::{extract, Extracted};
pub use fetch::{FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use headers::{sanitize_headers, DEFAULT_USER_AGENT};
pub use pipeline::{ExtractionPipeline, ItemReport, Outcome};
pub use repair::{propose_rule, RuleProposal};
