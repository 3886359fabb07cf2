//! jobsearch - natural-language job search orchestration
//!
//! Turns a free-text job query into a semantic search plus structured filters,
//! retrieves from a hybrid sparse/dense index with rank fusion, consolidates the
//! chunk-level hits per job, and writes a short answer with a deterministic
//! fallback.

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod oracle;
pub mod query;
pub mod retrieval;
pub mod search;
pub mod synthesis;

pub use error::{ErrorKind, JobSearchError, Result};
pub use search::{AnswerSource, JobResult, SearchOutcome, SearchService};
