pub mod error;
pub mod verdict;

pub use error::{LanguageError, LocatorError, PipelineError, SampleError};
pub use verdict::Outcome;
