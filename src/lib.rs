pub mod cli;
pub mod codec;
pub mod config;
pub mod db;
pub mod extract;
pub mod pipeline;
pub mod utils;

pub use codec::{CodecError, Matrix};
pub use config::Opts;
pub use extract::FeatureExtractor;
pub use pipeline::{Pipeline, RunSummary};
