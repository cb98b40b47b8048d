pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod image;
pub mod matcher;
mod metrics;
pub mod orb;
pub mod repository;
pub mod server;
pub mod similarity;
pub mod utils;

pub use config::Opts;
pub use error::SearchError;
pub use matcher::{MatchResult, Matcher, SearchOutcome};
