//! Internship recommender library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{RecommenderError, Result};
pub use processing::listing::{Listing, UserProfile};
pub use processing::recommender::{RecommendationRun, Recommender, RunStats};
pub use processing::scoring::{ComponentScores, ScoredListing};
