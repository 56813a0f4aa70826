//! Matching, scoring, and ranking of internship listings

pub mod cache;
pub mod embedding_manager;
pub mod embeddings;
pub mod explain;
pub mod geolocation;
pub mod listing;
pub mod ranker;
pub mod recommender;
pub mod rules;
pub mod scoring;
pub mod skills;
pub mod text_processor;
