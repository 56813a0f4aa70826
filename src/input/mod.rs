//! Input processing module
//! Handles file detection, field parsing, and dataset/profile loading

pub mod dataset;
pub mod file_detector;
pub mod manager;
pub mod parse;
pub mod profile;
