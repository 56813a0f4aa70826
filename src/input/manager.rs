//! Input manager for loading the dataset and the user profile

use crate::error::{RecommenderError, Result};
use crate::input::dataset::{parse_listings, DatasetLoad};
use crate::input::file_detector::FileType;
use crate::input::profile::parse_profile;
use crate::processing::listing::UserProfile;
use chrono::NaiveDate;
use log::info;
use std::path::Path;
use tokio::fs;

pub struct InputManager {
    today: NaiveDate,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Fix the date used when a profile omits `available_from`
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn load_dataset(&self, path: &Path) -> Result<DatasetLoad> {
        self.expect_type(path, FileType::Csv)?;

        info!("Reading internship dataset: {}", path.display());
        let bytes = fs::read(path).await?;
        let load = parse_listings(&bytes)?;

        info!(
            "Loaded {} listings ({} malformed rows skipped)",
            load.listings.len(),
            load.skipped.len()
        );
        Ok(load)
    }

    pub async fn load_profile(&self, path: &Path) -> Result<UserProfile> {
        self.expect_type(path, FileType::Json)?;

        info!("Reading user profile: {}", path.display());
        let content = fs::read_to_string(path).await?;
        let profile = parse_profile(&content, self.today)?;

        info!(
            "Profile has {} skills, prefers {}",
            profile.skills.len(),
            profile.location
        );
        Ok(profile)
    }

    fn expect_type(&self, path: &Path, expected: FileType) -> Result<()> {
        if !path.exists() {
            return Err(RecommenderError::MissingFile(path.to_path_buf()));
        }

        let detected = FileType::from_path(path);
        if detected != expected {
            return Err(RecommenderError::UnsupportedFormat(format!(
                "Expected a {:?} file, got: {}",
                expected,
                path.display()
            )));
        }
        Ok(())
    }
}
