use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::JobLogError;
use crate::models::to_json_pretty;

/// Saved form values, keyed by the labels of the original entry form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Job Email")]
    pub job_email: String,
    #[serde(rename = "Company Location")]
    pub company_location: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Google Sheet Credential Path")]
    pub credential_path: String,
    #[serde(rename = "Google Sheet Name")]
    pub sheet_name: String,
    #[serde(rename = "Google Sheet Tab Name")]
    pub tab_name: String,
    #[serde(rename = "Work Location")]
    pub work_location: String,
}

impl Preset {
    pub fn load(path: &Path) -> Result<Self, JobLogError> {
        let content = fs::read_to_string(path).map_err(|e| {
            JobLogError::Io(format!("Could not read preset file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            JobLogError::Json(format!("Could not read preset file {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), JobLogError> {
        let json = to_json_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Label/value pairs in form order.
    pub fn entries(&self) -> [(&'static str, &str); 11] {
        [
            ("Company Name", self.company_name.as_str()),
            ("Position", self.position.as_str()),
            ("Website", self.website.as_str()),
            ("Job Email", self.job_email.as_str()),
            ("Company Location", self.company_location.as_str()),
            ("Industry", self.industry.as_str()),
            ("Date", self.date.as_str()),
            ("Google Sheet Credential Path", self.credential_path.as_str()),
            ("Google Sheet Name", self.sheet_name.as_str()),
            ("Google Sheet Tab Name", self.tab_name.as_str()),
            ("Work Location", self.work_location.as_str()),
        ]
    }
}
