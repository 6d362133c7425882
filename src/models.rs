use std::fmt;
use std::path::Path;

use chrono::{Local, NaiveDateTime, SubsecRound};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

/// One job application, as written to `<company>/<...>_job_description.json`.
///
/// Field order here is the field order on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_description: String,
    #[serde(rename = "position_name")]
    pub position: String,
    pub company_name: String,
    pub date_applied: NaiveDateTime,
    #[serde(default)]
    pub resume_used_path: String, // empty when no resume was given
}

impl JobRecord {
    pub fn new(
        company_name: &str,
        position: &str,
        job_description: &str,
        resume_used_path: Option<&Path>,
    ) -> Self {
        Self {
            job_description: job_description.to_string(),
            position: position.to_string(),
            company_name: company_name.to_string(),
            date_applied: Local::now().naive_local().trunc_subsecs(6),
            resume_used_path: resume_used_path
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn resume_path(&self) -> Option<&Path> {
        if self.resume_used_path.is_empty() {
            None
        } else {
            Some(Path::new(&self.resume_used_path))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum WorkLocation {
    #[default]
    Onsite,
    Hybrid,
    Remote,
}

impl fmt::Display for WorkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkLocation::Onsite => "Onsite",
            WorkLocation::Hybrid => "Hybrid",
            WorkLocation::Remote => "Remote",
        };
        f.write_str(s)
    }
}

/// A row of the "Jobs Applied For" sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub position: String,
    pub company: String,
    pub website: String,
    pub email: String,
    pub location: String,
    pub work_location: WorkLocation,
    pub industry: String,
    pub date: String,
}

impl SheetRow {
    pub fn values(&self) -> Vec<String> {
        vec![
            self.position.clone(),
            self.company.clone(),
            self.website.clone(),
            self.email.clone(),
            self.location.clone(),
            self.work_location.to_string(),
            self.industry.clone(),
            self.date.clone(),
        ]
    }
}

/// Pretty JSON with 4-space indentation. Non-ASCII text is written as-is.
pub fn to_json_pretty<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}
