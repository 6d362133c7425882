use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use clap::{Args, ValueEnum};

use crate::config::Config;
use crate::models::{SheetRow, WorkLocation};
use crate::preset::Preset;
use crate::sheets::sheet_date;

#[derive(Args, Debug, Default, Clone)]
pub struct JobFields {
    /// Company name
    #[arg(short, long)]
    pub company: Option<String>,

    /// Position title
    #[arg(short, long)]
    pub position: Option<String>,

    /// Job posting website
    #[arg(long)]
    pub website: Option<String>,

    /// Contact email, or how you applied
    #[arg(long)]
    pub email: Option<String>,

    /// Company location
    #[arg(long)]
    pub location: Option<String>,

    /// Work location
    #[arg(long, value_enum)]
    pub work_location: Option<WorkLocation>,

    /// Industry
    #[arg(long)]
    pub industry: Option<String>,

    /// Date applied, M/D/YYYY (defaults to today)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SheetTarget {
    /// Service account credentials JSON file
    #[arg(long)]
    pub creds: Option<PathBuf>,

    /// Name of the Google Sheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// Tab to append to (empty for the first tab)
    #[arg(long)]
    pub tab: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct DescriptionSource {
    /// Job description text
    #[arg(short, long, conflicts_with = "description_file")]
    pub description: Option<String>,

    /// Read the job description from a file ("-" for stdin)
    #[arg(long)]
    pub description_file: Option<PathBuf>,
}

impl DescriptionSource {
    pub fn read(&self) -> Result<String> {
        if let Some(text) = &self.description {
            return Ok(text.clone());
        }
        match &self.description_file {
            Some(path) if path.as_os_str() == "-" => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read job description from stdin")?;
                Ok(text)
            }
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read job description file: {}", path.display())),
            None => Ok(String::new()),
        }
    }
}

/// Everything one run needs, after flags, preset and config are merged.
#[derive(Debug, Clone)]
pub struct FormFields {
    pub company: String,
    pub position: String,
    pub website: String,
    pub email: String,
    pub location: String,
    pub work_location: WorkLocation,
    pub industry: String,
    pub date: String,
    pub creds: Option<PathBuf>,
    pub sheet: Option<String>,
    pub tab: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn pick(flag: &Option<String>, preset: Option<&str>) -> Option<String> {
    flag.clone().or_else(|| preset.and_then(non_empty))
}

impl FormFields {
    /// Flags win over the preset, the preset over the config file.
    pub fn resolve(
        fields: &JobFields,
        target: &SheetTarget,
        preset: Option<&Preset>,
        config: &Config,
    ) -> Result<Self> {
        let work_location = match (fields.work_location, preset.and_then(|p| non_empty(&p.work_location))) {
            (Some(flag), _) => flag,
            (None, Some(text)) => WorkLocation::from_str(&text, true)
                .map_err(|_| anyhow!("Invalid work location in preset: '{}'", text))?,
            (None, None) => WorkLocation::default(),
        };

        let date = pick(&fields.date, preset.map(|p| p.date.as_str()))
            .unwrap_or_else(|| sheet_date(Local::now().date_naive()));

        let creds = target
            .creds
            .clone()
            .or_else(|| preset.and_then(|p| non_empty(&p.credential_path)).map(PathBuf::from))
            .or_else(|| config.credentials_path.clone());

        let sheet = pick(&target.sheet, preset.map(|p| p.sheet_name.as_str()))
            .or_else(|| config.sheet_name.clone());

        // An empty preset value is "not set"; only `--tab ""` picks the first tab.
        let tab = match pick(&target.tab, preset.map(|p| p.tab_name.as_str())) {
            Some(tab) => non_empty(&tab),
            None => config.tab().map(String::from),
        };

        Ok(Self {
            company: pick(&fields.company, preset.map(|p| p.company_name.as_str())).unwrap_or_default(),
            position: pick(&fields.position, preset.map(|p| p.position.as_str())).unwrap_or_default(),
            website: pick(&fields.website, preset.map(|p| p.website.as_str())).unwrap_or_default(),
            email: pick(&fields.email, preset.map(|p| p.job_email.as_str())).unwrap_or_default(),
            location: pick(&fields.location, preset.map(|p| p.company_location.as_str()))
                .unwrap_or_default(),
            work_location,
            industry: pick(&fields.industry, preset.map(|p| p.industry.as_str())).unwrap_or_default(),
            date,
            creds,
            sheet,
            tab,
        })
    }

    pub fn require_job(&self) -> Result<()> {
        if self.company.trim().is_empty() || self.position.trim().is_empty() {
            bail!("Company name and position are required (use --company/--position or a preset)");
        }
        Ok(())
    }

    pub fn sheet_target(&self) -> Result<(&Path, &str)> {
        match (&self.creds, &self.sheet) {
            (Some(creds), Some(sheet)) if !sheet.is_empty() => Ok((creds.as_path(), sheet.as_str())),
            _ => Err(anyhow!(
                "Google Sheet credential path and sheet name are required to update records"
            )),
        }
    }

    pub fn sheet_row(&self) -> SheetRow {
        SheetRow {
            position: self.position.clone(),
            company: self.company.clone(),
            website: self.website.clone(),
            email: self.email.clone(),
            location: self.location.clone(),
            work_location: self.work_location,
            industry: self.industry.clone(),
            date: self.date.clone(),
        }
    }
}

/// A preset holding exactly the values given on the command line.
pub fn preset_from_args(fields: &JobFields, target: &SheetTarget) -> Preset {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    Preset {
        company_name: text(&fields.company),
        position: text(&fields.position),
        website: text(&fields.website),
        job_email: text(&fields.email),
        company_location: text(&fields.location),
        industry: text(&fields.industry),
        date: text(&fields.date),
        credential_path: target
            .creds
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        sheet_name: text(&target.sheet),
        tab_name: text(&target.tab),
        work_location: fields
            .work_location
            .map(|w| w.to_string())
            .unwrap_or_default(),
    }
}
