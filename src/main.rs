mod config;
mod error;
mod form;
mod models;
mod preset;
mod records;
mod sheets;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use form::{DescriptionSource, FormFields, JobFields, SheetTarget, preset_from_args};
use preset::Preset;
use records::RecordWriter;
use sheets::{GoogleSheetsClient, SCOPES, log_google_sheet_data};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "joblog", version)]
#[command(about = "Job application logger - save job descriptions locally and log applications to a Google Sheet")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root folder for company records (overrides the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save the job locally and add it to the Google Sheet
    Apply {
        #[command(flatten)]
        fields: JobFields,

        #[command(flatten)]
        target: SheetTarget,

        #[command(flatten)]
        description: DescriptionSource,

        /// Resume file used for this application
        #[arg(short, long)]
        resume: Option<PathBuf>,

        /// Fill missing fields from a preset file
        #[arg(long)]
        preset: Option<PathBuf>,
    },

    /// Save the job locally only
    Record {
        #[command(flatten)]
        fields: JobFields,

        #[command(flatten)]
        description: DescriptionSource,

        /// Resume file used for this application
        #[arg(short, long)]
        resume: Option<PathBuf>,

        /// Fill missing fields from a preset file
        #[arg(long)]
        preset: Option<PathBuf>,
    },

    /// Add a row to the Google Sheet only
    Sheet {
        #[command(flatten)]
        fields: JobFields,

        #[command(flatten)]
        target: SheetTarget,

        /// Fill missing fields from a preset file
        #[arg(long)]
        preset: Option<PathBuf>,
    },

    /// Inspect saved job records
    Records {
        #[command(subcommand)]
        command: RecordsCommands,
    },

    /// Manage field presets
    Preset {
        #[command(subcommand)]
        command: PresetCommands,
    },

    /// Show the resolved configuration
    Config,
}

#[derive(Subcommand)]
enum RecordsCommands {
    /// List records saved for a company
    List {
        /// Company name
        company: String,
    },

    /// Show one record file
    Show {
        /// Path to a *_job_description.json file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum PresetCommands {
    /// Save the given field values to a preset file
    Save {
        /// Preset file to write
        file: PathBuf,

        #[command(flatten)]
        fields: JobFields,

        #[command(flatten)]
        target: SheetTarget,
    },

    /// Show a preset file
    Show {
        /// Preset file to read
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_preset(path: Option<&Path>) -> Result<Option<Preset>> {
    match path {
        Some(path) => Ok(Some(Preset::load(path)?)),
        None => Ok(None),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;
    let root = cli.root.clone().unwrap_or_else(|| config.record_root.clone());

    match cli.command {
        Commands::Apply {
            fields,
            target,
            description,
            resume,
            preset,
        } => {
            let preset = load_preset(preset.as_deref())?;
            let form = FormFields::resolve(&fields, &target, preset.as_ref(), &config)?;
            form.require_job()?;
            let (creds, sheet) = form.sheet_target()?;
            let description = description.read()?;

            let writer = RecordWriter::new(&root);
            let job_result = writer.log_job_applied_for(
                &form.company,
                &form.position,
                &description,
                resume.as_deref(),
            );

            let client = GoogleSheetsClient::new(creds, &SCOPES);
            let sheet_result =
                log_google_sheet_data(&client, sheet, &form.sheet_row(), form.tab.as_deref());

            println!("{}\n{}", job_result, sheet_result);
        }

        Commands::Record {
            fields,
            description,
            resume,
            preset,
        } => {
            let preset = load_preset(preset.as_deref())?;
            let form =
                FormFields::resolve(&fields, &SheetTarget::default(), preset.as_ref(), &config)?;
            form.require_job()?;
            let description = description.read()?;

            let writer = RecordWriter::new(&root);
            let result = writer.log_job_applied_for(
                &form.company,
                &form.position,
                &description,
                resume.as_deref(),
            );
            println!("{}", result);
        }

        Commands::Sheet {
            fields,
            target,
            preset,
        } => {
            let preset = load_preset(preset.as_deref())?;
            let form = FormFields::resolve(&fields, &target, preset.as_ref(), &config)?;
            let (creds, sheet) = form.sheet_target()?;

            let client = GoogleSheetsClient::new(creds, &SCOPES);
            let result =
                log_google_sheet_data(&client, sheet, &form.sheet_row(), form.tab.as_deref());
            println!("{}", result);
        }

        Commands::Records { command } => {
            let writer = RecordWriter::new(&root);
            match command {
                RecordsCommands::List { company } => {
                    let records = writer.list_records(&company)?;
                    if records.is_empty() {
                        println!(
                            "No records found for '{}' under {}.",
                            company,
                            writer.root().display()
                        );
                    } else {
                        println!("{:<50} {:<25} {:<20}", "FILE", "POSITION", "APPLIED");
                        println!("{}", "-".repeat(97));
                        for (name, record) in records {
                            println!(
                                "{:<50} {:<25} {:<20}",
                                truncate(&name, 48),
                                truncate(&record.position, 23),
                                record.date_applied.format("%Y-%m-%d %H:%M")
                            );
                        }
                    }
                }

                RecordsCommands::Show { file } => {
                    let record = writer.read_record(&file)?;
                    println!("Company: {}", record.company_name);
                    println!("Position: {}", record.position);
                    println!("Applied: {}", record.date_applied.format("%Y-%m-%d %H:%M:%S"));
                    if let Some(resume) = record.resume_path() {
                        println!("Resume: {}", resume.display());
                    }
                    if !record.job_description.is_empty() {
                        println!(
                            "\n--- Job Description ---\n{}",
                            textwrap::fill(&record.job_description, 80)
                        );
                    }
                }
            }
        }

        Commands::Preset { command } => match command {
            PresetCommands::Save {
                file,
                fields,
                target,
            } => {
                let preset = preset_from_args(&fields, &target);
                preset
                    .save(&file)
                    .with_context(|| format!("Failed to save preset to {}", file.display()))?;
                println!("Preset saved to {}", file.display());
            }

            PresetCommands::Show { file } => {
                let preset = Preset::load(&file)?;
                for (label, value) in preset.entries() {
                    println!("{:<30} {}", format!("{}:", label), value);
                }
            }
        },

        Commands::Config => {
            println!("# {}", config_path.display());
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
        assert_eq!(truncate("Montréal Montréal", 8), "Montr...");
    }

    #[test]
    fn test_cli_parses_apply() {
        let cli = Cli::try_parse_from([
            "joblog",
            "apply",
            "--company",
            "CD Project Red",
            "--position",
            "Animator",
            "--work-location",
            "remote",
            "--sheet",
            "Job log",
        ])
        .unwrap();
        match cli.command {
            Commands::Apply { fields, target, .. } => {
                assert_eq!(fields.company.as_deref(), Some("CD Project Red"));
                assert_eq!(fields.work_location, Some(models::WorkLocation::Remote));
                assert_eq!(target.sheet.as_deref(), Some("Job log"));
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_description_flags_conflict() {
        let result = Cli::try_parse_from([
            "joblog",
            "record",
            "-c",
            "Acme",
            "-p",
            "Dev",
            "--description",
            "x",
            "--description-file",
            "y.txt",
        ]);
        assert!(result.is_err());
    }
}
