use std::fs;
use std::path::{Path, PathBuf};

use tracing::{Span, debug, error, info, info_span, warn};

use crate::error::JobLogError;
use crate::models::{JobRecord, to_json_pretty};

const RECORD_SUFFIX: &str = "job_description.json";

/// Lowercase with spaces turned into underscores, for folder and file names.
pub fn normalize(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

fn record_file_name(base_name: &str, index: usize) -> String {
    format!("{}_{:03}_{}", base_name, index, RECORD_SUFFIX)
}

/// Writes job records under `<root>/<company>/`.
///
/// Record files are numbered by scanning the company folder, so two writers
/// racing on the same folder (or files removed by hand) can produce the same
/// index twice.
pub struct RecordWriter {
    root: PathBuf,
    span: Span,
}

impl RecordWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let span = info_span!("records", root = %root.display());
        Self { root, span }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn company_folder(&self, company_name: &str) -> PathBuf {
        self.root.join(normalize(company_name))
    }

    pub fn ensure_company_folder(&self, company_name: &str) -> Result<PathBuf, JobLogError> {
        let _enter = self.span.enter();
        let folder = self.company_folder(company_name);
        fs::create_dir_all(&folder)?;
        debug!(folder = %folder.display(), "Company folder ready");
        Ok(folder)
    }

    pub fn next_available_filename(
        &self,
        directory: &Path,
        base_name: &str,
    ) -> Result<String, JobLogError> {
        let _enter = self.span.enter();
        let candidate = record_file_name(base_name, 1);
        if !directory.join(&candidate).exists() {
            return Ok(candidate);
        }

        debug!(
            file = %candidate,
            path = %directory.display(),
            "Job description file already exists"
        );

        let prefix = format!("{}_", base_name);
        let mut taken = 0;
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            if entry.path().is_file() && entry.file_name().to_string_lossy().starts_with(&prefix) {
                taken += 1;
            }
        }

        Ok(record_file_name(base_name, taken + 1))
    }

    pub fn write_record(&self, record: &JobRecord, path: &Path) -> Result<(), JobLogError> {
        let _enter = self.span.enter();
        let json = to_json_pretty(record)?;
        fs::write(path, json)?;
        debug!(path = %path.display(), "Wrote job record");
        Ok(())
    }

    /// Copy `source` into `destination_dir`, keeping its file name.
    ///
    /// A missing source is logged and skipped.
    pub fn copy_resume(&self, source: &Path, destination_dir: &Path) -> Result<(), JobLogError> {
        let _enter = self.span.enter();
        if !source.exists() {
            error!("Source file does not exist: {}", source.display());
            return Ok(());
        }

        let file_name = source.file_name().ok_or_else(|| {
            JobLogError::Validation(format!("Resume path has no file name: {}", source.display()))
        })?;
        let destination = destination_dir.join(file_name);
        if destination.exists() && fs::canonicalize(source)? == fs::canonicalize(&destination)? {
            debug!("Resume already in place: {}", destination.display());
            return Ok(());
        }
        fs::copy(source, &destination)?;

        debug!(
            "Copied file from {} to {}",
            source.display(),
            destination.display()
        );
        Ok(())
    }

    /// Save one application and return a message for the user. Never fails.
    pub fn log_job_applied_for(
        &self,
        company_name: &str,
        position: &str,
        job_description: &str,
        resume_used_path: Option<&Path>,
    ) -> String {
        let folder = match self.ensure_company_folder(company_name) {
            Ok(folder) => folder,
            Err(e) => return self.save_failed(&e),
        };

        let base_name = normalize(&format!("{}_{}", company_name, position));
        let file_name = match self.next_available_filename(&folder, &base_name) {
            Ok(name) => name,
            Err(e) => return self.save_failed(&e),
        };

        let record = JobRecord::new(company_name, position, job_description, resume_used_path);
        let mut msg = match self.write_record(&record, &folder.join(&file_name)) {
            Ok(()) => {
                let msg = format!(
                    "Job description saved!\nFile: {}\nPath: {}",
                    file_name,
                    folder.display()
                );
                let _enter = self.span.enter();
                info!("{}", msg);
                msg
            }
            Err(e) => self.save_failed(&e),
        };

        match resume_used_path {
            Some(resume) => {
                if let Err(e) = self.copy_resume(resume, &folder) {
                    let _enter = self.span.enter();
                    warn!("Failed to copy resume {}: {}", resume.display(), e);
                    msg.push_str(&format!("\nResume copy failed: {}", e));
                }
            }
            None => {
                let _enter = self.span.enter();
                debug!("No resume given, nothing to copy");
            }
        }

        msg
    }

    fn save_failed(&self, err: &JobLogError) -> String {
        let _enter = self.span.enter();
        let msg = format!("Failed to save job description file.\nError: {}", err);
        error!("{}", msg);
        msg
    }

    pub fn read_record(&self, path: &Path) -> Result<JobRecord, JobLogError> {
        let content = fs::read_to_string(path)
            .map_err(|e| JobLogError::Io(format!("{}: {}", path.display(), e)))?;
        let record = serde_json::from_str(&content)
            .map_err(|e| JobLogError::Json(format!("{}: {}", path.display(), e)))?;
        Ok(record)
    }

    /// All records saved for a company, ordered by file name.
    pub fn list_records(&self, company_name: &str) -> Result<Vec<(String, JobRecord)>, JobLogError> {
        let folder = self.company_folder(company_name);
        if !folder.is_dir() {
            return Ok(Vec::new());
        }

        let suffix = format!("_{}", RECORD_SUFFIX);
        let mut records = Vec::new();
        for entry in fs::read_dir(&folder)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(&suffix) || !entry.path().is_file() {
                continue;
            }
            match self.read_record(&entry.path()) {
                Ok(record) => records.push((name, record)),
                Err(e) => {
                    let _enter = self.span.enter();
                    warn!("Skipping unreadable record: {}", e);
                }
            }
        }

        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn writer() -> (TempDir, RecordWriter) {
        let dir = TempDir::new().unwrap();
        let writer = RecordWriter::new(dir.path().join("companies_applied_for"));
        (dir, writer)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("CD Project Red"), "cd_project_red");
        assert_eq!(normalize("already_fine"), "already_fine");
        assert_eq!(normalize("Two  Spaces"), "two__spaces");
    }

    #[test]
    fn test_ensure_company_folder_is_idempotent() {
        let (_dir, writer) = writer();
        let first = writer.ensure_company_folder("CD Project Red").unwrap();
        let second = writer.ensure_company_folder("CD Project Red").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, writer.root().join("cd_project_red"));
        assert!(first.is_dir());
    }

    #[test]
    fn test_first_filename_in_fresh_folder() {
        let (_dir, writer) = writer();
        let folder = writer.ensure_company_folder("Acme").unwrap();
        let name = writer.next_available_filename(&folder, "acme_dev").unwrap();
        assert_eq!(name, "acme_dev_001_job_description.json");
    }

    #[test]
    fn test_next_index_comes_from_live_scan() {
        let (_dir, writer) = writer();
        let folder = writer.ensure_company_folder("Acme").unwrap();
        for i in 1..=3 {
            fs::write(folder.join(record_file_name("acme_dev", i)), "{}").unwrap();
        }
        fs::remove_file(folder.join(record_file_name("acme_dev", 2))).unwrap();

        // Two matching files remain, so the scan lands on an index already in use.
        let name = writer.next_available_filename(&folder, "acme_dev").unwrap();
        assert_eq!(name, "acme_dev_003_job_description.json");
    }

    #[test]
    fn test_scan_ignores_other_prefixes_and_directories() {
        let (_dir, writer) = writer();
        let folder = writer.ensure_company_folder("Acme").unwrap();
        fs::write(folder.join(record_file_name("acme_dev", 1)), "{}").unwrap();
        fs::write(folder.join(record_file_name("acme_qa", 1)), "{}").unwrap();
        fs::write(folder.join("resume.pdf"), "pdf").unwrap();
        fs::create_dir(folder.join("acme_dev_notes")).unwrap();

        let name = writer.next_available_filename(&folder, "acme_dev").unwrap();
        assert_eq!(name, "acme_dev_002_job_description.json");
    }

    #[test]
    fn test_single_record_in_fresh_root() {
        let (_dir, writer) = writer();
        let msg = writer.log_job_applied_for(
            "CD Project Red",
            "Senior Gameplay Animator",
            "Animate NPCs",
            None,
        );
        assert!(msg.starts_with("Job description saved!"), "{}", msg);
        assert!(msg.contains("cd_project_red_senior_gameplay_animator_001_job_description.json"));

        let path = writer
            .root()
            .join("cd_project_red")
            .join("cd_project_red_senior_gameplay_animator_001_job_description.json");
        let record = writer.read_record(&path).unwrap();
        assert_eq!(record.company_name, "CD Project Red");
        assert_eq!(record.position, "Senior Gameplay Animator");
        assert_eq!(record.job_description, "Animate NPCs");
        assert_eq!(record.resume_used_path, "");
    }

    #[test]
    fn test_repeated_saves_get_increasing_indices() {
        let (_dir, writer) = writer();
        for i in 0..5 {
            let msg = writer.log_job_applied_for("Acme", "Dev", &format!("take {}", i), None);
            assert!(msg.starts_with("Job description saved!"), "{}", msg);
        }

        let records = writer.list_records("Acme").unwrap();
        let names: Vec<&str> = records.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "acme_dev_001_job_description.json",
                "acme_dev_002_job_description.json",
                "acme_dev_003_job_description.json",
                "acme_dev_004_job_description.json",
                "acme_dev_005_job_description.json",
            ]
        );
        for (i, (_, record)) in records.iter().enumerate() {
            assert_eq!(record.job_description, format!("take {}", i));
        }
    }

    #[test]
    fn test_missing_resume_does_not_block_save() {
        let (dir, writer) = writer();
        let missing = dir.path().join("nope.pdf");
        let msg = writer.log_job_applied_for("Acme", "Dev", "desc", Some(&missing));
        assert!(msg.starts_with("Job description saved!"), "{}", msg);
        assert!(!msg.contains("Resume copy failed"));

        let records = writer.list_records("Acme").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.resume_path(), Some(missing.as_path()));
    }

    #[test]
    fn test_resume_copied_next_to_record() {
        let (dir, writer) = writer();
        let resume = dir.path().join("mark_resume_2026.pdf");
        fs::write(&resume, b"%PDF-1.7 fake").unwrap();

        writer.log_job_applied_for("Acme", "Dev", "desc", Some(&resume));

        let copied = writer.company_folder("Acme").join("mark_resume_2026.pdf");
        assert_eq!(fs::read(copied).unwrap(), b"%PDF-1.7 fake");
        // the resume copy does not count as a record
        assert_eq!(writer.list_records("Acme").unwrap().len(), 1);
    }

    #[test]
    fn test_resume_already_in_company_folder_is_kept() {
        let (_dir, writer) = writer();
        let folder = writer.ensure_company_folder("Acme").unwrap();
        let resume = folder.join("resume.pdf");
        fs::write(&resume, b"%PDF precious").unwrap();

        let msg = writer.log_job_applied_for("Acme", "Dev", "desc", Some(&resume));
        assert!(msg.starts_with("Job description saved!"), "{}", msg);
        assert_eq!(fs::read(&resume).unwrap(), b"%PDF precious");
    }

    #[test]
    fn test_list_records_skips_unreadable_file() {
        let (_dir, writer) = writer();
        writer.log_job_applied_for("Acme", "Dev", "desc", None);
        let folder = writer.company_folder("Acme");
        fs::write(folder.join("notes_job_description.json"), "not json").unwrap();

        let records = writer.list_records("Acme").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "acme_dev_001_job_description.json");
    }

    #[test]
    fn test_unwritable_root_returns_failure_message() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();
        let writer = RecordWriter::new(&blocker);

        let msg = writer.log_job_applied_for("Acme", "Dev", "desc", None);
        assert!(msg.starts_with("Failed to save job description file.\nError: "), "{}", msg);
    }

    #[test]
    fn test_write_record_into_missing_dir_fails() {
        let (dir, writer) = writer();
        let record = JobRecord::new("Acme", "Dev", "desc", None);
        let err = writer
            .write_record(&record, &dir.path().join("missing").join("x.json"))
            .unwrap_err();
        assert!(matches!(err, JobLogError::Io(_)));
    }

    #[test]
    fn test_record_round_trip() {
        let (_dir, writer) = writer();
        let folder = writer.ensure_company_folder("Ubisoft Montréal").unwrap();
        let record = JobRecord::new(
            "Ubisoft Montréal",
            "Animateur",
            "Line one\nLine two \"quoted\"",
            Some(Path::new("resumes/cv.pdf")),
        );
        let path = folder.join("record.json");
        writer.write_record(&record, &path).unwrap();

        assert_eq!(writer.read_record(&path).unwrap(), record);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n    \"position_name\": \"Animateur\""));
    }

    #[test]
    fn test_copy_resume_missing_source_is_ok() {
        let (dir, writer) = writer();
        let result = writer.copy_resume(&dir.path().join("ghost.pdf"), dir.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_list_records_unknown_company_is_empty() {
        let (_dir, writer) = writer();
        assert!(writer.list_records("Nobody Inc").unwrap().is_empty());
    }
}
