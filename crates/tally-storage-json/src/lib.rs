//! tally-storage-json
//!
//! Filesystem-backed JSON implementation of [`CompanyStore`]. One file per
//! company, written through a temp file and renamed into place. The previous
//! version of a company is copied into a per-company backup folder before it
//! is overwritten.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tally_core::{company_warnings, CompanyStore, CoreError};
use tally_domain::Company;
use tracing::{debug, warn};
use uuid::Uuid;

const FILE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Directories used by [`JsonCompanyStore`].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub company_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    pub fn under(base: &Path) -> Self {
        Self {
            company_root: base.join("companies"),
            backup_root: base.join("backups"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub company_id: Uuid,
    pub file_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct JsonCompanyStore {
    paths: StoragePaths,
    retention: usize,
}

impl JsonCompanyStore {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.company_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
        })
    }

    pub fn company_path(&self, id: Uuid) -> PathBuf {
        self.paths
            .company_root
            .join(format!("{}.{}", id, FILE_EXTENSION))
    }

    fn backup_dir(&self, id: Uuid) -> PathBuf {
        self.paths.backup_root.join(id.to_string())
    }

    /// Lists backups of a company, newest first.
    pub fn list_backups(&self, id: Uuid) -> Result<Vec<BackupInfo>, CoreError> {
        let dir = self.backup_dir(id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(BackupInfo {
                    company_id: id,
                    file_name: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| Reverse(info.created_at));
        Ok(entries)
    }

    /// Replaces the stored company with the contents of a backup.
    pub fn restore_backup(&self, backup: &BackupInfo) -> Result<Company, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.file_name
            )));
        }
        let company = read_company(&backup.path)?;
        self.save(&company)?;
        Ok(company)
    }

    fn backup_existing_file(&self, id: Uuid, path: &Path) -> Result<(), CoreError> {
        self.backup_existing_file_at(id, path, Utc::now())
    }

    /// Copies `path` into the backup folder, moving past names already taken.
    fn backup_existing_file_at(
        &self,
        id: Uuid,
        path: &Path,
        mut stamp: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(id);
        fs::create_dir_all(&dir)?;
        let mut backup_path = backup_file(&dir, id, stamp);
        while backup_path.exists() {
            stamp += Duration::milliseconds(1);
            backup_path = backup_file(&dir, id, stamp);
        }
        fs::copy(path, &backup_path)?;
        self.prune_backups(id)
    }

    fn prune_backups(&self, id: Uuid) -> Result<(), CoreError> {
        for stale in self.list_backups(id)?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&stale.path) {
                warn!(path = %stale.path.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl CompanyStore for JsonCompanyStore {
    fn load(&self, id: Uuid) -> Result<Option<Company>, CoreError> {
        let path = self.company_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let company = read_company(&path)?;
        for warning in company_warnings(&company) {
            warn!(company = %id, "{warning}");
        }
        Ok(Some(company))
    }

    fn save(&self, company: &Company) -> Result<(), CoreError> {
        let path = self.company_path(company.id);
        self.backup_existing_file(company.id, &path)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &serialize_company(company)?)?;
        fs::rename(&tmp, &path)?;
        debug!(company = %company.id, path = %path.display(), "company saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<Uuid>, CoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.paths.company_root)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION)
            {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| Uuid::parse_str(stem).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        let path = self.company_path(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn read_company(path: &Path) -> Result<Company, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

fn serialize_company(company: &Company) -> Result<String, CoreError> {
    serde_json::to_string_pretty(company).map_err(|err| CoreError::Serde(err.to_string()))
}

fn backup_file(dir: &Path, id: Uuid, stamp: DateTime<Utc>) -> PathBuf {
    let timestamp = stamp.format(BACKUP_TIMESTAMP_FORMAT);
    dir.join(format!("{}_{}.{}", id, timestamp, FILE_EXTENSION))
}

/// Reads the timestamp out of `<id>_<yyyymmdd>_<hhmmss[mmm]>.json`.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", FILE_EXTENSION))?;
    let mut segments = trimmed.rsplitn(3, '_');
    let time = segments.next()?;
    let date = segments.next()?;
    if !is_digits(date, 8) {
        return None;
    }
    let pattern = if is_digits(time, 9) {
        "%Y%m%d%H%M%S%3f"
    } else if is_digits(time, 6) {
        "%Y%m%d%H%M%S"
    } else {
        return None;
    };
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), pattern)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
