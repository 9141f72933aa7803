use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::record::{ExtractionRecord, COLUMNS};
use crate::settings::WriteMode;

/// Tabular output file. Records are written in one batch per run.
pub struct CsvSink {
    path: PathBuf,
    mode: WriteMode,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, mode: WriteMode) -> Self {
        CsvSink {
            path: path.into(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append writes the header only into a new or empty file; overwrite always starts fresh.
    pub fn write(&self, records: &[ExtractionRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let has_content = fs::metadata(&self.path).map(|m| m.len() > 0).unwrap_or(false);
        let (file, write_header) = match self.mode {
            WriteMode::Append => {
                let file = OpenOptions::new().create(true).append(true).open(&self.path);
                (file, !has_content)
            }
            WriteMode::Overwrite => (fs::File::create(&self.path), true),
        };
        let file = file.with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut writer = csv::Writer::from_writer(file);
        if write_header {
            writer.write_record(COLUMNS)?;
        }
        for record in records {
            writer.write_record(record.to_row())?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}
