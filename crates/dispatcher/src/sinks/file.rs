//! FileSink - appends one JSON array line per batch

use contracts::{Batch, ContractError, RecordSink, SendReport};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Sink that writes batches to a JSON-lines file (offline runs)
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
    lines_written: u64,
}

impl FileSink {
    /// Open `path` for appending, creating parent directories
    pub fn create(name: impl Into<String>, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: BufWriter::new(file),
            lines_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_batch(&mut self, batch: &Batch) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, &batch.records)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn persist_batch(&mut self, batch: &Batch) -> Result<(), ContractError> {
        self.write_batch(batch).map_err(|e| {
            error!(sink = %self.name, batch = batch.sequence, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl RecordSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_send",
        skip(self, batch),
        fields(sink = %self.name, batch = batch.sequence)
    )]
    async fn send(&mut self, batch: &Batch) -> Result<SendReport, ContractError> {
        if batch.is_empty() {
            return Ok(SendReport::accepted(0));
        }
        self.persist_batch(batch)?;
        self.lines_written += 1;
        Ok(SendReport::accepted(batch.len()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, path = %self.path.display(), lines = self.lines_written, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GeneratorConfig, TelemetryRecord};
    use generator::TelemetryGenerator;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("telemetry.jsonl");
        let mut generator = TelemetryGenerator::new(&GeneratorConfig::default());

        let mut sink = FileSink::create("test_file", &path).unwrap();
        sink.send(&Batch::new(1, generator.generate(3, "run"))).await.unwrap();
        sink.send(&Batch::new(2, Vec::new())).await.unwrap();
        sink.send(&Batch::new(3, generator.generate(2, "run"))).await.unwrap();
        sink.close().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Vec<TelemetryRecord> = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|r| r.id.ends_with("-run")));
    }
}
