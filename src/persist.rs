//! On-disk encodings: JSONL for manifests and QA samples, pretty JSON for
//! reports, and the two-column annotation format.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::data::{ManifestRecord, QaAnnotation, QaSampleRecord};
use crate::drift::DriftReport;
use crate::errors::CorpusError;
use crate::qa::{QaReport, parse_annotations};
use crate::report::BuildReport;

fn create(path: &Path) -> Result<BufWriter<File>, CorpusError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Write one compact JSON object per line.
pub fn write_jsonl<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), CorpusError> {
    let mut writer = create(path.as_ref())?;
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a JSONL file, skipping blank lines.
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, CorpusError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line)?);
    }
    Ok(rows)
}

/// Write a single pretty-printed JSON document with a trailing newline.
pub fn write_json_pretty<T: Serialize>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), CorpusError> {
    let mut writer = create(path.as_ref())?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write the manifest as JSONL.
pub fn write_manifest(
    path: impl AsRef<Path>,
    manifest: &[ManifestRecord],
) -> Result<(), CorpusError> {
    write_jsonl(path, manifest)
}

/// Read a JSONL manifest.
pub fn read_manifest(path: impl AsRef<Path>) -> Result<Vec<ManifestRecord>, CorpusError> {
    read_jsonl(path)
}

/// Write the QA sample as JSONL.
pub fn write_qa_sample(
    path: impl AsRef<Path>,
    sample: &[QaSampleRecord],
) -> Result<(), CorpusError> {
    write_jsonl(path, sample)
}

/// Read a JSONL QA sample.
pub fn read_qa_sample(path: impl AsRef<Path>) -> Result<Vec<QaSampleRecord>, CorpusError> {
    read_jsonl(path)
}

/// Write a build report as pretty JSON.
pub fn write_report(path: impl AsRef<Path>, report: &BuildReport) -> Result<(), CorpusError> {
    write_json_pretty(path, report)
}

/// Load a build report; unreadable or malformed reports are evaluation errors.
pub fn read_report(path: impl AsRef<Path>) -> Result<BuildReport, CorpusError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| {
        CorpusError::Evaluation(format!("cannot read report {}: {err}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|err| {
        CorpusError::Evaluation(format!("malformed report {}: {err}", path.display()))
    })
}

/// Write a drift report as pretty JSON.
pub fn write_drift_report(path: impl AsRef<Path>, drift: &DriftReport) -> Result<(), CorpusError> {
    write_json_pretty(path, drift)
}

/// Write a QA report as pretty JSON.
pub fn write_qa_report(path: impl AsRef<Path>, report: &QaReport) -> Result<(), CorpusError> {
    write_json_pretty(path, report)
}

/// Read `record_id,actual_category` annotations from disk.
pub fn read_annotations(path: impl AsRef<Path>) -> Result<Vec<QaAnnotation>, CorpusError> {
    parse_annotations(&fs::read_to_string(path.as_ref())?)
}
