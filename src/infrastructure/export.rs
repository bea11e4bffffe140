use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::domain::ArchiveRequest;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    plate_number: &'a str,
    status: &'a str,
    action_type: &'a str,
    note: &'a str,
    reject_reason: &'a str,
}

pub struct CsvExporter;

impl CsvExporter {
    /// Writes `requests` to `path` as CSV with a header row.
    ///
    /// Returns the number of data rows written.
    pub fn export_requests(requests: &[ArchiveRequest], path: impl AsRef<Path>) -> Result<usize, ExportError> {
        let mut writer = csv::Writer::from_path(path)?;
        for request in requests {
            writer.serialize(CsvRow {
                id: &request.id,
                plate_number: &request.plate_number,
                status: request.action_taken.label(),
                action_type: request.action_type.label(),
                note: &request.note,
                reject_reason: request.reject_reason().unwrap_or(""),
            })?;
        }
        writer.flush()?;
        Ok(requests.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArchiveAction, ArchiveType};
    use std::fs;
    use tempfile::tempdir;

    fn sample(id: &str, action: ArchiveAction, reason: Option<&str>) -> ArchiveRequest {
        ArchiveRequest {
            id: id.to_string(),
            plate_number: format!("AB {}", id),
            action_taken: action,
            action_type: ArchiveType::SendFile,
            note: "gate 3, lane 2".to_string(),
            reject_reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("completed.csv");
        let requests = vec![
            sample("1", ArchiveAction::Approved, None),
            sample("2", ArchiveAction::Rejected, Some("blurred")),
        ];

        let rows = CsvExporter::export_requests(&requests, &path).unwrap();
        assert_eq!(rows, 2);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "id,plate_number,status,action_type,note,reject_reason");
        assert_eq!(lines[1], "1,AB 1,Approved,Send file,\"gate 3, lane 2\",");
        assert_eq!(lines[2], "2,AB 2,Rejected,Send file,\"gate 3, lane 2\",blurred");
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(CsvExporter::export_requests(&[], &path).is_err());
    }
}
