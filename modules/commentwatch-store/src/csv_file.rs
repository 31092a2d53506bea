use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Read every row of a headed CSV file. A missing file reads as empty.
///
/// Rows are matched to `T` by header name, so columns absent from older files
/// fall back to the field's serde default and unknown columns are ignored.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace `path` with `header` followed by `rows`.
///
/// Rows go to a temp file in the destination directory which is then renamed
/// over the target, so the old contents stay intact until the new file is
/// complete.
pub fn write_rows_atomic<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        writer.write_record(header).map_err(csv_err)?;
        for row in rows {
            writer.serialize(row).map_err(csv_err)?;
        }
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file_mut().sync_all().map_err(io_err)?;

    tmp.persist(path).map_err(|e| StoreError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "Store rewritten");
    Ok(())
}
