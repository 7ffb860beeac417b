//! Gzip-compressed NDJSON archive of [`UnifiedRecord`]s.
//!
//! Lines are joined with `\n` and carry no trailing newline. The gzip header
//! is written with a zero mtime and no file name, so identical records
//! always produce identical bytes.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};

use crate::error::ScraperError;
use crate::events::EventSink;
use crate::types::UnifiedRecord;

const COMPONENT: &str = "Archiver";

/// Serialize `records` as NDJSON and gzip the result.
///
/// # Errors
///
/// Returns [`ScraperError::Serialize`] if a record cannot be encoded and
/// [`ScraperError::Io`] if compression fails.
pub fn encode_ndjson_gz(records: &[UnifiedRecord]) -> Result<Vec<u8>, ScraperError> {
    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ScraperError::Serialize)?;
    let ndjson = lines.join("\n");

    let io_err = |source| ScraperError::Io {
        path: "<gzip stream>".to_string(),
        source,
    };
    let mut encoder: GzEncoder<Vec<u8>> = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::default());
    encoder.write_all(ndjson.as_bytes()).map_err(io_err)?;
    encoder.finish().map_err(io_err)
}

/// Write `records` to `path` as gzip-compressed NDJSON, replacing any
/// existing file. Returns the path written.
///
/// # Errors
///
/// Returns [`ScraperError`] if encoding or the filesystem write fails.
pub async fn write_archive(
    records: &[UnifiedRecord],
    path: &Path,
    sink: &dyn EventSink,
) -> Result<PathBuf, ScraperError> {
    sink.info(
        COMPONENT,
        "write",
        serde_json::json!({ "path": path.display().to_string(), "records": records.len() }),
        "Archive write initiated",
    );

    let result = async {
        let bytes = encode_ndjson_gz(records)?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| ScraperError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok::<usize, ScraperError>(bytes.len())
    }
    .await;

    match result {
        Ok(bytes) => {
            sink.info(
                COMPONENT,
                "write",
                serde_json::json!({ "path": path.display().to_string(), "bytes": bytes }),
                "Archive write completed",
            );
            Ok(path.to_path_buf())
        }
        Err(e) => {
            sink.error(
                COMPONENT,
                "write",
                serde_json::json!({ "path": path.display().to_string(), "error": e.to_string() }),
                "Error occurred while writing archive",
            );
            Err(e)
        }
    }
}

/// Read an archive written by [`write_archive`].
///
/// # Errors
///
/// Returns [`ScraperError::Io`] if the file cannot be read or decompressed
/// and [`ScraperError::Deserialize`] if a line is not a valid record.
pub async fn read_archive(path: &Path) -> Result<Vec<UnifiedRecord>, ScraperError> {
    let io_err = |source| ScraperError::Io {
        path: path.display().to_string(),
        source,
    };

    let compressed = tokio::fs::read(path).await.map_err(io_err)?;
    let mut ndjson = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut ndjson)
        .map_err(io_err)?;

    decode_ndjson(&ndjson)
}

fn decode_ndjson(ndjson: &str) -> Result<Vec<UnifiedRecord>, ScraperError> {
    ndjson
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| ScraperError::Deserialize {
                context: format!("archive line {}", index + 1),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_list_encodes_to_empty_payload() {
        let bytes = encode_ndjson_gz(&[]).unwrap();
        let mut out = String::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_string(&mut out)
            .unwrap();
        assert!(out.is_empty());
        assert!(decode_ndjson(&out).unwrap().is_empty());
    }

    #[test]
    fn gzip_header_has_zero_mtime() {
        let bytes = encode_ndjson_gz(&[]).unwrap();
        // Bytes 4..8 of a gzip member hold MTIME, little endian.
        assert_eq!(&bytes[0..2], &[0x1f, 0x8b]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn invalid_line_reports_its_number() {
        let err = decode_ndjson("{\"id\":null}\nnot json").unwrap_err();
        assert!(
            matches!(err, ScraperError::Deserialize { ref context, .. } if context == "archive line 2"),
            "unexpected error: {err:?}"
        );
    }
}
