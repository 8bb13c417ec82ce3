//! Test run submission: multipart form with the raw test data file.
//!
//! `POST /api/v1/runs` accepts the new-test form (specimen, binder grade,
//! file type, allowed rut depth, optional notes) plus exactly one data
//! file. The file is streamed to a temp path first; nothing is persisted
//! unless every field validates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::SessionAuth;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{CreateRunInput, InputFileType, RunStatus, RunSummary};

/// Maximum size for a single text field in the form.
const MAX_TEXT_FIELD_SIZE: usize = 4096;

/// Configure upload routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_run);
}

/// A file streamed to a temp path during multipart processing.
struct StreamedFile {
    filename: String,
    temp_path: PathBuf,
    size: usize,
}

/// Parsed multipart form: text fields plus the single data file.
struct ParsedForm {
    fields: HashMap<String, String>,
    file: Option<StreamedFile>,
}

/// Submit a new test run.
///
/// Server-assigned on success: status=pending, analysis_version=1, owner =
/// the authenticated caller. Validation failures report 400 and persist
/// nothing.
#[utoipa::path(
    post,
    path = "/api/v1/runs",
    tag = "Runs",
    responses(
        (status = 201, description = "Test run created", body = RunSummary),
        (status = 400, description = "Validation failure", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 413, description = "Data file too large", body = crate::error::ErrorResponse),
    )
)]
#[post("/runs")]
pub async fn create_run(
    auth: SessionAuth,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let temp_dir = config.data_dir.join(".upload_temp");
    tokio::fs::create_dir_all(&temp_dir)
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to create temp directory: {}", e)))?;

    let parsed = match parse_form(&mut payload, &temp_dir, config.max_upload_size).await {
        Ok(parsed) => parsed,
        Err(e) => return Err(e),
    };

    // Validate before touching the database. The temp file is removed on
    // every failure path.
    let outcome = validate_form(&parsed);
    let (input, file) = match outcome {
        Ok(ok) => ok,
        Err(e) => {
            if let Some(ref file) = parsed.file {
                let _ = tokio::fs::remove_file(&file.temp_path).await;
            }
            return Err(e);
        }
    };

    // Time-ordered ID; also names the storage directory for the data file.
    let run_id = Uuid::now_v7();
    let relative_path = format!("runs/{}/{}", run_id, file.filename);
    let final_path = config.data_dir.join(&relative_path);

    if let Some(parent) = final_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to create run directory: {}", e)))?;
    }

    tokio::fs::rename(&file.temp_path, &final_path)
        .await
        .map_err(|e| AppError::FileSystem(format!("Failed to store data file: {}", e)))?;

    let run = match pool.insert_run(run_id, auth.user.id, &input, &relative_path).await {
        Ok(run) => run,
        Err(e) => {
            // Do not leave an orphaned file behind a failed insert.
            let _ = tokio::fs::remove_file(&final_path).await;
            return Err(e);
        }
    };

    info!(
        "Test run created: id={}, user={}, specimen={}, status={}, file={} ({} bytes)",
        run.id,
        auth.user.username,
        run.specimen,
        RunStatus::Pending,
        file.filename,
        file.size
    );

    Ok(HttpResponse::Created().json(RunSummary::from(run)))
}

/// Stream the multipart form: collect text fields, stream the data file
/// to a temp path, enforcing the upload size limit as bytes arrive.
///
/// Any streamed temp file is removed on every error return, so a failed
/// request leaves nothing behind in the temp directory.
async fn parse_form(
    payload: &mut Multipart,
    temp_dir: &Path,
    max_upload_size: usize,
) -> AppResult<ParsedForm> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut file: Option<StreamedFile> = None;

    match read_form(payload, temp_dir, max_upload_size, &mut fields, &mut file).await {
        Ok(()) => Ok(ParsedForm { fields, file }),
        Err(e) => {
            cleanup_partial(&file).await;
            Err(e)
        }
    }
}

/// Inner multipart loop. The current in-flight file is cleaned up locally;
/// a completed earlier file lands in `file` and is cleaned by the caller.
async fn read_form(
    payload: &mut Multipart,
    temp_dir: &Path,
    max_upload_size: usize,
    fields: &mut HashMap<String, String>,
    file: &mut Option<StreamedFile>,
) -> AppResult<()> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let content_disposition = field
            .content_disposition()
            .ok_or_else(|| AppError::InvalidInput("Missing content disposition".to_string()))?;

        let field_name = content_disposition
            .get_name()
            .unwrap_or_default()
            .to_string();
        let filename = content_disposition
            .get_filename()
            .map(|name| name.replace('\\', "/"));

        match filename {
            None => {
                // Plain text field
                let mut value = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk =
                        chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
                    if value.len() + chunk.len() > MAX_TEXT_FIELD_SIZE {
                        return Err(AppError::InvalidInput(format!(
                            "Field '{}' is too long",
                            field_name
                        )));
                    }
                    value.extend_from_slice(&chunk);
                }
                let value = String::from_utf8(value).map_err(|_| {
                    AppError::InvalidInput(format!("Field '{}' is not valid UTF-8", field_name))
                })?;
                fields.insert(field_name, value);
            }
            Some(filename) => {
                if field_name != "file" {
                    return Err(AppError::InvalidInput(format!(
                        "Unexpected file field '{}'",
                        field_name
                    )));
                }
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Exactly one data file is expected".to_string(),
                    ));
                }

                // Strip any client-supplied directories, then reject
                // anything that still looks like a path.
                let basename = filename.rsplit('/').next().unwrap_or_default().to_string();
                if basename.is_empty() || basename.contains("..") {
                    return Err(AppError::InvalidInput(
                        "Invalid data file name".to_string(),
                    ));
                }

                let temp_path = temp_dir.join(format!("upload_{}", Uuid::new_v4()));
                let mut temp_file = tokio::fs::File::create(&temp_path)
                    .await
                    .map_err(|e| {
                        AppError::FileSystem(format!("Failed to create temp file: {}", e))
                    })?;

                let mut size: usize = 0;
                while let Some(chunk) = field.next().await {
                    let outcome = match chunk {
                        Ok(chunk) => {
                            size += chunk.len();
                            if size > max_upload_size {
                                Err(AppError::PayloadTooLarge(format!(
                                    "Data file exceeds the {} byte limit",
                                    max_upload_size
                                )))
                            } else {
                                temp_file.write_all(&chunk).await.map_err(|e| {
                                    AppError::FileSystem(format!(
                                        "Failed to write temp file: {}",
                                        e
                                    ))
                                })
                            }
                        }
                        Err(e) => Err(AppError::InvalidInput(format!("Read error: {}", e))),
                    };

                    if let Err(e) = outcome {
                        drop(temp_file);
                        let _ = tokio::fs::remove_file(&temp_path).await;
                        return Err(e);
                    }
                }
                temp_file.flush().await.ok();

                *file = Some(StreamedFile {
                    filename: basename,
                    temp_path,
                    size,
                });
            }
        }
    }

    Ok(())
}

/// Remove a partially streamed file after a later field failed.
async fn cleanup_partial(file: &Option<StreamedFile>) {
    if let Some(file) = file {
        if let Err(e) = tokio::fs::remove_file(&file.temp_path).await {
            warn!("Failed to remove temp upload: {}", e);
        }
    }
}

/// Check required fields, numeric constraints, and that the file extension
/// matches the declared input file type.
fn validate_form(parsed: &ParsedForm) -> AppResult<(CreateRunInput, &StreamedFile)> {
    let get = |name: &str| parsed.fields.get(name).map(|s| s.trim().to_string());

    let specimen = get("specimen")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidInput("specimen is required".to_string()))?;

    let binder_grade = get("binder_grade")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidInput("binder_grade is required".to_string()))?;

    let file_type = get("file_type")
        .ok_or_else(|| AppError::InvalidInput("file_type is required".to_string()))
        .and_then(|s| {
            InputFileType::parse(&s)
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown file_type '{}'", s)))
        })?;

    let allowed_rut_depth = get("allowed_rut_depth")
        .ok_or_else(|| AppError::InvalidInput("allowed_rut_depth is required".to_string()))
        .and_then(|s| {
            s.parse::<f64>().map_err(|_| {
                AppError::InvalidInput("allowed_rut_depth must be a number".to_string())
            })
        })?;

    let notes = get("notes").filter(|s| !s.is_empty());

    let input = CreateRunInput {
        specimen,
        binder_grade,
        file_type,
        allowed_rut_depth,
        notes,
    };
    input.validate()?;

    let file = parsed
        .file
        .as_ref()
        .ok_or_else(|| AppError::InvalidInput("A data file is required".to_string()))?;

    let expected = format!(".{}", input.file_type.extension());
    if !file.filename.to_lowercase().ends_with(&expected) {
        return Err(AppError::InvalidInput(format!(
            "Data file must have a '{}' extension for file_type '{}'",
            expected, input.file_type
        )));
    }

    Ok((input, file))
}

#[cfg(test)]
mod tests {
    use actix_web::error::PayloadError;
    use actix_web::http::header::{HeaderMap, HeaderValue};
    use actix_web::web::Bytes;
    use futures_util::stream;

    use super::*;

    fn form(fields: &[(&str, &str)], filename: Option<&str>) -> ParsedForm {
        ParsedForm {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: filename.map(|name| StreamedFile {
                filename: name.to_string(),
                temp_path: PathBuf::from("/tmp/unused"),
                size: 42,
            }),
        }
    }

    const VALID_FIELDS: &[(&str, &str)] = &[
        ("specimen", "S1"),
        ("binder_grade", "PG64-22"),
        ("file_type", "csv"),
        ("allowed_rut_depth", "6.0"),
    ];

    #[test]
    fn test_validate_accepts_complete_form() {
        let parsed = form(VALID_FIELDS, Some("sample.csv"));
        let (input, file) = validate_form(&parsed).unwrap();
        assert_eq!(input.specimen, "S1");
        assert_eq!(input.binder_grade, "PG64-22");
        assert_eq!(input.file_type, InputFileType::Csv);
        assert_eq!(input.allowed_rut_depth, 6.0);
        assert_eq!(file.filename, "sample.csv");
    }

    #[test]
    fn test_validate_rejects_negative_rut_depth() {
        let parsed = form(
            &[
                ("specimen", "S1"),
                ("binder_grade", "PG64-22"),
                ("file_type", "csv"),
                ("allowed_rut_depth", "-2.5"),
            ],
            Some("sample.csv"),
        );
        assert!(validate_form(&parsed).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_specimen() {
        let parsed = form(
            &[
                ("binder_grade", "PG64-22"),
                ("file_type", "csv"),
                ("allowed_rut_depth", "6.0"),
            ],
            Some("sample.csv"),
        );
        assert!(validate_form(&parsed).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_file() {
        let parsed = form(VALID_FIELDS, None);
        assert!(validate_form(&parsed).is_err());
    }

    #[test]
    fn test_validate_rejects_extension_mismatch() {
        let parsed = form(VALID_FIELDS, Some("sample.xlsx"));
        assert!(validate_form(&parsed).is_err());
    }

    #[actix_rt::test]
    async fn test_cleanup_partial_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = dir.path().join("upload_partial");
        tokio::fs::write(&temp_path, b"partial data").await.unwrap();

        let file = Some(StreamedFile {
            filename: "sample.csv".to_string(),
            temp_path: temp_path.clone(),
            size: 12,
        });
        cleanup_partial(&file).await;

        assert!(!temp_path.exists());
    }

    #[test]
    fn test_validate_rejects_unknown_file_type() {
        let parsed = form(
            &[
                ("specimen", "S1"),
                ("binder_grade", "PG64-22"),
                ("file_type", "parquet"),
                ("allowed_rut_depth", "6.0"),
            ],
            Some("sample.parquet"),
        );
        assert!(validate_form(&parsed).is_err());
    }

    const BOUNDARY: &str = "hwtt-form-boundary";

    fn multipart_from(chunks: Vec<Result<Bytes, PayloadError>>) -> Multipart {
        let mut headers = HeaderMap::new();
        headers.insert(
            actix_web::http::header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=hwtt-form-boundary"),
        );
        Multipart::new(&headers, stream::iter(chunks))
    }

    fn file_part(filename: &str, content: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n"
        )
        .into_bytes();
        part.extend_from_slice(content);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn text_part(name: &str, value: &[u8]) -> Vec<u8> {
        let mut part =
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                .into_bytes();
        part.extend_from_slice(value);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn closing() -> Vec<u8> {
        format!("--{BOUNDARY}--\r\n").into_bytes()
    }

    #[actix_rt::test]
    async fn test_parse_form_streams_file_and_fields() {
        let dir = tempfile::tempdir().unwrap();

        let mut body = file_part("sample.csv", b"pass,depth\n50,0.8\n");
        body.extend_from_slice(&text_part("specimen", b"S1"));
        body.extend_from_slice(&closing());

        let mut payload = multipart_from(vec![Ok(Bytes::from(body))]);
        let parsed = parse_form(&mut payload, dir.path(), 1024).await.unwrap();

        assert_eq!(parsed.fields.get("specimen").map(String::as_str), Some("S1"));
        let file = parsed.file.unwrap();
        assert_eq!(file.filename, "sample.csv");
        let stored = tokio::fs::read(&file.temp_path).await.unwrap();
        assert_eq!(stored, b"pass,depth\n50,0.8\n");
    }

    #[actix_rt::test]
    async fn test_parse_form_removes_temp_file_when_later_field_is_invalid() {
        let dir = tempfile::tempdir().unwrap();

        // A fully streamed file followed by a notes field that is not UTF-8.
        let mut body = file_part("sample.csv", b"pass,depth\n50,0.8\n");
        body.extend_from_slice(&text_part("notes", &[0xff, 0xfe, 0xfd]));
        body.extend_from_slice(&closing());

        let mut payload = multipart_from(vec![Ok(Bytes::from(body))]);
        let result = parse_form(&mut payload, dir.path(), 1024).await;
        assert!(result.is_err());

        let mut entries = std::fs::read_dir(dir.path()).unwrap();
        assert!(entries.next().is_none(), "temp upload left behind");
    }

    #[actix_rt::test]
    async fn test_parse_form_removes_temp_file_on_mid_file_stream_error() {
        let dir = tempfile::tempdir().unwrap();

        // The connection drops mid-file.
        let head = file_part("sample.csv", b"pass,depth\n50,0.8\n");
        let mut payload = multipart_from(vec![
            Ok(Bytes::from(head[..head.len() - 2].to_vec())),
            Err(PayloadError::Incomplete(None)),
        ]);

        let result = parse_form(&mut payload, dir.path(), 1024).await;
        assert!(result.is_err());

        let mut entries = std::fs::read_dir(dir.path()).unwrap();
        assert!(entries.next().is_none(), "temp upload left behind");
    }
}
