//! Library-level tests for domain validation and authentication primitives.
//!
//! These exercise the pure parts of the crate without a database: closed
//! enums, request validation, password hashing, and session tokens.

use hwtt_lib::auth::{hash_password, verify_password};
use hwtt_lib::db::sessions::{generate_token, hash_token};
use hwtt_lib::models::{
    ArtifactKind, CreateMeasurementRequest, CreateResultRequest, InputFileType, RatingClass,
    RunStatus, UpdateResultRequest,
};
use uuid::Uuid;

#[test]
fn run_status_codes_are_closed() {
    assert_eq!(RunStatus::Pending.code(), 1);
    assert_eq!(RunStatus::Running.code(), 2);
    assert_eq!(RunStatus::Completed.code(), 3);
    assert_eq!(RunStatus::Failed.code(), 4);
    assert_eq!(RunStatus::from_code(0), None);
    assert_eq!(RunStatus::from_code(5), None);
}

#[test]
fn rating_classification_codes_are_closed() {
    assert_eq!(RatingClass::Excellent.code(), 1);
    assert_eq!(RatingClass::Good.code(), 2);
    assert_eq!(RatingClass::Fair.code(), 3);
    assert_eq!(RatingClass::Poor.code(), 4);
    assert_eq!(RatingClass::from_code(0), None);
    assert_eq!(RatingClass::from_code(5), None);
    assert_eq!(RatingClass::parse("terrible"), None);
}

#[test]
fn file_type_and_artifact_kind_reject_unknown_values() {
    assert_eq!(InputFileType::parse("csv"), Some(InputFileType::Csv));
    assert_eq!(InputFileType::parse("tsv"), None);
    assert_eq!(ArtifactKind::parse("image"), Some(ArtifactKind::Image));
    assert_eq!(ArtifactKind::parse("pdf"), None);
}

fn valid_result_request() -> CreateResultRequest {
    CreateResultRequest {
        test_run_id: Uuid::now_v7(),
        passes_total: 20000,
        rut_depth_5000: 2.1,
        rut_depth_10000: 3.4,
        rut_depth_15000: 4.2,
        rut_depth_20000: 4.9,
        rut_depth_final: Some(4.9),
        passes_to_failure: None,
        inflection_pass: Some(12000),
        test_duration_ms: 3_600_000,
        rating: 87.5,
        rating_classification: RatingClass::Good,
    }
}

#[test]
fn result_request_accepts_valid_input() {
    assert!(valid_result_request().validate().is_ok());
}

#[test]
fn result_request_rejects_negative_depths() {
    let mut req = valid_result_request();
    req.rut_depth_10000 = -0.5;
    assert!(req.validate().is_err());

    let mut req = valid_result_request();
    req.passes_total = -1;
    assert!(req.validate().is_err());
}

#[test]
fn result_update_rejects_negative_duration() {
    let update = UpdateResultRequest {
        passes_total: None,
        rut_depth_5000: None,
        rut_depth_10000: None,
        rut_depth_15000: None,
        rut_depth_20000: None,
        rut_depth_final: None,
        passes_to_failure: None,
        inflection_pass: None,
        test_duration_ms: Some(-1),
        rating: None,
        rating_classification: None,
    };
    assert!(update.validate().is_err());
}

#[test]
fn measurement_request_rejects_negative_values() {
    let req = CreateMeasurementRequest {
        test_run_id: Uuid::now_v7(),
        pass_count: -1,
        rut_depth_mm: 1.0,
        ref_depth_mm: None,
    };
    assert!(req.validate().is_err());

    let req = CreateMeasurementRequest {
        test_run_id: Uuid::now_v7(),
        pass_count: 100,
        rut_depth_mm: f64::NAN,
        ref_depth_mm: None,
    };
    assert!(req.validate().is_err());
}

#[test]
fn password_hashing_round_trips() {
    let encoded = hash_password("correct horse battery staple");
    assert!(encoded.starts_with("pbkdf2_sha256$"));
    assert!(verify_password("correct horse battery staple", &encoded));
    assert!(!verify_password("wrong password", &encoded));
}

#[test]
fn password_hashes_are_salted() {
    let a = hash_password("same password");
    let b = hash_password("same password");
    assert_ne!(a, b);
}

#[test]
fn verify_rejects_malformed_encodings() {
    assert!(!verify_password("anything", ""));
    assert!(!verify_password("anything", "md5$deadbeef$cafe"));
    assert!(!verify_password("anything", "pbkdf2_sha256$notanumber$aa$bb"));
}

#[test]
fn session_tokens_are_unique_and_hash_deterministically() {
    let a = generate_token();
    let b = generate_token();
    assert!(a.starts_with("hwtt_sess_"));
    assert_ne!(a, b);
    assert_eq!(hash_token(&a), hash_token(&a));
    assert_ne!(hash_token(&a), hash_token(&b));
}
