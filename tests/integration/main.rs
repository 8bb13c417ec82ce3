//! Database-backed integration tests.
//!
//! These run against a real PostgreSQL instance and are skipped unless
//! `DATABASE_URL` is set and reachable, so the default test run stays
//! hermetic. Each test creates its own user and runs, and hard-deletes
//! them at the end.

use hwtt_lib::db::{DbPool, users};
use hwtt_lib::error::AppError;
use hwtt_lib::migration::Migrator;
use hwtt_lib::models::{
    ArtifactKind, CreateArtifactRequest, CreateMeasurementRequest, CreateResultRequest,
    CreateRunInput, InputFileType, RatingClass, RunStatus, UserRole,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

async fn connect() -> Option<DbPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = DbPool::connect(&url).await.ok()?;
    Migrator::up(pool.connection(), None).await.ok()?;
    Some(pool)
}

fn run_input() -> CreateRunInput {
    CreateRunInput {
        specimen: "S1".to_string(),
        binder_grade: "PG64-22".to_string(),
        file_type: InputFileType::Csv,
        allowed_rut_depth: 6.0,
        notes: None,
    }
}

fn result_request(run_id: Uuid) -> CreateResultRequest {
    CreateResultRequest {
        test_run_id: run_id,
        passes_total: 20000,
        rut_depth_5000: 1.1,
        rut_depth_10000: 1.9,
        rut_depth_15000: 2.6,
        rut_depth_20000: 3.2,
        rut_depth_final: Some(3.2),
        passes_to_failure: None,
        inflection_pass: Some(12000),
        test_duration_ms: 7_200_000,
        rating: 82.5,
        rating_classification: RatingClass::Good,
    }
}

#[actix_rt::test]
async fn measurements_are_ordered_by_pass_count() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set or unreachable");
        return;
    };

    let suffix = Uuid::new_v4().simple().to_string();
    let user = users::insert(
        pool.connection(),
        &format!("it-order-{}", suffix),
        "not-a-real-hash",
        None,
        None,
        UserRole::Member,
    )
    .await
    .unwrap();

    let run_id = Uuid::now_v7();
    let run = pool
        .insert_run(run_id, user.id, &run_input(), "runs/it/sample.csv")
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Pending.code());
    assert_eq!(run.analysis_version, 1);

    // Inserted out of order on purpose.
    for (pass, depth) in [(100, 1.2), (50, 0.8)] {
        pool.insert_measurement(&CreateMeasurementRequest {
            test_run_id: run_id,
            pass_count: pass,
            rut_depth_mm: depth,
            ref_depth_mm: None,
        })
        .await
        .unwrap();
    }

    let measurements = pool.list_measurements_for_run(run_id).await.unwrap();
    let passes: Vec<i32> = measurements.iter().map(|m| m.pass_count).collect();
    assert_eq!(passes, vec![50, 100]);

    assert!(pool.delete_run(run_id).await.unwrap());
}

#[actix_rt::test]
async fn deleting_a_run_cascades_to_results_measurements_and_artifacts() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set or unreachable");
        return;
    };

    let suffix = Uuid::new_v4().simple().to_string();
    let user = users::insert(
        pool.connection(),
        &format!("it-cascade-{}", suffix),
        "not-a-real-hash",
        None,
        None,
        UserRole::Member,
    )
    .await
    .unwrap();

    let run_id = Uuid::now_v7();
    pool.insert_run(run_id, user.id, &run_input(), "runs/it/sample.csv")
        .await
        .unwrap();

    pool.insert_measurement(&CreateMeasurementRequest {
        test_run_id: run_id,
        pass_count: 50,
        rut_depth_mm: 0.8,
        ref_depth_mm: None,
    })
    .await
    .unwrap();

    let result = pool.insert_result(&result_request(run_id)).await.unwrap();

    let artifact = pool
        .insert_artifact(&CreateArtifactRequest {
            test_result_id: result.id,
            kind: ArtifactKind::Report,
            path: "reports/summary.pdf".to_string(),
        })
        .await
        .unwrap();

    assert!(pool.delete_run(run_id).await.unwrap());

    assert!(pool.get_result_by_run(run_id).await.unwrap().is_none());
    assert!(
        pool.list_measurements_for_run(run_id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(pool.get_artifact_by_id(artifact.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn a_run_holds_at_most_one_result() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set or unreachable");
        return;
    };

    let suffix = Uuid::new_v4().simple().to_string();
    let user = users::insert(
        pool.connection(),
        &format!("it-unique-{}", suffix),
        "not-a-real-hash",
        None,
        None,
        UserRole::Member,
    )
    .await
    .unwrap();

    let run_id = Uuid::now_v7();
    pool.insert_run(run_id, user.id, &run_input(), "runs/it/sample.csv")
        .await
        .unwrap();

    pool.insert_result(&result_request(run_id)).await.unwrap();

    let second = pool.insert_result(&result_request(run_id)).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    assert!(pool.delete_run(run_id).await.unwrap());
}
