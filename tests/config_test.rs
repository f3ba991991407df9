//! Configuration loading wired through to an on-disk database.

mod common;

use std::io::Write;

use levelup::adapters::sqlite::initialize_from_config;
use levelup::cli::CliContext;
use levelup::domain::models::UserId;
use levelup::infrastructure::config::ConfigLoader;
use levelup::infrastructure::logging::{LogConfig, LogFormat, RotationPolicy};
use levelup::services::Repositories;

fn write_config(dir: &std::path::Path, db_path: &std::path::Path) -> std::path::PathBuf {
    let config_path = dir.join("config.yaml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        r#"
database:
  path: "{}"
  max_connections: 2
logging:
  level: info
  format: json
  rotation: never
user:
  default_id: casey
"#,
        db_path.display()
    )
    .unwrap();
    config_path
}

#[tokio::test]
async fn test_file_config_opens_durable_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("levelup.db");
    let config_path = write_config(dir.path(), &db_path);

    let config = temp_env::with_vars_unset(
        ["LEVELUP_USER__DEFAULT_ID", "LEVELUP_DATABASE__PATH"],
        || ConfigLoader::load_from_file(&config_path).unwrap(),
    );
    assert_eq!(config.database.max_connections, 2);

    let log_config = LogConfig::from(&config.logging);
    assert_eq!(log_config.format, LogFormat::Json);
    assert_eq!(log_config.rotation, RotationPolicy::Never);

    let ctx = CliContext::from_config(&config, None).await.unwrap();
    assert_eq!(ctx.user_id, UserId::new("casey"));
    assert!(db_path.exists(), "database directory is created on demand");

    let task_id = common::seed_task(ctx.repositories(), &ctx.user_id, "general").await;
    let outcome = ctx
        .orchestrator
        .complete_task(common::completion(
            &ctx.user_id,
            task_id,
            Some(45),
            common::local_time(0, (2024, 5, 8), (9, 0)),
        ))
        .await;
    assert!(outcome.success);
    drop(ctx);

    // A second open sees the committed documents
    let pool = initialize_from_config(&config.database).await.unwrap();
    let repos = Repositories::sqlite(pool);
    let stats = repos
        .stats
        .load(&UserId::new("casey"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.value.tasks_completed, 1);
    assert!((stats.value.hours_in("general") - 0.75).abs() < 1e-9);
}

#[test]
fn test_env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), &dir.path().join("levelup.db"));

    let config = temp_env::with_vars(
        [
            ("LEVELUP_USER__DEFAULT_ID", Some("dana")),
            ("LEVELUP_TRANSACTIONS__MAX_ATTEMPTS", Some("9")),
        ],
        || ConfigLoader::load_from_file(&config_path).unwrap(),
    );

    assert_eq!(config.user.default_id, "dana");
    assert_eq!(config.transactions.max_attempts, 9);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_invalid_env_value_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path(), &dir.path().join("levelup.db"));

    let result = temp_env::with_var("LEVELUP_LOGGING__ROTATION", Some("weekly"), || {
        ConfigLoader::load_from_file(&config_path)
    });

    assert!(result.is_err());
}
