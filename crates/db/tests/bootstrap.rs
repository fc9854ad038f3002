use sqlx::PgPool;

/// Full bootstrap: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    quire_db::health_check(&pool).await.unwrap();

    for table in ["pages", "snippets", "content_versions"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Running the embedded migrations on an already-migrated database is a no-op.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_run_migrations_is_idempotent(pool: PgPool) {
    quire_db::run_migrations(&pool).await.unwrap();
    quire_db::run_migrations(&pool).await.unwrap();
}

/// The (subject_type, subject_id, version_number) uniqueness constraint exists.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_version_uniqueness_constraint_present(pool: PgPool) {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM pg_constraint WHERE conname = 'uq_content_versions_subject_version'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row.0, 1);
}
