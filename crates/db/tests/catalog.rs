//! Integration tests for the schema catalog reader.

use atmfleet_db::catalog;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn lists_all_base_tables_with_column_counts(pool: PgPool) {
    let tables = catalog::list_table_names(&pool).await.unwrap();
    let names: Vec<&str> = tables.iter().map(|(n, _)| n.as_str()).collect();

    for expected in ["atms", "banks", "contracts", "maintenance_records", "work_orders", "audit_logs"] {
        assert!(names.contains(&expected), "missing table {expected}");
    }

    let (_, atm_columns) = tables.iter().find(|(n, _)| n == "atms").unwrap();
    assert_eq!(*atm_columns, 8, "atms column count");
}

#[sqlx::test(migrations = "../../migrations")]
async fn row_count_is_exact_for_small_tables(pool: PgPool) {
    sqlx::query("INSERT INTO banks (code, name) VALUES ('ZB', 'Ziraat'), ('IB', 'Is Bankasi')")
        .execute(&pool)
        .await
        .unwrap();

    let count = catalog::row_count(&pool, "banks").await.unwrap();
    assert_eq!(count, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn annotate_attaches_error_instead_of_failing(pool: PgPool) {
    // A table that does not exist: both count strategies fail, the
    // descriptor carries the error and a zero count.
    let descriptor = catalog::annotate_table(&pool, "no_such_table".to_string(), 0).await;
    assert_eq!(descriptor.row_count, 0);
    assert!(descriptor.error.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn columns_come_back_in_physical_order(pool: PgPool) {
    let columns = catalog::columns(&pool, "banks").await.unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "code", "name", "city", "created_at"]);

    let code = &columns[1];
    assert_eq!(code.data_type, "character varying");
    assert_eq!(code.max_length, Some(32));
    assert!(!code.is_nullable);

    let city = &columns[3];
    assert!(city.is_nullable);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_table_has_no_columns(pool: PgPool) {
    let columns = catalog::columns(&pool, "no_such_table").await.unwrap();
    assert!(columns.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn server_collation_is_readable(pool: PgPool) {
    let collation = catalog::server_collation(&pool).await.unwrap();
    assert!(!collation.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn approx_size_is_zero_for_missing_tables(pool: PgPool) {
    let size = catalog::approx_size_kb(&pool, "no_such_table").await;
    assert_eq!(size, 0.0);

    let size = catalog::approx_size_kb(&pool, "atms").await;
    assert!(size >= 0.0);
}
