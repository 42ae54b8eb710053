//! Migration: Create test_case_results table.
//!
//! Individual test executions owned by a build result.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE test_case_results (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting
                    build_result_id UUID NOT NULL REFERENCES build_results(id) ON DELETE CASCADE,

                    -- Test identification
                    class_name TEXT NOT NULL DEFAULT 'Unknown',
                    test_name TEXT NOT NULL DEFAULT 'Unknown',

                    -- Status
                    status VARCHAR(20) NOT NULL
                        CHECK (status IN ('PASSED', 'FAILED', 'SKIPPED', 'UNKNOWN')),
                    raw_status TEXT,

                    duration_seconds DOUBLE PRECISION,

                    -- Sanitized failure detail
                    error_message VARCHAR(2000),
                    stack_trace VARCHAR(5000),

                    -- Ordering within build
                    sequence INTEGER NOT NULL DEFAULT 0,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Index for build lookup in extraction order
                CREATE INDEX idx_test_case_results_build ON test_case_results(build_result_id, sequence);

                -- Index for status filtering
                CREATE INDEX idx_test_case_results_status ON test_case_results(build_result_id, status);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS test_case_results CASCADE;")
            .await?;

        Ok(())
    }
}
