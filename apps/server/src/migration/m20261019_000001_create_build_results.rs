//! Migration: Create build_results table.
//!
//! One row per (job, build) synced from Jenkins.

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
                -- Shared trigger function for updated_at
                CREATE OR REPLACE FUNCTION update_updated_at_column()
                RETURNS TRIGGER AS $$
                BEGIN
                    NEW.updated_at = NOW();
                    RETURN NEW;
                END;
                $$ LANGUAGE plpgsql;

                CREATE TABLE build_results (
                    id UUID PRIMARY KEY, -- UUIDv7 for time-ordered sorting

                    -- Build identity
                    job_name VARCHAR(500) NOT NULL,
                    build_number VARCHAR(50) NOT NULL,

                    build_status VARCHAR(20) NOT NULL
                        CHECK (build_status IN ('SUCCESS', 'FAILURE', 'UNSTABLE', 'ABORTED', 'IN_PROGRESS', 'UNKNOWN')),
                    build_url TEXT,
                    build_timestamp TIMESTAMPTZ,

                    -- Aggregate counts (NULL until known)
                    total_tests INTEGER,
                    passed_tests INTEGER,
                    failed_tests INTEGER,
                    skipped_tests INTEGER,
                    pass_percentage INTEGER NOT NULL DEFAULT 0,

                    job_frequency VARCHAR(20) NOT NULL DEFAULT 'Unknown',

                    -- Operator notes, never touched by sync
                    bugs_identified TEXT,
                    failure_reasons TEXT,

                    -- External associations
                    automation_tester_id BIGINT,
                    manual_tester_id BIGINT,
                    project_id BIGINT,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                    CONSTRAINT uq_build_results_job_build UNIQUE (job_name, build_number)
                );

                -- Index for latest-per-job queries
                CREATE INDEX idx_build_results_job_name_id ON build_results(job_name, id DESC);

                -- Index for latest-by-timestamp lookup
                CREATE INDEX idx_build_results_job_timestamp
                    ON build_results(job_name, build_timestamp DESC);

                -- Trigger to update updated_at
                CREATE TRIGGER update_build_results_updated_at
                    BEFORE UPDATE ON build_results
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_build_results_updated_at ON build_results;
                DROP TABLE IF EXISTS build_results CASCADE;
                DROP FUNCTION IF EXISTS update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }
}
