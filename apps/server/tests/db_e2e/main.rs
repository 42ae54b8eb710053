//! Database E2E test suite.
//!
//! Exercises the PostgreSQL result store directly: saving builds with their
//! test cases, latest-build queries and operator notes.
//! Requires a running PostgreSQL database reachable through `CRS_DB_URL`
//! (or the development default) with `RUST_ENV=development`.
//!
//! Run with: cargo test --test db_e2e


mod test_latest_builds;
mod test_save_build;
