//! SeaORM entity definitions for PostgreSQL database.

pub mod build_result;
pub mod test_case_result;
