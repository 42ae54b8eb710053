//! CI results sync library.
//!
//! Pulls build and test results from Jenkins, normalizes them into build and
//! test case records, and stores them in PostgreSQL.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod migration;
pub mod models;
pub mod services;
