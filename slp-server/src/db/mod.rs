//! Database access layer for slp-server
//!
//! Schema lives in `slp_common::db::init`; this module holds the queries.

pub mod courses;
pub mod sessions;
pub mod users;
