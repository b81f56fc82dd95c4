//! # SLP Common Library
//!
//! Shared code for the self-paced learning platform:
//! - Model-output parsing (subtopic lists, lesson segments, practice questions)
//! - Generated content data model
//! - Cache collaborator for generated content
//! - Configuration loading
//! - Database bootstrap
//! - Password and session token helpers

pub mod auth;
pub mod cache;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod parse;
pub mod seed;
pub mod time;

pub use error::{Error, Result};
pub use models::{ChatMessage, ChatRole, GeneratedSubtopic, PracticeQuestion, PracticeSet, SegmentMap, SubtopicContent};
pub use parse::{parse_list, parse_pairs, parse_segments, LabelVocabulary, ListContext, ParseError};
