//! Courses, units, subtopics and their generated pages
//!
//! Every course belongs to one user. Ownership checks join back to the
//! course row, so a unit or subtopic id from another account reads as absent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use slp_common::time::{from_db_string, now, to_db_string};
use slp_common::{Error, GeneratedSubtopic, PracticeQuestion, PracticeSet, Result, SegmentMap, SubtopicContent};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Completed vs. total subtopics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub progress: Progress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub order_index: i64,
    pub is_completed: bool,
    pub subtopics: Vec<GeneratedSubtopic>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub summary: CourseSummary,
    pub units: Vec<Unit>,
}

/// Unit to insert with a new course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnit {
    pub title: String,
    pub description: String,
    pub icon: String,
}

/// Default icon for units that were not given one
pub const DEFAULT_UNIT_ICON: &str = "fas fa-book";

fn json_error(e: serde_json::Error) -> Error {
    Error::Internal(format!("JSON encoding failed: {}", e))
}

/// Create a course and its units in one transaction; returns the course id
pub async fn create_course(
    db: &SqlitePool,
    user_guid: &str,
    title: &str,
    description: &str,
    units: &[NewUnit],
) -> Result<String> {
    let course_guid = Uuid::new_v4().to_string();
    let mut tx = db.begin().await?;

    sqlx::query("INSERT INTO courses (guid, user_guid, title, description, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(&course_guid)
        .bind(user_guid)
        .bind(title)
        .bind(description)
        .bind(to_db_string(&now()))
        .execute(&mut *tx)
        .await?;

    for (index, unit) in units.iter().enumerate() {
        sqlx::query(
            "INSERT INTO units (guid, course_guid, title, description, icon, order_index) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&course_guid)
        .bind(&unit.title)
        .bind(&unit.description)
        .bind(&unit.icon)
        .bind(index as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(course_guid)
}

/// Course columns plus completed/total subtopic counts; callers add WHERE
const SUMMARY_SELECT: &str = r#"
    SELECT c.guid, c.title, c.description, c.created_at,
           COALESCE(SUM(s.is_completed), 0), COUNT(s.guid)
    FROM courses c
    LEFT JOIN units u ON u.course_guid = c.guid
    LEFT JOIN subtopics s ON s.unit_guid = u.guid
"#;

type SummaryRow = (String, String, String, String, i64, i64);

fn summary_from_row((guid, title, description, created_at, completed, total): SummaryRow) -> Result<CourseSummary> {
    Ok(CourseSummary {
        id: guid,
        title,
        description,
        created_at: from_db_string(&created_at)?,
        progress: Progress { completed, total },
    })
}

/// Courses of a user, newest first
pub async fn list_courses(db: &SqlitePool, user_guid: &str) -> Result<Vec<CourseSummary>> {
    let sql = format!("{} WHERE c.user_guid = ? GROUP BY c.guid ORDER BY c.created_at DESC", SUMMARY_SELECT);
    let rows: Vec<SummaryRow> = sqlx::query_as(&sql).bind(user_guid).fetch_all(db).await?;

    rows.into_iter().map(summary_from_row).collect()
}

/// Summary of one course of a user
pub async fn course_summary(db: &SqlitePool, user_guid: &str, course_guid: &str) -> Result<Option<CourseSummary>> {
    let sql = format!("{} WHERE c.user_guid = ? AND c.guid = ? GROUP BY c.guid", SUMMARY_SELECT);
    let row: Option<SummaryRow> = sqlx::query_as(&sql)
        .bind(user_guid)
        .bind(course_guid)
        .fetch_optional(db)
        .await?;

    row.map(summary_from_row).transpose()
}

/// One course with units and persisted subtopics
pub async fn get_course(db: &SqlitePool, user_guid: &str, course_guid: &str) -> Result<Option<CourseDetail>> {
    let Some(summary) = course_summary(db, user_guid, course_guid).await? else {
        return Ok(None);
    };

    let rows: Vec<(String, String, String, String, i64, bool)> = sqlx::query_as(
        "SELECT guid, title, description, icon, order_index, is_completed FROM units WHERE course_guid = ? ORDER BY order_index",
    )
    .bind(course_guid)
    .fetch_all(db)
    .await?;

    let mut units = Vec::with_capacity(rows.len());
    for (guid, title, description, icon, order_index, is_completed) in rows {
        let subtopics = load_subtopics(db, &guid).await?;
        units.push(Unit {
            id: guid,
            course_id: course_guid.to_string(),
            title,
            description,
            icon,
            order_index,
            is_completed,
            subtopics,
        });
    }

    Ok(Some(CourseDetail { summary, units }))
}

/// Delete a course (units, subtopics and pages cascade); false if not found
pub async fn delete_course(db: &SqlitePool, user_guid: &str, course_guid: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM courses WHERE guid = ? AND user_guid = ?")
        .bind(course_guid)
        .bind(user_guid)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn owns_unit(db: &SqlitePool, user_guid: &str, unit_guid: &str) -> Result<bool> {
    let owned: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM units u JOIN courses c ON c.guid = u.course_guid
            WHERE u.guid = ? AND c.user_guid = ?
        )
        "#,
    )
    .bind(unit_guid)
    .bind(user_guid)
    .fetch_one(db)
    .await?;
    Ok(owned)
}

pub async fn owns_subtopic(db: &SqlitePool, user_guid: &str, subtopic_guid: &str) -> Result<bool> {
    let owned: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM subtopics s
            JOIN units u ON u.guid = s.unit_guid
            JOIN courses c ON c.guid = u.course_guid
            WHERE s.guid = ? AND c.user_guid = ?
        )
        "#,
    )
    .bind(subtopic_guid)
    .bind(user_guid)
    .fetch_one(db)
    .await?;
    Ok(owned)
}

/// Persisted subtopics of a unit, in order
pub async fn load_subtopics(db: &SqlitePool, unit_guid: &str) -> Result<Vec<GeneratedSubtopic>> {
    let rows: Vec<(String, String, String, bool)> = sqlx::query_as(
        "SELECT guid, title, description, is_completed FROM subtopics WHERE unit_guid = ? ORDER BY order_index",
    )
    .bind(unit_guid)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(guid, title, description, is_completed)| GeneratedSubtopic {
            id: guid,
            parent_unit_id: unit_guid.to_string(),
            title,
            description,
            is_completed,
        })
        .collect())
}

/// Replace all subtopics of a unit
///
/// Stored records get fresh ids and `order_index` from their position; the
/// returned records carry those ids and the unit id as parent. Pages of the
/// old subtopics go with them.
pub async fn replace_subtopics(
    db: &SqlitePool,
    unit_guid: &str,
    subtopics: &[GeneratedSubtopic],
) -> Result<Vec<GeneratedSubtopic>> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM subtopics WHERE unit_guid = ?")
        .bind(unit_guid)
        .execute(&mut *tx)
        .await?;

    let mut stored = Vec::with_capacity(subtopics.len());
    for (index, subtopic) in subtopics.iter().enumerate() {
        let guid = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO subtopics (guid, unit_guid, title, description, order_index) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&guid)
        .bind(unit_guid)
        .bind(&subtopic.title)
        .bind(&subtopic.description)
        .bind(index as i64)
        .execute(&mut *tx)
        .await?;

        stored.push(GeneratedSubtopic {
            id: guid,
            parent_unit_id: unit_guid.to_string(),
            title: subtopic.title.clone(),
            description: subtopic.description.clone(),
            is_completed: false,
        });
    }

    sqlx::query("UPDATE units SET is_completed = 0 WHERE guid = ?")
        .bind(unit_guid)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(stored)
}

/// Mark a subtopic (in)complete; the unit is complete when all its subtopics are
pub async fn set_subtopic_completion(db: &SqlitePool, subtopic_guid: &str, completed: bool) -> Result<()> {
    let mut tx = db.begin().await?;

    sqlx::query("UPDATE subtopics SET is_completed = ? WHERE guid = ?")
        .bind(completed)
        .bind(subtopic_guid)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        UPDATE units SET is_completed = (
            SELECT COUNT(*) > 0 AND SUM(is_completed) = COUNT(*)
            FROM subtopics WHERE unit_guid = units.guid
        )
        WHERE guid = (SELECT unit_guid FROM subtopics WHERE guid = ?)
        "#,
    )
    .bind(subtopic_guid)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn save_info_page(db: &SqlitePool, title: &str, content: &SubtopicContent) -> Result<()> {
    let segments = serde_json::to_string(&content.segments).map_err(json_error)?;

    sqlx::query(
        "INSERT OR REPLACE INTO info_pages (subtopic_guid, title, content, generated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&content.subtopic_id)
    .bind(title)
    .bind(segments)
    .bind(to_db_string(&content.generated_at))
    .execute(db)
    .await?;
    Ok(())
}

pub async fn load_info_page(db: &SqlitePool, subtopic_guid: &str) -> Result<Option<SubtopicContent>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT content, generated_at FROM info_pages WHERE subtopic_guid = ?")
            .bind(subtopic_guid)
            .fetch_optional(db)
            .await?;

    row.map(|(content, generated_at)| {
        let segments: SegmentMap = serde_json::from_str(&content).map_err(json_error)?;
        Ok(SubtopicContent {
            subtopic_id: subtopic_guid.to_string(),
            segments,
            generated_at: from_db_string(&generated_at)?,
        })
    })
    .transpose()
}

pub async fn save_question_page(db: &SqlitePool, set: &PracticeSet) -> Result<()> {
    let questions = serde_json::to_string(&set.questions).map_err(json_error)?;

    sqlx::query("INSERT OR REPLACE INTO question_pages (subtopic_guid, questions, generated_at) VALUES (?, ?, ?)")
        .bind(&set.subtopic_id)
        .bind(questions)
        .bind(to_db_string(&set.generated_at))
        .execute(db)
        .await?;
    Ok(())
}

pub async fn load_question_page(db: &SqlitePool, subtopic_guid: &str) -> Result<Option<PracticeSet>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT questions, generated_at FROM question_pages WHERE subtopic_guid = ?")
            .bind(subtopic_guid)
            .fetch_optional(db)
            .await?;

    row.map(|(questions, generated_at)| {
        let questions: Vec<PracticeQuestion> = serde_json::from_str(&questions).map_err(json_error)?;
        Ok(PracticeSet {
            subtopic_id: subtopic_guid.to_string(),
            questions,
            generated_at: from_db_string(&generated_at)?,
        })
    })
    .transpose()
}
