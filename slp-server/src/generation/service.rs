//! Prompt, call, parse
//!
//! One function per kind of generated content. Each builds the prompt, makes
//! exactly one upstream call and runs the matching parser.

use slp_common::parse::{normalize, parse_list, parse_pairs, parse_segments, slug, ListContext};
use slp_common::{GeneratedSubtopic, LabelVocabulary, ParseError, PracticeQuestion, SubtopicContent};
use tracing::info;

use super::{prompts, GenerationError, TextGenerator};

/// Subtopics for a unit
///
/// Records carry `unit_id` as their parent when given, else the unit title slug.
pub async fn generate_subtopics(
    generator: &dyn TextGenerator,
    unit_title: &str,
    course_title: &str,
    unit_id: Option<&str>,
) -> Result<Vec<GeneratedSubtopic>, GenerationError> {
    let raw = generator.generate(&prompts::subtopics(unit_title, course_title)).await?;

    let context = ListContext {
        parent_id: unit_id.map(str::to_string).unwrap_or_else(|| slug(unit_title)),
        parent_title: unit_title.to_string(),
    };
    let subtopics = parse_list(&raw, &context)?;

    info!("Generated {} subtopics for unit '{}'", subtopics.len(), unit_title);
    Ok(subtopics)
}

/// Lesson page for a subtopic
pub async fn generate_content(
    generator: &dyn TextGenerator,
    vocabulary: &LabelVocabulary,
    subtopic_title: &str,
    unit_title: &str,
    course_title: &str,
    subtopic_id: Option<&str>,
) -> Result<SubtopicContent, GenerationError> {
    let raw = generator
        .generate(&prompts::content(subtopic_title, unit_title, course_title, vocabulary))
        .await?;
    let segments = parse_segments(&raw, vocabulary)?;

    info!(
        "Generated lesson for '{}' with {} segments",
        subtopic_title,
        segments.len()
    );
    Ok(SubtopicContent {
        subtopic_id: subtopic_id.map(str::to_string).unwrap_or_else(|| slug(subtopic_title)),
        segments,
        generated_at: slp_common::time::now(),
    })
}

/// Practice questions for a subtopic
pub async fn generate_practice(
    generator: &dyn TextGenerator,
    subtopic_title: &str,
    unit_title: &str,
    course_title: &str,
    count: usize,
) -> Result<Vec<PracticeQuestion>, GenerationError> {
    let raw = generator
        .generate(&prompts::practice(subtopic_title, unit_title, course_title, count))
        .await?;
    let questions = parse_pairs(&raw, subtopic_title, count)?;

    info!("Generated {} practice questions for '{}'", questions.len(), subtopic_title);
    Ok(questions)
}

/// Tutor reply with markdown removed
pub async fn chat_reply(
    generator: &dyn TextGenerator,
    message: &str,
    context: Option<&str>,
) -> Result<String, GenerationError> {
    let raw = generator.generate(&prompts::chat(message, context)).await?;
    let reply = normalize(&raw);
    if reply.is_empty() {
        return Err(ParseError::EmptyResult { kind: "chat reply" }.into());
    }
    Ok(reply)
}

/// Unit outline for a new course
///
/// Units come back as list records: title and description, parented to the
/// course title slug.
pub async fn generate_course_outline(
    generator: &dyn TextGenerator,
    course_title: &str,
) -> Result<Vec<GeneratedSubtopic>, GenerationError> {
    let raw = generator.generate(&prompts::course_outline(course_title)).await?;
    let units = parse_list(&raw, &ListContext::from_title(course_title))?;

    info!("Generated {} units for course '{}'", units.len(), course_title);
    Ok(units)
}
