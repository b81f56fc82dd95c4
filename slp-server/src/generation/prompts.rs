//! Prompt templates
//!
//! Each prompt pins the response to the shape one parser expects:
//! `Title ||| Description` lines, `LABEL:` sections, or `QUESTION n:` /
//! `ANSWER n:` blocks.

use slp_common::parse::{LabelVocabulary, LIST_SEPARATOR};

use super::GenerationRequest;

/// Prompt whose reply should contain the word "successful"
pub const CONNECTION_TEST_PROMPT: &str = "Hello, please respond with 'API connection successful'";

/// Standing instruction for the tutoring chat
pub const TUTOR_INSTRUCTION: &str = "You are an expert mathematics tutor specializing in differential equations and advanced mathematics.
You provide clear, helpful explanations and can answer questions about mathematical concepts, methods, and problem-solving techniques.

Keep your responses concise but thorough. Use plain text format without markdown.
If asked about specific problems, provide step-by-step solutions.
If concepts need clarification, break them down into understandable parts.";

const LATEX_RULES: &str = "Use proper LaTeX notation for all mathematical expressions:
   - Inline math: $x^2 + 1$, $\\frac{dy}{dx}$, $e^{-st}$
   - Display math: $$\\int_0^\\infty e^{-st}f(t)dt = F(s)$$
   - Use \\frac{numerator}{denominator} for fractions
   - Use \\int for integrals, \\sum for summations
   - Use \\lim_{x \\to a} for limits
   - Use \\sqrt{expression} for square roots
   - Use \\cdot for multiplication dots
   - Format derivatives as \\frac{dy}{dx} or y'";

/// Ordered subtopic list for one unit
pub fn subtopics(unit_title: &str, course_title: &str) -> GenerationRequest {
    GenerationRequest::new(format!(
        "I'm studying a course on {course_title}.
Generate a pedagogically logical list of subtopics for the unit \"{unit_title}\" that build conceptual understanding step-by-step.

Use this format exactly, with no bullets, markdown, or numbering:

Subtopic Title {LIST_SEPARATOR} One-line concise description

Generate 6-8 subtopics that progress from basic concepts to more advanced applications."
    ))
}

/// Lesson page made of labeled sections
pub fn content(
    subtopic_title: &str,
    unit_title: &str,
    course_title: &str,
    vocabulary: &LabelVocabulary,
) -> GenerationRequest {
    let menu: String = vocabulary
        .labels
        .iter()
        .map(|l| format!("- {}: {}\n", l.label, l.description))
        .collect();
    let skeleton: String = vocabulary
        .labels
        .iter()
        .map(|l| format!("{}:\n[Your content here]\n\n", l.label))
        .collect();

    GenerationRequest::new(format!(
        "I'm studying a course on {course_title}.
Create a structured, pedagogical explanation of \"{subtopic_title}\" from the unit \"{unit_title}\".

STEP 1: First, tell me which segments you will include from this list:
{menu}
STEP 2: Then provide the content for each segment using this EXACT format:

{skeleton}IMPORTANT RULES:
1. Choose 2-4 segments that best suit this specific topic
2. Use the EXACT segment names in ALL CAPS followed by a colon
3. {LATEX_RULES}

Select the most appropriate 2-4 segments for this topic and provide rich, detailed content."
    ))
}

/// Practice questions with worked answers
pub fn practice(subtopic_title: &str, unit_title: &str, course_title: &str, count: usize) -> GenerationRequest {
    GenerationRequest::new(format!(
        "I'm studying a course on {course_title}.
Write {count} practice problems on \"{subtopic_title}\" from the unit \"{unit_title}\", ordered from easiest to hardest.

Use this EXACT format for every problem, with no markdown:

QUESTION 1: [problem statement]
ANSWER 1: [complete worked solution with the final answer]

QUESTION 2: [problem statement]
ANSWER 2: [complete worked solution with the final answer]

IMPORTANT RULES:
1. Number questions and answers from 1 to {count}
2. Every QUESTION must be followed by its ANSWER before the next QUESTION
3. {LATEX_RULES}"
    ))
}

/// Tutoring chat turn
pub fn chat(message: &str, context: Option<&str>) -> GenerationRequest {
    let prompt = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{TUTOR_INSTRUCTION}\n\nContext:\n{context}\n\nStudent Question: {message}"),
        None => format!("{TUTOR_INSTRUCTION}\n\nStudent Question: {message}"),
    };
    GenerationRequest::new(prompt).with_system_instruction(TUTOR_INSTRUCTION)
}

/// Unit outline for a new course
pub fn course_outline(course_title: &str) -> GenerationRequest {
    GenerationRequest::new(format!(
        "Design the unit outline for a university-level course on {course_title}.
List the units in teaching order, from foundations to advanced topics.

Use this format exactly, with no bullets, markdown, or numbering:

Unit Title {LIST_SEPARATOR} One-line concise description

Generate 6-10 units."
    ))
}
