//! Question/answer pair parser (`QUESTION n:` / `ANSWER n:` blocks)
//!
//! Three strategies, each tried only when the previous one produced nothing:
//!
//! 1. Strict markers: `QUESTION n:` opens a block that runs to the next
//!    `QUESTION n:` or end of text; the first `ANSWER n:` inside splits it.
//! 2. Loose markers: case-insensitive `question [n]` / `answer [n]` followed by
//!    `:`, `.` or `)`; answer text stops at a second answer marker.
//! 3. Line scan: `Q1:` / `Question 1)` lines start a question, `A1:` /
//!    `Answer 1.` lines start its answer, other lines continue the active half.
//!
//! Ordinals are never compared. `QUESTION 3: ... ANSWER 5: ...` is a pair.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{normalize, slug, ParseError};
use crate::models::PracticeQuestion;

static STRICT_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"QUESTION\s+\d+\s*:").expect("valid regex"));
static STRICT_ANSWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"ANSWER\s+\d+\s*:").expect("valid regex"));
static LOOSE_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bquestion\s*\d*\s*[:.)]").expect("valid regex"));
static LOOSE_ANSWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\banswer\s*\d*\s*[:.)]").expect("valid regex"));
static LINE_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:question|q)\s*\d+\s*[:.)]\s*(.*)$").expect("valid regex"));
static LINE_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:answer|a)\s*\d+\s*[:.)]\s*(.*)$").expect("valid regex"));

/// Parse practice question/answer pairs
///
/// `expected_count` is advisory; whatever was parsed is returned. Pairs with
/// an empty question or answer are dropped. Fails with
/// [`ParseError::EmptyResult`] when all three strategies find nothing.
///
/// Ids are `{slug(subtopic_title)}-q{n}`, numbered within the strategy that
/// succeeded.
pub fn parse_pairs(
    raw: &str,
    subtopic_title: &str,
    expected_count: usize,
) -> Result<Vec<PracticeQuestion>, ParseError> {
    let text = normalize(raw);

    let strategies: [(&str, fn(&str) -> Vec<(String, String)>); 3] = [
        ("strict markers", strict_markers),
        ("loose markers", loose_markers),
        ("line scan", line_scan),
    ];

    for (name, strategy) in strategies {
        let pairs = strategy(&text);
        if pairs.is_empty() {
            debug!("Question strategy '{}' found no pairs", name);
            continue;
        }

        if pairs.len() != expected_count {
            debug!(
                "Question strategy '{}' found {} pairs (expected {})",
                name,
                pairs.len(),
                expected_count
            );
        }

        let prefix = slug(subtopic_title);
        return Ok(pairs
            .into_iter()
            .enumerate()
            .map(|(i, (question, answer))| PracticeQuestion {
                id: format!("{}-q{}", prefix, i + 1),
                question,
                answer,
            })
            .collect());
    }

    Err(ParseError::empty("practice questions"))
}

/// Keep a pair only when both halves have text
fn complete_pair(question: &str, answer: &str) -> Option<(String, String)> {
    let question = question.trim();
    let answer = answer.trim();
    if question.is_empty() || answer.is_empty() {
        None
    } else {
        Some((question.to_string(), answer.to_string()))
    }
}

/// Text following each marker match, up to the next marker match
fn blocks_after<'t>(marker: &Regex, text: &'t str) -> Vec<&'t str> {
    let starts: Vec<(usize, usize)> = marker.find_iter(text).map(|m| (m.start(), m.end())).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &(_, content_start))| {
            let end = starts.get(i + 1).map(|&(next_start, _)| next_start).unwrap_or(text.len());
            &text[content_start..end]
        })
        .collect()
}

fn strict_markers(text: &str) -> Vec<(String, String)> {
    blocks_after(&STRICT_QUESTION, text)
        .into_iter()
        .filter_map(|block| {
            let answer = STRICT_ANSWER.find(block)?;
            complete_pair(&block[..answer.start()], &block[answer.end()..])
        })
        .collect()
}

fn loose_markers(text: &str) -> Vec<(String, String)> {
    blocks_after(&LOOSE_QUESTION, text)
        .into_iter()
        .filter_map(|block| {
            let mut parts = LOOSE_ANSWER.split(block);
            let question = parts.next()?;
            let answer = parts.next()?;
            complete_pair(question, answer)
        })
        .collect()
}

#[derive(PartialEq)]
enum Active {
    Nothing,
    Question,
    Answer,
}

fn line_scan(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut question: Vec<&str> = Vec::new();
    let mut answer: Vec<&str> = Vec::new();
    let mut active = Active::Nothing;

    let mut flush = |question: &mut Vec<&str>, answer: &mut Vec<&str>| {
        if let Some(pair) = complete_pair(&question.join(" "), &answer.join(" ")) {
            pairs.push(pair);
        }
        question.clear();
        answer.clear();
    };

    for line in text.lines() {
        if let Some(caps) = LINE_QUESTION.captures(line) {
            flush(&mut question, &mut answer);
            active = Active::Question;
            push_text(&mut question, caps.get(1).map_or("", |m| m.as_str()));
        } else if let Some(caps) = LINE_ANSWER.captures(line) {
            active = Active::Answer;
            push_text(&mut answer, caps.get(1).map_or("", |m| m.as_str()));
        } else {
            match active {
                Active::Question => push_text(&mut question, line),
                Active::Answer => push_text(&mut answer, line),
                Active::Nothing => {}
            }
        }
    }
    flush(&mut question, &mut answer);

    pairs
}

fn push_text<'t>(buffer: &mut Vec<&'t str>, line: &'t str) {
    let line = line.trim();
    if !line.is_empty() {
        buffer.push(line);
    }
}
