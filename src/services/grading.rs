// src/services/grading.rs

use serde::Serialize;

use crate::models::{
    answer::{Letter, LetterSet},
    question::{AnswerKey, Question},
    submission::Submission,
};

/// What the user picked for one question, after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Unanswered,
    /// Present but not a usable answer (unknown letter, several values for a
    /// single-choice question).
    Invalid,
    One(Letter),
    Many(LetterSet),
}

impl Selection {
    /// Interprets raw form values against the question kind.
    pub fn parse(key: &AnswerKey, raw: Option<&[String]>) -> Selection {
        let values: Vec<&str> = raw
            .unwrap_or_default()
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();

        if values.is_empty() {
            return Selection::Unanswered;
        }

        match key {
            AnswerKey::Single(_) | AnswerKey::TrueFalse(_) => match values.as_slice() {
                [one] => one.parse().map(Selection::One).unwrap_or(Selection::Invalid),
                _ => Selection::Invalid,
            },
            AnswerKey::Multi(_) => LetterSet::parse_all(values)
                .map(Selection::Many)
                .unwrap_or(Selection::Invalid),
        }
    }

    /// Storage form of `selected_answer`.
    pub fn encode(&self) -> Option<String> {
        match self {
            Selection::Unanswered | Selection::Invalid => None,
            Selection::One(letter) => Some(letter.as_str().to_string()),
            Selection::Many(set) => Some(set.encode()),
        }
    }

    pub fn matches(&self, key: &AnswerKey) -> bool {
        match (self, key) {
            (Selection::One(picked), AnswerKey::Single(correct))
            | (Selection::One(picked), AnswerKey::TrueFalse(correct)) => picked == correct,
            (Selection::Many(picked), AnswerKey::Multi(correct)) => picked == correct,
            _ => false,
        }
    }
}

/// Outcome for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedResponse {
    pub question_id: i64,
    pub selected_answer: Option<String>,
    pub is_correct: bool,
    pub points: i32,
}

/// Outcome for a whole submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub responses: Vec<GradedResponse>,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score: f64,
    pub points_earned: i32,
    pub points_possible: i32,
}

/// Percentage of correct answers, rounded to two decimals. Zero questions
/// scores 0.
pub fn score_percentage(correct: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = correct as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Grades every question of the quiz against the submission.
///
/// Questions missing from the submission count as unanswered. No partial
/// credit for multi-select.
pub fn grade(questions: &[Question], submission: &Submission) -> GradeReport {
    let responses: Vec<GradedResponse> = questions
        .iter()
        .map(|question| {
            let selection = Selection::parse(&question.key, submission.values_for(question.id));
            GradedResponse {
                question_id: question.id,
                is_correct: selection.matches(&question.key),
                selected_answer: selection.encode(),
                points: question.points,
            }
        })
        .collect();

    let total_questions = responses.len() as i32;
    let correct_answers = responses.iter().filter(|r| r.is_correct).count() as i32;
    let points_possible = responses.iter().map(|r| r.points).sum();
    let points_earned = responses
        .iter()
        .filter(|r| r.is_correct)
        .map(|r| r.points)
        .sum();

    GradeReport {
        score: score_percentage(correct_answers, total_questions),
        responses,
        total_questions,
        correct_answers,
        points_earned,
        points_possible,
    }
}
