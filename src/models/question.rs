// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::{
    error::AppError,
    models::answer::{Letter, LetterSet},
};

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Single,
    Multi,
    TrueFalse,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multi => "multi",
            QuestionType::TrueFalse => "true_false",
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(self, QuestionType::Multi)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(QuestionType::Single),
            "multi" => Ok(QuestionType::Multi),
            "true_false" => Ok(QuestionType::TrueFalse),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

/// The correct answer of a question, typed by question kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    Single(Letter),
    TrueFalse(Letter),
    Multi(LetterSet),
}

impl AnswerKey {
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerKey::Single(_) => QuestionType::Single,
            AnswerKey::TrueFalse(_) => QuestionType::TrueFalse,
            AnswerKey::Multi(_) => QuestionType::Multi,
        }
    }

    pub fn letters(&self) -> LetterSet {
        match self {
            AnswerKey::Single(l) | AnswerKey::TrueFalse(l) => std::iter::once(*l).collect(),
            AnswerKey::Multi(set) => set.clone(),
        }
    }

    /// Storage form of `correct_answer`.
    pub fn encode(&self) -> String {
        match self {
            AnswerKey::Single(l) | AnswerKey::TrueFalse(l) => l.as_str().to_string(),
            AnswerKey::Multi(set) => set.encode(),
        }
    }

    pub fn decode(question_type: QuestionType, stored: &str) -> Result<Self, String> {
        match question_type {
            QuestionType::Single => stored.parse().map(AnswerKey::Single).map_err(|e| e.to_string()),
            QuestionType::TrueFalse => stored
                .parse()
                .map(AnswerKey::TrueFalse)
                .map_err(|e| e.to_string()),
            QuestionType::Multi => {
                let set = LetterSet::decode(stored).map_err(|e| e.to_string())?;
                if set.is_empty() {
                    return Err("multi answer key is empty".to_string());
                }
                Ok(AnswerKey::Multi(set))
            }
        }
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub question_type: String,
    pub correct_answer: String,
    pub points: i32,
}

/// A question with its answer key decoded.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub options: [Option<String>; 4],
    pub key: AnswerKey,
    pub points: i32,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.key.question_type()
    }

    /// Option text for a letter, `None` if the slot is empty.
    pub fn option(&self, letter: Letter) -> Option<&str> {
        self.options[letter.index()]
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let question_type: QuestionType = row
            .question_type
            .parse()
            .map_err(|e| AppError::InternalServerError(format!("question {}: {}", row.id, e)))?;
        let key = AnswerKey::decode(question_type, &row.correct_answer)
            .map_err(|e| AppError::InternalServerError(format!("question {}: {}", row.id, e)))?;

        Ok(Question {
            id: row.id,
            quiz_id: row.quiz_id,
            text: row.question_text,
            options: [row.option_a, row.option_b, row.option_c, row.option_d],
            key,
            points: row.points,
        })
    }
}

/// Admin view of a question, answer key included.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_answer: LetterSet,
    pub points: i32,
}

impl From<Question> for QuestionDetail {
    fn from(question: Question) -> Self {
        let question_type = question.question_type();
        let correct_answer = question.key.letters();
        let [option_a, option_b, option_c, option_d] = question.options;

        QuestionDetail {
            id: question.id,
            quiz_id: question.quiz_id,
            question_text: question.text,
            question_type,
            option_a,
            option_b,
            option_c,
            option_d,
            correct_answer,
            points: question.points,
        }
    }
}

/// Query string of `GET /api/admin/questions`.
#[derive(Debug, Deserialize)]
pub struct QuestionFilter {
    pub quiz_id: i64,
}

/// DTO for creating or replacing a question.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionRequest {
    pub quiz_id: i64,
    #[validate(length(min = 1, max = 2000, message = "Question text is required"))]
    pub question_text: String,
    pub question_type: QuestionType,
    #[validate(length(max = 500))]
    pub option_a: Option<String>,
    #[validate(length(max = 500))]
    pub option_b: Option<String>,
    #[validate(length(max = 500))]
    pub option_c: Option<String>,
    #[validate(length(max = 500))]
    pub option_d: Option<String>,
    /// Selected correct letters, e.g. `["a"]` or `["a", "c"]`.
    pub correct_answer: Vec<String>,
    #[validate(range(min = 1, max = 100, message = "Points must be at least 1"))]
    pub points: Option<i32>,
}

/// A question request that passed answer-key validation.
#[derive(Debug, Clone)]
pub struct ValidQuestion {
    pub quiz_id: i64,
    pub text: String,
    pub options: [Option<String>; 4],
    pub key: AnswerKey,
    pub points: i32,
}

impl QuestionRequest {
    /// Checks the request and builds the typed answer key.
    ///
    /// Errors name the offending form field.
    pub fn into_valid(self) -> Result<ValidQuestion, AppError> {
        if let Err(errors) = self.validate() {
            let field = errors
                .field_errors()
                .keys()
                .next()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "question".to_string());
            return Err(AppError::Validation {
                field,
                message: errors.to_string(),
            });
        }

        let text = crate::utils::html::clean_html(self.question_text.trim());
        if text.is_empty() {
            return Err(AppError::validation("question_text", "Question text is required"));
        }

        let options: [Option<String>; 4] = match self.question_type {
            QuestionType::TrueFalse => [Some("True".to_string()), Some("False".to_string()), None, None],
            _ => [self.option_a, self.option_b, self.option_c, self.option_d].map(|o| {
                o.map(|s| crate::utils::html::clean_html(s.trim()))
                    .filter(|s| !s.is_empty())
            }),
        };

        let filled = options.iter().filter(|o| o.is_some()).count();
        if filled < 2 {
            return Err(AppError::validation("option_b", "At least two options are required"));
        }

        let mut letters = Vec::with_capacity(self.correct_answer.len());
        for raw in &self.correct_answer {
            let letter: Letter = raw
                .parse()
                .map_err(|e: crate::models::answer::InvalidLetter| {
                    AppError::validation("correct_answer", e.to_string())
                })?;
            if letters.contains(&letter) {
                return Err(AppError::validation(
                    "correct_answer",
                    format!("Answer '{}' selected more than once", letter),
                ));
            }
            if options[letter.index()].is_none() {
                return Err(AppError::validation(
                    "correct_answer",
                    format!("Option {} is empty and cannot be correct", letter.as_str().to_uppercase()),
                ));
            }
            letters.push(letter);
        }

        let key = match (self.question_type, letters.as_slice()) {
            (QuestionType::Single, [one]) => AnswerKey::Single(*one),
            (QuestionType::TrueFalse, [one]) => AnswerKey::TrueFalse(*one),
            (QuestionType::Multi, many) if !many.is_empty() => {
                AnswerKey::Multi(many.iter().copied().collect())
            }
            (QuestionType::Multi, _) => {
                return Err(AppError::validation(
                    "correct_answer",
                    "Please select at least one correct answer",
                ));
            }
            (_, _) => {
                return Err(AppError::validation(
                    "correct_answer",
                    "Please select exactly one correct answer",
                ));
            }
        };

        Ok(ValidQuestion {
            quiz_id: self.quiz_id,
            text,
            options,
            key,
            points: self.points.unwrap_or(1),
        })
    }
}
