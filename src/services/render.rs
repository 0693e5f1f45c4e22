// src/services/render.rs

use serde::Serialize;

use crate::models::{
    answer::Letter,
    question::{Question, QuestionType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    SingleSelect,
    MultiSelect,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub letter: Letter,
    pub text: String,
}

/// Presentation model of one question. Carries no answer key.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i64,
    /// 1-based position in the quiz.
    pub number: usize,
    pub text: String,
    pub question_type: QuestionType,
    pub input: InputKind,
    /// Form field the answer must be posted under.
    pub field_name: String,
    pub options: Vec<OptionView>,
}

pub fn field_name(question_id: i64, input: InputKind) -> String {
    match input {
        InputKind::SingleSelect => format!("question_{}", question_id),
        InputKind::MultiSelect => format!("question_{}[]", question_id),
    }
}

/// Builds the views in question id order, skipping empty options.
pub fn render_questions(questions: &[Question]) -> Vec<QuestionView> {
    let mut ordered: Vec<&Question> = questions.iter().collect();
    ordered.sort_by_key(|q| q.id);

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, question)| {
            let question_type = question.question_type();
            let input = if question_type.is_multi() {
                InputKind::MultiSelect
            } else {
                InputKind::SingleSelect
            };

            QuestionView {
                id: question.id,
                number: index + 1,
                text: question.text.clone(),
                question_type,
                input,
                field_name: field_name(question.id, input),
                options: Letter::ALL
                    .into_iter()
                    .filter_map(|letter| {
                        question.option(letter).map(|text| OptionView {
                            letter,
                            text: text.to_string(),
                        })
                    })
                    .collect(),
            }
        })
        .collect()
}
