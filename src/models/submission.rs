// src/models/submission.rs

use std::collections::HashMap;

use crate::error::AppError;

/// A parsed quiz form post.
///
/// Built from the raw `application/x-www-form-urlencoded` pairs so repeated
/// `question_<id>[]` fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    /// Raw submitted values per question id, in form order.
    pub answers: HashMap<i64, Vec<String>>,
    /// `submit_quiz` was present.
    pub submit_quiz: bool,
    /// The client countdown reached zero and forced the submission.
    pub time_expired: bool,
}

impl Submission {
    pub fn from_form(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut submission = Submission::default();

        for (name, value) in pairs {
            if let Some(rest) = name.strip_prefix("question_") {
                let id_part = rest.strip_suffix("[]").unwrap_or(rest);
                let question_id: i64 = id_part
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("Invalid answer field '{}'", name)))?;
                submission.answers.entry(question_id).or_default().push(value);
                continue;
            }

            match name.as_str() {
                "submit_quiz" => submission.submit_quiz = true,
                "time_expired" => submission.time_expired = parse_flag(&value)?,
                _ => {}
            }
        }

        Ok(submission)
    }

    pub fn values_for(&self, question_id: i64) -> Option<&[String]> {
        self.answers.get(&question_id).map(Vec::as_slice)
    }
}

fn parse_flag(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "" | "0" | "false" | "off" | "no" => Ok(false),
        other => Err(AppError::BadRequest(format!(
            "Invalid value '{}' for time_expired",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_single_and_multi_fields() {
        let sub = Submission::from_form(pairs(&[
            ("question_3", "b"),
            ("question_9[]", "c"),
            ("question_9[]", "a"),
            ("submit_quiz", ""),
        ]))
        .unwrap();

        assert_eq!(sub.values_for(3), Some(&["b".to_string()][..]));
        assert_eq!(
            sub.values_for(9),
            Some(&["c".to_string(), "a".to_string()][..])
        );
        assert!(sub.submit_quiz);
        assert!(!sub.time_expired);
        assert_eq!(sub.values_for(4), None);
    }

    #[test]
    fn test_time_expired_flag_values() {
        let sub = Submission::from_form(pairs(&[("time_expired", "1")])).unwrap();
        assert!(sub.time_expired);
        let sub = Submission::from_form(pairs(&[("time_expired", "TRUE")])).unwrap();
        assert!(sub.time_expired);
        let sub = Submission::from_form(pairs(&[("time_expired", "0")])).unwrap();
        assert!(!sub.time_expired);
        assert!(Submission::from_form(pairs(&[("time_expired", "maybe")])).is_err());
    }

    #[test]
    fn test_bad_question_field_rejected() {
        assert!(Submission::from_form(pairs(&[("question_x", "a")])).is_err());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let sub = Submission::from_form(pairs(&[("csrf", "abc")])).unwrap();
        assert_eq!(sub, Submission::default());
    }
}
