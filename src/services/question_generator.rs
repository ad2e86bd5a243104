use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::types::Difficulty;
use crate::services::question_bank::{Subject, SubjectBank};

pub(crate) const EXPECTED_ANSWER: &str = "Calculated based on parameters";

#[derive(Debug, Clone)]
pub(crate) struct StudentRef {
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilledTemplate {
    pub(crate) text: String,
    pub(crate) parameters: BTreeMap<String, serde_json::Value>,
}

impl FilledTemplate {
    /// Identity of a question within one batch.
    fn combination_key(&self) -> String {
        let mut key = self.text.clone();
        for (name, value) in &self.parameters {
            key.push('\u{1f}');
            key.push_str(name);
            key.push('=');
            key.push_str(&value.to_string());
        }
        key
    }
}

#[derive(Debug, Clone)]
pub(crate) struct GeneratedQuestion {
    pub(crate) unique_id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) subject: String,
    pub(crate) question_text: String,
    pub(crate) parameters: BTreeMap<String, serde_json::Value>,
    pub(crate) expected_answer: String,
    pub(crate) difficulty: Difficulty,
}

/// Replaces every `{key}` that has a pool with one draw from it. A key that
/// repeats gets the same value everywhere; keys without a pool stay as
/// written.
pub(crate) fn fill_template<R: Rng + ?Sized>(
    rng: &mut R,
    template: &str,
    bank: &SubjectBank,
) -> FilledTemplate {
    let mut text = String::with_capacity(template.len());
    let mut parameters = BTreeMap::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            text.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let key = &after[..close];
        let drawn = if let Some(existing) = parameters.get(key) {
            Some(json_to_text(existing))
        } else if let Some(value) = bank.pool(key).and_then(|values| values.choose(rng)).copied() {
            parameters.insert(key.to_string(), value.to_json());
            Some(value.render())
        } else {
            None
        };
        match drawn {
            Some(value) => text.push_str(&value),
            None => text.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    text.push_str(rest);

    FilledTemplate { text, parameters }
}

fn json_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn difficulty_for(parameter_count: usize) -> Difficulty {
    match parameter_count {
        0..=3 => Difficulty::Easy,
        4..=5 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

/// Assigns each student a question no one else in the batch received.
///
/// A student whose `max_attempts` draws all collide is left out.
pub(crate) fn generate_for_students<R: Rng + ?Sized>(
    rng: &mut R,
    subject: &str,
    students: &[StudentRef],
    max_attempts: u32,
    batch_millis: i128,
) -> Vec<GeneratedQuestion> {
    let bank = Subject::from_name(subject).bank();
    generate_from_bank(rng, bank, subject, students, max_attempts, batch_millis)
}

pub(crate) fn generate_from_bank<R: Rng + ?Sized>(
    rng: &mut R,
    bank: &SubjectBank,
    subject: &str,
    students: &[StudentRef],
    max_attempts: u32,
    batch_millis: i128,
) -> Vec<GeneratedQuestion> {
    let mut used = HashSet::new();
    let mut questions = Vec::with_capacity(students.len());

    for student in students {
        let mut assigned = None;
        for _ in 0..max_attempts {
            let Some(template) = bank.templates.choose(rng) else {
                break;
            };
            let filled = fill_template(rng, template, bank);
            if used.insert(filled.combination_key()) {
                assigned = Some(filled);
                break;
            }
        }

        let Some(filled) = assigned else {
            tracing::warn!(
                student_id = %student.id,
                max_attempts,
                "no unique question left for student"
            );
            continue;
        };

        questions.push(GeneratedQuestion {
            unique_id: format!("Q{batch_millis}_{}", questions.len()),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            subject: subject.to_string(),
            difficulty: difficulty_for(filled.parameters.len()),
            question_text: filled.text,
            parameters: filled.parameters,
            expected_answer: EXPECTED_ANSWER.to_string(),
        });
    }

    questions
}
