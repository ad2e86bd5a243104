use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{RosterStudent, StoredQuestion};
use crate::db::types::Difficulty;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GenerateQuestionsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Subject is required"))]
    pub(crate) subject: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuestionListQuery {
    pub(crate) subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StoredQuestionResponse {
    pub(crate) id: String,
    pub(crate) unique_id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) subject: String,
    pub(crate) question_text: String,
    pub(crate) parameters: serde_json::Map<String, serde_json::Value>,
    pub(crate) expected_answer: String,
    pub(crate) difficulty: Difficulty,
    pub(crate) created_at: String,
}

impl StoredQuestionResponse {
    pub(crate) fn from_db(question: StoredQuestion, student_name: String) -> Self {
        Self {
            id: question.id,
            unique_id: question.unique_id,
            student_id: question.student_id,
            student_name,
            subject: question.subject,
            question_text: question.question_text,
            parameters: question.parameters.0,
            expected_answer: question.expected_answer,
            difficulty: question.difficulty,
            created_at: format_primitive(question.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RosterStudentCreate {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub(crate) name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(default = "default_status")]
    #[validate(length(min = 1, max = 32, message = "status must be 1-32 characters"))]
    pub(crate) status: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct RosterStudentUpdate {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub(crate) name: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[validate(length(min = 1, max = 32, message = "status must be 1-32 characters"))]
    pub(crate) status: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RosterStudentResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) status: String,
    pub(crate) created_at: String,
}

impl RosterStudentResponse {
    pub(crate) fn from_db(student: RosterStudent) -> Self {
        Self {
            id: student.id,
            name: student.name,
            email: student.email,
            status: student.status,
            created_at: format_primitive(student.created_at),
        }
    }
}

fn default_status() -> String {
    "active".to_string()
}
