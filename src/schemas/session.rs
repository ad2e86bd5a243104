use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{ExamAnswer, ExamSession, FlaggedActivity};
use crate::db::types::SessionStatus;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExamPaperRequest {
    #[serde(default)]
    #[serde(alias = "deviceInfo")]
    pub(crate) device_info: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: String,
    pub(crate) ended_at: Option<String>,
    pub(crate) time_remaining: Option<i32>,
    pub(crate) current_question_index: i32,
    pub(crate) student_seed: Option<String>,
    pub(crate) flagged_activities: Vec<FlaggedActivity>,
    pub(crate) proctor_notes: Option<String>,
}

impl SessionResponse {
    pub(crate) fn from_db(session: ExamSession) -> Self {
        Self {
            id: session.id,
            exam_id: session.exam_id,
            student_id: session.student_id,
            status: session.status,
            started_at: format_primitive(session.started_at),
            ended_at: session.ended_at.map(format_primitive),
            time_remaining: session.time_remaining,
            current_question_index: session.current_question_index,
            student_seed: session.student_seed,
            flagged_activities: session.flagged_activities.0,
            proctor_notes: session.proctor_notes,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerSubmission {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[serde(default)]
    pub(crate) answer: Option<String>,
    #[serde(default)]
    #[serde(alias = "timeSpent")]
    #[validate(range(min = 0, message = "time_spent must be non-negative"))]
    pub(crate) time_spent: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct SubmitRequest {
    #[serde(default)]
    #[validate(nested)]
    pub(crate) answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) answer: Option<String>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_awarded: Option<f64>,
    pub(crate) time_spent: Option<i32>,
    pub(crate) answered_at: String,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: ExamAnswer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            answer: answer.answer,
            is_correct: answer.is_correct,
            points_awarded: answer.points_awarded,
            time_spent: answer.time_spent,
            answered_at: format_primitive(answer.answered_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResultsResponse {
    pub(crate) session: SessionResponse,
    pub(crate) answers: Vec<AnswerResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProctorActionResponse {
    pub(crate) session_id: String,
    pub(crate) status: SessionStatus,
    /// Live student connections that were told about the change.
    pub(crate) notified: usize,
}
