use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{Difficulty, ExamStatus, QuestionType, SessionStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) instructor_id: String,
    pub(crate) duration_minutes: i32,
    pub(crate) status: ExamStatus,
    pub(crate) max_attempts: i32,
    pub(crate) shuffle_questions: bool,
    pub(crate) show_results: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) difficulty: Difficulty,
    pub(crate) content: String,
    pub(crate) options: Option<Json<Vec<String>>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) points: f64,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSession {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) ended_at: Option<PrimitiveDateTime>,
    pub(crate) time_remaining: Option<i32>,
    pub(crate) current_question_index: i32,
    pub(crate) student_seed: Option<String>,
    pub(crate) device_info: Option<Json<serde_json::Value>>,
    pub(crate) ip_address: Option<String>,
    pub(crate) flagged_activities: Json<Vec<FlaggedActivity>>,
    pub(crate) proctor_notes: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamAnswer {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) question_id: String,
    pub(crate) answer: Option<String>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_awarded: Option<f64>,
    pub(crate) time_spent: Option<i32>,
    pub(crate) answered_at: PrimitiveDateTime,
}

/// One entry of a session's append-only integrity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FlaggedActivity {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) data: serde_json::Value,
    pub(crate) timestamp: String,
    #[serde(rename = "studentId")]
    pub(crate) student_id: String,
}

/// Student on the question lab roster; independent of login accounts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct RosterStudent {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) status: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StoredQuestion {
    pub(crate) id: String,
    pub(crate) unique_id: String,
    pub(crate) student_id: String,
    pub(crate) subject: String,
    pub(crate) question_text: String,
    pub(crate) parameters: Json<serde_json::Map<String, serde_json::Value>>,
    pub(crate) expected_answer: String,
    pub(crate) difficulty: Difficulty,
    pub(crate) generated_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}
