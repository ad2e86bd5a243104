use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Exam, Question};
use crate::db::types::{Difficulty, ExamStatus, QuestionType};
use crate::schemas::session::SessionResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, max = 600, message = "duration_minutes must be between 1 and 600"))]
    pub(crate) duration_minutes: i32,
    #[serde(default = "default_max_attempts")]
    #[serde(alias = "maxAttempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: i32,
    #[serde(default)]
    #[serde(alias = "shuffleQuestions")]
    pub(crate) shuffle_questions: bool,
    #[serde(default = "default_true")]
    #[serde(alias = "showResults")]
    pub(crate) show_results: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) instructor_id: String,
    pub(crate) duration_minutes: i32,
    pub(crate) status: ExamStatus,
    pub(crate) max_attempts: i32,
    pub(crate) shuffle_questions: bool,
    pub(crate) show_results: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            instructor_id: exam.instructor_id,
            duration_minutes: exam.duration_minutes,
            status: exam.status,
            max_attempts: exam.max_attempts,
            shuffle_questions: exam.shuffle_questions,
            show_results: exam.show_results,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(rename = "type", alias = "question_type", alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[serde(default = "default_difficulty")]
    pub(crate) difficulty: Difficulty,
    #[validate(length(min = 1, max = 10000, message = "content must be 1-10000 characters"))]
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "correctAnswer")]
    pub(crate) correct_answer: Option<String>,
    #[serde(default = "default_points")]
    #[validate(range(min = 0.0, max = 1000.0, message = "points must be between 0 and 1000"))]
    pub(crate) points: f64,
}

impl QuestionCreate {
    /// Multiple choice needs at least two options and a key among them.
    pub(crate) fn check_options(&self) -> Result<(), &'static str> {
        if self.question_type != QuestionType::MultipleChoice {
            return Ok(());
        }
        let options = self.options.as_deref().unwrap_or_default();
        if options.len() < 2 {
            return Err("Multiple choice questions need at least two options");
        }
        match self.correct_answer.as_deref() {
            Some(key) if !options.iter().any(|option| option == key) => {
                Err("Correct answer must be one of the options")
            }
            _ => Ok(()),
        }
    }
}

/// Full question, correct answer included; staff only.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    #[serde(rename = "type")]
    pub(crate) question_type: QuestionType,
    pub(crate) difficulty: Difficulty,
    pub(crate) content: String,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) points: f64,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            question_type: question.question_type,
            difficulty: question.difficulty,
            content: question.content,
            options: question.options.map(|options| options.0),
            correct_answer: question.correct_answer,
            points: question.points,
            created_at: format_primitive(question.created_at),
        }
    }
}

/// Question as a student sees it on the paper.
#[derive(Debug, Serialize)]
pub(crate) struct PaperQuestion {
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) question_type: QuestionType,
    pub(crate) difficulty: Difficulty,
    pub(crate) content: String,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) points: f64,
}

impl PaperQuestion {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            question_type: question.question_type,
            difficulty: question.difficulty,
            content: question.content,
            options: question.options.map(|options| options.0),
            points: question.points,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperExam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) duration_minutes: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamPaperResponse {
    pub(crate) session: SessionResponse,
    pub(crate) questions: Vec<PaperQuestion>,
    pub(crate) exam: PaperExam,
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

fn default_points() -> f64 {
    1.0
}

fn default_max_attempts() -> i32 {
    1
}

fn default_true() -> bool {
    true
}
