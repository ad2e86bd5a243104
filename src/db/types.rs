use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Instructor,
    Proctor,
    Student,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Instructor => "instructor",
            Self::Proctor => "proctor",
            Self::Student => "student",
        }
    }

    /// Roles allowed to watch sessions and issue proctor actions.
    pub(crate) fn is_proctoring_staff(self) -> bool {
        matches!(self, Self::Proctor | Self::Instructor)
    }

    pub(crate) fn can_manage_exams(self) -> bool {
        matches!(self, Self::Instructor | Self::Admin)
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "instructor" => Ok(Self::Instructor),
            "proctor" => Ok(Self::Proctor),
            "student" => Ok(Self::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "exam_status", rename_all = "lowercase")]
pub(crate) enum ExamStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

/// Lifecycle of one student's attempt.
///
/// `active` and `paused` alternate freely; `completed` and `terminated` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "session_status", rename_all = "lowercase")]
pub(crate) enum SessionStatus {
    Active,
    Paused,
    Completed,
    Terminated,
}

impl SessionStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
        }
    }

    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }

    /// Statuses a status-changing action may start from. Re-applying the
    /// current non-terminal status is allowed.
    pub(crate) const LIVE: [SessionStatus; 2] = [Self::Active, Self::Paused];

    pub(crate) fn accepts_status_change(self) -> bool {
        Self::LIVE.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "difficulty", rename_all = "lowercase")]
pub(crate) enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    MultipleChoice,
    ShortAnswer,
    Essay,
    Code,
}

impl QuestionType {
    /// Types whose answers can be compared against a stored correct answer.
    pub(crate) fn is_auto_graded(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::ShortAnswer)
    }
}
