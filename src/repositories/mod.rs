pub(crate) mod answers;
pub(crate) mod exams;
pub(crate) mod generated_questions;
pub(crate) mod questions;
pub(crate) mod roster;
pub(crate) mod sessions;
pub(crate) mod stats;
pub(crate) mod users;
