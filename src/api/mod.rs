pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod exams;
pub(crate) mod handlers;
pub(crate) mod proctor;
pub(crate) mod questions;
pub(crate) mod router;
pub(crate) mod sessions;
pub(crate) mod students;
