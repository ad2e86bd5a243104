pub(crate) mod exam_paper;
pub(crate) mod question_bank;
pub(crate) mod question_generator;
