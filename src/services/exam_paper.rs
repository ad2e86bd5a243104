//! Paper assembly and scoring of objective answers.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::db::models::Question;

/// Orders a paper. With `shuffle` set the order depends only on `seed`, so a
/// session's seed reproduces its paper.
pub(crate) fn arrange<T>(items: &mut [T], shuffle: bool, seed: u64) {
    if shuffle {
        items.shuffle(&mut StdRng::seed_from_u64(seed));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Score {
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_awarded: Option<f64>,
}

impl Score {
    pub(crate) const UNGRADED: Score = Score { is_correct: None, points_awarded: None };
}

/// Compares against the stored correct answer, ignoring case and outer
/// whitespace. Essays, code and questions without a key stay ungraded.
pub(crate) fn score(question: &Question, answer: Option<&str>) -> Score {
    let Some(expected) = question.correct_answer.as_deref() else {
        return Score::UNGRADED;
    };
    if !question.question_type.is_auto_graded() {
        return Score::UNGRADED;
    }

    let is_correct = answer
        .map(str::trim)
        .is_some_and(|given| given.eq_ignore_ascii_case(expected.trim()));
    Score {
        is_correct: Some(is_correct),
        points_awarded: Some(if is_correct { question.points } else { 0.0 }),
    }
}
