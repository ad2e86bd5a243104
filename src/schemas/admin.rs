use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct SystemStatsResponse {
    pub(crate) total_users: i64,
    pub(crate) active_exams: i64,
    /// Completed sessions as a percentage of all sessions, two decimals.
    pub(crate) completion_rate: f64,
    pub(crate) flagged_sessions: i64,
    pub(crate) connected_students: usize,
    pub(crate) connected_staff: usize,
}

pub(crate) fn completion_rate(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let percent = completed as f64 * 100.0 / total as f64;
    (percent * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::completion_rate;

    #[test]
    fn completion_rate_rounds_to_two_decimals() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(1, 3), 33.33);
        assert_eq!(completion_rate(2, 3), 66.67);
        assert_eq!(completion_rate(5, 5), 100.0);
    }
}
