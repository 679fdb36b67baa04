//! Presentation of classified samples and scores for the command line.

pub mod analysis;
pub mod periods;

use crate::scoring::ScoreResult;

pub fn format_score(value: f64) -> String {
    format!("{value:.1}")
}

/// Single line with the composite score first, then every component.
pub fn score_line(result: &ScoreResult) -> String {
    format!(
        "{}\t{}\tactivity {}\tapp {}\turl {}\tfocus {}",
        format_score(result.composite_score),
        result.tier,
        format_score(result.activity_score),
        format_score(result.app_score),
        result
            .url_score
            .map(format_score)
            .unwrap_or_else(|| "-".into()),
        format_score(result.focus_score),
    )
}

#[cfg(test)]
mod tests {
    use crate::scoring::ScoreResult;

    use super::score_line;

    #[test]
    fn empty_score_line() {
        assert_eq!(
            score_line(&ScoreResult::empty()),
            "0.0\tVery Low\tactivity 0.0\tapp 0.0\turl -\tfocus 0.0"
        );
    }
}
