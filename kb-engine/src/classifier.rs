//! Confidence and content-gap classification. Pure functions, no I/O.

use shared_types::{Confidence, UsageAggregate};

/// Top-1 score at or above which a recommendation is high confidence.
pub const HIGH_CONFIDENCE: f64 = 0.7;
/// Top-1 score at or above which a recommendation is medium confidence.
pub const MEDIUM_CONFIDENCE: f64 = 0.4;
/// Top-1 score below which the external notifier is signalled.
pub const ALERT_THRESHOLD: f64 = 0.3;
/// Running average below which repeated usage marks a content gap.
pub const GAP_SCORE_THRESHOLD: f64 = 0.3;
/// Minimum usage events before an article can be a content gap. One outlier
/// query must not flag a gap.
pub const GAP_MIN_USAGE: u64 = 2;

pub fn confidence(top_score: f64) -> Confidence {
    if top_score >= HIGH_CONFIDENCE {
        Confidence::High
    } else if top_score >= MEDIUM_CONFIDENCE {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

pub fn should_alert(top_score: f64) -> bool {
    top_score < ALERT_THRESHOLD
}

pub fn is_content_gap(aggregate: &UsageAggregate) -> bool {
    aggregate.avg_score < GAP_SCORE_THRESHOLD && aggregate.usage_count >= GAP_MIN_USAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(usage_count: u64, avg_score: f64) -> UsageAggregate {
        UsageAggregate {
            article_id: "A1".to_string(),
            usage_count,
            avg_score,
        }
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(confidence(0.9), Confidence::High);
        assert_eq!(confidence(0.7), Confidence::High);
        assert_eq!(confidence(0.69), Confidence::Medium);
        assert_eq!(confidence(0.4), Confidence::Medium);
        assert_eq!(confidence(0.39), Confidence::Low);
        assert_eq!(confidence(0.0), Confidence::Low);
    }

    #[test]
    fn alert_fires_strictly_below_threshold() {
        assert!(should_alert(0.29));
        assert!(!should_alert(0.3));
        assert!(!should_alert(0.9));
    }

    #[test]
    fn single_low_score_is_not_a_gap() {
        assert!(!is_content_gap(&aggregate(1, 0.1)));
    }

    #[test]
    fn repeated_low_scores_are_a_gap() {
        assert!(is_content_gap(&aggregate(2, 0.1)));
        assert!(is_content_gap(&aggregate(10, 0.29)));
    }

    #[test]
    fn well_scoring_articles_are_never_gaps() {
        assert!(!is_content_gap(&aggregate(50, 0.3)));
        assert!(!is_content_gap(&aggregate(50, 0.8)));
    }
}
