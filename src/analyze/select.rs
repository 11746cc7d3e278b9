//! Best-candidate selection.

use super::filter::NewsFilter;
use crate::ingest::types::Candidate;

/// Validate + score `raw`, return the highest-scoring item.
/// Equal scores resolve to the earliest item in input order.
pub fn select_best(filter: &NewsFilter, raw: Vec<Candidate>) -> Option<Candidate> {
    if raw.is_empty() {
        return None;
    }
    pick_highest(filter.filter_news(raw))
}

/// Highest `quality_score` wins; the first one seen wins a tie.
pub fn pick_highest(scored: Vec<Candidate>) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for c in scored {
        let s = c.quality_score.unwrap_or(0.0);
        match &best {
            Some(b) if s <= b.quality_score.unwrap_or(0.0) => {}
            _ => best = Some(c),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(title: &str, score: f64) -> Candidate {
        Candidate {
            title: title.into(),
            quality_score: Some(score),
            ..Default::default()
        }
    }

    #[test]
    fn empty_gives_none() {
        assert!(pick_highest(vec![]).is_none());
        assert!(select_best(&NewsFilter::default(), vec![]).is_none());
    }

    #[test]
    fn max_wins() {
        let best = pick_highest(vec![scored("a", 3.0), scored("b", 9.0), scored("c", 4.0)]);
        assert_eq!(best.unwrap().title, "b");
    }

    #[test]
    fn tie_keeps_first_seen() {
        let best = pick_highest(vec![scored("a", 2.0), scored("b", 7.0), scored("c", 7.0)]);
        assert_eq!(best.unwrap().title, "b");
    }
}
