//! Synthetic usage cost: whitespace token count times a flat per-token rate.

use serde::{Deserialize, Serialize};

/// Default rate in cost units per whitespace-delimited token.
pub const DEFAULT_RATE_PER_TOKEN: f64 = 0.00002;

/// Count non-empty whitespace-delimited tokens.
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub rate_per_token: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            rate_per_token: DEFAULT_RATE_PER_TOKEN,
        }
    }
}

impl CostModel {
    pub fn new(rate_per_token: f64) -> Self {
        Self { rate_per_token }
    }

    /// Cost of a block of text. Never negative.
    pub fn cost(&self, text: &str) -> f64 {
        let cost = token_count(text) as f64 * self.rate_per_token;
        if cost.is_finite() && cost > 0.0 {
            cost
        } else {
            0.0
        }
    }

    /// Cost of one turn: the prompt and every reply joined by single spaces.
    pub fn turn_cost<'a>(&self, prompt: &str, replies: impl IntoIterator<Item = &'a str>) -> f64 {
        let joined = replies.into_iter().collect::<Vec<_>>().join(" ");
        self.cost(&format!("{prompt} {joined}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_count_splits_whitespace_runs() {
        assert_eq!(token_count("a  b\t\nc"), 3);
        assert_eq!(token_count("   "), 0);
        assert_eq!(token_count(""), 0);
    }

    #[test]
    fn test_cost_default_rate() {
        let model = CostModel::default();
        assert_eq!(model.cost(""), 0.0);
        assert_eq!(model.cost(" \n "), 0.0);
        assert!((model.cost("one two three") - 0.00006).abs() < 1e-12);
    }

    #[test]
    fn test_turn_cost_joins_with_spaces() {
        let model = CostModel::new(1.0);
        assert_eq!(model.turn_cost("what is 2+2", ["Tasks: x", "Computation result: 4"]), 8.0);
        assert_eq!(model.turn_cost("solo", std::iter::empty()), 1.0);
    }

    #[test]
    fn test_negative_rate_never_yields_negative_cost() {
        let model = CostModel::new(-1.0);
        assert_eq!(model.cost("a b c"), 0.0);
    }
}
