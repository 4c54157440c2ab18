//! Vocabulary predicates shared by the reasoner and the agents.

use std::sync::LazyLock;

use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

// Reasoner vocabularies, matched against the lowercased prompt.
static CALCULATION: LazyLock<Regex> = LazyLock::new(|| re(r"\b(calc|calculate|what is|compute)\b"));
static BRANDING: LazyLock<Regex> = LazyLock::new(|| re(r"logo|brand|icon"));
static SCENERY: LazyLock<Regex> = LazyLock::new(|| re(r"ghibli|studio ghibli|scenery|landscape"));
static IMAGERY: LazyLock<Regex> = LazyLock::new(|| re(r"image|photo|picture|analy"));

// Planner and designer vocabularies, case-insensitive substrings.
static PLAN_LOGO: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)logo"));
static PLAN_SCENE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)ghibli|scene|art"));
static PLAN_IMAGE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)analy|image|photo"));
static PLAN_CALC: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)calc|compute|what is"));
static DESIGN_BRAND: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)logo|brand"));

/// A topic the planner can recognize, in the order tasks are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Logo,
    Scenery,
    Image,
    Calculation,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Logo, Topic::Scenery, Topic::Image, Topic::Calculation];

    pub fn matches(&self, prompt: &str) -> bool {
        match self {
            Topic::Logo => PLAN_LOGO.is_match(prompt),
            Topic::Scenery => PLAN_SCENE.is_match(prompt),
            Topic::Image => PLAN_IMAGE.is_match(prompt),
            Topic::Calculation => PLAN_CALC.is_match(prompt),
        }
    }

    pub fn task(&self) -> &'static str {
        match self {
            Topic::Logo => "Generate logo concepts and export SVG.",
            Topic::Scenery => "Render Ghibli-like scenery with gradients and foliage.",
            Topic::Image => "Analyze uploaded image (dimensions, dominant colors).",
            Topic::Calculation => "Evaluate mathematical expression.",
        }
    }
}

pub(crate) fn mentions_calculation(lower: &str) -> bool {
    CALCULATION.is_match(lower)
}

pub(crate) fn mentions_branding(lower: &str) -> bool {
    BRANDING.is_match(lower)
}

pub(crate) fn mentions_scenery(lower: &str) -> bool {
    SCENERY.is_match(lower)
}

pub(crate) fn mentions_imagery(lower: &str) -> bool {
    IMAGERY.is_match(lower)
}

pub(crate) fn mentions_logo_or_brand(prompt: &str) -> bool {
    DESIGN_BRAND.is_match(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculation_needs_word_boundaries() {
        assert!(mentions_calculation("what is 2+2"));
        assert!(mentions_calculation("please calculate 3*3"));
        assert!(mentions_calculation("calc 1+1"));
        assert!(!mentions_calculation("my computer is slow"));
        assert!(!mentions_calculation("calculator"));
    }

    #[test]
    fn test_planner_topics_are_case_insensitive_substrings() {
        assert!(Topic::Logo.matches("LOGO please"));
        assert!(Topic::Scenery.matches("Scenery at dusk"));
        assert!(Topic::Scenery.matches("smart start"));
        assert!(Topic::Image.matches("Analyse this"));
        assert!(Topic::Calculation.matches("my computer"));
        assert!(!Topic::Logo.matches("brand"));
    }

    #[test]
    fn test_designer_vocabulary() {
        assert!(mentions_logo_or_brand("New BRAND identity"));
        assert!(!mentions_logo_or_brand("an icon set"));
    }
}
