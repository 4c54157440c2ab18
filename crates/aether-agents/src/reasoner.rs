//! Rule-based responder used when no inference engine is available.

use crate::expr::{clean_expression, evaluate, format_number};
use crate::topics;

pub const CALCULATION_FAILED: &str = "Unable to compute expression safely.";

pub const BRANDING_GUIDANCE: &str = "Design brief parsed. Use Image Lab → Logo to generate an SVG logo. Suggested palette: #6c5ce7, #00d2d3, #f368e0.";

pub const SCENERY_GUIDANCE: &str = "Concept art plan: layered gradients, mist, soft foliage, sun/moon glow. Use Image Lab → Ghibli Scene to render.";

pub const IMAGERY_GUIDANCE: &str = "Image understanding available. Upload in Image Lab to analyze dominant colors, dimensions, and luminance.";

const GENERAL_PLAN: [&str; 4] = [
    "Clarify goals and constraints.",
    "Identify tools or agents needed.",
    "Execute stepwise with checks.",
    "Summarize results and next steps.",
];

/// Number of prompt tokens echoed back in the general plan.
const SEED_TOKENS: usize = 20;

/// Which rule answered a prompt. Rules are tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Calculation,
    Branding,
    Scenery,
    Imagery,
    General,
}

pub fn route(prompt: &str) -> Route {
    let lower = prompt.to_lowercase();
    if topics::mentions_calculation(&lower) {
        Route::Calculation
    } else if topics::mentions_branding(&lower) {
        Route::Branding
    } else if topics::mentions_scenery(&lower) {
        Route::Scenery
    } else if topics::mentions_imagery(&lower) {
        Route::Imagery
    } else {
        Route::General
    }
}

/// Answer a prompt. Deterministic: the same prompt always yields the same text.
pub fn respond(prompt: &str) -> String {
    match route(prompt) {
        Route::Calculation => compute(prompt),
        Route::Branding => BRANDING_GUIDANCE.to_string(),
        Route::Scenery => SCENERY_GUIDANCE.to_string(),
        Route::Imagery => IMAGERY_GUIDANCE.to_string(),
        Route::General => general_plan(prompt),
    }
}

fn compute(prompt: &str) -> String {
    let expr = clean_expression(prompt);
    match evaluate(&expr) {
        Ok(value) => format!("Computation result: {}", format_number(value)),
        Err(e) => {
            tracing::debug!(expr = %expr, "Expression rejected: {e}");
            CALCULATION_FAILED.to_string()
        }
    }
}

fn general_plan(prompt: &str) -> String {
    let seed = prompt
        .split_whitespace()
        .take(SEED_TOKENS)
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "Analysis: Your request involves reasoning and synthesis.\nPlan:\n- {}\n\nInitial thoughts: {seed} → approach with modular agents and verifiable steps.",
        GENERAL_PLAN.join("\n- ")
    )
}
