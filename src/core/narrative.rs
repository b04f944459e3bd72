//! Rule tables for the human-readable text attached to results.
//!
//! Scoring code hands over numbers and labels; everything worded lives here.

use crate::core::scoring::WHITE_SPACE_BANDS;
use crate::models::ScoreBreakdown;

/// Facts a key insight can mention
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    pub subject: &'a str,
    pub crowding_score: f64,
    pub crowding_label: &'a str,
    pub dominant_platform: &'a str,
    pub approved: usize,
    pub pipeline: usize,
    pub top_white_space: Option<&'a str>,
    pub concentration: Option<&'a str>,
}

struct InsightRule {
    applies: fn(&InsightContext) -> bool,
    template: &'static str,
}

fn is_empty_landscape(context: &InsightContext) -> bool {
    context.approved + context.pipeline == 0
}

fn is_low(context: &InsightContext) -> bool {
    context.crowding_label == "Low"
}

fn is_moderate(context: &InsightContext) -> bool {
    context.crowding_label == "Moderate"
}

fn is_high(context: &InsightContext) -> bool {
    context.crowding_label == "High"
}

fn always(_: &InsightContext) -> bool {
    true
}

/// First matching rule wins; the last rule always applies
const INSIGHT_RULES: &[InsightRule] = &[
    InsightRule {
        applies: is_empty_landscape,
        template: "No tracked competitors address {subject} (crowding {score}/10, {label}); {white_space} is open to a first entrant.",
    },
    InsightRule {
        applies: is_low,
        template: "{subject} is an open field (crowding {score}/10, {label}) with {approved} approved and {pipeline} pipeline competitors led by {platform}; early entry in {white_space} can set the standard of care.",
    },
    InsightRule {
        applies: is_moderate,
        template: "{subject} shows moderate crowding ({score}/10) with {approved} approved and {pipeline} pipeline competitors around {platform}; differentiation in {white_space} remains achievable.",
    },
    InsightRule {
        applies: is_high,
        template: "{subject} is crowded ({score}/10, {label}): {approved} approved and {pipeline} pipeline competitors, dominated by {platform}. New entrants need clear differentiation, and {white_space} is the least contested segment.",
    },
    InsightRule {
        applies: always,
        template: "{subject} is saturated ({score}/10, {label}) with {approved} approved and {pipeline} pipeline competitors concentrated in {platform}; only {white_space} still offers white space.",
    },
];

/// Replace `{key}` placeholders in a template
fn render(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

pub fn key_insight(context: &InsightContext) -> String {
    let rule = INSIGHT_RULES
        .iter()
        .find(|rule| (rule.applies)(context))
        .unwrap_or(&INSIGHT_RULES[INSIGHT_RULES.len() - 1]);

    let mut text = render(
        rule.template,
        &[
            ("subject", context.subject.to_string()),
            ("score", format!("{:.1}", context.crowding_score)),
            ("label", context.crowding_label.to_string()),
            ("approved", context.approved.to_string()),
            ("pipeline", context.pipeline.to_string()),
            ("platform", context.dominant_platform.to_string()),
            (
                "white_space",
                context.top_white_space.unwrap_or("an unaddressed segment").to_string(),
            ),
        ],
    );

    if let Some(concentration) = context.concentration {
        text.push_str(&format!(" Market share is {}.", concentration.to_lowercase()));
    }
    text
}

pub fn white_space_rationale(segment: &str, coverage: usize, opportunity_score: f64) -> String {
    let band = WHITE_SPACE_BANDS.label(opportunity_score);
    match coverage {
        0 => format!("No tracked competitor covers {}; {} white space.", segment, band),
        1 => format!("Only one competitor covers {}; {} white space.", segment, band),
        n => format!(
            "{} competitors cover {}, the least contested segment; {} white space.",
            n, segment, band
        ),
    }
}

const SUBSCORE_NAMES: [&str; 6] = [
    "therapeutic alignment",
    "pipeline gap",
    "deal history",
    "financial capacity",
    "geography fit",
    "strategic priority",
];

struct RationaleRule {
    min_top_score: f64,
    template: &'static str,
}

const RATIONALE_RULES: &[RationaleRule] = &[
    RationaleRule {
        min_top_score: 75.0,
        template: "{company} is a strong fit, driven by {first} ({first_score}) and {second} ({second_score}).",
    },
    RationaleRule {
        min_top_score: 50.0,
        template: "{company} is a partial fit: {first} ({first_score}) and {second} ({second_score}) lead its profile.",
    },
    RationaleRule {
        min_top_score: f64::NEG_INFINITY,
        template: "{company} is a weak fit; its best signals are {first} ({first_score}) and {second} ({second_score}).",
    },
];

/// Sentence naming the two strongest sub-scores
pub fn partner_rationale(company: &str, breakdown: &ScoreBreakdown) -> String {
    let mut ranked: Vec<(usize, f64)> = breakdown.as_array().into_iter().enumerate().collect();
    // Stable: equal scores keep the fixed sub-score order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (first, first_score) = ranked[0];
    let (second, second_score) = ranked[1];

    let rule = RATIONALE_RULES
        .iter()
        .find(|rule| first_score >= rule.min_top_score)
        .unwrap_or(&RATIONALE_RULES[RATIONALE_RULES.len() - 1]);

    render(
        rule.template,
        &[
            ("company", company.to_string()),
            ("first", SUBSCORE_NAMES[first].to_string()),
            ("first_score", format!("{:.0}", first_score)),
            ("second", SUBSCORE_NAMES[second].to_string()),
            ("second_score", format!("{:.0}", second_score)),
        ],
    )
}
