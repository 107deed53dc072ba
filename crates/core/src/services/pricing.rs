//! Pricing and scope-decision engine.
//!
//! [`PricingEngine::evaluate`] is a pure function from assignment
//! attributes to a [`PricingDecision`]; it never touches the database and
//! never fails on missing optional inputs. [`PricingService`] wraps it with
//! the operator-managed rule table.

use aho_corasick::AhoCorasick;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use academy_common::AppResult;
use academy_db::entities::pricing_rule;
use academy_db::repositories::PricingRuleRepository;

pub use academy_db::entities::pricing_rule::Complexity;

/// Phrases that put an assignment out of scope regardless of anything else.
/// Substring matching is deliberately conservative; false positives are
/// reviewed by operators.
const DENYLIST_PHRASES: [&str; 6] = [
    "take exam",
    "take test",
    "cheat",
    "plagiarize",
    "hack",
    "illegal",
];

/// Assignment types that are always high complexity.
const HIGH_TYPES: [&str; 3] = ["Thesis", "Dissertation", "Research Paper"];

/// Assignment types that are always medium complexity.
const MEDIUM_TYPES: [&str; 4] = ["Project", "Case Study", "Lab Report", "Presentation"];

/// Description keywords suggesting low complexity. Checked before the high
/// keywords, and only when the type was not decisive.
const LOW_KEYWORDS: [&str; 5] = ["simple", "basic", "short", "brief", "summary"];

/// Description keywords suggesting high complexity.
const HIGH_KEYWORDS: [&str; 6] = [
    "research",
    "analysis",
    "comprehensive",
    "detailed",
    "complex",
    "advanced",
];

/// Formatting requirements recognized in descriptions.
const REQUIREMENT_MARKERS: [&str; 12] = [
    "APA",
    "MLA",
    "Chicago",
    "references",
    "bibliography",
    "citations",
    "double-spaced",
    "word count",
    "page count",
    "data analysis",
    "charts",
    "appendix",
];

/// Hourly rate used when a rule table exists but carries no row for the
/// computed complexity.
const DEFAULT_HOURLY_RATE: f64 = 15.0;

#[allow(clippy::expect_used)] // static literal patterns always compile
static DENYLIST: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(DENYLIST_PHRASES)
        .expect("denylist automaton")
});

/// Urgency tiers derived from the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    /// More than three days out.
    Normal,
    /// Due within three days.
    Urgent,
    /// Due within one day (or already past due).
    Express,
}

impl Urgency {
    /// Price multiplier for this tier.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Normal => 1.0,
            Self::Urgent => 1.4,
            Self::Express => 1.8,
        }
    }

    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
            Self::Express => "express",
        }
    }
}

/// Attributes the engine evaluates. All fields except the type are
/// optional and have defined defaults.
#[derive(Debug, Clone, Default)]
pub struct PricingInput {
    /// Assignment type, e.g. "Essay".
    pub assignment_type: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Due date; absent means a week out.
    pub due_date: Option<DateTime<Utc>>,
    /// School level (Primary/Middle/High/University).
    pub school_level: Option<String>,
}

/// The engine's verdict for one assignment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDecision {
    /// Whether the assignment is eligible for fulfillment.
    pub in_scope: bool,
    /// Populated when out of scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub complexity: Complexity,
    pub urgency: Urgency,
    pub days_until_due: i64,
    pub estimated_hours: i32,
    /// Rounded to 2 decimal places.
    pub price: f64,
    pub currency: String,
    pub confidence: f64,
    /// Formatting requirements recognized in the description.
    pub requirements: Vec<String>,
}

/// Pure pricing computation.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    currency: String,
}

impl PricingEngine {
    /// Create an engine quoting in the given currency.
    #[must_use]
    pub const fn new(currency: String) -> Self {
        Self { currency }
    }

    /// Evaluate an assignment against the rule table.
    ///
    /// `now` is passed in so the computation stays deterministic for
    /// callers and tests.
    #[must_use]
    pub fn evaluate(
        &self,
        input: &PricingInput,
        rules: &[pricing_rule::Model],
        now: DateTime<Utc>,
    ) -> PricingDecision {
        let desc_lower = input
            .description
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        let days_until_due = days_until_due(input.due_date, now);
        let urgency = urgency_for(days_until_due);

        // Scope check short-circuits everything else
        if DENYLIST.is_match(&desc_lower) {
            return PricingDecision {
                in_scope: false,
                reason: Some("Assignment contains prohibited content".to_string()),
                complexity: Complexity::Low,
                urgency,
                days_until_due,
                estimated_hours: 0,
                price: 0.0,
                currency: self.currency.clone(),
                confidence: 0.95,
                requirements: Vec::new(),
            };
        }

        let complexity = classify_complexity(&input.assignment_type, &desc_lower);

        let estimated_hours =
            (base_hours(complexity) * type_multiplier(&input.assignment_type)).round() as i32;

        let rate = hourly_rate(rules, complexity, &input.assignment_type);
        let school = school_multiplier(input.school_level.as_deref());
        let price = round2(rate * f64::from(estimated_hours) * urgency.multiplier() * school);

        PricingDecision {
            in_scope: true,
            reason: None,
            complexity,
            urgency,
            days_until_due,
            estimated_hours,
            price,
            currency: self.currency.clone(),
            confidence: 0.95,
            requirements: extract_requirements(&desc_lower),
        }
    }
}

/// Pricing service: loads the operator rule table and runs the engine.
#[derive(Clone)]
pub struct PricingService {
    rule_repo: PricingRuleRepository,
    engine: PricingEngine,
}

impl PricingService {
    /// Create a new pricing service.
    #[must_use]
    pub const fn new(rule_repo: PricingRuleRepository, engine: PricingEngine) -> Self {
        Self { rule_repo, engine }
    }

    /// Produce a quote for the given input against the current rule table.
    pub async fn quote(&self, input: &PricingInput) -> AppResult<PricingDecision> {
        let rules = self.rule_repo.list().await?;
        Ok(self.engine.evaluate(input, &rules, Utc::now()))
    }
}

fn days_until_due(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    due_date.map_or(7, |due| {
        let millis = (due - now).num_milliseconds();
        (millis as f64 / 86_400_000.0).ceil() as i64
    })
}

const fn urgency_for(days_until_due: i64) -> Urgency {
    if days_until_due <= 1 {
        Urgency::Express
    } else if days_until_due <= 3 {
        Urgency::Urgent
    } else {
        Urgency::Normal
    }
}

/// Type-based classification wins; keyword scan only runs when the type is
/// inconclusive, and the low-keyword check deliberately precedes the
/// high-keyword check there.
fn classify_complexity(assignment_type: &str, desc_lower: &str) -> Complexity {
    if HIGH_TYPES.contains(&assignment_type) {
        Complexity::High
    } else if MEDIUM_TYPES.contains(&assignment_type) {
        Complexity::Medium
    } else if LOW_KEYWORDS.iter().any(|w| desc_lower.contains(w)) {
        Complexity::Low
    } else if HIGH_KEYWORDS.iter().any(|w| desc_lower.contains(w)) {
        Complexity::High
    } else {
        Complexity::Medium
    }
}

const fn base_hours(complexity: Complexity) -> f64 {
    match complexity {
        Complexity::Low => 2.0,
        Complexity::Medium => 5.0,
        Complexity::High => 10.0,
    }
}

fn type_multiplier(assignment_type: &str) -> f64 {
    match assignment_type {
        "Research Paper" => 2.0,
        "Project" | "Case Study" => 1.5,
        "Homework" => 0.5,
        "Lab Report" => 1.2,
        "Presentation" => 0.8,
        "Thesis" => 3.0,
        "Dissertation" => 4.0,
        // "Essay", "Other" and anything unrecognized
        _ => 1.0,
    }
}

/// Rate lookup with the exact fallback chain: (complexity, type) rule,
/// then (complexity, "default") rule, then any rule for the complexity,
/// then the static table when no rule table exists at all.
fn hourly_rate(
    rules: &[pricing_rule::Model],
    complexity: Complexity,
    assignment_type: &str,
) -> f64 {
    if rules.is_empty() {
        return fallback_rate(complexity);
    }

    rules
        .iter()
        .find(|r| {
            r.complexity == complexity
                && (r.assignment_type == assignment_type || r.assignment_type == "default")
        })
        .or_else(|| rules.iter().find(|r| r.complexity == complexity))
        .map_or(DEFAULT_HOURLY_RATE, |r| r.hourly_rate)
}

const fn fallback_rate(complexity: Complexity) -> f64 {
    match complexity {
        Complexity::Low => 12.0,
        Complexity::Medium => 20.0,
        Complexity::High => 35.0,
    }
}

fn school_multiplier(school_level: Option<&str>) -> f64 {
    match school_level {
        Some("Primary") => 0.7,
        Some("Middle") => 0.8,
        Some("University") => 1.3,
        // "High", unknown levels and missing all price at face value
        _ => 1.0,
    }
}

fn extract_requirements(desc_lower: &str) -> Vec<String> {
    if desc_lower.is_empty() {
        return Vec::new();
    }
    REQUIREMENT_MARKERS
        .iter()
        .filter(|m| desc_lower.contains(&m.to_lowercase()))
        .map(|m| (*m).to_string())
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn engine() -> PricingEngine {
        PricingEngine::new("GBP".to_string())
    }

    fn input(assignment_type: &str, description: &str, days_out: i64) -> PricingInput {
        PricingInput {
            assignment_type: assignment_type.to_string(),
            description: Some(description.to_string()),
            due_date: Some(Utc::now() + Duration::days(days_out)),
            school_level: None,
        }
    }

    fn rule(complexity: Complexity, assignment_type: &str, rate: f64) -> pricing_rule::Model {
        pricing_rule::Model {
            id: format!("rule_{}_{assignment_type}", complexity.as_str()),
            complexity,
            assignment_type: assignment_type.to_string(),
            hourly_rate: rate,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn short_basic_essay_is_low_complexity() {
        let now = Utc::now();
        let decision = engine().evaluate(
            &PricingInput {
                assignment_type: "Essay".to_string(),
                description: Some("a short basic essay".to_string()),
                due_date: Some(now + Duration::days(10)),
                school_level: Some("High".to_string()),
            },
            &[],
            now,
        );

        assert!(decision.in_scope);
        assert_eq!(decision.complexity, Complexity::Low);
        assert_eq!(decision.estimated_hours, 2);
        assert_eq!(decision.urgency, Urgency::Normal);
        // fallback rate 12 * 2h * 1.0 urgency * 1.0 school
        assert_eq!(decision.price, 24.0);
    }

    #[test]
    fn thesis_due_today_is_high_and_express() {
        let now = Utc::now();
        let decision = engine().evaluate(
            &PricingInput {
                assignment_type: "Thesis".to_string(),
                description: Some(String::new()),
                due_date: Some(now),
                school_level: None,
            },
            &[],
            now,
        );

        assert_eq!(decision.complexity, Complexity::High);
        assert_eq!(decision.estimated_hours, 30);
        assert!(decision.days_until_due <= 1);
        assert_eq!(decision.urgency, Urgency::Express);
        // fallback rate 35 * 30h * 1.8 express * 1.0 school
        assert_eq!(decision.price, 1890.0);
    }

    #[test]
    fn denylisted_description_is_out_of_scope() {
        let decision = engine().evaluate(
            &input("Essay", "please hack the portal for me", 10),
            &[],
            Utc::now(),
        );

        assert!(!decision.in_scope);
        assert!(decision.reason.is_some());
        assert_eq!(decision.price, 0.0);
        assert_eq!(decision.estimated_hours, 0);
    }

    #[test]
    fn denylist_is_case_insensitive() {
        for phrase in ["TAKE EXAM for me", "Please Cheat", "PLAGIARIZE this"] {
            let decision = engine().evaluate(&input("Essay", phrase, 10), &[], Utc::now());
            assert!(!decision.in_scope, "{phrase} should be out of scope");
            assert_eq!(decision.price, 0.0);
        }
    }

    #[test]
    fn medium_type_beats_low_keyword() {
        // "simple" would classify low, but Project is a medium type and
        // type-based classification takes priority
        let decision = engine().evaluate(&input("Project", "a simple project", 10), &[], Utc::now());
        assert_eq!(decision.complexity, Complexity::Medium);
    }

    #[test]
    fn low_keyword_beats_high_keyword_for_inconclusive_type() {
        // Both keyword families present; the low check runs first
        let decision = engine().evaluate(
            &input("Essay", "a short but comprehensive essay", 10),
            &[],
            Utc::now(),
        );
        assert_eq!(decision.complexity, Complexity::Low);
    }

    #[test]
    fn high_keyword_applies_when_type_inconclusive() {
        let decision = engine().evaluate(
            &input("Essay", "an advanced analysis of markets", 10),
            &[],
            Utc::now(),
        );
        assert_eq!(decision.complexity, Complexity::High);
    }

    #[test]
    fn default_complexity_is_medium() {
        let decision = engine().evaluate(&input("Essay", "write about birds", 10), &[], Utc::now());
        assert_eq!(decision.complexity, Complexity::Medium);
    }

    #[test]
    fn urgency_boundaries() {
        let now = Utc::now();
        let e = engine();

        // Due dates built from the same `now` the engine sees, so the
        // ceil lands exactly on the day boundary
        let at = |days: i64| {
            e.evaluate(
                &PricingInput {
                    assignment_type: "Essay".to_string(),
                    description: None,
                    due_date: Some(now + Duration::days(days)),
                    school_level: None,
                },
                &[],
                now,
            )
            .urgency
        };

        assert_eq!(at(1), Urgency::Express);
        assert_eq!(at(2), Urgency::Urgent);
        assert_eq!(at(3), Urgency::Urgent);
        assert_eq!(at(4), Urgency::Normal);
    }

    #[test]
    fn past_due_date_computes_express() {
        let now = Utc::now();
        let decision = engine().evaluate(
            &PricingInput {
                assignment_type: "Essay".to_string(),
                description: None,
                due_date: Some(now - Duration::days(2)),
                school_level: None,
            },
            &[],
            now,
        );
        assert!(decision.days_until_due < 0);
        assert_eq!(decision.urgency, Urgency::Express);
    }

    #[test]
    fn missing_due_date_defaults_to_a_week() {
        let decision = engine().evaluate(
            &PricingInput {
                assignment_type: "Essay".to_string(),
                description: None,
                due_date: None,
                school_level: None,
            },
            &[],
            Utc::now(),
        );
        assert_eq!(decision.days_until_due, 7);
        assert_eq!(decision.urgency, Urgency::Normal);
    }

    #[test]
    fn unknown_type_gets_unit_multiplier() {
        let decision = engine().evaluate(&input("Interpretive Dance", "", 10), &[], Utc::now());
        // medium base hours 5 * 1.0
        assert_eq!(decision.estimated_hours, 5);
    }

    #[test]
    fn rule_fallback_chain() {
        let now = Utc::now();
        let e = engine();
        let probe = input("Essay", "write about birds", 10); // medium, 5h, normal

        // Specific-type rule wins
        let rules = vec![
            rule(Complexity::Medium, "Essay", 30.0),
            rule(Complexity::Medium, "default", 18.0),
        ];
        assert_eq!(e.evaluate(&probe, &rules, now).price, 150.0);

        // Complexity-wide default next
        let rules = vec![
            rule(Complexity::Medium, "default", 18.0),
            rule(Complexity::High, "Essay", 50.0),
        ];
        assert_eq!(e.evaluate(&probe, &rules, now).price, 90.0);

        // Any rule for the complexity next
        let rules = vec![rule(Complexity::Medium, "Dissertation", 22.0)];
        assert_eq!(e.evaluate(&probe, &rules, now).price, 110.0);

        // Table present but nothing for the complexity: flat default rate
        let rules = vec![rule(Complexity::High, "Thesis", 50.0)];
        assert_eq!(e.evaluate(&probe, &rules, now).price, 75.0);

        // No table at all: static per-complexity fallback
        assert_eq!(e.evaluate(&probe, &[], now).price, 100.0);
    }

    #[test]
    fn school_multiplier_applies() {
        let now = Utc::now();
        let e = engine();
        let mut probe = input("Essay", "write about birds", 10); // medium, 5h

        probe.school_level = Some("University".to_string());
        assert_eq!(e.evaluate(&probe, &[], now).price, 130.0);

        probe.school_level = Some("Primary".to_string());
        assert_eq!(e.evaluate(&probe, &[], now).price, 70.0);

        probe.school_level = Some("Night School".to_string());
        assert_eq!(e.evaluate(&probe, &[], now).price, 100.0);
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let now = Utc::now();
        let e = engine();
        let probe = PricingInput {
            assignment_type: "Research Paper".to_string(),
            description: Some("comprehensive study with data analysis".to_string()),
            due_date: Some(now + Duration::days(2)),
            school_level: Some("University".to_string()),
        };
        let rules = vec![rule(Complexity::High, "Research Paper", 40.0)];

        let a = e.evaluate(&probe, &rules, now);
        let b = e.evaluate(&probe, &rules, now);
        assert_eq!(a.price, b.price);
        assert_eq!(a.estimated_hours, b.estimated_hours);
        assert_eq!(a.complexity, b.complexity);
    }

    #[test]
    fn price_rounds_to_two_decimals() {
        let now = Utc::now();
        // 5h medium * 10.333 rate = 51.665 -> 51.67 (banker-free round)
        let rules = vec![rule(Complexity::Medium, "default", 10.333)];
        let decision = engine().evaluate(&input("Essay", "write about birds", 10), &rules, now);
        assert_eq!(decision.price, (10.333_f64 * 5.0 * 100.0).round() / 100.0);
    }

    #[test]
    fn requirements_are_extracted() {
        let decision = engine().evaluate(
            &input(
                "Essay",
                "Needs APA style citations and a word count of 2000",
                10,
            ),
            &[],
            Utc::now(),
        );
        assert_eq!(
            decision.requirements,
            vec!["APA".to_string(), "citations".to_string(), "word count".to_string()]
        );
    }

    #[test]
    fn missing_description_still_produces_a_decision() {
        let decision = engine().evaluate(
            &PricingInput {
                assignment_type: "Essay".to_string(),
                ..Default::default()
            },
            &[],
            Utc::now(),
        );
        assert!(decision.in_scope);
        assert_eq!(decision.complexity, Complexity::Medium);
        assert!(decision.requirements.is_empty());
    }
}
