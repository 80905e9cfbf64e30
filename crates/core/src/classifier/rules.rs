#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

//! Rule dictionaries for the classification engine. All matching happens on
//! lowercased text, so every keyword here is lowercase.

use regex::Regex;

use crate::knowledge::{KnowledgeClassification, KnowledgePriority};

/// Weighted signals for one classification tier
pub struct ClassificationRule {
    pub classification: KnowledgeClassification,
    pub keywords: Vec<&'static str>,
    pub patterns: Vec<Regex>,
    pub categories: Vec<&'static str>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("hard-coded classification pattern compiles"))
        .collect()
}

/// Per-tier signal tables, ordered so ties resolve toward the higher tier.
pub fn classification_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            classification: KnowledgeClassification::Foundational,
            keywords: vec![
                "mission",
                "vision",
                "core",
                "fundamental",
                "principle",
                "company overview",
                "foundation",
                "pillar",
                "essence",
                "pay ready",
                "bootstrapped",
                "profitable",
                "$20b",
            ],
            patterns: compile(&[
                r"company\s+(mission|vision|values)",
                r"core\s+(business|principle|value)",
                r"fundamental\s+(strategy|approach)",
                r"pay\s+ready.*platform",
            ]),
            categories: vec!["company_overview", "core_values", "mission_vision"],
        },
        ClassificationRule {
            classification: KnowledgeClassification::Strategic,
            keywords: vec![
                "strategy",
                "strategic",
                "initiative",
                "roadmap",
                "plan",
                "executive decision",
                "board",
                "investment",
                "acquisition",
                "market position",
                "competitive",
                "growth",
            ],
            patterns: compile(&[
                r"strategic\s+(initiative|plan|direction)",
                r"executive\s+(decision|approval)",
                r"board\s+(meeting|decision|presentation)",
                r"market\s+(analysis|intelligence|position)",
            ]),
            categories: vec![
                "strategic_initiatives",
                "executive_decisions",
                "market_intelligence",
            ],
        },
        ClassificationRule {
            classification: KnowledgeClassification::Operational,
            keywords: vec![
                "process",
                "procedure",
                "workflow",
                "task",
                "operation",
                "daily",
                "routine",
                "standard",
                "implementation",
                "metric",
                "kpi",
                "performance",
                "report",
            ],
            patterns: compile(&[
                r"operational\s+(process|procedure)",
                r"daily\s+(operation|task|report)",
                r"standard\s+(procedure|workflow)",
                r"performance\s+(metric|indicator)",
            ]),
            categories: vec!["operations", "processes", "metrics", "reports"],
        },
        ClassificationRule {
            classification: KnowledgeClassification::Reference,
            keywords: vec![
                "reference",
                "documentation",
                "guide",
                "manual",
                "resource",
                "policy",
                "compliance",
                "regulation",
                "standard",
                "template",
                "example",
                "best practice",
            ],
            patterns: compile(&[
                r"reference\s+(document|material)",
                r"compliance\s+(requirement|standard)",
                r"best\s+practice",
                r"policy\s+(document|manual)",
            ]),
            categories: vec!["policies", "documentation", "compliance", "templates"],
        },
    ]
}

/// Priority keyword buckets, checked highest first.
pub fn priority_rules() -> Vec<(KnowledgePriority, Vec<&'static str>)> {
    vec![
        (
            KnowledgePriority::Critical,
            vec![
                "ceo",
                "board",
                "investor",
                "acquisition",
                "merger",
                "crisis",
                "critical",
                "urgent",
                "immediate",
                "compliance violation",
                "legal",
                "security breach",
            ],
        ),
        (
            KnowledgePriority::High,
            vec![
                "strategic",
                "executive",
                "important",
                "priority",
                "key initiative",
                "major",
                "significant",
                "core",
                "foundational",
                "pay ready",
                "$20b",
                "100 employees",
            ],
        ),
        (
            KnowledgePriority::Medium,
            vec![
                "standard",
                "regular",
                "normal",
                "typical",
                "process",
                "procedure",
                "workflow",
                "operational",
            ],
        ),
        (
            KnowledgePriority::Low,
            vec![
                "minor",
                "trivial",
                "optional",
                "nice-to-have",
                "reference",
                "archive",
                "historical",
            ],
        ),
    ]
}

/// PII patterns: SSN, email, phone, credit card.
pub const fn pii_patterns() -> [&'static str; 4] {
    [
        r"\b\d{3}-\d{2}-\d{4}\b",
        r"\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b",
        r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b",
        r"\b\d{4}\s?\d{4}\s?\d{4}\s?\d{4}\b",
    ]
}

pub const FINANCIAL_KEYWORDS: [&str; 13] = [
    "revenue", "profit", "loss", "margin", "cost", "budget", "forecast", "financial", "earnings",
    "$", "dollar", "million", "billion",
];

pub const STRATEGIC_KEYWORDS: [&str; 11] = [
    "strategy",
    "roadmap",
    "initiative",
    "acquisition",
    "merger",
    "competitive",
    "confidential",
    "proprietary",
    "board",
    "investor",
    "executive decision",
];

pub const LEGAL_KEYWORDS: [&str; 12] = [
    "legal",
    "contract",
    "agreement",
    "compliance",
    "regulation",
    "lawsuit",
    "liability",
    "dispute",
    "patent",
    "trademark",
    "copyright",
    "nda",
];

/// Explicit confidentiality markers
pub const fn confidential_markers() -> [&'static str; 4] {
    [
        "confidential",
        "proprietary",
        "internal only",
        "do not share",
    ]
}

/// Technology keyword → tag
pub const fn tech_tag_rules() -> [(&'static str, &'static str); 6] {
    [
        ("ai", "ai_powered"),
        ("machine learning", "ml"),
        ("automation", "automated"),
        ("api", "api"),
        ("integration", "integration"),
        ("platform", "platform"),
    ]
}

/// Business keyword → tag
pub const fn business_tag_rules() -> [(&'static str, &'static str); 6] {
    [
        ("revenue", "revenue"),
        ("growth", "growth"),
        ("customer", "customer"),
        ("market", "market"),
        ("competitive", "competitive"),
        ("strategy", "strategic"),
    ]
}
