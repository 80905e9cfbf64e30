#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

//! Automatic classification of knowledge entities from their content:
//! classification tier, priority, tag suggestions and a sensitivity
//! assessment. Deterministic, no I/O.

mod rules;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::knowledge::{KnowledgeClassification, KnowledgeEntity, KnowledgePriority};
use rules::{
    business_tag_rules, classification_rules, confidential_markers, pii_patterns, priority_rules,
    tech_tag_rules, ClassificationRule,
};

/// Sensitivity assessment of an entity's content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SensitivityFlags {
    pub contains_pii: bool,
    pub contains_financial: bool,
    pub contains_strategic: bool,
    pub contains_legal: bool,
    pub is_confidential: bool,
    pub is_proprietary: bool,
}

/// Rule-based classification of knowledge entities
pub struct ClassificationEngine {
    classification_rules: Vec<ClassificationRule>,
    priority_rules: Vec<(KnowledgePriority, Vec<&'static str>)>,
    pii_patterns: Vec<Regex>,
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationEngine {
    /// Build the engine, compiling all rule patterns.
    ///
    /// # Panics
    /// Panics if a hard-coded rule pattern fails to compile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classification_rules: classification_rules(),
            priority_rules: priority_rules(),
            pii_patterns: pii_patterns()
                .iter()
                .map(|p| Regex::new(p).expect("hard-coded PII pattern compiles"))
                .collect(),
        }
    }

    /// Classify an entity from its name, category, content and metadata.
    #[must_use]
    pub fn classify(&self, entity: &KnowledgeEntity) -> KnowledgeClassification {
        let text = Self::extract_text(entity);

        // Pay-Ready specific content is foundational regardless of scores
        if Self::is_pay_ready_foundational(&text) {
            return KnowledgeClassification::Foundational;
        }

        let mut best = KnowledgeClassification::Foundational;
        let mut best_score = 0u32;

        for rule in &self.classification_rules {
            let mut score = 0u32;

            for keyword in &rule.keywords {
                if text.contains(keyword) {
                    score += 2;
                }
            }
            for pattern in &rule.patterns {
                if pattern.is_match(&text) {
                    score += 3;
                }
            }
            if rule.categories.contains(&entity.category.as_str()) {
                score += 5;
            }

            if score > best_score {
                best_score = score;
                best = rule.classification;
            }
        }

        // A weak winner means there is no real signal
        if best_score < 3 {
            best = KnowledgeClassification::Operational;
        }

        log::debug!(
            "Classified {} as {} (score {best_score})",
            entity.name,
            best
        );
        best
    }

    /// Determine the priority: first keyword bucket with a hit wins, falling
    /// back to a classification-derived default.
    #[must_use]
    pub fn determine_priority(&self, entity: &KnowledgeEntity) -> KnowledgePriority {
        let text = Self::extract_text(entity);

        for (priority, keywords) in &self.priority_rules {
            if keywords.iter().any(|k| text.contains(k)) {
                return *priority;
            }
        }

        match entity.classification {
            KnowledgeClassification::Foundational | KnowledgeClassification::Strategic => {
                KnowledgePriority::High
            }
            KnowledgeClassification::Operational => KnowledgePriority::Medium,
            KnowledgeClassification::Reference => KnowledgePriority::Low,
        }
    }

    /// Suggest tags for an entity; deduplicated, insertion-ordered.
    #[must_use]
    pub fn suggest_tags(&self, entity: &KnowledgeEntity) -> Vec<String> {
        let text = Self::extract_text(entity);
        let mut tags: Vec<String> = Vec::new();

        let mut push = |tag: &str| {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        };

        push(entity.classification.as_str());

        if entity.priority >= KnowledgePriority::High {
            push(&format!("priority_{}", entity.priority.name()));
        }

        if text.contains("pay ready") || text.contains("payready") {
            push("pay_ready");
        }
        if text.contains("$20b") || text.contains("20 billion") {
            push("scale_20b");
        }
        if text.contains("bootstrapped") {
            push("bootstrapped");
        }
        if text.contains("profitable") {
            push("profitable");
        }

        for (keyword, tag) in tech_tag_rules() {
            if text.contains(keyword) {
                push(tag);
            }
        }
        for (keyword, tag) in business_tag_rules() {
            if text.contains(keyword) {
                push(tag);
            }
        }

        tags
    }

    /// Detect sensitive information in the entity's text.
    #[must_use]
    pub fn detect_sensitivity(&self, entity: &KnowledgeEntity) -> SensitivityFlags {
        let text = Self::extract_text(entity);

        SensitivityFlags {
            contains_pii: self.pii_patterns.iter().any(|p| p.is_match(&text)),
            contains_financial: rules::FINANCIAL_KEYWORDS.iter().any(|k| text.contains(k)),
            contains_strategic: rules::STRATEGIC_KEYWORDS.iter().any(|k| text.contains(k)),
            contains_legal: rules::LEGAL_KEYWORDS.iter().any(|k| text.contains(k)),
            is_confidential: confidential_markers().iter().any(|m| text.contains(m)),
            is_proprietary: Self::is_pay_ready_foundational(&text),
        }
    }

    /// Lowercased concatenation of all entity text used for rule matching.
    fn extract_text(entity: &KnowledgeEntity) -> String {
        format!(
            "{} {} {} {}",
            entity.name, entity.category, entity.content, entity.metadata
        )
        .to_lowercase()
    }

    /// Compound Pay-Ready indicators that short-circuit to foundational.
    fn is_pay_ready_foundational(text: &str) -> bool {
        (text.contains("pay ready") && (text.contains("mission") || text.contains("vision")))
            || (text.contains("$20b") && text.contains("rent"))
            || (text.contains("bootstrapped") && text.contains("profitable"))
            || (text.contains("multifamily housing") && text.contains("platform"))
            || (text.contains("lynn musil") && text.contains("ceo"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> ClassificationEngine {
        ClassificationEngine::new()
    }

    fn entity(name: &str, category: &str, content: serde_json::Value) -> KnowledgeEntity {
        KnowledgeEntity::new(name, category, content)
    }

    #[test]
    fn test_pay_ready_mission_is_foundational() {
        let e = entity(
            "Pay Ready Mission",
            "company_overview",
            json!({"mission": "AI-first resident engagement platform", "scale": "$20B+"}),
        );
        assert_eq!(
            engine().classify(&e),
            KnowledgeClassification::Foundational
        );
    }

    #[test]
    fn test_strategic_content_scores_strategic() {
        let e = entity(
            "Q3 market positioning",
            "strategic_initiatives",
            json!({"summary": "strategic initiative to expand market position against competitive entrants"}),
        );
        assert_eq!(engine().classify(&e), KnowledgeClassification::Strategic);
    }

    #[test]
    fn test_reference_content() {
        let e = entity(
            "Escalation policy manual",
            "policies",
            json!({"body": "reference documentation for the compliance standard and best practice templates"}),
        );
        assert_eq!(engine().classify(&e), KnowledgeClassification::Reference);
    }

    #[test]
    fn test_weak_signal_defaults_to_operational() {
        let e = entity("Untitled", "misc", json!({"note": "lunch menu"}));
        assert_eq!(engine().classify(&e), KnowledgeClassification::Operational);
    }

    #[test]
    fn test_priority_buckets_ordered() {
        let critical = entity("Board escalation", "ops", json!({"note": "urgent board decision"}));
        assert_eq!(
            engine().determine_priority(&critical),
            KnowledgePriority::Critical
        );

        let high = entity("Key initiative", "ops", json!({"note": "a significant milestone"}));
        assert_eq!(engine().determine_priority(&high), KnowledgePriority::High);

        let medium = entity("Runbook", "ops", json!({"note": "standard workflow steps"}));
        assert_eq!(
            engine().determine_priority(&medium),
            KnowledgePriority::Medium
        );
    }

    #[test]
    fn test_priority_falls_back_to_classification() {
        let mut e = entity("Quiet doc", "misc", json!({"x": 1}));
        e.classification = KnowledgeClassification::Foundational;
        assert_eq!(engine().determine_priority(&e), KnowledgePriority::High);

        e.classification = KnowledgeClassification::Reference;
        assert_eq!(engine().determine_priority(&e), KnowledgePriority::Low);
    }

    #[test]
    fn test_suggested_tags() {
        let mut e = entity(
            "Pay Ready platform overview",
            "company_overview",
            json!({"mission": "AI-first platform", "scale": "$20B rent processed", "growth": "bootstrapped and profitable"}),
        );
        e.classification = KnowledgeClassification::Foundational;
        e.normalize();

        let tags = engine().suggest_tags(&e);
        assert!(tags.contains(&"foundational".to_string()));
        assert!(tags.contains(&"priority_high".to_string()));
        assert!(tags.contains(&"pay_ready".to_string()));
        assert!(tags.contains(&"scale_20b".to_string()));
        assert!(tags.contains(&"bootstrapped".to_string()));
        assert!(tags.contains(&"platform".to_string()));
        assert!(tags.contains(&"growth".to_string()));

        // No duplicates
        let mut deduped = tags.clone();
        deduped.dedup();
        assert_eq!(tags.len(), deduped.len());
    }

    #[test]
    fn test_sensitivity_pii_and_financial() {
        let e = entity(
            "Contact sheet",
            "ops",
            json!({"email": "lynn@payready.com", "revenue": "$4M quarterly"}),
        );
        let flags = engine().detect_sensitivity(&e);
        assert!(flags.contains_pii);
        assert!(flags.contains_financial);
        assert!(!flags.is_confidential);
    }

    #[test]
    fn test_sensitivity_confidential_and_proprietary() {
        let e = entity(
            "Pay Ready mission brief",
            "company_overview",
            json!({"marker": "internal only", "mission": "resident engagement"}),
        );
        let flags = engine().detect_sensitivity(&e);
        assert!(flags.is_confidential);
        assert!(flags.is_proprietary);
    }

    #[test]
    fn test_sensitivity_legal() {
        let e = entity(
            "Vendor NDA",
            "legal",
            json!({"body": "contract terms and liability clauses"}),
        );
        let flags = engine().detect_sensitivity(&e);
        assert!(flags.contains_legal);
        assert!(!flags.contains_pii);
    }

    #[test]
    fn test_deterministic() {
        let e = entity(
            "Pay Ready Mission",
            "company_overview",
            json!({"mission": "resident engagement"}),
        );
        let eng = engine();
        assert_eq!(eng.classify(&e), eng.classify(&e));
        assert_eq!(eng.suggest_tags(&e), eng.suggest_tags(&e));
    }
}
