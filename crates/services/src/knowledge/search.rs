#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use log::info;
use serde_json::{json, Value as JsonValue};
use time::format_description::well_known::Rfc3339;

use super::KnowledgeService;
use knowledge_core_core::error::Result;
use knowledge_core_core::knowledge::{KnowledgeClassification, KnowledgeEntity};
use knowledge_core_persistence::{EntityFilter, KnowledgeStats};

impl KnowledgeService {
    /// List entities with filtering and pagination.
    ///
    /// # Errors
    /// Returns any store error
    pub async fn list(
        &self,
        filter: &EntityFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeEntity>> {
        self.repository.list(filter, limit, offset).await
    }

    /// All active foundational entries.
    ///
    /// # Errors
    /// Returns any store error
    pub async fn list_foundational(&self, limit: i64) -> Result<Vec<KnowledgeEntity>> {
        self.repository
            .list(
                &EntityFilter {
                    classification: Some(KnowledgeClassification::Foundational),
                    category: None,
                    is_active: Some(true),
                },
                limit,
                0,
            )
            .await
    }

    /// All knowledge in a category.
    ///
    /// # Errors
    /// Returns any store error
    pub async fn get_by_category(&self, category: &str) -> Result<Vec<KnowledgeEntity>> {
        self.repository
            .list(
                &EntityFilter {
                    classification: None,
                    category: Some(category.to_string()),
                    is_active: Some(true),
                },
                100,
                0,
            )
            .await
    }

    /// Substring search; operational and reference entries are filtered out
    /// unless explicitly requested.
    ///
    /// # Errors
    /// Returns any store error
    pub async fn search(
        &self,
        query: &str,
        include_operational: bool,
    ) -> Result<Vec<KnowledgeEntity>> {
        let mut results = self.repository.search(query).await?;
        if !include_operational {
            results.retain(|e| e.classification.is_foundational_tier());
        }
        Ok(results)
    }

    /// Comprehensive Pay-Ready context: the fixed business context plus all
    /// foundational knowledge grouped by category.
    ///
    /// # Errors
    /// Returns any store error
    pub async fn get_pay_ready_context(&self) -> Result<JsonValue> {
        let foundational = self.list_foundational(100).await?;

        let mut by_category = serde_json::Map::new();
        for entity in foundational {
            let entry = json!({
                "name": entity.name,
                "priority": entity.priority.as_i64(),
                "content": entity.content,
                "last_updated": entity.updated_at.format(&Rfc3339).unwrap_or_default(),
            });
            if let Some(items) = by_category
                .entry(entity.category)
                .or_insert_with(|| JsonValue::Array(Vec::new()))
                .as_array_mut()
            {
                items.push(entry);
            }
        }

        Ok(json!({
            "company": self.pay_ready_context.company,
            "mission": self.pay_ready_context.mission,
            "metrics": self.pay_ready_context.metrics,
            "foundational_knowledge": JsonValue::Object(by_category),
        }))
    }

    /// Re-cache every foundational entry; used at startup and after the
    /// scheduler resumes.
    ///
    /// # Errors
    /// Returns any store error (cache failures are swallowed as usual)
    pub async fn refresh_cache(&self) -> Result<usize> {
        let foundational = self.list_foundational(1000).await?;
        let count = foundational.len();
        for entity in &foundational {
            self.cache_entity(entity).await;
        }
        info!("Refreshed cache with {count} foundational entries");
        Ok(count)
    }

    /// Aggregate knowledge base statistics.
    ///
    /// # Errors
    /// Returns any store error
    pub async fn statistics(&self) -> Result<KnowledgeStats> {
        self.repository.statistics().await
    }
}
