//! Natural-language questions to validated SQL.
//!
//! The model (when configured) gets the first attempt; any failure, timeout
//! or rejected answer falls through to the pattern rules. Whatever comes out
//! has passed [`validator::validate`].

pub mod rules;
pub mod validator;

use crate::db::schema::SchemaDescription;
use crate::llm::LlmManager;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    Ai,
    Rule,
}

impl QuerySource {
    pub fn explanation(&self, row_count: usize) -> String {
        match self {
            QuerySource::Ai => format!("Query generated by AI model. Found {} results.", row_count),
            QuerySource::Rule => format!("Query generated by pattern matching. Found {} results.", row_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub sql: String,
    pub source: QuerySource,
}

pub struct QueryAssistant {
    llm: Option<LlmManager>,
    ai_timeout: Duration,
}

impl QueryAssistant {
    pub fn new(llm: Option<LlmManager>, ai_timeout: Duration) -> Self {
        Self { llm, ai_timeout }
    }

    pub fn rules_only() -> Self {
        Self::new(None, Duration::from_secs(0))
    }

    pub fn ai_enabled(&self) -> bool {
        self.llm.is_some()
    }

    pub fn ai_backend(&self) -> Option<&str> {
        self.llm.as_ref().map(|llm| llm.backend())
    }

    /// Best effort: every failure is logged and reported as `None`.
    pub async fn translate_by_model(&self, question: &str, schema: &SchemaDescription) -> Option<String> {
        let llm = self.llm.as_ref()?;

        match tokio::time::timeout(self.ai_timeout, llm.generate_sql(question, schema)).await {
            Ok(Ok(sql)) => {
                let validated = validator::validate(&sql);
                if validated.is_none() {
                    warn!("Discarding non-SELECT model output: {}", sql);
                }
                validated
            }
            Ok(Err(e)) => {
                warn!("AI translation failed, falling back to rules: {}", e);
                None
            }
            Err(_) => {
                warn!("AI translation timed out after {:?}, falling back to rules", self.ai_timeout);
                None
            }
        }
    }

    /// `schema` is only consulted by the model path; pass `None` when the
    /// model is disabled.
    pub async fn translate(&self, question: &str, schema: Option<&SchemaDescription>) -> Option<CandidateQuery> {
        if question.trim().is_empty() {
            return None;
        }

        if let Some(schema) = schema {
            if let Some(sql) = self.translate_by_model(question, schema).await {
                return Some(CandidateQuery { sql, source: QuerySource::Ai });
            }
        }

        let (rule, sql) = rules::match_rule(question)?;
        info!("Question matched rule '{}'", rule);

        validator::validate(&sql).map(|sql| CandidateQuery {
            sql,
            source: QuerySource::Rule,
        })
    }
}
