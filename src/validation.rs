//! Boundary validation invoked by the gateway before constructing
//! `MemoryManager` call arguments (SPEC_FULL.md §10.D). Spec.md treats
//! this as an external collaborator; this crate implements it as a small
//! standalone module so the binary is runnable end to end.
//!
//! Grounded on the teacher's `engine/tools/memory.rs` argument-extraction
//! idiom (`.ok_or("... missing ...")?`, `.clamp(...)`), generalized here
//! into dedicated validators rather than inline per-tool checks.

use crate::error::{EngineError, EngineResult};
use crate::record::{Layer, Source};

pub const MAX_CONTENT_LEN: usize = 10_000;
pub const MAX_QUERY_LEN: usize = 1_000;
pub const MAX_CONTEXT_LEN: usize = 5_000;
pub const MAX_REASON_LEN: usize = 500;
pub const MAX_TAGS: usize = 50;
pub const MAX_TAG_LEN: usize = 50;
const FORBIDDEN_QUERY_CHARS: &[char] = &['{', '}', '[', ']', '(', ')', ':'];

pub fn validate_content(content: &str) -> EngineResult<()> {
    if content.trim().is_empty() {
        return Err(EngineError::validation("content must not be empty"));
    }
    if content.len() > MAX_CONTENT_LEN {
        return Err(EngineError::validation(format!(
            "content exceeds {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_query(query: &str) -> EngineResult<()> {
    if query.trim().is_empty() {
        return Err(EngineError::validation("query must not be empty"));
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(EngineError::validation(format!("query exceeds {MAX_QUERY_LEN} characters")));
    }
    if query.chars().any(|c| FORBIDDEN_QUERY_CHARS.contains(&c)) {
        return Err(EngineError::validation("query contains forbidden characters {}[]():"));
    }
    Ok(())
}

pub fn validate_task(task: &str) -> EngineResult<()> {
    if task.trim().is_empty() {
        return Err(EngineError::validation("task must not be empty"));
    }
    if task.len() > MAX_QUERY_LEN {
        return Err(EngineError::validation(format!("task exceeds {MAX_QUERY_LEN} characters")));
    }
    Ok(())
}

pub fn validate_context(context: &str) -> EngineResult<()> {
    if context.len() > MAX_CONTEXT_LEN {
        return Err(EngineError::validation(format!(
            "context exceeds {MAX_CONTEXT_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_reason(reason: &str) -> EngineResult<()> {
    if reason.len() > MAX_REASON_LEN {
        return Err(EngineError::validation(format!("reason exceeds {MAX_REASON_LEN} characters")));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> EngineResult<()> {
    if tags.len() > MAX_TAGS {
        return Err(EngineError::validation(format!("at most {MAX_TAGS} tags allowed")));
    }
    for tag in tags {
        if tag.len() > MAX_TAG_LEN {
            return Err(EngineError::validation(format!("tag exceeds {MAX_TAG_LEN} characters: {tag}")));
        }
    }
    Ok(())
}

pub fn validate_importance(importance: f64) -> EngineResult<()> {
    if !(0.0..=1.0).contains(&importance) {
        return Err(EngineError::validation("importance must be within [0, 1]"));
    }
    Ok(())
}

pub fn validate_min_relevance(min_relevance: f64) -> EngineResult<()> {
    if !(0.0..=1.0).contains(&min_relevance) {
        return Err(EngineError::validation("minRelevance must be within [0, 1]"));
    }
    Ok(())
}

pub fn validate_search_limit(limit: i64) -> EngineResult<usize> {
    if !(1..=100).contains(&limit) {
        return Err(EngineError::validation("limit must be within [1, 100]"));
    }
    Ok(limit as usize)
}

pub fn validate_recall_limit(limit: i64) -> EngineResult<usize> {
    if !(1..=50).contains(&limit) {
        return Err(EngineError::validation("limit must be within [1, 50]"));
    }
    Ok(limit as usize)
}

pub fn validate_list_limit(limit: i64) -> EngineResult<usize> {
    if !(1..=1000).contains(&limit) {
        return Err(EngineError::validation("limit must be within [1, 1000]"));
    }
    Ok(limit as usize)
}

pub fn validate_target_size(target_size: i64) -> EngineResult<usize> {
    if !(1..=1000).contains(&target_size) {
        return Err(EngineError::validation("targetSize must be within [1, 1000]"));
    }
    Ok(target_size as usize)
}

pub fn validate_source(source: &str) -> EngineResult<Source> {
    Source::from_str(source).ok_or_else(|| EngineError::validation(format!("unknown source: {source}")))
}

pub fn validate_layer(layer: &str) -> EngineResult<Layer> {
    Layer::from_str(layer).ok_or_else(|| EngineError::validation(format!("unknown layer: {layer}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_at_boundary_succeeds() {
        let content = "a".repeat(MAX_CONTENT_LEN);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn content_over_boundary_rejected() {
        let content = "a".repeat(MAX_CONTENT_LEN + 1);
        assert!(validate_content(&content).is_err());
    }

    #[test]
    fn search_limit_boundaries() {
        assert!(validate_search_limit(0).is_err());
        assert!(validate_search_limit(1).is_ok());
        assert!(validate_search_limit(100).is_ok());
        assert!(validate_search_limit(101).is_err());
    }

    #[test]
    fn query_rejects_forbidden_characters() {
        assert!(validate_query("find {foo}").is_err());
        assert!(validate_query("find foo").is_ok());
    }

    #[test]
    fn unknown_enum_values_rejected() {
        assert!(validate_source("robot").is_err());
        assert!(validate_layer("mid-term").is_err());
        assert!(validate_layer("short-term").is_ok());
    }
}
