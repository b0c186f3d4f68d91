//! Retrieval augmentation hook (C14). A pipeline that wants context consults a
//! `RagHook` and prepends whatever it returns to the prompt; nothing else in
//! the crate knows or cares how that context was produced.

use async_trait::async_trait;

/// Any source of prompt-relevant context. `retrieve` never errors: a source
/// that cannot find anything returns `None`, the same as one that isn't configured.
#[async_trait]
pub trait RagHook: Send + Sync {
    async fn retrieve(&self, prompt: &str) -> Option<String>;
}

/// The default hook: always declines. Pipelines built against `RagHook` behave
/// identically whether or not retrieval augmentation is wired in.
pub struct NoopRag;

#[async_trait]
impl RagHook for NoopRag {
    async fn retrieve(&self, _prompt: &str) -> Option<String> {
        None
    }
}

/// A minimal local knowledge base: whitespace-tokenised keyword overlap against
/// a fixed set of documents, returning the single best match above a floor.
pub struct KnowledgeBaseRag {
    documents: Vec<(String, String)>,
    min_overlap: usize,
}

impl KnowledgeBaseRag {
    pub fn new(documents: Vec<(String, String)>) -> Self {
        Self {
            documents,
            min_overlap: 1,
        }
    }

    pub fn with_min_overlap(mut self, min_overlap: usize) -> Self {
        self.min_overlap = min_overlap;
        self
    }

    fn score(prompt_tokens: &[&str], doc: &str) -> usize {
        let doc_lower = doc.to_lowercase();
        prompt_tokens
            .iter()
            .filter(|t| doc_lower.contains(*t))
            .count()
    }
}

#[async_trait]
impl RagHook for KnowledgeBaseRag {
    async fn retrieve(&self, prompt: &str) -> Option<String> {
        let prompt_lower = prompt.to_lowercase();
        let tokens: Vec<&str> = prompt_lower.split_whitespace().filter(|t| t.len() > 3).collect();
        if tokens.is_empty() {
            return None;
        }

        self.documents
            .iter()
            .map(|(name, body)| (name, body, Self::score(&tokens, body)))
            .filter(|(_, _, score)| *score >= self.min_overlap)
            .max_by_key(|(_, _, score)| *score)
            .map(|(name, body, _)| format!("[{name}]\n{body}"))
    }
}

/// Prepends retrieved context to a prompt, leaving the prompt unchanged when
/// nothing was retrieved.
pub async fn augment(hook: &(dyn RagHook), prompt: &str) -> String {
    match hook.retrieve(prompt).await {
        Some(context) => format!("Relevant context:\n{context}\n\n{prompt}"),
        None => prompt.to_string(),
    }
}

/// Same as [`augment`], but also returns the raw retrieved context so callers
/// can record it as `v2_improvements.rag_source`.
pub async fn augment_with_source(hook: &(dyn RagHook), prompt: &str) -> (String, Option<String>) {
    match hook.retrieve(prompt).await {
        Some(context) => (format!("Relevant context:\n{context}\n\n{prompt}"), Some(context)),
        None => (prompt.to_string(), None),
    }
}
