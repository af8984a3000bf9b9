//! Retrieval-augmented question answering

use serde_json::Value;
use tracing::debug;

use certvec_core::index::{SearchHit, VectorQuery};
use certvec_core::{ChatMessage, ChatProvider, DatasetProfile, EmbeddingProvider, Result, SearchService};

/// Instructions sent ahead of every question
pub const SYSTEM_PROMPT: &str = "You are an intelligent assistant for Microsoft Azure services and certifications.
You are designed to provide helpful answers to user questions about Azure services given the information about to be provided.
    - Only answer questions related to the information provided below, provide 3 clear suggestions in a list format.
    - Write two lines of whitespace between each answer in the list.
    - Only provide answers that have products that are part of Microsoft Azure.
    - If you're unsure of an answer, you can say \"I don't know\" or \"I'm not sure\" and recommend users search themselves.";

/// Keyword that ends the question loop
pub const EXIT_KEYWORD: &str = "end";

pub fn is_exit_keyword(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(EXIT_KEYWORD)
}

/// An answer and the documents it was built from
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub hits: Vec<SearchHit>,
}

/// Render the selected fields of a hit, one `field: value` per line.
/// Missing and null fields are skipped.
pub fn render_hit(hit: &SearchHit, fields: &[&str]) -> String {
    fields
        .iter()
        .filter_map(|field| {
            let value = hit.document.get(field)?;
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(format!("{}: {}", field, text))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt, the question, then one system message per retrieved
/// document
pub fn build_messages(question: &str, hits: &[SearchHit], fields: &[&str]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(question)];
    messages.extend(
        hits.iter()
            .map(|hit| render_hit(hit, fields))
            .filter(|content| !content.is_empty())
            .map(ChatMessage::system),
    );
    messages
}

/// Question answering over one dataset profile's index
pub struct QaSession<E: EmbeddingProvider, S: SearchService, C: ChatProvider> {
    embedder: E,
    search: S,
    chat: C,
    profile: DatasetProfile,
    top_k: usize,
}

impl<E: EmbeddingProvider, S: SearchService, C: ChatProvider> QaSession<E, S, C> {
    pub const DEFAULT_TOP_K: usize = 3;

    pub fn new(embedder: E, search: S, chat: C, profile: DatasetProfile) -> Self {
        Self {
            embedder,
            search,
            chat,
            profile,
            top_k: Self::DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn profile(&self) -> DatasetProfile {
        self.profile
    }

    /// Nearest documents to the question
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>> {
        let vector = self.embedder.embed(question).await?;
        let query = VectorQuery {
            vector,
            k: self.top_k,
            field: self.profile.query_vector_field().to_string(),
            select: self
                .profile
                .answer_fields()
                .iter()
                .map(|f| f.to_string())
                .collect(),
        };
        let hits = self
            .search
            .vector_search(self.profile.index_name(), &query)
            .await?;
        debug!(hits = hits.len(), "retrieved documents");
        Ok(hits)
    }

    /// Retrieve documents for the question and have the chat model answer
    /// from them
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let hits = self.retrieve(question).await?;
        let messages = build_messages(question, &hits, self.profile.answer_fields());
        let text = self.chat.complete(&messages).await?;
        Ok(Answer { text, hits })
    }
}
