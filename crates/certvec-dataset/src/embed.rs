//! Attach embeddings to records

use serde::Serialize;
use tracing::{debug, info};

use certvec_core::{EmbeddingProvider, EmbeddingTarget, Record, Result};

/// Counts from one embedding pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbedReport {
    pub records: usize,
    pub embeddings: usize,
}

/// Embeds the source fields of each record into their vector fields and
/// marks the record for upload to the search index
pub struct EmbeddingPipeline<'a, E: EmbeddingProvider> {
    embedder: &'a E,
    targets: &'a [EmbeddingTarget],
}

impl<'a, E: EmbeddingProvider> EmbeddingPipeline<'a, E> {
    pub fn new(embedder: &'a E, targets: &'a [EmbeddingTarget]) -> Self {
        Self { embedder, targets }
    }

    /// Process one record. Fails on a missing source field before any
    /// embedding call is made for it.
    pub async fn embed_record(&self, record: &mut Record) -> Result<usize> {
        let mut texts = Vec::with_capacity(self.targets.len());
        for target in self.targets {
            texts.push(record.text(target.source)?.to_string());
        }

        for (target, text) in self.targets.iter().zip(texts) {
            let vector = self.embedder.embed(&text).await?;
            record.set_vector(target.vector, vector);
        }
        record.mark_for_upload();
        Ok(self.targets.len())
    }

    /// Process records in order, stopping at the first failure
    pub async fn run(&self, records: &mut [Record]) -> Result<EmbedReport> {
        let total = records.len();
        let mut report = EmbedReport::default();

        for (i, record) in records.iter_mut().enumerate() {
            report.embeddings += self.embed_record(record).await?;
            report.records += 1;
            debug!(record = i + 1, total, id = record.id().unwrap_or("-"), "embedded record");
        }

        info!(records = report.records, embeddings = report.embeddings, "embedding pass complete");
        Ok(report)
    }
}
