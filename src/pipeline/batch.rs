//! Batch processing across documents.
//!
//! Documents are independent, so each runs on the blocking pool under a
//! semaphore permit. Results come back in input order; a failed, panicked
//! or timed-out document never affects its siblings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::models::CaseBundle;
use crate::pipeline::processor::{DocumentInput, MedicalDocumentPipeline, PipelineError, PipelineStage};

/// Anything that turns one document into a bundle. The batch runner only
/// depends on this, so it can be exercised with mock processors.
pub trait DocumentProcessor: Send + Sync + 'static {
    fn process_document(&self, input: DocumentInput) -> Result<CaseBundle, PipelineError>;
}

impl DocumentProcessor for MedicalDocumentPipeline {
    fn process_document(&self, input: DocumentInput) -> Result<CaseBundle, PipelineError> {
        self.process(input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum documents in flight at once (at least 1).
    pub batch_size: usize,
    /// Caller-level cancellation for one document's whole pipeline.
    pub per_document_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 4,
            per_document_timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    /// Position of the document in the input batch.
    pub index: usize,
    pub case_id: Option<String>,
    pub result: Result<CaseBundle, PipelineError>,
}

impl DocumentOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub async fn process_batch<P: DocumentProcessor>(
    processor: Arc<P>,
    inputs: Vec<DocumentInput>,
    options: BatchOptions,
) -> Vec<DocumentOutcome> {
    let semaphore = Arc::new(Semaphore::new(options.batch_size.max(1)));
    let total = inputs.len();
    tracing::info!(documents = total, batch_size = options.batch_size.max(1), "Batch: starting");

    let handles: Vec<_> = inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let processor = Arc::clone(&processor);
            let semaphore = Arc::clone(&semaphore);
            let timeout = options.per_document_timeout;
            let case_id = input.case_id.clone();
            let handle = tokio::spawn(run_one(processor, semaphore, input, timeout));
            (index, case_id, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(total);
    for (index, case_id, handle) in handles {
        let result = handle
            .await
            .unwrap_or_else(|e| Err(orchestration(format!("Document task failed: {e}"))));
        if let Err(e) = &result {
            tracing::warn!(index, case_id = ?case_id, stage = %e.stage, error = %e.message, "Batch: document failed");
        }
        outcomes.push(DocumentOutcome { index, case_id, result });
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    tracing::info!(documents = total, failed, "Batch: complete");
    outcomes
}

async fn run_one<P: DocumentProcessor>(
    processor: Arc<P>,
    semaphore: Arc<Semaphore>,
    input: DocumentInput,
    timeout: Option<Duration>,
) -> Result<CaseBundle, PipelineError> {
    let permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| orchestration(format!("Semaphore closed: {e}")))?;
    // The permit lives until the blocking work ends, even after a timeout.
    let work = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        processor.process_document(input)
    });
    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| orchestration(format!("Timed out after {} ms", limit.as_millis())))?,
        None => work.await,
    };
    joined.map_err(|e| orchestration(format!("Document task failed: {e}")))?
}

fn orchestration(message: String) -> PipelineError {
    PipelineError::new(PipelineStage::Orchestration, message)
}
