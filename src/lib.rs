pub mod config;
pub mod pipeline_config;
pub mod models;
pub mod pipeline;

pub use models::CaseBundle;
pub use pipeline::batch::{process_batch, BatchOptions, DocumentOutcome, DocumentProcessor};
pub use pipeline::processor::{DocumentInput, MedicalDocumentPipeline, PipelineError, PipelineStage};
pub use pipeline_config::PipelineConfig;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over the default filter.
/// Calling it again (or after another subscriber is set) is a no-op.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} extraction core v{}", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
