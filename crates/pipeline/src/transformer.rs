//! Transformer: summary and rewrite for one chunk.
//!
//! Each chunk costs two generation calls, made in order:
//! 1. a summary, trimmed and appended to the run's [`SummaryLog`];
//! 2. a rewrite, stored verbatim as `rewritten` and written to the
//!    transformed-chunk directory (that file gets its leading blank line
//!    stripped).
//!
//! A failed call aborts the chunk; no partial result is returned.

use std::sync::Arc;

use recast_config::{CODE_PLACEHOLDER, LANGUAGE_PLACEHOLDER, PromptConfig};
use recast_core::{Chunk, GenerationOptions, Provider, Result, TransformedChunk};
use tracing::{debug, info};

use crate::normalize::normalize_file;
use crate::store::ChunkStore;
use crate::summary_log::SummaryLog;

pub struct Transformer {
    provider: Arc<dyn Provider>,
    options: GenerationOptions,
    prompts: PromptConfig,
    store: ChunkStore,
}

impl Transformer {
    /// `store` receives the `_modified` artifacts.
    pub fn new(
        provider: Arc<dyn Provider>,
        options: GenerationOptions,
        prompts: PromptConfig,
        store: ChunkStore,
    ) -> Self {
        Self {
            provider,
            options,
            prompts,
            store,
        }
    }

    pub fn summary_prompt(&self, chunk: &Chunk) -> String {
        self.render(&self.prompts.summary_template, chunk)
    }

    pub fn rewrite_prompt(&self, chunk: &Chunk) -> String {
        self.render(&self.prompts.rewrite_template, chunk)
    }

    // Language first, so a literal "{language}" inside the code survives.
    fn render(&self, template: &str, chunk: &Chunk) -> String {
        template
            .replace(LANGUAGE_PLACEHOLDER, &self.prompts.language)
            .replace(CODE_PLACEHOLDER, &chunk.text)
    }

    pub async fn transform(&self, chunk: &Chunk, log: &mut SummaryLog) -> Result<TransformedChunk> {
        debug!(
            index = chunk.index,
            lines = chunk.line_count(),
            size = chunk.approx_size,
            "Transforming chunk"
        );

        let summary = self
            .provider
            .generate(&self.summary_prompt(chunk), &self.options)
            .await?
            .trim()
            .to_string();
        log.record(chunk.index, &summary)?;

        let rewritten = self
            .provider
            .generate(&self.rewrite_prompt(chunk), &self.options)
            .await?;

        let path = self.store.write_transformed(chunk.index, &rewritten)?;
        normalize_file(&path)?;

        info!(
            index = chunk.index,
            provider = self.provider.name(),
            "Chunk transformed"
        );

        Ok(TransformedChunk {
            index: chunk.index,
            summary,
            rewritten,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recast_core::error::ProviderError;
    use recast_core::provider::{ProviderRequest, ProviderResponse};
    use std::sync::Mutex;

    /// Echoes back canned text and remembers every prompt.
    struct Recording {
        summary: String,
        rewrite: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Provider for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            let reply = if request.prompt.starts_with("Summarize") {
                self.summary.clone()
            } else {
                self.rewrite.clone()
            };
            self.prompts.lock().unwrap().push(request.prompt);
            Ok(ProviderResponse::text(reply))
        }
    }

    fn setup(summary: &str, rewrite: &str) -> (tempfile::TempDir, Arc<Recording>, Transformer) {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(Recording {
            summary: summary.into(),
            rewrite: rewrite.into(),
            prompts: Mutex::new(Vec::new()),
        });
        let transformer = Transformer::new(
            provider.clone(),
            GenerationOptions::default(),
            PromptConfig::default(),
            ChunkStore::new(dir.path().join("transformed"), "py"),
        );
        (dir, provider, transformer)
    }

    #[test]
    fn prompts_embed_chunk_text() {
        let (_dir, _provider, transformer) = setup("", "");
        let chunk = Chunk::new(0, "def f():\n    return 1\n", 22);

        assert_eq!(
            transformer.summary_prompt(&chunk),
            "Summarize the purpose of the following python code:\ndef f():\n    return 1\n"
        );
        assert_eq!(
            transformer.rewrite_prompt(&chunk),
            "def f():\n    return 1\n\n\nRefactor and improve the code above:"
        );
    }

    #[test]
    fn language_placeholder_inside_code_is_untouched() {
        let (_dir, _provider, transformer) = setup("", "");
        let chunk = Chunk::new(0, "s = '{language}'\n", 17);
        assert!(transformer.summary_prompt(&chunk).ends_with("s = '{language}'\n"));
    }

    #[tokio::test]
    async fn transform_logs_summary_and_writes_normalized_artifact() {
        let (dir, provider, transformer) = setup("  Adds one.\n", "\ndef f():\n    return 2\n");
        let mut log = SummaryLog::open(dir.path().join("summary.txt")).unwrap();
        let chunk = Chunk::new(4, "def f():\n    return 1\n", 22);

        let out = transformer.transform(&chunk, &mut log).await.unwrap();

        assert_eq!(out.index, 4);
        assert_eq!(out.summary, "Adds one.");
        // The returned text is the raw generation; only the file is normalized.
        assert_eq!(out.rewritten, "\ndef f():\n    return 2\n");

        let artifact = dir.path().join("transformed").join("chunk_00004_modified.py");
        assert_eq!(
            std::fs::read_to_string(artifact).unwrap(),
            "def f():\n    return 2\n"
        );

        let log_path = log.close().unwrap();
        assert_eq!(
            std::fs::read_to_string(log_path).unwrap(),
            "Chunk 4 summary: Adds one.\n\n"
        );

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].starts_with("Summarize"));
        assert!(prompts[1].ends_with("Refactor and improve the code above:"));
    }
}
