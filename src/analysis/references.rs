use super::gateway::ServiceGateway;
use super::prompts::{reference_block_message, REFERENCE_PARSER_PROMPT};
use crate::bibliography::{ParsedReference, ReferenceBlockParser};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::util::deserialize_null_default;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bump whenever the reference-parse prompt or response shape changes
pub const REFERENCE_PARSE_VERSION: &str = "reference-parse/v1";

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(deserialize_with = "deserialize_null_default")]
    references: Vec<ParsedReference>,
}

/// Parses `\bibitem` blocks through the analysis service
pub struct ReferenceParser {
    gateway: Arc<ServiceGateway>,
    concurrency: usize,
    progress: Option<Arc<dyn ProgressHandler>>,
}

impl ReferenceParser {
    pub fn new(gateway: Arc<ServiceGateway>) -> Self {
        Self {
            gateway,
            concurrency: super::DEFAULT_CONCURRENCY,
            progress: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = Some(handler);
        self
    }

    async fn parse_block(&self, index: usize, block: &str) -> Vec<ParsedReference> {
        let payload = json!({
            "version": REFERENCE_PARSE_VERSION,
            "model": self.gateway.model(),
            "block": block,
        });
        let subject = format!("block {}", index);

        match self
            .gateway
            .request::<ParseResponse>(
                "reference-parse",
                &subject,
                &payload,
                REFERENCE_PARSER_PROMPT.to_string(),
                reference_block_message(block),
                0.0,
            )
            .await
        {
            Ok(response) => {
                debug!(
                    block = index,
                    references = response.value.references.len(),
                    cache_hit = response.cache_hit,
                    "Parsed reference block"
                );
                response.value.references
            }
            Err(e) => {
                warn!(block = index, error = %e, "Reference block could not be parsed, skipping it");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ReferenceBlockParser for ReferenceParser {
    async fn parse_blocks(&self, blocks: Vec<String>) -> Vec<Vec<ParsedReference>> {
        let total = blocks.len();

        let mut parsed: Vec<(usize, Vec<ParsedReference>)> =
            stream::iter(blocks.into_iter().enumerate())
                .map(|(index, block)| async move {
                    let references = self.parse_block(index, &block).await;
                    if let Some(handler) = &self.progress {
                        handler.on_progress(&ProgressEvent::BlockParsed {
                            index,
                            total,
                            references: references.len(),
                        });
                    }
                    (index, references)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        parsed.sort_by_key(|(index, _)| *index);
        parsed.into_iter().map(|(_, references)| references).collect()
    }
}
