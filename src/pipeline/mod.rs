//! Variant generation pipeline
//!
//! The per-item work run for every batch item: one image-variant request
//! per configured instruction, each wrapped in the retry executor, all
//! awaited together. Artifacts come back in instruction order because
//! they are collected positionally, not by arrival. If any sub-request
//! ultimately fails the whole item fails and nothing is kept.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::debug;

use crate::batch::{ItemWorker, WorkError, WorkItem};
use crate::retry::{self, RetryPolicy};
use crate::service::{Artifact, GenerationService, ServiceError, SourcePayload};

/// One variant slot: a stable id plus the instruction sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInstruction {
    pub id: String,
    pub instruction: String,
}

impl VariantInstruction {
    pub fn new(id: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instruction: instruction.into(),
        }
    }
}

/// The stock product-photoshoot variant set.
pub fn default_variant_set() -> Vec<VariantInstruction> {
    vec![
        VariantInstruction::new(
            "studio",
            "A professional product photo of this item on a clean, minimalist white \
             background with soft studio lighting.",
        ),
        VariantInstruction::new(
            "lifestyle",
            "A lifestyle photo of this product in use in a relevant, stylish setting \
             with shallow depth of field.",
        ),
        VariantInstruction::new(
            "male-model",
            "A photorealistic image of a male model using this product in a \
             professional studio photoshoot.",
        ),
        VariantInstruction::new(
            "female-model",
            "A photorealistic image of a female model using this product in a \
             professional outdoor photoshoot.",
        ),
        VariantInstruction::new(
            "closeup",
            "A detailed close-up photo of this product's texture and materials, with \
             side lighting to bring out the detail.",
        ),
    ]
}

/// Fans one item out into its variant requests.
pub struct VariantPipeline<S: ?Sized> {
    service: Arc<S>,
    variants: Vec<VariantInstruction>,
    policy: RetryPolicy,
}

impl<S> VariantPipeline<S>
where
    S: GenerationService + ?Sized,
{
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            variants: default_variant_set(),
            policy: RetryPolicy::standard(),
        }
    }

    pub fn with_variants(mut self, variants: Vec<VariantInstruction>) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn variants(&self) -> &[VariantInstruction] {
        &self.variants
    }

    async fn generate_variant(
        &self,
        source: &SourcePayload,
        variant: &VariantInstruction,
    ) -> Result<Artifact, ServiceError> {
        let artifact = retry::execute(
            || self.service.generate_image_variant(source, &variant.instruction),
            &self.policy,
        )
        .await?;

        // Stamp the slot id so downstream consumers can tell variants apart
        // regardless of what the service wrote there.
        Ok(Artifact {
            variant: variant.id.clone(),
            ..artifact
        })
    }
}

#[async_trait]
impl<S> ItemWorker for VariantPipeline<S>
where
    S: GenerationService + ?Sized + 'static,
{
    async fn process(&self, item: &WorkItem) -> Result<Vec<Artifact>, WorkError> {
        debug!(item = %item.id, variants = self.variants.len(), "generating variant set");

        let requests = self
            .variants
            .iter()
            .map(|variant| self.generate_variant(&item.source, variant));

        // try_join_all keeps instruction order and fails the whole item on
        // the first unrecovered sub-request error.
        let artifacts = try_join_all(requests).await?;
        Ok(artifacts)
    }
}

/// Generate marketing copy for a single source, with standard retries.
pub async fn generate_listing_copy<S>(
    service: &S,
    source: &SourcePayload,
    instruction: &str,
    policy: &RetryPolicy,
) -> Result<Artifact, ServiceError>
where
    S: GenerationService + ?Sized,
{
    retry::execute(
        || service.generate_text_artifact(source, instruction),
        policy,
    )
    .await
}
