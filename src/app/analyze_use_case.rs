use anyhow::{bail, Result};
use base64::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::ports::{CoverageExtractor, ExtractionKind};
use crate::domain::{PolicyDetails, NOT_FOUND};

static DATA_URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/[a-z]+;base64,").expect("static data URL pattern compiles"));

/// Encode raw image bytes as a base64 payload.
pub fn encode_image(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// Normalize a base64 payload (with or without a data URL prefix) into the
/// JPEG data URL the vision model expects.
pub fn to_image_data_url(image: &str) -> String {
    format!("data:image/jpeg;base64,{}", DATA_URL_PREFIX.replace(image.trim(), ""))
}

/// Use case for reading coverage details off declaration-page images.
pub struct AnalyzePolicyUseCase {
    extractor: Arc<dyn CoverageExtractor>,
}

impl AnalyzePolicyUseCase {
    pub fn new(extractor: Arc<dyn CoverageExtractor>) -> Self {
        Self { extractor }
    }

    /// Coverages come from the first image; deductibles from the second
    /// image when there is one, otherwise from the first again.
    ///
    /// A failed deductible read degrades to "Not found" rather than failing
    /// the whole analysis.
    pub async fn analyze(&self, images: &[String]) -> Result<PolicyDetails> {
        let Some(first) = images.first() else {
            bail!("No image data provided");
        };
        info!("Processing images, count: {}", images.len());

        let coverage_image = to_image_data_url(first);
        let deductible_image = images.get(1).map(|image| to_image_data_url(image));
        let deductible_image = deductible_image.as_deref().unwrap_or(&coverage_image);

        let (coverages, deductibles) = tokio::join!(
            self.extractor.extract(&coverage_image, ExtractionKind::Coverages),
            self.extractor.extract(deductible_image, ExtractionKind::Deductibles),
        );

        let mut details = coverages?;
        let deductibles = deductibles.unwrap_or_else(|e| {
            warn!("Deductible extraction failed: {:#}", e);
            PolicyDetails::default()
        });

        details.deductible = Some(deductibles.deductible.unwrap_or_else(|| NOT_FOUND.to_string()));
        details.windstorm_deductible = Some(
            deductibles
                .windstorm_deductible
                .unwrap_or_else(|| NOT_FOUND.to_string()),
        );

        Ok(details)
    }
}
