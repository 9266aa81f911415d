//! Batch enrichment of document descriptors.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use reqwest::Url;
use tracing::{error, info, warn};

use crate::error::ItemFailure;
use crate::extract::SemanticStrategy;
use crate::models::config::PropsigConfig;
use crate::models::record::{DocumentDescriptor, EnrichedRecord, ExtractedFields};
use crate::page::PageFetcher;
use crate::resolver::{DocumentFieldResolver, ExtractionSource, Resolution};

/// Everything a batch shares across documents: the page session and the
/// resolver with its loaded credential. Built once before a run and
/// released when the processor is dropped.
pub struct BatchContext {
    fetcher: Box<dyn PageFetcher>,
    resolver: DocumentFieldResolver,
    delay: Duration,
}

impl BatchContext {
    pub fn new(fetcher: impl PageFetcher + 'static, resolver: DocumentFieldResolver) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            resolver,
            delay: Duration::ZERO,
        }
    }

    /// Context with the configured semantic strategy and pacing.
    ///
    /// `api_key` is read once here (see [`PropsigConfig::api_key`]); `None`
    /// sends every document straight to the pattern rules.
    pub fn from_config(
        config: &PropsigConfig,
        api_key: Option<String>,
        fetcher: impl PageFetcher + 'static,
    ) -> crate::Result<Self> {
        let primary = SemanticStrategy::from_config(&config.semantic, api_key)?;
        let resolver =
            DocumentFieldResolver::new(primary).with_primary_attempts(config.batch.primary_attempts);

        Ok(Self::new(fetcher, resolver).with_delay(Duration::from_millis(config.batch.delay_ms)))
    }

    /// Pause between consecutive documents.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Outcome of one descriptor before it is flattened into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The resolver ran to completion (possibly with empty fields).
    Resolved(Resolution),
    /// Processing failed outside the resolver.
    Failed(ItemFailure),
}

impl ItemOutcome {
    /// Fields to write for this item; empty for failures.
    pub fn fields(&self) -> ExtractedFields {
        match self {
            ItemOutcome::Resolved(resolution) => resolution.fields.clone(),
            ItemOutcome::Failed(_) => ExtractedFields::empty(),
        }
    }
}

/// Counts of how each item was resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub semantic: usize,
    pub pattern: usize,
    pub unresolved: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ItemOutcome) {
        self.processed += 1;
        match outcome {
            ItemOutcome::Resolved(r) => match r.source {
                ExtractionSource::Semantic => self.semantic += 1,
                ExtractionSource::Pattern => self.pattern += 1,
                ExtractionSource::Unresolved => self.unresolved += 1,
            },
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Records of one run, in input order, with per-item outcomes.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Output columns, known even when no record was produced.
    pub header: Vec<String>,
    pub records: Vec<EnrichedRecord>,
    pub outcomes: Vec<ItemOutcome>,
    pub summary: BatchSummary,
}

/// Applies the resolver to a sequence of descriptors, one at a time.
pub struct BatchProcessor {
    context: BatchContext,
}

impl BatchProcessor {
    pub fn new(context: BatchContext) -> Self {
        Self { context }
    }

    /// Enrich the first `limit` descriptors, in order.
    pub fn run(&self, descriptors: &[DocumentDescriptor], limit: usize) -> BatchResult {
        self.run_with_progress(descriptors, limit, |_, _, _| {})
    }

    /// Like [`run`](Self::run), calling `on_item(index, descriptor, outcome)`
    /// after each item.
    pub fn run_with_progress<F>(
        &self,
        descriptors: &[DocumentDescriptor],
        limit: usize,
        mut on_item: F,
    ) -> BatchResult
    where
        F: FnMut(usize, &DocumentDescriptor, &ItemOutcome),
    {
        let start = Instant::now();
        let total = descriptors.len().min(limit);
        info!("Processing {} of {} documents", total, descriptors.len());

        let mut records = Vec::with_capacity(total);
        let mut outcomes = Vec::with_capacity(total);
        let mut summary = BatchSummary::default();

        for (i, descriptor) in descriptors.iter().take(total).enumerate() {
            if i > 0 && !self.context.delay.is_zero() {
                std::thread::sleep(self.context.delay);
            }

            info!(
                "Processing URL {}/{}: {} for company: {}",
                i + 1,
                total,
                descriptor.document_url,
                descriptor.company
            );

            let outcome = self.process_item(descriptor);
            match &outcome {
                ItemOutcome::Resolved(r) if r.source == ExtractionSource::Unresolved => {
                    warn!("Could not read document {}/{}", i + 1, total)
                }
                ItemOutcome::Resolved(r) => info!(
                    "Processed document {}/{} via {} ({}/4 fields)",
                    i + 1,
                    total,
                    r.source,
                    r.fields.found_count()
                ),
                ItemOutcome::Failed(failure) => {
                    error!("Error processing document {}/{}: {}", i + 1, total, failure)
                }
            }

            summary.record(&outcome);
            on_item(i, descriptor, &outcome);
            records.push(EnrichedRecord::merge(descriptor, &outcome.fields()));
            outcomes.push(outcome);
        }

        summary.elapsed_ms = start.elapsed().as_millis() as u64;

        BatchResult {
            header: EnrichedRecord::header_for(descriptors.first()),
            records,
            outcomes,
            summary,
        }
    }

    fn process_item(&self, descriptor: &DocumentDescriptor) -> ItemOutcome {
        if let Err(failure) = validate_url(&descriptor.document_url) {
            return ItemOutcome::Failed(failure);
        }

        let context = &self.context;
        let resolved = panic::catch_unwind(AssertUnwindSafe(|| {
            context
                .resolver
                .resolve_traced(&descriptor.document_url, context.fetcher.as_ref())
        }));

        match resolved {
            Ok(resolution) => ItemOutcome::Resolved(resolution),
            Err(payload) => ItemOutcome::Failed(ItemFailure::Panicked(panic_message(payload))),
        }
    }
}

fn validate_url(url: &str) -> Result<(), ItemFailure> {
    if url.is_empty() {
        return Err(ItemFailure::InvalidDescriptor("missing document URL".to_string()));
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(parsed) => Err(ItemFailure::InvalidDescriptor(format!(
            "unsupported URL scheme {}: {}",
            parsed.scheme(),
            url
        ))),
        Err(e) => Err(ItemFailure::InvalidDescriptor(format!("{}: {}", url, e))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
