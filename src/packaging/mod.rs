//! Proof packaging pipeline
//!
//! 1. Upload every attached file concurrently; all must succeed.
//! 2. Build the [`ProofMetadata`] record from the uploads, links and comments.
//! 3. Upload the record and reduce its reference to a bare [`ContentId`].
//!
//! Only that identifier goes on-chain. If a later step fails, content
//! already uploaded stays in storage; there is no cleanup.

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::domain::{Address, ContentId, ProofFileRecord, ProofMetadata, ProofSubmission};
use crate::infra::{ContentStore, PackagingError};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::telemetry::spans;

/// Output of a successful packaging run
#[derive(Debug, Clone)]
pub struct PackagedProof {
    /// Bare identifier of the uploaded metadata record
    pub cid: ContentId,
    pub metadata: ProofMetadata,
}

/// Uploads proof artifacts and their metadata record
pub struct ProofPackager {
    store: Arc<dyn ContentStore>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ProofPackager {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Package `submission` and return the identifier to record on-chain
    pub async fn package(
        &self,
        submission: &ProofSubmission,
        submitter: Address,
    ) -> Result<ContentId, PackagingError> {
        self.assemble(submission, submitter).await.map(|p| p.cid)
    }

    /// Package `submission`, returning the metadata record as well
    pub async fn assemble(
        &self,
        submission: &ProofSubmission,
        submitter: Address,
    ) -> Result<PackagedProof, PackagingError> {
        let span = info_span!(
            spans::PACKAGE_PROOF,
            bounty_id = %submission.bounty_id,
            files = submission.files.len()
        );
        let result = self.run(submission, submitter).instrument(span).await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(_) => metrics.inc_counter(metric_names::PROOFS_PACKAGED).await,
                Err(_) => {
                    metrics
                        .inc_counter(metric_names::PROOF_PACKAGING_FAILED)
                        .await
                }
            }
        }
        if let Err(e) = &result {
            warn!(bounty_id = %submission.bounty_id, "Proof packaging failed: {}", e);
        }
        result
    }

    async fn run(
        &self,
        submission: &ProofSubmission,
        submitter: Address,
    ) -> Result<PackagedProof, PackagingError> {
        let files = self.upload_files(submission).await?;

        let metadata =
            ProofMetadata::build(submission, submitter, files, Utc::now().timestamp_millis());
        let document = serde_json::to_value(&metadata)?;

        let name = format!("proof-bounty-{}.json", submission.bounty_id);
        let reference = self
            .store
            .upload_json(&name, &document)
            .await
            .map_err(PackagingError::MetadataUpload)?;
        let cid =
            ContentId::from_storage_reference(&reference).ok_or(PackagingError::EmptyIdentifier)?;

        info!(
            bounty_id = %submission.bounty_id,
            %cid,
            files = metadata.files.len(),
            links = metadata.links.len(),
            "Proof packaged"
        );
        Ok(PackagedProof { cid, metadata })
    }

    /// Upload all files concurrently; the first failure fails the whole step
    async fn upload_files(
        &self,
        submission: &ProofSubmission,
    ) -> Result<Vec<ProofFileRecord>, PackagingError> {
        if submission.files.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = submission.files.len(), "Uploading proof files");

        let uploads = submission.files.iter().map(|file| async move {
            let stored =
                self.store
                    .upload_file(file)
                    .await
                    .map_err(|source| PackagingError::FileUpload {
                        name: file.name.clone(),
                        source,
                    })?;
            Ok::<_, PackagingError>(ProofFileRecord {
                name: file.name.clone(),
                cid: stored.cid,
                url: stored.url,
            })
        });
        let records = try_join_all(uploads).await?;

        if let Some(metrics) = &self.metrics {
            let bytes: usize = submission.files.iter().map(|f| f.size()).sum();
            metrics
                .add_counter(metric_names::PROOF_FILES_UPLOADED, records.len() as u64)
                .await;
            metrics
                .add_counter(metric_names::PROOF_BYTES_UPLOADED, bytes as u64)
                .await;
        }
        Ok(records)
    }
}
