//! Proof submissions and the metadata record built from them

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Address, BountyId};
use crate::infra::ValidationError;

/// A binary artifact attached to a proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AttachedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Result of uploading one file to content-addressed storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub cid: String,
    /// Gateway URL the content can be fetched from
    pub url: String,
}

/// Ordered list of external links, only ever holding well-formed URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkList {
    links: Vec<String>,
}

impl LinkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link.
    ///
    /// Blank input is ignored and returns `Ok(false)`. Malformed input is
    /// rejected and the list is left as it was.
    pub fn add(&mut self, raw: &str) -> Result<bool, ValidationError> {
        if raw.trim().is_empty() {
            return Ok(false);
        }
        Url::parse(raw).map_err(|_| ValidationError::InvalidUrl(raw.to_string()))?;
        self.links.push(raw.to_string());
        Ok(true)
    }

    pub fn remove(&mut self, index: usize) -> Result<String, ValidationError> {
        if index >= self.links.len() {
            return Err(ValidationError::IndexOutOfRange(index));
        }
        Ok(self.links.remove(index))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Proof of completion for a bounty, as edited by the submitter
#[derive(Debug, Clone)]
pub struct ProofSubmission {
    pub bounty_id: BountyId,
    /// Title of the bounty, used for the metadata title
    pub bounty_title: String,
    pub comments: String,
    pub files: Vec<AttachedFile>,
    pub links: LinkList,
}

impl ProofSubmission {
    pub fn new(bounty_id: BountyId, bounty_title: impl Into<String>) -> Self {
        Self {
            bounty_id,
            bounty_title: bounty_title.into(),
            comments: String::new(),
            files: Vec::new(),
            links: LinkList::new(),
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    pub fn with_file(mut self, file: AttachedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Add a link, validating it
    pub fn with_link(mut self, link: &str) -> Result<Self, ValidationError> {
        self.links.add(link)?;
        Ok(self)
    }

    pub fn remove_file(&mut self, index: usize) -> Result<AttachedFile, ValidationError> {
        if index >= self.files.len() {
            return Err(ValidationError::IndexOutOfRange(index));
        }
        Ok(self.files.remove(index))
    }

    /// Check the submission can be packaged.
    ///
    /// At least one file or link must be present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.files.is_empty() && self.links.is_empty() {
            return Err(ValidationError::NoProofArtifacts);
        }
        Ok(())
    }
}

/// File entry inside [`ProofMetadata`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofFileRecord {
    pub name: String,
    pub cid: String,
    pub url: String,
}

/// Metadata document uploaded to storage; only its identifier goes on-chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofMetadata {
    pub title: String,
    pub description: String,
    pub submitter: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub files: Vec<ProofFileRecord>,
    pub links: Vec<String>,
}

impl ProofMetadata {
    pub fn build(
        submission: &ProofSubmission,
        submitter: Address,
        files: Vec<ProofFileRecord>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            title: format!("Proof for Bounty: {}", submission.bounty_title),
            description: submission.comments.clone(),
            submitter: submitter.to_checksum(None),
            timestamp: timestamp_ms,
            files,
            links: submission.links.as_slice().to_vec(),
        }
    }
}
