//! Mapping of raw wallet/provider failures to user-facing messages
//!
//! Classification is an ordered rule table evaluated first-match-wins.
//! Callers extend it with [`ErrorClassifier::with_rule`] (lowest
//! precedence) or [`ErrorClassifier::with_priority_rule`] (highest).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::infra::ProviderError;

/// EIP-1193 "user rejected request" code
pub const USER_REJECTED_CODE: i64 = 4001;

pub const MSG_USER_REJECTED: &str = "Transaction was rejected in your wallet";
pub const MSG_INSUFFICIENT_FUNDS: &str = "You don't have enough funds to create this bounty";
pub const MSG_INSUFFICIENT_FUNDS_PROOF: &str = "You don't have enough funds to submit this proof";
pub const MSG_NOT_CONNECTED: &str = "Please connect your wallet first";
pub const MSG_ALREADY_IN_PROGRESS: &str = "A transaction is already in progress";
pub const MSG_REVERTED: &str = "Transaction reverted on-chain";
pub const DEFAULT_FALLBACK: &str = "Transaction failed. Please try again.";

/// User-facing error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotConnected,
    AlreadyInProgress,
    UserRejected,
    InsufficientFunds,
    Network,
    Packaging,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotConnected => "not_connected",
            ErrorKind::AlreadyInProgress => "already_in_progress",
            ErrorKind::UserRejected => "user_rejected",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::Network => "network",
            ErrorKind::Packaging => "packaging",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure with its classification and the message to show the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Raw provider message, kept for logs
    pub cause: Option<String>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn not_connected() -> Self {
        Self::new(ErrorKind::NotConnected, MSG_NOT_CONNECTED)
    }

    pub fn already_in_progress() -> Self {
        Self::new(ErrorKind::AlreadyInProgress, MSG_ALREADY_IN_PROGRESS)
    }
}

/// What a rule matches against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Provider error code equals
    Code(i64),
    /// Message contains the text, ignoring ASCII case
    Contains(String),
}

impl Matcher {
    pub fn contains(text: impl Into<String>) -> Self {
        Matcher::Contains(text.into().to_ascii_lowercase())
    }

    fn matches(&self, err: &ProviderError, lowered: &str) -> bool {
        match self {
            Matcher::Code(code) => err.code == Some(*code),
            Matcher::Contains(needle) => lowered.contains(needle.as_str()),
        }
    }
}

/// One row of the classification table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRule {
    pub matcher: Matcher,
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassificationRule {
    pub fn new(matcher: Matcher, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            matcher,
            kind,
            message: message.into(),
        }
    }
}

/// Table-driven classifier
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<ClassificationRule>,
    fallback: String,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::wallet_defaults(DEFAULT_FALLBACK, MSG_INSUFFICIENT_FUNDS)
    }
}

impl ErrorClassifier {
    /// Empty table; everything falls through to the raw message or `fallback`
    pub fn empty(fallback: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: fallback.into(),
        }
    }

    /// Standard wallet rules; `funds_message` is shown when the balance
    /// cannot cover value plus gas
    pub fn wallet_defaults(fallback: impl Into<String>, funds_message: impl Into<String>) -> Self {
        let rejected = |m| ClassificationRule::new(m, ErrorKind::UserRejected, MSG_USER_REJECTED);
        Self::empty(fallback)
            .with_rule(rejected(Matcher::Code(USER_REJECTED_CODE)))
            .with_rule(rejected(Matcher::contains("4001")))
            .with_rule(rejected(Matcher::contains("user rejected")))
            .with_rule(rejected(Matcher::contains("user denied")))
            .with_rule(ClassificationRule::new(
                Matcher::contains("insufficient funds"),
                ErrorKind::InsufficientFunds,
                funds_message,
            ))
    }

    /// Append a rule, evaluated after the existing ones
    pub fn with_rule(mut self, rule: ClassificationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Prepend a rule, evaluated before the existing ones
    pub fn with_priority_rule(mut self, rule: ClassificationRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Classify a raw provider failure
    pub fn classify(&self, err: &ProviderError) -> ClassifiedError {
        let lowered = err.message.to_ascii_lowercase();

        if let Some(rule) = self.rules.iter().find(|r| r.matcher.matches(err, &lowered)) {
            return ClassifiedError::new(rule.kind, rule.message.clone())
                .with_cause(err.message.clone());
        }

        if err.message.trim().is_empty() {
            ClassifiedError::new(ErrorKind::Unknown, self.fallback.clone())
        } else {
            ClassifiedError::new(ErrorKind::Network, err.message.clone())
                .with_cause(err.message.clone())
        }
    }
}
