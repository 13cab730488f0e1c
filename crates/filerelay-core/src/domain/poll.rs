//! Poll requests, resumption tokens and outcomes

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::content::FileType;
use super::file_descriptor::FileDocument;

/// Opaque resumption token handed back to the caller after every poll
///
/// Holds the name of the file that must be deleted before the next match
/// is searched for. The empty token means "nothing pending, start fresh".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumptionToken(String);

impl ResumptionToken {
    /// The "nothing pending" token.
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The file name pending deletion, if any.
    pub fn pending_file(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            Some(&self.0)
        }
    }
}

impl Display for ResumptionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResumptionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ResumptionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Parameters of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub token: ResumptionToken,
    pub folder: String,
    pub include_mask: String,
    pub exclude_mask: Option<String>,
    pub file_type: FileType,
}

impl PollRequest {
    /// A poll with the match-all include mask and no exclusions.
    pub fn new(folder: impl Into<String>, token: ResumptionToken) -> Self {
        Self {
            token,
            folder: folder.into(),
            include_mask: "*".to_string(),
            exclude_mask: None,
            file_type: FileType::Text,
        }
    }

    pub fn with_masks(mut self, include: impl Into<String>, exclude: Option<String>) -> Self {
        self.include_mask = include.into();
        self.exclude_mask = exclude;
        self
    }

    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }
}

/// Result of a poll
///
/// The delivered file stays on the remote store until the next poll that
/// presents `next_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PollOutcome {
    #[serde(rename_all = "camelCase")]
    Delivered {
        document: FileDocument,
        next_token: ResumptionToken,
    },
    #[serde(rename_all = "camelCase")]
    NoEvent { next_token: ResumptionToken },
}

impl PollOutcome {
    /// A delivery whose token names the delivered file.
    pub fn delivered(document: FileDocument) -> Self {
        let next_token = ResumptionToken::new(document.descriptor.file_name());
        Self::Delivered {
            document,
            next_token,
        }
    }

    pub fn no_event() -> Self {
        Self::NoEvent {
            next_token: ResumptionToken::empty(),
        }
    }

    pub fn next_token(&self) -> &ResumptionToken {
        match self {
            Self::Delivered { next_token, .. } | Self::NoEvent { next_token } => next_token,
        }
    }

    pub fn document(&self) -> Option<&FileDocument> {
        match self {
            Self::Delivered { document, .. } => Some(document),
            Self::NoEvent { .. } => None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}
