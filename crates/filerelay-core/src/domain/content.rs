//! Content envelopes and the transfer-encoding codec
//!
//! A payload travels between the boundary layer and the transport as a
//! [`PayloadEnvelope`]: a string plus the [`TransferEncoding`] that says how
//! to turn it back into bytes. Text payloads are carried as-is, binary
//! payloads as standard base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::errors::ContentError;

/// How the `content` string of an envelope maps to raw bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferEncoding {
    /// Content is UTF-8 text carried verbatim
    #[default]
    None,
    /// Content is the base64 encoding of arbitrary bytes
    Base64,
}

/// Caller-facing file kind, used to pick the encoding of downloaded content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Text,
    Binary,
}

impl FileType {
    /// Text files travel unencoded, binary files as base64.
    pub fn transfer_encoding(self) -> TransferEncoding {
        match self {
            FileType::Text => TransferEncoding::None,
            FileType::Binary => TransferEncoding::Base64,
        }
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(FileType::Text),
            "binary" => Ok(FileType::Binary),
            other => Err(format!("unknown file type '{other}'; expected text or binary")),
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Encodes raw bytes into their transfer representation.
///
/// `None` requires the bytes to already be UTF-8 text; anything else fails
/// with [`ContentError::NotText`] rather than being silently replaced.
pub fn encode(bytes: &[u8], encoding: TransferEncoding) -> Result<String, ContentError> {
    match encoding {
        TransferEncoding::None => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| ContentError::NotText),
        TransferEncoding::Base64 => Ok(STANDARD.encode(bytes)),
    }
}

/// Decodes a transfer representation back into raw bytes.
///
/// A missing content string is [`ContentError::NullContent`]; the empty
/// string is a valid zero-length payload. ASCII whitespace inside base64
/// content (line wrapping) is ignored.
pub fn decode(content: Option<&str>, encoding: TransferEncoding) -> Result<Vec<u8>, ContentError> {
    let content = content.ok_or(ContentError::NullContent)?;

    match encoding {
        TransferEncoding::None => Ok(content.as_bytes().to_vec()),
        TransferEncoding::Base64 => {
            let compact: String = content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| ContentError::InvalidContentFormat(e.to_string()))
        }
    }
}

// ============================================================================
// PayloadEnvelope
// ============================================================================

/// A logical payload in its transfer-encoded form
///
/// `content` is optional only so that a missing value from the wire can be
/// reported as [`ContentError::NullContent`] instead of being confused with
/// an empty file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadEnvelope {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub transfer_encoding: TransferEncoding,
}

impl PayloadEnvelope {
    /// Wraps a string that is carried verbatim.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            transfer_encoding: TransferEncoding::None,
        }
    }

    /// Wraps a string that is already base64 encoded.
    pub fn base64(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            transfer_encoding: TransferEncoding::Base64,
        }
    }

    /// Builds an envelope from raw bytes using the requested encoding.
    pub fn from_bytes(bytes: &[u8], encoding: TransferEncoding) -> Result<Self, ContentError> {
        Ok(Self {
            content: Some(encode(bytes, encoding)?),
            transfer_encoding: encoding,
        })
    }

    /// Decodes the envelope back into raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ContentError> {
        decode(self.content.as_deref(), self.transfer_encoding)
    }
}
