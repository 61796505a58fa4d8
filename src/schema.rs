use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ModelLeverError, Result};

/// Metadata key under which a document's identifier is stored. The payload
/// store is keyed by the same value.
pub const ID_KEY: &str = "rec_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Text,
    Image,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Text => "text",
            MediaType::Image => "image",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the upstream PDF extraction step.
///
/// Field names on the wire follow the extractor's JSON keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    #[serde(rename = "tableElements", default)]
    pub table_elements: Vec<String>,
    #[serde(rename = "textElements", default)]
    pub text_elements: Vec<String>,
    #[serde(rename = "imgPath", default)]
    pub image_paths: Vec<PathBuf>,
}

impl ExtractedContent {
    pub fn is_empty(&self) -> bool {
        self.table_elements.is_empty() && self.text_elements.is_empty() && self.image_paths.is_empty()
    }
}

/// Original content of one media type paired with its generated summaries.
///
/// `payload[i]` is summarized by `summary[i]`; the constructor refuses sets
/// where the two lengths differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySet {
    #[serde(rename = "mediatype")]
    media_type: MediaType,
    payload: Vec<String>,
    summary: Vec<String>,
}

impl SummarySet {
    pub fn new(media_type: MediaType, payload: Vec<String>, summary: Vec<String>) -> Result<Self> {
        if payload.len() != summary.len() {
            return Err(ModelLeverError::SummaryLengthMismatch {
                media_type,
                payload: payload.len(),
                summary: summary.len(),
            });
        }
        Ok(Self {
            media_type,
            payload,
            summary,
        })
    }

    pub fn empty(media_type: MediaType) -> Self {
        Self {
            media_type,
            payload: Vec::new(),
            summary: Vec::new(),
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn payload(&self) -> &[String] {
        &self.payload
    }

    pub fn summary(&self) -> &[String] {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.summary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    /// `(payload, summary)` pairs in index order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.payload
            .iter()
            .zip(self.summary.iter())
            .map(|(p, s)| (p.as_str(), s.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarizedContent {
    #[serde(rename = "textSummaries")]
    pub text_summaries: SummarySet,
    #[serde(rename = "tableSummaries")]
    pub table_summaries: SummarySet,
    #[serde(rename = "imageSummaries")]
    pub image_summaries: SummarySet,
}

impl SummarizedContent {
    pub fn empty() -> Self {
        Self {
            text_summaries: SummarySet::empty(MediaType::Text),
            table_summaries: SummarySet::empty(MediaType::Text),
            image_summaries: SummarySet::empty(MediaType::Image),
        }
    }

    /// Labeled sets in indexing order: text, table, image.
    pub fn sets(&self) -> [(&'static str, &SummarySet); 3] {
        [
            ("textSummaries", &self.text_summaries),
            ("tableSummaries", &self.table_summaries),
            ("imageSummaries", &self.image_summaries),
        ]
    }

    pub fn total_len(&self) -> usize {
        self.sets().iter().map(|(_, set)| set.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "rec_id")]
    pub id: String,
    #[serde(rename = "mediaType")]
    pub media_type: MediaType,
    /// Original image path; only set for image documents.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
}

/// A summary as it lives in the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

impl IndexedDocument {
    pub fn new(id: String, media_type: MediaType, summary: &str, payload: &str) -> Self {
        let source = match media_type {
            MediaType::Image => Some(payload.to_string()),
            MediaType::Text => None,
        };
        Self {
            page_content: summary.to_string(),
            metadata: DocumentMetadata {
                id,
                media_type,
                source,
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}
