//! Canonical publication record shared by every stage of the pipeline

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const UNKNOWN_YEAR: &str = "Unknown Year";
pub const UNKNOWN_JOURNAL: &str = "Unknown Journal";

/// Authors beyond this are dropped during normalization
pub const MAX_AUTHORS: usize = 20;

/// Publication type assigned to every bibliographic import
pub const ARTICLE_TYPE: &str = "article";

/// Year of publication, or the "Unknown Year" sentinel
///
/// Serializes as a JSON number, or as the sentinel string when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawYear", into = "RawYear")]
pub enum PublicationYear {
    Year(i32),
    Unknown,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawYear {
    Number(i32),
    Text(String),
}

impl From<RawYear> for PublicationYear {
    fn from(raw: RawYear) -> Self {
        match raw {
            RawYear::Number(year) => PublicationYear::Year(year),
            RawYear::Text(text) => text
                .trim()
                .parse()
                .map(PublicationYear::Year)
                .unwrap_or(PublicationYear::Unknown),
        }
    }
}

impl From<PublicationYear> for RawYear {
    fn from(year: PublicationYear) -> Self {
        match year {
            PublicationYear::Year(year) => RawYear::Number(year),
            PublicationYear::Unknown => RawYear::Text(UNKNOWN_YEAR.to_string()),
        }
    }
}

impl PublicationYear {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            PublicationYear::Year(year) => Some(*year),
            PublicationYear::Unknown => None,
        }
    }
}

impl fmt::Display for PublicationYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicationYear::Year(year) => write!(f, "{}", year),
            PublicationYear::Unknown => f.write_str(UNKNOWN_YEAR),
        }
    }
}

/// Where a publication came from and when it was normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSource {
    /// Origin method, e.g. `"pubmed"`
    pub method: String,
    /// Identifier in the origin system (the PMID for PubMed)
    pub origin_id: String,
    pub imported_at: DateTime<Utc>,
    /// Origin-specific extras (publication types, languages, record status)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Normalized, source-agnostic publication record
///
/// Every field is populated: normalization substitutes sentinels or empty
/// strings for anything the provider left out. The `id` is synthetic until
/// the record is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: PublicationYear,
    pub journal: String,
    #[serde(rename = "type")]
    pub publication_type: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: Vec<String>,
    pub doi: String,
    pub url: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    /// Name of the origin provider, e.g. `"PubMed"`
    pub source: String,
    pub pubmed_id: String,
    pub import_source: ImportSource,
}

impl Publication {
    pub fn has_abstract(&self) -> bool {
        !self.abstract_text.trim().is_empty()
    }

    /// False when the title is missing or the sentinel
    pub fn has_title(&self) -> bool {
        let title = self.title.trim();
        !title.is_empty() && title != UNKNOWN_TITLE
    }

    /// Case-insensitive match over title, authors and journal
    pub fn matches_filter(&self, filter: &str) -> bool {
        let needle = filter.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.title.to_lowercase().contains(&needle)
            || self.journal.to_lowercase().contains(&needle)
            || self
                .authors
                .iter()
                .any(|author| author.to_lowercase().contains(&needle))
    }

    /// Short citation line: `Authors (Year). Title. Journal.`
    pub fn citation(&self) -> String {
        let authors = match self.authors.len() {
            0 => UNKNOWN_AUTHOR.to_string(),
            1 | 2 => self.authors.join(", "),
            _ => format!("{} et al.", self.authors[0]),
        };
        format!("{} ({}). {}. {}.", authors, self.year, self.title, self.journal)
    }
}

/// A publication after the persistence collaborator accepted it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPublication {
    /// Server-assigned id, supersedes the synthetic one
    pub id: String,
    /// The synthetic id the record carried before persistence
    pub synthetic_id: String,
    /// The record as stored, with `publication.id == id`
    pub publication: Publication,
}

impl PersistedPublication {
    pub fn new(server_id: String, mut publication: Publication) -> Self {
        let synthetic_id = std::mem::replace(&mut publication.id, server_id.clone());
        Self {
            id: server_id,
            synthetic_id,
            publication,
        }
    }
}
