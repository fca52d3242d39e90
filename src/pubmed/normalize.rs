//! Normalization of raw ESummary documents into canonical publications
//!
//! Provider records are heterogeneous: fields go missing, dates come in
//! free-text formats and identifiers are buried in lists. Every function here
//! is total, so a malformed record degrades to sentinel values instead of
//! failing the whole page.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::publication::{
    ARTICLE_TYPE, ImportSource, MAX_AUTHORS, Publication, PublicationYear, UNKNOWN_AUTHOR,
    UNKNOWN_JOURNAL, UNKNOWN_TITLE,
};

pub const SOURCE_NAME: &str = "PubMed";
pub const IMPORT_METHOD: &str = "pubmed";
const ARTICLE_URL_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// Build a canonical [`Publication`] from one ESummary document
///
/// `uid` is the key the document was listed under; it is used when the
/// document itself carries no `uid`.
///
/// # Example
///
/// ```
/// use pubmed_import_rs::pubmed::normalize_summary;
/// use pubmed_import_rs::PublicationYear;
///
/// let doc = serde_json::json!({"uid": "111", "title": "Diabetes care", "pubdate": "2019 Mar"});
/// let publication = normalize_summary("111", &doc);
///
/// assert_eq!(publication.year, PublicationYear::Year(2019));
/// assert_eq!(publication.authors, vec!["Unknown Author"]);
/// ```
pub fn normalize_summary(uid: &str, doc: &Value) -> Publication {
    let pmid = match string_field(doc, "uid") {
        id if !id.is_empty() => id,
        _ => uid.trim().to_string(),
    };

    let title = match string_field(doc, "title") {
        t if t.is_empty() => UNKNOWN_TITLE.to_string(),
        t => t,
    };

    let journal = [string_field(doc, "fulljournalname"), string_field(doc, "source")]
        .into_iter()
        .find(|j| !j.is_empty())
        .unwrap_or_else(|| UNKNOWN_JOURNAL.to_string());

    let year = ["pubdate", "epubdate", "sortpubdate"]
        .iter()
        .find_map(|key| extract_year(&string_field(doc, key)))
        .map(PublicationYear::Year)
        .unwrap_or(PublicationYear::Unknown);

    let publication = Publication {
        id: synthetic_id(&pmid),
        title,
        authors: extract_authors(doc),
        year,
        journal,
        publication_type: ARTICLE_TYPE.to_string(),
        abstract_text: string_field(doc, "abstract"),
        keywords: string_list(doc, "keywords"),
        doi: extract_doi(doc).unwrap_or_default(),
        url: format!("{}/{}/", ARTICLE_URL_BASE, pmid),
        volume: string_field(doc, "volume"),
        issue: string_field(doc, "issue"),
        pages: string_field(doc, "pages"),
        source: SOURCE_NAME.to_string(),
        pubmed_id: pmid.clone(),
        import_source: ImportSource {
            method: IMPORT_METHOD.to_string(),
            origin_id: pmid,
            imported_at: Utc::now(),
            metadata: provider_metadata(doc),
        },
    };

    debug!(
        pmid = %publication.pubmed_id,
        authors = publication.authors.len(),
        has_doi = !publication.doi.is_empty(),
        "Normalized ESummary document"
    );

    publication
}

/// `pubmed_{pmid}_{millis}_{random}`
///
/// Unique per call, never stable: normalizing the same record twice yields
/// two different ids.
pub fn synthetic_id(pmid: &str) -> String {
    format!(
        "pubmed_{}_{}_{:08x}",
        pmid,
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}

/// First plausible four-digit year in a free-text date
///
/// PubMed dates show up as `"2020 Feb"`, `"2019 Dec 12"`,
/// `"2021/03/01 00:00"` or `"Winter 2018"`.
pub fn extract_year(date: &str) -> Option<i32> {
    static YEAR_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = YEAR_REGEX.get_or_init(|| {
        Regex::new(r"(?:^|\D)(1[89]\d{2}|20\d{2})(?:\D|$)").expect("Failed to compile year regex")
    });

    re.captures(date)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// DOI from the `articleids` list, falling back to `elocationid`
pub fn extract_doi(doc: &Value) -> Option<String> {
    let from_ids = doc
        .get("articleids")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|entry| {
            entry
                .get("idtype")
                .and_then(Value::as_str)
                .is_some_and(|idtype| idtype.eq_ignore_ascii_case("doi"))
        })
        .map(|entry| string_field(entry, "value"))
        .find(|value| !value.is_empty());

    if from_ids.is_some() {
        return from_ids;
    }

    // elocationid looks like "doi: 10.1000/xyz123" or "pii: S0140-6736(20)30183-5"
    static ELOCATION_DOI: OnceLock<Regex> = OnceLock::new();
    let re = ELOCATION_DOI.get_or_init(|| {
        Regex::new(r"(?i)doi:\s*(10\.\S+)").expect("Failed to compile elocation regex")
    });

    let elocation = string_field(doc, "elocationid");
    re.captures(&elocation)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string())
}

fn extract_authors(doc: &Value) -> Vec<String> {
    let authors: Vec<String> = doc
        .get("authors")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|author| match author {
            Value::String(name) => name.trim().to_string(),
            other => string_field(other, "name"),
        })
        .filter(|name| !name.is_empty())
        .take(MAX_AUTHORS)
        .collect();

    if authors.is_empty() {
        vec![UNKNOWN_AUTHOR.to_string()]
    } else {
        authors
    }
}

fn provider_metadata(doc: &Value) -> Map<String, Value> {
    let mut metadata = Map::new();

    for key in ["pubtype", "lang"] {
        let values = string_list(doc, key);
        if !values.is_empty() {
            metadata.insert(key.to_string(), Value::from(values));
        }
    }

    for key in ["issn", "essn", "recordstatus", "sortpubdate"] {
        let value = string_field(doc, key);
        if !value.is_empty() {
            metadata.insert(key.to_string(), Value::from(value));
        }
    }

    let pmc = doc
        .get("articleids")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|entry| entry.get("idtype").and_then(Value::as_str) == Some("pmc"))
        .map(|entry| string_field(entry, "value"))
        .filter(|value| !value.is_empty());
    if let Some(pmc) = pmc {
        metadata.insert("pmcid".to_string(), Value::from(pmc));
    }

    metadata
}

/// String value of `key`, numbers rendered as text, anything else empty
fn string_field(doc: &Value, key: &str) -> String {
    match doc.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn string_list(doc: &Value, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
