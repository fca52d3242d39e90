use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESearchResult {
    pub esearchresult: ESearchData,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESearchData {
    /// NCBI sometimes answers 200 OK and reports the failure here
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub retmax: Option<String>,
    #[serde(default)]
    pub retstart: Option<String>,
    #[serde(default)]
    pub idlist: Vec<String>,
    /// How PubMed interpreted the search term
    #[serde(default)]
    pub querytranslation: Option<String>,
}

impl ESearchData {
    /// Total hit count, zero when absent or malformed
    pub fn total_count(&self) -> usize {
        self.count
            .as_deref()
            .and_then(|count| count.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// ESummary keys each document by its UID next to a `uids` array, so the
/// payload is kept as raw JSON and normalized field by field.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESummaryResponse {
    #[serde(default)]
    pub result: serde_json::Value,
}
