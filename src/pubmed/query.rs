//! Structured search criteria and their PubMed query string

use serde::{Deserialize, Serialize};

/// Field inputs of the search form
///
/// Only non-empty fields contribute to the query. Each one is qualified with
/// its PubMed field tag and the clauses are joined with `AND` in a fixed
/// order: keywords, title, author, journal, year.
///
/// # Example
///
/// ```
/// use pubmed_import_rs::pubmed::SearchCriteria;
///
/// let query = SearchCriteria::new()
///     .title("diabetes")
///     .author("Smith J")
///     .build_query();
///
/// assert_eq!(query, "diabetes[Title] AND Smith J[Author]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub keywords: String,
    pub title: String,
    pub author: String,
    pub journal: String,
    pub year: String,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text terms, matched against title and abstract
    pub fn keywords<S: Into<String>>(mut self, keywords: S) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    pub fn author<S: Into<String>>(mut self, author: S) -> Self {
        self.author = author.into();
        self
    }

    pub fn journal<S: Into<String>>(mut self, journal: S) -> Self {
        self.journal = journal.into();
        self
    }

    /// Publication year, or a range such as `2018:2020`
    pub fn year<S: Into<String>>(mut self, year: S) -> Self {
        self.year = year.into();
        self
    }

    /// True when no field carries any text
    pub fn is_empty(&self) -> bool {
        self.clauses().is_empty()
    }

    /// One qualified clause per non-empty field, in field order
    pub fn clauses(&self) -> Vec<String> {
        [
            (&self.keywords, "Title/Abstract"),
            (&self.title, "Title"),
            (&self.author, "Author"),
            (&self.journal, "Journal"),
            (&self.year, "pdat"),
        ]
        .into_iter()
        .filter_map(|(value, tag)| {
            let value = value.trim();
            (!value.is_empty()).then(|| format!("{}[{}]", value, tag))
        })
        .collect()
    }

    /// PubMed `term` for esearch; empty when every field is blank
    pub fn build_query(&self) -> String {
        self.clauses().join(" AND ")
    }
}
