use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A node in the user's library hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryFolder {
    pub id: String,
    pub name: String,
    /// Parent folder id, `None` for top-level folders
    #[serde(default, alias = "parentId")]
    pub parent: Option<String>,
    #[serde(default)]
    pub expanded: bool,
}

impl LibraryFolder {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: parent.map(str::to_string),
            expanded: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Full library state as returned by `GET /library`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub folders: Vec<LibraryFolder>,
    /// Folder id to the publication ids filed in it
    #[serde(default)]
    pub folder_publications: HashMap<String, BTreeSet<String>>,
}

/// One rendered line of the folder tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderRow {
    pub id: String,
    pub name: String,
    pub depth: usize,
    pub expanded: bool,
    pub has_children: bool,
    pub publication_count: usize,
}
