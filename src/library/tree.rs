use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::error::{ImportError, Result};
use crate::library::folder::{FolderRow, LibraryFolder, LibrarySnapshot};

/// In-memory library hierarchy with publication filings
///
/// `children_of` is an adjacency index keyed by parent id (`None` for the
/// top level). It is rebuilt whenever the parent structure changes, so
/// lookups never scan the whole folder list.
#[derive(Debug, Clone, Default)]
pub struct FolderTree {
    folders: HashMap<String, LibraryFolder>,
    children_of: HashMap<Option<String>, Vec<String>>,
    folder_publications: HashMap<String, BTreeSet<String>>,
}

impl FolderTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(folders: Vec<LibraryFolder>) -> Self {
        Self::from_snapshot(LibrarySnapshot {
            folders,
            folder_publications: HashMap::new(),
        })
    }

    pub fn from_snapshot(snapshot: LibrarySnapshot) -> Self {
        let folders: HashMap<String, LibraryFolder> = snapshot
            .folders
            .into_iter()
            .map(|f| (f.id.clone(), f))
            .collect();

        // Filings for folders we do not know about are dropped
        let folder_publications = snapshot
            .folder_publications
            .into_iter()
            .filter(|(id, _)| folders.contains_key(id))
            .collect();

        let mut tree = Self {
            folders,
            children_of: HashMap::new(),
            folder_publications,
        };
        tree.rebuild_index();
        tree
    }

    fn rebuild_index(&mut self) {
        let mut children_of: HashMap<Option<String>, Vec<String>> = HashMap::new();
        for folder in self.folders.values() {
            // Dangling parents are shown at the top level
            let key = folder
                .parent
                .as_ref()
                .filter(|parent| self.folders.contains_key(*parent))
                .cloned();
            children_of.entry(key).or_default().push(folder.id.clone());
        }

        for children in children_of.values_mut() {
            Self::sort_children(children, &self.folders);
        }
        self.children_of = children_of;
    }

    fn sort_children(children: &mut [String], folders: &HashMap<String, LibraryFolder>) {
        children.sort_by(|a, b| match (folders.get(a), folders.get(b)) {
            (Some(fa), Some(fb)) => fa
                .name
                .to_lowercase()
                .cmp(&fb.name.to_lowercase())
                .then_with(|| fa.id.cmp(&fb.id)),
            _ => std::cmp::Ordering::Equal,
        });
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn contains(&self, folder_id: &str) -> bool {
        self.folders.contains_key(folder_id)
    }

    pub fn get(&self, folder_id: &str) -> Option<&LibraryFolder> {
        self.folders.get(folder_id)
    }

    /// All folders, in no particular order
    pub fn folders(&self) -> impl Iterator<Item = &LibraryFolder> {
        self.folders.values()
    }

    fn require(&self, folder_id: &str) -> Result<&LibraryFolder> {
        self.folders
            .get(folder_id)
            .ok_or_else(|| ImportError::FolderNotFound {
                folder_id: folder_id.to_string(),
            })
    }

    pub fn roots(&self) -> Vec<&LibraryFolder> {
        self.collect_children(None)
    }

    pub fn children(&self, folder_id: &str) -> Vec<&LibraryFolder> {
        self.collect_children(Some(folder_id.to_string()))
    }

    fn collect_children(&self, key: Option<String>) -> Vec<&LibraryFolder> {
        self.children_of
            .get(&key)
            .map(|ids| ids.iter().filter_map(|id| self.folders.get(id)).collect())
            .unwrap_or_default()
    }

    fn child_ids(&self, folder_id: &str) -> &[String] {
        self.children_of
            .get(&Some(folder_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every folder strictly below `folder_id`
    pub fn descendants(&self, folder_id: &str) -> HashSet<String> {
        let mut found = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([folder_id]);

        while let Some(current) = queue.pop_front() {
            for child in self.child_ids(current) {
                if child != folder_id && found.insert(child.clone()) {
                    queue.push_back(child.as_str());
                }
            }
        }

        found
    }

    /// Parent chain from the immediate parent up to the root
    pub fn ancestors(&self, folder_id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([folder_id.to_string()]);
        let mut current = self.folders.get(folder_id).and_then(|f| f.parent.clone());

        while let Some(parent_id) = current {
            if !seen.insert(parent_id.clone()) {
                break;
            }
            current = self.folders.get(&parent_id).and_then(|f| f.parent.clone());
            if !self.folders.contains_key(&parent_id) {
                break;
            }
            chain.push(parent_id);
        }

        chain
    }

    /// Folder names from the root down to `folder_id`
    pub fn path(&self, folder_id: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .ancestors(folder_id)
            .iter()
            .rev()
            .filter_map(|id| self.folders.get(id).map(|f| f.name.as_str()))
            .collect();
        if let Some(folder) = self.folders.get(folder_id) {
            names.push(&folder.name);
        }
        names
    }

    /// Depth-first rows for display; children of collapsed folders are hidden
    pub fn visible_rows(&self) -> Vec<FolderRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<(&str, usize)> = self
            .roots()
            .iter()
            .rev()
            .map(|f| (f.id.as_str(), 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(folder) = self.folders.get(id) else {
                continue;
            };
            let children = self.child_ids(id);
            rows.push(FolderRow {
                id: folder.id.clone(),
                name: folder.name.clone(),
                depth,
                expanded: folder.expanded,
                has_children: !children.is_empty(),
                publication_count: self.publications_in(id).len(),
            });

            if folder.expanded {
                stack.extend(children.iter().rev().map(|c| (c.as_str(), depth + 1)));
            }
        }

        rows
    }

    /// Expanded state a new child of `parent` starts with
    pub fn default_expanded_for(&self, parent: Option<&str>) -> bool {
        parent
            .and_then(|id| self.folders.get(id))
            .is_some_and(|f| f.expanded)
    }

    /// Trimmed name, or `EmptyName`
    pub fn validate_name(name: &str) -> Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ImportError::EmptyName);
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_new_folder(&self, name: &str, parent: Option<&str>) -> Result<String> {
        let name = Self::validate_name(name)?;
        if let Some(parent_id) = parent {
            self.require(parent_id)?;
        }
        Ok(name)
    }

    /// Check that `folder_id` may be re-parented under `new_parent`
    ///
    /// # Errors
    ///
    /// * `FolderNotFound` - either folder is unknown
    /// * `FolderCycleViolation` - target is the folder itself or below it
    /// * `InvalidMove` - target is already the current parent
    pub fn validate_move(&self, folder_id: &str, new_parent: Option<&str>) -> Result<()> {
        let folder = self.require(folder_id)?;

        if let Some(target) = new_parent {
            if target == folder_id || self.descendants(folder_id).contains(target) {
                return Err(ImportError::FolderCycleViolation {
                    folder_id: folder_id.to_string(),
                    target_id: target.to_string(),
                });
            }
            self.require(target)?;
        }

        if folder.parent.as_deref() == new_parent {
            return Err(ImportError::InvalidMove {
                message: "folder is already in that location".to_string(),
            });
        }

        Ok(())
    }

    pub fn insert_folder(&mut self, folder: LibraryFolder) {
        self.folders.insert(folder.id.clone(), folder);
        self.rebuild_index();
    }

    pub fn rename(&mut self, folder_id: &str, name: &str) -> Result<()> {
        let name = Self::validate_name(name)?;
        let folder = self
            .folders
            .get_mut(folder_id)
            .ok_or_else(|| ImportError::FolderNotFound {
                folder_id: folder_id.to_string(),
            })?;
        folder.name = name;
        self.rebuild_index();
        Ok(())
    }

    /// Re-parent after [`validate_move`](Self::validate_move) succeeded
    pub fn set_parent(&mut self, folder_id: &str, new_parent: Option<&str>) -> Result<()> {
        self.validate_move(folder_id, new_parent)?;
        if let Some(folder) = self.folders.get_mut(folder_id) {
            folder.parent = new_parent.map(str::to_string);
        }
        self.rebuild_index();
        Ok(())
    }

    /// Set the expanded flag, returning the previous value
    pub fn set_expanded(&mut self, folder_id: &str, expanded: bool) -> Result<bool> {
        let folder = self
            .folders
            .get_mut(folder_id)
            .ok_or_else(|| ImportError::FolderNotFound {
                folder_id: folder_id.to_string(),
            })?;
        Ok(std::mem::replace(&mut folder.expanded, expanded))
    }

    /// Remove a folder and everything below it, including their filings
    ///
    /// Returns the removed folder ids.
    pub fn remove_cascade(&mut self, folder_id: &str) -> Result<Vec<String>> {
        self.require(folder_id)?;

        let mut removed: Vec<String> = self.descendants(folder_id).into_iter().collect();
        removed.push(folder_id.to_string());

        for id in &removed {
            self.folders.remove(id);
            self.folder_publications.remove(id);
        }
        self.rebuild_index();

        Ok(removed)
    }

    pub fn publications_in(&self, folder_id: &str) -> Vec<&str> {
        self.folder_publications
            .get(folder_id)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains_publication(&self, folder_id: &str, publication_id: &str) -> bool {
        self.folder_publications
            .get(folder_id)
            .is_some_and(|ids| ids.contains(publication_id))
    }

    /// Folders a publication is filed in
    pub fn folders_containing(&self, publication_id: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .folder_publications
            .iter()
            .filter(|(_, pubs)| pubs.contains(publication_id))
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn validate_add(&self, folder_id: &str, publication_id: &str) -> Result<()> {
        self.require(folder_id)?;
        if self.contains_publication(folder_id, publication_id) {
            return Err(ImportError::AlreadyFiled {
                publication_id: publication_id.to_string(),
                folder_id: folder_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_remove(&self, folder_id: &str, publication_id: &str) -> Result<()> {
        self.require(folder_id)?;
        if !self.contains_publication(folder_id, publication_id) {
            return Err(ImportError::NotFiled {
                publication_id: publication_id.to_string(),
                folder_id: folder_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_move_publication(
        &self,
        publication_id: &str,
        from_folder: &str,
        to_folder: &str,
    ) -> Result<()> {
        self.validate_remove(from_folder, publication_id)?;
        if from_folder == to_folder {
            return Err(ImportError::InvalidMove {
                message: "publication is already in that folder".to_string(),
            });
        }
        self.validate_add(to_folder, publication_id)
    }

    /// Whether the "move here" action should be enabled
    pub fn can_move_publication(&self, publication_id: &str, from_folder: &str, to_folder: &str) -> bool {
        self.validate_move_publication(publication_id, from_folder, to_folder)
            .is_ok()
    }

    pub fn add_publication(&mut self, folder_id: &str, publication_id: &str) -> Result<()> {
        self.validate_add(folder_id, publication_id)?;
        self.folder_publications
            .entry(folder_id.to_string())
            .or_default()
            .insert(publication_id.to_string());
        Ok(())
    }

    pub fn remove_publication(&mut self, folder_id: &str, publication_id: &str) -> Result<()> {
        self.validate_remove(folder_id, publication_id)?;
        if let Some(ids) = self.folder_publications.get_mut(folder_id) {
            ids.remove(publication_id);
        }
        Ok(())
    }

    pub fn move_publication(
        &mut self,
        publication_id: &str,
        from_folder: &str,
        to_folder: &str,
    ) -> Result<()> {
        self.validate_move_publication(publication_id, from_folder, to_folder)?;
        self.remove_publication(from_folder, publication_id)?;
        self.add_publication(to_folder, publication_id)
    }
}
