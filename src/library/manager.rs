use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::backend::LibraryStore;
use crate::error::{ImportError, Result};
use crate::library::folder::LibraryFolder;
use crate::library::tree::FolderTree;

/// Keeps a [`FolderTree`] in step with the library collaborator
///
/// Structural checks run locally first so invalid requests never reach the
/// network. The tree only changes after the store accepted the request,
/// except for the expanded flag which is purely presentational.
pub struct LibraryManager<S> {
    store: Arc<S>,
    tree: FolderTree,
}

impl<S: LibraryStore + 'static> LibraryManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_tree(store, FolderTree::new())
    }

    pub fn with_tree(store: Arc<S>, tree: FolderTree) -> Self {
        Self { store, tree }
    }

    pub fn tree(&self) -> &FolderTree {
        &self.tree
    }

    /// Replace the local tree with the store's current state
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        let snapshot = self.store.load_library().await?;
        self.tree = FolderTree::from_snapshot(snapshot);
        info!(folders = self.tree.len(), "Library loaded");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_folder(&mut self, name: &str, parent: Option<&str>) -> Result<LibraryFolder> {
        let name = self.tree.validate_new_folder(name, parent)?;

        let mut folder = self.store.create_folder(&name, parent).await?;
        folder.parent = parent.map(str::to_string);
        folder.expanded = self.tree.default_expanded_for(parent);

        info!(folder_id = %folder.id, "Folder created");
        self.tree.insert_folder(folder.clone());
        Ok(folder)
    }

    #[instrument(skip(self))]
    pub async fn rename(&mut self, folder_id: &str, name: &str) -> Result<()> {
        let name = FolderTree::validate_name(name)?;
        if !self.tree.contains(folder_id) {
            return Err(ImportError::FolderNotFound {
                folder_id: folder_id.to_string(),
            });
        }

        self.store.rename_folder(folder_id, &name).await?;
        self.tree.rename(folder_id, &name)
    }

    #[instrument(skip(self))]
    pub async fn move_folder(&mut self, folder_id: &str, new_parent: Option<&str>) -> Result<()> {
        self.tree.validate_move(folder_id, new_parent)?;

        self.store.move_folder(folder_id, new_parent).await?;
        self.tree.set_parent(folder_id, new_parent)
    }

    /// Delete a folder with all of its descendants; returns the removed ids
    #[instrument(skip(self))]
    pub async fn delete_folder(&mut self, folder_id: &str) -> Result<Vec<String>> {
        if !self.tree.contains(folder_id) {
            return Err(ImportError::FolderNotFound {
                folder_id: folder_id.to_string(),
            });
        }

        self.store.delete_folder(folder_id).await?;
        let removed = self.tree.remove_cascade(folder_id)?;
        info!(removed = removed.len(), "Folder deleted");
        Ok(removed)
    }

    /// Flip the expanded flag locally and persist it in the background
    ///
    /// Returns the new state. A failed background update is logged and the
    /// local state kept.
    pub fn toggle_expanded(&mut self, folder_id: &str) -> Result<bool> {
        let expanded = !self
            .tree
            .get(folder_id)
            .map(|f| f.expanded)
            .ok_or_else(|| ImportError::FolderNotFound {
                folder_id: folder_id.to_string(),
            })?;
        self.tree.set_expanded(folder_id, expanded)?;

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, expanded state not persisted");
            return Ok(expanded);
        };

        let store = Arc::clone(&self.store);
        let folder_id = folder_id.to_string();
        handle.spawn(async move {
            if let Err(e) = store.set_expanded(&folder_id, expanded).await {
                warn!(folder_id = %folder_id, error = %e, "Failed to persist folder expanded state");
            }
        });

        Ok(expanded)
    }

    /// Flip the expanded flag and wait for the store to accept it
    ///
    /// For callers that exit right after the change. The tree is only
    /// updated once the store call succeeds.
    #[instrument(skip(self))]
    pub async fn toggle_expanded_persisted(&mut self, folder_id: &str) -> Result<bool> {
        let expanded = !self
            .tree
            .get(folder_id)
            .map(|f| f.expanded)
            .ok_or_else(|| ImportError::FolderNotFound {
                folder_id: folder_id.to_string(),
            })?;

        self.store.set_expanded(folder_id, expanded).await?;
        self.tree.set_expanded(folder_id, expanded)?;
        Ok(expanded)
    }

    #[instrument(skip(self))]
    pub async fn add_publication(&mut self, folder_id: &str, publication_id: &str) -> Result<()> {
        self.tree.validate_add(folder_id, publication_id)?;
        self.store.add_publication(folder_id, publication_id).await?;
        self.tree.add_publication(folder_id, publication_id)
    }

    #[instrument(skip(self))]
    pub async fn remove_publication(&mut self, folder_id: &str, publication_id: &str) -> Result<()> {
        self.tree.validate_remove(folder_id, publication_id)?;
        self.store
            .remove_publication(folder_id, publication_id)
            .await?;
        self.tree.remove_publication(folder_id, publication_id)
    }

    #[instrument(skip(self))]
    pub async fn move_publication(
        &mut self,
        publication_id: &str,
        from_folder: &str,
        to_folder: &str,
    ) -> Result<()> {
        self.tree
            .validate_move_publication(publication_id, from_folder, to_folder)?;
        self.store
            .move_publication(publication_id, from_folder, to_folder)
            .await?;
        self.tree
            .move_publication(publication_id, from_folder, to_folder)
    }

    pub fn can_move_publication(&self, publication_id: &str, from_folder: &str, to_folder: &str) -> bool {
        self.tree
            .can_move_publication(publication_id, from_folder, to_folder)
    }
}
