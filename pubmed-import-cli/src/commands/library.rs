use anyhow::Result;
use clap::{Args, Subcommand};
use pubmed_import_rs::{FolderTree, LibraryManager, RestBackend};
use tracing::info;

use super::{GlobalConfig, create_import_client};

#[derive(Args, Debug)]
pub struct Library {
    #[command(subcommand)]
    command: LibraryCommand,
}

#[derive(Subcommand, Debug)]
enum LibraryCommand {
    /// Print the folder tree
    Tree {
        /// Show collapsed branches too
        #[arg(long)]
        all: bool,

        /// Print the tree as JSON rows
        #[arg(long)]
        json: bool,
    },
    /// Create a folder
    Create {
        name: String,

        /// Parent folder id; omit for a root folder
        #[arg(long)]
        parent: Option<String>,
    },
    /// Rename a folder
    Rename { folder_id: String, name: String },
    /// Move a folder under another parent
    Move {
        folder_id: String,

        /// New parent id; omit to move to the root
        #[arg(long)]
        parent: Option<String>,
    },
    /// Delete a folder and its subfolders
    Delete { folder_id: String },
    /// Toggle whether a folder is expanded
    Toggle { folder_id: String },
    /// File a publication into a folder
    File {
        folder_id: String,
        publication_id: String,
    },
    /// Remove a publication from a folder
    Unfile {
        folder_id: String,
        publication_id: String,
    },
    /// Move a publication between folders
    MovePub {
        publication_id: String,
        from: String,
        to: String,
    },
}

impl Library {
    pub async fn execute(&self, config: &GlobalConfig) -> Result<()> {
        let client = create_import_client(config)?;
        let mut library = client.library();
        library.load().await?;

        match &self.command {
            LibraryCommand::Tree { all, json } => {
                if *json {
                    let rows = library.tree().visible_rows();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                } else {
                    print_tree(library.tree(), *all);
                }
            }
            LibraryCommand::Create { name, parent } => {
                let folder = library.create_folder(name, parent.as_deref()).await?;
                info!(id = %folder.id, "Created folder {}", folder.name);
                println!("{}", folder.id);
            }
            LibraryCommand::Rename { folder_id, name } => {
                library.rename(folder_id, name).await?;
                info!("Renamed {}", path_of(&library, folder_id));
            }
            LibraryCommand::Move { folder_id, parent } => {
                library.move_folder(folder_id, parent.as_deref()).await?;
                info!("Moved to {}", path_of(&library, folder_id));
            }
            LibraryCommand::Delete { folder_id } => {
                let removed = library.delete_folder(folder_id).await?;
                info!(count = removed.len(), "Deleted folders");
            }
            LibraryCommand::Toggle { folder_id } => {
                let expanded = library.toggle_expanded_persisted(folder_id).await?;
                info!(expanded, "Toggled {}", path_of(&library, folder_id));
            }
            LibraryCommand::File {
                folder_id,
                publication_id,
            } => {
                library.add_publication(folder_id, publication_id).await?;
                info!("Filed {} into {}", publication_id, path_of(&library, folder_id));
            }
            LibraryCommand::Unfile {
                folder_id,
                publication_id,
            } => {
                library.remove_publication(folder_id, publication_id).await?;
                info!("Removed {} from {}", publication_id, path_of(&library, folder_id));
            }
            LibraryCommand::MovePub {
                publication_id,
                from,
                to,
            } => {
                library.move_publication(publication_id, from, to).await?;
                info!("Moved {} to {}", publication_id, path_of(&library, to));
            }
        }

        Ok(())
    }
}

fn path_of(library: &LibraryManager<RestBackend>, folder_id: &str) -> String {
    library.tree().path(folder_id).join(" / ")
}

fn print_tree(tree: &FolderTree, all: bool) {
    if !all {
        for row in tree.visible_rows() {
            let marker = match (row.has_children, row.expanded) {
                (false, _) => ' ',
                (true, true) => '-',
                (true, false) => '+',
            };
            println!(
                "{}{} {} ({}) [{}]",
                "  ".repeat(row.depth),
                marker,
                row.name,
                row.publication_count,
                row.id
            );
        }
        return;
    }

    let mut stack: Vec<(usize, &str)> = tree
        .roots()
        .into_iter()
        .rev()
        .map(|f| (0, f.id.as_str()))
        .collect();
    while let Some((depth, id)) = stack.pop() {
        let Some(folder) = tree.get(id) else { continue };
        println!(
            "{}{} ({}) [{}]",
            "  ".repeat(depth),
            folder.name,
            tree.publications_in(id).len(),
            folder.id
        );
        stack.extend(
            tree.children(id)
                .into_iter()
                .rev()
                .map(|f| (depth + 1, f.id.as_str())),
        );
    }
}
