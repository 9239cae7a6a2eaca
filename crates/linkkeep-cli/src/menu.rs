//! Interactive command menu
//!
//! A read-eval loop over numbered commands (with word aliases). Each
//! command gathers its arguments through prompts and hands them to the
//! same handlers the command-line flags use. The session ends on `exit`,
//! end of input or Ctrl-C, and always finishes with one save attempt.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info};

use linkkeep_core::{
    AdvancedQuery, Config, JsonPersistence, LinkPatch, ListEdit, SearchField, SearchMode,
    SearchQuery, Store,
};

use crate::commands::label::LabelKind;
use crate::commands::{backup, label, link, search, transfer};
use crate::output::Output;
use crate::prompt::{parse_indices, InputClosed, Prompter};

const BASE_HELP: &str = "\
 0. Print this message
 1. Print extensive help message
 2. Add a link
 3. List existing links
 4. List existing categories
 5. List existing tags
 6. List all link details
 7. Query links
 8. Advanced search
 9. Edit a link
10. Remove a link
11. Bulk operations
12. Import/Export
13. Backup/Restore
20. Exit";

const EXTENDED_HELP: &str = "\
[0, h, help]             Print the help message
[1, exh, exhelp]         Print this extensive help message
[2, add]                 Add a link with URL, description, categories and tags
[3, ll]                  List existing links (URLs only)
[4, lc]                  List existing categories with usage counts
[5, lt]                  List existing tags with usage counts
[6, db, all]             List every link with all details
[7, query, q, ?, find]   Search by URL, description, categories and/or tags (AND/OR)
[8, adv, advanced]       Search with several comma-separated terms per field
[9, edit]                Edit a link's properties ('!' clears a list)
[10, rm, remove]         Remove a link
[11, bulk]               Add or remove tags and categories on many links
[12, import, export]     Import/export CSV, import browser bookmarks
[13, backup, restore]    Create, list or restore backups
[20, exit, close, quit]  Save and exit

Indices shift down after a link is removed; list links again before using them.";

/// A top-level menu command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Help,
    ExtendedHelp,
    Add,
    ListLinks,
    ListCategories,
    ListTags,
    ListAll,
    Query,
    AdvancedSearch,
    Edit,
    Remove,
    Bulk,
    ImportExport,
    BackupRestore,
    Exit,
}

impl MenuCommand {
    /// Parse a command number or alias (case-insensitive)
    pub fn parse(input: &str) -> Option<Self> {
        let command = match input.trim().to_lowercase().as_str() {
            "0" | "h" | "help" => MenuCommand::Help,
            "1" | "exh" | "exhelp" => MenuCommand::ExtendedHelp,
            "2" | "add" => MenuCommand::Add,
            "3" | "ll" => MenuCommand::ListLinks,
            "4" | "lc" => MenuCommand::ListCategories,
            "5" | "lt" => MenuCommand::ListTags,
            "6" | "db" | "all" => MenuCommand::ListAll,
            "7" | "query" | "q" | "?" | "find" => MenuCommand::Query,
            "8" | "adv" | "advanced" => MenuCommand::AdvancedSearch,
            "9" | "edit" => MenuCommand::Edit,
            "10" | "rm" | "remove" => MenuCommand::Remove,
            "11" | "bulk" => MenuCommand::Bulk,
            "12" | "import" | "export" => MenuCommand::ImportExport,
            "13" | "backup" | "restore" => MenuCommand::BackupRestore,
            "20" | "exit" | "close" | "quit" => MenuCommand::Exit,
            _ => return None,
        };
        Some(command)
    }
}

/// Interactive session state
pub struct Session {
    store: Store,
    persistence: JsonPersistence,
    config: Config,
    output: Output,
    input: Prompter,
}

impl Session {
    pub fn new(
        store: Store,
        persistence: JsonPersistence,
        config: Config,
        output: Output,
        input: Prompter,
    ) -> Self {
        Self {
            store,
            persistence,
            config,
            output,
            input,
        }
    }

    /// Run the menu until exit, then save
    ///
    /// Returns the final store. Save failures are reported, never returned.
    pub async fn run(mut self) -> Store {
        self.output.message("Welcome to linkkeep!");
        self.output.message(BASE_HELP);

        loop {
            let choice = match self.input.ask("\nEnter command [>>]: ").await {
                Ok(choice) => choice,
                Err(e) => {
                    self.note_end_of_input(&e);
                    break;
                }
            };

            let Some(command) = MenuCommand::parse(&choice) else {
                if !choice.is_empty() {
                    self.output.message("Invalid choice. Please try again.");
                }
                continue;
            };

            if command == MenuCommand::Exit {
                self.output.message("Saving links and exiting...");
                break;
            }

            if let Err(e) = self.dispatch(command).await {
                if e.is::<InputClosed>() {
                    self.note_end_of_input(&e);
                    break;
                }
                self.output.error(&format!("{:#}", e));
            }
        }

        self.final_save();
        self.store
    }

    async fn dispatch(&mut self, command: MenuCommand) -> Result<()> {
        match command {
            MenuCommand::Help => {
                self.output.message(BASE_HELP);
                Ok(())
            }
            MenuCommand::ExtendedHelp => {
                self.output.message(EXTENDED_HELP);
                Ok(())
            }
            MenuCommand::Add => self.add().await,
            MenuCommand::ListLinks => link::list(&self.store, &self.output),
            MenuCommand::ListCategories => label::list(&self.store, LabelKind::Category, &self.output),
            MenuCommand::ListTags => label::list(&self.store, LabelKind::Tag, &self.output),
            MenuCommand::ListAll => link::list_all(&self.store, &self.output),
            MenuCommand::Query => self.query().await,
            MenuCommand::AdvancedSearch => self.advanced_search().await,
            MenuCommand::Edit => self.edit().await,
            MenuCommand::Remove => self.remove().await,
            MenuCommand::Bulk => self.bulk_menu().await,
            MenuCommand::ImportExport => self.import_export_menu().await,
            MenuCommand::BackupRestore => self.backup_menu().await,
            MenuCommand::Exit => Ok(()),
        }
    }

    async fn add(&mut self) -> Result<()> {
        let url = self.input.ask("URL: ").await?;
        let description = self.input.ask("Description: ").await?;
        let categories = self.ask_labels(LabelKind::Category).await?;
        let tags = self.ask_labels(LabelKind::Tag).await?;

        link::add(
            &mut self.store,
            &url,
            &description,
            &categories,
            &tags,
            &self.output,
        )
    }

    /// Ask for a comma-separated label list; `#` shows the existing labels first
    async fn ask_labels(&mut self, kind: LabelKind) -> Result<Vec<String>> {
        let prompt = format!(
            "{} (comma-separated, '#' lists existing): ",
            capitalize(kind.plural())
        );
        let mut answer = self.input.ask(&prompt).await?;
        if answer == "#" {
            label::list(&self.store, kind, &self.output)?;
            answer = self
                .input
                .ask(&format!("{} (comma-separated): ", capitalize(kind.plural())))
                .await?;
        }
        Ok(linkkeep_core::models::split_list(&answer))
    }

    async fn query(&mut self) -> Result<()> {
        let mode = self
            .input
            .ask("Search mode - AND (all terms match) or OR (any term matches) [AND/OR]: ")
            .await?;
        // Anything but OR searches with AND
        let mode = mode.parse::<SearchMode>().unwrap_or_default();

        let mut query = SearchQuery::new();
        for field in SearchField::ALL {
            let term = self.input.ask(&format!("Search in {}: ", field)).await?;
            query.set(field, &term);
        }

        search::query(&self.store, &query, mode, &self.output)
    }

    async fn advanced_search(&mut self) -> Result<()> {
        self.output
            .message("Advanced search: comma-separated terms within a field match any of them.");
        self.output.message("Leave a field blank to skip it.\n");

        let mut query = AdvancedQuery::new();
        for field in SearchField::ALL {
            let input = self.input.ask(&format!("{} contains: ", capitalize(field.as_str()))).await?;
            query = query.with_input(field, &input);
        }

        search::advanced(&self.store, &query, &self.output)
    }

    async fn edit(&mut self) -> Result<()> {
        link::list(&self.store, &self.output)?;
        let Some(index) = self.input.ask_index("Enter link index to edit: ").await? else {
            self.output.message("Invalid input. Please enter a number.");
            return Ok(());
        };
        let Some(current) = self.store.get(index).cloned() else {
            self.output
                .error(&format!("Index {} is out of range.", index));
            return Ok(());
        };

        self.output
            .message("Press Enter to keep a value; '!' clears a list.");
        let url = self.input.ask(&format!("URL [{}]: ", current.url())).await?;
        let description = self
            .input
            .ask(&format!("Description [{}]: ", current.description()))
            .await?;
        let categories = self
            .input
            .ask(&format!("Categories [{}]: ", current.categories().join(", ")))
            .await?;
        let tags = self
            .input
            .ask(&format!("Tags [{}]: ", current.tags().join(", ")))
            .await?;

        let patch = LinkPatch {
            url: non_empty(url),
            description: non_empty(description),
            categories: ListEdit::from_input(&categories),
            tags: ListEdit::from_input(&tags),
        };
        link::edit(&mut self.store, index, &patch, &self.output)
    }

    async fn remove(&mut self) -> Result<()> {
        link::list(&self.store, &self.output)?;
        let Some(index) = self.input.ask_index("Enter link index to remove: ").await? else {
            self.output.message("Invalid input. Please enter a number.");
            return Ok(());
        };
        if self.input.confirm("Are you sure?").await? {
            link::remove(&mut self.store, index, &self.output)?;
        } else {
            self.output.message("Cancelled.");
        }
        Ok(())
    }

    async fn bulk_menu(&mut self) -> Result<()> {
        self.output.message(
            "\nBulk operations:\n\
             1. Add tag to multiple links\n\
             2. Add category to multiple links\n\
             3. Remove tag from all links\n\
             4. Remove category from all links\n\
             0. Return to main menu",
        );

        match self.input.ask("[BULK]> ").await?.as_str() {
            "1" => self.bulk_add(LabelKind::Tag).await,
            "2" => self.bulk_add(LabelKind::Category).await,
            "3" => self.bulk_remove(LabelKind::Tag).await,
            "4" => self.bulk_remove(LabelKind::Category).await,
            "0" | "" => Ok(()),
            _ => {
                self.output.message("Invalid choice.");
                Ok(())
            }
        }
    }

    async fn bulk_add(&mut self, kind: LabelKind) -> Result<()> {
        link::list(&self.store, &self.output)?;
        let input = self
            .input
            .ask("Enter link indices (comma-separated, or 'all' for all links): ")
            .await?;
        let indices = match parse_indices(&input) {
            Ok(indices) => indices,
            Err(e) => {
                self.output.error(&e);
                return Ok(());
            }
        };

        let value = self
            .input
            .ask(&format!("{} to add: ", capitalize(kind.singular())))
            .await?;
        if value.is_empty() {
            return Ok(());
        }
        label::bulk_add(
            &mut self.store,
            kind,
            &value,
            indices.as_deref(),
            &self.output,
        )?;
        Ok(())
    }

    async fn bulk_remove(&mut self, kind: LabelKind) -> Result<()> {
        label::list(&self.store, kind, &self.output)?;
        let value = self
            .input
            .ask(&format!(
                "{} to remove from all links: ",
                capitalize(kind.singular())
            ))
            .await?;
        if value.is_empty() {
            return Ok(());
        }
        label::bulk_remove(&mut self.store, kind, &value, &self.output)?;
        Ok(())
    }

    async fn import_export_menu(&mut self) -> Result<()> {
        self.output.message(
            "\nImport/Export:\n\
             1. Import links from CSV\n\
             2. Export links to CSV\n\
             3. Import browser bookmarks (HTML)\n\
             0. Return to main menu",
        );

        match self.input.ask("[IMPORT/EXPORT]> ").await?.as_str() {
            "1" => {
                let path = self.input.ask("Enter CSV file path: ").await?;
                if !path.is_empty() {
                    transfer::import_csv(&mut self.store, &PathBuf::from(path), &self.output)?;
                }
                Ok(())
            }
            "2" => {
                let default_path = self.config.default_export_path();
                let path = self
                    .input
                    .ask(&format!("Enter CSV file path [{}]: ", default_path.display()))
                    .await?;
                let path = if path.is_empty() {
                    default_path
                } else {
                    PathBuf::from(path)
                };
                transfer::export_csv(&self.store, &path, &self.output)?;
                Ok(())
            }
            "3" => {
                let path = self.input.ask("Enter bookmark HTML file path: ").await?;
                if !path.is_empty() {
                    transfer::import_html(&mut self.store, &PathBuf::from(path), &self.output)?;
                }
                Ok(())
            }
            "0" | "" => Ok(()),
            _ => {
                self.output.message("Invalid choice.");
                Ok(())
            }
        }
    }

    async fn backup_menu(&mut self) -> Result<()> {
        self.output.message(
            "\nBackup/Restore:\n\
             1. Create backup\n\
             2. List available backups\n\
             3. Restore from backup\n\
             0. Return to main menu",
        );

        match self.input.ask("[BACKUP/RESTORE]> ").await?.as_str() {
            "1" => backup::create(&self.persistence, &self.output),
            "2" => backup::list(&self.persistence, &self.output).map(|_| ()),
            "3" => self.restore().await,
            "0" | "" => Ok(()),
            _ => {
                self.output.message("Invalid choice.");
                Ok(())
            }
        }
    }

    async fn restore(&mut self) -> Result<()> {
        let names = backup::list(&self.persistence, &self.output)?;
        if names.is_empty() {
            return Ok(());
        }

        let answer = self
            .input
            .ask("Enter backup index to restore, or press Enter for most recent: ")
            .await?;
        let name = if answer.is_empty() {
            None
        } else {
            match answer.parse::<usize>().ok().and_then(|i| names.get(i)) {
                Some(name) => Some(name.clone()),
                None => {
                    self.output.message("Invalid backup index.");
                    return Ok(());
                }
            }
        };

        if !self.input.confirm("Replace the current links with this backup?").await? {
            self.output.message("Cancelled.");
            return Ok(());
        }

        self.store = backup::restore(&self.persistence, name.as_deref(), &self.output)?;
        Ok(())
    }

    fn note_end_of_input(&self, e: &anyhow::Error) {
        match e.downcast_ref::<InputClosed>() {
            Some(InputClosed { interrupted: true }) => {
                info!("Session interrupted");
                self.output.message("Interrupted.");
            }
            Some(_) => info!("Input closed"),
            None => {
                error!("Failed to read input: {:#}", e);
                self.output.error(&format!("Failed to read input: {:#}", e));
            }
        }
    }

    fn final_save(&self) {
        match self.persistence.save(&self.store) {
            Ok(_) => self.output.success(&format!(
                "Saved {} links to {}",
                self.store.len(),
                self.persistence.path().display()
            )),
            Err(e) => {
                error!("Final save failed: {}", e);
                self.output.error(&format!("Could not save links: {}", e));
                if let Some(suggestion) = e.recovery_suggestion() {
                    self.output.message(suggestion);
                }
            }
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_parse_numbers_and_aliases() {
        assert_eq!(MenuCommand::parse("0"), Some(MenuCommand::Help));
        assert_eq!(MenuCommand::parse(" HELP "), Some(MenuCommand::Help));
        assert_eq!(MenuCommand::parse("?"), Some(MenuCommand::Query));
        assert_eq!(MenuCommand::parse("rm"), Some(MenuCommand::Remove));
        assert_eq!(MenuCommand::parse("export"), Some(MenuCommand::ImportExport));
        assert_eq!(MenuCommand::parse("quit"), Some(MenuCommand::Exit));
        assert_eq!(MenuCommand::parse("20"), Some(MenuCommand::Exit));
        assert_eq!(MenuCommand::parse("14"), None);
        assert_eq!(MenuCommand::parse(""), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("tags"), "Tags");
        assert_eq!(capitalize(""), "");
    }

    fn session(temp_dir: &TempDir, script: &'static [u8]) -> Session {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        Session::new(
            Store::new(),
            JsonPersistence::from_config(&config),
            config,
            Output::new(OutputFormat::Quiet),
            Prompter::new(script),
        )
    }

    #[tokio::test]
    async fn test_session_adds_and_saves_on_exit() {
        let temp_dir = TempDir::new().unwrap();
        let script = b"2\nexample.com\nExample\ndev\nrust, cli\nexit\n";

        let store = session(&temp_dir, script).run().await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().tags(), ["rust", "cli"]);
        let saved = JsonPersistence::new(temp_dir.path().join("links.json"))
            .load()
            .unwrap();
        assert_eq!(saved.store, store);
    }

    #[tokio::test]
    async fn test_session_saves_on_end_of_input() {
        let temp_dir = TempDir::new().unwrap();
        let script = b"add\na.com\n\n\n\nadd\nb.com\n";

        let store = session(&temp_dir, script).run().await;

        // The second add never completed
        assert_eq!(store.len(), 1);
        assert!(temp_dir.path().join("links.json").exists());
    }

    #[tokio::test]
    async fn test_session_keeps_going_after_errors() {
        let temp_dir = TempDir::new().unwrap();
        let script = b"add\n\n\n\n\nbogus\n10\n7\ny\nadd\nz.com\n\n\n\n";

        let store = session(&temp_dir, script).run().await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().url(), "https://z.com");
    }

    #[tokio::test]
    async fn test_session_edit_and_bulk() {
        let temp_dir = TempDir::new().unwrap();
        let script = b"add\na.com\n\nold\nx\n\
                       edit\n0\n\nAlpha\n!\ny\n\
                       bulk\n1\nall\nurgent\n\
                       exit\n";

        let store = session(&temp_dir, script).run().await;

        let link = store.get(0).unwrap();
        assert_eq!(link.description(), "Alpha");
        assert!(link.categories().is_empty());
        assert_eq!(link.tags(), ["y", "urgent"]);
        assert!(store.categories().is_empty());
    }
}
