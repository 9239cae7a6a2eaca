//! Link command handlers

use anyhow::Result;

use linkkeep_core::{LinkPatch, Store};

use crate::output::Output;

/// Add a link and show it
pub fn add(
    store: &mut Store,
    url: &str,
    description: &str,
    categories: &[String],
    tags: &[String],
    output: &Output,
) -> Result<()> {
    let link = store.add_link(url, description, categories, tags)?;
    let url = link.url().to_string();
    let index = store.len() - 1;

    output.success(&format!("Added link: {}", url));
    if let Some(link) = store.get(index) {
        output.print_link(index, link);
    }
    Ok(())
}

/// List every link's URL with its index
pub fn list(store: &Store, output: &Output) -> Result<()> {
    output.print_urls(store.links());
    Ok(())
}

/// List every link with all details
pub fn list_all(store: &Store, output: &Output) -> Result<()> {
    let entries: Vec<_> = store.links().iter().enumerate().collect();
    output.print_links(&entries);
    Ok(())
}

/// Apply an edit to the link at `index`
pub fn edit(store: &mut Store, index: usize, patch: &LinkPatch, output: &Output) -> Result<()> {
    if patch.is_empty() {
        output.message("No changes.");
        return Ok(());
    }

    store.edit_link(index, patch)?;
    output.success("Link updated");
    if let Some(link) = store.get(index) {
        output.print_link(index, link);
    }
    Ok(())
}

/// Remove the link at `index`
///
/// Later links move down one index.
pub fn remove(store: &mut Store, index: usize, output: &Output) -> Result<()> {
    let removed = store.remove_link(index)?;
    output.success(&format!("Removed link: {}", removed.url()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use linkkeep_core::{ListEdit, StoreError};

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_add_normalizes_and_indexes() {
        let mut store = Store::new();
        add(
            &mut store,
            "example.com",
            "Example",
            &["dev".to_string()],
            &[],
            &quiet(),
        )
        .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().url(), "https://example.com");
        assert!(store.categories().contains("dev"));
    }

    #[test]
    fn test_add_rejects_empty_url() {
        let mut store = Store::new();
        let err = add(&mut store, "  ", "", &[], &[], &quiet()).unwrap_err();

        assert!(err.downcast_ref::<StoreError>().is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_edit_and_remove() {
        let mut store = Store::new();
        add(&mut store, "a.com", "", &[], &["old".to_string()], &quiet()).unwrap();

        let patch = LinkPatch {
            description: Some("Alpha".to_string()),
            tags: ListEdit::Replace(vec!["new".to_string()]),
            ..LinkPatch::default()
        };
        edit(&mut store, 0, &patch, &quiet()).unwrap();
        assert_eq!(store.get(0).unwrap().description(), "Alpha");
        assert!(!store.tags().contains("old"));

        assert!(remove(&mut store, 3, &quiet()).is_err());
        remove(&mut store, 0, &quiet()).unwrap();
        assert!(store.is_empty());
        assert!(store.tags().is_empty());
    }
}
