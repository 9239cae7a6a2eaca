//! Search command handlers

use anyhow::Result;

use linkkeep_core::{AdvancedQuery, Link, SearchMode, SearchQuery, Store};

use crate::output::Output;

/// Run a combined AND/OR search and print the hits
pub fn query(store: &Store, query: &SearchQuery, mode: SearchMode, output: &Output) -> Result<()> {
    if query.is_empty() {
        output.message("No search criteria provided.");
        return Ok(());
    }

    let hits = store.search(query, mode);
    print_hits(store, &hits, output);
    Ok(())
}

/// Run a multi-term search and print the hits
pub fn advanced(store: &Store, query: &AdvancedQuery, output: &Output) -> Result<()> {
    let hits = store.advanced_search(query);
    print_hits(store, &hits, output);
    Ok(())
}

fn print_hits(store: &Store, hits: &[&Link], output: &Output) {
    let entries: Vec<(usize, &Link)> = hits
        .iter()
        .filter_map(|link| store.position(link.id()).map(|index| (index, *link)))
        .collect();

    if output.is_json() {
        output.print_links(&entries);
        return;
    }
    if entries.is_empty() {
        output.message("No matching links found.");
        return;
    }
    output.message(&format!("Search results ({} links found):", entries.len()));
    output.print_links(&entries);
}
