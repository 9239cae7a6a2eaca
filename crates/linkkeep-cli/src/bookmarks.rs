//! Browser bookmark import
//!
//! Parses Netscape bookmark files (the HTML export of most browsers). Each
//! `<h3>` folder heading names the category of the `<a>` links after it;
//! the anchor text becomes the description.

use std::path::Path;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};

use linkkeep_core::LinkRecord;

/// One bookmark folder with its links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkFolder {
    pub name: String,
    pub links: Vec<Bookmark>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub url: String,
    pub title: String,
}

/// Read a bookmark file into import records
pub fn read_bookmarks(path: &Path) -> Result<Vec<LinkRecord>> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bookmark file: {}", path.display()))?;
    Ok(to_records(parse_bookmarks(&html)))
}

/// Group anchors under the nearest preceding folder heading
///
/// Anchors before the first heading, and headings without anchors, are
/// dropped.
pub fn parse_bookmarks(html: &str) -> Vec<BookmarkFolder> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("h3, a") else {
        return Vec::new();
    };

    let mut folders = Vec::new();
    let mut current: Option<BookmarkFolder> = None;

    for element in document.select(&selector) {
        match element.value().name() {
            "h3" => {
                if let Some(folder) = current.take().filter(|f| !f.links.is_empty()) {
                    folders.push(folder);
                }
                current = Some(BookmarkFolder {
                    name: text_of(&element),
                    links: Vec::new(),
                });
            }
            "a" => {
                let (Some(folder), Some(href)) = (current.as_mut(), element.value().attr("href"))
                else {
                    continue;
                };
                folder.links.push(Bookmark {
                    url: href.trim().to_string(),
                    title: text_of(&element),
                });
            }
            _ => {}
        }
    }

    if let Some(folder) = current.filter(|f| !f.links.is_empty()) {
        folders.push(folder);
    }

    folders.retain(|f| !f.name.is_empty());
    folders
}

/// Flatten folders into import records
pub fn to_records(folders: Vec<BookmarkFolder>) -> Vec<LinkRecord> {
    folders
        .into_iter()
        .flat_map(|folder| {
            let category = folder.name;
            folder.links.into_iter().map(move |bookmark| {
                LinkRecord::new(bookmark.url)
                    .with_description(bookmark.title)
                    .with_categories(vec![category.clone()])
            })
        })
        .collect()
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
