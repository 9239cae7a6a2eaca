//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use linkkeep_core::Link;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single link with all details
    pub fn print_link(&self, index: usize, link: &Link) {
        match self.format {
            OutputFormat::Human => print_link_details(index, link),
            OutputFormat::Json => print_json(&indexed(index, link)),
            OutputFormat::Quiet => println!("{}", link.url()),
        }
    }

    /// Print links with all details, each with its store index
    pub fn print_links(&self, links: &[(usize, &Link)]) {
        match self.format {
            OutputFormat::Human => {
                if links.is_empty() {
                    println!("No links found.");
                    return;
                }
                for (index, link) in links {
                    print_link_details(*index, link);
                    println!();
                }
                println!("{} link(s)", links.len());
            }
            OutputFormat::Json => {
                let entries: Vec<_> = links
                    .iter()
                    .map(|(index, link)| indexed(*index, link))
                    .collect();
                print_json(&entries);
            }
            OutputFormat::Quiet => {
                for (_, link) in links {
                    println!("{}", link.url());
                }
            }
        }
    }

    /// Print the URL of every link with its index
    pub fn print_urls(&self, links: &[Link]) {
        match self.format {
            OutputFormat::Human => {
                if links.is_empty() {
                    println!("No links found.");
                    return;
                }
                println!("Existing links:");
                for (index, link) in links.iter().enumerate() {
                    println!("[{}] {}", index, truncate(link.url(), 100));
                }
            }
            OutputFormat::Json => {
                let urls: Vec<_> = links
                    .iter()
                    .enumerate()
                    .map(|(index, link)| serde_json::json!({"index": index, "url": link.url()}))
                    .collect();
                print_json(&urls);
            }
            OutputFormat::Quiet => {
                for link in links {
                    println!("{}", link.url());
                }
            }
        }
    }

    /// Print categories or tags with usage counts
    pub fn print_labels(&self, kind: &str, labels: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if labels.is_empty() {
                    println!("No {} found.", kind);
                    return;
                }
                for (name, count) in labels {
                    println!(
                        "{} (used in {} link{})",
                        name,
                        count,
                        if *count == 1 { "" } else { "s" }
                    );
                }
                println!("\n{} {}", labels.len(), kind);
            }
            OutputFormat::Json => {
                let json_labels: Vec<_> = labels
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_labels);
            }
            OutputFormat::Quiet => {
                for (name, _) in labels {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print backup names, most recent first
    pub fn print_backups(&self, names: &[String]) {
        match self.format {
            OutputFormat::Human => {
                if names.is_empty() {
                    println!("No backups available.");
                    return;
                }
                println!("Available backups:");
                for (index, name) in names.iter().enumerate() {
                    println!("[{}] {}", index, name);
                }
            }
            OutputFormat::Json => print_json(&names),
            OutputFormat::Quiet => {
                for name in names {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (shown in every format)
    pub fn warning(&self, msg: &str) {
        eprintln!("Warning: {}", msg);
    }

    /// Print an error to stderr (shown in every format)
    pub fn error(&self, msg: &str) {
        eprintln!("Error: {}", msg);
    }
}

fn print_link_details(index: usize, link: &Link) {
    println!("[{}] URL: {}", index, link.url());
    if !link.description().is_empty() {
        println!("    Description: {}", link.description());
    }
    println!("    Categories:  {}", join_or_none(link.categories()));
    println!("    Tags:        {}", join_or_none(link.tags()));
    println!(
        "    Created: {} | Last updated: {}",
        link.created_at().format("%Y-%m-%d"),
        link.last_updated().format("%Y-%m-%d")
    );
}

/// A link as JSON with its index alongside
fn indexed(index: usize, link: &Link) -> serde_json::Value {
    let mut value = serde_json::to_value(link).unwrap_or_default();
    if let Some(object) = value.as_object_mut() {
        object.insert("index".to_string(), index.into());
    }
    value
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode JSON: {}", e),
    }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
