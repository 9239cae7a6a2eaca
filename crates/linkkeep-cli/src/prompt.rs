//! Interactive input
//!
//! Prompt answers arrive line by line over a channel. In the binary a
//! dedicated thread feeds it from stdin, so a pending read never keeps the
//! runtime alive after the session ends. End of input and Ctrl-C both
//! surface as [`InputClosed`], which ends the interactive session.

use std::io::{self, BufRead, Write};
use std::thread;

use anyhow::Result;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

/// Lines buffered between the reader and the session
const LINE_BUFFER: usize = 16;

/// Input ended (EOF or Ctrl-C) while waiting for an answer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("input closed")]
pub struct InputClosed {
    /// Whether Ctrl-C caused it
    pub interrupted: bool,
}

/// Line-oriented prompt reader
pub struct Prompter {
    lines: mpsc::Receiver<io::Result<String>>,
}

impl Prompter {
    /// Prompt on stdout, read answers from stdin
    ///
    /// Stdin is read on a detached thread; the process can exit while that
    /// thread is still blocked in a read.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            debug!("stdin reader finished");
        });
        Self { lines: rx }
    }

    /// Read answers from an async reader
    ///
    /// Must be called inside a tokio runtime.
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => Ok(line),
                    Ok(None) => break,
                    Err(e) => Err(e),
                };
                let failed = line.is_err();
                if tx.send(line).await.is_err() || failed {
                    break;
                }
            }
        });
        Self { lines: rx }
    }

    /// Show `prompt` and read one trimmed line
    pub async fn ask(&mut self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        tokio::select! {
            line = self.lines.recv() => match line {
                Some(line) => Ok(line?.trim().to_string()),
                None => {
                    println!();
                    Err(InputClosed { interrupted: false }.into())
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                Err(InputClosed { interrupted: true }.into())
            }
        }
    }

    /// Ask a yes/no question; only `y`/`yes` confirm
    pub async fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N] ", prompt)).await?;
        Ok(is_yes(&answer))
    }

    /// Ask for an index; `None` if the answer is not a number
    pub async fn ask_index(&mut self, prompt: &str) -> Result<Option<usize>> {
        let answer = self.ask(prompt).await?;
        Ok(answer.parse().ok())
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Parse comma-separated indices, or `all` for every link
///
/// Returns `Ok(None)` for `all`; any entry that is not a number is an error.
pub fn parse_indices(input: &str) -> Result<Option<Vec<usize>>, String> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Ok(None);
    }

    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| format!("'{}' is not a valid index", part))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ask_trims_lines() {
        let mut prompter = Prompter::new(&b"  hello  \nworld\n"[..]);

        assert_eq!(prompter.ask("> ").await.unwrap(), "hello");
        assert_eq!(prompter.ask("> ").await.unwrap(), "world");
    }

    #[tokio::test]
    async fn test_ask_reports_end_of_input() {
        let mut prompter = Prompter::new(&b"only\n"[..]);
        prompter.ask("> ").await.unwrap();

        let err = prompter.ask("> ").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<InputClosed>(),
            Some(&InputClosed { interrupted: false })
        );
    }

    #[tokio::test]
    async fn test_confirm_and_index() {
        let mut prompter = Prompter::new(&b"Y\nno\n4\nfour\n"[..]);

        assert!(prompter.confirm("Sure?").await.unwrap());
        assert!(!prompter.confirm("Sure?").await.unwrap());
        assert_eq!(prompter.ask_index("Index: ").await.unwrap(), Some(4));
        assert_eq!(prompter.ask_index("Index: ").await.unwrap(), None);
    }

    #[test]
    fn test_parse_indices() {
        assert_eq!(parse_indices("all"), Ok(None));
        assert_eq!(parse_indices(" ALL "), Ok(None));
        assert_eq!(parse_indices("0, 2,5"), Ok(Some(vec![0, 2, 5])));
        assert_eq!(parse_indices(""), Ok(Some(vec![])));
        assert!(parse_indices("1,x").is_err());
    }
}
