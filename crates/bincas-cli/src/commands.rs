//! Subcommands, one per store operation.

use std::path::PathBuf;

use anyhow::Context;
use bincas_store::{BinaryStore, ContentKey, ObjectReader};
use clap::Subcommand;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::TRACING_TARGET_COMMAND;

/// Operations exposed on the command line.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Store a file (or `-` for stdin) and print its key
    Put {
        /// File to store, `-` reads stdin
        input: PathBuf,
    },
    /// Write stored content to a file or stdout
    Get {
        /// Content key
        key: ContentKey,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List every stored key
    List,
    /// Permanently delete stored content
    Delete {
        /// Content keys to delete
        #[arg(required = true)]
        keys: Vec<ContentKey>,
    },
    /// Print the stored media type
    Mime {
        /// Content key
        key: ContentKey,
    },
    /// Read or write extracted text
    #[command(subcommand)]
    Text(TextCommand),
    /// Print what the backend supports beyond plain storage
    Capabilities,
}

/// Extracted-text operations.
#[derive(Debug, Clone, Subcommand)]
pub enum TextCommand {
    /// Print the extracted text (empty when none is stored)
    Get {
        /// Content key
        key: ContentKey,
    },
    /// Store extracted text, replacing any previous value
    Set {
        /// Content key
        key: ContentKey,
        /// Text to store, `-` reads stdin
        text: String,
    },
}

#[derive(Serialize)]
struct PutReport<'a> {
    key: &'a ContentKey,
    size: u64,
}

impl Command {
    /// Runs the command against `store`, writing results to stdout.
    pub async fn execute(self, store: &BinaryStore) -> anyhow::Result<()> {
        let mut stdout = tokio::io::stdout();

        match self {
            Self::Put { input } => {
                let handle = if is_stdin(&input) {
                    store.store(tokio::io::stdin()).await?
                } else {
                    let file = tokio::fs::File::open(&input)
                        .await
                        .with_context(|| format!("failed to open {}", input.display()))?;
                    store.store(file).await?
                };
                let report = PutReport {
                    key: handle.key(),
                    size: handle.size(),
                };
                write_line(&mut stdout, &serde_json::to_string(&report)?).await?;
            }
            Self::Get { key, output } => {
                let reader = store.get_input_stream(&key).await?;
                let written = match output {
                    Some(path) => {
                        let mut file = tokio::fs::File::create(&path)
                            .await
                            .with_context(|| format!("failed to create {}", path.display()))?;
                        copy(reader, &mut file).await?
                    }
                    None => copy(reader, &mut stdout).await?,
                };
                tracing::debug!(target: TRACING_TARGET_COMMAND, key = %key, written, "Content written");
            }
            Self::List => {
                for key in store.get_all_binary_keys().await? {
                    write_line(&mut stdout, &key.to_string()).await?;
                }
            }
            Self::Delete { keys } => {
                let count = store.mark_as_unused(&keys).await?;
                tracing::info!(target: TRACING_TARGET_COMMAND, count, "Delete submitted");
            }
            Self::Mime { key } => {
                let mime_type = store.get_stored_mime_type(&key).await?;
                write_line(&mut stdout, &mime_type).await?;
            }
            Self::Text(TextCommand::Get { key }) => {
                let text = store.get_extracted_text(&key).await?;
                write_line(&mut stdout, &text).await?;
            }
            Self::Text(TextCommand::Set { key, text }) => {
                let text = if text == "-" {
                    read_to_string(tokio::io::stdin()).await?
                } else {
                    text
                };
                store.store_extracted_text(&key, &text).await?;
            }
            Self::Capabilities => {
                let capabilities = serde_json::to_string_pretty(&store.capabilities())?;
                write_line(&mut stdout, &capabilities).await?;
            }
        }

        stdout.flush().await?;
        Ok(())
    }
}

fn is_stdin(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}

async fn copy<W>(mut reader: ObjectReader, writer: &mut W) -> anyhow::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let written = tokio::io::copy(&mut reader, writer)
        .await
        .context("failed to copy content")?;
    writer.flush().await?;
    Ok(written)
}

async fn read_to_string<R: AsyncRead + Unpin>(mut reader: R) -> anyhow::Result<String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .await
        .context("failed to read stdin")?;
    Ok(text)
}

async fn write_line<W>(writer: &mut W, line: &str) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}
