//! # quill
//!
//! Replays recorded agent event logs through the view engine and prints the
//! resulting snapshot as JSON. Useful for checking what a UI would render for
//! a captured conversation.

#![deny(unsafe_code)]

mod input;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quill_core::ConversationId;
use quill_events::StreamEvent;
use quill_settings::{QuillSettings, load_settings, load_settings_from_path};
use quill_view::{Dispatcher, ViewHandle, ViewStore};
use serde_json::{Value, json};
use tracing::info;

use crate::input::{LineFormat, read_events};

/// Conversation view replay tool.
#[derive(Parser, Debug)]
#[command(name = "quill", about = "Fold agent event logs into conversation views")]
struct Cli {
    /// Settings file (defaults to `~/.quill/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a whole log as one transaction.
    Replay {
        /// JSON-lines event log.
        file: PathBuf,

        /// Lines are persisted conversation records, not stream events.
        #[arg(long)]
        records: bool,

        /// Conversation to replay (defaults to the first event's).
        #[arg(long)]
        conversation: Option<String>,

        /// Live event log applied first, as the view a client already holds.
        #[arg(long)]
        base: Option<PathBuf>,

        /// Replay on top of the base view instead of resetting the conversation.
        #[arg(long, requires = "base")]
        keep_history: bool,
    },
    /// Apply a log one event at a time, as a live stream would.
    Stream {
        /// JSON-lines event log.
        file: PathBuf,
    },
}

fn load(cli: &Cli) -> Result<QuillSettings> {
    let settings = match &cli.settings {
        Some(path) => load_settings_from_path(path),
        None => load_settings(),
    };
    settings.context("Failed to load settings")
}

fn target_conversation(requested: Option<String>, events: &[StreamEvent]) -> Result<ConversationId> {
    requested
        .map(ConversationId::from)
        .or_else(|| events.first().map(|event| event.data.conversation_id.clone()))
        .context("No conversation given and the log is empty")
}

fn live_view(dispatcher: &Dispatcher, events: &[StreamEvent]) -> ViewStore {
    events
        .iter()
        .fold(ViewStore::new(), |store, event| dispatcher.apply_event(&store, event))
}

fn replay(
    dispatcher: &Dispatcher,
    base: &ViewStore,
    events: &[StreamEvent],
    conversation_id: &ConversationId,
    keep_history: bool,
) -> Result<Value> {
    let store = dispatcher.replay(base, conversation_id, events, !keep_history);
    let view = store
        .conversation(conversation_id.as_str())
        .context("Replay produced no conversation")?;
    Ok(json!({
        "conversationId": conversation_id,
        "view": serde_json::to_value(&**view)?,
    }))
}

fn stream(dispatcher: Dispatcher, events: &[StreamEvent]) -> Result<Value> {
    let handle = ViewHandle::new(dispatcher);
    for event in events {
        let _ = handle.apply(event);
    }
    let store = handle.snapshot();
    let revisions: BTreeMap<&str, u64> = store
        .conversations()
        .map(|(id, conv)| (id.as_str(), conv.revision()))
        .collect();
    Ok(json!({
        "revisions": revisions,
        "view": serde_json::to_value(&*store)?,
    }))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load(&cli)?;
    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    quill_core::logging::init_subscriber(level);

    let dispatcher = Dispatcher::from_settings(&settings);
    let output = match cli.command {
        Command::Replay {
            file,
            records,
            conversation,
            base,
            keep_history,
        } => {
            let format = if records {
                LineFormat::Records
            } else {
                LineFormat::Stream
            };
            let events = read_events(&file, format)?;
            let conversation_id = target_conversation(conversation, &events)?;
            let base = match base {
                Some(path) => live_view(&dispatcher, &read_events(&path, LineFormat::Stream)?),
                None => ViewStore::new(),
            };
            info!(conversation_id = %conversation_id, events = events.len(), keep_history, "replaying log");
            replay(&dispatcher, &base, &events, &conversation_id, keep_history)?
        }
        Command::Stream { file } => {
            let events = read_events(&file, LineFormat::Stream)?;
            info!(events = events.len(), "streaming log");
            stream(dispatcher, &events)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
