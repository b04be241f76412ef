//! Chronicle CLI
//!
//! Inspect, verify, and replay JSONL session logs from the command
//! line. Replay rebuilds placeholder registries from the ids named
//! in the log, so it reconstructs values without the original host
//! application.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chronicle_core::{Cid, Value};
use chronicle_log::{read_log, Action, Cursor, EventLog};
use chronicle_property::{ObservableList, Property};
use chronicle_replay::{Recorder, RecorderConfig, Replayer};
use clap::{Parser, Subcommand};
use color_eyre::eyre::bail;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "Record/replay session log tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a session log
    Inspect {
        /// Path to JSONL log file
        #[arg(short, long)]
        log: PathBuf,
    },
    /// Parse a session log and validate ordering and references
    Verify {
        /// Path to JSONL log file
        #[arg(short, long)]
        log: PathBuf,
    },
    /// Replay a session log against placeholder registries and
    /// print the reconstructed state
    Replay {
        /// Path to JSONL log file
        #[arg(short, long)]
        log: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect { log } => {
            let log = read_log(log)?;
            inspect(&log);
            Ok(())
        }
        Commands::Verify { log } => {
            let log = read_log(log)?;
            verify_references(&log)?;
            let shape = RegistryShape::scan(&log);
            println!(
                "ok: {} entries, {} properties, {} collections",
                log.len(),
                shape.properties,
                shape.collections
            );
            Ok(())
        }
        Commands::Replay { log } => {
            let log = read_log(log)?;
            replay(&log)?;
            Ok(())
        }
    }
}

fn inspect(log: &EventLog) {
    println!("entries: {}", log.len());
    if let (Some(first), Some(last)) = (log.entries().first(), log.entries().last()) {
        println!("time range: {} .. {}", first.time, last.time);
    }

    let mut histogram: BTreeMap<&'static str, usize> = BTreeMap::new();
    for entry in log.iter() {
        *histogram.entry(entry.action.tag()).or_default() += 1;
    }
    for (tag, count) in histogram {
        println!("  {tag}: {count}");
    }
}

/// Registry slot counts implied by the ids a log names.
///
/// Ids are dense and 0-based, so the implied slot count is simply
/// max id + 1 per registry.
struct RegistryShape {
    properties: u32,
    collections: u32,
}

impl RegistryShape {
    fn scan(log: &EventLog) -> Self {
        let mut properties = 0u32;
        let mut collections = 0u32;
        for entry in log.iter() {
            match &entry.action {
                Action::Change { .. } | Action::Trigger { .. } => {
                    properties = properties.max(entry.cid.as_u32() + 1);
                }
                Action::Add { collection } | Action::Remove { collection } => {
                    properties = properties.max(entry.cid.as_u32() + 1);
                    collections = collections.max(collection.as_u32() + 1);
                }
                // subject is the collection itself
                Action::Reset { collection } | Action::Sort { collection } => {
                    collections = collections.max(collection.as_u32() + 1);
                }
            }
        }
        Self {
            properties,
            collections,
        }
    }
}

/// Check that the cids a log references are dense-contiguous from
/// 0 per registry - the only structural check possible without the
/// live registry, since registration assigns ids in that shape.
fn verify_references(log: &EventLog) -> Result<()> {
    let mut properties = BTreeSet::new();
    let mut collections = BTreeSet::new();
    for entry in log.iter() {
        match &entry.action {
            Action::Change { .. } | Action::Trigger { .. } => {
                properties.insert(entry.cid.as_u32());
            }
            Action::Add { collection } | Action::Remove { collection } => {
                properties.insert(entry.cid.as_u32());
                collections.insert(collection.as_u32());
            }
            Action::Reset { collection } | Action::Sort { collection } => {
                collections.insert(collection.as_u32());
            }
        }
    }
    for (registry, ids) in [("property", &properties), ("collection", &collections)] {
        for (expected, actual) in ids.iter().enumerate() {
            if *actual != expected as u32 {
                bail!(
                    "{registry} ids are not dense: log names {} but never cid_{expected}",
                    Cid::from_raw(*actual)
                );
            }
        }
    }
    Ok(())
}

fn replay(log: &EventLog) -> Result<()> {
    let shape = RegistryShape::scan(log);
    let recorder = Recorder::new(RecorderConfig::new());

    let properties: Vec<Property> = (0..shape.properties)
        .map(|_| Property::new(Value::Null))
        .collect();
    for property in &properties {
        recorder.register_property(property);
    }
    let lists: Vec<ObservableList> = (0..shape.collections)
        .map(|_| ObservableList::new())
        .collect();
    for list in &lists {
        recorder.register_collection(list);
    }

    let replayer = Replayer::new(&recorder);
    if let Some(end) = log.last_time() {
        replayer.step_until(log, end, Cursor::new())?;
    }

    for (index, property) in properties.iter().enumerate() {
        println!("{}: {:?}", Cid::from_raw(index as u32), property.get());
    }
    for (index, list) in lists.iter().enumerate() {
        let members: Vec<String> = list
            .members()
            .iter()
            .map(|member| {
                recorder
                    .ref_to(member)
                    .ok()
                    .and_then(|v| v.as_ref_cid())
                    .map_or_else(|| "?".to_string(), |cid| cid.to_string())
            })
            .collect();
        println!(
            "collection {}: [{}]",
            Cid::from_raw(index as u32),
            members.join(", ")
        );
    }
    Ok(())
}
