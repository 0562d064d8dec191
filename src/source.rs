//! Reading record collections from JSON files.
//!
//! The loader is the engine's upstream fetch: it runs on a background thread
//! and hands back whatever the file held, classified but not validated. The
//! engine's sanitizer decides what is renderable.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::Value as Json;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use crate::engine::{RemotePage, Source, TableEngine};
use crate::AppEvent;

/// Placeholder substituted with the requested page number in a source path.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// What a data file turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Records(Vec<Json>),
    /// One page of a server-paginated result.
    Remote(RemotePage<Json>),
    /// Anything else, passed on for the sanitizer to reject.
    Other(Json),
}

impl Payload {
    pub fn classify(value: Json) -> Self {
        match value {
            Json::Array(items) => Payload::Records(items),
            Json::Object(ref map) if map.contains_key("items") && map.contains_key("totalPages") => {
                match serde_json::from_value::<RemotePage<Json>>(value.clone()) {
                    Ok(page) => Payload::Remote(page),
                    Err(e) => {
                        log::warn!("page object did not match {{items, totalPages}}: {}", e);
                        Payload::Other(value)
                    }
                }
            }
            other => Payload::Other(other),
        }
    }

    pub fn first_record(&self) -> Option<&Json> {
        match self {
            Payload::Records(items) => items.first(),
            Payload::Remote(page) => page.items.first(),
            Payload::Other(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Records(items) => items.len(),
            Payload::Remote(page) => page.items.len(),
            Payload::Other(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand the payload to the engine.
    pub fn install(self, table: &mut TableEngine<Json>) {
        match self {
            Payload::Records(items) => table.set_data(items),
            Payload::Remote(page) => table.set_remote_page(page),
            Payload::Other(value) => table.set_data(Source::from_json(Some(value))),
        }
    }
}

/// Location of the data, optionally with a `{page}` placeholder for
/// server-style paging across files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    path: String,
}

impl DataSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    pub fn is_paged(&self) -> bool {
        self.path.contains(PAGE_PLACEHOLDER)
    }

    pub fn path_for_page(&self, page: usize) -> PathBuf {
        PathBuf::from(self.path.replace(PAGE_PLACEHOLDER, &page.to_string()))
    }

    /// Path of the first load.
    pub fn initial_path(&self) -> PathBuf {
        self.path_for_page(1)
    }
}

/// Read and classify one JSON file.
pub fn read_payload(path: &Path) -> Result<Payload> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;
    let value: Json = serde_json::from_str(&content)
        .map_err(|e| eyre!("Failed to parse {} as JSON: {}", path.display(), e))?;
    Ok(Payload::classify(value))
}

/// Load `path` on a background thread, reporting through `events`.
pub fn spawn_load(path: PathBuf, events: Sender<AppEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        log::info!("loading {}", path.display());
        let event = match read_payload(&path) {
            Ok(payload) => {
                log::info!("loaded {} records from {}", payload.len(), path.display());
                AppEvent::Loaded(payload)
            }
            Err(e) => {
                log::error!("{}", e);
                AppEvent::LoadFailed(e.to_string())
            }
        };
        // The receiver is gone once the app has exited.
        let _ = events.send(event);
    })
}

/// Write `records` as a pretty-printed JSON array.
pub fn write_records(records: &[&Json], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| eyre!("Failed to create {}: {}", path.display(), e))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), records)
        .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
    Ok(())
}
