//! Response normalization.
//!
//! The daemon answers with flat `key: value` lines. How those lines are
//! grouped depends on the command, never on the lines themselves; the
//! command table declares the expected [`Shape`].

use indexmap::IndexMap;
use mpdwire_core::{Error, IncompleteRecord, Result, TagConfig};
use serde::Serialize;
use tracing::{debug, trace};

use crate::command::{Command, Shape};

/// One daemon-reported item, fields in wire order.
pub type Record = IndexMap<String, String>;

/// Fields every track record must carry: daemon fields first, then tags.
pub const ESSENTIAL_FIELDS: [&str; 8] = [
    "file", "Pos", "Id", "Artist", "Album", "Title", "Track", "Time",
];

/// Essential fields that describe the track itself rather than its queue slot.
pub const DESCRIPTIVE_FIELDS: [&str; 6] = ["file", "Artist", "Album", "Title", "Track", "Time"];

/// A normalized response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Bool(bool),
    Map(Record),
    Values(Vec<String>),
    Records(Vec<Record>),
}

impl Response {
    pub fn as_bool(&self) -> bool {
        matches!(self, Response::Bool(true))
    }

    pub fn into_map(self) -> Record {
        match self {
            Response::Map(map) => map,
            Response::Records(mut records) if records.len() == 1 => records.remove(0),
            _ => Record::new(),
        }
    }

    pub fn into_values(self) -> Vec<String> {
        match self {
            Response::Values(values) => values,
            _ => Vec::new(),
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Response::Records(records) => records,
            Response::Map(map) if !map.is_empty() => vec![map],
            _ => Vec::new(),
        }
    }
}

/// Split a `key: value` line.
pub fn split_pair(line: &str) -> Option<(&str, &str)> {
    let (key, rest) = line.split_once(':')?;
    let value = rest.strip_prefix(|c: char| c.is_whitespace())?;
    Some((key, value))
}

fn essential_index(key: &str) -> Option<usize> {
    ESSENTIAL_FIELDS.iter().position(|field| *field == key)
}

/// Essential fields absent from a record, in essential-field order.
pub fn missing_fields(record: &Record) -> Vec<&'static str> {
    ESSENTIAL_FIELDS
        .iter()
        .copied()
        .filter(|field| !record.contains_key(*field))
        .collect()
}

/// Whether a record carries every descriptive essential tag.
pub fn has_descriptive_tags(record: &Record) -> bool {
    DESCRIPTIVE_FIELDS
        .iter()
        .all(|field| record.contains_key(*field))
}

/// Keep only the essential fields of a record.
pub fn project_essential(record: &Record) -> Record {
    record
        .iter()
        .filter(|(key, _)| essential_index(key).is_some())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn identify(record: &Record, index: usize) -> String {
    record
        .get("Id")
        .or_else(|| record.get("file"))
        .cloned()
        .unwrap_or_else(|| format!("#{index}"))
}

/// Split lines into records, starting a new record whenever a key repeats.
pub fn chunk_on_repeat(raw: &[String]) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current = Record::new();

    for line in raw {
        let Some((key, value)) = split_pair(line) else {
            trace!("Skipping line without key/value pair: {}", line);
            continue;
        };

        if current.contains_key(key) {
            records.push(std::mem::take(&mut current));
        }
        current.insert(key.to_string(), value.to_string());
    }

    if !current.is_empty() {
        records.push(current);
    }

    records
}

/// Track records being assembled with the seen-fields checklist.
struct TrackChunker {
    filter: bool,
    report_missing: bool,
    tracks: Vec<Record>,
    incomplete: Vec<IncompleteRecord>,
    current: Record,
    seen: [bool; ESSENTIAL_FIELDS.len()],
}

impl TrackChunker {
    fn new(tags: TagConfig) -> Self {
        Self {
            filter: tags.filter,
            report_missing: tags.require_essential,
            tracks: Vec::new(),
            incomplete: Vec::new(),
            current: Record::new(),
            seen: [false; ESSENTIAL_FIELDS.len()],
        }
    }

    fn push(&mut self, key: &str, value: &str) {
        match essential_index(key) {
            None => {
                if !self.filter {
                    self.current.insert(key.to_string(), value.to_string());
                }
            }
            Some(i) => {
                if self.seen[i] {
                    self.finish_current();
                }
                self.seen[i] = true;
                self.current.insert(key.to_string(), value.to_string());
            }
        }
    }

    fn finish_current(&mut self) {
        let record = std::mem::take(&mut self.current);
        let seen = std::mem::replace(&mut self.seen, [false; ESSENTIAL_FIELDS.len()]);

        if record.is_empty() {
            return;
        }

        if self.report_missing {
            let missing: Vec<String> = ESSENTIAL_FIELDS
                .iter()
                .zip(seen)
                .filter(|(_, seen)| !seen)
                .map(|(field, _)| field.to_string())
                .collect();

            if !missing.is_empty() {
                self.incomplete.push(IncompleteRecord {
                    id: identify(&record, self.tracks.len()),
                    missing,
                });
            }
        }

        self.tracks.push(record);
    }

    fn finish(mut self, command: Command) -> Result<Vec<Record>> {
        self.finish_current();

        if !self.incomplete.is_empty() {
            return Err(Error::EssentialTagsMissing {
                command: command.name().to_string(),
                records: self.incomplete,
            });
        }

        Ok(self.tracks)
    }
}

/// Turns raw response lines into a [`Response`] according to the command table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    tags: TagConfig,
}

impl Normalizer {
    pub fn new(tags: TagConfig) -> Self {
        Self { tags }
    }

    pub fn tags(&self) -> TagConfig {
        self.tags
    }

    pub fn normalize(&self, command: Command, raw: &[String]) -> Result<Response> {
        match command.shape() {
            Shape::Boolean => {
                if !raw.is_empty() {
                    debug!(
                        "Discarding {} unexpected line(s) from '{}'",
                        raw.len(),
                        command
                    );
                }
                Ok(Response::Bool(true))
            }
            Shape::Values(only) => Ok(Response::Values(
                raw.iter()
                    .filter_map(|line| split_pair(line))
                    .filter(|(key, _)| only.map_or(true, |only| *key == only))
                    .map(|(_, value)| value.to_string())
                    .collect(),
            )),
            Shape::Map => {
                let mut records = chunk_on_repeat(raw);
                if records.len() > 1 {
                    debug!(
                        "'{}' repeated keys; keeping the last of {} mappings",
                        command,
                        records.len()
                    );
                }
                Ok(Response::Map(records.pop().unwrap_or_default()))
            }
            Shape::Records => Ok(Response::Records(chunk_on_repeat(raw))),
            Shape::Tracks => {
                let mut chunker = TrackChunker::new(self.tags);
                for line in raw {
                    match split_pair(line) {
                        Some((key, value)) => chunker.push(key, value),
                        None => trace!("Skipping line without key/value pair: {}", line),
                    }
                }
                chunker.finish(command).map(Response::Records)
            }
        }
    }
}
