//! Typed views over the cached `status` and `stats` snapshots.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::response::Record;

/// Playback state reported by `status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Play,
    Pause,
    #[default]
    Stop,
}

impl PlaybackState {
    /// Whether a current track is loaded (playing or paused).
    pub fn has_current_track(self) -> bool {
        matches!(self, PlaybackState::Play | PlaybackState::Pause)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Play => "play",
            PlaybackState::Pause => "pause",
            PlaybackState::Stop => "stop",
        })
    }
}

fn field<T: FromStr + Default>(record: &Record, key: &str) -> T {
    record
        .get(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_default()
}

fn text(record: &Record, key: &str) -> String {
    record.get(key).cloned().unwrap_or_default()
}

/// Split `elapsed:total` into whole seconds.
pub fn split_time(value: &str) -> (u64, u64) {
    let (elapsed, total) = value.split_once(':').unwrap_or((value, "0"));
    (
        elapsed.trim().parse().unwrap_or(0),
        total.trim().parse().unwrap_or(0),
    )
}

/// Derived fields of the last `status` snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    /// Queue position of the current track, 0 when stopped.
    pub current_track: usize,
    /// Whole seconds into the current track, 0 when stopped.
    pub current_position: u64,
    /// Length of the current track in seconds, 0 when stopped.
    pub current_length: u64,
    pub repeat: bool,
    pub random: bool,
    pub single: bool,
    pub consume: bool,
    pub volume: i32,
    pub xfade: u32,
    pub mixrampdb: f64,
    pub mixrampdelay: f64,
    pub playlist: u32,
    pub playlist_length: usize,
    pub song: usize,
    pub songid: u32,
    pub nextsong: usize,
    pub nextsongid: u32,
    pub elapsed: f64,
    pub bitrate: u32,
    pub audio: String,
}

fn flag(record: &Record, key: &str) -> bool {
    record.get(key).is_some_and(|v| v.trim() == "1")
}

impl PlayerStatus {
    pub fn from_record(status: &Record) -> Self {
        let state = match status.get("state").map(String::as_str) {
            Some("play") => PlaybackState::Play,
            Some("pause") => PlaybackState::Pause,
            _ => PlaybackState::Stop,
        };

        let (current_track, current_position, current_length) = if state.has_current_track() {
            let (elapsed, total) = status.get("time").map_or((0, 0), |t| split_time(t));
            (field(status, "song"), elapsed, total)
        } else {
            (0, 0, 0)
        };

        Self {
            state,
            current_track,
            current_position,
            current_length,
            repeat: flag(status, "repeat"),
            random: flag(status, "random"),
            single: flag(status, "single"),
            consume: flag(status, "consume"),
            volume: field(status, "volume"),
            xfade: field(status, "xfade"),
            mixrampdb: field(status, "mixrampdb"),
            mixrampdelay: field(status, "mixrampdelay"),
            playlist: field(status, "playlist"),
            playlist_length: field(status, "playlistlength"),
            song: field(status, "song"),
            songid: field(status, "songid"),
            nextsong: field(status, "nextsong"),
            nextsongid: field(status, "nextsongid"),
            elapsed: field(status, "elapsed"),
            bitrate: field(status, "bitrate"),
            audio: text(status, "audio"),
        }
    }
}

/// Derived fields of the last `stats` snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub uptime: u64,
    pub playtime: u64,
    pub artists: u64,
    pub albums: u64,
    pub songs: u64,
    pub db_playtime: u64,
    pub db_update: u64,
}

impl Statistics {
    pub fn from_record(stats: &Record) -> Self {
        Self {
            uptime: field(stats, "uptime"),
            playtime: field(stats, "playtime"),
            artists: field(stats, "artists"),
            albums: field(stats, "albums"),
            songs: field(stats, "songs"),
            db_playtime: field(stats, "db_playtime"),
            db_update: field(stats, "db_update"),
        }
    }
}
