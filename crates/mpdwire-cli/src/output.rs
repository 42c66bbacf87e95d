//! Terminal rendering for command results.

use anyhow::Result;
use clap::ValueEnum;
use mpdwire_client::{PlaybackState, PlayerStatus, Record, Response, Statistics};
use serde::Serialize;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
    Plain,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `seconds` as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(seconds: u64) -> String {
    let (hours, minutes, secs) = (seconds / 3600, (seconds / 60) % 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Cut `value` to at most `width` characters.
fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

fn field<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).map(String::as_str).unwrap_or("")
}

fn print_pairs(record: &Record) {
    let width = record.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, value) in record {
        println!("{key:<width$}  {value}");
    }
}

/// Render any normalized response.
pub fn print_response(response: &Response, format: Format) -> Result<()> {
    if format == Format::Json {
        return print_json(response);
    }

    match response {
        Response::Bool(_) => println!("OK"),
        Response::Map(map) => match format {
            Format::Plain => {
                for (key, value) in map {
                    println!("{key}: {value}");
                }
            }
            _ => print_pairs(map),
        },
        Response::Values(values) => {
            for value in values {
                println!("{value}");
            }
        }
        Response::Records(records) => {
            if records.iter().all(|r| r.contains_key("file")) {
                print_tracks(records, format)?;
            } else {
                for (i, record) in records.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    print_pairs(record);
                }
            }
        }
    }

    Ok(())
}

/// Render a list of track records.
pub fn print_tracks(tracks: &[Record], format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(tracks)?,
        Format::Plain => {
            for track in tracks {
                println!("{}", field(track, "file"));
            }
        }
        Format::Table => {
            println!(
                "{:<5} {:<24} {:<32} {:<24} {:>7}",
                "POS", "ARTIST", "TITLE", "ALBUM", "TIME"
            );
            for track in tracks {
                let time = field(track, "Time")
                    .parse()
                    .map(format_duration)
                    .unwrap_or_default();
                // Streams often have a title but no file-level tags.
                let title = match field(track, "Title") {
                    "" => field(track, "file"),
                    title => title,
                };
                println!(
                    "{:<5} {:<24} {:<32} {:<24} {:>7}",
                    field(track, "Pos"),
                    clip(field(track, "Artist"), 24),
                    clip(title, 32),
                    clip(field(track, "Album"), 24),
                    time
                );
            }
        }
    }
    Ok(())
}

/// Render the track a navigation command landed on.
pub fn print_track(track: Option<&Record>, format: Format) -> Result<()> {
    match (track, format) {
        (None, Format::Json) => println!("null"),
        (None, _) => println!("Queue is empty"),
        (Some(track), Format::Json) => print_json(track)?,
        (Some(track), Format::Plain) => println!("{}", field(track, "file")),
        (Some(track), Format::Table) => {
            println!(
                "{} - {} ({})",
                field(track, "Artist"),
                field(track, "Title"),
                field(track, "Album")
            );
        }
    }
    Ok(())
}

/// Render player status, naming the current track when there is one.
pub fn print_status(
    player: &PlayerStatus,
    raw: &Record,
    current: Option<&Record>,
    format: Format,
) -> Result<()> {
    match format {
        Format::Json => return print_json(raw),
        Format::Plain => return print_response(&Response::Map(raw.clone()), format),
        Format::Table => {}
    }

    if player.state.has_current_track() {
        if let Some(track) = current {
            println!("{} - {}", field(track, "Artist"), field(track, "Title"));
        }
        println!(
            "[{}] #{}/{}   {}/{}",
            player.state,
            player.current_track + 1,
            player.playlist_length,
            format_duration(player.current_position),
            format_duration(player.current_length)
        );
    } else if player.state == PlaybackState::Stop {
        println!("[stopped] {} track(s) queued", player.playlist_length);
    }

    let volume = if player.volume < 0 {
        "n/a".to_string()
    } else {
        format!("{}%", player.volume)
    };
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    println!(
        "volume: {volume}   repeat: {}   random: {}   single: {}   consume: {}",
        on_off(player.repeat),
        on_off(player.random),
        on_off(player.single),
        on_off(player.consume)
    );
    Ok(())
}

/// Render daemon statistics.
pub fn print_statistics(stats: &Statistics, raw: &Record, format: Format) -> Result<()> {
    match format {
        Format::Json => return print_json(raw),
        Format::Plain => return print_response(&Response::Map(raw.clone()), format),
        Format::Table => {}
    }

    let updated = chrono::DateTime::from_timestamp(stats.db_update as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    println!("Artists:      {}", stats.artists);
    println!("Albums:       {}", stats.albums);
    println!("Songs:        {}", stats.songs);
    println!("Play time:    {}", format_duration(stats.playtime));
    println!("Uptime:       {}", format_duration(stats.uptime));
    println!("DB play time: {}", format_duration(stats.db_playtime));
    println!("DB updated:   {updated}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3600 + 62), "1:01:02");
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("Shine On You Crazy Diamond", 10), "Shine On ~");
    }
}
