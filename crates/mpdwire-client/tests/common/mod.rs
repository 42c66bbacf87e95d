//! A scripted stand-in for the daemon, served from a background thread.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
#[cfg(unix)]
use std::os::unix::net::UnixListener;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use mpdwire_core::Config;

/// Reply that makes the fake daemon drop the connection.
pub const HANG_UP: &str = "\u{0}hang-up";

pub type Handler = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub struct FakeDaemon {
    pub port: u16,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl FakeDaemon {
    /// Listen on an ephemeral loopback port.
    pub fn spawn<F>(greeting: &str, handler: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Should bind loopback port");
        let port = listener.local_addr().unwrap().port();
        let daemon = Self {
            port,
            received: Arc::new(Mutex::new(Vec::new())),
            connections: Arc::new(AtomicUsize::new(0)),
        };

        let handler: Handler = Arc::new(handler);
        let greeting = greeting.to_string();
        let received = Arc::clone(&daemon.received);
        let connections = Arc::clone(&daemon.connections);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                connections.fetch_add(1, Ordering::SeqCst);
                let reader = stream.try_clone().expect("Should clone stream");
                let (greeting, handler, received) =
                    (greeting.clone(), Arc::clone(&handler), Arc::clone(&received));
                thread::spawn(move || serve(reader, stream, &greeting, &handler, &received));
            }
        });

        daemon
    }

    /// Listen on a unix socket at `path`.
    #[cfg(unix)]
    pub fn spawn_unix<F>(path: &Path, greeting: &str, handler: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let listener = UnixListener::bind(path).expect("Should bind unix socket");
        let daemon = Self {
            port: 0,
            received: Arc::new(Mutex::new(Vec::new())),
            connections: Arc::new(AtomicUsize::new(0)),
        };

        let handler: Handler = Arc::new(handler);
        let greeting = greeting.to_string();
        let received = Arc::clone(&daemon.received);
        let connections = Arc::clone(&daemon.connections);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                connections.fetch_add(1, Ordering::SeqCst);
                let reader = stream.try_clone().expect("Should clone stream");
                let (greeting, handler, received) =
                    (greeting.clone(), Arc::clone(&handler), Arc::clone(&received));
                thread::spawn(move || serve(reader, stream, &greeting, &handler, &received));
            }
        });

        daemon
    }

    /// Client configuration pointing at this daemon.
    pub fn config(&self) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: self.port,
            timeout_secs: 2,
            connect_timeout_secs: 2,
            ..Config::default()
        }
    }

    /// Every line received so far, across connections.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn serve<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    greeting: &str,
    handler: &Handler,
    received: &Mutex<Vec<String>>,
) {
    if writer.write_all(format!("{greeting}\n").as_bytes()).is_err() {
        return;
    }

    for line in BufReader::new(reader).lines() {
        let Ok(line) = line else { break };
        received.lock().unwrap().push(line.clone());

        let reply = handler(&line);
        if reply == HANG_UP {
            break;
        }
        if !reply.is_empty() && writer.write_all(reply.as_bytes()).is_err() {
            break;
        }
    }
}

/// One complete queue record.
pub fn track(pos: usize) -> String {
    format!(
        "file: music/track{pos}.flac\nLast-Modified: 2020-05-01T12:00:00Z\nTime: 200\n\
         Artist: Artist {pos}\nAlbum: Album\nTitle: Title {pos}\nTrack: {}\nGenre: Jazz\n\
         Pos: {pos}\nId: {}\n",
        pos + 1,
        pos + 100
    )
}

/// A daemon with a five-track queue whose current position follows `play`.
pub fn jukebox() -> (FakeDaemon, Arc<AtomicUsize>) {
    let current = Arc::new(AtomicUsize::new(0));
    let position = Arc::clone(&current);

    let daemon = FakeDaemon::spawn("OK MPD 0.23.5", move |line| {
        let name = line.split_whitespace().next().unwrap_or("");
        match name {
            "stats" => "artists: 5\nalbums: 1\nsongs: 5\nuptime: 42\nOK\n".to_string(),
            "status" => format!(
                "volume: 70\nrepeat: 0\nrandom: 0\nsingle: 0\nconsume: 0\nplaylist: 8\n\
                 playlistlength: 5\nstate: play\nsong: {0}\nsongid: {1}\ntime: 0:200\n\
                 elapsed: 0.000\nOK\n",
                position.load(Ordering::SeqCst),
                position.load(Ordering::SeqCst) + 100
            ),
            "playlistinfo" => {
                let mut out: String = (0..5).map(track).collect();
                out.push_str("OK\n");
                out
            }
            "play" => {
                if let Some(arg) = line.split('"').nth(1) {
                    position.store(arg.parse().unwrap_or(0), Ordering::SeqCst);
                }
                "OK\n".to_string()
            }
            _ => "OK\n".to_string(),
        }
    });

    (daemon, current)
}
