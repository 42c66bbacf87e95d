//! The command table.
//!
//! Every command the client knows is declared once, together with the number
//! of arguments it accepts and the shape its response normalizes to.

use std::fmt;

/// Expected shape of a command's normalized response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Bare success; any output is discarded.
    Boolean,
    /// A single flat key/value mapping.
    Map,
    /// A list of records split on repeated keys.
    Records,
    /// A list of track records split with the essential-field checklist.
    Tracks,
    /// A list of values, optionally restricted to one key.
    Values(Option<&'static str>),
}

/// Number of arguments a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {max}"),
            Some(max) => write!(f, "{} to {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

macro_rules! command_table {
    ($($variant:ident => $name:literal, $shape:expr, ($min:expr, $max:expr);)*) => {
        /// A daemon command known to the client.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Command {
            $($variant,)*
        }

        impl Command {
            /// Every known command, in table order.
            pub const ALL: &'static [Command] = &[$(Command::$variant,)*];

            /// The wire name of the command.
            pub fn name(self) -> &'static str {
                match self {
                    $(Command::$variant => $name,)*
                }
            }

            /// Look a command up by its wire name.
            pub fn from_name(name: &str) -> Option<Command> {
                match name.trim() {
                    $($name => Some(Command::$variant),)*
                    _ => None,
                }
            }

            pub fn shape(self) -> Shape {
                match self {
                    $(Command::$variant => $shape,)*
                }
            }

            pub fn arity(self) -> Arity {
                match self {
                    $(Command::$variant => Arity { min: $min, max: $max },)*
                }
            }
        }
    };
}

command_table! {
    Add => "add", Shape::Boolean, (1, Some(2));
    AddId => "addid", Shape::Map, (1, Some(2));
    Clear => "clear", Shape::Boolean, (0, Some(0));
    ClearError => "clearerror", Shape::Boolean, (0, Some(0));
    Close => "close", Shape::Boolean, (0, Some(0));
    Commands => "commands", Shape::Values(Some("command")), (0, Some(0));
    Consume => "consume", Shape::Boolean, (1, Some(1));
    Count => "count", Shape::Map, (1, None);
    Crossfade => "crossfade", Shape::Boolean, (1, Some(1));
    CurrentSong => "currentsong", Shape::Map, (0, Some(0));
    Decoders => "decoders", Shape::Records, (0, Some(0));
    Delete => "delete", Shape::Boolean, (1, Some(1));
    DeleteId => "deleteid", Shape::Boolean, (1, Some(1));
    DisableOutput => "disableoutput", Shape::Boolean, (1, Some(1));
    EnableOutput => "enableoutput", Shape::Boolean, (1, Some(1));
    Find => "find", Shape::Records, (1, None);
    FindAdd => "findadd", Shape::Boolean, (1, None);
    Idle => "idle", Shape::Values(Some("changed")), (0, None);
    Kill => "kill", Shape::Boolean, (0, Some(0));
    List => "list", Shape::Values(None), (1, None);
    ListAll => "listall", Shape::Records, (0, Some(1));
    ListAllInfo => "listallinfo", Shape::Records, (0, Some(1));
    ListPlaylist => "listplaylist", Shape::Values(None), (1, Some(1));
    ListPlaylistInfo => "listplaylistinfo", Shape::Records, (1, Some(1));
    ListPlaylists => "listplaylists", Shape::Values(Some("playlist")), (0, Some(0));
    Load => "load", Shape::Boolean, (1, Some(2));
    LsInfo => "lsinfo", Shape::Records, (0, Some(1));
    MixrampDb => "mixrampdb", Shape::Boolean, (1, Some(1));
    MixrampDelay => "mixrampdelay", Shape::Boolean, (1, Some(1));
    Move => "move", Shape::Boolean, (2, Some(2));
    MoveId => "moveid", Shape::Boolean, (2, Some(2));
    Next => "next", Shape::Boolean, (0, Some(0));
    NotCommands => "notcommands", Shape::Values(Some("command")), (0, Some(0));
    Outputs => "outputs", Shape::Records, (0, Some(0));
    Password => "password", Shape::Boolean, (1, Some(1));
    Pause => "pause", Shape::Boolean, (0, Some(1));
    Ping => "ping", Shape::Boolean, (0, Some(0));
    Play => "play", Shape::Boolean, (0, Some(1));
    PlayId => "playid", Shape::Boolean, (0, Some(1));
    Playlist => "playlist", Shape::Values(None), (0, Some(0));
    PlaylistAdd => "playlistadd", Shape::Boolean, (2, Some(2));
    PlaylistClear => "playlistclear", Shape::Boolean, (1, Some(1));
    PlaylistDelete => "playlistdelete", Shape::Boolean, (2, Some(2));
    PlaylistFind => "playlistfind", Shape::Tracks, (1, None);
    PlaylistId => "playlistid", Shape::Tracks, (0, Some(1));
    PlaylistInfo => "playlistinfo", Shape::Tracks, (0, Some(1));
    PlaylistMove => "playlistmove", Shape::Boolean, (3, Some(3));
    PlaylistSearch => "playlistsearch", Shape::Tracks, (1, None);
    PlChanges => "plchanges", Shape::Tracks, (1, Some(1));
    PlChangesPosId => "plchangesposid", Shape::Records, (1, Some(1));
    Previous => "previous", Shape::Boolean, (0, Some(0));
    Random => "random", Shape::Boolean, (1, Some(1));
    Rename => "rename", Shape::Boolean, (2, Some(2));
    Repeat => "repeat", Shape::Boolean, (1, Some(1));
    ReplayGainMode => "replay_gain_mode", Shape::Boolean, (1, Some(1));
    ReplayGainStatus => "replay_gain_status", Shape::Map, (0, Some(0));
    Rescan => "rescan", Shape::Map, (0, Some(1));
    Rm => "rm", Shape::Boolean, (1, Some(1));
    Save => "save", Shape::Boolean, (1, Some(1));
    Search => "search", Shape::Records, (1, None);
    Seek => "seek", Shape::Boolean, (2, Some(2));
    SeekCur => "seekcur", Shape::Boolean, (1, Some(1));
    SeekId => "seekid", Shape::Boolean, (2, Some(2));
    SetVol => "setvol", Shape::Boolean, (1, Some(1));
    Shuffle => "shuffle", Shape::Boolean, (0, Some(1));
    Single => "single", Shape::Boolean, (1, Some(1));
    Stats => "stats", Shape::Map, (0, Some(0));
    Status => "status", Shape::Map, (0, Some(0));
    Sticker => "sticker", Shape::Records, (3, Some(5));
    Stop => "stop", Shape::Boolean, (0, Some(0));
    Swap => "swap", Shape::Boolean, (2, Some(2));
    SwapId => "swapid", Shape::Boolean, (2, Some(2));
    TagTypes => "tagtypes", Shape::Values(Some("tagtype")), (0, None);
    Update => "update", Shape::Map, (0, Some(1));
    UrlHandlers => "urlhandlers", Shape::Values(Some("handler")), (0, Some(0));
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_name_resolves_to_itself() {
        for &command in Command::ALL {
            assert_eq!(Command::from_name(command.name()), Some(command));
        }
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = Command::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Command::ALL.len());
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(Command::from_name("frobnicate"), None);
        assert_eq!(Command::from_name(""), None);
        assert_eq!(Command::from_name("STATUS"), None);
        assert_eq!(Command::from_name(" status "), Some(Command::Status));
    }

    #[test]
    fn test_shapes() {
        assert_eq!(Command::Delete.shape(), Shape::Boolean);
        assert_eq!(Command::Password.shape(), Shape::Boolean);
        assert_eq!(Command::Status.shape(), Shape::Map);
        assert_eq!(Command::Stats.shape(), Shape::Map);
        assert_eq!(Command::PlaylistInfo.shape(), Shape::Tracks);
        assert_eq!(Command::Find.shape(), Shape::Records);
        assert_eq!(Command::List.shape(), Shape::Values(None));
        assert_eq!(
            Command::ListPlaylists.shape(),
            Shape::Values(Some("playlist"))
        );
    }

    #[test]
    fn test_arity() {
        assert!(Command::Status.arity().accepts(0));
        assert!(!Command::Status.arity().accepts(1));
        assert!(Command::Find.arity().accepts(4));
        assert!(!Command::Find.arity().accepts(0));
        assert!(Command::Play.arity().accepts(0));
        assert!(Command::Play.arity().accepts(1));
        assert!(!Command::Play.arity().accepts(2));
    }

    #[test]
    fn test_arity_display() {
        assert_eq!(Command::Move.arity().to_string(), "exactly 2");
        assert_eq!(Command::Add.arity().to_string(), "1 to 2");
        assert_eq!(Command::Find.arity().to_string(), "at least 1");
    }
}
