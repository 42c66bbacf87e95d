//! Command line serialization.

use crate::command::Command;

pub const COMMAND_LIST_BEGIN: &str = "command_list_begin";
pub const COMMAND_LIST_END: &str = "command_list_end";

/// A single command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Value(String),
    /// Nested lists are never valid on the wire and are dropped on serialization.
    List(Vec<String>),
}

impl Arg {
    fn as_value(&self) -> Option<&str> {
        match self {
            Arg::Value(value) => Some(value),
            Arg::List(_) => None,
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Value(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Value(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Value(value.clone())
    }
}

impl From<Vec<String>> for Arg {
    fn from(values: Vec<String>) -> Self {
        Arg::List(values)
    }
}

macro_rules! arg_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Arg {
            fn from(value: $ty) -> Self {
                Arg::Value(value.to_string())
            }
        })*
    };
}

arg_from_number!(u8, u16, u32, u64, usize, i32, i64, f32, f64);

/// Build an argument vector from anything convertible to [`Arg`].
pub fn args<I, A>(items: I) -> Vec<Arg>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    items.into_iter().map(Into::into).collect()
}

/// Serialize a command name and its arguments into one wire line (without newline).
///
/// Each argument has `"` escaped and is wrapped in double quotes; list
/// arguments are dropped.
pub fn serialize(name: &str, args: &[Arg]) -> String {
    let mut line = name.trim().to_string();

    for value in args.iter().filter_map(Arg::as_value) {
        line.push_str(" \"");
        line.push_str(&value.replace('"', "\\\""));
        line.push('"');
    }

    line
}

/// Commands accumulated client-side and sent as one bracketed batch.
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    lines: Vec<String>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command to the batch.
    pub fn push(&mut self, command: Command, args: &[Arg]) -> &mut Self {
        self.lines.push(serialize(command.name(), args));
        self
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The full batch as written to the socket, including the trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            COMMAND_LIST_BEGIN.len()
                + COMMAND_LIST_END.len()
                + self.lines.iter().map(|l| l.len() + 1).sum::<usize>()
                + 2,
        );
        out.push_str(COMMAND_LIST_BEGIN);
        out.push('\n');
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(COMMAND_LIST_END);
        out.push('\n');
        out
    }
}
