//! Console Command Parser
//!
//! Turns one line of console input into a [`Command`].
//!
//! ## Parsing Strategy
//!
//! 1. Split the line into tokens on whitespace
//! 2. A token starting with `"` runs to the next unescaped `"`, so values may
//!    contain spaces. Inside quotes a backslash takes the next character
//!    literally (`\"`, `\\`)
//! 3. The first token names the command (case-insensitive)
//! 4. The remaining tokens are checked for arity and parsed into typed
//!    arguments

use crate::error::CommandError;
use bytes::Bytes;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PING [message]`
    Ping(Option<Bytes>),
    /// `SET key value [ttl_secs]`
    Set {
        key: String,
        value: Bytes,
        ttl_secs: u32,
    },
    /// `GET key`
    Get { key: String },
    /// `DEL key [key ...]`
    Del { keys: Vec<String> },
    /// `RANGE start count`
    Range { start: String, count: usize },
    /// `RECLAIM [max]`
    Reclaim { max: usize },
    /// `TTL key`
    Ttl { key: String },
    /// `DBSIZE`
    DbSize,
    /// `INFO`
    Info,
    /// `QUIT`
    Quit,
}

impl Command {
    /// Parses one line of input.
    ///
    /// # Example
    ///
    /// ```
    /// use ttlkv::commands::Command;
    /// use bytes::Bytes;
    ///
    /// let cmd = Command::parse(r#"set greeting "hello world" 30"#).unwrap();
    /// assert_eq!(
    ///     cmd,
    ///     Command::Set {
    ///         key: "greeting".to_string(),
    ///         value: Bytes::from("hello world"),
    ///         ttl_secs: 30,
    ///     }
    /// );
    /// ```
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = tokenize(line)?.into_iter();
        let name = tokens.next().ok_or(CommandError::Empty)?.to_uppercase();
        let args: Vec<String> = tokens.collect();

        match name.as_str() {
            "PING" => match args.len() {
                0 => Ok(Command::Ping(None)),
                1 => Ok(Command::Ping(args.into_iter().next().map(Bytes::from))),
                _ => Err(CommandError::WrongArity("PING")),
            },
            "SET" => {
                let ttl_secs = match args.len() {
                    2 => 0,
                    3 => parse_integer(&args[2])?,
                    _ => return Err(CommandError::WrongArity("SET")),
                };
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(key), Some(value)) => Ok(Command::Set {
                        key,
                        value: Bytes::from(value),
                        ttl_secs,
                    }),
                    _ => Err(CommandError::WrongArity("SET")),
                }
            }
            "GET" => Ok(Command::Get {
                key: single_arg(args, "GET")?,
            }),
            "DEL" => {
                if args.is_empty() {
                    return Err(CommandError::WrongArity("DEL"));
                }
                Ok(Command::Del { keys: args })
            }
            "RANGE" => {
                if args.len() != 2 {
                    return Err(CommandError::WrongArity("RANGE"));
                }
                let count = parse_integer(&args[1])?;
                let start = args.into_iter().next().unwrap_or_default();
                Ok(Command::Range { start, count })
            }
            "RECLAIM" => match args.as_slice() {
                [] => Ok(Command::Reclaim { max: 1 }),
                [max] => Ok(Command::Reclaim {
                    max: parse_integer(max)?,
                }),
                _ => Err(CommandError::WrongArity("RECLAIM")),
            },
            "TTL" => Ok(Command::Ttl {
                key: single_arg(args, "TTL")?,
            }),
            "DBSIZE" => no_args(args, "DBSIZE", Command::DbSize),
            "INFO" => no_args(args, "INFO", Command::Info),
            "QUIT" | "EXIT" => no_args(args, "QUIT", Command::Quit),
            _ => Err(CommandError::Unknown(name)),
        }
    }
}

fn single_arg(args: Vec<String>, name: &'static str) -> Result<String, CommandError> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(CommandError::WrongArity(name)),
    }
}

fn no_args(args: Vec<String>, name: &'static str, command: Command) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::WrongArity(name))
    }
}

fn parse_integer<T: std::str::FromStr>(token: &str) -> Result<T, CommandError> {
    token
        .parse()
        .map_err(|_| CommandError::InvalidInteger(token.to_string()))
}

/// Splits a line into whitespace-separated tokens, honouring double quotes.
fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(&first) = chars.peek() else {
            break;
        };

        let mut token = String::new();
        if first == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => break,
                    },
                    c => token.push(c),
                }
            }
            // A closing quote must also end the token
            if !closed || chars.peek().is_some_and(|c| !c.is_whitespace()) {
                return Err(CommandError::UnbalancedQuotes);
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                token.push(c);
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}
