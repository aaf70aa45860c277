//! Console Replies
//!
//! [`Reply`] is what a command produces. Its [`Display`](fmt::Display)
//! implementation renders it the way the console prints it:
//!
//! ```text
//! OK                     Reply::Ok
//! PONG                   Reply::Pong
//! (nil)                  Reply::Nil
//! (integer) 3            Reply::Integer(3)
//! "value"                Reply::Value(..)
//! 1) "d" "vd"            Reply::Pairs(..), one line per pair
//! (empty list)           Reply::Pairs(vec![])
//! (error) ERR ...        Reply::Error(..)
//! ```

use crate::error::CommandError;
use bytes::Bytes;
use std::fmt;

/// The result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Pong,
    Nil,
    Integer(i64),
    Value(Bytes),
    Pairs(Vec<(String, Bytes)>),
    /// Free-form text printed as-is
    Text(String),
    Error(String),
}

impl Reply {
    /// Creates an error reply.
    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    /// Returns true if this is an error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error(format!("ERR {}", err))
    }
}

impl From<Option<Bytes>> for Reply {
    fn from(value: Option<Bytes>) -> Self {
        value.map_or(Reply::Nil, Reply::Value)
    }
}

/// Writes a payload as a quoted string, escaping anything non-printable.
fn write_quoted(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    write!(f, "{:?}", String::from_utf8_lossy(bytes))
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Pong => f.write_str("PONG"),
            Reply::Nil => f.write_str("(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Value(v) => write_quoted(f, v),
            Reply::Pairs(pairs) if pairs.is_empty() => f.write_str("(empty list)"),
            Reply::Pairs(pairs) => {
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{}) ", i + 1)?;
                    write_quoted(f, key.as_bytes())?;
                    f.write_str(" ")?;
                    write_quoted(f, value)?;
                }
                Ok(())
            }
            Reply::Text(text) => f.write_str(text),
            Reply::Error(msg) => write!(f, "(error) {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scalars() {
        assert_eq!(Reply::Ok.to_string(), "OK");
        assert_eq!(Reply::Pong.to_string(), "PONG");
        assert_eq!(Reply::Nil.to_string(), "(nil)");
        assert_eq!(Reply::Integer(-1).to_string(), "(integer) -1");
        assert_eq!(Reply::Value(Bytes::from("hi")).to_string(), "\"hi\"");
        assert_eq!(
            Reply::Value(Bytes::from("a\"b\n")).to_string(),
            r#""a\"b\n""#
        );
    }

    #[test]
    fn test_render_pairs() {
        let reply = Reply::Pairs(vec![
            ("d".to_string(), Bytes::from("vd")),
            ("e".to_string(), Bytes::from("ve")),
        ]);
        assert_eq!(reply.to_string(), "1) \"d\" \"vd\"\n2) \"e\" \"ve\"");
        assert_eq!(Reply::Pairs(Vec::new()).to_string(), "(empty list)");
    }

    #[test]
    fn test_from_command_error() {
        let reply = Reply::from(CommandError::WrongArity("GET"));
        assert!(reply.is_error());
        assert_eq!(
            reply.to_string(),
            "(error) ERR wrong number of arguments for 'GET' command"
        );
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Reply::from(None::<Bytes>), Reply::Nil);
        assert_eq!(
            Reply::from(Some(Bytes::from("v"))),
            Reply::Value(Bytes::from("v"))
        );
    }
}
