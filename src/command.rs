use crate::buffer::Buffer;
use crate::engine::KvEngine;
use crate::error::KvError;

/// A request line parsed into a verb and its byte arguments.
///
/// Arguments are byte data, never assumed printable. The front-end hands
/// [`Request::parse`] one line with its terminator already stripped; the
/// line is split on space boundaries only as far as the verb's shape
/// requires, so a `SET` value (and a `RENAME` target key) keeps any
/// embedded spaces verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// store a value under a key
    Set {
        /// the key to set
        key: Buffer,
        /// the value to store
        value: Buffer,
    },
    /// fetch the value stored under a key
    Get {
        /// the key to look up
        key: Buffer,
    },
    /// remove a key and its value
    Del {
        /// the key to remove
        key: Buffer,
    },
    /// check whether a key holds a value
    Exists {
        /// the key to check
        key: Buffer,
    },
    /// move a value from one key to another
    Rename {
        /// the key currently holding the value
        old_key: Buffer,
        /// the key to move the value to
        new_key: Buffer,
    },
    /// liveness check
    Ping,
    /// end the session
    Quit,
}

/// splits at the first space, if any; neither half contains the separator
fn split_first_space(bytes: &[u8]) -> (&[u8], Option<&[u8]>) {
    match bytes.iter().position(|&b| b == b' ') {
        Some(pos) => (&bytes[..pos], Some(&bytes[pos + 1..])),
        None => (bytes, None),
    }
}

fn invalid(verb: &str) -> KvError {
    KvError::Protocol(format!("Invalid {} command format", verb))
}

impl Request {
    /// Parses one terminator-stripped request line.
    ///
    /// The verb is everything up to the first space. Single-key verbs take
    /// the whole remainder of the line as the key; `SET` and `RENAME` split
    /// the key off at the next space and take the remainder as the value
    /// (respectively the new key), spaces included.
    ///
    /// # Errors
    /// [`KvError::Protocol`] carrying the reply text for unknown verbs and
    /// malformed argument shapes; the store is never consulted for these.
    pub fn parse(line: &[u8]) -> crate::Result<Request> {
        let (verb, rest) = split_first_space(line);
        match verb {
            b"SET" => {
                let rest = rest.ok_or_else(|| invalid("SET"))?;
                let (key, value) = split_first_space(rest);
                let value = value.ok_or_else(|| invalid("SET"))?;
                if key.is_empty() {
                    return Err(invalid("SET"));
                }
                Ok(Request::Set {
                    key: Buffer::from(key),
                    value: Buffer::from(value),
                })
            }
            b"GET" => Ok(Request::Get {
                key: single_key(rest, "GET")?,
            }),
            b"DEL" => Ok(Request::Del {
                key: single_key(rest, "DEL")?,
            }),
            b"EXISTS" => Ok(Request::Exists {
                key: single_key(rest, "EXISTS")?,
            }),
            b"RENAME" => {
                let rest = rest.ok_or_else(|| invalid("RENAME"))?;
                let (old_key, new_key) = split_first_space(rest);
                let new_key = new_key.ok_or_else(|| invalid("RENAME"))?;
                if old_key.is_empty() || new_key.is_empty() {
                    return Err(invalid("RENAME"));
                }
                Ok(Request::Rename {
                    old_key: Buffer::from(old_key),
                    new_key: Buffer::from(new_key),
                })
            }
            b"PING" => match rest {
                None => Ok(Request::Ping),
                Some(_) => Err(invalid("PING")),
            },
            b"QUIT" => match rest {
                None => Ok(Request::Quit),
                Some(_) => Err(invalid("QUIT")),
            },
            _ => Err(KvError::Protocol("Unknown Command".to_string())),
        }
    }
}

fn single_key(rest: Option<&[u8]>, verb: &str) -> crate::Result<Buffer> {
    match rest {
        Some(key) if !key.is_empty() => Ok(Buffer::from(key)),
        _ => Err(invalid(verb)),
    }
}

/// One reply line, formatted with the wire protocol's kind prefixes.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `+OK`: the operation succeeded
    Ok,
    /// `+PONG`: answer to a PING
    Pong,
    /// `$<bytes>`: a bulk value
    Value(Buffer),
    /// `$-1`: the looked-up key is absent
    Null,
    /// `:1` or `:0`: a boolean result
    Bool(bool),
    /// `-ERROR <text>`: the request failed
    Err(String),
}

impl Reply {
    /// Formats a failed request as an error reply. Protocol errors carry
    /// the exact reply text already, so they are unwrapped to their bare
    /// message rather than the Display form.
    pub fn from_error(e: KvError) -> Reply {
        match e {
            KvError::Protocol(msg) => Reply::Err(msg),
            other => Reply::Err(other.to_string()),
        }
    }

    /// encodes this reply as one CRLF-terminated line of bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Reply::Ok => out.extend_from_slice(b"+OK"),
            Reply::Pong => out.extend_from_slice(b"+PONG"),
            Reply::Value(value) => {
                out.push(b'$');
                out.extend_from_slice(value);
            }
            Reply::Null => out.extend_from_slice(b"$-1"),
            Reply::Bool(true) => out.extend_from_slice(b":1"),
            Reply::Bool(false) => out.extend_from_slice(b":0"),
            Reply::Err(msg) => {
                out.extend_from_slice(b"-ERROR ");
                out.extend_from_slice(msg.as_bytes());
            }
        }
        out.extend_from_slice(b"\r\n");
        out
    }
}

/// Runs one parsed request against the engine and formats the reply.
///
/// Key-not-found results come back through the normal reply vocabulary
/// (`$-1`, `:0`, or the DEL/RENAME error strings); engine failures surface
/// as error replies via [`Reply::from_error`]. `QUIT` earns its `+OK` here,
/// while closing the connection afterwards is the server loop's job.
pub fn dispatch<E: KvEngine>(engine: &E, request: Request) -> Reply {
    match request {
        Request::Set { key, value } => match engine.set(&key, &value) {
            Ok(()) => Reply::Ok,
            Err(e) => Reply::from_error(e),
        },
        Request::Get { key } => match engine.get(&key) {
            Ok(Some(value)) => Reply::Value(value),
            Ok(None) => Reply::Null,
            Err(e) => Reply::from_error(e),
        },
        Request::Del { key } => match engine.del(&key) {
            Ok(true) => Reply::Ok,
            Ok(false) => Reply::Err("Key not found or already deleted".to_string()),
            Err(e) => Reply::from_error(e),
        },
        Request::Exists { key } => match engine.exists(&key) {
            Ok(present) => Reply::Bool(present),
            Err(e) => Reply::from_error(e),
        },
        Request::Rename { old_key, new_key } => match engine.rename(&old_key, &new_key) {
            Ok(true) => Reply::Ok,
            Ok(false) => Reply::Err("Key not found".to_string()),
            Err(e) => Reply::from_error(e),
        },
        Request::Ping => Reply::Pong,
        Request::Quit => Reply::Ok,
    }
}

#[cfg(test)]
mod tests {
    use super::{Reply, Request};
    use crate::buffer::Buffer;

    fn parse_err(line: &[u8]) -> String {
        match Request::parse(line) {
            Err(crate::KvError::Protocol(msg)) => msg,
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn parses_set_with_plain_value() {
        assert_eq!(
            Request::parse(b"SET foo bar").unwrap(),
            Request::Set {
                key: Buffer::from("foo"),
                value: Buffer::from("bar"),
            }
        );
    }

    #[test]
    fn set_value_keeps_embedded_spaces() {
        assert_eq!(
            Request::parse(b"SET k hello wide world").unwrap(),
            Request::Set {
                key: Buffer::from("k"),
                value: Buffer::from("hello wide world"),
            }
        );
    }

    #[test]
    fn set_without_value_is_invalid() {
        assert_eq!(parse_err(b"SET onlykey"), "Invalid SET command format");
        assert_eq!(parse_err(b"SET"), "Invalid SET command format");
    }

    #[test]
    fn parses_single_key_verbs() {
        assert_eq!(
            Request::parse(b"GET foo").unwrap(),
            Request::Get {
                key: Buffer::from("foo")
            }
        );
        assert_eq!(
            Request::parse(b"DEL foo").unwrap(),
            Request::Del {
                key: Buffer::from("foo")
            }
        );
        assert_eq!(
            Request::parse(b"EXISTS foo").unwrap(),
            Request::Exists {
                key: Buffer::from("foo")
            }
        );
    }

    #[test]
    fn single_key_verbs_require_a_key() {
        assert_eq!(parse_err(b"GET"), "Invalid GET command format");
        assert_eq!(parse_err(b"GET "), "Invalid GET command format");
        assert_eq!(parse_err(b"DEL"), "Invalid DEL command format");
        assert_eq!(parse_err(b"EXISTS"), "Invalid EXISTS command format");
    }

    #[test]
    fn parses_rename() {
        assert_eq!(
            Request::parse(b"RENAME a b").unwrap(),
            Request::Rename {
                old_key: Buffer::from("a"),
                new_key: Buffer::from("b"),
            }
        );
        assert_eq!(parse_err(b"RENAME a"), "Invalid RENAME command format");
    }

    #[test]
    fn parses_ping_and_quit() {
        assert_eq!(Request::parse(b"PING").unwrap(), Request::Ping);
        assert_eq!(Request::parse(b"QUIT").unwrap(), Request::Quit);
        assert_eq!(parse_err(b"PING extra"), "Invalid PING command format");
    }

    #[test]
    fn unknown_verbs_are_rejected_before_the_store() {
        assert_eq!(parse_err(b"FLUSH"), "Unknown Command");
        assert_eq!(parse_err(b""), "Unknown Command");
        assert_eq!(parse_err(b"set foo bar"), "Unknown Command"); // verbs are case-sensitive
    }

    #[test]
    fn arguments_may_contain_arbitrary_bytes() {
        let line = [b'G', b'E', b'T', b' ', 0x00, 0xff, b'k'];
        assert_eq!(
            Request::parse(&line).unwrap(),
            Request::Get {
                key: Buffer::from(&[0x00, 0xff, b'k'][..])
            }
        );
    }

    #[test]
    fn replies_format_with_crlf() {
        assert_eq!(Reply::Ok.to_bytes(), b"+OK\r\n");
        assert_eq!(Reply::Pong.to_bytes(), b"+PONG\r\n");
        assert_eq!(Reply::Null.to_bytes(), b"$-1\r\n");
        assert_eq!(Reply::Bool(true).to_bytes(), b":1\r\n");
        assert_eq!(Reply::Bool(false).to_bytes(), b":0\r\n");
        assert_eq!(
            Reply::Value(Buffer::from("bar")).to_bytes(),
            b"$bar\r\n".to_vec()
        );
        assert_eq!(
            Reply::Err("Unknown Command".to_string()).to_bytes(),
            b"-ERROR Unknown Command\r\n".to_vec()
        );
    }

    #[test]
    fn parse_errors_unwrap_to_their_reply_text() {
        let e = Request::parse(b"NOPE").unwrap_err();
        assert_eq!(
            Reply::from_error(e).to_bytes(),
            b"-ERROR Unknown Command\r\n".to_vec()
        );
    }

    #[test]
    fn bulk_reply_carries_raw_bytes() {
        let reply = Reply::Value(Buffer::from(&[0x00, b'x', 0xfe][..]));
        assert_eq!(reply.to_bytes(), [b'$', 0x00, b'x', 0xfe, b'\r', b'\n']);
    }
}
