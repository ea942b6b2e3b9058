use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{KvError, Result};

/// A synchronous client for the line protocol served by [`KvServer`].
///
/// Requests and replies are single lines, so keys and values containing a
/// line break cannot travel over the wire even though the store itself
/// holds them fine; that is a limit of the protocol, not of this client.
/// Likewise a stored value of exactly `-1` reads back as the `$-1` null
/// sentinel and is indistinguishable from an absent key. The one carriage
/// return before a line terminator belongs to CRLF framing, so this client
/// always frames with CRLF; a hand-rolled client framing with a bare `\n`
/// loses a trailing `0x0d` from its last argument.
///
/// [`KvServer`]: crate::KvServer
pub struct KvClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

/// a reply line decoded by its kind prefix
#[derive(Debug)]
enum RawReply {
    /// `+<status>`
    Status(Vec<u8>),
    /// `$<bytes>`
    Bulk(Vec<u8>),
    /// `$-1`
    Null,
    /// `:<n>`
    Int(i64),
    /// `-ERROR <text>`
    Error(String),
}

impl KvClient {
    /// establishes a connection to the server at `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let tcp_reader = TcpStream::connect(addr)?;
        let tcp_writer = tcp_reader.try_clone()?;
        Ok(KvClient {
            reader: BufReader::new(tcp_reader),
            writer: BufWriter::new(tcp_writer),
        })
    }

    /// stores `value` under `key`
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut line = Vec::with_capacity(4 + key.len() + 1 + value.len());
        line.extend_from_slice(b"SET ");
        line.extend_from_slice(key);
        line.push(b' ');
        line.extend_from_slice(value);
        match self.request(&line)? {
            RawReply::Status(ref s) if s == b"OK" => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// fetches the value stored under `key`, or `None` if the key is absent
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.request(&verb_line(b"GET", key))? {
            RawReply::Bulk(value) => Ok(Some(value)),
            RawReply::Null => Ok(None),
            other => Err(unexpected(other)),
        }
    }

    /// removes `key`; returns whether it existed
    pub fn del(&mut self, key: &[u8]) -> Result<bool> {
        match self.request(&verb_line(b"DEL", key))? {
            RawReply::Status(ref s) if s == b"OK" => Ok(true),
            RawReply::Error(ref msg) if msg.starts_with("Key not found") => Ok(false),
            other => Err(unexpected(other)),
        }
    }

    /// returns whether `key` currently holds a value
    pub fn exists(&mut self, key: &[u8]) -> Result<bool> {
        match self.request(&verb_line(b"EXISTS", key))? {
            RawReply::Int(1) => Ok(true),
            RawReply::Int(0) => Ok(false),
            other => Err(unexpected(other)),
        }
    }

    /// moves the value under `old_key` to `new_key`; returns `false` if
    /// `old_key` is absent
    pub fn rename(&mut self, old_key: &[u8], new_key: &[u8]) -> Result<bool> {
        let mut line = Vec::with_capacity(7 + old_key.len() + 1 + new_key.len());
        line.extend_from_slice(b"RENAME ");
        line.extend_from_slice(old_key);
        line.push(b' ');
        line.extend_from_slice(new_key);
        match self.request(&line)? {
            RawReply::Status(ref s) if s == b"OK" => Ok(true),
            RawReply::Error(ref msg) if msg.starts_with("Key not found") => Ok(false),
            other => Err(unexpected(other)),
        }
    }

    /// liveness check; errors unless the server answers `+PONG`
    pub fn ping(&mut self) -> Result<()> {
        match self.request(b"PING")? {
            RawReply::Status(ref s) if s == b"PONG" => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// ends the session; the server acknowledges and closes the connection
    pub fn quit(mut self) -> Result<()> {
        match self.request(b"QUIT")? {
            RawReply::Status(ref s) if s == b"OK" => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Sends one request line and decodes the one reply line it earns.
    /// Requests are framed with CRLF, so a payload ending in a carriage
    /// return is not mistaken for framing by the server.
    fn request(&mut self, line: &[u8]) -> Result<RawReply> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\r\n")?;
        self.writer.flush()?;
        self.read_reply()
    }

    fn read_reply(&mut self) -> Result<RawReply> {
        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            return Err(KvError::Protocol(
                "connection closed before a reply arrived".to_string(),
            ));
        }
        if line.ends_with(b"\n") {
            line.pop();
        }
        if line.ends_with(b"\r") {
            line.pop();
        }
        if line.is_empty() {
            return Err(KvError::Protocol("empty reply line".to_string()));
        }

        let (kind, rest) = (line[0], &line[1..]);
        match kind {
            b'+' => Ok(RawReply::Status(rest.to_vec())),
            b'$' if rest == b"-1" => Ok(RawReply::Null),
            b'$' => Ok(RawReply::Bulk(rest.to_vec())),
            b':' => {
                let text = std::str::from_utf8(rest)
                    .map_err(|_| KvError::Protocol("non-numeric integer reply".to_string()))?;
                let n = text
                    .parse::<i64>()
                    .map_err(|_| KvError::Protocol("non-numeric integer reply".to_string()))?;
                Ok(RawReply::Int(n))
            }
            b'-' => {
                let msg = String::from_utf8_lossy(rest);
                let msg = msg.strip_prefix("ERROR ").unwrap_or(&msg).to_string();
                Ok(RawReply::Error(msg))
            }
            other => Err(KvError::Protocol(format!(
                "unknown reply kind prefix: 0x{:02x}",
                other
            ))),
        }
    }
}

fn verb_line(verb: &[u8], key: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(verb.len() + 1 + key.len());
    line.extend_from_slice(verb);
    line.push(b' ');
    line.extend_from_slice(key);
    line
}

fn unexpected(reply: RawReply) -> KvError {
    match reply {
        RawReply::Error(msg) => KvError::Server(msg),
        other => KvError::Protocol(format!("unexpected reply: {:?}", other)),
    }
}
