use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, error, info};

use crate::command::{dispatch, Reply, Request};
use crate::engine::KvEngine;
use crate::thread_pool::ThreadPool;
use crate::Result;

/// A TCP server speaking the line protocol over a key-value engine.
///
/// The accept loop hands each connection to the thread pool; workers run
/// independently and coordinate only through the shared engine handle, so a
/// connection that errors out (or panics) never disturbs the others.
pub struct KvServer<E: KvEngine, P: ThreadPool> {
    engine: E,
    pool: P,
}

impl<E: KvEngine, P: ThreadPool> KvServer<E, P> {
    /// creates a server over the given engine and thread pool
    pub fn new(engine: E, pool: P) -> Self {
        KvServer { engine, pool }
    }

    /// Binds `addr` and serves connections until the process exits.
    ///
    /// # Errors
    /// returns an error only if the listener cannot be bound; per-connection
    /// failures are logged and absorbed.
    pub fn run<A: ToSocketAddrs>(self, addr: A) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        info!("listening on {}", listener.local_addr()?);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let engine = self.engine.clone();
                    self.pool.spawn(move || {
                        if let Err(e) = serve(engine, stream) {
                            error!("error serving client: {}", e);
                        }
                    });
                }
                Err(e) => error!("connection failed: {}", e),
            }
        }
        Ok(())
    }
}

/// One connection's request/reply loop.
///
/// Reads one line per request, strips the terminator (`\n`, or `\r\n`),
/// parses and dispatches it, and writes the CRLF-terminated reply back.
/// One carriage return before the terminator is always taken as CRLF
/// framing, so with bare-`\n` framing an argument cannot end in `0x0d`;
/// CRLF-framed requests carry it fine. Returns on end-of-stream or after
/// answering `QUIT`. Disconnecting without `QUIT` simply ends the worker;
/// stored data is untouched.
fn serve<E: KvEngine>(engine: E, tcp: TcpStream) -> Result<()> {
    let peer_addr = tcp.peer_addr()?;
    debug!("client connected: {}", peer_addr);

    let mut reader = BufReader::new(&tcp);
    let mut writer = BufWriter::new(&tcp);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            debug!("client disconnected: {}", peer_addr);
            return Ok(());
        }
        if line.ends_with(b"\n") {
            line.pop();
        }
        if line.ends_with(b"\r") {
            line.pop();
        }

        let request = Request::parse(&line);
        let quit = matches!(request, Ok(Request::Quit));
        let reply = match request {
            Ok(request) => {
                debug!("request from {}: {:?}", peer_addr, request);
                dispatch(&engine, request)
            }
            Err(e) => Reply::from_error(e),
        };

        writer.write_all(&reply.to_bytes())?;
        writer.flush()?;

        if quit {
            debug!("client quit: {}", peer_addr);
            return Ok(());
        }
    }
}
