//! The bytekv-client executable supports the following command line arguments:
//!
//! `bytekv-client set <KEY> <VALUE> [--addr IP-PORT]`
//!
//!     Store the value under the key.
//!
//! `bytekv-client get <KEY> [--addr IP-PORT]`
//!
//!     Print the value stored under the key, or "Key not found".
//!
//! `bytekv-client del <KEY> [--addr IP-PORT]`
//!
//!     Remove the key. A missing key is treated as an error and exits non-zero.
//!
//! `bytekv-client exists <KEY> [--addr IP-PORT]`
//!
//!     Print 1 if the key holds a value, 0 otherwise.
//!
//! `bytekv-client rename <OLD_KEY> <NEW_KEY> [--addr IP-PORT]`
//!
//!     Move the value to a new key. A missing old key exits non-zero.
//!
//! `bytekv-client ping [--addr IP-PORT]`
//!
//!     Check that the server answers.
//!
//! `--addr` accepts an IP address (v4 or v6) and a port number, formatted as
//! IP:PORT. If not specified the client connects to 127.0.0.1:6379.

use std::io::Write;
use std::net::SocketAddr;
use std::process::exit;

use clap::{crate_version, App, Arg, ArgMatches, SubCommand};
use bytekv::{KvClient, KvError, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:6379";

/// the request the user asked for on the command line
#[derive(Debug)]
enum Cmd {
    Set { key: String, value: String },
    Get { key: String },
    Del { key: String },
    Exists { key: String },
    Rename { old_key: String, new_key: String },
    Ping,
}

/// [`Opt`] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    cmd: Cmd,
}

impl Opt {
    fn build(addr: &str, cmd: Cmd) -> Result<Opt> {
        let addr: SocketAddr = addr.parse().map_err(|_| {
            KvError::Parsing(format!("could not parse {} into an IP address and port", addr))
        })?;
        Ok(Opt { addr, cmd })
    }
}

fn main() {
    // configure a subscriber that will log messages to STDERR
    subscriber_config();

    let matches = App::new("bytekv-client")
        .version(crate_version!())
        .about("client for the bytekv key-value store")
        .subcommands(vec![
            SubCommand::with_name("set")
                .about("Store a value under a key")
                .arg(Arg::with_name("KEY").required(true).index(1))
                .arg(Arg::with_name("VALUE").required(true).index(2)),
            SubCommand::with_name("get")
                .about("Print the value stored under a key")
                .arg(Arg::with_name("KEY").required(true).index(1)),
            SubCommand::with_name("del")
                .about("Remove a key")
                .arg(Arg::with_name("KEY").required(true).index(1)),
            SubCommand::with_name("exists")
                .about("Check whether a key holds a value")
                .arg(Arg::with_name("KEY").required(true).index(1)),
            SubCommand::with_name("rename")
                .about("Move a value to a new key")
                .arg(Arg::with_name("OLD_KEY").required(true).index(1))
                .arg(Arg::with_name("NEW_KEY").required(true).index(2)),
            SubCommand::with_name("ping").about("Check that the server answers"),
        ])
        .arg(
            Arg::with_name("addr")
                .long("addr")
                .value_name("IP_ADDR:PORT")
                .help("sets the IP_ADDR:PORT of the server to connect to")
                .global(true)
                .default_value(DEFAULT_ADDRESS),
        )
        .get_matches();

    let result = parse_options(&matches).and_then(run);
    if let Err(e) = result {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    let mut client = KvClient::connect(opt.addr)?;
    match opt.cmd {
        Cmd::Set { key, value } => {
            client.set(key.as_bytes(), value.as_bytes())?;
        }
        Cmd::Get { key } => match client.get(key.as_bytes())? {
            Some(value) => {
                let mut stdout = std::io::stdout();
                stdout.write_all(&value)?;
                stdout.write_all(b"\n")?;
            }
            None => println!("Key not found"),
        },
        Cmd::Del { key } => {
            if !client.del(key.as_bytes())? {
                return Err(KvError::Server(
                    "Key not found or already deleted".to_string(),
                ));
            }
        }
        Cmd::Exists { key } => {
            let present = client.exists(key.as_bytes())?;
            println!("{}", if present { 1 } else { 0 });
        }
        Cmd::Rename { old_key, new_key } => {
            if !client.rename(old_key.as_bytes(), new_key.as_bytes())? {
                return Err(KvError::Server("Key not found".to_string()));
            }
        }
        Cmd::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }
    client.quit()
}

/// parses the matches from the command line into an [`Opt`] struct
fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let addr = matches.value_of("addr").unwrap();
    let cmd = match matches.subcommand() {
        ("set", Some(args)) => Cmd::Set {
            key: args.value_of("KEY").map(String::from).unwrap(),
            value: args.value_of("VALUE").map(String::from).unwrap(),
        },
        ("get", Some(args)) => Cmd::Get {
            key: args.value_of("KEY").map(String::from).unwrap(),
        },
        ("del", Some(args)) => Cmd::Del {
            key: args.value_of("KEY").map(String::from).unwrap(),
        },
        ("exists", Some(args)) => Cmd::Exists {
            key: args.value_of("KEY").map(String::from).unwrap(),
        },
        ("rename", Some(args)) => Cmd::Rename {
            old_key: args.value_of("OLD_KEY").map(String::from).unwrap(),
            new_key: args.value_of("NEW_KEY").map(String::from).unwrap(),
        },
        ("ping", Some(_)) => Cmd::Ping,
        _ => {
            return Err(KvError::Parsing(
                "no command given; see --help for usage".to_string(),
            ))
        }
    };
    Opt::build(addr, cmd)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
