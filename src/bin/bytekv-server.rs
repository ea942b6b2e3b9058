//! this binary starts the bytekv server
//! to see the list of options, type: `bytekv-server --help`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::exit;

use clap::{crate_version, App, Arg};
use bytekv::{
    KvError, KvServer, NaiveThreadPool, RayonThreadPool, Result, SharedQueueThreadPool, Store,
    ThreadPool,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:6379";
const DEFAULT_THREADS: &str = "8";
const DEFAULT_POOL: &str = "shared";

/// [`Opt`] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    data_dir: PathBuf,
    threads: u32,
    pool: Pool,
}

#[derive(Debug, Copy, Clone)]
enum Pool {
    Shared,
    Naive,
    Rayon,
}

impl Opt {
    /// validates the raw flag values
    /// # Errors
    /// returns [`KvError::Parsing`] if one of the parameters is invalid
    fn build(addr: &str, data_dir: &str, threads: &str, pool: &str) -> Result<Opt> {
        let addr: SocketAddr = addr.parse().map_err(|_| {
            KvError::Parsing(format!("could not parse {} into an IP address and port", addr))
        })?;
        let threads: u32 = threads
            .parse()
            .map_err(|_| KvError::Parsing(format!("invalid thread count: {}", threads)))?;
        let pool = match pool {
            "shared" => Pool::Shared,
            "naive" => Pool::Naive,
            "rayon" => Pool::Rayon,
            other => return Err(KvError::Parsing(format!("unknown thread pool: {}", other))),
        };
        Ok(Opt {
            addr,
            data_dir: PathBuf::from(data_dir),
            threads,
            pool,
        })
    }
}

fn main() {
    // set up a tracing subscriber to log to STDERR
    subscriber_config();

    let matches = App::new("bytekv-server")
        .version(crate_version!())
        .about("a binary-safe, persistent key-value store server")
        .arg(
            Arg::with_name("addr")
                .long("addr")
                .value_name("IP_ADDR:PORT")
                .help("sets the IP_ADDR:PORT that the server listens on")
                .default_value(DEFAULT_ADDRESS),
        )
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("sets the directory holding the durability log")
                .default_value("."),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .value_name("N")
                .help("sets the number of connection worker threads")
                .default_value(DEFAULT_THREADS),
        )
        .arg(
            Arg::with_name("pool")
                .long("pool")
                .value_name("POOL_NAME")
                .help("sets the thread pool to use: 'shared', 'naive' or 'rayon'")
                .possible_values(&["shared", "naive", "rayon"])
                .default_value(DEFAULT_POOL),
        )
        .get_matches();

    let opt = match Opt::build(
        matches.value_of("addr").unwrap(),
        matches.value_of("data-dir").unwrap(),
        matches.value_of("threads").unwrap(),
        matches.value_of("pool").unwrap(),
    ) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("bytekv-server {}", env!("CARGO_PKG_VERSION"));
    info!("data directory: {:?}", opt.data_dir);
    info!("thread pool: {:?} with {} threads", opt.pool, opt.threads);

    let engine = Store::open(&opt.data_dir)?;
    match opt.pool {
        Pool::Shared => serve(engine, SharedQueueThreadPool::new(opt.threads)?, opt.addr),
        Pool::Naive => serve(engine, NaiveThreadPool::new(opt.threads)?, opt.addr),
        Pool::Rayon => serve(engine, RayonThreadPool::new(opt.threads)?, opt.addr),
    }
}

fn serve<P: ThreadPool>(engine: Store, pool: P, addr: SocketAddr) -> Result<()> {
    KvServer::new(engine, pool).run(addr)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}
