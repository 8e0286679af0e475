use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mountfs::MountFileSystem;
use mountfs_core::{Error, FileSystem, LocalityConfig, LogicalPath, MountConfig, PeerEndpoint};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod bench;

/// mountfs-bench - streaming write, scan and random-read benchmarks
#[derive(Parser, Debug)]
#[command(name = "mountfs-bench")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Physical directory where the filesystem is mounted
    #[arg(long)]
    mount_root: PathBuf,

    /// Peer daemon (host:port) answering locality queries
    #[arg(long)]
    peer: Option<PeerEndpoint>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a file of the given size in 1 MiB chunks
    Write {
        path: String,
        /// Size in GiB
        #[arg(default_value_t = 1)]
        size_gb: u64,
    },
    /// Read the file sequentially in 4 KiB buffers
    Scan { path: String },
    /// 4 KiB reads at random offsets
    Rread {
        path: String,
        /// Number of reads; one per 4 KiB of file by default
        #[arg(long)]
        count: Option<u64>,
    },
}

fn run(args: Args) -> mountfs_core::Result<()> {
    let mut config = MountConfig::new(args.mount_root).with_working_directory("/");
    if let Some(peer) = args.peer {
        config = config.with_peer(peer).with_locality(LocalityConfig::Remote);
    }
    let fs = MountFileSystem::new(config)?;
    println!("Running benchmark for filesystem {}", fs.uri());

    let report = match args.command {
        Command::Write { path, size_gb } => {
            let path = LogicalPath::parse(&path)?;
            let total = bench::gib_to_bytes(size_gb).ok_or_else(|| {
                Error::invalid_config(format!("write size of {} GiB is too large", size_gb))
            })?;
            bench::write(&fs, &path, total)?
        }
        Command::Scan { path } => bench::scan(&fs, &LogicalPath::parse(&path)?)?,
        Command::Rread { path, count } => {
            let path = LogicalPath::parse(&path)?;
            bench::random_read(&fs, &path, count, &mut rand::thread_rng())?
        }
    };

    println!(
        "{}: {} bytes in {} ops, {} ms",
        report.operation,
        report.bytes,
        report.ops,
        report.elapsed.as_millis()
    );
    println!("MB/s: {:.2}", report.megabytes_per_sec());
    println!("Average ms / op: {:.4}", report.millis_per_op());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "mountfs=info,warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
