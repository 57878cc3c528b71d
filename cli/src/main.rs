//! `blobfs`: browse a bucket as a read-only filesystem.
//!
//! ```text
//! blobfs --config blobfs.toml ls css
//! blobfs --bucket ./dist --prefix site tree
//! ```

mod commands;
mod config;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Browse a bucket as a read-only filesystem.
#[derive(Parser, Debug)]
#[command(
    name = "blobfs",
    about = "Browse a flat object bucket as a read-only filesystem",
    long_about = "Browse a flat object bucket as a read-only filesystem.\n\n\
        The bucket and the root prefix are read from a TOML config file \
        (blobfs.toml by default). Missing files fall back to a filesystem \
        bucket in the working directory rooted at \"v1/\".\n\
        \n\
        EXAMPLES:\n\
          # List the root of the configured view\n\
          blobfs ls\n\
        \n\
          # Print a file from a local bucket directory\n\
          blobfs --bucket ./dist --prefix site cat index.html",
    version
)]
struct Args {
    /// Config file to load.
    #[arg(long, short, default_value = config::DEFAULT_CONFIG)]
    config: PathBuf,

    /// Version segment of the root prefix (overrides the config).
    #[arg(long)]
    root_version: Option<String>,

    /// Sub-path below the version segment (overrides the config).
    #[arg(long)]
    prefix: Option<String>,

    /// Local bucket directory; selects a filesystem bucket.
    #[arg(long)]
    bucket: Option<String>,

    /// Entries per listing request.
    #[arg(long, default_value_t = blobfs::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory.
    Ls {
        #[arg(default_value = ".")]
        path: String,
    },
    /// Print a file.
    Cat { path: String },
    /// Show kind, size and modification time.
    Stat { path: String },
    /// Print the tree below a directory.
    Tree {
        #[arg(default_value = ".")]
        path: String,
    },
}

fn run(args: Args) -> Result<(), String> {
    let mut config = config::load_or_default(&args.config)?;
    if let Some(version) = args.root_version {
        config.root.version = version;
    }
    if let Some(prefix) = args.prefix {
        config.root.prefix = prefix;
    }
    if let Some(bucket) = args.bucket {
        config.bucket.r#type = "filesystem".into();
        config.bucket.path = bucket;
    }

    let fs = config::build_fs(&config)?.with_page_size(args.page_size);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match &args.command {
        Command::Ls { path } => commands::ls(&fs, path, &mut out),
        Command::Cat { path } => commands::cat(&fs, path, &mut out),
        Command::Stat { path } => commands::stat(&fs, path, &mut out),
        Command::Tree { path } => commands::tree(&fs, path, &mut out),
    };
    result.and_then(|()| out.flush()).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("blobfs: {e}");
            ExitCode::FAILURE
        }
    }
}
