//! bmfs - Create and inspect BMFS disk images
//!
//! Usage:
//!   bmfs disk.img format -s 64M           # Create and format a 64MB image
//!   bmfs disk.img mkdir /boot             # Create a directory
//!   bmfs disk.img touch /boot/kernel.bin  # Create a file (2MB region)
//!   bmfs disk.img ls /boot                # List a directory
//!   bmfs disk.img info                    # Header and allocation summary
//!
//! Set RUST_LOG to control log output; --verbose defaults it to debug.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use bmfs::layout::{BLOCK_SIZE, MIN_TOTAL_SIZE};
use bmfs::{Bmfs, Clock, Disk, EntryType, FsOptions};
use bmfs_disk::FileDisk;

#[derive(Parser, Debug)]
#[command(name = "bmfs")]
#[command(about = "Create and inspect BMFS disk images")]
struct Args {
    /// Disk image file
    image: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Refuse to create a name that already exists in its directory
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create (or truncate) the image and format it
    Format {
        /// Disk size (e.g., 64M, 1G)
        #[arg(short, long)]
        size: String,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Create an empty file
    Touch { path: String },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show header and allocation table summary
    Info,
    /// Verify the header signature
    Check,
    /// Delete a file (unsupported by the format)
    Rm { path: String },
}

fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_uppercase();
    let (num_str, mult) = if s.ends_with('G') || s.ends_with("GB") {
        (
            s.trim_end_matches("GB").trim_end_matches('G'),
            1024 * 1024 * 1024,
        )
    } else if s.ends_with('M') || s.ends_with("MB") {
        (s.trim_end_matches("MB").trim_end_matches('M'), 1024 * 1024)
    } else if s.ends_with('K') || s.ends_with("KB") {
        (s.trim_end_matches("KB").trim_end_matches('K'), 1024)
    } else {
        (s.as_str(), 1)
    };

    num_str.parse::<u64>().ok()?.checked_mul(mult)
}

fn type_label(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Directory => "dir",
        EntryType::File => "file",
        EntryType::Unknown => "?",
    }
}

/// Run one command against an open volume
fn execute<D: Disk, C: Clock>(
    fs: &mut Bmfs<D, C>,
    command: Command,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Format { .. } => bail!("format creates its own image"),
        Command::Mkdir { path } => {
            let entry = fs
                .create_dir(&path)
                .with_context(|| format!("mkdir {}", path))?;
            writeln!(out, "Created directory {} at {:#x}", path, entry.offset)?;
        }
        Command::Touch { path } => {
            let entry = fs
                .create_file(&path)
                .with_context(|| format!("touch {}", path))?;
            writeln!(out, "Created file {} at {:#x}", path, entry.offset)?;
        }
        Command::Ls { path } => {
            let entries = fs
                .read_dir(&path)
                .with_context(|| format!("ls {}", path))?;
            for entry in &entries {
                writeln!(
                    out,
                    "{:<4} {:>#12x} {:>12} {}",
                    type_label(entry.entry_type),
                    entry.offset,
                    entry.modification_time,
                    entry.name_str()
                )?;
            }
        }
        Command::Info => {
            let header = fs.header()?;
            let stats = fs.stats()?;
            writeln!(out, "BMFS volume")?;
            writeln!(
                out,
                "  Size:          {} bytes ({} blocks)",
                header.total_size,
                header.total_size / BLOCK_SIZE
            )?;
            writeln!(
                out,
                "  Table:         {:#x}, {}/{} entries",
                header.table_offset,
                stats.table_entries,
                stats.table_capacity
            )?;
            writeln!(out, "  Root entry:    {:#x}", header.root_offset)?;
            writeln!(out, "  Reserved:      {} bytes", stats.reserved_bytes)?;
            writeln!(out, "  Used:          {} bytes", stats.used_bytes)?;
            writeln!(out, "  Free:          {} bytes", stats.free_bytes)?;

            if log::log_enabled!(log::Level::Debug) {
                for (i, entry) in fs.table_entries()?.iter().enumerate() {
                    log::debug!(
                        "table[{}]: offset={:#x} used={} reserved={}",
                        i,
                        entry.offset,
                        entry.used,
                        entry.reserved
                    );
                }
            }
        }
        Command::Check => {
            fs.check_signature()?;
            writeln!(out, "Signature OK")?;
        }
        Command::Rm { path } => {
            fs.delete_file(&path)
                .with_context(|| format!("rm {}", path))?;
        }
    }
    Ok(())
}

fn run(args: Args, out: &mut dyn Write) -> Result<()> {
    let options = FsOptions {
        reject_duplicates: args.strict,
    };

    if let Command::Format { size } = &args.command {
        let size = parse_size(size)
            .ok_or_else(|| anyhow!("invalid size format: {}", size))?;
        if size < MIN_TOTAL_SIZE {
            bail!("disk size must be at least {} bytes", MIN_TOTAL_SIZE);
        }

        let disk = FileDisk::create(&args.image, size)
            .with_context(|| format!("creating {}", args.image.display()))?;
        let mut fs = Bmfs::new(disk).with_options(options);
        fs.format(size)?;
        fs.into_disk()?;

        writeln!(
            out,
            "Formatted {}: {} bytes ({} blocks)",
            args.image.display(),
            size,
            size / BLOCK_SIZE
        )?;
        return Ok(());
    }

    let disk = FileDisk::open(&args.image)
        .with_context(|| format!("opening {}", args.image.display()))?;
    let mut fs = Bmfs::mount(disk)
        .with_context(|| format!("mounting {}", args.image.display()))?
        .with_options(options);

    execute(&mut fs, args.command, out)?;
    fs.into_disk()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(args, &mut out)
}
