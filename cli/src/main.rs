use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use fskit_core::{ExtraArg, ToolLocator};
use fskit_filesystems::families::udf;
use fskit_filesystems::{
    ensure_available, get_fstype, ops, CapabilityMode, FilesystemType, FsInfo, UdfMkfsOptions,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fskit")]
#[command(about = "Filesystem maintenance via the platform's native tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether operations are available for a filesystem type
    Can {
        /// Filesystem type (f2fs, udf)
        fs: String,
        /// Comma-separated operations (mkfs, wipe, query, check, repair,
        /// resize, set-label, set-uuid)
        modes: String,
    },
    /// Create a new filesystem
    Mkfs {
        /// Filesystem type (f2fs, udf)
        fs: String,
        /// Target block device
        device: PathBuf,
        /// Extra tool argument, OPT or OPT=VAL (repeatable)
        #[arg(short = 'e', long = "extra")]
        extra: Vec<String>,
        /// Media type hint (udf only)
        #[arg(long)]
        media_type: Option<String>,
        /// On-disk format revision (udf only)
        #[arg(long)]
        revision: Option<String>,
        /// Block size in bytes (udf only)
        #[arg(long)]
        block_size: Option<u32>,
    },
    /// Show filesystem metadata
    Info {
        fs: String,
        device: PathBuf,
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check filesystem consistency
    Check {
        fs: String,
        device: PathBuf,
        #[arg(short = 'e', long = "extra")]
        extra: Vec<String>,
    },
    /// Check and repair filesystem consistency
    Repair {
        fs: String,
        device: PathBuf,
        #[arg(short = 'e', long = "extra")]
        extra: Vec<String>,
    },
    /// Resize a filesystem (sectors; 0 fits the underlying device)
    Resize {
        fs: String,
        device: PathBuf,
        new_size: u64,
        /// Allow shrinking
        #[arg(long)]
        safe: bool,
    },
    /// Set the filesystem label
    SetLabel {
        fs: String,
        device: PathBuf,
        label: String,
    },
    /// Set the filesystem UUID (random when omitted)
    SetUuid {
        fs: String,
        device: PathBuf,
        uuid: Option<String>,
    },
    /// Detect the filesystem signature on a device
    Fstype { device: PathBuf },
    /// Wipe filesystem signatures from a device
    Wipe {
        device: PathBuf,
        /// Only wipe if the device carries this filesystem
        #[arg(long)]
        fs: Option<String>,
        /// Wipe every signature, not just the first detected type
        #[arg(long)]
        all: bool,
    },
}

fn parse_fs(s: &str) -> anyhow::Result<FilesystemType> {
    s.parse()
        .with_context(|| format!("'{}' is not a supported filesystem type", s))
}

fn parse_extra(raw: &[String]) -> Vec<ExtraArg> {
    raw.iter()
        .map(|item| match item.split_once('=') {
            Some((opt, val)) => ExtraArg::new(opt, val),
            None => ExtraArg::new(item.as_str(), ""),
        })
        .collect()
}

fn print_info(info: &FsInfo) {
    match info {
        FsInfo::F2fs(fi) => {
            println!("Type:         f2fs");
            println!("Label:        {}", fi.label);
            println!("UUID:         {}", fi.uuid);
            println!("Sector size:  {}", fi.sector_size);
            println!("Sector count: {}", fi.sector_count);
            println!("Features:     {:?}", fi.features);
        }
        FsInfo::Udf(fi) => {
            println!("Type:         udf");
            println!("Label:        {}", fi.label);
            println!("VID:          {}", fi.vid);
            println!("LVID:         {}", fi.lvid);
            println!("UUID:         {}", fi.uuid);
            println!("Revision:     {}", fi.revision);
            println!("Block size:   {}", fi.block_size);
            println!("Block count:  {}", fi.block_count);
            println!("Free blocks:  {}", fi.free_blocks);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let locator = ToolLocator::system();

    match cli.command {
        Commands::Can { fs, modes } => {
            let fs = parse_fs(&fs)?;
            let modes: CapabilityMode = modes.parse()?;
            ensure_available(fs, modes, &locator).await?;
            println!("{}: requested operations are available", fs);
        }
        Commands::Mkfs {
            fs,
            device,
            extra,
            media_type,
            revision,
            block_size,
        } => {
            let fs = parse_fs(&fs)?;
            let extra = parse_extra(&extra);
            let has_udf_options =
                media_type.is_some() || revision.is_some() || block_size.is_some();

            match fs {
                FilesystemType::Udf => {
                    let options = UdfMkfsOptions {
                        media_type,
                        revision,
                        block_size,
                    };
                    udf::mkfs(&device, &options, &extra, &locator).await?;
                }
                other => {
                    if has_udf_options {
                        bail!("--media-type/--revision/--block-size only apply to udf");
                    }
                    ops::mkfs(other, &device, &extra, &locator).await?;
                }
            }
            println!("Created {} filesystem on {}", fs, device.display());
        }
        Commands::Info { fs, device, json } => {
            let fs = parse_fs(&fs)?;
            let info = ops::get_info(fs, &device, &locator).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_info(&info);
            }
        }
        Commands::Check { fs, device, extra } => {
            let fs = parse_fs(&fs)?;
            ops::check(fs, &device, &parse_extra(&extra), &locator).await?;
            println!("{}: clean", device.display());
        }
        Commands::Repair { fs, device, extra } => {
            let fs = parse_fs(&fs)?;
            ops::repair(fs, &device, &parse_extra(&extra), &locator).await?;
            println!("{}: repaired", device.display());
        }
        Commands::Resize {
            fs,
            device,
            new_size,
            safe,
        } => {
            let fs = parse_fs(&fs)?;
            ops::resize(fs, &device, new_size, safe, &locator).await?;
            if new_size == 0 {
                println!("Resized {} to the device size", device.display());
            } else {
                println!("Resized {} to {} sectors", device.display(), new_size);
            }
        }
        Commands::SetLabel { fs, device, label } => {
            let fs = parse_fs(&fs)?;
            ops::set_label(fs, &device, &label, &locator).await?;
            println!("Label set on {}", device.display());
        }
        Commands::SetUuid { fs, device, uuid } => {
            let fs = parse_fs(&fs)?;
            ops::set_uuid(fs, &device, uuid.as_deref(), &locator).await?;
            println!("UUID set on {}", device.display());
        }
        Commands::Fstype { device } => match get_fstype(&device, &locator).await? {
            Some(fstype) => println!("{}", fstype),
            None => println!("(no signature detected)"),
        },
        Commands::Wipe { device, fs, all } => {
            match fs {
                Some(fs) => {
                    let fs = parse_fs(&fs)?;
                    ops::wipe(fs, &device, &locator).await?;
                }
                None => ops::wipe_any(&device, all, &locator).await?,
            }
            println!("Wiped signatures from {}", device.display());
        }
    }

    Ok(())
}
