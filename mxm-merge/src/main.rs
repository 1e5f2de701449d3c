//! mxm-merge - merge one Mixxx library into another
//!
//! `merge` copies the target library to a new output file and merges the
//! source library's tracks into that copy, rewriting file paths with
//! `FROM=TO` prefix replacements. `import` turns a folder of playlists into
//! crates. `backup` snapshots the Mixxx database.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use mxm_common::config::{default_mixxx_database, default_mixxx_directory, TomlConfig};
use mxm_common::db::connect_target;
use mxm_common::normalize_path;
use mxm_merge::{
    backup_database, find_playlists, import_playlists, merge_files, parse_replacement_arg,
    CrateMap, FileMergeOptions, ImportOptions, MergeOptions, MergePaths, ReplacementTable,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for mxm-merge
#[derive(Parser, Debug)]
#[command(name = "mxm-merge")]
#[command(about = "Merge Mixxx libraries with path remapping")]
#[command(version)]
struct Cli {
    /// Config file (overrides MXM_CONFIG and the platform default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge the source library into a copy of the target library
    Merge(MergeArgs),
    /// Import a folder of m3u8 playlists as crates
    Import(ImportArgs),
    /// Back up the Mixxx library database
    Backup(BackupArgs),
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Library to copy tracks from (opened read-only)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Library to merge into (left unchanged)
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// Merged library to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix replacement, applied after the config file's entries
    #[arg(short, long = "replace", value_name = "FROM=TO")]
    replacements: Vec<String>,

    /// Run the merge and roll it back
    #[arg(long)]
    dry_run: bool,

    /// Overwrite an existing output file
    #[arg(short, long)]
    force: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Folder containing the *.m3u8 playlists
    folder: PathBuf,

    /// Library to import into (defaults to the Mixxx library)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Crate map (defaults to mixxxkit.crates.yaml in the folder, if present)
    #[arg(long)]
    crates: Option<PathBuf>,

    /// Run the import and roll it back
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BackupArgs {
    /// Database to back up (defaults to the Mixxx library)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TomlConfig::resolve(cli.config.as_deref()).context("Failed to load config")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting mxm-merge v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match cli.command {
        Command::Merge(args) => run_merge(args, config).await,
        Command::Import(args) => run_import(args, config).await,
        Command::Backup(args) => run_backup(args),
    }
}

async fn run_merge(args: MergeArgs, config: TomlConfig) -> Result<()> {
    let source = args
        .source
        .or(config.source)
        .ok_or_else(|| anyhow!("No source library given (--source or `source` in config)"))?;
    let target = args
        .target
        .or(config.target)
        .ok_or_else(|| anyhow!("No target library given (--target or `target` in config)"))?;
    let output = args
        .output
        .or(config.output)
        .ok_or_else(|| anyhow!("No output library given (--output or `output` in config)"))?;

    let mut pairs: Vec<(String, String)> = config
        .replacements
        .iter()
        .map(|entry| (normalize_path(&entry.from), normalize_path(&entry.to)))
        .collect();
    for arg in &args.replacements {
        pairs.push(parse_replacement_arg(arg)?);
    }
    let table = ReplacementTable::new(pairs).context("Invalid replacement table")?;
    for rule in table.rules() {
        info!("Replacing \"{}\" with \"{}\"", rule.from, rule.to);
    }

    let paths = MergePaths {
        source,
        target,
        output,
    };
    let options = FileMergeOptions {
        merge: MergeOptions {
            dry_run: args.dry_run,
        },
        foreign_keys: config.foreign_keys,
        force: args.force,
    };
    let report = merge_files(&paths, &table, &options)
        .await
        .context("Merge failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

async fn run_import(args: ImportArgs, config: TomlConfig) -> Result<()> {
    let database = match args.database {
        Some(database) => database,
        None => default_mixxx_database()?,
    };

    let crate_map = CrateMap::resolve(&args.folder, args.crates.as_deref())
        .context("Failed to load crate map")?;
    let playlists = find_playlists(&args.folder)
        .with_context(|| format!("Failed to read playlists in {}", args.folder.display()))?;
    info!(
        "Found {} playlists in {}",
        playlists.len(),
        args.folder.display()
    );

    let pool = connect_target(&database, config.foreign_keys)
        .await
        .with_context(|| format!("Failed to open {}", database.display()))?;
    let options = ImportOptions {
        dry_run: args.dry_run,
    };
    let result = import_playlists(&pool, &playlists, &crate_map, &options).await;
    pool.close().await;
    let report = result.context("Import failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn run_backup(args: BackupArgs) -> Result<()> {
    let (database, backups_dir) = match args.database {
        Some(database) => {
            let parent = database
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            (database, parent.join("backups"))
        }
        None => (
            default_mixxx_database()?,
            default_mixxx_directory()?.join("backups"),
        ),
    };

    let destination = backup_database(&database, &backups_dir)
        .with_context(|| format!("Failed to back up {}", database.display()))?;
    println!("{}", destination.display());
    Ok(())
}
