use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::{BOOK_COMPLETE_PATH, QURAN_COMPLETE_PATH};

#[derive(Parser, Debug)]
#[command(
    name = "kafi-corpus",
    version,
    about = "Al-Kafi hadith corpus normalization pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hash every primary, secondary and correction source file.
    Inventory(InventoryArgs),
    /// Build the primary tree from the XHTML volumes and index it.
    Build(BuildArgs),
    /// Merge the secondary translation into the stored tree.
    Align(AlignArgs),
    /// Extract and link narrator chains.
    Narrators(NarratorsArgs),
    /// Link Quran citations between the hadith and Quran trees.
    Link(LinkArgs),
    /// Report the last run, the source inventory and the stored tree.
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StoreBackend {
    Json,
    Sqlite,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, default_value = ".cache/kafi")]
    pub cache_root: PathBuf,

    #[arg(long, value_enum, default_value_t = StoreBackend::Json)]
    pub store_backend: StoreBackend,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/kafi")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "raw")]
    pub source_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value = "raw")]
    pub source_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct AlignArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value = "raw")]
    pub source_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct NarratorsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value_t = false)]
    pub seed_registry: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value = QURAN_COMPLETE_PATH)]
    pub quran_path: String,

    #[arg(long, default_value = BOOK_COMPLETE_PATH)]
    pub book_path: String,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}
