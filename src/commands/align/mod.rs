use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::info;

use crate::cli::AlignArgs;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::indexer::Indexer;
use crate::manifest::StageRun;
use crate::model::{
    BOOK_COMPLETE_PATH, BOOK_PATH, BOOK_PRIMARY_PATH, Chapter, Language, PartType,
    SARWAR_TRANSLATION_ID, Translation, Verse,
};
use crate::store::{RecordStore, insert_chapter, load_tree, open_store, write_complete_tree};
use crate::util::{
    discover_numbered, parse_selector, read_to_string, relative_display, secondary_volume_dir,
};

mod corrections;
mod engine;
mod merge;
mod run;
mod secondary;
#[cfg(test)]
mod tests;

pub use run::run;

pub(crate) use corrections::*;
pub(crate) use engine::*;
pub(crate) use merge::*;
pub(crate) use run::align_store;
pub(crate) use secondary::*;
