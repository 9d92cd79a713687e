use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::info;

use crate::cli::BuildArgs;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::indexer::Indexer;
use crate::manifest::StageRun;
use crate::model::{
    BOOK_COMPLETE_PATH, BOOK_INDEX, BOOK_PATH, BOOK_PRIMARY_PATH, Chapter,
    HUBEALI_TRANSLATION_ID, Language, NodeIndex, PartType, Translation, Verse,
};
use crate::store::{insert_chapter, open_store, write_complete_tree};
use crate::util::{discover_primary_files, parse_selector, read_to_string, relative_display};

mod builder;
mod classify;
mod fragments;
mod run;
mod volumes;

pub use run::run;

pub(crate) use builder::*;
pub(crate) use classify::*;
pub(crate) use fragments::*;
pub(crate) use run::build_volume;
pub(crate) use volumes::*;
