use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cli::NarratorsArgs;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::manifest::StageRun;
use crate::model::{
    BOOK_COMPLETE_PATH, ChainVerses, Chapter, Language, NodeIndex, Narrator, NarratorChain,
    PartType, SpecialText, Verse,
};
use crate::store::{
    Record, RecordKind, RecordStore, StoreError, insert_chapter, load_tree, open_store,
    write_complete_tree,
};

mod chains;
mod extract;
mod registry;
mod run;

pub use run::run;

pub(crate) use chains::*;
pub(crate) use extract::*;
pub(crate) use registry::*;
