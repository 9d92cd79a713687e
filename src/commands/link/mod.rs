use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::{info, warn};

use crate::cli::LinkArgs;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::manifest::StageRun;
use crate::model::{
    Chapter, CrossReferences, HUBEALI_TRANSLATION_ID, QURAN_PATH, SARWAR_TRANSLATION_ID, Verse,
};
use crate::store::{insert_chapter, load_tree, open_store, write_complete_tree};

mod citations;
mod references;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;

pub(crate) use citations::*;
pub(crate) use references::*;
