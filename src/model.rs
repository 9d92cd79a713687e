use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::diagnostics::Diagnostic;

pub const BOOK_INDEX: &str = "al-kafi";
pub const BOOK_PATH: &str = "/books/al-kafi";
pub const BOOK_COMPLETE_PATH: &str = "/books/complete/al-kafi";
/// The built tree before alignment; `align` always starts from this copy.
pub const BOOK_PRIMARY_PATH: &str = "/books/primary/al-kafi";
pub const QURAN_PATH: &str = "/books/quran";
pub const QURAN_COMPLETE_PATH: &str = "/books/complete/quran";

pub const HUBEALI_TRANSLATION_ID: &str = "en.hubeali";
pub const SARWAR_TRANSLATION_ID: &str = "en.sarwar";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartType {
    Verse,
    Volume,
    Book,
    Chapter,
    Hadith,
    Heading,
}

impl PartType {
    /// Units that take part in ordinal numbering and alignment positions.
    pub fn is_numbered_unit(self) -> bool {
        matches!(self, Self::Hadith | Self::Verse)
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Verse => "Verse",
            Self::Volume => "Volume",
            Self::Book => "Book",
            Self::Chapter => "Chapter",
            Self::Hadith => "Hadith",
            Self::Heading => "Heading",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Ar,
    En,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }
}

/// Ordinal for numbered nodes, or a string key for the root book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeIndex {
    Ordinal(u64),
    Key(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    #[serde(default)]
    pub indexed_titles: BTreeMap<String, String>,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Crumb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Crumb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<Crumb>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: String,
    pub name: String,
    pub lang: String,
}

impl Translation {
    pub fn hubeali() -> Self {
        Self {
            id: HUBEALI_TRANSLATION_ID.to_string(),
            name: "HubeAli.com".to_string(),
            lang: Language::En.as_str().to_string(),
        }
    }

    pub fn sarwar() -> Self {
        Self {
            id: SARWAR_TRANSLATION_ID.to_string(),
            name: "Shaykh Muhammad Sarwar (from Thaqalayn.net)".to_string(),
            lang: Language::En.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialText {
    Plain { text: String },
    Narrator { text: String, path: String },
}

impl SpecialText {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Narrator { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarratorChain {
    pub text: String,
    #[serde(default)]
    pub parts: Vec<SpecialText>,
}

pub type CrossReferences = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub part_type: PartType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lines")]
    pub text: Vec<String>,
    #[serde(default)]
    pub translations: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator_chain: Option<NarratorChain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refs: Option<CrossReferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sajda_type: Option<String>,
}

impl Verse {
    pub fn new(part_type: PartType, text: Vec<String>) -> Self {
        Self {
            part_type,
            index: None,
            local_index: None,
            path: None,
            text,
            translations: BTreeMap::new(),
            gradings: None,
            narrator_chain: None,
            refs: None,
            sajda_type: None,
        }
    }
}

/// Children of a structural node, resolved once at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contents {
    Chapters { chapters: Vec<Chapter> },
    Verses {
        #[serde(default)]
        verses: Vec<Verse>,
    },
}

impl Default for Contents {
    fn default() -> Self {
        Self::Verses { verses: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub part_type: PartType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<NodeIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub verse_count: u64,
    #[serde(default)]
    pub verse_start_index: u64,
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub crumbs: Vec<Crumb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav: Option<Navigation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verse_translations: Vec<Translation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rukus: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sajda_type: Option<String>,
    #[serde(flatten)]
    pub contents: Contents,
}

impl Chapter {
    pub fn internal(part_type: PartType) -> Self {
        Self::with_contents(part_type, Contents::Chapters { chapters: Vec::new() })
    }

    pub fn leaf(part_type: PartType) -> Self {
        Self::with_contents(part_type, Contents::default())
    }

    fn with_contents(part_type: PartType, contents: Contents) -> Self {
        Self {
            part_type,
            index: None,
            local_index: None,
            path: None,
            verse_count: 0,
            verse_start_index: 0,
            titles: BTreeMap::new(),
            descriptions: None,
            crumbs: Vec::new(),
            nav: None,
            verse_translations: Vec::new(),
            reveal_type: None,
            order: None,
            rukus: None,
            sajda_type: None,
            contents,
        }
    }

    pub fn set_title(&mut self, language: Language, title: impl Into<String>) {
        self.titles.insert(language.as_str().to_string(), title.into());
    }

    pub fn title(&self, language: Language) -> Option<&str> {
        self.titles.get(language.as_str()).map(String::as_str)
    }

    pub fn path_or_default(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.contents, Contents::Verses { .. })
    }

    pub fn children(&self) -> &[Chapter] {
        match &self.contents {
            Contents::Chapters { chapters } => chapters,
            Contents::Verses { .. } => &[],
        }
    }

    pub fn verses(&self) -> &[Verse] {
        match &self.contents {
            Contents::Verses { verses } => verses,
            Contents::Chapters { .. } => &[],
        }
    }

    /// Turns an empty leaf into an internal node so children can be attached.
    /// A leaf that already holds verses yields `None`.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Chapter>> {
        if matches!(&self.contents, Contents::Verses { verses } if verses.is_empty()) {
            self.contents = Contents::Chapters { chapters: Vec::new() };
        }
        match &mut self.contents {
            Contents::Chapters { chapters } => Some(chapters),
            Contents::Verses { .. } => None,
        }
    }

    pub fn verses_mut(&mut self) -> Option<&mut Vec<Verse>> {
        match &mut self.contents {
            Contents::Verses { verses } => Some(verses),
            Contents::Chapters { .. } => None,
        }
    }

    pub fn register_translation(&mut self, translation: Translation) {
        if !self
            .verse_translations
            .iter()
            .any(|existing| existing.id == translation.id)
        {
            self.verse_translations.push(translation);
        }
    }

    /// Depth of the subtree, a leaf being 1.
    pub fn depth(&self) -> usize {
        match &self.contents {
            Contents::Chapters { chapters } => {
                1 + chapters.iter().map(Chapter::depth).max().unwrap_or(0)
            }
            Contents::Verses { .. } => 1,
        }
    }

    pub fn for_each_leaf_mut<F>(&mut self, visit: &mut F) -> anyhow::Result<()>
    where
        F: FnMut(&mut Chapter) -> anyhow::Result<()>,
    {
        if let Contents::Chapters { chapters } = &mut self.contents {
            for chapter in chapters {
                chapter.for_each_leaf_mut(visit)?;
            }
            Ok(())
        } else {
            visit(self)
        }
    }
}

fn lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(line) => vec![line],
        OneOrMany::Many(lines) => lines,
        OneOrMany::Missing(()) => Vec::new(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerses {
    pub narrator_ids: Vec<u32>,
    #[serde(default)]
    pub verse_paths: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrator {
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    pub index: u32,
    pub path: String,
    #[serde(default)]
    pub verse_count: usize,
    #[serde(default)]
    pub verse_paths: BTreeSet<String>,
    #[serde(default)]
    pub subchains: BTreeMap<String, ChainVerses>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileEntry {
    pub corpus: String,
    pub volume: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<u32>,
    pub relative_path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_root: String,
    pub primary_file_count: usize,
    pub secondary_file_count: usize,
    pub correction_file_count: usize,
    pub files: Vec<SourceFileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagePaths {
    pub cache_root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    pub store: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub stage: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: StagePaths,
    pub counts: BTreeMap<String, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStateManifest {
    pub last_stage: String,
    pub run_id: String,
    pub status: String,
    pub diagnostic_count: usize,
    pub manifest_path: String,
    pub updated_at: String,
}
