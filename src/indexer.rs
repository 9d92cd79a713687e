use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{Chapter, Contents, Crumb, Language, Navigation, NodeIndex, PartType};

/// Assigns ordinals, paths, breadcrumbs and sibling navigation over a finished tree.
pub struct Indexer {
    chapter_number: Regex,
}

impl Indexer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            chapter_number: Regex::new(r"Chapter (\d+)")
                .context("failed to compile chapter number regex")?,
        })
    }

    /// Indexes `root` in place. The root keeps its own path and index key; everything
    /// beneath it is renumbered, so running twice yields the same result.
    pub fn index(&self, root: &mut Chapter, diagnostics: &mut Diagnostics) {
        let path = root.path_or_default().to_string();
        root.verse_start_index = 0;
        root.crumbs = vec![Crumb {
            titles: root.titles.clone(),
            indexed_titles: root.titles.clone(),
            path,
        }];

        let mut counters = vec![0_u64; root.depth()];
        self.index_node(root, &mut counters, 0, diagnostics);
    }

    fn index_node(
        &self,
        node: &mut Chapter,
        counters: &mut Vec<u64>,
        depth: usize,
        diagnostics: &mut Diagnostics,
    ) {
        if counters.len() < depth + 1 {
            counters.push(0);
        }

        let parent_path = node.path_or_default().to_string();
        let parent_crumbs = node.crumbs.clone();
        let start = node.verse_start_index;

        match &mut node.contents {
            Contents::Verses { verses } => {
                let mut local = 0_u32;
                for verse in verses.iter_mut() {
                    if verse.part_type.is_numbered_unit() {
                        counters[depth] += 1;
                        local += 1;
                        verse.index = Some(counters[depth]);
                        verse.local_index = Some(local);
                        verse.path = Some(format!("{parent_path}:{local}"));
                    } else {
                        verse.index = None;
                        verse.local_index = None;
                        verse.path = None;
                    }
                }
                node.verse_count = counters[depth].saturating_sub(start);
            }
            Contents::Chapters { chapters } => {
                let mut sequence: Option<u32> = None;

                for position in 0..chapters.len() {
                    counters[depth] += 1;
                    let local = position as u32 + 1;
                    let child_path = format!("{parent_path}:{local}");

                    let crumb = Crumb {
                        titles: chapters[position].titles.clone(),
                        indexed_titles: BTreeMap::from([(
                            Language::En.as_str().to_string(),
                            format!("{} {local}", chapters[position].part_type),
                        )]),
                        path: child_path.clone(),
                    };

                    let mut nav = Navigation::default();
                    if position > 0 {
                        let previous = &mut chapters[position - 1];
                        nav.prev = previous.crumbs.last().cloned();
                        previous
                            .nav
                            .get_or_insert_with(Navigation::default)
                            .next = Some(crumb.clone());
                    }

                    let child = &mut chapters[position];
                    child.index = Some(NodeIndex::Ordinal(counters[depth]));
                    child.local_index = Some(local);
                    child.path = Some(child_path);
                    child.verse_start_index = counters.last().copied().unwrap_or(0);

                    if child.part_type == PartType::Chapter {
                        self.check_chapter_number(child, local, &mut sequence, diagnostics);
                    }

                    child.crumbs = parent_crumbs.clone();
                    child.crumbs.push(crumb);
                    if child.crumbs.len() >= 2 {
                        nav.up = child.crumbs.get(child.crumbs.len() - 2).cloned();
                    }
                    child.nav = Some(nav);

                    self.index_node(child, counters, depth + 1, diagnostics);
                }

                let end = counters.last().copied().unwrap_or(0);
                node.verse_count = end.saturating_sub(start);
            }
        }
    }

    fn check_chapter_number(
        &self,
        chapter: &Chapter,
        local: u32,
        sequence: &mut Option<u32>,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(title) = chapter.title(Language::En) else {
            return;
        };
        let Some(number) = self
            .chapter_number
            .captures(title)
            .and_then(|captures| captures.get(1))
            .and_then(|value| value.as_str().parse::<u32>().ok())
        else {
            return;
        };

        if let Some(previous) = sequence.filter(|previous| previous + 1 != number) {
            diagnostics.push(
                DiagnosticKind::ChapterNumbering,
                format!(
                    "chapter {local} at {} is titled {title:?}, expected Chapter {}",
                    chapter.path_or_default(),
                    previous + 1
                ),
            );
        }
        *sequence = Some(number);
    }
}
