use super::*;

#[derive(Debug, Default, Clone, Copy)]
pub struct AlignCounts {
    pub secondary_files: usize,
    pub merged_units: usize,
    pub appended_units: usize,
    pub dropped_units: usize,
    pub corrections_applied: usize,
}

pub struct Aligner<'a> {
    plan: &'a AlignmentPlan,
    parser: &'a SecondaryParser,
    source_root: &'a Path,
    corrections_dir: PathBuf,
    corrected: BTreeSet<BookKey>,
    counts: AlignCounts,
}

impl<'a> Aligner<'a> {
    pub fn new(plan: &'a AlignmentPlan, parser: &'a SecondaryParser, source_root: &'a Path) -> Self {
        Self {
            plan,
            parser,
            source_root,
            corrections_dir: source_root.join("corrections"),
            corrected: BTreeSet::new(),
            counts: AlignCounts::default(),
        }
    }

    pub fn counts(&self) -> AlignCounts {
        self.counts
    }

    pub fn secondary_volume_dir(&self, volume: u32) -> PathBuf {
        secondary_volume_dir(self.source_root, volume)
    }

    /// Merges every secondary book directory of one volume into the primary volume node.
    pub fn align_volume(
        &mut self,
        volume_number: u32,
        volume: &mut Chapter,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let dir = self.secondary_volume_dir(volume_number);
        let book_dirs = discover_numbered(&dir, true)
            .with_context(|| format!("missing secondary corpus for volume {volume_number}"))?;

        for (secondary_book, book_dir) in book_dirs {
            let book_number = self.plan.primary_book(volume_number, secondary_book);
            let book = volume
                .children_mut()
                .and_then(|books| books.get_mut((book_number as usize).checked_sub(1)?));
            let Some(book) = book else {
                diagnostics.push(
                    DiagnosticKind::MissingPosition,
                    format!(
                        "{} has no primary book {book_number} in volume {volume_number}",
                        relative_display(self.source_root, &book_dir)
                    ),
                );
                continue;
            };

            let key = (volume_number, book_number);
            self.ensure_corrected(key, book, diagnostics)?;
            self.align_book(key, book, &book_dir, diagnostics)?;
        }
        Ok(())
    }

    /// Applies the book's corrections once, before any of its chapters is looked up.
    pub fn ensure_corrected(
        &mut self,
        key: BookKey,
        book: &mut Chapter,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        if !self.corrected.insert(key) {
            return Ok(());
        }
        let plan = self.plan;
        for correction in plan.corrections_for(key) {
            if apply_correction(correction, book, &self.corrections_dir, diagnostics)? {
                self.counts.corrections_applied += 1;
            }
        }
        Ok(())
    }

    fn align_book(
        &mut self,
        key: BookKey,
        book: &mut Chapter,
        book_dir: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let (volume_number, book_number) = key;

        for (chapter_number, file) in discover_numbered(book_dir, false)? {
            let source = relative_display(self.source_root, &file);
            if chapter_number == 0 {
                diagnostics.push(
                    DiagnosticKind::SkippedSource,
                    format!("skipping zero file {source}"),
                );
                continue;
            }
            info!(file = %source, "processing secondary file");

            let html = read_to_string(&file)?;
            let secondary = self
                .parser
                .parse(&html)
                .with_context(|| format!("failed to parse {source}"))?;
            self.counts.secondary_files += 1;

            let chapter_index = chapter_number as usize - 1;
            let chapter = match self.plan.resolve(key, chapter_index) {
                Some(target) => book
                    .children_mut()
                    .and_then(|chapters| chapters.get_mut(target.chapter))
                    .map(|chapter| (target, chapter)),
                None => None,
            };
            let Some((target, chapter)) = chapter else {
                diagnostics.push(
                    DiagnosticKind::MissingPosition,
                    format!(
                        "{source} maps to no chapter of volume {volume_number} book {book_number}"
                    ),
                );
                continue;
            };

            let target_path = format!(
                "{BOOK_PATH}:{volume_number}:{book_number}:{}",
                target.chapter + 1
            );
            let outcome = merge_chapter(
                chapter,
                secondary,
                self.plan.merge_policy(key, target),
                &source,
                &target_path,
                diagnostics,
            );
            self.counts.merged_units += outcome.merged;
            self.counts.appended_units += outcome.appended;
            self.counts.dropped_units += outcome.dropped;
        }
        Ok(())
    }
}
