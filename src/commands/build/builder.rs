use super::*;

pub struct BuildPatterns {
    pub self_closing_anchor: Regex,
    pub volume_heading: Regex,
    pub table_of_contents: Regex,
    pub final_hadith_title: Regex,
    pub final_hadith_opening: Regex,
    pub end_of_hadith: Regex,
    pub end_of_hadith_cleanup: Regex,
}

impl BuildPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            self_closing_anchor: Regex::new(r"<a(\s[^<>]*?)\s*/>")
                .context("failed to compile self-closing anchor regex")?,
            volume_heading: Regex::new(r"^AL-KAFI VOLUME")
                .context("failed to compile volume heading regex")?,
            table_of_contents: Regex::new(r"^TABLE OF CONTENTS")
                .context("failed to compile table of contents regex")?,
            final_hadith_title: Regex::new(r"^H \d+")
                .context("failed to compile hadith title regex")?,
            final_hadith_opening: Regex::new(r"^-? ?(1\d+)-?")
                .context("failed to compile hadith opening regex")?,
            end_of_hadith: Regex::new(r"<sup>\[\d+\]</sup>\s*(?:</a>)?\s*$")
                .context("failed to compile end of hadith regex")?,
            end_of_hadith_cleanup: Regex::new(
                r#"<a id="[^"]+"\s*/?>(?:</a>)?<sup>\[\d+\]</sup>\s*(?:</a>)?\s*$"#,
            )
            .context("failed to compile end of hadith cleanup regex")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    AwaitingBook,
    InBookAwaitingChapter,
    InChapter,
}

/// Rebuilds the book/chapter/unit structure of one volume from its chapter files.
///
/// Titles and line buffers carry over from one file to the next: a book's Arabic
/// title sits at the end of the preceding table-of-contents file, and a chapter's
/// Arabic title precedes the heading that opens it.
pub struct VolumeBuilder<'a> {
    patterns: &'a BuildPatterns,
    variant: VolumeVariant,
    books: Vec<Chapter>,
    state: BuilderState,
    pending_book_title: Option<String>,
    pending_chapter_title: Option<String>,
    arabic: Vec<String>,
    english: Vec<String>,
    previous_hadith_number: u32,
    finished: bool,
    source: String,
}

impl<'a> VolumeBuilder<'a> {
    pub fn new(patterns: &'a BuildPatterns, variant: VolumeVariant) -> Self {
        let (books, state) = match variant {
            VolumeVariant::Standard => (Vec::new(), BuilderState::AwaitingBook),
            VolumeVariant::Final => (
                vec![final_volume_book()],
                BuilderState::InBookAwaitingChapter,
            ),
        };

        Self {
            patterns,
            variant,
            books,
            state,
            pending_book_title: None,
            pending_chapter_title: None,
            arabic: Vec::new(),
            english: Vec::new(),
            previous_hadith_number: FINAL_VOLUME_PREVIOUS_HADITH,
            finished: false,
            source: String::new(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Set once the final volume's closing phrase has been committed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn process_file(&mut self, source: &str, file: ChapterFile, diagnostics: &mut Diagnostics) {
        if self.finished {
            return;
        }
        self.source = source.to_string();

        match file {
            ChapterFile::Ignored => {}
            ChapterFile::TableOfContents { trailing } => match (self.variant, trailing) {
                (VolumeVariant::Standard, Some(title)) => self.pending_book_title = Some(title),
                (VolumeVariant::Final, Some(line)) => self.arabic.push(line),
                (_, None) => diagnostics.push(
                    DiagnosticKind::SkippedSource,
                    format!("table of contents in {source} has no trailing fragment"),
                ),
            },
            ChapterFile::Content {
                heading_anchor,
                heading,
                fragments,
            } => {
                match self.variant {
                    VolumeVariant::Standard => {
                        let heading_en = if heading_anchor.is_empty() {
                            heading
                        } else {
                            heading_anchor
                        };
                        self.open_heading(heading_en, diagnostics);
                    }
                    VolumeVariant::Final => {
                        self.open_final_heading(heading_anchor, heading, diagnostics)
                    }
                }

                for fragment in &fragments {
                    match self.variant {
                        VolumeVariant::Standard => self.process_fragment(fragment, diagnostics),
                        VolumeVariant::Final => {
                            self.process_final_fragment(fragment, diagnostics)
                        }
                    }
                    if self.finished {
                        break;
                    }
                }
            }
        }
    }

    pub fn finish(self, diagnostics: &mut Diagnostics) -> Vec<Chapter> {
        if !self.arabic.is_empty() || !self.english.is_empty() {
            diagnostics.push(
                DiagnosticKind::UnplacedContent,
                format!(
                    "{} arabic and {} english lines left uncommitted after {}",
                    self.arabic.len(),
                    self.english.len(),
                    self.source
                ),
            );
        }
        self.books
    }

    fn open_heading(&mut self, heading_en: String, diagnostics: &mut Diagnostics) {
        if let Some(title_ar) = self.pending_book_title.take() {
            let mut book = Chapter::internal(PartType::Book);
            book.set_title(Language::Ar, title_ar);
            book.set_title(Language::En, heading_en);
            self.books.push(book);
            self.state = BuilderState::InBookAwaitingChapter;
        } else if (self.pending_chapter_title.is_some() || self.state != BuilderState::InChapter)
            && heading_en.starts_with("Chapter")
        {
            let title_ar = self.pending_chapter_title.take();
            self.start_chapter(title_ar, heading_en, diagnostics);
        } else if let Some(title_ar) = self.pending_chapter_title.take() {
            self.commit_unit(
                PartType::Heading,
                vec![title_ar],
                vec![heading_en],
                diagnostics,
            );
        }
    }

    fn open_final_heading(
        &mut self,
        heading_anchor: String,
        heading: String,
        diagnostics: &mut Diagnostics,
    ) {
        let is_hadith_title = self.patterns.final_hadith_title.is_match(&heading_anchor);
        let heading_en = if heading_anchor.is_empty() || is_hadith_title {
            heading
        } else {
            heading_anchor
        };

        if self.pending_chapter_title.is_some() || self.state != BuilderState::InChapter {
            let title_ar = self
                .pending_chapter_title
                .take()
                .unwrap_or_else(|| DEFAULT_CHAPTER_TITLE_AR.to_string());
            let title_en = if heading_en.is_empty() {
                DEFAULT_CHAPTER_TITLE_EN.to_string()
            } else {
                heading_en
            };
            self.start_chapter(Some(title_ar), title_en, diagnostics);
        } else if is_hadith_title {
            self.english.push(heading_en);
        }
    }

    fn process_fragment(&mut self, fragment: &Fragment, diagnostics: &mut Diagnostics) {
        let role = classify(fragment);
        if role == FragmentRole::Blank {
            return;
        }

        let content = normalize_styles(&fragment.inner_html);
        let end_of_hadith = self.patterns.end_of_hadith.is_match(&content);

        match role {
            FragmentRole::BookTitle => {
                if self.has_pending_unit() {
                    if self.state == BuilderState::InChapter {
                        self.commit_buffers(PartType::Heading, diagnostics);
                    } else {
                        self.describe_book(diagnostics);
                    }
                }
                self.pending_book_title = Some(content);
                self.state = if self.books.is_empty() {
                    BuilderState::AwaitingBook
                } else {
                    BuilderState::InBookAwaitingChapter
                };
            }
            FragmentRole::ChapterTitle => {
                if self.has_pending_unit() {
                    if self.state == BuilderState::InChapter {
                        self.commit_buffers(PartType::Hadith, diagnostics);
                    } else {
                        self.describe_book(diagnostics);
                    }
                }
                self.pending_chapter_title = Some(content);
            }
            FragmentRole::RightToLeft => self.arabic.push(content),
            FragmentRole::ContentLine if fragment.is_paragraph() => self.english.push(content),
            _ => {}
        }

        if end_of_hadith {
            self.commit_buffers(PartType::Hadith, diagnostics);
        }
    }

    fn process_final_fragment(&mut self, fragment: &Fragment, diagnostics: &mut Diagnostics) {
        let role = classify_without_book_titles(fragment);
        if role == FragmentRole::Blank {
            return;
        }

        let content = normalize_styles(&fragment.inner_html);
        let plain = fragment.text.trim();
        let opening = self
            .patterns
            .final_hadith_opening
            .captures(plain)
            .and_then(|captures| captures.get(1))
            .and_then(|number| number.as_str().parse::<u32>().ok());
        let closing = plain.starts_with(CLOSING_PHRASE);

        if (opening.is_some() || closing) && self.has_pending_unit() {
            self.commit_buffers(PartType::Hadith, diagnostics);
        }

        if let Some(number) = opening {
            if self.previous_hadith_number + 1 != number {
                diagnostics.push(
                    DiagnosticKind::HadithNumbering,
                    format!(
                        "hadith {number} follows hadith {} in {}",
                        self.previous_hadith_number, self.source
                    ),
                );
            }
            self.previous_hadith_number = number;
        }

        match role {
            FragmentRole::ChapterTitle => {
                if self.has_pending_unit() {
                    self.commit_buffers(PartType::Hadith, diagnostics);
                }
                self.pending_chapter_title = Some(content);
            }
            FragmentRole::RightToLeft => self.arabic.push(content),
            FragmentRole::ContentLine if fragment.is_paragraph() => self.english.push(content),
            _ => {}
        }

        if closing {
            if !self.arabic.is_empty() || !self.english.is_empty() {
                self.commit_buffers(PartType::Heading, diagnostics);
            }
            self.finished = true;
        }
    }

    fn has_pending_unit(&self) -> bool {
        !self.arabic.is_empty() && !self.english.is_empty()
    }

    fn start_chapter(
        &mut self,
        title_ar: Option<String>,
        title_en: String,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(book) = self.books.last_mut() else {
            diagnostics.push(
                DiagnosticKind::UnplacedContent,
                format!("chapter {title_en:?} in {} appears before any book", self.source),
            );
            return;
        };
        let Some(chapters) = book.children_mut() else {
            return;
        };

        let mut chapter = Chapter::leaf(PartType::Chapter);
        if let Some(title_ar) = title_ar {
            chapter.set_title(Language::Ar, title_ar);
        }
        chapter.set_title(Language::En, title_en);
        chapter.register_translation(Translation::hubeali());
        chapters.push(chapter);
        self.state = BuilderState::InChapter;
    }

    fn describe_book(&mut self, diagnostics: &mut Diagnostics) {
        let arabic = std::mem::take(&mut self.arabic);
        let english = std::mem::take(&mut self.english);

        let Some(book) = self.books.last_mut() else {
            diagnostics.push(
                DiagnosticKind::UnplacedContent,
                format!("book description in {} appears before any book", self.source),
            );
            return;
        };

        book.descriptions = Some(BTreeMap::from([
            (Language::Ar.as_str().to_string(), arabic.join("\n")),
            (Language::En.as_str().to_string(), english.join("\n")),
        ]));
    }

    fn commit_buffers(&mut self, part_type: PartType, diagnostics: &mut Diagnostics) {
        let arabic = std::mem::take(&mut self.arabic);
        let english = std::mem::take(&mut self.english);
        self.commit_unit(part_type, arabic, english, diagnostics);
    }

    fn commit_unit(
        &mut self,
        part_type: PartType,
        arabic: Vec<String>,
        english: Vec<String>,
        diagnostics: &mut Diagnostics,
    ) {
        let mut cleaned = Vec::with_capacity(english.len());
        for line in english {
            let line = self
                .patterns
                .end_of_hadith_cleanup
                .replace(&line, "")
                .into_owned();
            if self.patterns.end_of_hadith.is_match(&line) {
                diagnostics.push(
                    DiagnosticKind::MarkerCleanup,
                    format!("citation marker left in translation line from {}", self.source),
                );
            }
            cleaned.push(line);
        }

        let mut unit = Verse::new(part_type, arabic);
        unit.translations
            .insert(HUBEALI_TRANSLATION_ID.to_string(), cleaned);

        if let Some(verses) = self.open_chapter() {
            verses.push(unit);
            return;
        }
        diagnostics.push(
            DiagnosticKind::UnplacedContent,
            format!(
                "{part_type} in {} has no open chapter and was dropped",
                self.source
            ),
        );
    }

    fn open_chapter(&mut self) -> Option<&mut Vec<Verse>> {
        if self.state != BuilderState::InChapter {
            return None;
        }
        self.books
            .last_mut()?
            .children_mut()?
            .last_mut()?
            .verses_mut()
    }
}
