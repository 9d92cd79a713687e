use super::*;

/// Primary book address: 1-based volume and 1-based book within it.
pub type BookKey = (u32, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionOp {
    /// A chapter missing from the primary corpus, known only by its Arabic title.
    InsertChapter { at: usize, title_ar: &'static str },
    /// Reserves a slot that a later substitution fills.
    InsertPlaceholder { at: usize },
    /// The primary corpus merged two chapters; move a unit back into its own chapter.
    MoveUnit {
        from_chapter: usize,
        unit: usize,
        to_chapter: usize,
    },
    /// Replaces a chapter with hand-corrected content from the corrections directory.
    Substitute { at: usize, file: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub volume: u32,
    pub book: u32,
    pub op: CorrectionOp,
}

impl Correction {
    pub const fn key(&self) -> BookKey {
        (self.volume, self.book)
    }
}

const fn insert(volume: u32, book: u32, at: usize, title_ar: &'static str) -> Correction {
    Correction {
        volume,
        book,
        op: CorrectionOp::InsertChapter { at, title_ar },
    }
}

const fn substitute(volume: u32, book: u32, at: usize, file: &'static str) -> Correction {
    Correction {
        volume,
        book,
        op: CorrectionOp::Substitute { at, file },
    }
}

/// Chapter indexes are 0-based and refer to the book as already modified by
/// the records before them.
pub const KAFI_CORRECTIONS: [Correction; 15] = [
    // Chapter 228 of the pilgrimage book is merged into chapter 227.
    insert(4, 3, 227, "دُعَاءٌ آخَرُ عِنْدَ قَبْرِ أَمِيرِ الْمُؤْمِنِينَ ع\u{200f}"),
    Correction {
        volume: 4,
        book: 3,
        op: CorrectionOp::MoveUnit {
            from_chapter: 226,
            unit: 1,
            to_chapter: 227,
        },
    },
    Correction {
        volume: 5,
        book: 2,
        op: CorrectionOp::InsertPlaceholder { at: 81 },
    },
    substitute(5, 2, 81, "al-kafi_v5_b2_c82.json"),
    insert(5, 3, 22, "بَابُ تَزْوِيجِ أُمِّ كُلْثُوم\u{200f}"),
    insert(5, 3, 121, "بَابُ الرَّجُلِ يُزَوِّجُ عَبْدَهُ أَمَتَهُ ثُمَّ يَشْتَهِيهَا"),
    insert(5, 3, 132, "بَاب\u{200f}"),
    insert(5, 3, 177, "بَابُ أَنَّهُ لَا غَيْرَةَ فِي الْحَلَال\u{200f}"),
    insert(5, 3, 190, "بَابُ تَفْسِيرِ مَا يَحِلُّ مِنَ النِّكَاحِ وَ مَا يَحْرُمُ وَ الْفَرْقِ بَيْنَ النِّكَاحِ وَ السِّفَاحِ وَ الزِّنَى وَ هُوَ مِنْ كَلَامِ يُونُس\u{200f}"),
    // Units missing from chapters 22 and 190.
    substitute(5, 3, 21, "al-kafi_v5_b3_c22.json"),
    substitute(5, 3, 189, "al-kafi_v5_b3_c190.json"),
    insert(6, 2, 28, "بَابُ الْفَرْقِ بَيْنَ مَنْ طَلَّقَ عَلَى غَيْرِ السُّنَّةِ وَ بَيْنَ الْمُطَلَّقَةِ إِذَا خَرَجَتْ وَ هِيَ فِي عِدَّتِهَا أَوْ أَخْرَجَهَا زَوْجُهَا"),
    insert(6, 6, 86, "بَابُ أَلْبَانِ الْإِبِل\u{200f}"),
    substitute(6, 6, 133, "al-kafi_v6_b6_c134.json"),
    insert(7, 2, 9, "بَابُ الْعِلَّةِ فِي أَنَّ السِّهَامَ لَا تَكُونُ أَكْثَرَ مِنْ سِتَّةٍ وَ هُوَ مِنْ كَلَامِ يُونُس\u{200f}"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionRule {
    /// Secondary books numbered `from_book` and above address the primary book `offset` further on.
    BookShift {
        volume: u32,
        from_book: u32,
        offset: u32,
    },
    /// Chapter indexes at or above `from_chapter` in one primary book shift by `offset`.
    ChapterShift {
        volume: u32,
        book: u32,
        from_chapter: usize,
        offset: usize,
    },
    /// One secondary file per unit, mapped through cumulative unit counts per primary chapter.
    CumulativeUnits {
        volume: u32,
        counts: &'static [usize],
    },
}

/// Running total of units per chapter of the final volume's single book.
pub const FINAL_VOLUME_UNIT_TOTALS: [usize; 52] = [
    1, 3, 4, 6, 7, 15, 16, 20, 21, 22, 23, 26, 28, 29, 30, 32, 40, 51, 54, 56, 62, 66, 68, 70, 91,
    93, 94, 95, 98, 102, 104, 107, 125, 142, 143, 153, 192, 193, 254, 273, 299, 313, 392, 457, 477,
    532, 536, 550, 551, 584, 586, 597,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterTarget {
    /// 0-based chapter index within the primary book.
    pub chapter: usize,
    /// First non-heading unit the secondary file lines up with.
    pub start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    pub start: usize,
    pub drop_excess: bool,
    pub check_count: bool,
}

/// Everything that ties the secondary corpus layout to the primary tree.
#[derive(Debug, Clone)]
pub struct AlignmentPlan {
    pub corrections: Vec<Correction>,
    pub position_rules: Vec<PositionRule>,
    /// Chapters (volume, book, 0-based chapter) where surplus secondary units are discarded.
    pub drop_excess: Vec<(u32, u32, usize)>,
    pub count_exempt: Vec<BookKey>,
}

impl AlignmentPlan {
    pub fn kafi() -> Self {
        Self {
            corrections: KAFI_CORRECTIONS.to_vec(),
            position_rules: vec![
                // The secondary corpus lacks the third book of volume 6.
                PositionRule::BookShift {
                    volume: 6,
                    from_book: 3,
                    offset: 1,
                },
                PositionRule::ChapterShift {
                    volume: 7,
                    book: 2,
                    from_chapter: 1,
                    offset: 1,
                },
                PositionRule::CumulativeUnits {
                    volume: 8,
                    counts: &FINAL_VOLUME_UNIT_TOTALS,
                },
            ],
            // The primary corpus splits the first inheritance chapter in two.
            drop_excess: vec![(7, 2, 0)],
            count_exempt: vec![(8, 1)],
        }
    }

    pub fn corrections_for(&self, key: BookKey) -> impl Iterator<Item = &Correction> {
        self.corrections
            .iter()
            .filter(move |correction| correction.key() == key)
    }

    /// Maps a 1-based secondary book number to the 1-based primary book it covers.
    pub fn primary_book(&self, volume: u32, secondary_book: u32) -> u32 {
        self.position_rules
            .iter()
            .fold(secondary_book, |book, rule| match *rule {
                PositionRule::BookShift {
                    volume: rule_volume,
                    from_book,
                    offset,
                } if rule_volume == volume && secondary_book >= from_book => book + offset,
                _ => book,
            })
    }

    /// Resolves a 0-based secondary chapter index; `None` when no primary chapter covers it.
    pub fn resolve(&self, key: BookKey, chapter_index: usize) -> Option<ChapterTarget> {
        let (volume, book) = key;
        let mut target = ChapterTarget {
            chapter: chapter_index,
            start: 0,
        };

        for rule in &self.position_rules {
            match *rule {
                PositionRule::ChapterShift {
                    volume: rule_volume,
                    book: rule_book,
                    from_chapter,
                    offset,
                } if rule_volume == volume && rule_book == book && chapter_index >= from_chapter => {
                    target.chapter += offset;
                }
                PositionRule::CumulativeUnits {
                    volume: rule_volume,
                    counts,
                } if rule_volume == volume && chapter_index > 0 => {
                    let chapter = counts.iter().position(|&total| total > chapter_index)?;
                    let before = if chapter == 0 { 0 } else { counts[chapter - 1] };
                    target = ChapterTarget {
                        chapter,
                        start: chapter_index - before,
                    };
                }
                _ => {}
            }
        }

        Some(target)
    }

    pub fn merge_policy(&self, key: BookKey, target: ChapterTarget) -> MergePolicy {
        let (volume, book) = key;
        MergePolicy {
            start: target.start,
            drop_excess: self.drop_excess.contains(&(volume, book, target.chapter)),
            check_count: !self.count_exempt.contains(&key),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CorrectionFile {
    data: Chapter,
}

pub fn load_correction(dir: &Path, file: &str) -> Result<Chapter> {
    let path = dir.join(file);
    let raw = read_to_string(&path)?;
    let parsed: CorrectionFile = serde_json::from_str(&raw)
        .with_context(|| format!("malformed correction file {}", path.display()))?;
    Ok(parsed.data)
}

fn synthetic_chapter(title_ar: Option<&str>) -> Chapter {
    let mut chapter = Chapter::leaf(PartType::Chapter);
    if let Some(title) = title_ar {
        chapter.set_title(Language::Ar, title);
    }
    chapter
}

/// Applies one record to `book`. Addresses outside the book are reported and skipped;
/// an unreadable correction file is fatal.
pub fn apply_correction(
    correction: &Correction,
    book: &mut Chapter,
    corrections_dir: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<bool> {
    let (volume, book_number) = correction.key();
    let Some(chapters) = book.children_mut() else {
        diagnostics.push(
            DiagnosticKind::MissingPosition,
            format!("volume {volume} book {book_number} holds no chapters to correct"),
        );
        return Ok(false);
    };

    let applied = match correction.op {
        CorrectionOp::InsertChapter { at, title_ar } if at <= chapters.len() => {
            chapters.insert(at, synthetic_chapter(Some(title_ar)));
            true
        }
        CorrectionOp::InsertPlaceholder { at } if at <= chapters.len() => {
            chapters.insert(at, synthetic_chapter(None));
            true
        }
        CorrectionOp::MoveUnit {
            from_chapter,
            unit,
            to_chapter,
        } => {
            let movable = chapters
                .get(from_chapter)
                .is_some_and(|chapter| chapter.is_leaf() && unit < chapter.verses().len())
                && chapters.get(to_chapter).is_some_and(Chapter::is_leaf);
            if movable {
                let verse = chapters[from_chapter]
                    .verses_mut()
                    .map(|verses| verses.remove(unit));
                match (verse, chapters[to_chapter].verses_mut()) {
                    (Some(verse), Some(target)) => {
                        target.push(verse);
                        true
                    }
                    _ => false,
                }
            } else {
                false
            }
        }
        CorrectionOp::Substitute { at, file } => {
            let replacement = load_correction(corrections_dir, file)?;
            match chapters.get_mut(at) {
                Some(slot) => {
                    *slot = replacement;
                    true
                }
                None => false,
            }
        }
        _ => false,
    };

    if applied {
        info!(volume, book = book_number, op = ?correction.op, "applied correction");
    } else {
        diagnostics.push(
            DiagnosticKind::MissingPosition,
            format!(
                "correction {:?} does not fit volume {volume} book {book_number} with {} chapters",
                correction.op,
                book.children().len()
            ),
        );
    }
    Ok(applied)
}
