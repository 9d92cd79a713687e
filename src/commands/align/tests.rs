use std::fs;

use super::*;

fn hadith(text: &str) -> Verse {
    Verse::new(PartType::Hadith, vec![text.to_string()])
}

fn chapter_with(units: Vec<Verse>) -> Chapter {
    let mut chapter = Chapter::leaf(PartType::Chapter);
    chapter
        .verses_mut()
        .expect("new leaf should hold verses")
        .extend(units);
    chapter
}

fn book_with(chapters: Vec<Chapter>) -> Chapter {
    let mut book = Chapter::internal(PartType::Book);
    book.children_mut()
        .expect("internal node should hold chapters")
        .extend(chapters);
    book
}

fn secondary(count: usize) -> SecondaryChapter {
    SecondaryChapter {
        title: Some("Secondary title".to_string()),
        units: (1..=count)
            .map(|n| SecondaryUnit {
                arabic: vec![format!("ar {n}")],
                english: format!("en {n}"),
                gradings: None,
            })
            .collect(),
    }
}

const CHECKED: MergePolicy = MergePolicy {
    start: 0,
    drop_excess: false,
    check_count: true,
};

fn sarwar(verse: &Verse) -> Option<&[String]> {
    verse
        .translations
        .get(SARWAR_TRANSLATION_ID)
        .map(Vec::as_slice)
}

#[test]
fn surplus_secondary_units_are_appended_and_counted() {
    let mut chapter = chapter_with(vec![hadith("a"), hadith("b"), hadith("c")]);
    let mut diagnostics = Diagnostics::default();

    let outcome = merge_chapter(
        &mut chapter,
        secondary(5),
        CHECKED,
        "1/1/1.html",
        "/books/al-kafi:1:1:1",
        &mut diagnostics,
    );

    assert_eq!(outcome.merged, 3);
    assert_eq!(outcome.appended, 2);
    let verses = chapter.verses();
    assert_eq!(verses.len(), 5);
    assert_eq!(verses[0].text, vec!["a".to_string()]);
    assert_eq!(sarwar(&verses[0]), Some(&["en 1".to_string()][..]));
    assert_eq!(verses[3].text, vec!["ar 4".to_string()]);
    assert_eq!(verses[3].part_type, PartType::Hadith);
    assert_eq!(sarwar(&verses[4]), Some(&["en 5".to_string()][..]));
    assert!(chapter.verse_translations.contains(&Translation::sarwar()));

    assert_eq!(diagnostics.count(DiagnosticKind::AppendedUnit), 2);
    let mismatches: Vec<_> = diagnostics.of_kind(DiagnosticKind::CountMismatch).collect();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].message.contains("has 5 hadith"));
    assert!(mismatches[0].message.ends_with("has 3"));
}

#[test]
fn merge_into_a_chapter_list_leaves_it_untouched() {
    let mut chapter = book_with(vec![chapter_with(vec![hadith("a")])]);
    let mut diagnostics = Diagnostics::default();

    let outcome = merge_chapter(
        &mut chapter,
        secondary(2),
        CHECKED,
        "1/1/1.html",
        "/books/al-kafi:1:1",
        &mut diagnostics,
    );

    assert_eq!(outcome.merged, 0);
    assert_eq!(outcome.appended, 0);
    assert!(chapter.title(Language::En).is_none());
    assert!(chapter.verse_translations.is_empty());
    assert_eq!(chapter.children()[0].verses().len(), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::MissingPosition), 1);
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn heading_units_do_not_advance_the_position() {
    let mut chapter = chapter_with(vec![
        hadith("a"),
        Verse::new(PartType::Heading, vec!["heading".to_string()]),
        hadith("b"),
    ]);
    let mut diagnostics = Diagnostics::default();

    merge_chapter(
        &mut chapter,
        secondary(2),
        CHECKED,
        "1/1/1.html",
        "/books/al-kafi:1:1:1",
        &mut diagnostics,
    );

    let verses = chapter.verses();
    assert_eq!(verses.len(), 3);
    assert_eq!(sarwar(&verses[1]), None);
    assert_eq!(sarwar(&verses[2]), Some(&["en 2".to_string()][..]));
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.entries());
}

#[test]
fn drop_excess_policy_discards_surplus_units() {
    let mut chapter = chapter_with(vec![hadith("a"), hadith("b"), hadith("c")]);
    let mut diagnostics = Diagnostics::default();

    let outcome = merge_chapter(
        &mut chapter,
        secondary(5),
        MergePolicy {
            drop_excess: true,
            ..CHECKED
        },
        "7/2/1.html",
        "/books/al-kafi:7:2:1",
        &mut diagnostics,
    );

    assert_eq!(outcome.dropped, 2);
    assert_eq!(chapter.verses().len(), 3);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.entries());
}

#[test]
fn non_hadith_unit_at_position_is_reported_but_still_merged() {
    let mut chapter = chapter_with(vec![
        hadith("a"),
        Verse::new(PartType::Verse, vec!["verse".to_string()]),
    ]);
    let mut diagnostics = Diagnostics::default();

    merge_chapter(
        &mut chapter,
        secondary(2),
        CHECKED,
        "1/1/1.html",
        "/books/al-kafi:1:1:1",
        &mut diagnostics,
    );

    assert_eq!(diagnostics.count(DiagnosticKind::UnitTypeMismatch), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(sarwar(&chapter.verses()[1]), Some(&["en 2".to_string()][..]));
}

#[test]
fn start_offset_targets_later_units_and_keeps_existing_title() {
    let mut chapter = chapter_with(vec![hadith("a"), hadith("b"), hadith("c"), hadith("d")]);
    chapter.set_title(Language::En, "Primary title");
    let mut diagnostics = Diagnostics::default();

    merge_chapter(
        &mut chapter,
        secondary(1),
        MergePolicy {
            start: 2,
            drop_excess: false,
            check_count: false,
        },
        "8/1/5.html",
        "/books/al-kafi:8:1:3",
        &mut diagnostics,
    );

    let verses = chapter.verses();
    assert_eq!(sarwar(&verses[1]), None);
    assert_eq!(sarwar(&verses[2]), Some(&["en 1".to_string()][..]));
    assert_eq!(sarwar(&verses[3]), None);
    assert_eq!(chapter.title(Language::En), Some("Primary title"));
    assert!(diagnostics.is_empty());
}

#[test]
fn untitled_chapter_takes_secondary_title() {
    let mut chapter = chapter_with(vec![hadith("a")]);
    let mut diagnostics = Diagnostics::default();

    merge_chapter(
        &mut chapter,
        secondary(1),
        CHECKED,
        "1/1/1.html",
        "/books/al-kafi:1:1:1",
        &mut diagnostics,
    );

    assert_eq!(chapter.title(Language::En), Some("Secondary title"));
}

#[test]
fn position_rules_remap_books_and_chapters() {
    let plan = AlignmentPlan::kafi();

    assert_eq!(plan.primary_book(6, 2), 2);
    assert_eq!(plan.primary_book(6, 3), 4);
    assert_eq!(plan.primary_book(6, 5), 6);
    assert_eq!(plan.primary_book(5, 3), 3);

    let target = |key, chapter| plan.resolve(key, chapter).map(|t| (t.chapter, t.start));
    assert_eq!(target((1, 1), 4), Some((4, 0)));
    assert_eq!(target((7, 2), 0), Some((0, 0)));
    assert_eq!(target((7, 2), 1), Some((2, 0)));
    assert_eq!(target((7, 1), 1), Some((1, 0)));
}

#[test]
fn final_volume_files_map_through_unit_totals() {
    let plan = AlignmentPlan::kafi();
    let target = |chapter| plan.resolve((8, 1), chapter).map(|t| (t.chapter, t.start));

    assert_eq!(target(0), Some((0, 0)));
    assert_eq!(target(1), Some((1, 0)));
    assert_eq!(target(2), Some((1, 1)));
    assert_eq!(target(3), Some((2, 0)));
    assert_eq!(target(596), Some((51, 10)));
    assert_eq!(target(597), None);
}

#[test]
fn merge_policy_marks_exempt_and_drop_excess_chapters() {
    let plan = AlignmentPlan::kafi();
    let first = ChapterTarget {
        chapter: 0,
        start: 0,
    };

    let inheritance = plan.merge_policy((7, 2), first);
    assert!(inheritance.drop_excess);
    assert!(inheritance.check_count);

    let garden = plan.merge_policy((8, 1), ChapterTarget { chapter: 3, start: 4 });
    assert!(!garden.drop_excess);
    assert!(!garden.check_count);
    assert_eq!(garden.start, 4);
}

#[test]
fn correction_table_is_ordered_per_book() {
    let plan = AlignmentPlan::kafi();
    assert_eq!(plan.corrections.len(), 15);

    let third_book: Vec<_> = plan.corrections_for((5, 3)).map(|c| c.op).collect();
    assert_eq!(third_book.len(), 7);
    assert!(matches!(
        third_book[0],
        CorrectionOp::InsertChapter { at: 22, .. }
    ));
    assert!(matches!(
        third_book[6],
        CorrectionOp::Substitute { at: 189, .. }
    ));
    assert_eq!(plan.corrections_for((6, 3)).count(), 0);
}

#[test]
fn merged_chapter_is_split_back_out() {
    let plan = AlignmentPlan::kafi();
    let mut chapters: Vec<Chapter> = (0..227).map(|_| chapter_with(vec![hadith("x")])).collect();
    chapters[226] = chapter_with(vec![hadith("first"), hadith("moved")]);
    let mut book = book_with(chapters);
    let mut diagnostics = Diagnostics::default();

    for correction in plan.corrections_for((4, 3)) {
        let applied = apply_correction(
            correction,
            &mut book,
            Path::new("corrections"),
            &mut diagnostics,
        )
        .expect("correction should apply");
        assert!(applied);
    }

    let chapters = book.children();
    assert_eq!(chapters.len(), 228);
    assert_eq!(chapters[226].verses().len(), 1);
    assert!(
        chapters[227]
            .title(Language::Ar)
            .is_some_and(|title| title.starts_with("دُعَاءٌ"))
    );
    assert_eq!(chapters[227].verses()[0].text, vec!["moved".to_string()]);
    assert!(diagnostics.is_empty());
}

#[test]
fn substitution_loads_chapter_from_correction_file_once() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let corrections_dir = dir.path().join("corrections");
    fs::create_dir_all(&corrections_dir).expect("corrections dir should be created");
    fs::write(
        corrections_dir.join("al-kafi_v5_b2_c82.json"),
        r#"{"data": {"part_type": "Chapter", "titles": {"en": "Chapter 82"}, "verses": [{"part_type": "Hadith", "text": ["corrected"], "translations": {}}]}}"#,
    )
    .expect("correction file should be written");

    let plan = AlignmentPlan::kafi();
    let parser = SecondaryParser::new().expect("parser should build");
    let mut aligner = Aligner::new(&plan, &parser, dir.path());
    let mut book = book_with((0..81).map(|_| chapter_with(vec![hadith("x")])).collect());
    let mut diagnostics = Diagnostics::default();

    aligner
        .ensure_corrected((5, 2), &mut book, &mut diagnostics)
        .expect("corrections should apply");
    aligner
        .ensure_corrected((5, 2), &mut book, &mut diagnostics)
        .expect("second pass should be a no-op");

    let chapters = book.children();
    assert_eq!(chapters.len(), 82);
    assert_eq!(chapters[81].title(Language::En), Some("Chapter 82"));
    assert_eq!(chapters[81].verses()[0].text, vec!["corrected".to_string()]);
    assert_eq!(aligner.counts().corrections_applied, 2);
    assert!(diagnostics.is_empty());
}

#[test]
fn missing_correction_file_is_fatal() {
    let plan = AlignmentPlan::kafi();
    let mut book = book_with((0..200).map(|_| chapter_with(vec![hadith("x")])).collect());
    let mut diagnostics = Diagnostics::default();
    let dir = tempfile::tempdir().expect("temp dir should be created");

    let substitution = plan
        .corrections_for((5, 3))
        .find(|c| matches!(c.op, CorrectionOp::Substitute { .. }))
        .expect("book has a substitution");
    assert!(apply_correction(substitution, &mut book, dir.path(), &mut diagnostics).is_err());
}

#[test]
fn correction_outside_the_book_is_reported() {
    let plan = AlignmentPlan::kafi();
    let mut book = book_with(vec![chapter_with(vec![hadith("x")])]);
    let mut diagnostics = Diagnostics::default();

    for correction in plan.corrections_for((7, 2)) {
        let applied = apply_correction(
            correction,
            &mut book,
            Path::new("corrections"),
            &mut diagnostics,
        )
        .expect("out of range insert is not fatal");
        assert!(!applied);
    }
    assert_eq!(book.children().len(), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::MissingPosition), 1);
}

const CHAPTER_PAGE: &str = r#"<html><body><div class="card-body"><h3>The Intellect</h3></div>
<hr/>
<p dir="rtl">عربي</p><p dir="rtl">سطر</p><p>English <b>one</b></p><p>Grading:</p><p>Sahih</p><p>Majlisi</p><p>a</p><p>b</p><p>c</p>
<hr>
<p dir="rtl">ثاني</p><p>English two</p>
<hr/>
</body></html>"#;

#[test]
fn chapter_page_splits_into_units_with_gradings() {
    let parser = SecondaryParser::new().expect("parser should build");
    let chapter = parser.parse(CHAPTER_PAGE).expect("page should parse");

    assert_eq!(chapter.title.as_deref(), Some("The Intellect"));
    assert_eq!(chapter.units.len(), 2);

    let first = &chapter.units[0];
    assert_eq!(first.arabic, vec!["عربي".to_string(), "سطر".to_string()]);
    assert_eq!(first.english, "English <b>one</b>");
    assert_eq!(
        first.gradings,
        Some(vec!["Sahih".to_string(), "Majlisi".to_string()])
    );

    let second = &chapter.units[1];
    assert_eq!(second.arabic, vec!["ثاني".to_string()]);
    assert_eq!(second.english, "English two");
    assert_eq!(second.gradings, None);
}

#[test]
fn unit_without_english_paragraph_fails_the_page() {
    let parser = SecondaryParser::new().expect("parser should build");
    let page = "<html><body>\n<hr/><p dir=\"rtl\">only arabic</p><hr/>\n</body></html>";
    assert!(parser.parse(page).is_err());
}

fn write_page(dir: &Path, name: &str, units: usize) {
    let mut html = String::from("<html><body><div class=\"card-body\"><h3>t</h3></div>\n");
    for n in 1..=units {
        html.push_str(&format!("<hr/><p dir=\"rtl\">ar {n}</p><p>en {n}</p>\n"));
    }
    html.push_str("<hr/>\n</body></html>");
    fs::write(dir.join(name), html).expect("page should be written");
}

#[test]
fn volume_alignment_walks_numbered_directories() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let plan = AlignmentPlan::kafi();
    let parser = SecondaryParser::new().expect("parser should build");
    let mut aligner = Aligner::new(&plan, &parser, dir.path());

    let book_dir = aligner.secondary_volume_dir(1).join("1");
    fs::create_dir_all(&book_dir).expect("book dir should be created");
    fs::create_dir_all(aligner.secondary_volume_dir(1).join("2")).expect("extra book dir");
    write_page(&book_dir, "0.html", 1);
    write_page(&book_dir, "1.html", 2);
    write_page(&book_dir, "2.html", 2);

    let mut volume = Chapter::internal(PartType::Volume);
    volume
        .children_mut()
        .expect("volume holds books")
        .push(book_with(vec![
            chapter_with(vec![hadith("a"), hadith("b")]),
            chapter_with(vec![hadith("c")]),
        ]));
    let mut diagnostics = Diagnostics::default();

    aligner
        .align_volume(1, &mut volume, &mut diagnostics)
        .expect("volume should align");

    let chapters = volume.children()[0].children();
    assert_eq!(sarwar(&chapters[0].verses()[1]), Some(&["en 2".to_string()][..]));
    assert_eq!(chapters[1].verses().len(), 2);

    let counts = aligner.counts();
    assert_eq!(counts.secondary_files, 2);
    assert_eq!(counts.merged_units, 3);
    assert_eq!(counts.appended_units, 1);

    assert_eq!(diagnostics.count(DiagnosticKind::SkippedSource), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::AppendedUnit), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::CountMismatch), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::MissingPosition), 1);
}

#[test]
fn repeated_alignment_starts_from_the_primary_tree() {
    use crate::commands::build::kafi_root;
    use crate::store::SqliteStore;

    let dir = tempfile::tempdir().expect("temp dir should be created");
    for volume in 1..=7 {
        fs::create_dir_all(secondary_volume_dir(dir.path(), volume))
            .expect("volume dir should be created");
    }
    fs::create_dir_all(secondary_volume_dir(dir.path(), 7).join("2"))
        .expect("book dir should be created");

    let mut root = kafi_root();
    let volumes = root.children_mut().expect("root holds volumes");
    for _ in 1..=6 {
        volumes.push(Chapter::internal(PartType::Volume));
    }
    let mut seventh = Chapter::internal(PartType::Volume);
    let books = seventh.children_mut().expect("volume holds books");
    books.push(book_with(vec![chapter_with(vec![hadith("a")])]));
    books.push(book_with(
        (0..10).map(|n| chapter_with(vec![hadith(&n.to_string())])).collect(),
    ));
    volumes.push(seventh);

    let store = SqliteStore::in_memory().expect("in-memory store");
    write_complete_tree(&store, BOOK_PRIMARY_PATH, &root).expect("primary tree stored");

    for _ in 0..2 {
        let mut diagnostics = Diagnostics::default();
        let (counts, _) =
            align_store(&store, dir.path(), &mut diagnostics).expect("alignment should run");
        assert_eq!(counts.corrections_applied, 1);

        let aligned = load_tree(&store, BOOK_COMPLETE_PATH).expect("complete tree stored");
        let book = &aligned.children()[6].children()[1];
        assert_eq!(book.children().len(), 11);
        assert!(book.children()[9].verses().is_empty());
    }
}
