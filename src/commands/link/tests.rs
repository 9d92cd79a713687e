use super::*;
use crate::model::PartType;

fn pattern() -> CitationPattern {
    CitationPattern::new().expect("citation pattern should compile")
}

fn quran() -> Chapter {
    let mut root = Chapter::internal(PartType::Book);
    root.path = Some(QURAN_PATH.to_string());
    let suras = root.children_mut().expect("book holds suras");
    for (sura_number, verse_count) in [(1_u32, 7_u32), (2, 3)] {
        let mut sura = Chapter::leaf(PartType::Chapter);
        sura.path = Some(format!("{QURAN_PATH}:{sura_number}"));
        let verses = sura.verses_mut().expect("sura holds verses");
        for verse_number in 1..=verse_count {
            let mut verse = Verse::new(PartType::Verse, vec![format!("آية {verse_number}")]);
            verse.path = Some(format!("{QURAN_PATH}:{sura_number}:{verse_number}"));
            verses.push(verse);
        }
        suras.push(sura);
    }
    root
}

fn hadith(path: &str, hubeali: &str, sarwar: &str) -> Verse {
    let mut verse = Verse::new(PartType::Hadith, vec!["حديث".to_string()]);
    verse.path = Some(path.to_string());
    verse
        .translations
        .insert(HUBEALI_TRANSLATION_ID.to_string(), vec![hubeali.to_string()]);
    verse
        .translations
        .insert(SARWAR_TRANSLATION_ID.to_string(), vec![sarwar.to_string()]);
    verse
}

#[test]
fn rewrites_both_citation_styles() {
    let mut cited = BTreeSet::new();
    let line = pattern().link_line("He recited [2:3] and then (1:7).", &mut cited);

    assert_eq!(
        line,
        "He recited <a href=\"/#/books/quran:2#h3\">[2:3]</a> and then \
         <a href=\"/#/books/quran:1#h7\">[1:7]</a>."
    );
    assert_eq!(cited, BTreeSet::from([(1, 7), (2, 3)]));
}

#[test]
fn linked_citations_are_kept_but_still_collected() {
    let pattern = pattern();
    let mut cited = BTreeSet::new();
    let once = pattern.link_line("See [2:1].", &mut cited);
    cited.clear();
    let twice = pattern.link_line(&once, &mut cited);

    assert_eq!(twice, once);
    assert_eq!(cited, BTreeSet::from([(2, 1)]));
}

#[test]
fn text_without_citations_is_unchanged() {
    let mut cited = BTreeSet::new();
    let line = pattern().link_line("Chapter 12 [note] (a:b)", &mut cited);
    assert_eq!(line, "Chapter 12 [note] (a:b)");
    assert!(cited.is_empty());
}

#[test]
fn unit_and_quran_verse_refer_to_each_other() {
    let pattern = pattern();
    let mut quran = quran();
    let mut diagnostics = Diagnostics::default();
    let mut unit = hadith(
        "/books/al-kafi:1:2:3:4",
        "as in [2:1]",
        "recited (1:2) and [9:9] and [0:1]",
    );

    let linked = link_unit(&pattern, &mut quran, &mut unit, &mut diagnostics);

    assert_eq!(linked, 2);
    let refs = unit.refs.as_ref().expect("unit refs set");
    assert_eq!(
        refs[QURAN_REFERENCE_KEY],
        BTreeSet::from([
            "/books/quran:1:2".to_string(),
            "/books/quran:2:1".to_string()
        ])
    );
    let target = quran_verse(&mut quran, 2, 1).expect("verse exists");
    assert_eq!(
        target.refs.as_ref().expect("verse refs set")[HADITH_REFERENCE_KEY],
        BTreeSet::from(["/books/al-kafi:1:2:3:4".to_string()])
    );
    assert_eq!(diagnostics.count(DiagnosticKind::MissingCrossReference), 2);
    assert!(unit.translations[SARWAR_TRANSLATION_ID][0].contains("[9:9]</a>"));
}

#[test]
fn positional_lookup_rejects_zero_and_overflow() {
    let mut quran = quran();
    assert!(quran_verse(&mut quran, 0, 1).is_none());
    assert!(quran_verse(&mut quran, 1, 0).is_none());
    assert!(quran_verse(&mut quran, 2, 4).is_none());
    assert!(quran_verse(&mut quran, 3, 1).is_none());
    assert!(quran_verse(&mut quran, 1, 7).is_some());
}

#[test]
fn tree_linking_counts_units_and_references() {
    let pattern = pattern();
    let mut quran = quran();
    let mut diagnostics = Diagnostics::default();

    let mut book = Chapter::internal(PartType::Book);
    let chapters = book.children_mut().expect("book holds chapters");
    let mut first = Chapter::leaf(PartType::Chapter);
    first.verses_mut().expect("leaf").extend([
        hadith("/books/al-kafi:1:1:1:1", "see [1:1]", "and [1:2]"),
        hadith("/books/al-kafi:1:1:1:2", "no citation", "none here"),
    ]);
    let mut second = Chapter::leaf(PartType::Chapter);
    second
        .verses_mut()
        .expect("leaf")
        .push(hadith("/books/al-kafi:1:1:2:1", "see [1:1]", "[4:4]"));
    chapters.push(first);
    chapters.push(second);

    let stats = link_tree(&pattern, &mut quran, &mut book, &mut diagnostics).expect("links");

    assert_eq!(
        stats,
        LinkStats {
            units: 3,
            linked_units: 2,
            references: 3,
            missing: 1,
        }
    );
    let opening = quran_verse(&mut quran, 1, 1).expect("verse exists");
    assert_eq!(
        opening.refs.as_ref().expect("refs")[HADITH_REFERENCE_KEY].len(),
        2
    );
    assert!(book.children()[0].verses()[1].refs.is_none());
}
