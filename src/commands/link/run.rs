use super::*;

pub fn run(args: LinkArgs) -> Result<()> {
    let mut stage = StageRun::start("link", &args.store.cache_root, None);
    let store = open_store(&args.store)?;
    let mut quran = load_tree(store.as_ref(), &args.quran_path)
        .context("the Quran tree must be stored before linking")?;
    let mut book = load_tree(store.as_ref(), &args.book_path)
        .context("the hadith tree must be built before linking")?;

    let pattern = CitationPattern::new()?;
    let mut diagnostics = Diagnostics::default();
    let stats = link_tree(&pattern, &mut quran, &mut book, &mut diagnostics)?;
    info!(
        linked_units = stats.linked_units,
        references = stats.references,
        "Quran references linked"
    );

    let mut records = insert_chapter(store.as_ref(), &book)?;
    records += insert_chapter(store.as_ref(), &quran)?;
    write_complete_tree(store.as_ref(), &args.book_path, &book)?;
    write_complete_tree(store.as_ref(), &args.quran_path, &quran)?;

    stage.count("units", stats.units);
    stage.count("linked_units", stats.linked_units);
    stage.count("references", stats.references);
    stage.count("missing_references", stats.missing);
    stage.count("records_written", records);
    stage.complete(store.describe(), diagnostics)?;
    Ok(())
}
