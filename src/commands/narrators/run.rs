use super::*;

pub fn run(args: NarratorsArgs) -> Result<()> {
    let mut stage = StageRun::start("narrators", &args.store.cache_root, None);
    let store = open_store(&args.store)?;
    let mut root = load_tree(store.as_ref(), BOOK_COMPLETE_PATH)
        .context("the primary tree must be built before narrator extraction")?;

    let mut registry = if args.seed_registry {
        NarratorRegistry::seed(store.as_ref())?
    } else {
        NarratorRegistry::default()
    };
    let seeded = registry.len();

    let patterns = ChainPatterns::new()?;
    let mut diagnostics = Diagnostics::default();
    let stats = process_tree(&mut root, &patterns, &mut registry, &mut diagnostics)?;
    info!(
        chains = stats.chains,
        narrators = registry.len(),
        "narrator chains extracted"
    );

    let narrators_written = registry.persist(store.as_ref())?;
    let records = insert_chapter(store.as_ref(), &root)?;
    write_complete_tree(store.as_ref(), BOOK_COMPLETE_PATH, &root)?;

    stage.count("units", stats.units);
    stage.count("units_without_text", stats.skipped);
    stage.count("chains", stats.chains);
    stage.count("narrator_mentions", stats.narrator_mentions);
    stage.count("seeded_narrators", seeded);
    stage.count("narrators", registry.len());
    stage.count("narrator_records_written", narrators_written);
    stage.count("records_written", records);
    stage.complete(store.describe(), diagnostics)?;
    Ok(())
}
