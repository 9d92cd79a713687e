use super::*;

pub fn run(args: AlignArgs) -> Result<()> {
    let mut stage = StageRun::start(
        "align",
        &args.store.cache_root,
        Some(args.source_root.as_path()),
    );
    let store = open_store(&args.store)?;
    let mut diagnostics = Diagnostics::default();

    let (counts, records) = align_store(store.as_ref(), &args.source_root, &mut diagnostics)?;

    stage.count("secondary_files", counts.secondary_files);
    stage.count("merged_units", counts.merged_units);
    stage.count("appended_units", counts.appended_units);
    stage.count("dropped_units", counts.dropped_units);
    stage.count("corrections_applied", counts.corrections_applied);
    stage.count("records_written", records);
    stage.complete(store.describe(), diagnostics)?;
    Ok(())
}

/// Aligns the stored primary tree and writes the result as the complete tree.
///
/// Every run starts again from the primary tree, so corrections are never applied
/// on top of an earlier alignment.
pub fn align_store(
    store: &dyn RecordStore,
    source_root: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<(AlignCounts, usize)> {
    let mut root = load_tree(store, BOOK_PRIMARY_PATH)
        .context("the primary tree must be built before alignment")?;

    let plan = AlignmentPlan::kafi();
    let parser = SecondaryParser::new()?;
    let mut aligner = Aligner::new(&plan, &parser, source_root);

    let volumes = root
        .children_mut()
        .context("primary tree holds no volumes")?;
    for (position, volume) in volumes.iter_mut().enumerate() {
        let volume_number = position as u32 + 1;
        aligner.align_volume(volume_number, volume, diagnostics)?;
        info!(volume = volume_number, "volume aligned");
    }

    Indexer::new()?.index(&mut root, diagnostics);

    let records = insert_chapter(store, &root)?;
    write_complete_tree(store, BOOK_COMPLETE_PATH, &root)?;
    Ok((aligner.counts(), records))
}
