use super::*;

pub fn run(args: BuildArgs) -> Result<()> {
    let mut stage = StageRun::start(
        "build",
        &args.store.cache_root,
        Some(args.source_root.as_path()),
    );
    let store = open_store(&args.store)?;

    let selectors = FileSelectors::new()?;
    let patterns = BuildPatterns::new()?;
    let mut diagnostics = Diagnostics::default();

    let mut root = kafi_root();
    let mut file_count = 0;
    for spec in &VOLUMES {
        let dir = spec.directory(&args.source_root);
        let files = discover_primary_files(&dir)
            .with_context(|| format!("missing primary corpus for volume {}", spec.number))?;
        if files.is_empty() {
            bail!("no chapter files found in {}", dir.display());
        }
        file_count += files.len();

        let volume = build_volume(
            spec,
            &args.source_root,
            &files,
            &selectors,
            &patterns,
            &mut diagnostics,
        )?;
        info!(
            volume = spec.number,
            books = volume.children().len(),
            "volume built"
        );
        root.children_mut()
            .context("root book cannot hold volumes")?
            .push(volume);
    }

    Indexer::new()?.index(&mut root, &mut diagnostics);

    let records = insert_chapter(store.as_ref(), &root)?;
    write_complete_tree(store.as_ref(), BOOK_PRIMARY_PATH, &root)?;
    write_complete_tree(store.as_ref(), BOOK_COMPLETE_PATH, &root)?;

    stage.count("primary_files", file_count);
    stage.count("records_written", records);
    stage.count("hadith_units", root.verse_count as usize);
    stage.complete(store.describe(), diagnostics)?;
    Ok(())
}

pub fn build_volume(
    spec: &VolumeSpec,
    source_root: &Path,
    files: &[PathBuf],
    selectors: &FileSelectors,
    patterns: &BuildPatterns,
    diagnostics: &mut Diagnostics,
) -> Result<Chapter> {
    let mut builder = VolumeBuilder::new(patterns, spec.variant);

    for path in files {
        if builder.is_finished() {
            break;
        }
        let source = relative_display(source_root, path);
        info!(file = %source, "processing primary file");

        let html = read_to_string(path)?;
        let file = parse_chapter_file(&html, selectors, patterns);
        builder.process_file(&source, file, diagnostics);
    }

    let mut volume = spec.empty_node();
    let books = builder.finish(diagnostics);
    volume
        .children_mut()
        .context("volume node cannot hold books")?
        .extend(books);
    Ok(volume)
}
