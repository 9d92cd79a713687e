use super::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChainStats {
    pub units: usize,
    pub chains: usize,
    pub narrator_mentions: usize,
    pub skipped: usize,
}

/// Extracts, links and registers the narrator chain of one unit.
///
/// Returns `Ok(false)` when the unit carries no chain. A narrator name that cannot
/// be relinked into its own preamble is an error.
pub fn process_unit(
    verse: &mut Verse,
    patterns: &ChainPatterns,
    registry: &mut NarratorRegistry,
    diagnostics: &mut Diagnostics,
) -> Result<bool> {
    let path = verse.path.clone().unwrap_or_default();

    let Some(preamble) = extract_preamble(patterns, verse) else {
        diagnostics.push(
            DiagnosticKind::MissingNarrators,
            format!("could not find narrators for {path}"),
        );
        return Ok(false);
    };

    let names = patterns.narrator_names(&preamble);
    let ids: Vec<u32> = names.iter().map(|name| registry.assign(name)).collect();
    let linked: Vec<(u32, &str)> = ids
        .iter()
        .copied()
        .zip(names.iter().map(String::as_str))
        .collect();

    let parts = link_parts(&preamble, &linked)
        .with_context(|| format!("failed to link narrator chain of {path}"))?;
    verse.narrator_chain = Some(NarratorChain {
        text: preamble,
        parts,
    });
    registry.record_unit(&path, &ids);

    Ok(true)
}

pub fn process_tree(
    root: &mut Chapter,
    patterns: &ChainPatterns,
    registry: &mut NarratorRegistry,
    diagnostics: &mut Diagnostics,
) -> Result<ChainStats> {
    let mut stats = ChainStats::default();

    root.for_each_leaf_mut(&mut |chapter| {
        let Some(verses) = chapter.verses_mut() else {
            return Ok(());
        };
        for verse in verses {
            if verse.part_type == PartType::Heading {
                continue;
            }
            stats.units += 1;
            if verse.text.is_empty() {
                warn!(path = verse.path.as_deref().unwrap_or(""), "no Arabic text found");
                stats.skipped += 1;
                continue;
            }
            if process_unit(verse, patterns, registry, diagnostics)? {
                stats.chains += 1;
                stats.narrator_mentions += verse
                    .narrator_chain
                    .as_ref()
                    .map(|chain| {
                        chain
                            .parts
                            .iter()
                            .filter(|part| matches!(part, SpecialText::Narrator { .. }))
                            .count()
                    })
                    .unwrap_or(0);
            }
        }
        Ok(())
    })?;

    Ok(stats)
}
