use super::*;

pub const QURAN_REFERENCE_KEY: &str = "Quran";
pub const HADITH_REFERENCE_KEY: &str = "Al-Kafi";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub units: usize,
    pub linked_units: usize,
    pub references: usize,
    pub missing: usize,
}

/// Quran verse at 1-based `sura` and `verse`, looked up by position.
pub fn quran_verse(quran: &mut Chapter, sura: u32, verse: u32) -> Option<&mut Verse> {
    let sura = quran
        .children_mut()?
        .get_mut((sura as usize).checked_sub(1)?)?;
    sura.verses_mut()?.get_mut((verse as usize).checked_sub(1)?)
}

/// Links the citations found in one unit's translations in both directions.
/// Returns the number of Quran verses the unit now refers to.
pub fn link_unit(
    pattern: &CitationPattern,
    quran: &mut Chapter,
    unit: &mut Verse,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut cited = BTreeSet::new();
    for id in [HUBEALI_TRANSLATION_ID, SARWAR_TRANSLATION_ID] {
        if let Some(lines) = unit.translations.get_mut(id) {
            for line in lines.iter_mut() {
                *line = pattern.link_line(line, &mut cited);
            }
        }
    }
    if cited.is_empty() {
        return 0;
    }

    let Some(unit_path) = unit.path.clone() else {
        warn!(citations = cited.len(), "unindexed unit carries Quran citations");
        return 0;
    };

    let mut targets = BTreeSet::new();
    for (sura, verse) in cited {
        let Some(target) = quran_verse(quran, sura, verse) else {
            diagnostics.push(
                DiagnosticKind::MissingCrossReference,
                format!("Quran reference {sura}:{verse} of {unit_path} does not exist"),
            );
            continue;
        };
        target
            .refs
            .get_or_insert_with(CrossReferences::new)
            .entry(HADITH_REFERENCE_KEY.to_string())
            .or_default()
            .insert(unit_path.clone());
        targets.insert(format!("{QURAN_PATH}:{sura}:{verse}"));
    }

    let linked = targets.len();
    if linked > 0 {
        unit.refs
            .get_or_insert_with(CrossReferences::new)
            .insert(QURAN_REFERENCE_KEY.to_string(), targets);
    }
    linked
}

pub fn link_tree(
    pattern: &CitationPattern,
    quran: &mut Chapter,
    book: &mut Chapter,
    diagnostics: &mut Diagnostics,
) -> Result<LinkStats> {
    let mut stats = LinkStats::default();
    let missing_before = diagnostics.count(DiagnosticKind::MissingCrossReference);

    book.for_each_leaf_mut(&mut |chapter| {
        let Some(units) = chapter.verses_mut() else {
            return Ok(());
        };
        for unit in units {
            stats.units += 1;
            let linked = link_unit(pattern, quran, unit, diagnostics);
            if linked > 0 {
                stats.linked_units += 1;
                stats.references += linked;
            }
        }
        Ok(())
    })?;

    stats.missing = diagnostics.count(DiagnosticKind::MissingCrossReference) - missing_before;
    Ok(stats)
}
