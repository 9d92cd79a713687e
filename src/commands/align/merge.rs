use super::*;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged: usize,
    pub appended: usize,
    pub dropped: usize,
}

/// Attaches the secondary translation of one chapter page to the primary chapter.
///
/// Secondary units line up with the chapter's non-heading units, starting at
/// `policy.start`. Surplus units are appended (or dropped when the policy says so).
pub fn merge_chapter(
    chapter: &mut Chapter,
    secondary: SecondaryChapter,
    policy: MergePolicy,
    source: &str,
    target_path: &str,
    diagnostics: &mut Diagnostics,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    if !chapter.is_leaf() {
        diagnostics.push(
            DiagnosticKind::MissingPosition,
            format!("{target_path} is not a chapter of units; {source} was not merged"),
        );
        return outcome;
    }

    if chapter.title(Language::En).is_none() {
        if let Some(title) = secondary.title {
            chapter.set_title(Language::En, title);
        }
    }
    chapter.register_translation(Translation::sarwar());

    let Some(verses) = chapter.verses_mut() else {
        return outcome;
    };

    let content_positions: Vec<usize> = verses
        .iter()
        .enumerate()
        .filter(|(_, verse)| verse.part_type != PartType::Heading)
        .map(|(position, _)| position)
        .collect();
    let primary_count = content_positions.len();

    let mut position = policy.start;
    for unit in secondary.units {
        let verse = match content_positions.get(position) {
            Some(&at) => {
                let verse = &mut verses[at];
                if verse.part_type != PartType::Hadith {
                    diagnostics.push(
                        DiagnosticKind::UnitTypeMismatch,
                        format!(
                            "unit {} of {target_path} is a {} where {source} expects a hadith",
                            position + 1,
                            verse.part_type
                        ),
                    );
                }
                outcome.merged += 1;
                verse
            }
            None if policy.drop_excess => {
                outcome.dropped += 1;
                continue;
            }
            None => {
                diagnostics.push(
                    DiagnosticKind::AppendedUnit,
                    format!(
                        "appending hadith #{} from {source} to {target_path}",
                        position + 1
                    ),
                );
                verses.push(Verse::new(PartType::Hadith, unit.arabic));
                outcome.appended += 1;
                let last = verses.len() - 1;
                &mut verses[last]
            }
        };

        verse
            .translations
            .insert(SARWAR_TRANSLATION_ID.to_string(), vec![unit.english]);
        if let Some(gradings) = unit.gradings {
            verse.gradings = Some(gradings);
        }
        position += 1;
    }

    if outcome.dropped > 0 {
        info!(
            source,
            target = target_path,
            dropped = outcome.dropped,
            "dropped surplus secondary units"
        );
    }

    if policy.check_count && position != primary_count {
        diagnostics.push(
            DiagnosticKind::CountMismatch,
            format!("{source} has {position} hadith but {target_path} has {primary_count}"),
        );
    }

    outcome
}
