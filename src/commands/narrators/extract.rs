use super::*;

/// The terminal marker " قَالَ" is six characters long.
const TERMINAL_MARKER_CHARS: usize = 6;

pub struct ChainPatterns {
    span: Regex,
    terminal: Regex,
    continuation: Regex,
    prefix: Regex,
    conjunction: Regex,
}

impl ChainPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            span: Regex::new(r"</?span[^>]*>").context("failed to compile span regex")?,
            terminal: Regex::new("^(.*?) قَالَ")
                .context("failed to compile chain terminal regex")?,
            continuation: Regex::new(r"^\s*(حَدَّثَنِي)\s")
                .context("failed to compile chain continuation regex")?,
            prefix: Regex::new(r"^(?:[\d\s-]|أخْبَرَنَا|أَخْبَرَنَا)* ")
                .context("failed to compile chain prefix regex")?,
            conjunction: Regex::new(" (?:وَ|جَمِيعاً عَنْ|جَمِيعاً عَنِ|عَنْ|عَنِ|إِلَى|قَالَ حَدَّثَنِي|عَمَّنْ|مِمَّنْ|مِنْهُمْ) ")
                .context("failed to compile narrator conjunction regex")?,
        })
    }

    pub fn strip_spans(&self, line: &str) -> String {
        self.span.replace_all(line, "").into_owned()
    }

    /// Byte length of the citation preamble opening `line`, following second-order
    /// citations until no continuation marker comes after the terminal marker.
    pub fn preamble_len(&self, line: &str) -> Option<usize> {
        let mut end = self.terminal.find(line)?.end();
        while self.continuation.is_match(&line[end..]) {
            match self.terminal.find(&line[end..]) {
                Some(next) => end += next.end(),
                None => break,
            }
        }
        Some(end)
    }

    /// Candidate narrator names of a preamble, in chain order.
    pub fn narrator_names(&self, preamble: &str) -> Vec<String> {
        let span = match preamble.char_indices().rev().nth(TERMINAL_MARKER_CHARS - 1) {
            Some((at, _)) => &preamble[..at],
            None => "",
        };
        if span.is_empty() {
            return Vec::new();
        }

        let names = self.prefix.replace(span, "");
        self.conjunction
            .split(&names)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Moves the citation preamble off the unit's first line.
///
/// A chain left by an earlier run is folded back into the line first, so extraction
/// always starts from the original text. Returns `None`, with the line left whole,
/// when no terminal marker is present.
pub fn extract_preamble(patterns: &ChainPatterns, verse: &mut Verse) -> Option<String> {
    let first = verse.text.first_mut()?;
    if let Some(chain) = verse.narrator_chain.take() {
        first.insert_str(0, &chain.text);
    }
    *first = patterns.strip_spans(first);

    let end = patterns.preamble_len(first)?;
    let body = first.split_off(end);
    Some(std::mem::replace(first, body))
}

/// Re-splits the preamble on each narrator name in chain order.
///
/// Every name must still occur in what is left of the preamble; otherwise the
/// conjunction split and the relinking disagree and the unit cannot be linked.
pub fn link_parts(preamble: &str, narrators: &[(u32, &str)]) -> Result<Vec<SpecialText>> {
    let mut parts = Vec::with_capacity(narrators.len() * 2 + 1);
    let mut rest = preamble;

    for &(id, name) in narrators {
        let Some((before, after)) = rest.split_once(name) else {
            bail!("narrator {name:?} not found in remaining chain text {rest:?}");
        };
        if !before.is_empty() {
            parts.push(SpecialText::Plain {
                text: before.to_string(),
            });
        }
        parts.push(SpecialText::Narrator {
            text: name.to_string(),
            path: narrator_path(id),
        });
        rest = after;
    }

    parts.push(SpecialText::Plain {
        text: rest.to_string(),
    });
    Ok(parts)
}

/// Every contiguous run of two or more ids, keyed by the ids joined with `-`.
pub fn contiguous_subchains(ids: &[u32]) -> Vec<(String, Vec<u32>)> {
    let mut runs = Vec::new();
    for start in 0..ids.len() {
        for end in start + 2..=ids.len() {
            let run = &ids[start..end];
            let key = run
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join("-");
            runs.push((key, run.to_vec()));
        }
    }
    runs
}
