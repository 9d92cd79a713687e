use super::*;

/// Matches `[s:v]` and `(s:v)` citations, together with the anchor of an earlier
/// linking run when one wraps the citation.
pub struct CitationPattern {
    quote: Regex,
}

impl CitationPattern {
    pub fn new() -> Result<Self> {
        Ok(Self {
            quote: Regex::new(r#"(<a href="/#/books/quran:\d+#h\d+">)?[\[\(](\d+):(\d+)[\]\)](</a>)?"#)
                .context("failed to compile Quran citation regex")?,
        })
    }

    /// Rewrites every citation of `line` as a link and collects the cited
    /// `(sura, verse)` pairs. Citations that are already linked are collected but
    /// left as they are.
    pub fn link_line(&self, line: &str, cited: &mut BTreeSet<(u32, u32)>) -> String {
        self.quote
            .replace_all(line, |caps: &Captures| {
                let (Ok(sura), Ok(verse)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>())
                else {
                    return caps[0].to_string();
                };
                cited.insert((sura, verse));

                let opening = caps.get(1).map_or("", |m| m.as_str());
                let closing = caps.get(4).map_or("", |m| m.as_str());
                if !opening.is_empty() && !closing.is_empty() {
                    return caps[0].to_string();
                }
                format!("{opening}{}{closing}", citation_link(sura, verse))
            })
            .into_owned()
    }
}

pub fn citation_link(sura: u32, verse: u32) -> String {
    format!("<a href=\"/#{QURAN_PATH}:{sura}#h{verse}\">[{sura}:{verse}]</a>")
}
