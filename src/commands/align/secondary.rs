use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryUnit {
    pub arabic: Vec<String>,
    pub english: String,
    pub gradings: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryChapter {
    pub title: Option<String>,
    pub units: Vec<SecondaryUnit>,
}

pub struct SecondaryParser {
    separator: Regex,
    paragraph: Selector,
    title: Selector,
}

impl SecondaryParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            separator: Regex::new(r"<hr\s*/?>").context("failed to compile separator regex")?,
            paragraph: parse_selector("p")?,
            title: parse_selector("div.card-body h3")?,
        })
    }

    /// Parses a whole chapter page. Any malformed unit fails the file so that nothing
    /// from it is merged.
    pub fn parse(&self, html: &str) -> Result<SecondaryChapter> {
        let title = Html::parse_document(html)
            .select(&self.title)
            .next()
            .map(|heading| heading.inner_html());

        let mut units = Vec::new();
        for (piece_index, piece) in self.separator.split(html).enumerate() {
            if piece.contains("<body>") || piece.contains("</body>") {
                continue;
            }
            let unit = self
                .parse_unit(piece)
                .with_context(|| format!("unit {} of the chapter page", piece_index))?;
            units.push(unit);
        }

        Ok(SecondaryChapter { title, units })
    }

    fn parse_unit(&self, piece: &str) -> Result<SecondaryUnit> {
        let fragment = Html::parse_fragment(piece);
        let paragraphs: Vec<ElementRef<'_>> = fragment.select(&self.paragraph).collect();

        let arabic: Vec<String> = paragraphs
            .iter()
            .take_while(|paragraph| paragraph.value().attr("dir") == Some("rtl"))
            .map(|paragraph| paragraph.inner_html())
            .collect();

        let english_at = arabic.len();
        let Some(english) = paragraphs.get(english_at) else {
            bail!(
                "expected an English paragraph after {} Arabic paragraphs",
                arabic.len()
            );
        };

        let mut gradings = None;
        if paragraphs.len() > english_at + 2 {
            let grading_title = paragraphs[english_at + 1].inner_html();
            if grading_title.starts_with("Grading:") {
                let end = paragraphs.len().saturating_sub(3);
                let start = english_at + 2;
                gradings = Some(
                    paragraphs
                        .get(start..end.max(start))
                        .unwrap_or_default()
                        .iter()
                        .map(|paragraph| paragraph.inner_html())
                        .collect(),
                );
            }
        }

        Ok(SecondaryUnit {
            arabic,
            english: english.inner_html(),
            gradings,
        })
    }
}
