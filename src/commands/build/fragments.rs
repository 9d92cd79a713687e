use super::*;

/// One sibling element of the chapter body, reduced to what classification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub tag: String,
    pub style: Option<String>,
    pub dir: Option<String>,
    pub classes: Vec<String>,
    pub inner_html: String,
    pub text: String,
}

impl Fragment {
    pub fn is_paragraph(&self) -> bool {
        self.tag == "p"
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|value| value == class)
    }

    fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            tag: value.name().to_string(),
            style: value.attr("style").map(ToOwned::to_owned),
            dir: value.attr("dir").map(ToOwned::to_owned),
            classes: value.classes().map(ToOwned::to_owned).collect(),
            inner_html: element.inner_html(),
            text: element.text().collect::<String>(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterFile {
    /// No heading, or a volume cover page.
    Ignored,
    /// Table of contents; carries the body's trailing fragment.
    TableOfContents { trailing: Option<String> },
    Content {
        heading_anchor: String,
        heading: String,
        fragments: Vec<Fragment>,
    },
}

pub struct FileSelectors {
    heading: Selector,
    anchor: Selector,
    body: Selector,
    first_in_chapter: Selector,
}

impl FileSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: parse_selector("body h1")?,
            anchor: parse_selector("a")?,
            body: parse_selector("body")?,
            first_in_chapter: parse_selector("p.first-in-chapter")?,
        })
    }
}

pub fn parse_chapter_file(
    html: &str,
    selectors: &FileSelectors,
    patterns: &BuildPatterns,
) -> ChapterFile {
    // XHTML footnote anchors are self-closing; an HTML parser would leave them open.
    let html = patterns
        .self_closing_anchor
        .replace_all(html, "<a${1}></a>");
    let document = Html::parse_document(&html);

    let Some(heading) = document.select(&selectors.heading).next() else {
        return ChapterFile::Ignored;
    };

    let heading_text = heading.text().collect::<String>().trim().to_uppercase();
    if patterns.volume_heading.is_match(&heading_text) {
        return ChapterFile::Ignored;
    }

    if patterns.table_of_contents.is_match(&heading_text) {
        let trailing = document
            .select(&selectors.body)
            .next()
            .and_then(|body| body.children().filter_map(ElementRef::wrap).last())
            .map(|element| element.inner_html());
        return ChapterFile::TableOfContents { trailing };
    }

    let heading_anchor = heading
        .select(&selectors.anchor)
        .next()
        .map(|anchor| anchor.inner_html())
        .unwrap_or_default();

    let fragments = match document.select(&selectors.first_in_chapter).next() {
        Some(first) => std::iter::once(first)
            .chain(first.next_siblings().filter_map(ElementRef::wrap))
            .map(Fragment::from_element)
            .collect(),
        None => Vec::new(),
    };

    ChapterFile::Content {
        heading_anchor,
        heading: heading.inner_html(),
        fragments,
    }
}

/// Replaces inline presentation styles with the corpus' text classes.
pub fn normalize_styles(inner_html: &str) -> String {
    inner_html
        .replace(
            "style=\"font-style: italic; font-weight: bold\"",
            "class=\"ibTxt\"",
        )
        .replace("style=\"font-weight: bold\"", "class=\"bTxt\"")
        .replace("style=\"font-style: italic\"", "class=\"iTxt\"")
}
