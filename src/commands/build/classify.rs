use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentRole {
    Blank,
    BookTitle,
    ChapterTitle,
    RightToLeft,
    SectionBreak,
    ContentLine,
}

fn style_has(fragment: &Fragment, needle: &str) -> bool {
    fragment
        .style
        .as_deref()
        .is_some_and(|style| style.contains(needle))
}

pub fn is_book_title(fragment: &Fragment) -> bool {
    (style_has(fragment, "font-size: x-large") || style_has(fragment, "font-size: xx-large"))
        && style_has(fragment, "font-weight: bold")
        && style_has(fragment, "text-align: center")
        && (style_has(fragment, "text-decoration: underline")
            || style_has(fragment, "page-break-before: always"))
}

pub fn is_chapter_title(fragment: &Fragment) -> bool {
    style_has(fragment, "font-weight: bold") && style_has(fragment, "text-decoration: underline")
}

pub fn is_right_to_left(fragment: &Fragment) -> bool {
    fragment.dir.as_deref() == Some("rtl")
}

pub fn is_section_break(fragment: &Fragment) -> bool {
    fragment.has_class("section-break")
}

pub fn is_blank(fragment: &Fragment) -> bool {
    fragment.inner_html.trim().is_empty()
}

/// Rules are checked in priority order; anything unrecognised is a content line.
pub fn classify(fragment: &Fragment) -> FragmentRole {
    classify_with(fragment, true)
}

/// The final volume has no book-title fragments, so that rule is skipped.
pub fn classify_without_book_titles(fragment: &Fragment) -> FragmentRole {
    classify_with(fragment, false)
}

fn classify_with(fragment: &Fragment, book_titles: bool) -> FragmentRole {
    if is_blank(fragment) {
        FragmentRole::Blank
    } else if book_titles && is_book_title(fragment) {
        FragmentRole::BookTitle
    } else if is_chapter_title(fragment) {
        FragmentRole::ChapterTitle
    } else if is_right_to_left(fragment) {
        FragmentRole::RightToLeft
    } else if fragment.is_paragraph() && is_section_break(fragment) {
        FragmentRole::SectionBreak
    } else {
        FragmentRole::ContentLine
    }
}
