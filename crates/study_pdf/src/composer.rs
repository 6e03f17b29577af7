//! The document composer: lays out headings, notes and diagrams over a background template.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use genpdf::elements::LinearLayout;
use genpdf::style::{Color, Style};
use log::{debug, warn};

use crate::builder::{DocumentBuilder, PageTracker};
use crate::elements::{
    AdvanceTo, Background, DiagramBlock, DiagramPlacement, PageMarked, Spacer, WrappedText,
};
use crate::error::{ComposeError, Result};
use crate::geometry::PageGeometry;
use crate::model::{ComposeOptions, ContentMode, Section, SectionLayout};

#[cfg(feature = "bookmarks")]
use crate::bookmarks;

const MAIN_HEADING_Y: f64 = 28.0;
const MAIN_HEADING_GAP: f64 = 2.0;
const NOTES_START_Y: f64 = 48.0;
const MINDMAP_START_Y: f64 = 50.0;
const TOPIC_HEADING_GAP: f64 = 1.0;
const PARAGRAPH_GAP: f64 = 2.0;
const BLANK_LINE_GAP: f64 = 3.0;
const SECTION_GAP_NOTES: f64 = 4.0;
const SECTION_GAP_WITH_DIAGRAMS: f64 = 6.0;

/// Text drawn in place of a diagram that could not be decoded.
pub const DIAGRAM_NOTICE: &str = "[Mindmap could not be added]";

fn text_style(size: u8, bold: bool, color: Color) -> Style {
    let mut style = Style::new();
    style.set_font_size(size);
    style.set_color(color);
    if bold {
        style.set_bold();
    }
    style
}

fn main_heading_style() -> Style {
    text_style(16, true, Color::Rgb(10, 10, 10))
}

fn topic_heading_style() -> Style {
    text_style(14, true, Color::Rgb(0, 0, 0))
}

fn body_style() -> Style {
    text_style(12, false, Color::Rgb(20, 20, 20))
}

fn notice_style() -> Style {
    text_style(11, true, Color::Rgb(180, 0, 0))
}

fn paragraph(text: &str, style: Style) -> WrappedText {
    WrappedText::new(text, style)
}

/// Splits body text into paragraphs: `Some(text)` for content, `None` for a blank line.
///
/// Trailing blank lines are dropped; they would only add whitespace after the last paragraph.
pub fn split_paragraphs(body: &str) -> Vec<Option<&str>> {
    let body = body.trim_end();
    if body.trim_start().is_empty() {
        return Vec::new();
    }

    body.split('\n')
        .map(str::trim)
        .map(|line| (!line.is_empty()).then_some(line))
        .collect()
}

/// A rendered document together with its layout bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedDocument {
    /// The serialized PDF.
    pub bytes: Vec<u8>,
    /// Number of pages in the document.
    pub page_count: usize,
    /// 1-indexed page on which each section starts, if it drew anything.
    pub section_pages: Vec<Option<usize>>,
}

/// Composes study documents with fixed A4 geometry.
#[derive(Clone, Debug, Default)]
pub struct Composer {
    geometry: PageGeometry,
    placement: DiagramPlacement,
    font_dir: Option<PathBuf>,
    #[cfg_attr(not(feature = "bookmarks"), allow(dead_code))]
    bookmarks: bool,
}

impl Composer {
    /// Creates a composer with the default geometry and diagram placement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches `dir` for fonts before the default locations.
    pub fn with_font_dir(mut self, dir: impl Into<Option<PathBuf>>) -> Self {
        self.font_dir = dir.into();
        self
    }

    /// Adds a PDF outline entry per section to chapter documents.
    #[cfg(feature = "bookmarks")]
    pub fn with_bookmarks(mut self, bookmarks: bool) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Returns the page geometry.
    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Composes a document and serializes it to PDF bytes.
    ///
    /// `background` holds the encoded template image stamped onto every page. Fails with
    /// [`ComposeError::Content`] when `sections` is empty and with [`ComposeError::Background`]
    /// when the template cannot be decoded. Diagrams that fail to decode do not fail the call;
    /// they are replaced by an inline notice.
    pub fn compose(
        &self,
        main_heading: &str,
        background: &[u8],
        sections: &[Section],
        options: ComposeOptions,
    ) -> Result<ComposedDocument> {
        if sections.is_empty() {
            return Err(ComposeError::Content(
                "At least one section is required".to_owned(),
            ));
        }

        let background = Background::from_bytes(background).map_err(ComposeError::Background)?;
        let tracker = PageTracker::new();
        let mut document = DocumentBuilder::new()
            .with_geometry(self.geometry)
            .with_background(background)
            .with_page_tracker(tracker.clone())
            .with_font_dir(self.font_dir.clone())
            .with_title(main_heading)
            .build()
            .map_err(ComposeError::Fonts)?;

        document.push(AdvanceTo::new(MAIN_HEADING_Y, self.geometry));
        document.push(paragraph(main_heading, main_heading_style()));
        document.push(Spacer::new(MAIN_HEADING_GAP));
        if let Some(start) = body_start(options) {
            document.push(AdvanceTo::new(start, self.geometry));
        }

        let mut marks = Vec::with_capacity(sections.len());
        for (index, section) in sections.iter().enumerate() {
            if index > 0 {
                document.push(Spacer::new(section_gap(options.content)));
            }

            let mark = Rc::new(Cell::new(None));
            let layout = self.section_layout(index, section, options);
            document.push(PageMarked::new(layout, tracker.clone(), Rc::clone(&mark)));
            marks.push(mark);
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;

        let section_pages: Vec<Option<usize>> = marks.iter().map(|mark| mark.get()).collect();
        let page_count = tracker.current();
        debug!(
            "composed '{}' with {} section(s) on {} page(s)",
            main_heading,
            sections.len(),
            page_count
        );

        #[cfg(feature = "bookmarks")]
        let bytes = if self.bookmarks && options.layout == SectionLayout::Chapter {
            let titles: Vec<String> = sections
                .iter()
                .enumerate()
                .map(|(index, section)| section.display_title(index))
                .collect();
            bookmarks::apply_section_bookmarks(&bytes, &titles, &section_pages)?
        } else {
            bytes
        };

        Ok(ComposedDocument {
            bytes,
            page_count,
            section_pages,
        })
    }

    fn section_layout(
        &self,
        index: usize,
        section: &Section,
        options: ComposeOptions,
    ) -> LinearLayout {
        let mut layout = LinearLayout::vertical();

        if options.layout == SectionLayout::Chapter {
            layout.push(paragraph(&section.display_title(index), topic_heading_style()));
            layout.push(Spacer::new(TOPIC_HEADING_GAP));
        }

        if options.content.includes_notes() {
            for paragraph_text in split_paragraphs(section.body()) {
                match paragraph_text {
                    Some(text) => {
                        layout.push(paragraph(text, body_style()));
                        layout.push(Spacer::new(PARAGRAPH_GAP));
                    }
                    None => layout.push(Spacer::new(BLANK_LINE_GAP)),
                }
            }
        }

        if options.content.includes_diagrams() {
            if let Some(source) = section.diagram() {
                let diagram = source.bytes().and_then(|bytes| {
                    DiagramBlock::from_bytes(bytes, self.geometry, self.placement)
                });
                match diagram {
                    Ok(block) => layout.push(block),
                    Err(err) => {
                        warn!(
                            "diagram for section {} ('{}') could not be added: {}",
                            index + 1,
                            section.display_title(index),
                            err
                        );
                        layout.push(paragraph(DIAGRAM_NOTICE, notice_style()));
                    }
                }
            }
        }

        layout
    }
}

fn body_start(options: ComposeOptions) -> Option<f64> {
    match (options.layout, options.content) {
        (SectionLayout::Chapter, _) => None,
        (SectionLayout::Topic, ContentMode::MindmapOnly) => Some(MINDMAP_START_Y),
        (SectionLayout::Topic, _) => Some(NOTES_START_Y),
    }
}

fn section_gap(content: ContentMode) -> f64 {
    if content.includes_diagrams() {
        SECTION_GAP_WITH_DIAGRAMS
    } else {
        SECTION_GAP_NOTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_line_breaks_with_blank_markers() {
        let parts = split_paragraphs("First idea.\n\nSecond idea.\r\n  \nThird");
        assert_eq!(
            parts,
            vec![
                Some("First idea."),
                None,
                Some("Second idea."),
                None,
                Some("Third")
            ]
        );
    }

    #[test]
    fn trailing_blank_lines_are_dropped() {
        assert_eq!(
            split_paragraphs("\nLast point.\n\n \r\n\n"),
            vec![None, Some("Last point.")]
        );
    }

    #[test]
    fn empty_body_has_no_paragraphs() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs(" \n \n").is_empty());
    }

    #[test]
    fn body_start_depends_on_layout() {
        let topic = ComposeOptions::new(ContentMode::NotesOnly, SectionLayout::Topic);
        let mindmap = ComposeOptions::new(ContentMode::MindmapOnly, SectionLayout::Topic);
        let chapter = ComposeOptions::new(ContentMode::NotesAndMindmap, SectionLayout::Chapter);
        assert_eq!(body_start(topic), Some(48.0));
        assert_eq!(body_start(mindmap), Some(50.0));
        assert_eq!(body_start(chapter), None);
    }

    #[test]
    fn empty_sections_are_rejected_before_rendering() {
        let err = Composer::new()
            .compose("Chapter", b"", &[], ComposeOptions::default())
            .unwrap_err();
        assert!(matches!(err, ComposeError::Content(_)));
    }

    #[test]
    fn undecodable_background_is_a_layout_failure() {
        let err = Composer::new()
            .compose(
                "Chapter",
                b"not an image",
                &[Section::new("Motion")],
                ComposeOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, ComposeError::Background(_)));
        assert_eq!(err.category(), crate::error::ErrorCategory::Layout);
    }
}
