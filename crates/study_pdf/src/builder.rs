//! Document construction for the study_pdf crate.
//!
//! The background template is drawn from the page decorator, which `genpdf` invokes whenever it
//! creates a page: the first page, pages added because text overflowed, and pages added because a
//! diagram forced a break. Every page is therefore stamped before any content lands on it.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use genpdf::error::Error;
use genpdf::style;
use genpdf::{self, Element, Margins, PageDecorator};

use crate::elements::Background;
use crate::fonts;
use crate::geometry::PageGeometry;

const DEFAULT_LINE_SPACING: f64 = 1.2;

/// Shared counter of the pages created so far in one document.
#[derive(Clone, Debug, Default)]
pub struct PageTracker {
    pages: Rc<Cell<usize>>,
}

impl PageTracker {
    /// Creates a tracker that has not seen any page yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the 1-indexed number of the page currently being filled.
    pub fn current(&self) -> usize {
        self.pages.get()
    }

    fn advance(&self) -> usize {
        let next = self.pages.get() + 1;
        self.pages.set(next);
        next
    }
}

/// Builder for `genpdf::Document` instances pre-configured for study exports.
#[derive(Default)]
pub struct DocumentBuilder {
    geometry: PageGeometry,
    background: Option<Background>,
    tracker: PageTracker,
    font_dir: Option<PathBuf>,
    title: Option<String>,
}

impl DocumentBuilder {
    /// Creates a new builder using A4 portrait geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page geometry.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Sets the background stamped onto every page.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    /// Shares a page tracker with elements that need to know the current page.
    pub fn with_page_tracker(mut self, tracker: PageTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Loads fonts from `dir` before falling back to the default search path.
    pub fn with_font_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.font_dir = dir;
        self
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builds a fully configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, Error> {
        let font_family = fonts::font_family(self.font_dir.as_deref())?;
        let mut document = genpdf::Document::new(font_family);

        document.set_paper_size(self.geometry.paper_size());
        document.set_line_spacing(DEFAULT_LINE_SPACING);
        if let Some(title) = self.title {
            document.set_title(title);
        }

        let decorator =
            BackgroundDecorator::new(self.geometry.margins(), self.background, self.tracker);
        document.set_page_decorator(decorator);

        Ok(document)
    }
}

/// Page-creation hook: counts the page, stamps the background full-bleed, then applies margins.
struct BackgroundDecorator {
    margins: Margins,
    background: Option<Background>,
    tracker: PageTracker,
}

impl BackgroundDecorator {
    fn new(margins: Margins, background: Option<Background>, tracker: PageTracker) -> Self {
        Self {
            margins,
            background,
            tracker,
        }
    }
}

impl PageDecorator for BackgroundDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let page = self.tracker.advance();
        log::trace!("decorating page {page}");

        if let Some(background) = &mut self.background {
            background.render(context, area.clone(), style)?;
        }

        area.add_margins(self.margins);
        Ok(area)
    }
}
