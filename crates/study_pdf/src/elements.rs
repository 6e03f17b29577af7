//! Layout elements built on top of `genpdf` primitives.
//!
//! `genpdf` flows elements top to bottom and starts a new page whenever an element reports that
//! it has more content. The elements here use that mechanism to express the composer's layout
//! rules: jumping the cursor to an absolute offset, fixed whitespace that never spills onto the
//! next page, diagrams that force a page break instead of splitting, and page bookkeeping for
//! section outlines.

use std::cell::Cell;
use std::rc::Rc;

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba};

use genpdf::elements::{Image, Paragraph};
use genpdf::error::Error;
use genpdf::style::{Style, StyledString};
use genpdf::{render, Element, Mm, Position, RenderResult, Scale, Size};

use crate::builder::PageTracker;
use crate::error::DecodeError;
use crate::geometry::{mm_from_f64, mm_to_f64, PageGeometry};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
/// Share of the line width a broken word chunk may fill.
const CHUNK_FILL: f64 = 0.95;

fn estimated_image_size(image: &DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Composites images with an alpha channel onto white; the PDF backend cannot embed alpha.
fn flatten_alpha(image: DynamicImage) -> DynamicImage {
    if matches!(image, DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_)) {
        return image;
    }

    let (width, height) = image.dimensions();
    let flattened = RgbImage::from_fn(width, height, |x, y| {
        let Rgba([r, g, b, a]) = image.get_pixel(x, y);
        let alpha = u32::from(a);
        let blend = |channel: u8| ((u32::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(flattened)
}

/// Decodes encoded image bytes (PNG, JPEG, ...) into an image ready for embedding.
pub fn decode_image(bytes: impl AsRef<[u8]>) -> Result<DynamicImage, DecodeError> {
    image::load_from_memory(bytes.as_ref())
        .map(flatten_alpha)
        .map_err(|err| DecodeError::Image(err.to_string()))
}

/// Converts encoded image bytes into a `genpdf` image together with its natural size.
pub fn image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<(Image, Size), DecodeError> {
    let dynamic = decode_image(bytes)?;
    let size = estimated_image_size(&dynamic, DEFAULT_IMAGE_DPI);
    let image =
        Image::from_dynamic_image(dynamic).map_err(|err| DecodeError::Image(err.to_string()))?;
    Ok((image, size))
}

fn uniform_scale(natural: Size, width: f64) -> f64 {
    let natural_width = mm_to_f64(natural.width);
    if natural_width > f64::EPSILON {
        width / natural_width
    } else {
        1.0
    }
}

/// Full-bleed page background, stretched to cover whatever area it is rendered into.
pub struct Background {
    image: Image,
    natural_size: Size,
}

impl Background {
    /// Decodes the background template from encoded image bytes.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, DecodeError> {
        let (image, natural_size) = image_from_bytes(bytes)?;
        Ok(Self {
            image,
            natural_size,
        })
    }

    /// Horizontal and vertical factors that stretch the image over `target`.
    pub fn stretch_factors(&self, target: Size) -> (f64, f64) {
        let factor = |natural: Mm, wanted: Mm| {
            let natural = mm_to_f64(natural);
            if natural > f64::EPSILON {
                mm_to_f64(wanted) / natural
            } else {
                1.0
            }
        };
        (
            factor(self.natural_size.width, target.width),
            factor(self.natural_size.height, target.height),
        )
    }
}

impl Element for Background {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let target = area.size();
        let (scale_x, scale_y) = self.stretch_factors(target);
        self.image.set_scale(Scale::new(scale_x, scale_y));
        // Slack so rounding in the scaled size never makes the image overflow its area.
        area.set_width(mm_from_f64(mm_to_f64(target.width) + 0.01));
        area.set_height(mm_from_f64(mm_to_f64(target.height) + 0.01));
        self.image.render(context, area, style)?;
        // The background sits underneath the content and takes no space in the flow.
        Ok(RenderResult::default())
    }
}

/// Moves the cursor down to an absolute offset from the top of the page.
///
/// Does nothing when the cursor is already below the target.
pub struct AdvanceTo {
    y: f64,
    geometry: PageGeometry,
}

impl AdvanceTo {
    /// Creates an element that moves the cursor to `y` millimetres from the top edge.
    pub fn new(y: f64, geometry: PageGeometry) -> Self {
        Self { y, geometry }
    }
}

impl Element for AdvanceTo {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let remaining = mm_to_f64(area.size().height);
        let current = self.geometry.cursor_y(area.size().height);
        let gap = (self.y - current).clamp(0.0, remaining.max(0.0));

        let mut result = RenderResult::default();
        result.size = Size::new(0, mm_from_f64(gap));
        Ok(result)
    }
}

/// Fixed vertical whitespace that is truncated at the page bottom instead of carrying over.
pub struct Spacer {
    height: f64,
}

impl Spacer {
    /// Creates whitespace of `height` millimetres.
    pub fn new(height: f64) -> Self {
        Self { height }
    }
}

impl Element for Spacer {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let remaining = mm_to_f64(area.size().height).max(0.0);
        let mut result = RenderResult::default();
        result.size = Size::new(0, mm_from_f64(self.height.min(remaining)));
        Ok(result)
    }
}

/// Breaks words wider than `max_width` into chunks that fit, leaving other words untouched.
///
/// `measure` returns the rendered width of a string in millimetres. Words are separated by single
/// spaces, which is also where the paragraph wrapper looks for break opportunities.
pub fn break_long_words(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> String {
    text.split(' ')
        .map(|word| {
            if measure(word) <= max_width {
                return word.to_owned();
            }

            let mut chunks: Vec<String> = Vec::new();
            let mut chunk = String::new();
            let mut chunk_width = 0.0;
            for c in word.chars() {
                let char_width = measure(c.encode_utf8(&mut [0; 4]));
                if chunk_width + char_width > max_width && !chunk.is_empty() {
                    chunks.push(std::mem::take(&mut chunk));
                    chunk_width = 0.0;
                }
                chunk.push(c);
                chunk_width += char_width;
            }
            chunks.push(chunk);
            chunks.join(" ")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A paragraph that never fails on words wider than the line.
///
/// `genpdf` refuses to wrap a single word that does not fit the available width, so overlong
/// words (URLs, long compounds) are broken into chunks before the paragraph is laid out.
pub struct WrappedText {
    text: String,
    style: Style,
    paragraph: Option<Paragraph>,
}

impl WrappedText {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
            paragraph: None,
        }
    }
}

impl Element for WrappedText {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let text = &self.text;
        let own_style = self.style;
        let effective = style.and(own_style);
        let max_width = mm_to_f64(area.size().width) * CHUNK_FILL;

        let paragraph = self.paragraph.get_or_insert_with(|| {
            let measure = |s: &str| {
                mm_to_f64(StyledString::new(s.to_owned(), effective).width(&context.font_cache))
            };
            Paragraph::new(StyledString::new(
                break_long_words(text, max_width, measure),
                own_style,
            ))
        });
        paragraph.render(context, area, style)
    }
}

/// Placement rules for diagrams.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiagramPlacement {
    /// Space that must remain on the page, otherwise the diagram moves to a new page.
    pub reserve: f64,
    /// Absolute offset from the page top where a diagram starts after a forced break.
    pub top_after_break: f64,
    /// Gap between the cursor and the top of the image.
    pub lead: f64,
    /// Distance the cursor advances past the image top, regardless of the image height.
    pub allowance: f64,
}

impl Default for DiagramPlacement {
    fn default() -> Self {
        Self {
            reserve: 160.0,
            top_after_break: 45.0,
            lead: 3.0,
            allowance: 150.0,
        }
    }
}

impl DiagramPlacement {
    /// Whether a diagram has to move to a fresh page given the remaining height in millimetres.
    ///
    /// The reservation is a fixed height and does not look at the scaled image, so a very tall
    /// diagram can still run past the bottom margin.
    pub fn needs_forced_break(&self, remaining: f64) -> bool {
        remaining < self.reserve
    }

    /// Decides what a diagram does given the remaining height and the absolute cursor position.
    ///
    /// `after_break` is true once the diagram has already pushed itself onto a new page; it is
    /// then drawn unconditionally, starting at `top_after_break`.
    pub fn plan(&self, remaining: f64, cursor_y: f64, after_break: bool) -> DiagramStep {
        let remaining = remaining.max(0.0);
        if !after_break && self.needs_forced_break(remaining) {
            return DiagramStep::Break;
        }

        let skip = if after_break {
            (self.top_after_break - cursor_y).clamp(0.0, remaining)
        } else {
            0.0
        };
        let offset = skip + self.lead;
        DiagramStep::Draw {
            offset,
            advance: (offset + self.allowance).min(remaining),
        }
    }
}

/// Outcome of [`DiagramPlacement::plan`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DiagramStep {
    /// Fill the rest of the page and continue on the next one.
    Break,
    /// Draw the image `offset` millimetres below the cursor and advance the flow by `advance`,
    /// which is measured from the same cursor.
    Draw { offset: f64, advance: f64 },
}

/// A diagram drawn at the full content width that is never split across pages.
pub struct DiagramBlock {
    image: Image,
    natural_size: Size,
    geometry: PageGeometry,
    placement: DiagramPlacement,
    moved_to_new_page: bool,
}

impl DiagramBlock {
    /// Decodes the diagram from encoded image bytes.
    pub fn from_bytes(
        bytes: impl AsRef<[u8]>,
        geometry: PageGeometry,
        placement: DiagramPlacement,
    ) -> Result<Self, DecodeError> {
        let (image, natural_size) = image_from_bytes(bytes)?;
        Ok(Self {
            image,
            natural_size,
            geometry,
            placement,
            moved_to_new_page: false,
        })
    }

    /// Height of the image once scaled to `width` millimetres.
    pub fn scaled_height(&self, width: f64) -> f64 {
        mm_to_f64(self.natural_size.height) * uniform_scale(self.natural_size, width)
    }
}

impl Element for DiagramBlock {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let remaining = mm_to_f64(area.size().height).max(0.0);
        let cursor_y = self.geometry.cursor_y(area.size().height);

        let step = self.placement.plan(remaining, cursor_y, self.moved_to_new_page);
        let (offset, advance) = match step {
            DiagramStep::Break => {
                self.moved_to_new_page = true;
                result.size = Size::new(0, mm_from_f64(remaining));
                result.has_more = true;
                return Ok(result);
            }
            DiagramStep::Draw { offset, advance } => (offset, advance),
        };
        area.add_offset(Position::new(0, mm_from_f64(offset)));

        let width = mm_to_f64(area.size().width);
        let scale = uniform_scale(self.natural_size, width);
        self.image.set_scale(Scale::new(scale, scale));

        // Oversized diagrams are drawn past the bottom margin rather than pushed again.
        let mut image_area = area.clone();
        let image_height = self.scaled_height(width);
        let available = mm_to_f64(image_area.size().height);
        image_area.set_width(mm_from_f64(width + 0.01));
        image_area.set_height(mm_from_f64(available.max(image_height) + 0.01));
        self.image.render(context, image_area, style)?;

        result.size = Size::new(mm_from_f64(width), mm_from_f64(advance));
        Ok(result)
    }
}

/// Wraps an element and records the page on which it first draws something.
pub struct PageMarked<E: Element> {
    inner: E,
    tracker: PageTracker,
    mark: Rc<Cell<Option<usize>>>,
}

impl<E: Element> PageMarked<E> {
    /// Wraps `inner`; the page number is written into `mark`.
    pub fn new(inner: E, tracker: PageTracker, mark: Rc<Cell<Option<usize>>>) -> Self {
        Self {
            inner,
            tracker,
            mark,
        }
    }
}

impl<E: Element> Element for PageMarked<E> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let result = self.inner.render(context, area, style)?;
        if self.mark.get().is_none() && result.size.height > Mm::default() {
            self.mark.set(Some(self.tracker.current()));
        }
        Ok(result)
    }
}
