//! Fixed page geometry and millimetre helpers.

use genpdf::{Margins, Mm, Size};

/// Converts a raw millimetre value into a `genpdf` length.
pub fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Converts a `genpdf` length back into raw millimetres.
pub fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Page dimensions and margins used for a whole document.
///
/// All offsets are absolute distances from the top edge of the page, matching how the layout is
/// described: the main heading sits at 28mm, notes start at 48mm and so on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    /// Page width in millimetres.
    pub page_width: f64,
    /// Page height in millimetres.
    pub page_height: f64,
    /// Uniform left, top and right margin.
    pub margin: f64,
    /// Distance from the bottom edge at which text flow breaks onto a new page.
    pub bottom_margin: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4_PORTRAIT
    }
}

impl PageGeometry {
    /// A4 portrait with 18mm margins on every side.
    pub const A4_PORTRAIT: Self = Self {
        page_width: 210.0,
        page_height: 297.0,
        margin: 18.0,
        bottom_margin: 18.0,
    };

    /// The paper size handed to `genpdf`.
    pub fn paper_size(&self) -> Size {
        Size::new(mm_from_f64(self.page_width), mm_from_f64(self.page_height))
    }

    /// The margins applied after the background has been stamped.
    pub fn margins(&self) -> Margins {
        Margins::trbl(
            mm_from_f64(self.margin),
            mm_from_f64(self.margin),
            mm_from_f64(self.bottom_margin),
            mm_from_f64(self.margin),
        )
    }

    /// Width available to content between the side margins.
    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    /// Absolute y of the writing position given the height still available on the page.
    pub fn cursor_y(&self, remaining: Mm) -> f64 {
        self.page_height - self.bottom_margin - mm_to_f64(remaining)
    }
}
