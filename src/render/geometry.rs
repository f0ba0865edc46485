/// Physical page media, in thousandths of an inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSize {
    pub id: &'static str,
    pub width_mils: u32,
    pub height_mils: u32,
}

impl MediaSize {
    pub const ISO_A4: MediaSize = MediaSize { id: "ISO_A4", width_mils: 8267, height_mils: 11692 };
    pub const ISO_A3: MediaSize = MediaSize { id: "ISO_A3", width_mils: 11692, height_mils: 16535 };

    pub fn is_portrait(&self) -> bool {
        self.height_mils >= self.width_mils
    }

    pub fn as_portrait(self) -> Self {
        if self.is_portrait() { self } else { self.rotated() }
    }

    pub fn as_landscape(self) -> Self {
        if self.is_portrait() { self.rotated() } else { self }
    }

    /// Size in PDF points (1/72 inch), rounded to two decimals.
    pub fn points(&self) -> (f64, f64) {
        let to_pt = |mils: u32| (mils as f64 * 72.0 / 10.0).round() / 100.0;
        (to_pt(self.width_mils), to_pt(self.height_mils))
    }

    fn rotated(self) -> Self {
        Self { id: self.id, width_mils: self.height_mils, height_mils: self.width_mils }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: String,
    pub label: String,
    pub horizontal_dpi: u32,
    pub vertical_dpi: u32,
}

impl Resolution {
    pub fn pdf(dpi: u32) -> Self {
        Self { id: "pdf".to_string(), label: "pdf".to_string(), horizontal_dpi: dpi, vertical_dpi: dpi }
    }
}

/// Page margins in mils.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Margins {
    pub const NO_MARGINS: Margins = Margins { left: 0, top: 0, right: 0, bottom: 0 };
}

/// Page geometry handed to the layout phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintAttributes {
    pub media_size: MediaSize,
    pub resolution: Resolution,
    pub margins: Margins,
}

/// What the layout phase reports about the document it is going to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub name: String,
    /// `None` when the adapter does not know the page count up front.
    pub page_count: Option<u32>,
}

/// Pages requested from the write phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRange {
    All,
    /// Zero-based, both ends included.
    Span { start: u32, end: u32 },
}

impl PageRange {
    /// Indices of the selected pages in a document of `page_count` pages.
    pub fn pages(&self, page_count: u32) -> std::ops::Range<u32> {
        match *self {
            PageRange::All => 0..page_count,
            PageRange::Span { start, end } => start.min(page_count)..end.saturating_add(1).min(page_count),
        }
    }
}
