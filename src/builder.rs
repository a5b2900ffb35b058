//! Document construction and report rendering.

use genpdf::elements::Paragraph;
use genpdf::error::{Error, ErrorKind};
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, Position, Size};
use log::{debug, info};

use crate::charts::{BarChartElement, HeatmapElement, NoticeElement};
use crate::error::{ReportError, Result};
use crate::fonts;
use crate::model::{PageContent, ReportPage};

/// Landscape A4, the canvas of every report page.
pub const LANDSCAPE_A4_MM: (i32, i32) = (297, 210);

const HEADER_FONT_SIZE: u8 = 8;
const HEADER_GAP_MM: f64 = 3.0;
const FOOTER_HEIGHT_MM: f64 = 8.0;

/// Adds margins, the report title in the header and the page number in the footer.
struct ReportDecorator {
    page: usize,
    title: String,
    source_name: String,
}

impl ReportDecorator {
    fn new(title: String, source_name: String) -> Self {
        Self {
            page: 0,
            title,
            source_name,
        }
    }

    fn footer_text(&self) -> String {
        if self.source_name.is_empty() {
            format!("Page {}", self.page)
        } else {
            format!("Page {} • {}", self.page, self.source_name)
        }
    }
}

impl PageDecorator for ReportDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: Area<'a>,
        style: Style,
    ) -> std::result::Result<Area<'a>, Error> {
        self.page += 1;
        area.add_margins(Margins::trbl(10, 12, 8, 12));

        let mut header = Paragraph::new(self.title.clone());
        header.set_alignment(Alignment::Right);
        let mut header = header.styled(Style::new().italic().with_font_size(HEADER_FONT_SIZE));
        let result = header.render(context, area.clone(), style)?;
        area.add_offset(Position::new(0, result.size.height + Mm::from(HEADER_GAP_MM)));

        let available = area.size().height;
        let footer_height = Mm::from(FOOTER_HEIGHT_MM);
        if footer_height > available {
            return Err(Error::new(
                "Footer height exceeds available space",
                ErrorKind::InvalidData,
            ));
        }

        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, available - footer_height));
        let mut footer = Paragraph::new(self.footer_text());
        footer.set_alignment(Alignment::Center);
        let mut footer = footer.styled(Style::new().with_font_size(HEADER_FONT_SIZE));
        if footer.render(context, footer_area, style)?.has_more {
            return Err(Error::new(
                "Footer does not fit into the reserved space",
                ErrorKind::PageSizeExceeded,
            ));
        }

        area.set_height(available - footer_height);
        Ok(area)
    }
}

/// The rendered report.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    /// Complete PDF file contents.
    pub bytes: Vec<u8>,
    /// Number of pages in the document.
    pub page_count: usize,
}

/// Renders a list of [`ReportPage`]s into a single PDF, one page each.
///
/// Every page element fills the area it is given, so genpdf moves the next element to a new
/// page and the physical page `i + 1` shows `pages[i]`.
pub struct ReportBuilder {
    title: String,
    source_name: String,
    pages: Vec<ReportPage>,
    bookmarks: bool,
}

impl ReportBuilder {
    /// Creates a builder whose page header shows `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_name: String::new(),
            pages: Vec::new(),
            bookmarks: false,
        }
    }

    /// Names the input file in the page footer.
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    /// Appends pages in output order.
    pub fn add_pages<I>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = ReportPage>,
    {
        self.pages.extend(pages);
        self
    }

    /// Requests one PDF outline entry per page. Only honoured with the `bookmarks` feature.
    pub fn with_bookmarks(mut self, bookmarks: bool) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Titles of the pages in output order.
    pub fn page_titles(&self) -> Vec<String> {
        self.pages.iter().map(|page| page.title().to_string()).collect()
    }

    /// Renders every page and returns the PDF bytes.
    pub fn render(self) -> Result<RenderedReport> {
        let font_family = fonts::default_font_family().map_err(ReportError::FontLoad)?;
        let mut document = genpdf::Document::new(font_family);
        document.set_title(self.title.clone());
        document.set_paper_size(Size::new(LANDSCAPE_A4_MM.0, LANDSCAPE_A4_MM.1));
        document.set_page_decorator(ReportDecorator::new(
            self.title.clone(),
            self.source_name.clone(),
        ));

        #[cfg(feature = "bookmarks")]
        let titles = self.page_titles();

        let page_count = self.pages.len();
        for (index, page) in self.pages.into_iter().enumerate() {
            debug!("Rendering page {}: {}", index + 1, page.title());
            push_page(&mut document, page).map_err(ReportError::Render)?;
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ReportError::Render)?;

        #[cfg(feature = "bookmarks")]
        if self.bookmarks {
            bytes = crate::bookmarks::apply_page_bookmarks(&bytes, &titles)?;
        }

        #[cfg(not(feature = "bookmarks"))]
        if self.bookmarks {
            log::warn!("Bookmarks requested but the `bookmarks` feature is disabled; skipping");
        }

        info!("Rendered {} page(s) ({} bytes)", page_count, bytes.len());
        Ok(RenderedReport { bytes, page_count })
    }
}

fn push_page(document: &mut genpdf::Document, page: ReportPage) -> std::result::Result<(), Error> {
    match page.content().clone() {
        PageContent::Bars(chart) => document.push(BarChartElement::new(chart)),
        PageContent::Heatmap(heatmap) => document.push(HeatmapElement::new(&heatmap)?),
        PageContent::Notice(message) => document.push(NoticeElement::new(message)),
    }
    Ok(())
}
