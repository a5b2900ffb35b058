//! Data structures describing the logical content of a report.
//!
//! The types in this module describe pages and charts without referencing the rendering crate, so
//! a report plan can be produced, inspected and tested without loading fonts.  The renderer in
//! [`crate::builder`] maps every [`PageContent`] to a `genpdf` element from [`crate::charts`].

use crate::aggregate::CorrelationMatrix;
use crate::config::SectionId;

/// Direction in which bars grow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BarOrientation {
    /// Bars grow to the right; the first bar is drawn at the top.
    #[default]
    Horizontal,
    /// Bars grow upwards; the first bar is drawn on the left.
    Vertical,
}

/// How a bar value is turned into its label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValueFormat {
    /// Integral values without decimals, others with up to two.
    #[default]
    Natural,
    /// Exactly the given number of decimals.
    Fixed(usize),
    /// Truncated towards zero.
    Integer,
}

impl ValueFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Natural => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{value:.0}")
                } else {
                    let text = format!("{value:.2}");
                    text.trim_end_matches('0').trim_end_matches('.').to_string()
                }
            }
            ValueFormat::Fixed(decimals) => format!("{value:.decimals$}"),
            ValueFormat::Integer => format!("{}", value.trunc() as i64),
        }
    }
}

/// One bar: its category label, length and the text printed next to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    label: String,
    value: f64,
    annotation: String,
}

impl Bar {
    /// Creates a bar annotated with its formatted value.
    pub fn new(label: impl Into<String>, value: f64, format: ValueFormat) -> Self {
        Self {
            label: label.into(),
            value,
            annotation: format.format(value),
        }
    }

    /// Replaces the annotation printed next to the bar.
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }
}

/// A bar chart with a title and axis labels.
#[derive(Clone, Debug, PartialEq)]
pub struct BarChart {
    title: String,
    orientation: BarOrientation,
    value_axis: String,
    category_axis: Option<String>,
    bars: Vec<Bar>,
}

impl BarChart {
    /// Creates an empty horizontal chart.
    pub fn new(title: impl Into<String>, value_axis: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            orientation: BarOrientation::Horizontal,
            value_axis: value_axis.into(),
            category_axis: None,
            bars: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn orientation(&self) -> BarOrientation {
        self.orientation
    }

    pub fn value_axis(&self) -> &str {
        &self.value_axis
    }

    pub fn category_axis(&self) -> Option<&str> {
        self.category_axis.as_deref()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Sets the orientation and returns the updated chart.
    pub fn with_orientation(mut self, orientation: BarOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the category axis label and returns the updated chart.
    pub fn with_category_axis(mut self, label: impl Into<Option<String>>) -> Self {
        self.category_axis = label.into();
        self
    }

    /// Extends the chart with multiple bars and returns the updated chart.
    pub fn with_bars<I>(mut self, bars: I) -> Self
    where
        I: IntoIterator<Item = Bar>,
    {
        self.bars.extend(bars);
        self
    }
}

/// A labelled correlation heatmap.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap {
    title: String,
    matrix: CorrelationMatrix,
}

impl Heatmap {
    pub fn new(title: impl Into<String>, matrix: CorrelationMatrix) -> Self {
        Self {
            title: title.into(),
            matrix,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn matrix(&self) -> &CorrelationMatrix {
        &self.matrix
    }
}

/// What a single page shows.
#[derive(Clone, Debug, PartialEq)]
pub enum PageContent {
    Bars(BarChart),
    Heatmap(Heatmap),
    /// A diagnostic message standing in for pages that could not be produced.
    Notice(String),
}

/// One page of the report, tagged with the section that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportPage {
    section: SectionId,
    content: PageContent,
}

impl ReportPage {
    pub fn new(section: SectionId, content: PageContent) -> Self {
        Self { section, content }
    }

    pub fn section(&self) -> SectionId {
        self.section
    }

    pub fn content(&self) -> &PageContent {
        &self.content
    }

    /// Title used for bookmarks and logging.
    pub fn title(&self) -> &str {
        match &self.content {
            PageContent::Bars(chart) => chart.title(),
            PageContent::Heatmap(heatmap) => heatmap.title(),
            PageContent::Notice(message) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_format_drops_needless_decimals() {
        assert_eq!(ValueFormat::Natural.format(1500.0), "1500");
        assert_eq!(ValueFormat::Natural.format(12.5), "12.5");
        assert_eq!(ValueFormat::Natural.format(0.1 + 0.2), "0.3");
        assert_eq!(ValueFormat::Fixed(2).format(1.0 / 3.0), "0.33");
        assert_eq!(ValueFormat::Integer.format(18_543.9), "18543");
    }

    #[test]
    fn bar_annotation_can_be_replaced() {
        let bar = Bar::new("Aria", 3.0, ValueFormat::Natural).with_annotation("Aria");
        assert_eq!(bar.annotation(), "Aria");
        assert_eq!(bar.value(), 3.0);
    }

    #[test]
    fn page_title_comes_from_content() {
        let page = ReportPage::new(
            SectionId::TopHp,
            PageContent::Bars(BarChart::new("Top 5 Champions by HP", "HP")),
        );
        assert_eq!(page.title(), "Top 5 Champions by HP");
        assert_eq!(page.section(), SectionId::TopHp);
    }
}
