use champion_report::aggregate::CorrelationMatrix;
use champion_report::builder::ReportBuilder;
use champion_report::config::SectionId;
use champion_report::fonts;
use champion_report::model::{
    Bar, BarChart, BarOrientation, Heatmap, PageContent, ReportPage, ValueFormat,
};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "bundled fonts missing. Set CHAMPION_REPORT_FONTS_DIR or copy assets/fonts next to the binary.";

fn sample_pages() -> Vec<ReportPage> {
    let top_hp = BarChart::new("Top 5 Champions by HP", "HP").with_bars(vec![
        Bar::new("Aldric", 24000.0, ValueFormat::Natural),
        Bar::new("Brenna", 21000.0, ValueFormat::Natural),
    ]);
    let affinity = BarChart::new("Distribution of Champions by Affinity", "Number of Champions")
        .with_orientation(BarOrientation::Vertical)
        .with_category_axis(Some("Affinity".to_string()))
        .with_bars(vec![
            Bar::new("Magic", 2.0, ValueFormat::Integer),
            Bar::new("Void", 1.0, ValueFormat::Integer),
        ]);
    let matrix = CorrelationMatrix::new(
        vec!["HP".to_string(), "DEF".to_string()],
        vec![vec![1.0, 0.5], vec![0.5, 1.0]],
    );

    vec![
        ReportPage::new(SectionId::TopHp, PageContent::Bars(top_hp)),
        ReportPage::new(SectionId::Affinity, PageContent::Bars(affinity)),
        ReportPage::new(
            SectionId::Correlation,
            PageContent::Heatmap(Heatmap::new("Correlation Between Key Stats", matrix)),
        ),
        ReportPage::new(
            SectionId::RankCounts,
            PageContent::Notice("No champions found at max level for their rank.".to_string()),
        ),
    ]
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let report = ReportBuilder::new("Champion Report")
        .with_source_name("champion_data.csv")
        .add_pages(sample_pages())
        .render()
        .expect("render sample pdf");
    assert_eq!(report.page_count, 4);

    Some(report.bytes)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_pdf_document() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping renders_pdf_document: {SKIP_HINT}");
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "output should be a PDF file");
}

#[test]
fn rendering_is_deterministic() {
    let (Some(bytes_a), Some(bytes_b)) = (render_sample_pdf(), render_sample_pdf()) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_HINT}");
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[cfg(feature = "bookmarks")]
fn outline_targets(document: &lopdf::Document) -> Vec<lopdf::ObjectId> {
    let outlines_id = document
        .catalog()
        .and_then(|catalog| catalog.get(b"Outlines"))
        .and_then(lopdf::Object::as_reference)
        .expect("catalog references an outline");
    let outlines = document.get_dictionary(outlines_id).expect("outline root");

    let mut targets = Vec::new();
    let mut next = outlines.get(b"First").and_then(lopdf::Object::as_reference).ok();
    while let Some(entry_id) = next {
        let entry = document.get_dictionary(entry_id).expect("outline entry");
        let dest = entry
            .get(b"Dest")
            .and_then(lopdf::Object::as_array)
            .expect("outline entry destination");
        targets.push(dest[0].as_reference().expect("destination page"));
        next = entry.get(b"Next").and_then(lopdf::Object::as_reference).ok();
    }
    targets
}

#[cfg(feature = "bookmarks")]
#[test]
fn every_planned_page_is_one_physical_page() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping every_planned_page_is_one_physical_page: {SKIP_HINT}");
        return;
    }

    let report = ReportBuilder::new("Champion Report")
        .add_pages(sample_pages())
        .with_bookmarks(true)
        .render()
        .expect("render with bookmarks");

    let document = lopdf::Document::load_mem(&report.bytes).expect("parse rendered pdf");
    let pages = document.get_pages();
    assert_eq!(pages.len(), report.page_count);

    // Bar pages are drawn with many strokes; a page holding only header and footer is tiny.
    for page_number in [1u32, 2] {
        let content = document
            .get_page_content(pages[&page_number])
            .expect("page content");
        assert!(content.len() > 2000, "page {page_number} holds no chart");
    }

    let expected: Vec<_> = pages.values().copied().collect();
    assert_eq!(outline_targets(&document), expected);
}
