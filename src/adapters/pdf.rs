//! PDF rendering of the HTML report.
//!
//! The rendered report markup is read back with [`parse_html`] and laid out block
//! by block on A4 pages with printpdf's builtin Helvetica. Inline SVGs, such as
//! the rack elevations, are embedded as vector XObjects.

use crate::adapters::dom::{collapse_whitespace, find_element, parse_html, DomNode, ElementNode};
use crate::utils::error::{ReportError, Result};
use printpdf::*;

const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;
const MARGIN_PT: f32 = 40.0;
const CONTENT_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
const PT_TO_MM: f32 = 0.352778;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 9.0;
const ROW_HEIGHT: f32 = 13.0;

const FIGURE_GAP_PT: f32 = 16.0;
const MAX_FIGURE_HEIGHT_PT: f32 = 520.0;

const BLACK: [f32; 3] = [0.12, 0.16, 0.2];
const GREY: [f32; 3] = [0.5, 0.55, 0.6];

fn rgb(c: [f32; 3]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

/// Builtin PDF fonts only cover WinAnsi; keep ASCII, spell out German umlauts,
/// replace everything else.
fn to_pdf_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            'ß' => out.push_str("ss"),
            '\u{00B7}' | '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{00A0}' | '\t' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Characters that fit `width` points at `size`, assuming an average glyph of 0.5em.
fn chars_per_width(width: f32, size: f32) -> usize {
    ((width - 4.0) / (size * 0.5)).floor().max(1.0) as usize
}

fn fit(text: &str, width: f32, size: f32) -> String {
    let max_chars = chars_per_width(width, size);
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = chars_per_width(width, size);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct Cell {
    text: String,
    span: usize,
    header: bool,
    muted: bool,
}

impl Cell {
    fn from_element(cell: &ElementNode) -> Self {
        Self {
            text: cell.text(),
            span: cell
                .attr("colspan")
                .and_then(|s| s.trim().parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(1),
            header: cell.tag == "th",
            muted: cell.has_class("unpatched"),
        }
    }

    fn style(&self) -> (BuiltinFont, [f32; 3]) {
        if self.header {
            (BuiltinFont::HelveticaBold, GREY)
        } else if self.muted {
            (BuiltinFont::HelveticaOblique, GREY)
        } else {
            (BuiltinFont::Helvetica, BLACK)
        }
    }
}

fn table_rows(table: &ElementNode) -> Vec<Vec<Cell>> {
    let mut rows = Vec::new();
    for child in table.elements() {
        match child.tag.as_str() {
            "tr" => rows.push(
                child
                    .elements()
                    .filter(|c| c.tag == "td" || c.tag == "th")
                    .map(Cell::from_element)
                    .collect(),
            ),
            "thead" | "tbody" | "tfoot" => rows.extend(table_rows(child)),
            _ => {}
        }
    }
    rows
}

struct Figure<'a> {
    caption: String,
    svg: Option<&'a str>,
}

impl<'a> Figure<'a> {
    fn from_element(figure: &'a ElementNode) -> Self {
        Self {
            caption: figure
                .elements()
                .find(|e| e.tag == "figcaption")
                .map(|e| e.text())
                .unwrap_or_default(),
            svg: figure.find_svg(),
        }
    }
}

/// An SVG placed in the document with its natural size in points.
struct Embedded {
    id: XObjectId,
    width: f32,
    height: f32,
    dpi: f32,
}

struct PageWriter {
    doc: PdfDocument,
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    /// Distance from the top edge of the current page.
    cursor: f32,
}

impl PageWriter {
    fn new(doc: PdfDocument) -> Self {
        Self {
            doc,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: MARGIN_PT,
        }
    }

    fn break_page(&mut self) {
        let finished = std::mem::take(&mut self.ops);
        self.pages.push(finished);
        self.cursor = MARGIN_PT;
    }

    /// Starts a new page unless `height` still fits. Returns whether it broke.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.cursor > MARGIN_PT && self.cursor + height > PAGE_HEIGHT_PT - MARGIN_PT {
            self.break_page();
            return true;
        }
        false
    }

    fn text(&mut self, x: f32, text: &str, size: f32, font: BuiltinFont, color: [f32; 3]) {
        if text.is_empty() {
            return;
        }
        // Baseline sits roughly 0.75em below the top of the line.
        let baseline = PAGE_HEIGHT_PT - self.cursor - size * 0.75;

        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(MARGIN_PT + x),
                y: Pt(baseline),
            },
        });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size),
            font,
        });
        self.ops.push(Op::SetFillColor { col: rgb(color) });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(to_pdf_text(text))],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn rule(&mut self) {
        let y = PAGE_HEIGHT_PT - self.cursor;
        let point = |x: f32| LinePoint {
            p: Point { x: Pt(x), y: Pt(y) },
            bezier: false,
        };
        self.ops.push(Op::SetOutlineColor { col: rgb(GREY) });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
        self.ops.push(Op::DrawLine {
            line: Line {
                points: vec![point(MARGIN_PT), point(PAGE_WIDTH_PT - MARGIN_PT)],
                is_closed: false,
            },
        });
    }

    fn paragraph(&mut self, text: &str, size: f32, font: BuiltinFont, color: [f32; 3]) {
        for line in wrap(text, CONTENT_WIDTH_PT, size) {
            self.ensure_space(size * 1.4);
            self.text(0.0, &line, size, font, color);
            self.cursor += size * 1.4;
        }
    }

    fn blocks(&mut self, nodes: &[DomNode]) {
        let mut iter = nodes.iter().peekable();
        while let Some(node) = iter.next() {
            match node {
                DomNode::Element(e) if e.tag == "figure" => {
                    // Consecutive figures share one row, like the side-by-side elevations.
                    let mut row = vec![Figure::from_element(e)];
                    while let Some(DomNode::Element(next)) =
                        iter.next_if(|n| matches!(n, DomNode::Element(f) if f.tag == "figure"))
                    {
                        row.push(Figure::from_element(next));
                    }
                    self.figure_row(&row);
                }
                DomNode::Element(e) => self.element(e),
                DomNode::Svg(svg) => self.figure_row(&[Figure {
                    caption: String::new(),
                    svg: Some(svg.as_str()),
                }]),
                DomNode::Text(text) => {
                    let text = collapse_whitespace(text);
                    if !text.is_empty() {
                        self.paragraph(&text, BODY_SIZE, BuiltinFont::Helvetica, BLACK);
                    }
                }
            }
        }
    }

    fn element(&mut self, e: &ElementNode) {
        match e.tag.as_str() {
            "head" | "title" | "style" | "script" => {}
            "h1" => {
                self.paragraph(&e.text(), TITLE_SIZE, BuiltinFont::HelveticaBold, BLACK);
            }
            "h2" => {
                self.cursor += HEADING_SIZE * 0.6;
                self.ensure_space(HEADING_SIZE * 1.4 + ROW_HEIGHT * 3.0);
                self.paragraph(&e.text(), HEADING_SIZE, BuiltinFont::HelveticaBold, BLACK);
                self.rule();
                self.cursor += 4.0;
            }
            "h3" | "h4" | "h5" | "h6" => {
                // Keep the heading together with a table header and one row.
                self.ensure_space(BODY_SIZE * 1.4 + ROW_HEIGHT * 2.0);
                self.paragraph(&e.text(), BODY_SIZE + 1.0, BuiltinFont::HelveticaBold, BLACK);
            }
            "p" | "li" | "figcaption" | "caption" => {
                let color = if e.has_class("meta") { GREY } else { BLACK };
                self.paragraph(&e.text(), BODY_SIZE, BuiltinFont::Helvetica, color);
            }
            "table" => self.table(e),
            "hr" => {
                self.rule();
                self.cursor += 4.0;
            }
            "br" => self.cursor += ROW_HEIGHT,
            _ => self.blocks(&e.children),
        }
    }

    fn row(&mut self, cells: &[Cell], column_width: f32) {
        let mut x = 0.0;
        for cell in cells {
            let width = column_width * cell.span as f32;
            let (font, color) = cell.style();
            let fitted = fit(&cell.text, width, BODY_SIZE);
            self.text(x, &fitted, BODY_SIZE, font, color);
            x += width;
        }
        self.cursor += ROW_HEIGHT;
    }

    fn table(&mut self, table: &ElementNode) {
        let rows = table_rows(table);
        let columns = rows
            .iter()
            .map(|r| r.iter().map(|c| c.span).sum::<usize>())
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return;
        }
        let column_width = CONTENT_WIDTH_PT / columns as f32;
        let header = rows
            .first()
            .filter(|r| !r.is_empty() && r.iter().all(|c| c.header));

        self.ensure_space(ROW_HEIGHT * 2.0);
        for (i, row) in rows.iter().enumerate() {
            // Repeat the header row at the top of each continued page.
            if self.ensure_space(ROW_HEIGHT) && i > 0 {
                if let Some(header) = header {
                    self.row(header, column_width);
                }
            }
            self.row(row, column_width);
        }
        self.cursor += ROW_HEIGHT / 2.0;
    }

    fn embed_svg(&mut self, svg: &str) -> Option<Embedded> {
        let mut warnings = Vec::new();
        match Svg::parse(svg, &mut warnings) {
            Ok(xobject) => {
                let dpi = xobject.dpi.unwrap_or(300.0);
                let to_pt = |px: Option<Px>| px.map(|p| p.0 as f32 * 72.0 / dpi).unwrap_or(0.0);
                let (width, height) = (to_pt(xobject.width), to_pt(xobject.height));
                if width <= 0.0 || height <= 0.0 {
                    tracing::warn!("Skipping SVG without a size");
                    return None;
                }
                let id = self.doc.add_xobject(&xobject);
                Some(Embedded {
                    id,
                    width,
                    height,
                    dpi,
                })
            }
            Err(e) => {
                tracing::warn!("Could not embed SVG in PDF: {}", e);
                None
            }
        }
    }

    fn figure_row(&mut self, figures: &[Figure]) {
        if figures.is_empty() {
            return;
        }
        let count = figures.len() as f32;
        let column_width = (CONTENT_WIDTH_PT - FIGURE_GAP_PT * (count - 1.0)) / count;
        let caption_height = if figures.iter().any(|f| !f.caption.is_empty()) {
            BODY_SIZE * 1.6
        } else {
            0.0
        };

        let placed: Vec<(Option<Embedded>, f32)> = figures
            .iter()
            .map(|figure| {
                let embedded = figure.svg.and_then(|svg| self.embed_svg(svg));
                let scale = embedded
                    .as_ref()
                    .map(|e| (column_width / e.width).min(MAX_FIGURE_HEIGHT_PT / e.height))
                    .unwrap_or(0.0);
                (embedded, scale)
            })
            .collect();

        let body_height = placed
            .iter()
            .map(|(embedded, scale)| match embedded {
                Some(e) => e.height * scale,
                None => ROW_HEIGHT,
            })
            .fold(0.0f32, f32::max);

        self.cursor += 4.0;
        self.ensure_space(caption_height + body_height);

        for (i, (figure, (embedded, scale))) in figures.iter().zip(placed).enumerate() {
            let x = i as f32 * (column_width + FIGURE_GAP_PT);
            self.text(x, &figure.caption, BODY_SIZE, BuiltinFont::HelveticaBold, BLACK);

            match embedded {
                Some(e) => {
                    let bottom = PAGE_HEIGHT_PT - self.cursor - caption_height - e.height * scale;
                    self.ops.push(Op::UseXobject {
                        id: e.id,
                        transform: XObjectTransform {
                            translate_x: Some(Pt(MARGIN_PT + x)),
                            translate_y: Some(Pt(bottom)),
                            rotate: None,
                            scale_x: Some(scale),
                            scale_y: Some(scale),
                            dpi: Some(e.dpi),
                        },
                    });
                }
                None => {
                    let top = self.cursor;
                    self.cursor += caption_height;
                    self.text(x, "(not rendered)", BODY_SIZE, BuiltinFont::HelveticaOblique, GREY);
                    self.cursor = top;
                }
            }
        }

        self.cursor += caption_height + body_height + ROW_HEIGHT / 2.0;
    }

    fn finish(mut self) -> (PdfDocument, Vec<Vec<Op>>) {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.break_page();
        }
        (self.doc, self.pages)
    }
}

/// Lays the report HTML out on A4 portrait pages and returns the PDF bytes.
pub fn render_pdf(html: &str) -> Result<Vec<u8>> {
    let nodes = parse_html(html);
    let title = find_element(&nodes, "title")
        .map(|t| t.text())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Rack documentation".to_string());
    let body = find_element(&nodes, "body")
        .map(|b| b.children.as_slice())
        .unwrap_or(nodes.as_slice());

    let mut writer = PageWriter::new(PdfDocument::new(&title));
    writer.blocks(body);
    let (mut doc, ops) = writer.finish();

    let page_w = Mm(PAGE_WIDTH_PT * PT_TO_MM);
    let page_h = Mm(PAGE_HEIGHT_PT * PT_TO_MM);
    let pages: Vec<PdfPage> = ops
        .into_iter()
        .map(|ops| PdfPage::new(page_w, page_h, ops))
        .collect();
    let page_count = pages.len();
    doc.with_pages(pages);

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        tracing::debug!("printpdf reported {} warnings", warnings.len());
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err(ReportError::Pdf {
            message: "printpdf produced no PDF header".to_string(),
        });
    }

    tracing::debug!("Rendered PDF: {} pages, {} bytes", page_count, bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::html::HtmlRenderer;
    use crate::domain::model::{CableLink, Elevation, PortEntry, RackReport, ReportDevice};

    const FRONT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="230" height="400" viewBox="0 0 230 400"><rect x="10" y="10" width="210" height="22" fill="#1f77b4"/></svg>"##;
    const REAR_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="230" height="400" viewBox="0 0 230 400"><rect x="10" y="60" width="210" height="44" fill="#ff7f0e"/></svg>"##;

    fn report(elevation: Elevation, ports: usize) -> RackReport {
        RackReport {
            rack_id: 42,
            rack_name: Some("R1".to_string()),
            file_stem: "R1".to_string(),
            elevation,
            devices: vec![ReportDevice {
                name: "D1".to_string(),
                id: 1,
                interfaces: (0..ports)
                    .map(|i| PortEntry {
                        name: format!("eth{}", i),
                        link: (i % 2 == 0).then(|| CableLink {
                            label: format!("C{}", i),
                            peer: "eth0".to_string(),
                            peer_device: "core-sw-01".to_string(),
                        }),
                    })
                    .collect(),
                front_ports: vec![],
            }],
            rendered_configs: vec![],
        }
    }

    fn report_html(elevation: Elevation, ports: usize) -> String {
        HtmlRenderer::builtin()
            .unwrap()
            .render(&report(elevation, ports))
            .unwrap()
    }

    fn embedded_forms(pdf: &[u8]) -> usize {
        pdf.windows(5).filter(|w| w == b"/Form").count()
    }

    fn layout(html: &str) -> Vec<Vec<Op>> {
        let nodes = parse_html(html);
        let body = find_element(&nodes, "body").unwrap();
        let mut writer = PageWriter::new(PdfDocument::new("test"));
        writer.blocks(&body.children);
        writer.finish().1
    }

    fn written_text(pages: &[Vec<Op>]) -> Vec<String> {
        pages
            .iter()
            .flatten()
            .filter_map(|op| match op {
                Op::WriteTextBuiltinFont { items, .. } => Some(
                    items
                        .iter()
                        .filter_map(|i| match i {
                            TextItem::Text(t) => Some(t.clone()),
                            _ => None,
                        })
                        .collect::<String>(),
                ),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_pdf(&report_html(Elevation::default(), 4)).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn test_elevations_are_embedded() {
        let without = render_pdf(&report_html(Elevation::default(), 2)).unwrap();
        let front_only = render_pdf(&report_html(
            Elevation {
                front: Some(FRONT_SVG.to_string()),
                rear: None,
            },
            2,
        ))
        .unwrap();
        let both = render_pdf(&report_html(
            Elevation {
                front: Some(FRONT_SVG.to_string()),
                rear: Some(REAR_SVG.to_string()),
            },
            2,
        ))
        .unwrap();

        assert_eq!(embedded_forms(&without), 0);
        assert_eq!(embedded_forms(&front_only), 1);
        assert_eq!(embedded_forms(&both), 2);
    }

    #[test]
    fn test_elevations_share_one_row() {
        let pages = layout(&report_html(
            Elevation {
                front: Some(FRONT_SVG.to_string()),
                rear: Some(REAR_SVG.to_string()),
            },
            0,
        ));

        let placements: Vec<(Pt, Pt)> = pages
            .iter()
            .flatten()
            .filter_map(|op| match op {
                Op::UseXobject { transform, .. } => {
                    Some((transform.translate_x?, transform.translate_y?))
                }
                _ => None,
            })
            .collect();

        assert_eq!(placements.len(), 2);
        assert!(placements[0].0 .0 < placements[1].0 .0);
        assert_eq!(placements[0].1 .0, placements[1].1 .0);
    }

    #[test]
    fn test_unparseable_svg_is_skipped() {
        let bytes = render_pdf(&report_html(
            Elevation {
                front: Some("<svg><broken".to_string()),
                rear: None,
            },
            1,
        ))
        .unwrap();

        assert_eq!(embedded_forms(&bytes), 0);
    }

    #[test]
    fn test_pdf_follows_the_html_content() {
        let text = written_text(&layout(&report_html(Elevation::default(), 2)));

        assert_eq!(text[0], "Rack R1");
        assert_eq!(text[1], "Rack ID 42 - 1 devices - 2 ports");
        assert!(text.contains(&"D1 #1".to_string()));
        assert!(text.contains(&"C0".to_string()));
        assert!(text.contains(&"core-sw-01".to_string()));
        assert!(text.contains(&"unpatched".to_string()));
    }

    #[test]
    fn test_custom_markup_is_rendered() {
        let html = "<html><head><title>T</title></head><body><h1>Custom</h1>\
                    <div><p>Intro text</p><table><tr><th>A</th><th>B</th></tr>\
                    <tr><td colspan=\"2\">wide</td></tr></table></div></body></html>";

        let text = written_text(&layout(html));
        assert_eq!(text, vec!["Custom", "Intro text", "A", "B", "wide"]);
    }

    #[test]
    fn test_long_tables_break_pages_and_repeat_header() {
        let pages = layout(&report_html(Elevation::default(), 120));
        assert!(pages.len() >= 3);

        let headers = written_text(&pages)
            .iter()
            .filter(|t| t.as_str() == "Interface")
            .count();
        assert_eq!(headers, pages.len());
    }

    #[test]
    fn test_empty_document_still_renders_one_page() {
        let writer = PageWriter::new(PdfDocument::new("empty"));
        assert_eq!(writer.finish().1.len(), 1);

        let bytes = render_pdf("").unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn test_to_pdf_text() {
        assert_eq!(to_pdf_text("Zählerschrank Süd"), "Zaehlerschrank Sued");
        assert_eq!(to_pdf_text("rack→A · B"), "rack?A - B");
    }

    #[test]
    fn test_fit_and_wrap() {
        assert_eq!(fit("eth0", 150.0, 9.0), "eth0");
        let long = "x".repeat(80);
        let fitted = fit(&long, 110.0, 9.0);
        assert!(fitted.ends_with("..."));
        assert!(fitted.len() < long.len());

        let lines = wrap("one two three four", 40.0, 9.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), "one two three four");
    }
}
