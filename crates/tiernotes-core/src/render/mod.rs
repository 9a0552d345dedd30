//! Lay out cumulative note text as a bulleted, word-wrapped, paginated PDF.

pub mod metrics;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use thiserror::Error;

use metrics::text_width;

// US Letter, in points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 50.0;
pub const BULLET_INDENT: f32 = 20.0;
pub const FONT_SIZE: f32 = 10.0;
pub const LINE_HEIGHT: f32 = 14.0;
pub const TITLE_SIZE: f32 = 14.0;
pub const BANNER_HEIGHT: f32 = 60.0;
/// A line whose baseline would fall below this starts a new page.
pub const OVERFLOW_Y: f32 = MARGIN + 20.0;
/// Baseline-to-baseline distance from a point's last line to the next point.
pub const POINT_SPACING: f32 = LINE_HEIGHT * 1.5;

pub const TEXT_X: f32 = MARGIN + BULLET_INDENT;
pub const TEXT_WIDTH: f32 = PAGE_WIDTH - MARGIN * 2.0 - BULLET_INDENT;
const FIRST_PAGE_TOP: f32 = PAGE_HEIGHT - 90.0;
const CONTINUATION_TOP: f32 = PAGE_HEIGHT - MARGIN;
const TITLE_Y: f32 = PAGE_HEIGHT - 38.0;
const BANNER_RGB: [f32; 3] = [0.15, 0.25, 0.45];

const ERROR_TITLE: &str = "DOCUMENT UNAVAILABLE";

/// WinAnsiEncoding code for the bullet glyph.
const WIN_ANSI_BULLET: u8 = 0x95;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to encode page content: {0}")]
    Encode(String),
    #[error("failed to write document: {0}")]
    Save(String),
}

/// One positioned drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Banner,
    Title(String),
    Bullet { x: f32, y: f32 },
    Text { x: f32, y: f32, text: String },
}

/// Positioned elements, one vector per page.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub pages: Vec<Vec<Element>>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn text_lines(&self) -> impl Iterator<Item = (f32, &str)> {
        self.pages.iter().flatten().filter_map(|e| match e {
            Element::Text { y, text, .. } => Some((*y, text.as_str())),
            _ => None,
        })
    }
}

/// Render a note to PDF bytes. Never fails: on error an error page is
/// returned instead.
pub fn render_note(title: &str, content: &str) -> Vec<u8> {
    recover(title, write_pdf(&layout(title, content)))
}

fn recover(title: &str, rendered: Result<Vec<u8>, RenderError>) -> Vec<u8> {
    rendered.unwrap_or_else(|e| {
        tracing::warn!(title, error = %e, "render failed, emitting error page");
        error_document(&e.to_string())
    })
}

/// Minimal single-page document carrying an error message.
pub fn error_document(message: &str) -> Vec<u8> {
    let body = format!("This document could not be generated. {message}");
    write_pdf(&layout(ERROR_TITLE, &body)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to render error page");
        blank_page()
    })
}

/// One empty US Letter page, assembled by hand so it cannot fail.
fn blank_page() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] >>"),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref = out.len();
    let size = objects.len() + 1;
    // Each xref entry is exactly 20 bytes.
    out.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n").as_bytes(),
    );
    out
}

/// Greedy word wrap against `max_width` at `size`. A word wider than the line
/// gets a line of its own.
pub fn wrap_words(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if text_width(&candidate, size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Position title, bullets and wrapped lines over as many pages as needed.
pub fn layout(title: &str, content: &str) -> Layout {
    let mut pages = Vec::new();
    let mut page = vec![Element::Banner, Element::Title(printable(title))];
    let mut y = FIRST_PAGE_TOP;

    let points = content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());

    for point in points {
        for (i, line) in wrap_words(&printable(point), TEXT_WIDTH, FONT_SIZE)
            .into_iter()
            .enumerate()
        {
            if y < OVERFLOW_Y {
                pages.push(std::mem::take(&mut page));
                y = CONTINUATION_TOP;
            }
            if i == 0 {
                page.push(Element::Bullet { x: MARGIN, y });
            }
            page.push(Element::Text {
                x: TEXT_X,
                y,
                text: line,
            });
            y -= LINE_HEIGHT;
        }
        // The last line already advanced by one line height.
        y -= POINT_SPACING - LINE_HEIGHT;
    }
    pages.push(page);

    Layout { pages }
}

/// Replace anything the standard Type1 fonts can't show with `?`.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_graphic() || c.is_ascii_whitespace() {
                c
            } else {
                '?'
            }
        })
        .collect()
}

fn real(v: f32) -> Object {
    Object::Real(v.into())
}

fn show_text(font: &str, size: f32, rgb: [f32; 3], x: f32, y: f32, bytes: Vec<u8>) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), real(size)]),
        Operation::new("rg", rgb.iter().copied().map(real).collect()),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

fn page_operations(elements: &[Element]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for element in elements {
        match element {
            Element::Banner => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "rg",
                    BANNER_RGB.iter().copied().map(real).collect(),
                ));
                ops.push(Operation::new(
                    "re",
                    vec![
                        real(0.0),
                        real(PAGE_HEIGHT - BANNER_HEIGHT),
                        real(PAGE_WIDTH),
                        real(BANNER_HEIGHT),
                    ],
                ));
                ops.push(Operation::new("f", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            Element::Title(title) => ops.extend(show_text(
                "F2",
                TITLE_SIZE,
                [1.0, 1.0, 1.0],
                MARGIN,
                TITLE_Y,
                title.as_bytes().to_vec(),
            )),
            Element::Bullet { x, y } => ops.extend(show_text(
                "F2",
                FONT_SIZE,
                [0.0, 0.0, 0.0],
                *x,
                *y,
                vec![WIN_ANSI_BULLET],
            )),
            Element::Text { x, y, text } => ops.extend(show_text(
                "F1",
                FONT_SIZE,
                [0.0, 0.0, 0.0],
                *x,
                *y,
                text.as_bytes().to_vec(),
            )),
        }
    }
    ops
}

fn write_pdf(layout: &Layout) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for elements in &layout.pages {
        let content = Content {
            operations: page_operations(elements),
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| RenderError::Save(e.to_string()))?;
    Ok(buf)
}
