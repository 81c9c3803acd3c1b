use std::io::{BufWriter, Write};

use anyhow::{anyhow, Context, Result};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use super::EXPORT_COLUMNS;
use crate::models::Expense;

pub const REPORT_TITLE: &str = "Expense Tracker Report";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 11.0;
const ROW_HEIGHT: f32 = 8.0;
/// Gap between the title baseline and the top of the table.
const TITLE_GAP: f32 = 12.0;
/// Distance from a row's top border down to its text baseline.
const TEXT_INSET: f32 = 5.5;
const CELL_PADDING: f32 = 2.0;
const LAYER_NAME: &str = "Report";

/// Render the title and a three-column table to `writer`, starting a new page
/// (with the header row repeated) whenever the next row would cross the bottom
/// margin. Returns the page count.
pub fn render_pdf<W: Write>(writer: W, expenses: &[Expense]) -> Result<usize> {
    let (doc, page, layer) =
        PdfDocument::new(REPORT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| anyhow!("failed to load Helvetica: {err}"))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|err| anyhow!("failed to load Helvetica-Bold: {err}"))?,
    };

    let mut canvas = doc.get_page(page).get_layer(layer);
    let mut pages = 1;

    let title_baseline = PAGE_HEIGHT - MARGIN;
    canvas.use_text(
        REPORT_TITLE,
        TITLE_SIZE,
        Mm(MARGIN),
        Mm(title_baseline),
        &fonts.regular,
    );

    let mut top = title_baseline - TITLE_GAP;
    draw_row(&canvas, top, &EXPORT_COLUMNS, &fonts.bold);
    top -= ROW_HEIGHT;

    for expense in expenses {
        if top - ROW_HEIGHT < MARGIN {
            canvas = new_page(&doc);
            pages += 1;
            top = PAGE_HEIGHT - MARGIN;
            draw_row(&canvas, top, &EXPORT_COLUMNS, &fonts.bold);
            top -= ROW_HEIGHT;
        }

        let amount = format!("{:.2}", expense.amount);
        draw_row(
            &canvas,
            top,
            &[amount.as_str(), expense.category.as_str(), expense.time.as_str()],
            &fonts.regular,
        );
        top -= ROW_HEIGHT;
    }

    drop(canvas);
    let mut buffered = BufWriter::new(writer);
    doc.save(&mut buffered)
        .map_err(|err| anyhow!("failed to render PDF: {err}"))?;
    buffered.flush().context("failed to flush PDF output")?;

    Ok(pages)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn new_page(doc: &PdfDocumentReference) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
    doc.get_page(page).get_layer(layer)
}

/// Draw one bordered table row whose top edge sits at `top` (mm from the
/// bottom of the page).
fn draw_row(canvas: &PdfLayerReference, top: f32, cells: &[&str; 3], font: &IndirectFontRef) {
    let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / cells.len() as f32;
    let bottom = top - ROW_HEIGHT;
    let right = PAGE_WIDTH - MARGIN;

    canvas.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(top)), false),
            (Point::new(Mm(right), Mm(top)), false),
            (Point::new(Mm(right), Mm(bottom)), false),
            (Point::new(Mm(MARGIN), Mm(bottom)), false),
        ],
        is_closed: true,
    });

    for (idx, text) in cells.iter().enumerate() {
        let left = MARGIN + column_width * idx as f32;
        if idx > 0 {
            canvas.add_line(Line {
                points: vec![
                    (Point::new(Mm(left), Mm(top)), false),
                    (Point::new(Mm(left), Mm(bottom)), false),
                ],
                is_closed: false,
            });
        }
        canvas.use_text(
            *text,
            BODY_SIZE,
            Mm(left + CELL_PADDING),
            Mm(top - TEXT_INSET),
            font,
        );
    }
}
