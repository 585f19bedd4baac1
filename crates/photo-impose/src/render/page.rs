//! Output page rendering
//!
//! One page per sheet: every occupied slot gets its image stretched over the
//! inner rectangle plus corner marks on the outer rectangle.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::constants::{FOOTER_FONT_SIZE, FOOTER_X_MM, FOOTER_Y_MM, mm_to_pt};
use crate::layout::{GridPlacement, Rect};
use crate::marks::generate_registration_marks;
use crate::normalize::EncodedRaster;
use crate::paginate::Sheet;
use crate::types::{ImposeError, RegistrationMarks, Result};

use super::xobject::embed_raster;

/// Resource name of the footer font
pub const FOOTER_FONT_NAME: &str = "F1";

// =============================================================================
// Public API
// =============================================================================

/// Everything shared by all pages of one document
pub struct PageContext<'a> {
    pub width_pt: f32,
    pub height_pt: f32,
    pub placement: &'a GridPlacement,
    pub marks: &'a RegistrationMarks,
    /// Footer text and the font object drawing it
    pub footer: Option<(&'a str, ObjectId)>,
}

/// Render one sheet as a page and return the page object id.
pub fn render_sheet(
    output: &mut Document,
    parent_pages_id: ObjectId,
    ctx: &PageContext<'_>,
    sheet: &Sheet<EncodedRaster>,
) -> Result<ObjectId> {
    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(ctx.width_pt),
            Object::Real(ctx.height_pt),
        ]),
    );

    let mut content_ops = Vec::new();
    let mut xobjects = Dictionary::new();
    let mut fonts = Dictionary::new();

    for (idx, raster) in sheet.iter_occupied() {
        let bounds = ctx
            .placement
            .slot_bounds_at(idx)
            .ok_or(ImposeError::SlotOutOfRange(idx))?;

        let xobject_name = format!("Im{}", idx);
        let xobject_id = embed_raster(output, raster)?;
        xobjects.set(xobject_name.as_bytes(), Object::Reference(xobject_id));

        content_ops.push(generate_image_command(&xobject_name, &bounds.inner));
        content_ops.push(generate_registration_marks(&bounds.outer, ctx.marks));
    }

    if let Some((text, font_id)) = ctx.footer {
        content_ops.push(generate_footer_command(text));
        fonts.set(FOOTER_FONT_NAME, Object::Reference(font_id));
    }

    // Set up resources
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));
    if !fonts.is_empty() {
        resources.set("Font", Object::Dictionary(fonts));
    }

    // Create content stream
    let content = content_ops.join("");
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(output.add_object(page_dict))
}

/// Helvetica font dictionary for the footer
pub fn create_footer_font(output: &mut Document) -> ObjectId {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    font_dict.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    output.add_object(font_dict)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Draw an image XObject so it fills `rect` exactly
fn generate_image_command(xobject_name: &str, rect: &Rect) -> String {
    format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        rect.width, rect.height, rect.x, rect.y, xobject_name
    )
}

fn generate_footer_command(text: &str) -> String {
    format!(
        "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
        FOOTER_FONT_NAME,
        FOOTER_FONT_SIZE,
        mm_to_pt(FOOTER_X_MM),
        mm_to_pt(FOOTER_Y_MM),
        escape_pdf_string(text)
    )
}

/// Escape text for a literal string in a content stream.
///
/// Text is written in WinAnsiEncoding: Latin-1 plus the typographic
/// characters Windows-1252 keeps in 0x80-0x9F become octal escapes, and
/// anything without a code there is replaced by `?`.
pub fn escape_pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            _ => match win_ansi_code(ch) {
                Some(code) => out.push_str(&format!("\\{:03o}", code)),
                None => out.push('?'),
            },
        }
    }
    out
}

/// WinAnsiEncoding byte for a character outside printable ASCII
fn win_ansi_code(ch: char) -> Option<u8> {
    let code = match ch {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        // C1 controls share these bytes but have no glyph
        '\u{0080}'..='\u{009F}' => return None,
        _ => return u8::try_from(ch as u32).ok(),
    };
    Some(code)
}
