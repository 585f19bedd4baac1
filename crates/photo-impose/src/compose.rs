//! Document composition
//!
//! Builds the finished multi-page PDF from paginated working rasters.
//! The same options and sheets always produce the same bytes.

use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::constants::mm_to_pt;
use crate::layout::{GridLayout, GridPlacement};
use crate::normalize::EncodedRaster;
use crate::options::ImpositionOptions;
use crate::paginate::Sheet;
use crate::render::{PageContext, create_footer_font, render_sheet};
use crate::types::*;

// =============================================================================
// Public API
// =============================================================================

/// Compose the PDF on a blocking task
pub async fn compose_pdf(
    options: ImpositionOptions,
    layout: GridLayout,
    sheets: Vec<Sheet<EncodedRaster>>,
) -> Result<Document> {
    tokio::task::spawn_blocking(move || compose_document(&options, layout, &sheets)).await?
}

/// Compose and serialize in one step
pub fn compose_pdf_bytes(
    options: &ImpositionOptions,
    layout: GridLayout,
    sheets: &[Sheet<EncodedRaster>],
) -> Result<Vec<u8>> {
    let mut doc = compose_document(options, layout, sheets)?;
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Build one page per sheet.
///
/// Fails without producing anything if a sheet does not match the layout or
/// any raster cannot be embedded.
pub fn compose_document(
    options: &ImpositionOptions,
    layout: GridLayout,
    sheets: &[Sheet<EncodedRaster>],
) -> Result<Document> {
    if layout.is_empty() {
        return Err(ImposeError::Validation(
            "layout has no slots".to_string(),
        ));
    }
    if let Some(sheet) = sheets.iter().find(|s| s.len() != layout.total_slots) {
        return Err(ImposeError::Validation(format!(
            "sheet has {} slots but the layout has {}",
            sheet.len(),
            layout.total_slots
        )));
    }

    let mut output = Document::with_version("1.7");
    let pages_tree_id = output.new_object_id();

    let placement = GridPlacement::new(&options.paper, &options.slot, layout);
    let footer_line = options.footer_line();
    let footer = match &footer_line {
        Some(text) => Some((text.as_str(), create_footer_font(&mut output))),
        None => None,
    };

    let ctx = PageContext {
        width_pt: mm_to_pt(options.paper.width_mm),
        height_pt: mm_to_pt(options.paper.height_mm),
        placement: &placement,
        marks: &options.marks,
        footer,
    };

    let mut page_ids = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        page_ids.push(render_sheet(&mut output, pages_tree_id, &ctx, sheet)?);
    }

    // Create pages tree
    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set(
        "Kids",
        Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
    );
    pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    // Create catalog
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_tree_id));
    let catalog_id = output.add_object(catalog);
    output.trailer.set("Root", Object::Reference(catalog_id));

    log::info!(
        "composed {} page(s), {} image(s)",
        page_ids.len(),
        sheets.iter().map(Sheet::occupied).sum::<usize>()
    );

    Ok(output)
}

/// Save the composed document
pub async fn save_pdf(mut doc: Document, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::task::spawn_blocking(move || {
        let mut writer = Vec::new();
        doc.save_to(&mut writer)?;
        Ok::<_, ImposeError>(writer)
    })
    .await??;
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}

/// Number of pages in a serialized PDF
pub fn count_pages(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes)?;
    Ok(doc.get_pages().len())
}
