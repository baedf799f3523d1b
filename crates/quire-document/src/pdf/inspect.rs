// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspection using the `lopdf` crate.

use lopdf::Document;
use quire_core::error::{QuireError, Result};
use tracing::{debug, instrument};

/// Number of pages in a PDF held in memory.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn page_count(data: &[u8]) -> Result<u32> {
    let document = Document::load_mem(data)
        .map_err(|err| QuireError::Pdf(format!("failed to load PDF from memory: {err}")))?;

    let pages = document.get_pages().len() as u32;
    debug!(pages, "PDF loaded from bytes");
    Ok(pages)
}

/// Build an unencrypted PDF with `pages` blank A4 pages.
#[cfg(any(test, feature = "testing"))]
pub fn sample_pdf(pages: u32) -> Vec<u8> {
    use lopdf::{Object, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("serialise sample PDF");
    output
}
