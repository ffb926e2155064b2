//! Document structure inspection

use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Count pages by walking the catalog to the page tree root.
///
/// Reads the Count field of the root Pages node rather than enumerating
/// leaves, so a malformed tree surfaces as a typed error instead of a
/// silently wrong number.
pub fn page_count(doc: &Document) -> Result<usize> {
    let catalog_id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(Error::General("Root is not a reference".to_string())),
        Err(_) => return Err(Error::General("No Root in trailer".to_string())),
    };
    let catalog = doc.get_object(catalog_id)?.as_dict()?;

    let pages_id = match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(Error::General("Pages is not a reference".to_string())),
        Err(_) => return Err(Error::General("No Pages in catalog".to_string())),
    };
    let pages = doc.get_object(pages_id)?.as_dict()?;

    let count = pages
        .get(b"Count")
        .ok()
        .and_then(|count| count.as_i64().ok())
        .ok_or_else(|| Error::General("No Count in Pages".to_string()))?;

    if count <= 0 {
        return Err(Error::EmptyPdf);
    }
    Ok(count as usize)
}
