//! Document compositing: appending whole PDFs and stamping overlays.

use std::collections::{BTreeMap, HashMap};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// Append documents into one, preserving page order.
///
/// Every object is renumbered past the previous document's id range so
/// references never collide, then a fresh page tree and catalog are built
/// over the collected pages.
pub fn append_documents(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        return Err(Error::General("No documents to append".to_string()));
    }

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        if doc.get_pages().is_empty() {
            return Err(Error::EmptyPdf);
        }

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_iter().map(|(_, object_id)| object_id));
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);
    // new_object_id counts up from max_id, which must cover the ids we
    // just inserted
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();
    let kids: Vec<Object> = page_ids
        .iter()
        .map(|&object_id| Object::Reference(object_id))
        .collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_ids.len() as i64,
            "Kids" => kids,
        }),
    );

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    for &page_id in &page_ids {
        // Re-parenting severs the original Pages chain, so any attribute
        // the page inherited from it has to be copied down first
        let inherited: Vec<(&[u8], Object)> = INHERITABLE_PAGE_KEYS
            .iter()
            .filter_map(|&key| {
                let page_dict = merged.get_object(page_id).ok()?.as_dict().ok()?;
                if page_dict.has(key) {
                    return None;
                }
                Some((key, inherited_page_attribute(&merged, page_id, key)?))
            })
            .collect();

        if let Ok(Object::Dictionary(ref mut page_dict)) = merged.get_object_mut(page_id) {
            for (key, value) in inherited {
                page_dict.set(key, value);
            }
            page_dict.set("Parent", pages_id);
        }
    }

    Ok(merged)
}

/// Stamp the first page of `overlay` onto page `page_number` of `base`.
///
/// Page numbers are 1-based. The base page's own content is wrapped in a
/// `q`/`Q` pair first so a template that leaves graphics state dangling
/// cannot displace the stamped content, then the overlay page's content
/// streams and resources are appended.
pub fn stamp_overlay(base: &mut Document, overlay: &Document, page_number: u32) -> Result<()> {
    let target_page_id = *base
        .get_pages()
        .get(&page_number)
        .ok_or_else(|| Error::General(format!("Page {} not found in document", page_number)))?;

    // Copy the overlay's objects in, renumbered past the base id range
    let id_offset = base.max_id + 1;
    let mut id_map: HashMap<ObjectId, ObjectId> = HashMap::new();
    for &(id, generation) in overlay.objects.keys() {
        id_map.insert((id, generation), (id + id_offset, generation));
    }
    for (old_id, object) in &overlay.objects {
        base.objects
            .insert(id_map[old_id], renumber_object_references(object, &id_map));
    }
    base.max_id = overlay.max_id + id_offset;

    let (overlay_contents, overlay_resources) = overlay_page_parts(overlay, &id_map)?;

    wrap_page_content(base, target_page_id)?;
    let resources = merged_page_resources(base, target_page_id, &overlay_resources);

    if let Object::Dictionary(ref mut page_dict) = base.get_object_mut(target_page_id)? {
        let contents = match page_dict.get(b"Contents").ok().cloned() {
            Some(Object::Reference(content_id)) => {
                let mut contents = vec![Object::Reference(content_id)];
                contents.extend(overlay_contents);
                contents
            }
            Some(Object::Array(mut contents)) => {
                contents.extend(overlay_contents);
                contents
            }
            _ => overlay_contents,
        };
        page_dict.set("Contents", Object::Array(contents));
        page_dict.set("Resources", Object::Dictionary(resources));
    }

    Ok(())
}

/// Renumber all object references in an object through the id map
fn renumber_object_references(object: &Object, id_map: &HashMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(old_id) => match id_map.get(old_id) {
            Some(&new_id) => Object::Reference(new_id),
            None => Object::Reference(*old_id),
        },
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| renumber_object_references(item, id_map))
                .collect(),
        ),
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                new_dict.set(key.clone(), renumber_object_references(value, id_map));
            }
            Object::Dictionary(new_dict)
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                new_dict.set(key.clone(), renumber_object_references(value, id_map));
            }
            Object::Stream(Stream {
                dict: new_dict,
                content: stream.content.clone(),
                allows_compression: stream.allows_compression,
                start_position: stream.start_position,
            })
        }
        _ => object.clone(),
    }
}

/// Content references and resources of the overlay's first page, with
/// ids already remapped into the destination document
fn overlay_page_parts(
    overlay: &Document,
    id_map: &HashMap<ObjectId, ObjectId>,
) -> Result<(Vec<Object>, Object)> {
    let pages = overlay.get_pages();
    let (_, &page_id) = pages.iter().next().ok_or(Error::EmptyPdf)?;
    let page_dict = overlay.get_object(page_id)?.as_dict()?;

    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => match renumber_object_references(contents, id_map) {
            Object::Array(items) => items,
            other => vec![other],
        },
        Err(_) => Vec::new(),
    };
    let resources = match page_dict.get(b"Resources") {
        Ok(resources) => renumber_object_references(resources, id_map),
        Err(_) => Object::Dictionary(Dictionary::new()),
    };

    Ok((contents, resources))
}

/// Replace a page's content streams with one stream wrapped in q/Q
fn wrap_page_content(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let content_ids: Vec<ObjectId> = {
        let page_dict = doc.get_object(page_id)?.as_dict()?;
        match page_dict.get(b"Contents") {
            Ok(Object::Reference(content_id)) => vec![*content_id],
            Ok(Object::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Object::Reference(content_id) => Some(*content_id),
                    _ => None,
                })
                .collect(),
            _ => return Ok(()),
        }
    };

    let mut combined = b"q\n".to_vec();
    for content_id in content_ids {
        if let Ok(Object::Stream(stream)) = doc.get_object(content_id) {
            match stream.decompressed_content() {
                Ok(data) => combined.extend_from_slice(&data),
                Err(_) => combined.extend_from_slice(&stream.content),
            }
            combined.push(b'\n');
        }
    }
    combined.extend_from_slice(b"Q\n");

    let wrapped_id = doc.add_object(Stream::new(Dictionary::new(), combined));
    if let Object::Dictionary(ref mut page_dict) = doc.get_object_mut(page_id)? {
        page_dict.set("Contents", Object::Reference(wrapped_id));
    }
    Ok(())
}

/// Page attributes that may live on an ancestor Pages node
const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Fetch a page attribute, falling back to the Pages tree when the page
/// does not carry it directly
fn inherited_page_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    // the bound guards a malformed tree with a Parent cycle
    for _ in 0..64 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => *parent_id,
            _ => return None,
        };
    }
    None
}

/// Merge overlay resources into a page's resources.
///
/// Resource types such as `/Font` and `/XObject` are merged entry by
/// entry with the overlay winning on name conflicts. Resources held
/// behind references are dereferenced first so the merge sees the actual
/// dictionaries rather than clobbering one with the other. Resources the
/// page inherits from its Pages chain are folded in too, since the
/// merged dictionary is written back at page level and would otherwise
/// shadow them.
fn merged_page_resources(
    doc: &Document,
    page_id: ObjectId,
    overlay_resources: &Object,
) -> Dictionary {
    let mut merged = match inherited_page_attribute(doc, page_id, b"Resources") {
        Some(resources) => resolve_dict(doc, &resources),
        None => Dictionary::new(),
    };

    for (key, value) in resolve_dict(doc, overlay_resources).iter() {
        match (merged.get(key).ok().cloned(), value) {
            (Some(existing), Object::Dictionary(overlay_subdict)) => {
                let mut subdict = resolve_dict(doc, &existing);
                for (subkey, subvalue) in overlay_subdict.iter() {
                    subdict.set(subkey.clone(), subvalue.clone());
                }
                merged.set(key.clone(), Object::Dictionary(subdict));
            }
            _ => {
                merged.set(key.clone(), value.clone());
            }
        }
    }

    merged
}

fn resolve_dict(doc: &Document, object: &Object) -> Dictionary {
    match object {
        Object::Dictionary(dict) => dict.clone(),
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        },
        _ => Dictionary::new(),
    }
}
