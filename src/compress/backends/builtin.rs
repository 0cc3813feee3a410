//! Built-in fallback adapter.
//!
//! Dependency-free last resort: only safe, lossless operations on the
//! document structure. Byte-identical duplicate streams are collapsed onto
//! one object, unreachable objects and zero-length streams are dropped, and
//! uncompressed streams are deflated. Never touches image pixels.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::model::AttemptFailure;

pub fn attempt(input: &Path, scratch: &Path) -> Result<(), AttemptFailure> {
    let mut doc = Document::load(input)
        .map_err(|e| AttemptFailure::Internal(format!("failed to parse PDF: {e}")))?;

    let merged = dedup_streams(&mut doc);
    if merged > 0 {
        log::debug!("Collapsed {} duplicate stream object(s)", merged);
    }

    doc.delete_zero_length_streams();
    doc.prune_objects();
    doc.compress();
    doc.renumber_objects();

    doc.save(scratch)
        .map_err(|e| AttemptFailure::Internal(format!("failed to write candidate: {e}")))?;
    Ok(())
}

/// Collapse byte-identical stream objects onto the lowest-numbered copy and
/// rewrite every reference to the dropped copies. Returns how many objects
/// were merged away; `prune_objects` reclaims them afterwards.
fn dedup_streams(doc: &mut Document) -> usize {
    let mut by_hash: HashMap<u64, Vec<ObjectId>> = HashMap::new();
    for (&id, object) in &doc.objects {
        if let Object::Stream(_) = object {
            let mut hasher = DefaultHasher::new();
            hash_object(object, &mut hasher);
            by_hash.entry(hasher.finish()).or_default().push(id);
        }
    }

    let mut replacements: HashMap<ObjectId, ObjectId> = HashMap::new();
    for mut ids in by_hash.into_values() {
        if ids.len() < 2 {
            continue;
        }
        ids.sort();
        let canonical = ids[0];
        for &candidate in &ids[1..] {
            // Hash collisions are possible, confirm byte equality
            let identical = match (doc.objects.get(&canonical), doc.objects.get(&candidate)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            if identical {
                replacements.insert(candidate, canonical);
            }
        }
    }

    if replacements.is_empty() {
        return 0;
    }

    for object in doc.objects.values_mut() {
        rewrite_references(object, &replacements);
    }
    rewrite_dictionary(&mut doc.trailer, &replacements);

    replacements.len()
}

fn rewrite_references(object: &mut Object, replacements: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(&canonical) = replacements.get(id) {
                *id = canonical;
            }
        }
        Object::Array(items) => {
            for item in items {
                rewrite_references(item, replacements);
            }
        }
        Object::Dictionary(dict) => rewrite_dictionary(dict, replacements),
        Object::Stream(stream) => rewrite_dictionary(&mut stream.dict, replacements),
        _ => {}
    }
}

fn rewrite_dictionary(dict: &mut Dictionary, replacements: &HashMap<ObjectId, ObjectId>) {
    for (_, value) in dict.iter_mut() {
        rewrite_references(value, replacements);
    }
}

/// Structural hash over a PDF object. Reals hash by bit pattern, which is
/// exact for the duplicate-detection use case.
fn hash_object(object: &Object, state: &mut impl Hasher) {
    match object {
        Object::Null => 0u8.hash(state),
        Object::Boolean(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Object::Integer(i) => {
            2u8.hash(state);
            i.hash(state);
        }
        Object::Real(r) => {
            3u8.hash(state);
            r.to_bits().hash(state);
        }
        Object::Name(name) => {
            4u8.hash(state);
            name.hash(state);
        }
        Object::String(bytes, _) => {
            5u8.hash(state);
            bytes.hash(state);
        }
        Object::Array(items) => {
            6u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_object(item, state);
            }
        }
        Object::Dictionary(dict) => {
            7u8.hash(state);
            hash_dictionary(dict, state);
        }
        Object::Stream(stream) => {
            8u8.hash(state);
            hash_dictionary(&stream.dict, state);
            stream.content.hash(state);
        }
        Object::Reference(id) => {
            9u8.hash(state);
            id.hash(state);
        }
    }
}

fn hash_dictionary(dict: &Dictionary, state: &mut impl Hasher) {
    dict.len().hash(state);
    for (key, value) in dict.iter() {
        key.hash(state);
        hash_object(value, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn doc_with_duplicate_streams() -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let payload = b"0 0 m 100 100 l S ".repeat(64);
        let first = doc.add_object(Stream::new(dictionary! {}, payload.clone()));
        let second = doc.add_object(Stream::new(dictionary! {}, payload));

        let page_a = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => first,
        });
        let page_b = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => second,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_a.into(), page_b.into()],
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_dedup_merges_identical_streams() {
        let mut doc = doc_with_duplicate_streams();
        let merged = dedup_streams(&mut doc);
        assert_eq!(merged, 1);

        // Both pages now point at the same content object
        let contents: Vec<ObjectId> = doc
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .filter(|d| {
                d.get(b"Type")
                    .and_then(|t| t.as_name())
                    .map(|n| n == b"Page".as_slice())
                    .unwrap_or(false)
            })
            .filter_map(|d| d.get(b"Contents").ok())
            .filter_map(|o| o.as_reference().ok())
            .collect();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0], contents[1]);
    }

    #[test]
    fn test_dedup_leaves_distinct_streams_alone() {
        let mut doc = Document::with_version("1.5");
        doc.add_object(Stream::new(dictionary! {}, b"first".to_vec()));
        doc.add_object(Stream::new(dictionary! {}, b"second".to_vec()));
        assert_eq!(dedup_streams(&mut doc), 0);
    }
}
