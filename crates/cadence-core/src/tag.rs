//! Tag/index references and the tag map of a node's input streams
//!
//! Streams are declared as `"TAG:index:name"`, `"TAG:name"` or `"name"` and
//! referenced from configuration as `"TAG"`, `"TAG:index"` or `":index"`.
//! A [`TagMap`] assigns each declared stream a dense [`StreamId`]: tags in
//! lexicographic order, indexes ascending within a tag.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::{CadenceError, CadenceResult, StreamId};

/// A symbolic tag plus ordinal naming one stream
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct TagIndex {
    pub tag: String,
    pub index: usize,
}

impl TagIndex {
    pub fn new(tag: impl Into<String>, index: usize) -> Self {
        TagIndex {
            tag: tag.into(),
            index,
        }
    }

    /// Parse a configuration reference: `"TAG"`, `"TAG:index"` or `":index"`.
    pub fn parse(reference: &str) -> CadenceResult<Self> {
        let invalid = || CadenceError::InvalidTagIndex(reference.to_string());
        let mut parts = reference.split(':');
        let tag = parts.next().unwrap_or_default();
        let index = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }
        match index {
            None if is_valid_tag(tag) => Ok(TagIndex::new(tag, 0)),
            Some(index) if tag.is_empty() || is_valid_tag(tag) => {
                let index = parse_index(index).ok_or_else(invalid)?;
                Ok(TagIndex::new(tag, index))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Debug for TagIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag, self.index)
    }
}

impl fmt::Display for TagIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag, self.index)
    }
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Decimal index without leading zeros
fn parse_index(index: &str) -> Option<usize> {
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if index.len() > 1 && index.starts_with('0') {
        return None;
    }
    index.parse().ok()
}

/// A parsed stream declaration. `index` is `None` for bare names, which
/// are numbered in declaration order under the empty tag.
struct Declaration {
    tag: String,
    index: Option<usize>,
    name: String,
}

fn parse_declaration(decl: &str) -> CadenceResult<Declaration> {
    let invalid = || CadenceError::InvalidStreamDeclaration(decl.to_string());
    let parts: Vec<&str> = decl.split(':').collect();
    let (tag, index, name) = match parts.as_slice() {
        [name] => ("", None, *name),
        [tag, name] if is_valid_tag(tag) => (*tag, Some(0), *name),
        [tag, index, name] if tag.is_empty() || is_valid_tag(tag) => {
            (*tag, Some(parse_index(index).ok_or_else(invalid)?), *name)
        }
        _ => return Err(invalid()),
    };
    if !is_valid_name(name) {
        return Err(invalid());
    }
    Ok(Declaration {
        tag: tag.to_string(),
        index,
        name: name.to_string(),
    })
}

#[derive(Clone, Copy, Debug)]
struct TagData {
    first_id: usize,
    count: usize,
}

/// Mapping between tag/index references and stream identifiers
#[derive(Clone, Debug)]
pub struct TagMap {
    tags: BTreeMap<String, TagData>,
    /// Stream names in id order
    names: Vec<String>,
}

impl TagMap {
    /// Build a tag map from stream declarations.
    pub fn new<S: AsRef<str>>(declarations: &[S]) -> CadenceResult<Self> {
        let mut seen_names = HashSet::new();
        let mut by_tag: BTreeMap<String, Vec<(usize, String)>> = BTreeMap::new();
        let mut next_bare_index = 0;

        for decl in declarations {
            let decl = parse_declaration(decl.as_ref())?;
            if !seen_names.insert(decl.name.clone()) {
                return Err(CadenceError::DuplicateStreamName(decl.name));
            }
            let index = decl.index.unwrap_or_else(|| {
                next_bare_index += 1;
                next_bare_index - 1
            });
            by_tag.entry(decl.tag).or_default().push((index, decl.name));
        }

        let mut tags = BTreeMap::new();
        let mut names = Vec::with_capacity(seen_names.len());
        for (tag, mut entries) in by_tag {
            entries.sort_by_key(|(index, _)| *index);
            for (expected, (actual, _)) in entries.iter().enumerate() {
                if *actual != expected {
                    return Err(CadenceError::NonContiguousIndex {
                        tag,
                        expected,
                        actual: *actual,
                    });
                }
            }
            tags.insert(
                tag,
                TagData {
                    first_id: names.len(),
                    count: entries.len(),
                },
            );
            names.extend(entries.into_iter().map(|(_, name)| name));
        }

        Ok(TagMap { tags, names })
    }

    /// Resolve a tag and index to a stream id.
    pub fn get_id(&self, tag: &str, index: usize) -> Option<StreamId> {
        let data = self.tags.get(tag)?;
        (index < data.count).then(|| StreamId::new(data.first_id + index))
    }

    pub fn resolve(&self, tag_index: &TagIndex) -> Option<StreamId> {
        self.get_id(&tag_index.tag, tag_index.index)
    }

    /// Tag/index of a stream id
    pub fn tag_index(&self, id: StreamId) -> Option<TagIndex> {
        self.tags
            .iter()
            .find(|(_, data)| (data.first_id..data.first_id + data.count).contains(&id.index()))
            .map(|(tag, data)| TagIndex::new(tag.clone(), id.index() - data.first_id))
    }

    pub fn name(&self, id: StreamId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    pub fn num_entries(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All stream ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = StreamId> + '_ {
        (0..self.names.len()).map(StreamId::new)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }
}
