//! Tag merging
//!
//! Tags are identified case-insensitively. An incoming tag whose lowercase
//! name is already tracked either replaces the tracked tag (when the two are
//! equivalent ignoring name and prose) or forces both sides to be suffixed
//! with their disambiguating suffix. Every rename is reported back so that
//! operation tag references on either side can follow.

use std::collections::HashMap;

use log::debug;

use super::equivalence::equivalent;
use super::state::{MergeState, Provenance, TagEntry};
use crate::document::{Document, Tag};

/// Old tag name to new tag name.
pub type RenameMap = HashMap<String, String>;

/// Renames produced by merging one document's tags.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagRenames {
    /// To apply to operations already in the accumulator.
    pub existing: RenameMap,
    /// To apply to operations of the incoming document.
    pub incoming: RenameMap,
}

/// Tags are the same tag when everything except name, description and
/// summary matches.
fn tags_equivalent(a: &Tag, b: &Tag) -> bool {
    a.parent == b.parent
        && a.kind == b.kind
        && a.extensions == b.extensions
        && equivalent(&a.external_docs, &b.external_docs)
}

/// `candidate`, or `candidate_2`, `candidate_3`, ... if a tag in `tags`
/// already has that name case-insensitively.
fn unused_name(tags: &[Tag], candidate: String) -> String {
    let taken = |name: &str| {
        let lowered = name.to_lowercase();
        tags.iter().any(|t| t.name.to_lowercase() == lowered)
    };
    if !taken(&candidate) {
        return candidate;
    }
    let mut counter = 2;
    loop {
        let next = format!("{}_{}", candidate, counter);
        if !taken(&next) {
            return next;
        }
        counter += 1;
    }
}

/// Merges `incoming` tags into `merged`, updating the tag tracker of
/// `state`.
pub fn merge_tags(
    state: &mut MergeState,
    merged: &mut Vec<Tag>,
    incoming: Vec<Tag>,
    provenance: &Provenance,
) -> TagRenames {
    let mut renames = TagRenames::default();

    for mut tag in incoming {
        let key = tag.name.to_lowercase();
        let tracked = state.tags.get(&key).is_some_and(|entries| {
            entries
                .iter()
                .any(|entry| merged.iter().any(|t| t.name == entry.current_name))
        });

        // A suffixed tag tracked under another key may already use this name.
        let alias = merged
            .iter()
            .position(|t| t.name.to_lowercase() == key)
            .filter(|&position| {
                let name = &merged[position].name;
                !state
                    .tags
                    .get(&key)
                    .is_some_and(|entries| entries.iter().any(|entry| &entry.current_name == name))
            });
        if let Some(position) = alias {
            if tags_equivalent(&merged[position], &tag) {
                let current = merged[position].name.clone();
                if tag.name != current {
                    renames.incoming.insert(tag.name.clone(), current.clone());
                    tag.name = current;
                }
                merged[position] = tag;
                continue;
            }
            if !tracked {
                let renamed = unused_name(merged, format!("{}_{}", tag.name, provenance.suffix()));
                debug!("incoming tag {} conflicts, renamed to {}", tag.name, renamed);
                renames.incoming.insert(tag.name.clone(), renamed.clone());
                tag.name = renamed.clone();
                state.tags.entry(key).or_default().push(TagEntry {
                    current_name: renamed,
                    provenance: provenance.clone(),
                    suffixed: true,
                });
                merged.push(tag);
                continue;
            }
        }

        let entries = state.tags.entry(key).or_default();

        // (entry index, position in `merged`) of every live tag with this key
        let located: Vec<(usize, usize)> = entries
            .iter()
            .enumerate()
            .filter_map(|(entry_index, entry)| {
                merged
                    .iter()
                    .position(|t| t.name == entry.current_name)
                    .map(|position| (entry_index, position))
            })
            .collect();

        if located.is_empty() {
            entries.push(TagEntry {
                current_name: tag.name.clone(),
                provenance: provenance.clone(),
                suffixed: false,
            });
            merged.push(tag);
            continue;
        }

        let same = located
            .iter()
            .copied()
            .find(|&(_, position)| tags_equivalent(&merged[position], &tag));

        if let Some((entry_index, position)) = same {
            let entry = &mut entries[entry_index];
            if entry.suffixed {
                if tag.name != entry.current_name {
                    renames
                        .incoming
                        .insert(tag.name.clone(), entry.current_name.clone());
                    tag.name = entry.current_name.clone();
                }
            } else {
                if tag.name != entry.current_name {
                    debug!("tag {} now spelled {}", entry.current_name, tag.name);
                    renames
                        .existing
                        .insert(entry.current_name.clone(), tag.name.clone());
                    entry.current_name = tag.name.clone();
                }
                entry.provenance = provenance.clone();
            }
            merged[position] = tag;
            continue;
        }

        for &(entry_index, position) in &located {
            let entry = &mut entries[entry_index];
            if entry.suffixed {
                continue;
            }
            let renamed = unused_name(merged, format!("{}_{}", entry.current_name, entry.provenance.suffix()));
            debug!("tag {} conflicts, renamed to {}", entry.current_name, renamed);
            renames.existing.insert(entry.current_name.clone(), renamed.clone());
            merged[position].name = renamed.clone();
            entry.current_name = renamed;
            entry.suffixed = true;
        }

        let renamed = unused_name(merged, format!("{}_{}", tag.name, provenance.suffix()));
        debug!("incoming tag {} conflicts, renamed to {}", tag.name, renamed);
        renames.incoming.insert(tag.name.clone(), renamed.clone());
        tag.name = renamed.clone();
        entries.push(TagEntry {
            current_name: renamed,
            provenance: provenance.clone(),
            suffixed: true,
        });
        merged.push(tag);
    }

    renames
}

/// Rewrites operation tag references in `doc` through `renames`.
///
/// An exact match wins; otherwise the reference is looked up
/// case-insensitively, so operations that spell a renamed tag with a
/// different casing follow the rename too. Lowercase keys claimed by more
/// than one rename are only matched exactly.
pub fn apply_tag_renames(doc: &mut Document, renames: &RenameMap) {
    if renames.is_empty() {
        return;
    }

    let mut folded: HashMap<String, Option<&String>> = HashMap::new();
    for (old, new) in renames {
        folded
            .entry(old.to_lowercase())
            .and_modify(|target| *target = None)
            .or_insert(Some(new));
    }

    doc.for_each_operation_mut(|_, _, _, op| {
        for tag in op.tags.iter_mut() {
            let target = renames
                .get(tag.as_str())
                .or_else(|| folded.get(&tag.to_lowercase()).copied().flatten());
            if let Some(target) = target {
                *tag = target.clone();
            }
        }
    });
}
