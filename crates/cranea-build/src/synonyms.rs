//! Synonym expansion.
//!
//! A synonym group is a set of interchangeable phrases (each one or more
//! tokens). Authored commands and item titles are hashed once per
//! spelling, so every combination of substitutions must be enumerated at
//! build time.

use std::collections::BTreeSet;

/// A group of interchangeable phrases, each already tokenized.
pub type SynonymGroup = Vec<Vec<String>>;

/// Every spelling of `tokens` reachable by swapping a phrase for another
/// member of its group.
///
/// Matching is left to right over whole tokens. The input spelling is
/// always included.
pub fn expand(tokens: &[String], groups: &[&SynonymGroup]) -> BTreeSet<Vec<String>> {
    let mut out = BTreeSet::new();
    let mut prefix = Vec::with_capacity(tokens.len());
    expand_from(tokens, groups, &mut prefix, &mut out);
    out
}

fn expand_from(
    rest: &[String],
    groups: &[&SynonymGroup],
    prefix: &mut Vec<String>,
    out: &mut BTreeSet<Vec<String>>,
) {
    if rest.is_empty() {
        out.insert(prefix.clone());
        return;
    }

    let mut matched = false;
    for group in groups {
        for phrase in group.iter() {
            if phrase.is_empty() || !rest.starts_with(phrase) {
                continue;
            }
            matched = true;
            for alt in group.iter() {
                let mark = prefix.len();
                prefix.extend(alt.iter().cloned());
                expand_from(&rest[phrase.len()..], groups, prefix, out);
                prefix.truncate(mark);
            }
        }
    }

    if !matched {
        prefix.push(rest[0].clone());
        expand_from(&rest[1..], groups, prefix, out);
        prefix.pop();
    }
}
