//! Destination paths for archive entries.
//!
//! Archives wrap their content in installer and product folders (`AGS/`,
//! `{app}/`, `Demo Game/`) that must not leak into the history, and the
//! filename casing drifted between releases. `normalize` strips the wrapper
//! folders and applies one casing convention so that the same logical file
//! lands on the same destination in every release.
//!
//! `normalize` is idempotent: feeding its output back in under the same
//! convention returns the same path.

use crate::history::collection::NamingConvention;
use crate::history::rules::NormalizerRules;

/// Split a filename into stem and extension (extension keeps its dot).
///
/// Leading dots belong to the stem, so `.crm` has no extension.
pub fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Capitalise the first letter of every run of letters, lowercase the rest.
///
/// Any non-letter starts a new run, so `room2nd` becomes `Room2Nd`. Letters
/// whose capital expands keep only the leading capital (`ß` becomes `Ss`),
/// which keeps the result stable under a second pass.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_letter = false;
    for ch in input.chars() {
        if prev_letter {
            out.extend(ch.to_lowercase());
        } else {
            let mut upper = ch.to_uppercase();
            if let Some(first) = upper.next() {
                out.push(first);
            }
            for rest in upper {
                out.extend(rest.to_lowercase());
            }
        }
        prev_letter = ch.is_alphabetic();
    }
    out
}

fn split_dir(raw: &str) -> (&str, &str) {
    match raw.rfind('/') {
        Some(idx) => {
            let head = &raw[..=idx];
            let trimmed = head.trim_end_matches('/');
            let dir = if trimmed.is_empty() { head } else { trimmed };
            (dir, &raw[idx + 1..])
        }
        None => ("", raw),
    }
}

fn normalize_dir(dir: &str, rules: &NormalizerRules) -> String {
    let segments: Vec<&str> = dir.split('/').collect();
    let kept = segments
        .iter()
        .position(|segment| {
            let lower = segment.to_lowercase();
            !rules
                .noise_prefixes
                .iter()
                .any(|noise| lower.starts_with(noise.as_str()))
        })
        .unwrap_or(segments.len());

    segments[kept..]
        .iter()
        .map(|segment| title_case(segment))
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_file_name(name: &str, naming: NamingConvention, rules: &NormalizerRules) -> String {
    if naming == NamingConvention::Dos {
        return name.to_uppercase();
    }

    let lower = name.to_lowercase();
    if lower.ends_with(rules.template_extension.as_str()) {
        let (stem, ext) = split_ext(name);
        return format!("{stem}{}", ext.to_lowercase());
    }

    if rules
        .keyword_prefixes
        .iter()
        .any(|keyword| lower.starts_with(keyword.as_str()))
    {
        let (stem, ext) = split_ext(name);
        let mut out = format!("{}{}", title_case(stem), ext.to_lowercase());
        for fixup in &rules.fixups {
            out = out.replace(&fixup.find, &fixup.replace);
        }
        return out;
    }

    lower
}

/// Map an archive-internal path to its destination relative to a live dir.
pub fn normalize(raw: &str, naming: NamingConvention, rules: &NormalizerRules) -> String {
    let (dir, name) = split_dir(raw);
    let dir = normalize_dir(dir, rules);
    let name = normalize_file_name(name, naming, rules);
    if dir.is_empty() {
        name
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}
