use crate::history::collection::CollectionTag;
use crate::history::normalize::split_ext;
use crate::history::rules::ClassifierRules;
use std::collections::BTreeSet;

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn extension_lower(path: &str) -> String {
    split_ext(file_name(path)).1.to_lowercase()
}

pub fn is_demo(path: &str, rules: &ClassifierRules) -> bool {
    let path = path.to_lowercase();

    if rules.demo_denylist.iter().any(|deny| deny == file_name(&path)) {
        return false;
    }
    if rules.demo_markers.iter().any(|m| path.contains(m.as_str())) {
        return true;
    }

    let ext = extension_lower(&path);
    rules.demo_extensions.iter().any(|e| *e == ext)
}

pub fn is_template(path: &str, rules: &ClassifierRules) -> bool {
    extension_lower(path) == rules.template_extension
}

/// Every collection an archive-internal path belongs to. May be empty.
pub fn classify(path: &str, rules: &ClassifierRules) -> BTreeSet<CollectionTag> {
    let mut tags = BTreeSet::new();
    if is_demo(path, rules) {
        tags.insert(CollectionTag::Demo);
    }
    if is_template(path, rules) {
        tags.insert(CollectionTag::Templates);
    }
    tags
}
