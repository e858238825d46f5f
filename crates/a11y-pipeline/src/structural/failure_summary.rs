/// Fallback failure summaries for engine occurrences that arrive without one.
use std::sync::LazyLock;

use regex::Regex;

static TAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<\s*([A-Za-z][A-Za-z0-9-]*)").expect("valid regex"));

const TEMPLATES: &[(&str, &str)] = &[
    (
        "color-contrast",
        "Fix the following: Element has insufficient color contrast between foreground and background colors (minimum 4.5:1 for normal text, 3:1 for large text)",
    ),
    (
        "image-alt",
        "Fix any of the following: Image does not have an alt attribute, and has no aria-label, aria-labelledby or title",
    ),
    (
        "label",
        "Fix any of the following: Form element does not have an implicit (wrapped) <label>, an explicit <label for>, aria-label or aria-labelledby",
    ),
    (
        "link-name",
        "Fix all of the following: Link has no discernible text that is visible or exposed to screen readers",
    ),
    (
        "button-name",
        "Fix any of the following: Button does not have inner text, aria-label, aria-labelledby or title that screen readers can announce",
    ),
    (
        "heading-order",
        "Fix the following: Heading level skips one or more levels; heading levels should only increase by one",
    ),
    (
        "html-has-lang",
        "Fix the following: The <html> element does not have a lang attribute",
    ),
    (
        "document-title",
        "Fix the following: Document does not have a non-empty <title> element",
    ),
    (
        "target-size",
        "Fix the following: Target is smaller than 24 by 24 CSS pixels and has insufficient spacing from neighbouring targets",
    ),
    (
        "landmark-one-main",
        "Fix the following: Document does not have a main landmark",
    ),
    (
        "region",
        "Fix the following: Some page content is not contained by landmarks",
    ),
    (
        "form-field-multiple-labels",
        "Fix the following: Form field has more than one <label> element",
    ),
];

/// Summary for an occurrence of `rule_id` whose engine output had none.
pub fn synthesize(rule_id: &str, html: &str) -> String {
    if let Some((_, template)) = TEMPLATES.iter().find(|(id, _)| *id == rule_id) {
        return (*template).to_string();
    }
    format!(
        "Fix the following: The <{}> element does not satisfy the \"{}\" rule",
        tag_name(html),
        rule_id
    )
}

/// Lower-cased tag name of the first element in `html`, or `element` if none is found.
pub fn tag_name(html: &str) -> String {
    TAG_NAME_RE
        .captures(html)
        .map(|caps| caps[1].to_ascii_lowercase())
        .unwrap_or_else(|| "element".to_string())
}
