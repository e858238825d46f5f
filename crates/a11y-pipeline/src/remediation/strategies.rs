/// Rule-specific remediation heuristics.
///
/// Each strategy inspects the offending HTML, its selector and the failure
/// summary and returns Markdown prose with at most one fenced code block. The
/// generator normalises that the same way it normalises AI replies. Returning
/// `None` means "nothing targeted to say" and lets the generic fallback apply.
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::model::Severity;
use crate::structural::failure_summary::tag_name;

/// Everything a strategy gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct FixContext<'a> {
    pub rule_id: &'a str,
    pub html: &'a str,
    pub selector: &'a str,
    pub failure_summary: &'a str,
    pub impact: Severity,
}

pub trait RuleFixStrategy: Send + Sync {
    fn rule_id(&self) -> &'static str;

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String>;
}

/// Lookup table of strategies by rule id, with a default for everything else.
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Box<dyn RuleFixStrategy>>,
    default: Box<dyn RuleFixStrategy>,
}

impl StrategyRegistry {
    pub fn empty(default: Box<dyn RuleFixStrategy>) -> Self {
        Self {
            strategies: HashMap::new(),
            default,
        }
    }

    /// The built-in strategies.
    pub fn standard() -> Self {
        let mut registry = Self::empty(Box::new(GenericTemplate));
        registry.register(Box::new(HeadingOrder));
        registry.register(Box::new(ColorContrast));
        registry.register(Box::new(ImageAlt));
        registry.register(Box::new(TargetSize));
        registry.register(Box::new(Label));
        registry.register(Box::new(LinkName));
        registry.register(Box::new(ButtonName));
        registry.register(Box::new(MultipleLabels));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn RuleFixStrategy>) {
        self.strategies.insert(strategy.rule_id(), strategy);
    }

    pub fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        self.strategies
            .get(ctx.rule_id)
            .unwrap_or(&self.default)
            .suggest(ctx)
    }
}

// --- HTML helpers ---

static HEADING_LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bh([1-6])\b").expect("valid regex"));
static CONTRAST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)contrast of ([0-9.]+).*?foreground colou?r: (#[0-9a-f]{3,8}).*?background colou?r: (#[0-9a-f]{3,8}).*?expected contrast ratio of ([0-9.]+:1)")
        .expect("valid regex")
});

/// Name and attributes of one element, as parsed.
#[derive(Debug, Clone)]
struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
}

impl StartTag {
    /// The first element of an HTML fragment.
    fn first_in(html: &str) -> Option<Self> {
        let fragment = Html::parse_fragment(html);
        let element = fragment.root_element().children().find_map(ElementRef::wrap)?;
        Some(Self {
            name: element.value().name().to_string(),
            attrs: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The set attribute leads, the rest keep their parsed order.
    fn set(&mut self, name: &str, value: &str) {
        self.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.attrs.insert(0, (name.to_ascii_lowercase(), value.to_string()));
    }

    fn render(&self) -> String {
        let mut out = format!("<{}", self.name);
        for (k, v) in &self.attrs {
            out.push_str(&format!(" {k}=\"{}\"", escape_attr(v)));
        }
        out.push('>');
        out
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Byte ranges of the start tags in `html`. End tags, comments and doctypes are skipped.
fn start_tags(html: &str) -> Vec<Range<usize>> {
    let bytes = html.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while let Some(offset) = html[i..].find('<') {
        let start = i + offset;
        let rest = &html[start..];
        if rest.starts_with("<!--") {
            i = rest.find("-->").map_or(html.len(), |e| start + e + 3);
            continue;
        }
        let mut quote = None;
        let mut end = html.len();
        for (j, b) in rest.bytes().enumerate().skip(1) {
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'>') => {
                    end = start + j + 1;
                    break;
                }
                _ => {}
            }
        }
        if bytes.get(start + 1).is_some_and(u8::is_ascii_alphabetic) {
            spans.push(start..end);
        }
        i = end;
    }
    spans
}

fn span_name<'a>(html: &'a str, span: &Range<usize>) -> &'a str {
    let tag = &html[span.start + 1..span.end];
    let len = tag
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(tag.len());
    &tag[..len]
}

/// Value of attribute `name` on the first element in `html`.
///
/// A bare attribute (`alt` with no value) yields `Some("")`.
fn attr(html: &str, name: &str) -> Option<String> {
    StartTag::first_in(html)?.attr(name).map(str::to_string)
}

/// Rewrite the opening tag of the first element, leaving the rest of `html` untouched.
///
/// Fragments the parser relocates or drops (a bare `<td>`, say) come back unchanged.
fn rewrite_first_tag(html: &str, edit: impl FnOnce(&mut StartTag)) -> String {
    let (Some(span), Some(mut tag)) = (start_tags(html).into_iter().next(), StartTag::first_in(html)) else {
        return html.to_string();
    };
    if !span_name(html, &span).eq_ignore_ascii_case(&tag.name) {
        return html.to_string();
    }
    edit(&mut tag);
    format!("{}{}{}", &html[..span.start], tag.render(), &html[span.end..])
}

/// Set (or replace) an attribute on the first element of `html`.
fn set_attr(html: &str, name: &str, value: &str) -> String {
    rewrite_first_tag(html, |tag| tag.set(name, value))
}

fn text_content(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Words of a file name or identifier, e.g. `ad-banner_sidebar.jpg` -> `["ad", "banner", "sidebar"]`.
fn words_of(name: &str) -> Vec<String> {
    let file = name.split(['?', '#']).next().unwrap_or(name);
    let file = file.rsplit('/').next().unwrap_or(file);
    let stem = match file.rfind('.') {
        Some(i) if i > 0 => &file[..i],
        _ => file,
    };
    stem.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

fn sentence_case(words: &[String]) -> String {
    let joined = words.join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

// --- heading-order ---

const TITLE_WORDS: &[&str] = &["page title", "site title", "page-title", "site-title", "welcome", "hero"];
const MAIN_SECTION_WORDS: &[&str] = &[
    "main", "overview", "introduction", "about", "services", "features", "products", "contact",
    "content", "section", "news", "blog",
];
const SUB_SECTION_WORDS: &[&str] = &[
    "detail", "details", "subsection", "sub-section", "item", "card", "widget", "faq", "step",
    "note", "related", "sidebar", "footer",
];
const SUB_SECTION_CONTAINERS: &[&str] = &["aside", "sidebar", "widget", "card", "footer"];

/// Case-insensitive whole-word match against any of `words`.
fn word_regex(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).expect("valid regex")
}

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| word_regex(TITLE_WORDS));
static MAIN_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| word_regex(MAIN_SECTION_WORDS));
static SUB_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| word_regex(SUB_SECTION_WORDS));
static SUB_CONTAINER_RE: LazyLock<Regex> = LazyLock::new(|| word_regex(SUB_SECTION_CONTAINERS));

pub struct HeadingOrder;

impl HeadingOrder {
    fn current_level(ctx: &FixContext<'_>) -> Option<u8> {
        let from = |s: &str| {
            HEADING_LEVEL_RE
                .captures(s)
                .and_then(|c| c[1].parse::<u8>().ok())
        };
        StartTag::first_in(ctx.html)
            .and_then(|tag| from(&tag.name))
            .or_else(|| from(ctx.selector))
    }

    fn recommended_level(text: &str, selector: &str) -> Option<(u8, &'static str)> {
        let sub_in_selector = SUB_CONTAINER_RE.is_match(selector);
        if TITLE_RE.is_match(text) || selector.to_ascii_lowercase().contains("page-title") {
            return Some((1, "reads as the page title"));
        }
        if !sub_in_selector && MAIN_SECTION_RE.is_match(text) {
            return Some((2, "introduces a main page section"));
        }
        if sub_in_selector || SUB_SECTION_RE.is_match(text) {
            return Some((3, "introduces a sub-section"));
        }
        None
    }
}

impl RuleFixStrategy for HeadingOrder {
    fn rule_id(&self) -> &'static str {
        "heading-order"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        let current = Self::current_level(ctx)?;
        let text = text_content(ctx.html);
        let (target, reason) = Self::recommended_level(&text, ctx.selector)?;
        if target == current {
            return None;
        }
        let mut fixed = rewrite_first_tag(ctx.html, |tag| {
            if HEADING_LEVEL_RE.is_match(&tag.name) {
                tag.name = format!("h{target}");
            }
        });
        if let Some(close) = fixed.to_ascii_lowercase().rfind(&format!("</h{current}")) {
            fixed.replace_range(close..close + 4, &format!("</h{target}"));
        }
        Some(format!(
            "Change this <h{current}> to an <h{target}>: \"{text}\" {reason}, so it should sit at level {target} \
in the heading outline. Keep heading levels sequential and use CSS for visual size.\n\n```html\n{fixed}\n```"
        ))
    }
}

// --- color-contrast ---

const IMPORTANT_WORDS: &[&str] = &[
    "error", "warning", "alert", "danger", "required", "price", "important", "notice", "sale",
];

pub struct ColorContrast;

impl RuleFixStrategy for ColorContrast {
    fn rule_id(&self) -> &'static str {
        "color-contrast"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        let tag = tag_name(ctx.html);
        let lower_html = ctx.html.to_lowercase();
        let lower_selector = ctx.selector.to_lowercase();
        let target = if ctx.selector.is_empty() { tag.clone() } else { ctx.selector.to_string() };

        let (role, color, background, note) = if HEADING_LEVEL_RE.is_match(&tag)
            || contains_any(&lower_selector, &["heading", "title"])
        {
            ("heading", "#1a1a1a", "#ffffff", "about 17.4:1")
        } else if tag == "a" || lower_selector.split([' ', '>']).any(|part| part == "a" || part.starts_with("a.") || part.starts_with("a[")) {
            ("link", "#0645ad", "#ffffff", "about 8.5:1; keep the underline so links are not identified by colour alone")
        } else if contains_any(&lower_html, IMPORTANT_WORDS) || contains_any(&lower_selector, IMPORTANT_WORDS) {
            ("important text", "#b00020", "#ffffff", "about 7.3:1; pair it with an icon or text label as well")
        } else {
            ("text", "#333333", "#ffffff", "about 12.6:1")
        };

        let measured = CONTRAST_RE.captures(ctx.failure_summary).map(|c| {
            format!(
                " It currently measures {}:1 ({} on {}) against a required {}.",
                &c[1], &c[2], &c[3], &c[4]
            )
        });

        let extra = if role == "link" {
            "\n  text-decoration: underline;"
        } else {
            ""
        };
        Some(format!(
            "Raise the contrast of this {role}.{} Use {color} on {background} ({note}).\n\n```css\n{target} {{\n  color: {color};\n  background-color: {background};{extra}\n}}\n```",
            measured.unwrap_or_default()
        ))
    }
}

// --- image-alt ---

const DECORATIVE_WORDS: &[&str] = &[
    "spacer", "divider", "separator", "border", "background", "bg", "decoration", "decorative",
    "ornament", "pattern", "shadow", "texture", "gradient", "flourish",
];
const FUNCTIONAL_WORDS: &[&str] = &[
    "icon", "btn", "button", "arrow", "search", "close", "menu", "cart", "play", "submit", "next",
    "prev", "previous",
];
const FILLER_WORDS: &[&str] = &["img", "image", "icon", "btn", "pic", "photo", "final", "copy", "min"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImagePurpose {
    Decorative,
    Functional,
    Content,
}

pub struct ImageAlt;

impl ImageAlt {
    fn purpose(words: &[String], ctx: &FixContext<'_>) -> ImagePurpose {
        let selector = ctx.selector.to_lowercase();
        let has = |list: &[&str]| words.iter().any(|w| list.contains(&w.as_str()));
        if has(DECORATIVE_WORDS) || contains_any(&selector, &["decor", "divider", "spacer"]) {
            return ImagePurpose::Decorative;
        }
        let in_control = selector.split([' ', '>']).any(|p| p == "a" || p.starts_with("a.") || p.starts_with("button"))
            || ctx.html.to_lowercase().contains("onclick");
        if has(FUNCTIONAL_WORDS) || in_control {
            return ImagePurpose::Functional;
        }
        ImagePurpose::Content
    }
}

impl RuleFixStrategy for ImageAlt {
    fn rule_id(&self) -> &'static str {
        "image-alt"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        let img = if ctx.html.trim().is_empty() { "<img>" } else { ctx.html };
        let src = attr(img, "src").unwrap_or_default();
        let words = words_of(&src);
        let alt = attr(img, "alt");
        let purpose = Self::purpose(&words, ctx);

        if purpose == ImagePurpose::Decorative && alt.as_deref().map_or(true, |a| a.trim().is_empty()) {
            let fixed = set_attr(&set_attr(img, "alt", ""), "role", "presentation");
            return Some(format!(
                "This image looks decorative. Give it an empty alt and role=\"presentation\" so screen readers skip it, \
rather than describing it.\n\n```html\n{fixed}\n```"
            ));
        }

        let meaningful: Vec<String> = words
            .iter()
            .filter(|w| !FILLER_WORDS.contains(&w.as_str()))
            .cloned()
            .collect();
        let alt_text = if meaningful.is_empty() {
            "Describe the image".to_string()
        } else {
            sentence_case(&meaningful)
        };

        let guidance = match purpose {
            ImagePurpose::Functional => {
                "This image is part of a control, so its alt text should name the action it performs, not its appearance."
            }
            _ => {
                "Describe what the image shows. The candidate below is derived from the file name; confirm it matches the picture."
            }
        };
        let fixed = set_attr(img, "alt", &alt_text);
        Some(format!("Add alternative text: \"{alt_text}\". {guidance}\n\n```html\n{fixed}\n```"))
    }
}

// --- target-size ---

pub struct TargetSize;

impl RuleFixStrategy for TargetSize {
    fn rule_id(&self) -> &'static str {
        "target-size"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        let target = if ctx.selector.is_empty() { tag_name(ctx.html) } else { ctx.selector.to_string() };
        Some(format!(
            "Make this target at least 24 by 24 CSS pixels, or space it at least 24px from neighbouring targets.\n\n\
```css\n{target} {{\n  display: inline-block;\n  min-width: 24px;\n  min-height: 24px;\n  padding: 4px;\n}}\n```"
        ))
    }
}

// --- label ---

pub struct Label;

impl RuleFixStrategy for Label {
    fn rule_id(&self) -> &'static str {
        "label"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        if ctx.html.trim().is_empty() {
            return None;
        }
        let name = attr(ctx.html, "name").filter(|n| !n.is_empty());
        let id = attr(ctx.html, "id")
            .filter(|i| !i.is_empty())
            .or_else(|| name.clone())
            .unwrap_or_else(|| "field".to_string());
        let label_text = attr(ctx.html, "placeholder")
            .filter(|p| !p.trim().is_empty())
            .or_else(|| name.as_deref().map(|n| sentence_case(&words_of(n))))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Label text".to_string());
        let field = set_attr(ctx.html, "id", &id);
        Some(format!(
            "Give this field a visible label tied to it with for/id. A placeholder alone disappears on input and is not a label.\n\n\
```html\n<label for=\"{id}\">{label_text}</label>\n{field}\n```"
        ))
    }
}

// --- link-name ---

pub struct LinkName;

impl RuleFixStrategy for LinkName {
    fn rule_id(&self) -> &'static str {
        "link-name"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        if ctx.html.trim().is_empty() {
            return None;
        }
        let href = attr(ctx.html, "href").unwrap_or_default();
        let destination = {
            let words = words_of(href.trim_end_matches('/'));
            if words.is_empty() {
                "Describe the link destination".to_string()
            } else {
                sentence_case(&words)
            }
        };

        let image = start_tags(ctx.html)
            .into_iter()
            .find(|span| span_name(ctx.html, span).eq_ignore_ascii_case("img"));
        if let Some(span) = image {
            let fixed_img = set_attr(&ctx.html[span.clone()], "alt", &destination);
            let fixed = format!("{}{}{}", &ctx.html[..span.start], fixed_img, &ctx.html[span.end..]);
            return Some(format!(
                "This link only contains an image, so the image's alt text is the link name. Describe where the link goes.\n\n```html\n{fixed}\n```"
            ));
        }

        let fixed = set_attr(ctx.html, "aria-label", &destination);
        Some(format!(
            "Give this link a name that says where it goes. Visible text is best; otherwise add an aria-label.\n\n```html\n{fixed}\n```"
        ))
    }
}

// --- button-name ---

const BUTTON_ACTIONS: &[(&str, &str)] = &[
    ("close", "Close"),
    ("menu", "Open menu"),
    ("hamburger", "Open menu"),
    ("search", "Search"),
    ("submit", "Submit"),
    ("play", "Play"),
    ("pause", "Pause"),
    ("next", "Next"),
    ("prev", "Previous"),
    ("cart", "View cart"),
    ("share", "Share"),
    ("delete", "Delete"),
    ("edit", "Edit"),
];

pub struct ButtonName;

impl RuleFixStrategy for ButtonName {
    fn rule_id(&self) -> &'static str {
        "button-name"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        if ctx.html.trim().is_empty() {
            return None;
        }
        let hints = format!("{} {}", ctx.html, ctx.selector).to_lowercase();
        let action = BUTTON_ACTIONS
            .iter()
            .find(|(keyword, _)| hints.contains(keyword))
            .map(|(_, label)| *label)
            .unwrap_or("Describe the button action");
        let fixed = set_attr(ctx.html, "aria-label", action);
        Some(format!(
            "This button has no accessible name. Add visible text, or an aria-label naming what it does.\n\n```html\n{fixed}\n```"
        ))
    }
}

// --- form-field-multiple-labels ---

pub struct MultipleLabels;

impl RuleFixStrategy for MultipleLabels {
    fn rule_id(&self) -> &'static str {
        "form-field-multiple-labels"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        if ctx.html.trim().is_empty() {
            return None;
        }
        let id = attr(ctx.html, "id")
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| "field".to_string());
        let field = set_attr(&set_attr(ctx.html, "id", &id), "aria-describedby", &format!("{id}-hint"));
        Some(format!(
            "This field has more than one <label>. Keep a single label and turn the extra text into a description.\n\n\
```html\n<label for=\"{id}\">Primary label</label>\n{field}\n<span id=\"{id}-hint\">Additional instructions</span>\n```"
        ))
    }
}

// --- default ---

/// Wraps the offending HTML in a comment naming the rule to fix.
pub struct GenericTemplate;

impl RuleFixStrategy for GenericTemplate {
    fn rule_id(&self) -> &'static str {
        "*"
    }

    fn suggest(&self, ctx: &FixContext<'_>) -> Option<String> {
        if ctx.html.trim().is_empty() {
            return None;
        }
        let summary = ctx
            .failure_summary
            .trim()
            .trim_start_matches("Fix the following:")
            .trim_start_matches("Fix any of the following:")
            .trim_start_matches("Fix all of the following:")
            .trim();
        let summary = if summary.is_empty() { "see rule documentation" } else { summary };
        let comment = summary.replace("--", "-");
        Some(format!(
            "Resolve the {} issue on this element: {summary}\n\n```html\n<!-- Fix {}: {comment} -->\n{}\n```",
            ctx.rule_id, ctx.rule_id, ctx.html
        ))
    }
}
