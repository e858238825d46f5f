/// Bounded page data for the AI semantic checks.
///
/// The in-page script collects landmarks, forms, headings, links and images.
/// Everything is capped again on this side so prompt size stays bounded no
/// matter what the page returns.
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

pub const MAX_LANDMARKS: usize = 8;
pub const MAX_FORMS: usize = 2;
pub const MAX_FIELDS_PER_FORM: usize = 2;
pub const MAX_HEADINGS: usize = 12;
pub const MAX_LINKS: usize = 15;
pub const MAX_IMAGES: usize = 15;
const MAX_HTML_CHARS: usize = 300;

pub const PAGE_DATA_SCRIPT: &str = r#"
const cap = (s, n) => (s || '').slice(0, n);
const sel = (el) => {
  if (el.id) return '#' + CSS.escape(el.id);
  const parts = [];
  let node = el;
  while (node && node.nodeType === 1 && parts.length < 4) {
    let part = node.tagName.toLowerCase();
    const parent = node.parentElement;
    if (parent) {
      const same = Array.from(parent.children).filter(c => c.tagName === node.tagName);
      if (same.length > 1) part += ':nth-of-type(' + (same.indexOf(node) + 1) + ')';
    }
    parts.unshift(part);
    node = parent;
  }
  return parts.join(' > ');
};
const LANDMARKS = 'header, nav, main, aside, footer, section[aria-label], section[aria-labelledby], form[aria-label], [role=banner], [role=navigation], [role=main], [role=complementary], [role=contentinfo], [role=search], [role=region], [role=form]';
const landmarkOf = (el) => {
  const lm = el.parentElement ? el.parentElement.closest(LANDMARKS) : null;
  return lm ? (lm.getAttribute('role') || lm.tagName.toLowerCase()) : null;
};
const labelOf = (el) => {
  if (el.getAttribute('aria-label')) return el.getAttribute('aria-label');
  const by = el.getAttribute('aria-labelledby');
  if (by) { const t = document.getElementById(by); if (t) return t.textContent.trim(); }
  if (el.id) { const l = document.querySelector('label[for="' + CSS.escape(el.id) + '"]'); if (l) return l.textContent.trim(); }
  const wrap = el.closest('label');
  return wrap ? wrap.textContent.trim() : null;
};
const landmarks = Array.from(document.querySelectorAll(LANDMARKS)).slice(0, args.maxLandmarks).map(el => ({
  tag: el.tagName.toLowerCase(),
  role: el.getAttribute('role'),
  label: el.getAttribute('aria-label'),
  selector: sel(el),
  parentLandmark: landmarkOf(el),
  textPreview: cap(el.textContent.trim(), 120),
}));
const FIELDS = 'input:not([type=hidden]), select, textarea, [role=textbox], [role=combobox], [role=checkbox], [role=radio], [contenteditable=true]';
const formRoots = Array.from(document.querySelectorAll('form, [role=form], [role=search]'));
document.querySelectorAll(FIELDS).forEach(f => {
  if (!f.closest('form, [role=form], [role=search]')) {
    const root = f.parentElement || f;
    if (!formRoots.includes(root)) formRoots.push(root);
  }
});
const forms = formRoots.slice(0, args.maxForms).map(root => ({
  selector: sel(root),
  hasFormElement: root.tagName === 'FORM',
  inSearchLandmark: !!root.closest('[role=search], search'),
  html: cap(root.outerHTML, 300),
  fields: Array.from(root.querySelectorAll(FIELDS)).slice(0, args.maxFields).map(f => ({
    tag: f.tagName.toLowerCase(),
    inputType: f.getAttribute('type'),
    role: f.getAttribute('role'),
    id: f.id || null,
    name: f.getAttribute('name'),
    label: labelOf(f),
    selector: sel(f),
    html: cap(f.outerHTML, 300),
  })),
}));
const headings = Array.from(document.querySelectorAll('h1, h2, h3, h4, h5, h6, [role=heading]')).slice(0, args.maxHeadings).map(h => ({
  level: Math.min(Math.max(parseInt(h.getAttribute('aria-level') || h.tagName.slice(1), 10), 1), 6) || 2,
  text: cap(h.textContent.trim(), 120),
  selector: sel(h),
  landmark: landmarkOf(h),
  html: cap(h.outerHTML, 300),
}));
const links = Array.from(document.querySelectorAll('a[href]')).slice(0, args.maxLinks).map(a => ({
  href: a.href,
  text: cap(a.textContent.trim(), 120),
  ariaLabel: a.getAttribute('aria-label'),
  className: typeof a.className === 'string' ? a.className : '',
  target: a.getAttribute('target'),
  rel: a.getAttribute('rel'),
  selector: sel(a),
  landmark: landmarkOf(a),
  html: cap(a.outerHTML, 300),
}));
const images = Array.from(document.querySelectorAll('img')).slice(0, args.maxImages).map(img => {
  const link = img.closest('a[href]');
  return {
    src: img.getAttribute('src') || '',
    alt: img.getAttribute('alt'),
    className: typeof img.className === 'string' ? img.className : '',
    id: img.id || null,
    selector: sel(img),
    parentLinkHref: link ? link.href : null,
    landmark: landmarkOf(img),
    width: img.width || null,
    height: img.height || null,
    html: cap(img.outerHTML, 300),
  };
});
return { landmarks, forms, headings, links, images };
"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageData {
    pub landmarks: Vec<LandmarkInfo>,
    pub forms: Vec<FormInfo>,
    pub headings: Vec<HeadingInfo>,
    pub links: Vec<LinkInfo>,
    pub images: Vec<ImageInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LandmarkInfo {
    pub tag: String,
    pub role: Option<String>,
    pub label: Option<String>,
    pub selector: String,
    pub parent_landmark: Option<String>,
    pub text_preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormInfo {
    pub selector: String,
    pub has_form_element: bool,
    pub in_search_landmark: bool,
    pub html: String,
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldInfo {
    pub tag: String,
    pub input_type: Option<String>,
    pub role: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub selector: String,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeadingInfo {
    #[serde(default = "default_heading_level", deserialize_with = "heading_level")]
    pub level: u8,
    pub text: String,
    pub selector: String,
    pub landmark: Option<String>,
    pub html: String,
}

const DEFAULT_HEADING_LEVEL: u8 = 2;

fn default_heading_level() -> u8 {
    DEFAULT_HEADING_LEVEL
}

/// Numbers (or numeric strings) are clamped to 1..=6; anything else reads as level 2.
fn heading_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let level = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|n| n.is_finite())
        .map_or(DEFAULT_HEADING_LEVEL, |n| n.trunc().clamp(1.0, 6.0) as u8);
    Ok(level)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkInfo {
    pub href: String,
    pub text: String,
    pub aria_label: Option<String>,
    pub class_name: String,
    pub target: Option<String>,
    pub rel: Option<String>,
    pub selector: String,
    pub landmark: Option<String>,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageInfo {
    pub src: String,
    pub alt: Option<String>,
    pub class_name: String,
    pub id: Option<String>,
    pub selector: String,
    pub parent_link_href: Option<String>,
    pub landmark: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub html: String,
}

/// Arguments handed to `PAGE_DATA_SCRIPT`.
pub fn script_args() -> serde_json::Value {
    serde_json::json!({
        "maxLandmarks": MAX_LANDMARKS,
        "maxForms": MAX_FORMS,
        "maxFields": MAX_FIELDS_PER_FORM,
        "maxHeadings": MAX_HEADINGS,
        "maxLinks": MAX_LINKS,
        "maxImages": MAX_IMAGES,
    })
}

impl PageData {
    /// Apply the prompt-size caps, whatever the page script returned.
    pub fn bounded(mut self) -> Self {
        self.landmarks.truncate(MAX_LANDMARKS);
        self.forms.truncate(MAX_FORMS);
        for form in &mut self.forms {
            form.fields.truncate(MAX_FIELDS_PER_FORM);
            form.html = clip(&form.html);
            for field in &mut form.fields {
                field.html = clip(&field.html);
            }
        }
        self.headings.truncate(MAX_HEADINGS);
        self.links.truncate(MAX_LINKS);
        self.images.truncate(MAX_IMAGES);
        for h in &mut self.headings {
            h.html = clip(&h.html);
        }
        for l in &mut self.links {
            l.html = clip(&l.html);
        }
        for i in &mut self.images {
            i.html = clip(&i.html);
        }
        self
    }

    pub fn has_structure(&self) -> bool {
        !self.landmarks.is_empty() || !self.headings.is_empty() || !self.forms.is_empty()
    }
}

fn clip(html: &str) -> String {
    html.chars().take(MAX_HTML_CHARS).collect()
}

static AD_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[^a-z])(ads?|advert\w*|advertisement|sponsor\w*|banner|promo\w*|adslot|dfp)([^a-z]|$)")
        .expect("valid regex")
});

const AD_HOSTS: &[&str] = &[
    "doubleclick.net",
    "googlesyndication.com",
    "adservice.google.com",
    "amazon-adsystem.com",
    "taboola.com",
    "outbrain.com",
    "criteo.com",
];

/// Images and links that look like advertisements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCandidates {
    pub images: Vec<ImageInfo>,
    pub links: Vec<LinkInfo>,
}

impl AdCandidates {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.links.is_empty()
    }
}

/// Pick likely advertisements by naming and placement conventions.
///
/// An element qualifies when its class, id or source carries an ad keyword,
/// when it points at a known ad host, or when it is an external link placed in
/// a complementary region.
pub fn advertisement_candidates(data: &PageData, page_url: &str) -> AdCandidates {
    let page_host = host_of(page_url);

    let images = data
        .images
        .iter()
        .filter(|img| {
            let named = looks_like_ad(&img.class_name)
                || img.id.as_deref().is_some_and(looks_like_ad)
                || looks_like_ad(file_name(&img.src));
            let linked_out = img
                .parent_link_href
                .as_deref()
                .is_some_and(|href| is_external(href, page_host.as_deref()));
            named || is_ad_host(&img.src) || (linked_out && in_sidebar(img.landmark.as_deref()))
        })
        .cloned()
        .collect();

    let links = data
        .links
        .iter()
        .filter(|link| {
            let external = is_external(&link.href, page_host.as_deref());
            looks_like_ad(&link.class_name)
                || is_ad_host(&link.href)
                || (external && in_sidebar(link.landmark.as_deref()))
                || (external && link.rel.as_deref().is_some_and(|r| r.contains("sponsored")))
        })
        .cloned()
        .collect();

    AdCandidates { images, links }
}

fn looks_like_ad(value: &str) -> bool {
    AD_KEYWORD_RE.is_match(value)
}

fn is_ad_host(url: &str) -> bool {
    host_of(url).is_some_and(|h| AD_HOSTS.iter().any(|ad| h == *ad || h.ends_with(&format!(".{ad}"))))
}

fn in_sidebar(landmark: Option<&str>) -> bool {
    matches!(landmark, Some("aside") | Some("complementary"))
}

fn file_name(src: &str) -> &str {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.rsplit('/').next().unwrap_or(path)
}

/// Host of an absolute http(s) URL, lower-cased and without port.
///
/// Protocol-relative `//host/path` counts as https. IPv6 hosts keep their brackets.
pub fn host_of(href: &str) -> Option<String> {
    let href = href.trim();
    let parsed = match href.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")),
        None => Url::parse(href),
    }
    .ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().filter(|h| !h.is_empty()).map(str::to_ascii_lowercase)
}

fn is_external(href: &str, page_host: Option<&str>) -> bool {
    match (host_of(href), page_host) {
        (Some(target), Some(page)) => {
            let bare = |h: &str| h.trim_start_matches("www.").to_string();
            bare(&target) != bare(page)
        }
        (Some(_), None) => true,
        (None, _) => false,
    }
}
