/// Normalisation shared by AI replies and heuristic output.
use std::sync::LazyLock;

use regex::Regex;

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:html|css|js|javascript)?[ \t]*\r?\n(.*?)```").expect("valid regex")
});
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("valid regex"));
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitText {
    pub description: String,
    pub code_example: Option<String>,
}

/// Split the first fenced code block out of `text` and clean up the prose.
pub fn split_code_example(text: &str) -> SplitText {
    let (prose, code_example) = match CODE_BLOCK_RE.captures(text) {
        Some(caps) => {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let code = caps[1].trim_end().to_string();
            let mut prose = String::with_capacity(text.len());
            prose.push_str(&text[..whole.start]);
            prose.push_str(&text[whole.end..]);
            (prose, (!code.trim().is_empty()).then_some(code))
        }
        None => (text.to_string(), None),
    };

    let description = HEADER_RE.replace_all(&prose, "");
    let description = BLANK_RUN_RE.replace_all(description.trim(), "\n\n").to_string();
    SplitText {
        description,
        code_example,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_block_becomes_code_example() {
        let text = "## Suggested fix\n\nAdd a descriptive alt attribute.\n\n```html\n<img src=\"a.png\" alt=\"Team photo\">\n```\n";
        let split = split_code_example(text);
        assert_eq!(split.description, "Suggested fix\n\nAdd a descriptive alt attribute.");
        assert_eq!(split.code_example.as_deref(), Some("<img src=\"a.png\" alt=\"Team photo\">"));
    }

    #[test]
    fn only_the_first_block_is_extracted() {
        let text = "Fix it.\n```css\na { color: #0645ad; }\n```\nThen:\n```js\nfoo();\n```";
        let split = split_code_example(text);
        assert_eq!(split.code_example.as_deref(), Some("a { color: #0645ad; }"));
        assert!(split.description.contains("```js"));
    }

    #[test]
    fn plain_text_passes_through() {
        let split = split_code_example("  Use a <label> element.  ");
        assert_eq!(split.description, "Use a <label> element.");
        assert_eq!(split.code_example, None);
    }
}
