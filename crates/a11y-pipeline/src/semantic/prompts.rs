/// System prompts for the AI semantic checks.
///
/// Every prompt ends with the same response contract so a single parser can
/// validate all four checks.

const RESPONSE_CONTRACT: &str = r#"Respond ONLY with a JSON array. Each element must be an object:
{
  "issue": "short name of the problem",
  "severity": "critical" | "serious" | "moderate" | "minor",
  "selector": "CSS selector of the offending element, copied from the input",
  "html": "the offending element's HTML, copied from the input",
  "description": "what is wrong and who it affects",
  "recommendation": "the concrete change to make",
  "wcagLevel": "A" | "AA" | "AAA",
  "wcagCriterion": "e.g. 1.3.1"
}
Return [] when nothing is wrong. Do not report problems an automated DOM rule checker would already find (missing attributes, contrast ratios); report only problems that need judgement about meaning or context."#;

pub const LANDMARK_PROMPT: &str = "You are an accessibility auditor reviewing the landmark structure of a web page. \
You receive the page's landmark regions and headings. Flag: landmarks used with the wrong semantics \
(e.g. <nav> wrapping non-navigation content, <aside> holding primary content), expected landmarks that are missing \
(a page without <main>, site chrome without banner or contentinfo), multiple landmarks of the same type without \
distinguishing labels, and landmarks nested where they should not be (e.g. <main> inside <aside>). \
Headings whose text names a primary page region but whose level does not match it (e.g. an <h4> reading \
\"Main Content Area\" with no higher heading) should be flagged with the heading level to use.";

pub const FORM_PROMPT: &str = "You are an accessibility auditor reviewing form structure. \
You receive form containers with up to two fields each. Flag: non-semantic elements (div, span) standing in for \
real form controls, groups of inputs that are not wrapped in a <form> element, and label associations that are \
broken (a <label for> pointing at a missing id, a label that does not describe its field, placeholder used as \
the only label).";

pub const ADVERTISEMENT_PROMPT: &str = "You are an accessibility auditor reviewing advertisements on a web page. \
You receive images and links that were identified as likely advertisements by their class names, file names \
and placement. Flag: ad images with missing or meaningless alt text, ad links whose text does not say where \
they go (\"click here\", an image with no alternative), and ads that do not indicate they are sponsored or that \
they open an external site or a new window.";

pub const CONTEXT_PROMPT: &str = "You are an accessibility auditor cross-checking page structure for context. \
You receive the page's landmarks, headings and forms together with the landmark each heading sits in. \
Flag elements whose role does not fit their context: an <h1> inside a sidebar widget, a page title heading \
ranked below section headings, heading text that names a primary region (\"Main Content\") at a minor level, \
a search form that is not inside a search landmark, and forms placed in landmarks that contradict their purpose.";

pub fn system_prompt(base: &str) -> String {
    format!("{base}\n\n{RESPONSE_CONTRACT}")
}

/// User prompt: the page URL followed by labelled JSON sections.
pub fn user_prompt(url: &str, sections: &[(&str, String)]) -> String {
    let mut prompt = format!("Page URL: {url}\n");
    for (label, json) in sections {
        prompt.push_str(&format!("\n{label}:\n{json}\n"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_system_prompt_carries_the_contract() {
        for base in [LANDMARK_PROMPT, FORM_PROMPT, ADVERTISEMENT_PROMPT, CONTEXT_PROMPT] {
            let p = system_prompt(base);
            assert!(p.contains("JSON array"));
            assert!(p.contains("wcagLevel"));
        }
    }

    #[test]
    fn user_prompt_lists_sections_in_order() {
        let p = user_prompt(
            "https://example.test/",
            &[("Landmarks", "[]".to_string()), ("Headings", "[{}]".to_string())],
        );
        let l = p.find("Landmarks:").unwrap();
        let h = p.find("Headings:").unwrap();
        assert!(p.starts_with("Page URL: https://example.test/"));
        assert!(l < h);
    }
}
