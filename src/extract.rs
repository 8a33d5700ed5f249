use url::Url;

use crate::markup::{Element, Markup, Tag};

/// Converts statement markup to Markdown, resolving links against `base`.
#[derive(Debug, Clone)]
pub struct MarkdownExtractor {
    base: Url,
}

impl MarkdownExtractor {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Converts the children of `root`. A missing root yields an empty string.
    pub fn convert(&self, root: Option<&Element>) -> String {
        let mut out = String::new();
        if let Some(root) = root {
            self.push_children(root, &mut out);
        }
        out
    }

    fn inner(&self, el: &Element) -> String {
        let mut out = String::new();
        self.push_children(el, &mut out);
        out
    }

    fn push_children(&self, el: &Element, out: &mut String) {
        for child in &el.children {
            match child {
                Markup::Text(text) => out.push_str(text),
                Markup::Comment(_) => {}
                Markup::Element(child) => self.push_element(child, out),
            }
        }
    }

    fn push_element(&self, el: &Element, out: &mut String) {
        match el.tag() {
            // keep image paragraphs verbatim so sizing attributes survive
            Tag::Paragraph if el.contains("img") => out.push_str(&el.outer_html()),
            Tag::Paragraph => {
                out.push_str(self.inner(el).trim());
                out.push_str("\n\n");
            }
            Tag::Span if el.has_class("tex") => {
                let text = el.text_content();
                out.push('$');
                out.push_str(strip_math_delimiters(text.trim()));
                out.push('$');
            }
            Tag::List => {
                for item in el.child_elements() {
                    out.push_str("- ");
                    out.push_str(self.inner(item).trim());
                    out.push('\n');
                }
                out.push('\n');
            }
            Tag::Image => {
                let src = el.attr("src").unwrap_or_default();
                let src = if src.starts_with('/') {
                    self.resolve(src)
                } else {
                    src.to_string()
                };
                let alt = el.attr("alt").filter(|a| !a.is_empty()).unwrap_or("image");
                out.push_str(&format!("![{alt}]({src})\n\n"));
            }
            Tag::Anchor => {
                let href = el.attr("href").map(|h| self.resolve(h)).unwrap_or_default();
                out.push_str(&format!("[{}]({href})", el.text_content()));
            }
            Tag::LineBreak => out.push('\n'),
            Tag::Span | Tag::Other(_) => self.push_children(el, out),
        }
    }

    fn resolve(&self, link: &str) -> String {
        self.base
            .join(link)
            .map(String::from)
            .unwrap_or_else(|_| link.to_string())
    }
}

fn strip_math_delimiters(formula: &str) -> &str {
    [("\\(", "\\)"), ("\\[", "\\]")]
        .iter()
        .fold(formula, |formula, (open, close)| {
            formula
                .strip_prefix(open)
                .and_then(|f| f.strip_suffix(close))
                .unwrap_or(formula)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;

    fn convert(html: &str) -> String {
        let extractor = MarkdownExtractor::new(Url::parse("https://www.acmicpc.net/problem/1000").unwrap());
        extractor.convert(Some(&parse_fragment(html)))
    }

    #[test]
    fn missing_root_should_be_empty() {
        let extractor = MarkdownExtractor::new(Url::parse("https://www.acmicpc.net/").unwrap());
        assert_eq!(extractor.convert(None), "");
        assert_eq!(convert(""), "");
    }

    #[test]
    fn image_paragraph_should_be_kept_verbatim() {
        let html = r#"<p><img src="/upload/images/a.png" style="width: 300px;"></p>"#;
        assert_eq!(convert(html), html);
    }

    #[test]
    fn tex_span_should_become_inline_math() {
        assert_eq!(convert(r#"<span class="tex">\(x\)</span>"#), "$x$");
        assert_eq!(convert(r#"<span class="tex"> \[a+b\] </span>"#), "$a+b$");
        assert_eq!(convert(r#"<span class="tex">N</span>"#), "$N$");
    }

    #[test]
    fn nested_delimiters_should_both_be_stripped() {
        assert_eq!(convert(r#"<span class="tex">\(\[x\]\)</span>"#), "$x$");
    }

    #[test]
    fn image_paragraph_should_keep_comments() {
        let html = r#"<p style="text-align: center;"><!-- fig --><img alt="" src="/a.png"></p>"#;
        assert_eq!(convert(html), html);
        assert_eq!(convert("<p>a<!-- hidden --> b</p>"), "a b\n\n");
    }

    #[test]
    fn plain_span_should_pass_through() {
        assert_eq!(convert("<span>just <b>text</b></span>"), "just text");
    }

    #[test]
    fn ordered_list_should_become_bullets() {
        assert_eq!(convert("<ol><li>A</li><li>B</li></ol>"), "- A\n- B\n\n");
        assert_eq!(
            convert("<ul>\n  <li> first </li>\n  <li><span class=\"tex\">\\(N\\)</span> items</li>\n</ul>"),
            "- first\n- $N$ items\n\n"
        );
    }

    #[test]
    fn paragraph_should_be_trimmed_and_spaced() {
        assert_eq!(
            convert("<p>  Two integers <span class=\"tex\">\\(A\\)</span> and <span class=\"tex\">\\(B\\)</span>.  </p><p>Second</p>"),
            "Two integers $A$ and $B$.\n\nSecond\n\n"
        );
    }

    #[test]
    fn image_should_resolve_root_relative_source() {
        assert_eq!(
            convert(r#"<div><img src="/upload/b.png"></div>"#),
            "![image](https://www.acmicpc.net/upload/b.png)\n\n"
        );
        assert_eq!(
            convert(r#"<img src="https://cdn.example.com/c.png" alt="graph">"#),
            "![graph](https://cdn.example.com/c.png)\n\n"
        );
    }

    #[test]
    fn anchor_should_become_link() {
        assert_eq!(
            convert(r#"<a href="/problem/1001">A-B</a>"#),
            "[A-B](https://www.acmicpc.net/problem/1001)"
        );
    }

    #[test]
    fn line_break_should_be_newline() {
        assert_eq!(convert("a<br>b"), "a\nb");
    }

    #[test]
    fn conversion_should_be_idempotent() {
        let root = parse_fragment("<p>x <a href=\"/a\">y</a></p><ul><li>z</li></ul>");
        let extractor = MarkdownExtractor::new(Url::parse("https://www.acmicpc.net/").unwrap());
        assert_eq!(extractor.convert(Some(&root)), extractor.convert(Some(&root)));
    }
}
