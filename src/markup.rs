use scraper::{ElementRef, Node};
use strum::EnumString;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Text(String),
    Comment(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Markup>,
}

/// Tags the Markdown extractor treats specially. Everything else is a
/// pass-through container.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
pub enum Tag {
    #[strum(serialize = "p")]
    Paragraph,
    #[strum(serialize = "span")]
    Span,
    #[strum(serialize = "ul", serialize = "ol")]
    List,
    #[strum(serialize = "img")]
    Image,
    #[strum(serialize = "a")]
    Anchor,
    #[strum(serialize = "br")]
    LineBreak,
    #[strum(default)]
    Other(String),
}

impl Element {
    pub fn tag(&self) -> Tag {
        // the default variant makes parsing infallible
        self.name
            .parse()
            .unwrap_or_else(|_| Tag::Other(self.name.clone()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Markup::Element(el) => Some(el),
            Markup::Text(_) | Markup::Comment(_) => None,
        })
    }

    /// Whether any descendant element is named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.child_elements()
            .any(|el| el.name == name || el.contains(name))
    }

    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, buf: &mut String) {
        for child in &self.children {
            match child {
                Markup::Text(t) => buf.push_str(t),
                Markup::Comment(_) => {}
                Markup::Element(el) => el.collect_text(buf),
            }
        }
    }

    pub fn outer_html(&self) -> String {
        let mut html = String::new();
        self.write_html(&mut html);
        html
    }

    fn write_html(&self, buf: &mut String) {
        buf.push('<');
        buf.push_str(&self.name);
        for (key, value) in &self.attrs {
            buf.push(' ');
            buf.push_str(key);
            buf.push_str("=\"");
            escape_into(buf, value, true);
            buf.push('"');
        }
        buf.push('>');

        if VOID_ELEMENTS.contains(&self.name.as_str()) {
            return;
        }

        let raw = RAW_TEXT_ELEMENTS.contains(&self.name.as_str());
        for child in &self.children {
            match child {
                Markup::Text(t) if raw => buf.push_str(t),
                Markup::Text(t) => escape_into(buf, t, false),
                Markup::Comment(c) => {
                    buf.push_str("<!--");
                    buf.push_str(c);
                    buf.push_str("-->");
                }
                Markup::Element(el) => el.write_html(buf),
            }
        }

        buf.push_str("</");
        buf.push_str(&self.name);
        buf.push('>');
    }
}

impl From<ElementRef<'_>> for Element {
    fn from(el: ElementRef<'_>) -> Self {
        let children = el
            .children()
            .filter_map(|child| match child.value() {
                Node::Text(text) => Some(Markup::Text(String::from(&*text.text))),
                Node::Comment(comment) => Some(Markup::Comment(String::from(&*comment.comment))),
                Node::Element(_) => ElementRef::wrap(child).map(|e| Markup::Element(e.into())),
                _ => None,
            })
            .collect();

        Self {
            name: el.value().name().to_string(),
            attrs: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }
}

fn escape_into(buf: &mut String, text: &str, attr: bool) {
    for c in text.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '\u{a0}' => buf.push_str("&nbsp;"),
            '"' if attr => buf.push_str("&quot;"),
            '<' if !attr => buf.push_str("&lt;"),
            '>' if !attr => buf.push_str("&gt;"),
            c => buf.push(c),
        }
    }
}

#[cfg(test)]
pub(crate) fn parse_fragment(html: &str) -> Element {
    scraper::Html::parse_fragment(html).root_element().into()
}
