//! Reader for the report markup.
//!
//! Handles the well-formed subset the report templates produce: nested elements
//! with attributes, text with entities, void tags, comments and doctype.
//! `<style>` and `<script>` bodies are dropped. Inline `<svg>` elements are kept
//! verbatim so they can be embedded as vector graphics.

use std::collections::HashMap;

const VOID_TAGS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "link", "meta"];
const SKIPPED_TAGS: [&str; 2] = ["script", "style"];

#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
    /// An inline `<svg>` element, markup untouched.
    Svg(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    /// Lowercase tag name.
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    fn new(tag: String) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Text content of all descendants with whitespace collapsed.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        collect_text(&self.children, &mut raw);
        collapse_whitespace(&raw)
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(|node| match node {
            DomNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First `<svg>` anywhere below this element.
    pub fn find_svg(&self) -> Option<&str> {
        self.children.iter().find_map(|node| match node {
            DomNode::Svg(svg) => Some(svg.as_str()),
            DomNode::Element(e) => e.find_svg(),
            DomNode::Text(_) => None,
        })
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(text) => out.push_str(text),
            DomNode::Element(e) => {
                out.push(' ');
                collect_text(&e.children, out);
            }
            DomNode::Svg(_) => {}
        }
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Depth-first search for the first element named `tag`.
pub fn find_element<'a>(nodes: &'a [DomNode], tag: &str) -> Option<&'a ElementNode> {
    nodes.iter().find_map(|node| match node {
        DomNode::Element(e) if e.tag == tag => Some(e),
        DomNode::Element(e) => find_element(&e.children, tag),
        _ => None,
    })
}

pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser { input: html, pos: 0 };
    parser.parse_nodes(true)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_nodes(&mut self, top_level: bool) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        while !self.eof() {
            if self.starts_with("</") {
                if !top_level {
                    break;
                }
                // Stray closing tag.
                self.skip_past(">");
            } else if self.starts_with("<!--") {
                self.skip_past("-->");
            } else if self.starts_with("<!") || self.starts_with("<?") {
                self.skip_past(">");
            } else if self.at_tag_start() {
                nodes.push(self.parse_element());
            } else {
                let text = self.parse_text();
                if !text.trim().is_empty() {
                    nodes.push(DomNode::Text(text));
                }
            }
        }
        nodes
    }

    fn parse_element(&mut self) -> DomNode {
        let start = self.pos;
        self.pos += 1; // '<'
        let mut element = ElementNode::new(self.parse_name().to_ascii_lowercase());

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let key = self.parse_name().to_ascii_lowercase();
            if key.is_empty() {
                self.advance();
                continue;
            }
            self.skip_whitespace();
            let value = if self.starts_with("=") {
                self.advance();
                self.skip_whitespace();
                self.parse_attr_value()
            } else {
                String::new()
            };
            element.attributes.insert(key, value);
        }

        let self_closing = self.starts_with("/>");
        if self_closing {
            self.pos += 2;
        } else if !self.eof() {
            self.pos += 1;
        }

        if element.tag == "svg" {
            if !self_closing {
                self.skip_svg_body();
            }
            return DomNode::Svg(self.input[start..self.pos].to_string());
        }

        if self_closing || VOID_TAGS.contains(&element.tag.as_str()) {
            return DomNode::Element(element);
        }

        if SKIPPED_TAGS.contains(&element.tag.as_str()) {
            self.skip_past(&format!("</{}", element.tag));
            self.skip_past(">");
            return DomNode::Element(element);
        }

        element.children = self.parse_nodes(false);

        if self.starts_with("</") {
            self.skip_past(">");
        }

        DomNode::Element(element)
    }

    /// Moves past the `</svg>` matching an already consumed `<svg ...>`.
    fn skip_svg_body(&mut self) {
        let mut depth = 1usize;
        while depth > 0 {
            let rest = &self.input[self.pos..];
            let open = rest.find("<svg");
            let Some(close) = rest.find("</svg") else {
                self.pos = self.input.len();
                return;
            };
            match open {
                Some(open) if open < close => {
                    depth += 1;
                    self.pos += open + 4;
                }
                _ => {
                    depth -= 1;
                    self.pos += close;
                    self.skip_past(">");
                }
            }
        }
    }

    fn parse_text(&mut self) -> String {
        let start = self.pos;
        // Always consume at least one char so a lone '<' cannot stall the parser.
        self.advance();
        while !self.eof() && !self.starts_with("<") {
            self.advance();
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn parse_name(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ':') {
                self.advance();
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn parse_attr_value(&mut self) -> String {
        match self.current_char() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let start = self.pos;
                while let Some(c) = self.current_char() {
                    if c == quote {
                        break;
                    }
                    self.advance();
                }
                let value = decode_entities(&self.input[start..self.pos]);
                self.advance();
                value
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.current_char() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    self.advance();
                }
                decode_entities(&self.input[start..self.pos])
            }
        }
    }

    fn at_tag_start(&self) -> bool {
        let mut chars = self.input[self.pos..].chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    fn skip_past(&mut self, marker: &str) {
        match self.input[self.pos..].find(marker) {
            Some(offset) => self.pos += offset + marker.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char() {
            self.pos += c.len_utf8();
        }
    }
}

fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        "middot" => Some('\u{00B7}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let nodes = parse_html(r#"<section class="device main"><h2>D1 <small>#1</small></h2></section>"#);

        let section = find_element(&nodes, "section").unwrap();
        assert!(section.has_class("device"));
        assert!(!section.has_class("dev"));
        assert_eq!(find_element(&nodes, "h2").unwrap().text(), "D1 #1");
    }

    #[test]
    fn test_document_head_is_skipped_but_title_kept() {
        let html = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Rack R1</title>\
                    <style>td { color: red; } </style></head><body><!-- x --><p>hi</p></body></html>";
        let nodes = parse_html(html);

        assert_eq!(find_element(&nodes, "title").unwrap().text(), "Rack R1");
        assert!(find_element(&nodes, "style").unwrap().children.is_empty());
        let body = find_element(&nodes, "body").unwrap();
        assert_eq!(body.children.len(), 1);
    }

    #[test]
    fn test_svg_is_kept_verbatim() {
        let svg = r#"<svg width="10" height="20"><svg x="1"><rect/></svg><text>U1</text></svg>"#;
        let nodes = parse_html(&format!("<figure><figcaption>Front</figcaption>{}</figure><p>after</p>", svg));

        let figure = find_element(&nodes, "figure").unwrap();
        assert_eq!(figure.find_svg(), Some(svg));
        assert_eq!(figure.text(), "Front");
        assert_eq!(find_element(&nodes, "p").unwrap().text(), "after");
    }

    #[test]
    fn test_entities_are_decoded() {
        let nodes = parse_html("<td>D1 &lt;core&gt; &amp; R&#x2F;1 &#39;a&#x27; &middot; &bogus; AT&T</td>");

        assert_eq!(
            find_element(&nodes, "td").unwrap().text(),
            "D1 <core> & R/1 'a' \u{00B7} &bogus; AT&T"
        );
    }

    #[test]
    fn test_table_cells_and_colspan() {
        let nodes = parse_html(
            r#"<table><tbody><tr><td>eth1</td><td class="unpatched" colspan="3">unpatched</td></tr></tbody></table>"#,
        );

        let tr = find_element(&nodes, "tr").unwrap();
        let cells: Vec<&ElementNode> = tr.elements().collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].attr("colspan"), Some("3"));
        assert!(cells[1].has_class("unpatched"));
    }

    #[test]
    fn test_malformed_input_terminates() {
        let nodes = parse_html("a < b </p> <div x=1 y><span>unclosed");
        assert!(find_element(&nodes, "span").is_some());
    }
}
