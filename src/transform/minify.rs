// src/transform/minify.rs

//! Built-in text minifiers for CSS and SVG.
//!
//! Both are string-literal-aware scanners. They are idempotent: minifying
//! already-minified output is a no-op, which is what allows the same chain
//! to run in initial builds and watch-triggered rebuilds.

use regex::Regex;

use crate::errors::{TransformCause, TransformError};
use crate::pipeline::FileRecord;
use crate::transform::TransformStep;

/// Strips `/* */` comments and collapses whitespace in CSS text.
#[derive(Debug, Default, Clone, Copy)]
pub struct CssMinifyStep;

impl TransformStep for CssMinifyStep {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn apply(&self, files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError> {
        files
            .into_iter()
            .map(|file| match file.text() {
                Some(text) => {
                    let min = minify_css(text);
                    Ok(file.with_contents(min.into_bytes()))
                }
                None => Err(TransformError::new(
                    self.name(),
                    file.rel_path(),
                    TransformCause::Invalid("not valid UTF-8".into()),
                )),
            })
            .collect()
    }
}

/// Two phases so a comment between a token and a boundary cannot leave a
/// stray space behind: comments become whitespace first, then all
/// whitespace collapses under one set of rules.
fn minify_css(text: &str) -> String {
    collapse_css_whitespace(&strip_block_comments(text))
}

/// Replace each `/* */` comment outside strings with a single space.
fn strip_block_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string: Option<char> = None;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if let Some(quote) = in_string {
            out.push(ch);
            if ch == quote {
                in_string = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                in_string = Some(ch);
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            c => out.push(c),
        }
    }
    out
}

/// Collapse whitespace runs outside strings: a single space where it still
/// separates tokens, nothing where a structural character already does.
fn collapse_css_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string: Option<char> = None;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if let Some(quote) = in_string {
            out.push(ch);
            if ch == quote {
                in_string = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                in_string = Some(ch);
                out.push(ch);
            }
            c if c.is_whitespace() => {
                while matches!(chars.peek(), Some(p) if p.is_whitespace()) {
                    chars.next();
                }
                let prev = out.chars().last();
                let next = chars.peek().copied();
                if !is_css_boundary(prev) && !is_css_boundary(next) {
                    out.push(' ');
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Characters around which inter-token whitespace is redundant.
fn is_css_boundary(c: Option<char>) -> bool {
    matches!(
        c,
        None | Some('{' | '}' | ';' | ':' | ',' | '>' | '(' | ')' | ' ')
    )
}

/// Strips XML comments and the doctype, collapses inter-tag whitespace and
/// rounds numeric values to a fixed precision.
#[derive(Debug, Clone)]
pub struct SvgMinifyStep {
    precision: usize,
    number_re: Regex,
}

impl SvgMinifyStep {
    pub fn new(precision: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            precision,
            number_re: Regex::new(r"-?\d+\.\d+")?,
        })
    }
}

impl TransformStep for SvgMinifyStep {
    fn name(&self) -> &'static str {
        "minify-svg"
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn apply(&self, files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError> {
        files
            .into_iter()
            .map(|file| match file.text() {
                Some(text) => {
                    let stripped = strip_xml_comments(text);
                    let stripped = strip_doctype(&stripped);
                    let collapsed = collapse_between_tags(&stripped);
                    let rounded = self.round_numbers(&collapsed);
                    Ok(file.with_contents(rounded.into_bytes()))
                }
                None => Err(TransformError::new(
                    self.name(),
                    file.rel_path(),
                    TransformCause::Invalid("not valid UTF-8".into()),
                )),
            })
            .collect()
    }
}

impl SvgMinifyStep {
    fn round_numbers(&self, text: &str) -> String {
        self.number_re
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let raw = &caps[0];
                match raw.parse::<f64>() {
                    Ok(value) => {
                        let formatted = format!("{value:.prec$}", prec = self.precision);
                        formatted
                            .trim_end_matches('0')
                            .trim_end_matches('.')
                            .to_string()
                    }
                    Err(_) => raw.to_string(),
                }
            })
            .into_owned()
    }
}

fn strip_xml_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start..].find("-->") {
            Some(end) => rest = &rest[start + end + 3..],
            None => {
                // Unterminated comment swallows the remainder.
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn strip_doctype(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    if let Some(start) = lower.find("<!doctype") {
        if let Some(end) = text[start..].find('>') {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..start]);
            out.push_str(&text[start + end + 1..]);
            return out;
        }
    }
    text.to_string()
}

fn collapse_between_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_ws = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_ws = true;
            continue;
        }
        if pending_ws {
            let after_tag = out.ends_with('>');
            let before_tag = ch == '<';
            if !out.is_empty() && !(after_tag && before_tag) {
                out.push(' ');
            }
            pending_ws = false;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn css(text: &str) -> String {
        minify_css(text)
    }

    #[test]
    fn css_strips_comments_and_whitespace() {
        let out = css("/* banner */\nbody {\n  color : red ;\n}\n");
        assert_eq!(out, "body{color:red;}");
    }

    #[test]
    fn css_preserves_string_contents() {
        let out = css("a::before { content: \"  two  spaces \"; }");
        assert_eq!(out, "a::before{content:\"  two  spaces \";}");
    }

    #[test]
    fn css_keeps_necessary_spaces() {
        let out = css("@media screen and (max-width: 10px) { a { } }");
        assert!(out.contains("screen and"));
    }

    #[test]
    fn css_minify_is_idempotent() {
        let once = css("div  a {\n margin : 0   auto ; }");
        assert_eq!(css(&once), once);
    }

    #[test]
    fn svg_removes_comments_doctype_and_rounds() {
        let step = SvgMinifyStep::new(2).unwrap();
        let svg = "<!DOCTYPE svg PUBLIC \"x\">\n<!-- icon -->\n<svg>\n  <path d=\"M1.23456 7.891011\"/>\n</svg>\n";
        let out = step
            .apply(vec![FileRecord::new("i.svg", svg.as_bytes().to_vec())])
            .unwrap();
        let text = out[0].text().unwrap();

        assert!(!text.contains("DOCTYPE"));
        assert!(!text.contains("icon"));
        assert!(text.contains("M1.23 7.89"));
        assert!(text.contains("<svg><path"));
    }

    #[test]
    fn svg_rounding_trims_trailing_zeros() {
        let step = SvgMinifyStep::new(2).unwrap();
        let out = step
            .apply(vec![FileRecord::new(
                "i.svg",
                b"<svg x=\"1.5000\" y=\"2.0001\"/>".to_vec(),
            )])
            .unwrap();
        let text = out[0].text().unwrap();
        assert!(text.contains("x=\"1.5\""));
        assert!(text.contains("y=\"2\""));
    }
}
