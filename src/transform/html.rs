// src/transform/html.rs

//! Structural HTML validation.
//!
//! A deliberately small rule set: a doctype must be present, and non-void
//! elements must be balanced. Files pass through unchanged; the step exists
//! to stop a build before malformed markup reaches a destination tree.

use crate::errors::{TransformCause, TransformError};
use crate::pipeline::FileRecord;
use crate::transform::TransformStep;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr",
];

#[derive(Debug)]
struct HtmlIssue {
    line: usize,
    message: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlValidateStep;

impl TransformStep for HtmlValidateStep {
    fn name(&self) -> &'static str {
        "validate-html"
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn apply(&self, files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError> {
        for file in &files {
            let text = match file.text() {
                Some(text) => text,
                None => {
                    return Err(TransformError::new(
                        self.name(),
                        file.rel_path(),
                        TransformCause::Invalid("not valid UTF-8".into()),
                    ));
                }
            };
            if let Err(issue) = check_structure(text) {
                return Err(TransformError::new(
                    self.name(),
                    file.rel_path(),
                    TransformCause::Parse {
                        line: issue.line,
                        column: 1,
                        message: issue.message,
                    },
                ));
            }
        }
        Ok(files)
    }
}

fn check_structure(text: &str) -> Result<(), HtmlIssue> {
    let head = text.trim_start();
    let has_doctype = head
        .get(..9)
        .map(|p| p.eq_ignore_ascii_case("<!doctype"))
        .unwrap_or(false);
    if !has_doctype {
        return Err(HtmlIssue {
            line: 1,
            message: "missing <!DOCTYPE> declaration".into(),
        });
    }

    let mut stack: Vec<(String, usize)> = Vec::new();
    let mut rest = text;
    let mut line = 1usize;

    loop {
        let Some(lt) = rest.find('<') else { break };
        line += rest[..lt].matches('\n').count();
        let tail = &rest[lt..];

        // Comments, doctype and processing instructions carry no structure.
        if tail.starts_with("<!--") {
            match tail.find("-->") {
                Some(end) => {
                    line += tail[..end].matches('\n').count();
                    rest = &tail[end + 3..];
                    continue;
                }
                None => break,
            }
        }
        if tail.starts_with("<!") || tail.starts_with("<?") {
            match tail.find('>') {
                Some(end) => {
                    line += tail[..end].matches('\n').count();
                    rest = &tail[end + 1..];
                    continue;
                }
                None => break,
            }
        }

        let Some(gt) = tail.find('>') else { break };
        let tag_line = line;
        let inner = tail[1..gt].trim();
        line += tail[..gt].matches('\n').count();
        rest = &tail[gt + 1..];

        if let Some(name) = inner.strip_prefix('/') {
            let name = element_name(name);
            match stack.pop() {
                Some((open, _)) if open == name => {}
                Some((open, open_line)) => {
                    return Err(HtmlIssue {
                        line: tag_line,
                        message: format!(
                            "closing tag </{name}> does not match <{open}> opened on line {open_line}"
                        ),
                    });
                }
                None => {
                    return Err(HtmlIssue {
                        line: tag_line,
                        message: format!("closing tag </{name}> with no open element"),
                    });
                }
            }
            continue;
        }

        if inner.ends_with('/') {
            continue;
        }

        let name = element_name(inner);
        if name.is_empty() || VOID_ELEMENTS.contains(&name.as_str()) {
            continue;
        }

        // script/style hold raw text; skip straight to the closing tag
        // instead of scanning their contents for angle brackets.
        if name == "script" || name == "style" {
            let close = format!("</{name}");
            let lowered = rest.to_ascii_lowercase();
            match lowered.find(&close) {
                Some(pos) => {
                    line += rest[..pos].matches('\n').count();
                    let after_close = &rest[pos..];
                    match after_close.find('>') {
                        Some(cgt) => {
                            rest = &after_close[cgt + 1..];
                            continue;
                        }
                        None => break,
                    }
                }
                None => {
                    return Err(HtmlIssue {
                        line: tag_line,
                        message: format!("unclosed <{name}> element"),
                    });
                }
            }
        }

        stack.push((name, tag_line));
    }

    if let Some((open, open_line)) = stack.pop() {
        return Err(HtmlIssue {
            line: open_line,
            message: format!("unclosed <{open}> element"),
        });
    }
    Ok(())
}

fn element_name(raw: &str) -> String {
    raw.chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}
