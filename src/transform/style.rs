// src/transform/style.rs

//! Style-sheet compilation.
//!
//! The actual compiler is an external collaborator behind [`StyleCompiler`];
//! the step owns only the contract: UTF-8 text in, CSS text out, positioned
//! diagnostics on malformed input, `.css` extension on the way out.

use std::sync::Arc;

use serde::Deserialize;

use crate::errors::{TransformCause, TransformError};
use crate::pipeline::FileRecord;
use crate::transform::TransformStep;

/// Line-ending convention for emitted stylesheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    fn normalize(&self, text: &str) -> String {
        let unix = text.replace("\r\n", "\n");
        match self {
            LineEnding::Lf => unix,
            LineEnding::Crlf => unix.replace('\n', "\r\n"),
        }
    }
}

/// Positioned diagnostic from a style compiler.
#[derive(Debug, Clone)]
pub struct StyleDiagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// External collaborator: compiles style source text into CSS text.
pub trait StyleCompiler: Send + Sync {
    fn compile(&self, source: &str) -> Result<String, StyleDiagnostic>;
}

/// Built-in compiler for plain CSS-shaped sources: strips `//` line comments
/// (string-aware) and rejects unbalanced braces with a positioned
/// diagnostic. Variables, nesting and the rest of a real preprocessor
/// belong to an external [`StyleCompiler`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainStyleCompiler;

impl StyleCompiler for PlainStyleCompiler {
    fn compile(&self, source: &str) -> Result<String, StyleDiagnostic> {
        check_braces(source)?;
        Ok(strip_line_comments(source))
    }
}

/// Step applying a [`StyleCompiler`] to every file in the set, rewriting
/// the extension to `.css` and normalizing line endings.
pub struct StyleCompileStep {
    compiler: Arc<dyn StyleCompiler>,
    line_ending: LineEnding,
}

impl StyleCompileStep {
    pub fn new(compiler: Arc<dyn StyleCompiler>, line_ending: LineEnding) -> Self {
        Self {
            compiler,
            line_ending,
        }
    }
}

impl TransformStep for StyleCompileStep {
    fn name(&self) -> &'static str {
        "compile-style"
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn apply(&self, files: Vec<FileRecord>) -> Result<Vec<FileRecord>, TransformError> {
        files
            .into_iter()
            .map(|file| {
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

                let css = self.compiler.compile(text).map_err(|diag| {
                    TransformError::new(
                        self.name(),
                        file.rel_path(),
                        TransformCause::Parse {
                            line: diag.line,
                            column: diag.column,
                            message: diag.message,
                        },
                    )
                })?;
                let css = self.line_ending.normalize(&css);

                Ok(file.with_extension("css").with_contents(css.into_bytes()))
            })
            .collect()
    }
}

fn check_braces(source: &str) -> Result<(), StyleDiagnostic> {
    let mut depth = 0usize;
    let mut last_open = (1usize, 1usize);
    let mut line = 1usize;
    let mut col = 0usize;
    let mut in_block_comment = false;
    let mut in_line_comment = false;
    let mut in_string: Option<char> = None;

    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\n' {
            line += 1;
            col = 0;
            in_line_comment = false;
            in_string = None;
            continue;
        }
        col += 1;

        if in_line_comment {
            continue;
        }
        if in_block_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                chars.next();
                col += 1;
                in_block_comment = false;
            }
            continue;
        }
        if let Some(quote) = in_string {
            if ch == quote {
                in_string = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => in_string = Some(ch),
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                col += 1;
                in_line_comment = true;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                col += 1;
                in_block_comment = true;
            }
            '{' => {
                depth += 1;
                last_open = (line, col);
            }
            '}' => {
                if depth == 0 {
                    return Err(StyleDiagnostic {
                        line,
                        column: col,
                        message: "unmatched '}'".into(),
                    });
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(StyleDiagnostic {
            line: last_open.0,
            column: last_open.1,
            message: "unclosed '{'".into(),
        });
    }
    Ok(())
}

/// Drop `//` comments up to end of line; strings and `/* */` blocks pass
/// through untouched.
fn strip_line_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_block_comment = false;
    let mut in_string: Option<char> = None;

    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_block_comment {
            out.push(ch);
            if ch == '*' && chars.peek() == Some(&'/') {
                if let Some(slash) = chars.next() {
                    out.push(slash);
                }
                in_block_comment = false;
            }
            continue;
        }
        if let Some(quote) = in_string {
            out.push(ch);
            if ch == quote || ch == '\n' {
                in_string = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                in_string = Some(ch);
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                out.push(ch);
                if let Some(star) = chars.next() {
                    out.push(star);
                }
                in_block_comment = true;
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn step(line_ending: LineEnding) -> StyleCompileStep {
        StyleCompileStep::new(Arc::new(PlainStyleCompiler), line_ending)
    }

    #[test]
    fn compiles_and_renames_to_css() {
        let files = vec![FileRecord::new(
            "sass/theme.scss",
            b"// header\nbody { color: red; }\n".to_vec(),
        )];
        let out = step(LineEnding::Lf).apply(files).unwrap();

        assert_eq!(out[0].rel_path(), Path::new("sass/theme.css"));
        assert_eq!(out[0].text().unwrap(), "\nbody { color: red; }\n");
    }

    #[test]
    fn crlf_option_rewrites_line_endings() {
        let files = vec![FileRecord::new("a.scss", b"a {\n}\n".to_vec())];
        let out = step(LineEnding::Crlf).apply(files).unwrap();
        assert_eq!(out[0].text().unwrap(), "a {\r\n}\r\n");
    }

    #[test]
    fn unclosed_brace_reports_opening_position() {
        let files = vec![FileRecord::new(
            "bad.scss",
            b"body {\n  color: red;\n".to_vec(),
        )];
        let err = step(LineEnding::Lf).apply(files).unwrap_err();

        assert_eq!(err.step, "compile-style");
        match err.cause {
            TransformCause::Parse { line, column, .. } => {
                assert_eq!((line, column), (1, 6));
            }
            other => panic!("expected parse cause, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_close_brace_is_positioned() {
        let err = step(LineEnding::Lf)
            .apply(vec![FileRecord::new("bad.scss", b"a { }\n}\n".to_vec())])
            .unwrap_err();
        match err.cause {
            TransformCause::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected parse cause, got {other:?}"),
        }
    }

    #[test]
    fn braces_inside_strings_and_comments_are_ignored() {
        let source = b"a::before { content: \"}\"; } /* { */\n".to_vec();
        let out = step(LineEnding::Lf)
            .apply(vec![FileRecord::new("ok.scss", source)])
            .unwrap();
        assert!(out[0].text().unwrap().contains("content: \"}\""));
    }

    #[test]
    fn line_comment_inside_url_like_string_survives() {
        let source = b"a { background: url(\"http://x/y\"); }\n".to_vec();
        let out = step(LineEnding::Lf)
            .apply(vec![FileRecord::new("u.scss", source)])
            .unwrap();
        assert!(out[0].text().unwrap().contains("http://x/y"));
    }

    #[test]
    fn recompiling_compiled_output_is_stable() {
        let step = step(LineEnding::Lf);
        let once = step
            .apply(vec![FileRecord::new(
                "a.scss",
                b"// note\nbody { margin: 0; }\n".to_vec(),
            )])
            .unwrap();
        let twice = step.apply(once.clone()).unwrap();
        assert_eq!(once[0].contents(), twice[0].contents());
    }
}
