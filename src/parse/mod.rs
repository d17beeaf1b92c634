//! Header front end: comment stripping, preprocessor handling, lexing and
//! declaration parsing. Everything here is pure on in-memory sources; file
//! access and include resolution belong to the pipeline.

pub mod decl;
pub mod lexer;
pub mod parser;

use crate::utils::error::Result;
use decl::ParsedHeader;

/// An `#include` directive found while preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeRef {
    pub spelling: String,
    /// Quoted includes also probe relative to the including file.
    pub quoted: bool,
    pub line: u32,
}

/// Preprocessing result: directive-free source (line numbers preserved) plus
/// the directives the scanner cares about.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub clean: String,
    pub includes: Vec<IncludeRef>,
    /// Object-like `#define NAME tokens`, recorded as type aliases.
    pub defines: Vec<(String, String)>,
}

/// Replaces comments with whitespace, keeping line and column positions of
/// everything else intact.
pub fn strip_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                out.push(' ');
                i += 1;
            }
        } else if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            out.push_str("  ");
            i += 2;
            while i < bytes.len() {
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    out.push_str("  ");
                    i += 2;
                    break;
                }
                if bytes[i] == b'\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
                i += 1;
            }
        } else {
            match source[i..].chars().next() {
                Some(ch) => {
                    out.push(ch);
                    i += ch.len_utf8();
                }
                None => break,
            }
        }
    }

    out
}

/// Strips preprocessor directives, collecting includes and object-like
/// defines. Directive lines become blank lines so diagnostics keep pointing
/// at the right place.
pub fn preprocess(source: &str) -> PreprocessOutput {
    let stripped = strip_comments(source);
    let mut clean = String::with_capacity(stripped.len());
    let mut includes = Vec::new();
    let mut defines = Vec::new();

    for (idx, raw_line) in stripped.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let trimmed = raw_line.trim_start();

        if !trimmed.starts_with('#') {
            clean.push_str(raw_line);
            clean.push('\n');
            continue;
        }

        let directive = trimmed[1..].trim_start();
        if let Some(rest) = directive.strip_prefix("include") {
            let rest = rest.trim();
            if let Some(spelling) = rest.strip_prefix('"').and_then(|r| r.split('"').next()) {
                includes.push(IncludeRef {
                    spelling: spelling.to_string(),
                    quoted: true,
                    line: line_no,
                });
            } else if let Some(spelling) =
                rest.strip_prefix('<').and_then(|r| r.split('>').next())
            {
                includes.push(IncludeRef {
                    spelling: spelling.to_string(),
                    quoted: false,
                    line: line_no,
                });
            }
        } else if let Some(rest) = directive.strip_prefix("define") {
            let rest = rest.trim_start();
            let name_end = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            let name = &rest[..name_end];
            let tail = &rest[name_end..];
            if name.is_empty() || tail.starts_with('(') {
                // Function-like macros are not part of the convention.
                tracing::debug!("skipping function-like or malformed define: {}", rest);
            } else {
                let target = tail.trim();
                if !target.is_empty() {
                    defines.push((name.to_string(), target.to_string()));
                }
            }
        }
        // Everything else (#pragma, guards, #if blocks) is intentionally
        // dropped; the subset headers use guards only.

        clean.push('\n');
    }

    PreprocessOutput {
        clean,
        includes,
        defines,
    }
}

/// Parses one header's source into raw declarations plus its directives.
pub fn parse_source(source: &str, path: &str) -> Result<(ParsedHeader, PreprocessOutput)> {
    let pre = preprocess(source);
    let tokens = lexer::tokenize(&pre.clean, path)?;
    let header = parser::parse_header(&tokens, path)?;
    Ok((header, pre))
}
