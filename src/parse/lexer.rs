use crate::utils::error::{Result, ScanError};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// Integer or floating literal, spelling preserved (`3`, `4.2`, `1.5f`).
    Number(String),
    /// Character literal including quotes (`'a'`).
    CharLit(String),
    /// String literal content, quotes removed.
    StrLit(String),
    Symbol(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_symbol(&self, sym: &str) -> bool {
        matches!(&self.kind, TokenKind::Symbol(s) if *s == sym)
    }

    pub fn spelling(&self) -> String {
        match &self.kind {
            TokenKind::Ident(s) => s.clone(),
            TokenKind::Number(s) => s.clone(),
            TokenKind::CharLit(s) => s.clone(),
            TokenKind::StrLit(s) => format!("\"{}\"", s),
            TokenKind::Symbol(s) => (*s).to_string(),
        }
    }
}

const TWO_CHAR_SYMBOLS: &[&str] = &["::", "[[", "]]", "&&"];
const ONE_CHAR_SYMBOLS: &str = "{}()<>;:,*&=~-+[].";

/// Tokenizes preprocessed (directive- and comment-free) source.
pub fn tokenize(source: &str, file: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line: u32 = 1;
    let mut column: u32 = 1;

    let advance = |i: &mut usize, line: &mut u32, column: &mut u32, c: char| {
        *i += 1;
        if c == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    };

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            advance(&mut i, &mut line, &mut column, c);
            continue;
        }

        let tok_line = line;
        let tok_column = column;

        if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                let d = chars[i];
                ident.push(d);
                advance(&mut i, &mut line, &mut column, d);
            }
            tokens.push(Token {
                kind: TokenKind::Ident(ident),
                line: tok_line,
                column: tok_column,
            });
            continue;
        }

        if c.is_ascii_digit() {
            let mut number = String::new();
            let mut seen_dot = false;
            while i < chars.len() {
                let d = chars[i];
                if d.is_ascii_digit()
                    || (d == '.' && !seen_dot)
                    || matches!(d, 'f' | 'F' | 'u' | 'U' | 'l' | 'L' | 'x' | 'X')
                    || (d.is_ascii_hexdigit() && number.starts_with("0x"))
                {
                    if d == '.' {
                        seen_dot = true;
                    }
                    number.push(d);
                    advance(&mut i, &mut line, &mut column, d);
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Number(number),
                line: tok_line,
                column: tok_column,
            });
            continue;
        }

        if c == '\'' {
            let mut lit = String::from("'");
            advance(&mut i, &mut line, &mut column, c);
            let mut closed = false;
            while i < chars.len() {
                let d = chars[i];
                lit.push(d);
                advance(&mut i, &mut line, &mut column, d);
                if d == '\\' && i < chars.len() {
                    let e = chars[i];
                    lit.push(e);
                    advance(&mut i, &mut line, &mut column, e);
                    continue;
                }
                if d == '\'' {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(ScanError::SyntaxError {
                    file: file.to_string(),
                    line: tok_line,
                    column: tok_column,
                    message: "unterminated character literal".to_string(),
                });
            }
            tokens.push(Token {
                kind: TokenKind::CharLit(lit),
                line: tok_line,
                column: tok_column,
            });
            continue;
        }

        if c == '"' {
            advance(&mut i, &mut line, &mut column, c);
            let mut lit = String::new();
            let mut closed = false;
            while i < chars.len() {
                let d = chars[i];
                advance(&mut i, &mut line, &mut column, d);
                if d == '\\' && i < chars.len() {
                    lit.push(d);
                    let e = chars[i];
                    lit.push(e);
                    advance(&mut i, &mut line, &mut column, e);
                    continue;
                }
                if d == '"' {
                    closed = true;
                    break;
                }
                lit.push(d);
            }
            if !closed {
                return Err(ScanError::SyntaxError {
                    file: file.to_string(),
                    line: tok_line,
                    column: tok_column,
                    message: "unterminated string literal".to_string(),
                });
            }
            tokens.push(Token {
                kind: TokenKind::StrLit(lit),
                line: tok_line,
                column: tok_column,
            });
            continue;
        }

        let mut matched = false;
        if i + 1 < chars.len() {
            let pair: String = [c, chars[i + 1]].iter().collect();
            if let Some(sym) = TWO_CHAR_SYMBOLS.iter().find(|s| **s == pair).copied() {
                tokens.push(Token {
                    kind: TokenKind::Symbol(sym),
                    line: tok_line,
                    column: tok_column,
                });
                let c2 = chars[i + 1];
                advance(&mut i, &mut line, &mut column, c);
                advance(&mut i, &mut line, &mut column, c2);
                matched = true;
            }
        }
        if matched {
            continue;
        }

        if let Some(idx) = ONE_CHAR_SYMBOLS.find(c) {
            // Index back into the static str so the symbol borrows 'static.
            let sym = &ONE_CHAR_SYMBOLS[idx..idx + c.len_utf8()];
            tokens.push(Token {
                kind: TokenKind::Symbol(sym),
                line: tok_line,
                column: tok_column,
            });
            advance(&mut i, &mut line, &mut column, c);
            continue;
        }

        return Err(ScanError::SyntaxError {
            file: file.to_string(),
            line: tok_line,
            column: tok_column,
            message: format!("unexpected character '{}'", c),
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src, "test.h")
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_a_field_declaration() {
        let toks = kinds("float b = 4.2;");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("float".to_string()),
                TokenKind::Ident("b".to_string()),
                TokenKind::Symbol("="),
                TokenKind::Number("4.2".to_string()),
                TokenKind::Symbol(";"),
            ]
        );
    }

    #[test]
    fn lexes_qualified_template_types() {
        let toks = kinds("const spark::handle<ICoreFramework>& a");
        assert!(toks.contains(&TokenKind::Symbol("::")));
        assert!(toks.contains(&TokenKind::Symbol("<")));
        assert!(toks.contains(&TokenKind::Symbol("&")));
    }

    #[test]
    fn lexes_char_literals_and_annotations() {
        let toks = kinds("char c = 'a'; [[clang::annotate(\"generate_binds\")]]");
        assert!(toks.contains(&TokenKind::CharLit("'a'".to_string())));
        assert!(toks.contains(&TokenKind::Symbol("[[")));
        assert!(toks.contains(&TokenKind::StrLit("generate_binds".to_string())));
        assert!(toks.contains(&TokenKind::Symbol("]]")));
    }

    #[test]
    fn tracks_line_and_column() {
        let toks = tokenize("int a;\n  double d;", "test.h").unwrap();
        let double_tok = toks.iter().find(|t| t.ident() == Some("double")).unwrap();
        assert_eq!((double_tok.line, double_tok.column), (2, 3));
    }

    #[test]
    fn rejects_unknown_characters() {
        assert!(tokenize("int a @ b;", "test.h").is_err());
    }
}
