//! Tokenizer for dependency expressions.

use crate::types::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    BangEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Dot,
}

/// A token with the byte offset where it started.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

/// Tokenizes an expression string.
pub fn lex(src: &str) -> Result<Vec<Spanned>, ExprError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let start = pos;
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        // Numbers: integer or decimal.
        if c.is_ascii_digit() {
            let mut end = pos;
            let mut is_float = false;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
            // A dot counts as a decimal point only when digits follow;
            // otherwise it is member access on a weird identifier and the
            // parser will reject it.
            if end + 1 < chars.len() && chars[end] == '.' && chars[end + 1].is_ascii_digit() {
                is_float = true;
                end += 1;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
            }
            let text: String = chars[pos..end].iter().collect();
            let token = if is_float {
                Token::Float(
                    text.parse()
                        .map_err(|_| ExprError::syntax(start, format!("bad number: {text}")))?,
                )
            } else {
                Token::Int(
                    text.parse()
                        .map_err(|_| ExprError::syntax(start, format!("bad number: {text}")))?,
                )
            };
            tokens.push(Spanned { token, pos: start });
            pos = end;
            continue;
        }

        // Identifiers and keywords.
        if c.is_ascii_alphabetic() || c == '_' {
            let mut end = pos;
            while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            let word: String = chars[pos..end].iter().collect();
            let token = match word.as_str() {
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                _ => Token::Ident(word),
            };
            tokens.push(Spanned { token, pos: start });
            pos = end;
            continue;
        }

        // String literals, single or double quoted.
        if c == '\'' || c == '"' {
            let quote = c;
            pos += 1;
            let mut text = String::new();
            loop {
                match chars.get(pos) {
                    None => return Err(ExprError::syntax(start, "unterminated string")),
                    Some(&ch) if ch == quote => {
                        pos += 1;
                        break;
                    }
                    Some('\\') => {
                        pos += 1;
                        match chars.get(pos) {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(&esc) => text.push(esc),
                            None => return Err(ExprError::syntax(start, "unterminated string")),
                        }
                        pos += 1;
                    }
                    Some(&ch) => {
                        text.push(ch);
                        pos += 1;
                    }
                }
            }
            tokens.push(Spanned {
                token: Token::Str(text),
                pos: start,
            });
            continue;
        }

        // Operators and punctuation.
        let two: Option<Token> = match (c, chars.get(pos + 1)) {
            ('=', Some('=')) => Some(Token::EqEq),
            ('!', Some('=')) => Some(Token::BangEq),
            ('<', Some('=')) => Some(Token::Le),
            ('>', Some('=')) => Some(Token::Ge),
            ('&', Some('&')) => Some(Token::AndAnd),
            ('|', Some('|')) => Some(Token::OrOr),
            _ => None,
        };
        if let Some(token) = two {
            tokens.push(Spanned { token, pos: start });
            pos += 2;
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '<' => Token::Lt,
            '>' => Token::Gt,
            '!' => Token::Bang,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '.' => Token::Dot,
            other => {
                return Err(ExprError::syntax(
                    start,
                    format!("unexpected character: {other:?}"),
                ));
            }
        };
        tokens.push(Spanned { token, pos: start });
        pos += 1;
    }

    Ok(tokens)
}
