//! Tokenizer for eval expressions

use super::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
    Comma,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

fn syntax(offset: usize, message: impl Into<String>) -> EvalError {
    EvalError::Syntax {
        offset,
        message: message.into(),
    }
}

/// Split an expression into tokens, always terminated by [`TokenKind::End`]
pub(super) fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let peek = chars.get(i + 1).map(|&(_, c)| c);
        let (kind, len) = match c {
            '+' => (TokenKind::Plus, 1),
            '-' => (TokenKind::Minus, 1),
            '*' if peek == Some('*') => (TokenKind::DoubleStar, 2),
            '*' => (TokenKind::Star, 1),
            '/' if peek == Some('/') => (TokenKind::DoubleSlash, 2),
            '/' => (TokenKind::Slash, 1),
            '%' => (TokenKind::Percent, 1),
            '=' if peek == Some('=') => (TokenKind::EqEq, 2),
            '!' if peek == Some('=') => (TokenKind::NotEq, 2),
            '<' if peek == Some('=') => (TokenKind::Le, 2),
            '<' => (TokenKind::Lt, 1),
            '>' if peek == Some('=') => (TokenKind::Ge, 2),
            '>' => (TokenKind::Gt, 1),
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            ',' => (TokenKind::Comma, 1),
            '\'' | '"' => {
                let (value, len) = lex_string(&chars[i..], c)?;
                (TokenKind::Str(value), len)
            }
            c if c.is_ascii_digit() || (c == '.' && peek.is_some_and(|p| p.is_ascii_digit())) => {
                lex_number(&chars[i..])?
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident: String = chars[i..]
                    .iter()
                    .map(|&(_, c)| c)
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                let len = ident.chars().count();
                (TokenKind::Ident(ident), len)
            }
            other => return Err(syntax(offset, format!("unexpected character '{}'", other))),
        };

        tokens.push(Token { kind, offset });
        i += len;
    }

    tokens.push(Token {
        kind: TokenKind::End,
        offset: source.len(),
    });
    Ok(tokens)
}

fn lex_string(chars: &[(usize, char)], quote: char) -> Result<(String, usize), EvalError> {
    let start = chars[0].0;
    let mut value = String::new();
    let mut i = 1;
    while i < chars.len() {
        match chars[i].1 {
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .map(|&(_, c)| c)
                    .ok_or_else(|| syntax(start, "unterminated string literal"))?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                i += 2;
            }
            c if c == quote => return Ok((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    Err(syntax(start, "unterminated string literal"))
}

fn lex_number(chars: &[(usize, char)]) -> Result<(TokenKind, usize), EvalError> {
    let start = chars[0].0;
    let mut text = String::new();
    let mut is_float = false;
    let mut i = 0;

    while let Some(&(_, c)) = chars.get(i) {
        match c {
            '0'..='9' => text.push(c),
            '.' if !is_float => {
                is_float = true;
                text.push(c);
            }
            'e' | 'E' => {
                // Exponent only when followed by digits, otherwise it starts an identifier
                let sign = chars.get(i + 1).map(|&(_, c)| c);
                let digits_at = if matches!(sign, Some('+') | Some('-')) { i + 2 } else { i + 1 };
                if !chars.get(digits_at).is_some_and(|&(_, c)| c.is_ascii_digit()) {
                    break;
                }
                is_float = true;
                text.push('e');
                if let Some(s @ ('+' | '-')) = sign {
                    text.push(s);
                }
                i = digits_at;
                while let Some(&(_, d)) = chars.get(i).filter(|(_, d)| d.is_ascii_digit()) {
                    text.push(d);
                    i += 1;
                }
                break;
            }
            _ => break,
        }
        i += 1;
    }

    let kind = if is_float {
        text.parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|_| syntax(start, format!("invalid number '{}'", text)))?
    } else {
        text.parse::<i64>()
            .map(TokenKind::Int)
            .map_err(|_| syntax(start, format!("integer literal '{}' out of range", text)))?
    };
    Ok((kind, i))
}
