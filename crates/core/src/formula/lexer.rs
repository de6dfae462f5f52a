//! Tokenizer for pricing formulas.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::EvaluationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Decimal literal, already parsed.
    Number(Decimal),
    /// Field name or `basePrice`.
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Eof,
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Split a formula into tokens, always ending with [`Token::Eof`].
///
/// # Errors
///
/// Returns [`EvaluationError::Syntax`] at the first character outside the
/// grammar (including a `.` not followed by a digit), and
/// [`EvaluationError::InvalidNumber`] for a literal too large for a decimal.
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, EvaluationError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(token) = single {
            chars.next();
            tokens.push(Spanned { token, position });
            continue;
        }

        if c.is_ascii_digit() {
            let mut end = position;
            while let Some(&(i, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                end = i + d.len_utf8();
                chars.next();
            }

            if let Some(&(dot, '.')) = chars.peek() {
                chars.next();
                let mut fraction_end = None;
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    fraction_end = Some(i + d.len_utf8());
                    chars.next();
                }
                // "12." is not a number in this grammar
                end = fraction_end.ok_or(EvaluationError::Syntax { position: dot })?;
            }

            let text = src
                .get(position..end)
                .ok_or(EvaluationError::Syntax { position })?;
            let value =
                Decimal::from_str(text).map_err(|_| EvaluationError::InvalidNumber { position })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                position,
            });
            continue;
        }

        if is_ident_start(c) {
            let mut name = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !is_ident_continue(d) {
                    break;
                }
                name.push(d);
                chars.next();
            }
            tokens.push(Spanned {
                token: Token::Ident(name),
                position,
            });
            continue;
        }

        return Err(EvaluationError::Syntax { position });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        position: src.len(),
    });
    Ok(tokens)
}

/// Whether `c` may start an identifier (`[A-Za-z_]`).
pub const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Whether `c` may continue an identifier (`[A-Za-z0-9_]`).
pub const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
