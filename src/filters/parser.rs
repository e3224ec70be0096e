//! Filter query parser for index entries.
//!
//! Parses user-provided filter expressions into an AST ([`FilterExpr`]).
//!
//! # Syntax
//!
//! ```text
//! filter_expr := field_filter (operator field_filter)*
//! field_filter := field_name:value | field_name:"quoted value"
//! operator := AND | OR (case-insensitive)
//! field_name := role | attachment | serial (case-insensitive)
//! ```
//!
//! # Supported Fields
//!
//! - `role:user|assistant`
//! - `attachment:image|pdf|code|document|none|any`
//! - `serial:N` or `serial:N..M` (user turns only; inclusive range)
//!
//! # Examples
//!
//! ```rust
//! # use turn_navigator::filters::parser::parse_filter;
//! let expr = parse_filter("role:user attachment:pdf").unwrap();
//! let expr = parse_filter("attachment:image OR attachment:pdf").unwrap();
//! let expr = parse_filter("serial:2..4").unwrap();
//! let expr = parse_filter("role:\"user\"").unwrap();
//! ```
//!
//! # Operator Precedence
//!
//! - Implicit operators (no keyword): AND for different fields, OR for same field
//! - Explicit operators (AND/OR keywords): Always respected

use anyhow::{Context, Result, anyhow};

use super::ast::{AttachmentMatch, FieldFilter, FilterExpr, FilterField, FilterOperator, SerialMatch};
use crate::models::{AttachmentKind, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    FieldValue { field: String, value: String },
    And,
    Or,
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let word = read_word(&mut chars);
        match word.to_uppercase().as_str() {
            "AND" => tokens.push(Token::And),
            "OR" => tokens.push(Token::Or),
            _ => {
                let Some((field, value)) = word.split_once(':') else {
                    return Err(anyhow!("Invalid token: '{}' (expected field:value or AND/OR)", word));
                };
                let value = if value.starts_with('"') {
                    read_quoted_value(&mut chars, value)?
                } else {
                    value.to_string()
                };
                if field.is_empty() || value.is_empty() {
                    return Err(anyhow!("Invalid field:value format: {}", word));
                }
                tokens.push(Token::FieldValue { field: field.to_string(), value });
            }
        }
    }

    Ok(tokens)
}

fn read_word(chars: &mut Chars<'_>) -> String {
    let mut word = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            break;
        }
        word.push(ch);
        chars.next();
    }
    word
}

/// `initial` still carries the opening quote.
fn read_quoted_value(chars: &mut Chars<'_>, initial: &str) -> Result<String> {
    let mut value = initial[1..].to_string();
    if let Some(quote_pos) = value.find('"') {
        return Ok(value[..quote_pos].to_string());
    }
    for ch in chars.by_ref() {
        if ch == '"' {
            return Ok(value);
        }
        value.push(ch);
    }
    Err(anyhow!("Unterminated quoted string"))
}

fn parse_field(field: &str) -> Result<FilterField> {
    match field.to_lowercase().as_str() {
        "role" => Ok(FilterField::Role),
        "attachment" => Ok(FilterField::Attachment),
        "serial" => Ok(FilterField::Serial),
        _ => Err(anyhow!("Unknown field: '{}' (valid fields: role, attachment, serial)", field)),
    }
}

fn parse_value(field: FilterField, value: &str) -> Result<FieldFilter> {
    let value = value.trim();
    match field {
        FilterField::Role => match value.to_lowercase().as_str() {
            "user" => Ok(FieldFilter::Role(Role::User)),
            "assistant" => Ok(FieldFilter::Role(Role::Assistant)),
            _ => Err(anyhow!("Invalid role value: '{}' (must be 'user' or 'assistant')", value)),
        },
        FilterField::Attachment => {
            if value.eq_ignore_ascii_case("any") {
                return Ok(FieldFilter::Attachment(AttachmentMatch::Any));
            }
            value
                .parse::<AttachmentKind>()
                .map(|kind| FieldFilter::Attachment(AttachmentMatch::Kind(kind)))
                .map_err(|_| {
                    anyhow!(
                        "Invalid attachment value: '{}' (must be image, pdf, code, document, none or any)",
                        value
                    )
                })
        }
        FilterField::Serial => parse_serial(value).map(FieldFilter::Serial),
    }
}

fn parse_serial(value: &str) -> Result<SerialMatch> {
    let number = |s: &str| -> Result<u32> {
        let n: u32 = s.parse().with_context(|| format!("Invalid serial value: '{}'", value))?;
        if n == 0 {
            return Err(anyhow!("Invalid serial value: '{}' (serials start at 1)", value));
        }
        Ok(n)
    };
    match value.split_once("..") {
        Some((lo, hi)) => {
            let (lo, hi) = (number(lo)?, number(hi)?);
            if lo > hi {
                return Err(anyhow!("Invalid serial range: '{}' (start is after end)", value));
            }
            Ok(SerialMatch::Range(lo, hi))
        }
        None => number(value).map(SerialMatch::Exact),
    }
}

/// Parse filter string into FilterExpr
///
/// - "role:user" → single filter
/// - "role:user attachment:pdf" → implicit AND
/// - "attachment:pdf attachment:image" → implicit OR (same field)
/// - "role:user OR attachment:any" → explicit OR
pub fn parse_filter(input: &str) -> Result<FilterExpr> {
    let tokens = tokenize(input).context("Failed to tokenize filter")?;
    let mut expr = FilterExpr::new();
    let mut expecting_filter = true;
    let mut last_field: Option<FilterField> = None;

    for token in tokens {
        match token {
            Token::FieldValue { field, value } => {
                let field = parse_field(&field)?;
                let filter = parse_value(field, &value)?;

                if !expecting_filter {
                    let implicit = match last_field {
                        Some(prev) if prev == field => FilterOperator::Or,
                        _ => FilterOperator::And,
                    };
                    expr.add_operator(implicit);
                }

                expr.add_filter(filter);
                last_field = Some(field);
                expecting_filter = false;
            }
            Token::And | Token::Or => {
                if expecting_filter {
                    return Err(anyhow!("Unexpected operator (expected field:value)"));
                }
                expr.add_operator(if token == Token::And { FilterOperator::And } else { FilterOperator::Or });
                expecting_filter = true;
            }
        }
    }

    if expecting_filter && !expr.is_empty() {
        return Err(anyhow!("Filter ended with operator (expected field:value)"));
    }

    Ok(expr)
}
