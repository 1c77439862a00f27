//! # Template Expressions
//!
//! Evaluates the small Jinja subset that template schemas use in `when` conditions and
//! default values: variable references, string/number/boolean literals, `==`, `!=`, `in`,
//! `not`, `and`, `or`, parentheses and the inline `a if cond else b` form.
//!
//! Unknown variables evaluate to an empty string, which is falsy.

use crate::core::template_schema::Answers;
use serde_yaml::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Unterminated string literal in '{0}'")]
    UnterminatedString(String),
    #[error("Unexpected character '{found}' in '{expr}'")]
    UnexpectedChar { found: char, expr: String },
    #[error("Unexpected end of expression '{0}'")]
    UnexpectedEnd(String),
    #[error("Unexpected token '{found}' in '{expr}'")]
    UnexpectedToken { found: String, expr: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Int(i64),
    Float(f64),
    Ident(String),
    Eq,
    NotEq,
    LParen,
    RParen,
}

fn describe(token: &Token) -> String {
    match token {
        Token::Str(s) => format!("'{}'", s),
        Token::Int(n) => n.to_string(),
        Token::Float(n) => n.to_string(),
        Token::Ident(name) => name.clone(),
        Token::Eq => "==".to_string(),
        Token::NotEq => "!=".to_string(),
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut literal = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == quote {
                        closed = true;
                        break;
                    }
                    literal.push(next);
                }
                if !closed {
                    return Err(ExpressionError::UnterminatedString(expr.to_string()));
                }
                tokens.push(Token::Str(literal));
            }
            '=' | '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err(ExpressionError::UnexpectedChar {
                        found: c,
                        expr: expr.to_string(),
                    });
                }
                tokens.push(if c == '=' { Token::Eq } else { Token::NotEq });
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = String::new();
                number.push(c);
                chars.next();
                while let Some(d) = chars.next_if(|d| d.is_ascii_digit() || *d == '.') {
                    number.push(d);
                }
                let token = if let Ok(int) = number.parse::<i64>() {
                    Token::Int(int)
                } else if let Ok(float) = number.parse::<f64>() {
                    Token::Float(float)
                } else {
                    return Err(ExpressionError::UnexpectedToken {
                        found: number,
                        expr: expr.to_string(),
                    });
                };
                tokens.push(token);
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut ident = String::new();
                while let Some(d) = chars.next_if(|d| d.is_alphanumeric() || *d == '_' || *d == '.') {
                    ident.push(d);
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(ExpressionError::UnexpectedChar {
                    found: other,
                    expr: expr.to_string(),
                });
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    expr: &'a str,
    context: &'a Answers,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(word)) if word == keyword)
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(Token::Ident(word)) if word == keyword => Ok(()),
            Some(other) => Err(ExpressionError::UnexpectedToken {
                found: describe(&other),
                expr: self.expr.to_string(),
            }),
            None => Err(ExpressionError::UnexpectedEnd(self.expr.to_string())),
        }
    }

    fn ternary(&mut self) -> Result<Value, ExpressionError> {
        let value = self.or_expr()?;
        if !self.peek_keyword("if") {
            return Ok(value);
        }
        self.advance();
        let condition = self.or_expr()?;
        self.expect_keyword("else")?;
        let otherwise = self.ternary()?;
        Ok(if is_truthy(&condition) { value } else { otherwise })
    }

    fn or_expr(&mut self) -> Result<Value, ExpressionError> {
        let mut left = self.and_expr()?;
        while self.peek_keyword("or") {
            self.advance();
            let right = self.and_expr()?;
            left = if is_truthy(&left) { left } else { right };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Value, ExpressionError> {
        let mut left = self.not_expr()?;
        while self.peek_keyword("and") {
            self.advance();
            let right = self.not_expr()?;
            left = if is_truthy(&left) { right } else { left };
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Value, ExpressionError> {
        if self.peek_keyword("not") {
            self.advance();
            let value = self.not_expr()?;
            return Ok(Value::Bool(!is_truthy(&value)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Value, ExpressionError> {
        let left = self.primary()?;
        match self.peek() {
            Some(Token::Eq) => {
                self.advance();
                let right = self.primary()?;
                Ok(Value::Bool(loosely_equal(&left, &right)))
            }
            Some(Token::NotEq) => {
                self.advance();
                let right = self.primary()?;
                Ok(Value::Bool(!loosely_equal(&left, &right)))
            }
            Some(Token::Ident(word)) if word == "in" => {
                self.advance();
                let right = self.primary()?;
                Ok(Value::Bool(contains(&right, &left)))
            }
            _ => Ok(left),
        }
    }

    fn primary(&mut self) -> Result<Value, ExpressionError> {
        match self.advance() {
            Some(Token::Str(s)) => Ok(Value::String(s)),
            Some(Token::Int(n)) => Ok(Value::Number(n.into())),
            Some(Token::Float(n)) => Ok(Value::Number(n.into())),
            Some(Token::Ident(word)) => Ok(match word.as_str() {
                "true" | "True" => Value::Bool(true),
                "false" | "False" => Value::Bool(false),
                "none" | "None" => Value::Null,
                name => lookup(self.context, name),
            }),
            Some(Token::LParen) => {
                let value = self.ternary()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(ExpressionError::UnexpectedToken {
                        found: describe(&other),
                        expr: self.expr.to_string(),
                    }),
                    None => Err(ExpressionError::UnexpectedEnd(self.expr.to_string())),
                }
            }
            Some(other) => Err(ExpressionError::UnexpectedToken {
                found: describe(&other),
                expr: self.expr.to_string(),
            }),
            None => Err(ExpressionError::UnexpectedEnd(self.expr.to_string())),
        }
    }
}

fn lookup(context: &Answers, name: &str) -> Value {
    let mut segments = name.split('.');
    let Some(first) = segments.next() else {
        return Value::String(String::new());
    };
    let mut current = match context.get(first) {
        Some(value) => value.clone(),
        None => return Value::String(String::new()),
    };
    for segment in segments {
        current = match current.get(segment) {
            Some(value) => value.clone(),
            None => return Value::String(String::new()),
        };
    }
    current
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => left == right,
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Sequence(items) => items.iter().any(|item| loosely_equal(item, needle)),
        Value::String(text) => needle.as_str().is_some_and(|n| text.contains(n)),
        Value::Mapping(map) => map.contains_key(needle),
        _ => false,
    }
}

/// Jinja truthiness: empty strings, zero, empty collections, null and `false` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Renders a value the way it would appear in a generated file.
pub fn to_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn strip_delimiters(expr: &str) -> &str {
    let trimmed = expr.trim();
    trimmed
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Evaluates a single expression, with or without surrounding `{{ }}`.
pub fn evaluate(expr: &str, context: &Answers) -> Result<Value, ExpressionError> {
    let inner = strip_delimiters(expr);
    let mut parser = Parser {
        tokens: tokenize(inner)?,
        pos: 0,
        expr: inner,
        context,
    };
    let value = parser.ternary()?;
    match parser.advance() {
        None => Ok(value),
        Some(extra) => Err(ExpressionError::UnexpectedToken {
            found: describe(&extra),
            expr: inner.to_string(),
        }),
    }
}

/// Evaluates a `when` condition. Booleans are taken as-is; unparsable expressions show
/// the question rather than hide it.
pub fn condition_holds(when: &Value, context: &Answers) -> bool {
    match when {
        Value::String(expr) => match evaluate(expr, context) {
            Ok(value) => is_truthy(&value),
            Err(e) => {
                log::debug!("Treating unparsable condition as true: {}", e);
                true
            }
        },
        other => is_truthy(other),
    }
}

/// Replaces every `{{ ... }}` segment of `template` with its evaluated value.
/// Segments that fail to evaluate are kept verbatim.
pub fn render(template: &str, context: &Answers) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let (before, from_open) = rest.split_at(start);
        output.push_str(before);
        let Some(end) = from_open.find("}}") else {
            output.push_str(from_open);
            return output;
        };
        let (segment, after) = from_open.split_at(end + 2);
        match evaluate(segment, context) {
            Ok(value) => output.push_str(&to_display(&value)),
            Err(e) => {
                log::debug!("Keeping template segment verbatim: {}", e);
                output.push_str(segment);
            }
        }
        rest = after;
    }
    output.push_str(rest);
    output
}

/// Resolves a schema default: strings are rendered, a string that is exactly one
/// expression keeps the expression's type.
pub fn resolve_default(default: &Value, context: &Answers) -> Value {
    match default {
        Value::String(text) => {
            let trimmed = text.trim();
            let single = trimmed.starts_with("{{")
                && trimmed.ends_with("}}")
                && trimmed.matches("{{").count() == 1;
            if single {
                if let Ok(value) = evaluate(trimmed, context) {
                    return value;
                }
            }
            Value::String(render(text, context))
        }
        other => other.clone(),
    }
}
