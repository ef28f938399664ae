use std::collections::VecDeque;

use logos::Logos;

use crate::{error::YusoError, stack::ensure_sufficient_stack, value::Value};


/// Parentheses are always tokens of their own, everything else is split on
/// whitespace. There is no comment or escape syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
#[logos(skip r"\s+")]
pub enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[regex(r"[^\s()]+", |lex| lex.slice())]
    Atom(&'a str),
}

// Classifies a whole atom token. A token only gets a kind when the first
// match spans all of it, so `12abc` stays a symbol.
#[derive(Debug, Logos)]
enum AtomKind {
    #[token("#t")]
    True,

    #[token("#f")]
    False,

    #[regex(r"[+-]?[0-9]+")]
    Integer,

    #[regex(r"[+-]?[0-9]+\.[0-9]+")]
    Float,

    #[regex(r#""[^"]*""#)]
    String,
}

type ParseResult<O> = Result<O, YusoError>;

/// Deepest list nesting the reader accepts.
pub const MAX_NESTING_DEPTH: usize = 10_000;


pub fn tokenize(input: &str) -> VecDeque<Token<'_>> {
    let mut tokens = VecDeque::new();
    let mut tokenizer = Token::lexer(input);

    while let Some(result) = tokenizer.next() {
        // The patterns cover every non-whitespace character
        tokens.push_back(result.unwrap_or(Token::Atom(tokenizer.slice())));
    }

    tokens
}

fn classify(token: &str) -> Option<AtomKind> {
    let mut lexer = AtomKind::lexer(token);
    match lexer.next() {
        Some(Ok(kind)) if lexer.span() == (0..token.len()) => Some(kind),
        _ => None,
    }
}

fn parse_atom(token: &str) -> ParseResult<Value> {
    let value = match classify(token) {
        Some(AtomKind::True) => Value::Bool(true),
        Some(AtomKind::False) => Value::Bool(false),
        Some(AtomKind::Integer) => Value::Integer(token.parse()
            .map_err(|_| YusoError::syntax(format!("integer literal out of range: {}", token)))?),
        Some(AtomKind::Float) => Value::Float(token.parse()
            .map_err(|_| YusoError::syntax(format!("malformed float literal: {}", token)))?),
        Some(AtomKind::String) => Value::string(&token[1..token.len() - 1]),
        None => Value::symbol(token),
    };
    Ok(value)
}

fn parse_list(tokens: &mut VecDeque<Token<'_>>, depth: usize) -> ParseResult<Value> {
    if depth > MAX_NESTING_DEPTH {
        return Err(YusoError::syntax("nesting too deep"));
    }

    let mut list = Vec::new();

    loop {
        match tokens.front() {
            None => return Err(YusoError::syntax("unmatched open parenthesis")),
            Some(Token::RightParen) => {
                tokens.pop_front();
                return Ok(Value::List(list));
            }
            Some(_) => list.push(parse_nested(tokens, depth)?),
        }
    }
}

fn parse_nested(tokens: &mut VecDeque<Token<'_>>, depth: usize) -> ParseResult<Value> {
    ensure_sufficient_stack(|| match tokens.pop_front() {
        None => Err(YusoError::syntax("unexpected end of input")),
        Some(Token::LeftParen) => parse_list(tokens, depth + 1),
        Some(Token::RightParen) => Err(YusoError::syntax("unexpected close parenthesis")),
        Some(Token::Atom(token)) => parse_atom(token),
    })
}

/// Reads one expression from the front of `tokens`, consuming exactly the
/// tokens that make it up. Lists nested deeper than [`MAX_NESTING_DEPTH`]
/// are a syntax error.
pub fn parse(tokens: &mut VecDeque<Token<'_>>) -> ParseResult<Value> {
    parse_nested(tokens, 0)
}

/// Reads a complete top-level expression. Anything after it is an error.
pub fn read(input: &str) -> ParseResult<Value> {
    let mut tokens = tokenize(input);
    let expression = parse(&mut tokens)?;
    if !tokens.is_empty() {
        return Err(YusoError::syntax("unexpected trailing input"));
    }

    Ok(expression)
}
