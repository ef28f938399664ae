#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Primitives and load from variables
#[derive(Arbitrary, Debug)]
enum YusoAtom {
    Add, Sub, Mul, Div,
    True, False, Nil,
    Greater, GreaterEq,
    Less, LessEq, Eq,

    Cons, List, Car, Cdr, Length,
    IsList, IsNull, ListRef, Append,
    Map, Filter, Reduce,
    Floor, Round, Ceil, Abs,

    Identifier(String),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for YusoAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            YusoAtom::Add => "+",
            YusoAtom::Sub => "-",
            YusoAtom::Mul => "*",
            YusoAtom::Div => "/",
            YusoAtom::True => "#t",
            YusoAtom::False => "#f",
            YusoAtom::Nil => "nil",
            YusoAtom::Greater => ">",
            YusoAtom::GreaterEq => ">=",
            YusoAtom::Less => "<",
            YusoAtom::LessEq => "<=",
            YusoAtom::Eq => "=",
            YusoAtom::Cons => "cons",
            YusoAtom::List => "list",
            YusoAtom::Car => "car",
            YusoAtom::Cdr => "cdr",
            YusoAtom::Length => "length",
            YusoAtom::IsList => "list?",
            YusoAtom::IsNull => "null?",
            YusoAtom::ListRef => "list-ref",
            YusoAtom::Append => "append",
            YusoAtom::Map => "map",
            YusoAtom::Filter => "filter",
            YusoAtom::Reduce => "reduce",
            YusoAtom::Floor => "floor",
            YusoAtom::Round => "round",
            YusoAtom::Ceil => "ceil",
            YusoAtom::Abs => "abs",
            YusoAtom::Identifier(identifier) => identifier,
            YusoAtom::Integer(value) => return write!(f, "{}", value),
            YusoAtom::Float(value) => return write!(f, "{:?}", value),
            YusoAtom::Text(text) => return write!(f, "\"{}\"", text),
        })
    }
}

#[derive(Arbitrary, Debug)]
enum YusoCommand {
    // Special forms
    Quote(Vec<YusoCommand>),
    Lambda(Vec<YusoCommand>),
    Define(Vec<YusoCommand>),
    Set(Vec<YusoCommand>),
    If(Vec<YusoCommand>),
    Begin(Vec<YusoCommand>),
    Let(Vec<YusoCommand>),
    And(Vec<YusoCommand>),
    Or(Vec<YusoCommand>),
    Call(Vec<YusoCommand>),

    Atom(YusoAtom),
}

fn stringify_arguments(values: &[YusoCommand]) -> String {
    values.iter()
        .map(YusoCommand::to_string)
        .join(" ")
}

impl fmt::Display for YusoCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (keyword, args) = match self {
            YusoCommand::Atom(atom) => return atom.fmt(f),
            YusoCommand::Call(args) => return write!(f, "({})", stringify_arguments(args)),
            YusoCommand::Quote(args) => ("quote", args),
            YusoCommand::Lambda(args) => ("lambda", args),
            YusoCommand::Define(args) => ("define", args),
            YusoCommand::Set(args) => ("set!", args),
            YusoCommand::If(args) => ("if", args),
            YusoCommand::Begin(args) => ("begin", args),
            YusoCommand::Let(args) => ("let", args),
            YusoCommand::And(args) => ("and", args),
            YusoCommand::Or(args) => ("or", args),
        };

        write!(f, "({} {})", keyword, stringify_arguments(args))
    }
}

fuzz_target!(|commands: Vec<YusoCommand>| {
    let mut context = yuso::EvaluationContext::with_config(yuso::Config::default().with_max_depth(512));

    for command in commands {
        let _ = context.evaluate_str(&command.to_string());
    }
});
