use std::{cmp::Ordering, collections::HashMap};

use itertools::Itertools;

use crate::{
    error::{Arity, YusoError},
    frame::{Env, Frame},
    interpreter::{apply, EvaluationResult, EvaluationState},
    value::{Primitive, PrimitiveFn, Value},
};


#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(value) => Value::Integer(value),
            Number::Float(value) => Value::Float(value),
        }
    }
}

fn expect_arity(values: &[Value], arity: Arity) -> Result<(), YusoError> {
    if arity.accepts(values.len()) { return Ok(()); }
    Err(YusoError::ArityMismatch { expected: arity, got: values.len() })
}

fn value_list_to_numbers(values: Vec<Value>) -> Result<Vec<Number>, YusoError> {
    values.into_iter()
        .map(|value| match value {
            Value::Integer(number) => Ok(Number::Integer(number)),
            Value::Float(number) => Ok(Number::Float(number)),
            other => Err(YusoError::type_mismatch(format!("expected a number, got {}", other))),
        }).collect()
}

fn single_list(values: &[Value], name: &str) -> Result<Vec<Value>, YusoError> {
    expect_arity(values, Arity::Exactly(1))?;
    match &values[0] {
        Value::List(items) => Ok(items.clone()),
        other => Err(YusoError::type_mismatch(format!("{} expects a list, got {}", name, other))),
    }
}

// Left fold seeded by the first operand. A step stays integral only while
// both sides are integers; once a float shows up the accumulator is a float
// for the rest of the fold.
fn arithmetic_fold(
    values: Vec<Value>,
    integer_op: fn(i64, i64) -> Result<i64, YusoError>,
    float_op: fn(f64, f64) -> Result<f64, YusoError>,
) -> EvaluationResult {
    let numbers = value_list_to_numbers(values)?;
    let (first, rest) = numbers.split_first().ok_or(YusoError::ArityMismatch { expected: Arity::AtLeast(1), got: 0 })?;

    rest.iter()
        .try_fold(*first, |accumulator, operand| match (accumulator, *operand) {
            (Number::Integer(a), Number::Integer(b)) => integer_op(a, b).map(Number::Integer),
            (a, b) => float_op(a.as_f64(), b.as_f64()).map(Number::Float),
        })
        .map(Value::from)
}

fn builtin_add(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    arithmetic_fold(
        values,
        |a, b| a.checked_add(b).ok_or(YusoError::ArithmeticOverflow),
        |a, b| Ok(a + b),
    )
}

fn builtin_sub(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    // A single operand is negated
    if let [value] = values.as_slice() {
        return match value_list_to_numbers(vec![value.clone()])?[0] {
            Number::Integer(number) => number.checked_neg().map(Value::Integer).ok_or(YusoError::ArithmeticOverflow),
            Number::Float(number) => Ok(Value::Float(-number)),
        };
    }

    arithmetic_fold(
        values,
        |a, b| a.checked_sub(b).ok_or(YusoError::ArithmeticOverflow),
        |a, b| Ok(a - b),
    )
}

fn builtin_mul(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    arithmetic_fold(
        values,
        |a, b| a.checked_mul(b).ok_or(YusoError::ArithmeticOverflow),
        |a, b| Ok(a * b),
    )
}

fn builtin_div(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    arithmetic_fold(
        values,
        |a, b| match b {
            0 => Err(YusoError::DivisionByZero),
            _ => a.checked_div(b).ok_or(YusoError::ArithmeticOverflow),
        },
        |a, b| if b == 0.0 { Err(YusoError::DivisionByZero) } else { Ok(a / b) },
    )
}

fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
        (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
    }
}

// Every adjacent pair has to satisfy the relation, so `(< 1 2 3)` checks the
// whole chain. NaN compares false against everything.
fn builtin_compare(values: Vec<Value>, f: fn(Ordering) -> bool) -> EvaluationResult {
    let numbers = value_list_to_numbers(values)?;
    let holds = numbers.into_iter()
        .tuple_windows()
        .all(|(a, b)| compare_numbers(a, b).is_some_and(f));
    Ok(Value::Bool(holds))
}

fn builtin_less(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    builtin_compare(values, Ordering::is_lt)
}

fn builtin_less_eq(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    builtin_compare(values, Ordering::is_le)
}

fn builtin_greater(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    builtin_compare(values, Ordering::is_gt)
}

fn builtin_greater_eq(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    builtin_compare(values, Ordering::is_ge)
}

fn builtin_eq(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    let holds = match values.split_first() {
        Some((first, rest)) => rest.iter().all(|value| value == first),
        None => true,
    };
    Ok(Value::Bool(holds))
}

fn builtin_not(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(1))?;
    match &values[0] {
        Value::Bool(value) => Ok(Value::Bool(!value)),
        other => Err(YusoError::type_mismatch(format!("not expects a boolean, got {}", other))),
    }
}

fn builtin_list(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    Ok(Value::List(values))
}

fn builtin_cons(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(2))?;
    let mut values = values.into_iter();
    let (Some(head), Some(tail)) = (values.next(), values.next()) else {
        unreachable!("arity checked above")
    };

    match tail.into_list() {
        Ok(tail) => {
            let mut list = Vec::with_capacity(tail.len() + 1);
            list.push(head);
            list.extend(tail);
            Ok(Value::List(list))
        }
        Err(other) => Err(YusoError::type_mismatch(format!("cons expects a list as its second operand, got {}", other))),
    }
}

fn builtin_car(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    single_list(&values, "car")?
        .into_iter()
        .next()
        .ok_or(YusoError::type_mismatch("car of an empty list"))
}

fn builtin_cdr(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    let list = single_list(&values, "cdr")?;
    match list.split_first() {
        Some((_, rest)) => Ok(Value::List(rest.to_vec())),
        None => Err(YusoError::type_mismatch("cdr of an empty list")),
    }
}

fn builtin_length(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    let list = single_list(&values, "length")?;
    Ok(Value::Integer(list.len() as i64))
}

fn builtin_is_list(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(1))?;
    Ok(Value::Bool(matches!(values[0], Value::List(_))))
}

fn builtin_is_null(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(1))?;
    Ok(Value::Bool(match &values[0] {
        Value::List(items) => items.is_empty(),
        Value::Nil => true,
        _ => false,
    }))
}

fn builtin_list_ref(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(2))?;
    match (&values[0], &values[1]) {
        (Value::List(items), Value::Integer(index)) => usize::try_from(*index).ok()
            .and_then(|index| items.get(index))
            .cloned()
            .ok_or(YusoError::type_mismatch(format!("index {} out of range for a list of length {}", index, items.len()))),
        (list, index) => Err(YusoError::type_mismatch(format!("list-ref expects a list and an integer, got {} and {}", list, index))),
    }
}

fn builtin_append(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    let mut result = Vec::new();
    for value in values {
        match value.into_list() {
            Ok(items) => result.extend(items),
            Err(other) => return Err(YusoError::type_mismatch(format!("append expects lists, got {}", other))),
        }
    }
    Ok(Value::List(result))
}

fn procedure_and_list(values: &[Value], name: &str) -> Result<(Value, Vec<Value>), YusoError> {
    match (&values[0], &values[1]) {
        (procedure, Value::List(items)) if procedure.is_procedure() => Ok((procedure.clone(), items.clone())),
        (procedure, list) => Err(YusoError::type_mismatch(format!("{} expects a procedure and a list, got {} and {}", name, procedure, list))),
    }
}

fn builtin_map(values: Vec<Value>, ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(2))?;
    let (function, items) = procedure_and_list(&values, "map")?;

    items.into_iter()
        .map(|item| apply(&function, vec![item], ctx))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

fn builtin_filter(values: Vec<Value>, ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(2))?;
    let (function, items) = procedure_and_list(&values, "filter")?;

    let mut kept = Vec::new();
    for item in items {
        match apply(&function, vec![item.clone()], ctx)? {
            Value::Bool(true) => kept.push(item),
            Value::Bool(false) => {}
            other => return Err(YusoError::type_mismatch(format!("filter predicate returned {}", other))),
        }
    }
    Ok(Value::List(kept))
}

fn builtin_reduce(values: Vec<Value>, ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(3))?;
    let (function, items) = procedure_and_list(&values, "reduce")?;

    items.into_iter()
        .try_fold(values[2].clone(), |accumulator, item| apply(&function, vec![accumulator, item], ctx))
}

fn type_predicate(values: Vec<Value>, predicate: fn(&Value) -> bool) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(1))?;
    Ok(Value::Bool(predicate(&values[0])))
}

fn builtin_is_symbol(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    type_predicate(values, |value| matches!(value, Value::Symbol(_)))
}

fn builtin_is_number(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    type_predicate(values, Value::is_number)
}

fn builtin_is_procedure(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    type_predicate(values, Value::is_procedure)
}

fn builtin_is_string(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    type_predicate(values, |value| matches!(value, Value::String(_)))
}

fn builtin_is_boolean(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    type_predicate(values, |value| matches!(value, Value::Bool(_)))
}

// Integers are already whole, so rounding them is the identity.
fn rounding(values: Vec<Value>, f: fn(f64) -> f64) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(1))?;
    match value_list_to_numbers(values)?[0] {
        Number::Integer(value) => Ok(Value::Integer(value)),
        Number::Float(value) => Ok(Value::Float(f(value))),
    }
}

fn builtin_abs(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    expect_arity(&values, Arity::Exactly(1))?;
    match value_list_to_numbers(values)?[0] {
        Number::Integer(value) => value.checked_abs().map(Value::Integer).ok_or(YusoError::ArithmeticOverflow),
        Number::Float(value) => Ok(Value::Float(value.abs())),
    }
}

fn builtin_floor(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    rounding(values, f64::floor)
}

fn builtin_round(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    rounding(values, f64::round)
}

fn builtin_ceil(values: Vec<Value>, _ctx: &mut EvaluationState) -> EvaluationResult {
    rounding(values, f64::ceil)
}

const BUILTINS: &[(&str, PrimitiveFn)] = &[
    ("+", builtin_add),
    ("-", builtin_sub),
    ("*", builtin_mul),
    ("/", builtin_div),

    ("<", builtin_less),
    ("<=", builtin_less_eq),
    (">", builtin_greater),
    (">=", builtin_greater_eq),
    ("=", builtin_eq),
    ("eq?", builtin_eq),
    ("not", builtin_not),

    ("cons", builtin_cons),
    ("list", builtin_list),
    ("car", builtin_car),
    ("cdr", builtin_cdr),
    ("length", builtin_length),
    ("list?", builtin_is_list),
    ("null?", builtin_is_null),
    ("list-ref", builtin_list_ref),
    ("append", builtin_append),
    ("map", builtin_map),
    ("filter", builtin_filter),
    ("reduce", builtin_reduce),

    ("symbol?", builtin_is_symbol),
    ("number?", builtin_is_number),
    ("procedure?", builtin_is_procedure),
    ("string?", builtin_is_string),
    ("boolean?", builtin_is_boolean),

    ("abs", builtin_abs),
    ("floor", builtin_floor),
    ("round", builtin_round),
    ("ceil", builtin_ceil),
];

/// The root frame: every primitive plus `nil`.
pub(crate) fn builtin_frame() -> Env {
    let mut bindings: HashMap<String, Value> = BUILTINS.iter()
        .map(|&(name, function)| (name.to_owned(), Value::Primitive(Primitive { name, function })))
        .collect();
    bindings.insert("nil".to_owned(), Value::Nil);

    Frame::root(bindings)
}
