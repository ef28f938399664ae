use core::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::{
    error::{Arity, YusoError},
    frame::{Env, Frame},
    stack::ensure_sufficient_stack,
    value::Value,
};

pub(crate) type EvaluationResult = Result<Value, YusoError>;


/// Per-evaluation bookkeeping threaded through every call, including calls
/// made from inside primitives such as `map`. Text printed by the program
/// collects in `output` until the caller takes it.
pub(crate) struct EvaluationState {
    depth: usize,
    max_depth: usize,
    output: String,
}

impl EvaluationState {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self { depth: 0, max_depth, output: String::new() }
    }

    pub(crate) fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn enter(&mut self) -> Result<(), YusoError> {
        if self.depth >= self.max_depth {
            warn!(max_depth = self.max_depth, "evaluation depth limit reached");
            return Err(YusoError::RecursionLimit(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// A procedure written in the language itself. The environment is the one
/// that was active when the `lambda` was evaluated.
pub struct Closure {
    parameters: Vec<String>,
    body: Value,
    environment: Env,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl Closure {
    fn allocate(parameters: Vec<String>, body: Value, environment: &Env) -> Value {
        Value::Closure(Rc::new(Self {
            parameters,
            body,
            environment: Env::clone(environment),
        }))
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    fn evaluate(&self, values: Vec<Value>, ctx: &mut EvaluationState) -> EvaluationResult {
        if values.len() != self.parameters.len() {
            return Err(YusoError::ArityMismatch {
                expected: Arity::Exactly(self.parameters.len()),
                got: values.len(),
            });
        }

        let environment = Frame::new(&self.environment);
        for (parameter, value) in self.parameters.iter().zip(values) {
            environment.insert(parameter.as_str(), value);
        }

        evaluate(&self.body, &environment, ctx)
    }
}

/// Calls `procedure` with already evaluated arguments.
pub(crate) fn apply(procedure: &Value, values: Vec<Value>, ctx: &mut EvaluationState) -> EvaluationResult {
    match procedure {
        Value::Primitive(primitive) => {
            trace!(name = primitive.name, arguments = values.len(), "calling primitive");
            (primitive.function)(values, ctx)
        }
        Value::Closure(closure) => {
            trace!(arguments = values.len(), "calling closure");
            closure.evaluate(values, ctx)
        }
        other => Err(YusoError::type_mismatch(format!("{} is not a procedure", other))),
    }
}

fn symbol_list_to_names(list: &[Value]) -> Result<Vec<String>, YusoError> {
    list.iter()
        .map(|value| match value {
            Value::Symbol(name) => Ok(name.clone()),
            other => Err(YusoError::syntax(format!("expected a parameter name, found {}", other))),
        }).collect()
}

fn evaluate_quote(list: &[Value]) -> EvaluationResult {
    match list {
        [quoted] => Ok(quoted.clone()),
        _ => Err(YusoError::syntax("quote expects exactly one operand")),
    }
}

fn evaluate_define(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    // Either `(define name expr)`, or the shorthand `(define (name params...) body)`
    // which binds a closure. Both bind in the current frame only.

    match list {
        [Value::Symbol(name), expression] => {
            let value = evaluate(expression, environment, ctx)?;
            debug!(name = name.as_str(), "define");
            environment.insert(name.as_str(), value.clone());
            Ok(value)
        }
        [Value::List(signature), body] => {
            let mut names = symbol_list_to_names(signature)?;
            if names.is_empty() { return Err(YusoError::syntax("define needs a procedure name")); }
            let name = names.remove(0);

            let function = Closure::allocate(names, body.clone(), environment);
            debug!(name = name.as_str(), "define procedure");
            environment.insert(name, function.clone());
            Ok(function)
        }
        _ => Err(YusoError::syntax("define expects a name and an expression")),
    }
}

fn evaluate_set_bang(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    let [Value::Symbol(name), expression] = list else {
        return Err(YusoError::syntax("set! expects a name and an expression"));
    };

    let value = evaluate(expression, environment, ctx)?;
    debug!(name = name.as_str(), "set!");
    environment.update(name, value)
}

fn evaluate_if(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    // Only `#t` selects the consequent. Anything else falls through to the
    // alternative, or to nil when there is none.

    let (condition, consequent, alternative) = match list {
        [condition, consequent] => (condition, consequent, None),
        [condition, consequent, alternative] => (condition, consequent, Some(alternative)),
        _ => return Err(YusoError::syntax("if expects a condition and one or two branches")),
    };

    match (evaluate(condition, environment, ctx)?, alternative) {
        (Value::Bool(true), _) => evaluate(consequent, environment, ctx),
        (_, Some(alternative)) => evaluate(alternative, environment, ctx),
        (_, None) => Ok(Value::Nil),
    }
}

fn evaluate_lambda(list: &[Value], environment: &Env) -> EvaluationResult {
    let [Value::List(parameters), body] = list else {
        return Err(YusoError::syntax("lambda expects a parameter list and a body"));
    };

    Ok(Closure::allocate(symbol_list_to_names(parameters)?, body.clone(), environment))
}

fn evaluate_begin(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    let Some((last, init)) = list.split_last() else {
        return Err(YusoError::syntax("begin needs at least one expression"));
    };

    for expression in init {
        evaluate(expression, environment, ctx)?;
    }
    evaluate(last, environment, ctx)
}

fn evaluate_let_binding(binding: &Value, environment: &Env, ctx: &mut EvaluationState) -> Result<(String, Value), YusoError> {
    let Value::List(pair) = binding else {
        return Err(YusoError::syntax("let binding must be a (name expression) pair"));
    };
    let [Value::Symbol(name), expression] = pair.as_slice() else {
        return Err(YusoError::syntax("let binding must be a (name expression) pair"));
    };

    Ok((name.clone(), evaluate(expression, environment, ctx)?))
}

fn evaluate_let(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    // Every binding is evaluated in the outer environment, then the body runs
    // in a fresh frame holding all of them.

    let [Value::List(bindings), body] = list else {
        return Err(YusoError::syntax("let expects a binding list and a body"));
    };

    let bindings = bindings.iter()
        .map(|binding| evaluate_let_binding(binding, environment, ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let sub_environment = Frame::new(environment);
    for (name, value) in bindings {
        sub_environment.insert(name, value);
    }

    evaluate(body, &sub_environment, ctx)
}

fn evaluate_and(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    for expression in list {
        match evaluate(expression, environment, ctx)? {
            Value::Bool(false) => return Ok(Value::Bool(false)),
            Value::Bool(true) => {}
            other => return Err(YusoError::type_mismatch(format!("and expects booleans, got {}", other))),
        }
    }

    Ok(Value::Bool(true))
}

fn evaluate_or(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    for expression in list {
        match evaluate(expression, environment, ctx)? {
            Value::Bool(true) => return Ok(Value::Bool(true)),
            Value::Bool(false) => {}
            other => return Err(YusoError::type_mismatch(format!("or expects booleans, got {}", other))),
        }
    }

    Ok(Value::Bool(false))
}

fn evaluate_dump_frame(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    if !list.is_empty() { return Err(YusoError::syntax("dump-frame takes no operands")); }

    for (name, value) in environment.bindings() {
        ctx.output.push_str(&format!("{} = {}\n", name, value));
    }
    Ok(Value::Nil)
}

fn evaluate_list(list: &[Value], environment: &Env, ctx: &mut EvaluationState) -> Result<Vec<Value>, YusoError> {
    list.iter()
        .map(|expression| evaluate(expression, environment, ctx))
        .collect()
}

fn evaluate_expression(expression: &[Value], environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    // Special forms are recognised by their leading keyword before anything
    // is evaluated. Everything else is a call: the head must evaluate to a
    // procedure, which receives the remaining elements evaluated left to right.

    let Some((head, rest)) = expression.split_first() else {
        return Ok(Value::Nil);
    };

    if let Value::Symbol(keyword) = head {
        match keyword.as_str() {
            "quote" => return evaluate_quote(rest),
            "define" => return evaluate_define(rest, environment, ctx),
            "set!" => return evaluate_set_bang(rest, environment, ctx),
            "if" => return evaluate_if(rest, environment, ctx),
            "lambda" => return evaluate_lambda(rest, environment),
            "begin" => return evaluate_begin(rest, environment, ctx),
            "let" => return evaluate_let(rest, environment, ctx),
            "and" => return evaluate_and(rest, environment, ctx),
            "or" => return evaluate_or(rest, environment, ctx),
            "dump-frame" => return evaluate_dump_frame(rest, environment, ctx),
            _ => {}
        }
    }

    let procedure = evaluate(head, environment, ctx)?;
    let values = evaluate_list(rest, environment, ctx)?;
    apply(&procedure, values, ctx)
}

pub(crate) fn evaluate(expression: &Value, environment: &Env, ctx: &mut EvaluationState) -> EvaluationResult {
    ctx.enter()?;
    let result = ensure_sufficient_stack(|| match expression {
        Value::Symbol(name) => environment.get(name),
        Value::List(list) => evaluate_expression(list, environment, ctx),
        atom => Ok(atom.clone()),
    });
    ctx.leave();
    result
}



#[cfg(test)]
mod tests {
    use crate::{builtin::builtin_frame, parser::read};

    use super::*;

    fn run(environment: &Env, source: &str) -> EvaluationResult {
        let mut ctx = EvaluationState::new(1_000);
        evaluate(&read(source)?, environment, &mut ctx)
    }

    fn run_all(sources: &[&str]) -> EvaluationResult {
        let environment = Frame::new(&builtin_frame());
        let (last, init) = sources.split_last().expect("at least one source");
        for source in init {
            run(&environment, source)?;
        }
        run(&environment, last)
    }

    #[test]
    fn atoms_evaluate_to_themselves() {
        assert_eq!(run_all(&["7"]), Ok(Value::Integer(7)));
        assert_eq!(run_all(&["\"text\""]), Ok(Value::string("text")));
        assert_eq!(run_all(&["#f"]), Ok(Value::Bool(false)));
        assert_eq!(run_all(&["()"]), Ok(Value::Nil));
    }

    #[test]
    fn quote_returns_syntax() {
        assert_eq!(
            run_all(&["(quote (a 1))"]),
            Ok(Value::List(vec![Value::symbol("a"), Value::Integer(1)]))
        );
        assert_eq!(run_all(&["(quote undefined-name)"]), Ok(Value::symbol("undefined-name")));
    }

    #[test]
    fn define_then_lookup() {
        assert_eq!(run_all(&["(define x 5)", "x"]), Ok(Value::Integer(5)));
        assert_eq!(run_all(&["(define x 5)"]), Ok(Value::Integer(5)));
    }

    #[test]
    fn unbound_symbol() {
        assert_eq!(run_all(&["nope"]), Err(YusoError::UnboundSymbol("nope".into())));
        assert_eq!(run_all(&["(set! nope 1)"]), Err(YusoError::UnboundSymbol("nope".into())));
    }

    #[test]
    fn define_binds_in_current_frame_only() {
        assert_eq!(
            run_all(&[
                "(define x 1)",
                "(define f (lambda () (define x 2)))",
                "(f)",
                "x",
            ]),
            Ok(Value::Integer(1))
        );
    }

    #[test]
    fn set_bang_reaches_enclosing_frame() {
        assert_eq!(
            run_all(&[
                "(define count 0)",
                "(define bump (lambda () (set! count (+ count 1))))",
                "(bump)",
                "(bump)",
                "count",
            ]),
            Ok(Value::Integer(2))
        );
    }

    #[test]
    fn closures_are_lexically_scoped() {
        assert_eq!(
            run_all(&[
                "(define n 10)",
                "(define add-n (lambda (x) (+ x n)))",
                "(define call-with-n (lambda (n) (add-n 1)))",
                "(call-with-n 100)",
            ]),
            Ok(Value::Integer(11))
        );
    }

    #[test]
    fn closures_keep_their_frame_alive() {
        assert_eq!(
            run_all(&[
                "(define make-counter (lambda () (begin (define c 0) (lambda () (begin (set! c (+ c 1)) c)))))",
                "(define tick (make-counter))",
                "(tick)",
                "(tick)",
            ]),
            Ok(Value::Integer(2))
        );
    }

    #[test]
    fn each_lambda_evaluation_is_a_new_closure() {
        assert_eq!(
            run_all(&[
                "(define make-adder (lambda (n) (lambda (x) (+ x n))))",
                "(define add2 (make-adder 2))",
                "(define add5 (make-adder 5))",
                "(list (add2 1) (add5 1) (eq? add2 add5))",
            ]),
            Ok(Value::List(vec![Value::Integer(3), Value::Integer(6), Value::Bool(false)]))
        );
    }

    #[test]
    fn if_only_evaluates_the_taken_branch() {
        assert_eq!(run_all(&["(if (< 1 2) \"yes\" \"no\")"]), Ok(Value::string("yes")));
        assert_eq!(
            run_all(&["(if #t 1 (define leaked 2))", "leaked"]),
            Err(YusoError::UnboundSymbol("leaked".into()))
        );
        assert_eq!(run_all(&["(if 0 1 2)"]), Ok(Value::Integer(2)));
        assert_eq!(run_all(&["(if #f 1)"]), Ok(Value::Nil));
    }

    #[test]
    fn begin_returns_last() {
        assert_eq!(run_all(&["(begin (define a 1) (define b 2) (+ a b))"]), Ok(Value::Integer(3)));
        assert!(matches!(run_all(&["(begin)"]), Err(YusoError::SyntaxError(_))));
    }

    #[test]
    fn define_shorthand_and_let() {
        assert_eq!(run_all(&["(define (square x) (* x x))", "(square 7)"]), Ok(Value::Integer(49)));
        assert_eq!(run_all(&["(define x 1)", "(let ((x 2) (y x)) (+ x y))"]), Ok(Value::Integer(3)));
    }

    #[test]
    fn and_or_short_circuit() {
        assert_eq!(run_all(&["(and #t #f undefined)"]), Ok(Value::Bool(false)));
        assert_eq!(run_all(&["(or #f #t undefined)"]), Ok(Value::Bool(true)));
        assert!(matches!(run_all(&["(and 1)"]), Err(YusoError::TypeMismatch(_))));
    }

    #[test]
    fn dump_frame_prints_the_current_frame() -> anyhow::Result<()> {
        let environment = Frame::new(&builtin_frame());
        let mut ctx = EvaluationState::new(1_000);
        for source in ["(define y (list 1 2))", "(define x 1)"] {
            evaluate(&read(source)?, &environment, &mut ctx)?;
        }

        assert_eq!(evaluate(&read("(dump-frame)")?, &environment, &mut ctx), Ok(Value::Nil));
        assert_eq!(ctx.take_output(), "x = 1\ny = (1 2)\n");

        assert_eq!(evaluate(&read("(let ((z #t)) (dump-frame))")?, &environment, &mut ctx), Ok(Value::Nil));
        assert_eq!(ctx.take_output(), "z = #t\n");

        assert!(matches!(run_all(&["(dump-frame x)"]), Err(YusoError::SyntaxError(_))));
        Ok(())
    }

    #[test]
    fn arity_mismatch() {
        assert_eq!(
            run_all(&["(define add1 (lambda (n) (+ n 1)))", "(add1 1 2)"]),
            Err(YusoError::ArityMismatch { expected: Arity::Exactly(1), got: 2 })
        );
    }

    #[test]
    fn calling_a_non_procedure() {
        assert!(matches!(run_all(&["(1 2)"]), Err(YusoError::TypeMismatch(_))));
    }

    #[test]
    fn malformed_special_forms() {
        for source in ["(quote)", "(define 1 2)", "(lambda x x)", "(set! 1 2)", "(if #t)", "(let (x) x)"] {
            assert!(matches!(run_all(&[source]), Err(YusoError::SyntaxError(_))), "{}", source);
        }
    }

    #[test]
    fn runaway_recursion_is_reported() -> anyhow::Result<()> {
        let environment = Frame::new(&builtin_frame());
        let mut ctx = EvaluationState::new(1_000);
        for source in ["(define (loop n) (+ 1 (loop n)))", "(define (f n) (if (= n 0) 0 (+ 1 (f (- n 1)))))"] {
            evaluate(&read(source)?, &environment, &mut ctx)?;
        }

        assert_eq!(evaluate(&read("(loop 0)")?, &environment, &mut ctx), Err(YusoError::RecursionLimit(1_000)));
        assert_eq!(ctx.depth, 0);
        assert_eq!(evaluate(&read("(f 50)")?, &environment, &mut ctx), Ok(Value::Integer(50)));
        Ok(())
    }

    #[test]
    fn deeply_nested_results_are_not_a_crash() {
        let source = [
            "(define l (list 1 1))",
            "(set! l (append l l l l))",
            "(set! l (append l l l l))",
            "(set! l (append l l l l))",
            "(set! l (append l l l l))",
            "(set! l (append l l l l))",
            "(set! l (append l l l l))",
            "(set! l (append l l l l))",
            "(set! l (append l l l l))",
            "(set! l (append l l))",
            "(length l)",
        ];
        assert_eq!(run_all(&source), Ok(Value::Integer(262_144)));

        let mut lists = source.to_vec();
        lists.push("(define deep (reduce (lambda (acc x) (list acc)) l nil))");
        lists.push("(eq? deep (car (list deep)))");
        assert_eq!(run_all(&lists), Ok(Value::Bool(true)));

        let mut closures = source.to_vec();
        closures.push("(procedure? (reduce (lambda (acc x) (lambda () acc)) l nil))");
        assert_eq!(run_all(&closures), Ok(Value::Bool(true)));
    }
}
