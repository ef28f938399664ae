use yuso::EvaluationContext;

fn main() {
    let program = vec![
        "(define (spam) (* eggs 3))",
        "(spam)",
        "(define eggs 20)",
        "(spam)",
        "(define (make-counter) (begin (define n 0) (lambda () (begin (set! n (+ n 1)) n))))",
        "(define tick (make-counter))",
        "(list (tick) (tick) (tick))",
    ];

    let mut context = EvaluationContext::new();
    for source in program {
        match context.evaluate_str(source) {
            Ok(value) => println!("{}: {}", source, value),
            Err(err) => println!("{}: {}", source, err)
        }
    }
}
