//! Integration tests for one-shot variant elimination

use meml_engine::{eliminate, ElimError, Error, Session, Value, VmError};
use std::cell::RefCell;

#[test]
fn test_only_the_selected_handler_runs() {
    let mut session = Session::new().unwrap();
    session
        .eval_expression("Bool/elim(Bool/True()) { . write(\"no\") } { . write(\"yes\") }")
        .unwrap();
    assert_eq!(session.output(), vec!["yes".to_string()]);
}

#[test]
fn test_handlers_receive_fields() {
    let mut session = Session::new().unwrap();
    let value = session
        .eval_expression("Option/elim(Option/Some(41)) { . 0 } { x. x + 1 }")
        .unwrap();
    assert_eq!(value, Value::Int(42));

    let value = session
        .eval_expression("Pair/elim((1 \"b\")) { x y. y }")
        .unwrap();
    assert_eq!(session.render(&value), "b");
}

#[test]
fn test_elimination_in_a_loop_runs_each_handler_once() {
    let mut session = Session::new().unwrap();
    session
        .load(
            r#"
            fun .describe(o:Option(Int)): Unit =
                Option/elim(o) { . write("none") } { x. write(x) }
            fun main(): Unit =
                Array/to-Iter(@[Option/Some(1) Option/None() Option/Some(3)])
                .for-each(Option/describe)
            "#,
        )
        .unwrap();
    session.run_main().unwrap();
    assert_eq!(
        session.output(),
        vec!["1".to_string(), "none".to_string(), "3".to_string()]
    );
}

#[test]
fn test_box_is_the_only_mutable_cell() {
    let mut session = Session::new().unwrap();
    session
        .load(
            r#"
            fun bump(): Int =
                let(Box/New(1)) λ b.
                b.modify(Int/increment);
                b.modify(Int/increment);
                b.get()
            fun keep(): Array(Int) =
                let(@[1 2]) λ xs.
                let(xs.push(3)) λ -.
                xs
            "#,
        )
        .unwrap();
    assert_eq!(session.call("bump", vec![]).unwrap(), Value::Int(3));
    let kept = session.call("keep", vec![]).unwrap();
    assert_eq!(session.render(&kept), "@[1 2]");
}

#[test]
fn test_unwrap_none_raises() {
    let mut session = Session::new().unwrap();
    let err = session.eval_expression("Option/None().unwrap()").unwrap_err();
    assert!(matches!(err, Error::Runtime(VmError::Host(_))), "got {:?}", err);
    assert_eq!(
        err.to_string(),
        "called `Option/unwrap` on a `None` value"
    );
}

#[test]
fn test_direct_elimination_over_session_classes() {
    let mut session = Session::new().unwrap();
    let value = session.eval_expression("Ordering/Gt()").unwrap();
    let Value::Variant(variant) = &value else {
        panic!("Expected a variant, got {:?}", value);
    };

    let env = session.environment();
    let ordering = env.interner.get("Ordering").unwrap();
    let id = env.types.lookup(ordering).unwrap();
    let class = env.types.variant(id);

    let seen = RefCell::new(Vec::new());
    let log = &seen;
    let mut handlers: Vec<Box<dyn Fn() + '_>> = Vec::new();
    for name in ["lt", "eq", "gt"] {
        handlers.push(Box::new(move || log.borrow_mut().push(name)));
    }

    let suspended = eliminate(class, variant, handlers).unwrap();
    assert_eq!(suspended.tag(), 2);
    assert!(seen.borrow().is_empty());
    suspended.resume(|handler, fields| {
        assert!(fields.is_empty());
        handler()
    });
    assert_eq!(*seen.borrow(), vec!["gt"]);

    let err = eliminate(class, variant, vec![(), ()]).unwrap_err();
    assert_eq!(err, ElimError::ArityMismatch { expected: 3, found: 2 });
}

#[test]
fn test_foreign_variant_is_rejected() {
    let mut session = Session::new().unwrap();
    let value = session.eval_expression("Bool/True()").unwrap();
    let Value::Variant(variant) = &value else {
        panic!("Expected a variant, got {:?}", value);
    };

    let env = session.environment();
    let option = env.interner.get("Option").unwrap();
    let class = env.types.variant(env.types.lookup(option).unwrap());
    let err = eliminate(class, variant, vec![(), ()]).unwrap_err();
    assert!(matches!(err, ElimError::ForeignVariant { .. }));
}
