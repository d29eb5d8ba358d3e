//! Integration tests for the fixture file and the `@Fails` protocol

use meml_engine::parser::checker::FixtureReport;
use meml_engine::{CheckError, Error, Session, Value};

const CHECKS: &str = include_str!("fixtures/checks.meml");

#[test]
fn test_fixture_checks_with_one_expected_failure() {
    let mut session = Session::new().unwrap();
    let report = session.load(CHECKS).unwrap();
    assert_eq!(
        report,
        FixtureReport {
            checked: 10,
            expected_failures: 1,
        }
    );
}

#[test]
fn test_fixture_main_runs() {
    let mut session = Session::new().unwrap();
    session.load(CHECKS).unwrap();
    session.run_main().unwrap();
    assert_eq!(
        session.output(),
        vec!["@[1 2 3]".to_string(), "@[2 3 4]".to_string()]
    );
}

#[test]
fn test_expected_failure_is_not_registered() {
    let mut session = Session::new().unwrap();
    session.load(CHECKS).unwrap();
    let err = session.evaluate("f").unwrap_err();
    assert!(matches!(err, Error::Runtime(_)), "got {:?}", err);
    assert_eq!(session.evaluate("-check-let2").unwrap(), Value::Int(1));
}

#[test]
fn test_sorted_tuple_type() {
    let mut session = Session::new().unwrap();
    session.load(CHECKS).unwrap();
    let ty = session
        .eval_expression("tuple-type(@[Int String Bool].sorted(compareTypes))")
        .unwrap();
    assert_eq!(session.render(&ty), "Pair(Bool Pair(Int String))");

    let value = session.evaluate("-tuple-of-stuffs").unwrap();
    assert_eq!(
        session.render(&value),
        "Pair/New(Bool/True() Pair/New(1 string here))"
    );
}

#[test]
fn test_fails_on_checking_declaration_is_a_harness_failure() {
    let mut session = Session::new().unwrap();
    let err = session
        .load("@Fails(error: nothing wrong)\nlet fine: Int = 1")
        .unwrap_err();
    match err {
        Error::Check(CheckError::UnexpectedSuccess { expected, .. }) => {
            assert_eq!(expected, "nothing wrong");
        }
        other => panic!("Expected UnexpectedSuccess, got {:?}", other),
    }
    // The declaration that checked anyway is not kept either.
    assert!(session.evaluate("fine").is_err());
}

#[test]
fn test_fails_with_other_message_is_a_harness_failure() {
    let mut session = Session::new().unwrap();
    let err = session
        .load("@Fails(error: `Int' is not a subtype of `Bool')\nlet n: String = 1")
        .unwrap_err();
    match err {
        Error::Check(CheckError::WrongDiagnostic { expected, found, .. }) => {
            assert_eq!(expected, "`Int' is not a subtype of `Bool'");
            assert_eq!(found, "`Int' is not a subtype of `String'");
        }
        other => panic!("Expected WrongDiagnostic, got {:?}", other),
    }
}

#[test]
fn test_fails_without_prefix() {
    let mut session = Session::new().unwrap();
    let report = session
        .load("@Fails(undefined variable `nope')\nlet n: Int = nope")
        .unwrap();
    assert_eq!(report.expected_failures, 1);
}

#[test]
fn test_fails_on_class_is_a_parse_error() {
    let mut session = Session::new().unwrap();
    let err = session.load("@Fails(error: x)\nclass Thing end").unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "got {:?}", err);
}
