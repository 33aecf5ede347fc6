//! Fixed composition scenarios

use crate::common::*;
use rowgraph::NodeState;

// ============================================================================
// Sequencing
// ============================================================================

#[test]
fn nested_chains_concatenate_results() {
    let mut tx = EchoTx::default();
    let node = TxMonad::query("A").chain(|r| {
        let a = text_of(&r);
        Ok(TxMonad::query("B").chain(move |r2| Ok(Value::from(a + &text_of(&r2)))))
    });

    assert_eq!(node.run_within(&mut tx).unwrap(), Value::from("AB"));
    assert_eq!(tx.executed, vec!["A", "B"]);
}

#[test]
fn join_runs_branches_in_order() {
    let mut tx = EchoTx::default();
    let node = TxMonad::join(TxMonad::query("Hello"), TxMonad::query("World"), |a, b| {
        Ok(TxMonad::query(format!("{} {}", text_of(&a), text_of(&b))))
    })
    .chain(|res| Ok(TxMonad::query(format!("Test {}", text_of(&res)))));

    let value = node.run_within(&mut tx).unwrap();
    assert_eq!(text_of(&value), "Test Hello World");
    assert_eq!(tx.executed, vec!["Hello", "World", "Hello World", "Test Hello World"]);
}

#[test]
fn params_reach_the_executor() {
    let mut tx = EchoTx::default();
    let value = TxMonad::new("SELECT ?", vec![Value::Int(42)])
        .run_within(&mut tx)
        .unwrap();
    let first = &value.as_array().unwrap()[0];
    assert_eq!(first.get("params"), Some(&Value::Array(vec![Value::Int(42)])));
}

// ============================================================================
// Rejection and recovery
// ============================================================================

#[test]
fn catch_recovers_and_later_chain_sees_recovery() {
    let mut tx = EchoTx::default();
    let node = TxMonad::query("fail first")
        .chain(|_| Ok(TxMonad::query("skipped")))
        .catch(|error| {
            assert!(error.is_execution());
            assert_eq!(error.query_text(), Some("fail first"));
            Ok(Value::from("recovered"))
        })
        .chain(|v| Ok(TxMonad::query(format!("after {}", v.as_str().unwrap_or("?")))));

    let value = node.run_within(&mut tx).unwrap();
    assert_eq!(text_of(&value), "after recovered");
    assert_eq!(tx.executed, vec!["fail first", "after recovered"]);
}

#[test]
fn catch_can_resume_with_a_query() {
    let mut tx = EchoTx::default();
    let node = TxMonad::query("fail").catch(|_| Ok(TxMonad::query("fallback")));
    assert_eq!(text_of(&node.run_within(&mut tx).unwrap()), "fallback");
}

#[test]
fn catch_intercepts_once() {
    let mut tx = EchoTx::default();
    let err = TxMonad::query("fail one")
        .catch(|_| Ok(TxMonad::query("fail two")))
        .chain(|_| Ok(TxMonad::query("unreached")))
        .run_within(&mut tx)
        .unwrap_err();
    assert_eq!(err.query_text(), Some("fail two"));
    assert_eq!(tx.executed, vec!["fail one", "fail two"]);
}

#[test]
fn continuation_rejection_propagates() {
    let mut tx = EchoTx::default();
    let err = TxMonad::query("A")
        .chain(|_| -> Result<Value> { Err(Error::rejected("not allowed")) })
        .chain(|_| Ok(TxMonad::query("unreached")))
        .run_within(&mut tx)
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(tx.executed, vec!["A"]);
}

// ============================================================================
// Node states
// ============================================================================

#[test]
fn trace_reports_final_states() {
    let mut tx = EchoTx::default();
    let failing = TxMonad::query("fail");
    let failing_id = failing.id();
    let recovered = failing.catch(|_| Ok(Value::Null));
    let recovered_id = recovered.id();
    let unrelated = TxMonad::query("never bound");

    let (result, trace) = recovered.run_traced(&mut tx);
    assert!(result.is_ok());
    assert_eq!(trace.state(failing_id), NodeState::Rejected);
    assert_eq!(trace.state(recovered_id), NodeState::Resolved);
    assert_eq!(trace.state(unrelated.id()), NodeState::Pending);
    assert_eq!(trace.executed_texts(), vec!["fail"]);
}
