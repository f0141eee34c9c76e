//! End-to-end suite runs against the fake backend.

mod common;

use std::time::Duration;

use common::{amount_screen, caps, endpoint, files_in, manager, new_state, FakeConnector, FakeField};

use apphook_core::artifact::ArtifactSink;
use apphook_core::context::TestContext;
use apphook_core::hooks::{HookEngine, HookError, TestPhase};
use apphook_core::outcome::TestOutcome;
use apphook_core::runner::{Expect, Suite, TestError, TestFuture};

fn amount_100<'a>(ctx: &'a TestContext, expect: &'a mut Expect) -> TestFuture<'a> {
    Box::pin(async move {
        ctx.main_page().set_amount("100").await?;
        let value = ctx.main_page().get_amount().await?;
        expect.truthy("amount", &value);
        Ok(())
    })
}

fn amount_200<'a>(ctx: &'a TestContext, expect: &'a mut Expect) -> TestFuture<'a> {
    Box::pin(async move {
        ctx.main_page().set_amount("200").await?;
        let value = ctx.main_page().get_amount().await?;
        expect.truthy("amount", &value);
        Ok(())
    })
}

fn wrong_amount<'a>(ctx: &'a TestContext, expect: &'a mut Expect) -> TestFuture<'a> {
    Box::pin(async move {
        ctx.main_page().set_amount("100").await?;
        let value = ctx.main_page().get_amount().await?;
        expect.equal(value.as_str(), "999");
        Ok(())
    })
}

fn gives_up<'a>(_ctx: &'a TestContext, _expect: &'a mut Expect) -> TestFuture<'a> {
    Box::pin(async { Err(TestError::Failed("amount field rejected input".into())) })
}

fn hangs<'a>(_ctx: &'a TestContext, _expect: &'a mut Expect) -> TestFuture<'a> {
    Box::pin(async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    })
}

fn sample_suite() -> Suite {
    Suite::new("amount")
        .test("set and read amount (100)", amount_100)
        .test("set and read amount (200)", amount_200)
}

#[tokio::test]
async fn test_sample_suite_passes() {
    let tmp = tempfile::tempdir().unwrap();
    let state = amount_screen();
    let connector = FakeConnector::new(state.clone());
    let mut engine = HookEngine::new(manager(connector.clone()), ArtifactSink::new(tmp.path()));

    let report = sample_suite().run(&mut engine, &endpoint(), &caps()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.passed(), 2);
    assert_eq!(report.tests[0].name, "set and read amount (100)");
    assert_eq!(report.tests[1].name, "set and read amount (200)");
    assert!(report.tests.iter().all(|t| t.artifact.is_none() && t.warnings.is_empty()));
    assert_eq!(report.tests[0].counters.assertion_calls, 1);
    assert_eq!(report.teardown_warning, None);

    // One session for the whole suite, closed at the end.
    assert_eq!(connector.opened(), 1);
    let state = state.lock().unwrap();
    assert_eq!(state.deletes, 1);
    assert_eq!(state.screenshots, 0);
    assert!(engine.context().is_none());
    assert!(files_in(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_failed_assertion_captures_artifact_and_suite_continues() {
    let tmp = tempfile::tempdir().unwrap();
    let state = amount_screen();
    let mut engine = HookEngine::new(manager(FakeConnector::new(state.clone())), ArtifactSink::new(tmp.path()));

    let suite = Suite::new("amount")
        .test("wrong amount", wrong_amount)
        .test("set and read amount (200)", amount_200);
    let report = suite.run(&mut engine, &endpoint(), &caps()).await.unwrap();

    assert!(!report.is_success());
    let failed = &report.tests[0];
    assert_eq!(failed.outcome, TestOutcome::Failed);
    assert!(failed.failure.as_deref().unwrap().contains("\"999\""));
    assert_eq!(failed.counters.passing_asserts, 0);
    let artifact = failed.artifact.as_ref().expect("screenshot for failed test");
    assert_eq!(files_in(tmp.path()), vec![artifact.clone()]);

    // The session stays usable after a failure.
    assert_eq!(report.tests[1].outcome, TestOutcome::Passed);
    assert_eq!(state.lock().unwrap().screenshots, 1);
}

#[tokio::test]
async fn test_error_from_body_fails_test() {
    let tmp = tempfile::tempdir().unwrap();
    let mut engine = HookEngine::new(manager(FakeConnector::new(amount_screen())), ArtifactSink::new(tmp.path()));

    let report = Suite::new("s")
        .test("gives up", gives_up)
        .run(&mut engine, &endpoint(), &caps())
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.tests[0].failure.as_deref(), Some("amount field rejected input"));
    assert!(report.tests[0].artifact.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_missing_field_fails_after_wait_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let state = new_state();
    state
        .lock()
        .unwrap()
        .fields
        .insert("editTextAmount".into(), FakeField::hidden());
    let mut engine = HookEngine::new(manager(FakeConnector::new(state)), ArtifactSink::new(tmp.path()))
        .with_wait_timeout(Duration::from_millis(5000));

    let report = Suite::new("amount")
        .test("set and read amount (100)", amount_100)
        .run(&mut engine, &endpoint(), &caps())
        .await
        .unwrap();

    let test = &report.tests[0];
    assert_eq!(test.outcome, TestOutcome::Failed);
    assert!(test.failure.as_deref().unwrap().contains("amount-field"));
    assert!(test.artifact.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_hanging_test_times_out() {
    let tmp = tempfile::tempdir().unwrap();
    let mut engine = HookEngine::new(manager(FakeConnector::new(amount_screen())), ArtifactSink::new(tmp.path()));

    let suite = Suite::new("s")
        .with_test_timeout(Duration::from_secs(300))
        .test("hangs", hangs)
        .test("set and read amount (100)", amount_100);
    let report = suite.run(&mut engine, &endpoint(), &caps()).await.unwrap();

    assert_eq!(report.tests[0].outcome, TestOutcome::Failed);
    assert_eq!(report.tests[0].failure.as_deref(), Some("test timed out after 300000ms"));
    // Duration is measured on the same clock as the timeout.
    assert!(report.tests[0].duration_ms >= 300_000, "{}", report.tests[0].duration_ms);
    assert!(report.tests[0].duration_ms < 301_000, "{}", report.tests[0].duration_ms);
    assert_eq!(report.tests[1].outcome, TestOutcome::Passed);
    assert!(report.tests[1].duration_ms < 1_000);
}

#[tokio::test]
async fn test_unreachable_server_runs_no_tests() {
    let tmp = tempfile::tempdir().unwrap();
    let connector = FakeConnector::unreachable();
    let mut engine = HookEngine::new(manager(connector.clone()), ArtifactSink::new(tmp.path()));

    let err = sample_suite().run(&mut engine, &endpoint(), &caps()).await.unwrap_err();
    assert!(matches!(err, HookError::Session(_)));
    assert!(engine.context().is_none());
    assert_eq!(engine.phase(), TestPhase::Idle);
    assert_eq!(connector.state.lock().unwrap().finds, 0);
    assert!(files_in(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_suites_do_not_share_context() {
    let tmp = tempfile::tempdir().unwrap();
    let connector = FakeConnector::new(amount_screen());
    let mut engine = HookEngine::new(manager(connector.clone()), ArtifactSink::new(tmp.path()));

    sample_suite().run(&mut engine, &endpoint(), &caps()).await.unwrap();
    sample_suite().run(&mut engine, &endpoint(), &caps()).await.unwrap();

    assert_eq!(connector.opened(), 2);
    assert!(engine.context().is_none());
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let tmp = tempfile::tempdir().unwrap();
    let mut engine = HookEngine::new(manager(FakeConnector::new(amount_screen())), ArtifactSink::new(tmp.path()));

    let report = sample_suite().run(&mut engine, &endpoint(), &caps()).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["suite"], "amount");
    assert_eq!(json["tests"][0]["outcome"], "Passed");
    assert!(json["tests"][0].get("artifact").is_none());
}
