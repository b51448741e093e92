//! End-to-end scenarios across the bridge: engine and UI halves driven
//! together, on one thread where determinism matters and across real
//! threads where the lifecycle is the point.

use abacus_bridge::{EngineMessage, SharedContext, UiMessage};
use abacus_engine::EngineService;
use abacus_ui::{WidgetRegistry, install_console, pump_frame};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn evaluate(ctx: &SharedContext, expr: &str) {
    ctx.ui_to_engine()
        .push(UiMessage::Evaluate { expr: expr.into() })
        .unwrap();
}

/// Pop the next engine→UI message, waiting for a real engine thread.
fn wait_reply(ctx: &SharedContext) -> EngineMessage {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(msg) = ctx.engine_to_ui().pop() {
            return msg;
        }
        assert!(Instant::now() < deadline, "no reply within 2s");
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// The full create → draw → replace cycle, single-threaded for exact
/// accounting: every exported value must be disposed exactly once, and
/// replacing a widget's data must round-trip the superseded handle.
#[test]
fn replaced_widget_data_is_disposed_exactly_once() {
    let ctx = Arc::new(SharedContext::new(vec![]));
    let mut engine = EngineService::new(Arc::clone(&ctx));
    let mut registry = WidgetRegistry::new();
    install_console(&mut registry);

    evaluate(&ctx, "t: widget[\"table\"; \"T\"]");
    evaluate(&ctx, "draw[t; 1 2 3]");
    engine.drain();
    pump_frame(&ctx, &mut registry);
    engine.drain();
    // Both evaluation results were dropped by the pump; only the table's
    // render data remains exported.
    assert_eq!(engine.store().live_values(), 1);

    evaluate(&ctx, "draw[t; 4 5 6]");
    engine.drain();
    pump_frame(&ctx, &mut registry);
    engine.drain();
    // The superseded vector came back as a Drop and was reclaimed; the
    // replacement is the single live export.
    assert_eq!(engine.store().live_values(), 1);
    assert!(ctx.ui_to_engine().is_empty());
    assert!(ctx.engine_to_ui().is_empty());
}

/// Evaluation against the real engine thread: right-to-left grouping and
/// a clean quit afterwards.
#[test]
fn engine_thread_evaluates_and_quits() {
    let ctx = Arc::new(SharedContext::new(vec!["abacus".into()]));
    let engine = abacus_engine::spawn(Arc::clone(&ctx)).unwrap();
    ctx.wait_ready();
    assert!(!ctx.quit_requested());

    evaluate(&ctx, "2*3+1");
    ctx.wake_engine();
    match wait_reply(&ctx) {
        EngineMessage::Result { line, .. } => assert_eq!(line.text, "8"),
        other => panic!("expected Result, got {other:?}"),
    }

    ctx.request_quit();
    ctx.wake_engine();
    engine.join().unwrap();
}

/// Preloaded scripts run before readiness; their bindings are visible to
/// the first interactive expression.
#[test]
fn preloaded_script_bindings_survive_into_the_session() {
    let mut script = tempfile::NamedTempFile::new().unwrap();
    writeln!(script, "/ startup bindings").unwrap();
    writeln!(script, "x: 1 2 3 + 1").unwrap();
    script.flush().unwrap();

    let ctx = Arc::new(SharedContext::new(vec![
        "abacus".into(),
        script.path().display().to_string(),
    ]));
    let engine = abacus_engine::spawn(Arc::clone(&ctx)).unwrap();
    ctx.wait_ready();
    assert!(!ctx.quit_requested());

    evaluate(&ctx, "x");
    ctx.wake_engine();
    match wait_reply(&ctx) {
        EngineMessage::Result { line, .. } => assert_eq!(line.text, "2 3 4"),
        other => panic!("expected Result, got {other:?}"),
    }

    ctx.request_quit();
    ctx.wake_engine();
    engine.join().unwrap();
}
