//! The UI message pump: one bounded drain per rendered frame.
//!
//! Bounding the batch keeps frame time predictable when the engine is
//! producing faster than the UI draws; whatever is left stays queued for
//! the next frame. Every engine value superseded while applying a batch is
//! forwarded straight back as a `Drop` command — the UI thread never
//! disposes of one itself, not even on error paths.

use crate::registry::{DataSwap, WidgetRegistry};
use crate::widget::{PaneState, UiWidget};
use abacus_bridge::{
    EngineMessage, QueueFull, SharedContext, UiMessage, UpdatePayload, ValueHandle, WidgetKind,
};
use tracing::{debug, warn};

/// Engine messages applied per frame, at most.
pub const MAX_MESSAGES_PER_FRAME: usize = 64;

/// Drain up to [`MAX_MESSAGES_PER_FRAME`] engine messages into the
/// registry. Returns the number applied.
pub fn pump_frame(ctx: &SharedContext, registry: &mut WidgetRegistry) -> usize {
    pump_frame_with_budget(ctx, registry, MAX_MESSAGES_PER_FRAME)
}

/// [`pump_frame`] with an explicit batch budget.
pub fn pump_frame_with_budget(
    ctx: &SharedContext,
    registry: &mut WidgetRegistry,
    budget: usize,
) -> usize {
    let mut applied = 0;
    while applied < budget {
        let Some(msg) = ctx.engine_to_ui().pop() else {
            break;
        };
        apply(ctx, registry, msg);
        applied += 1;
    }
    applied
}

fn apply(ctx: &SharedContext, registry: &mut WidgetRegistry, msg: EngineMessage) {
    match msg {
        EngineMessage::WidgetCreated { widget, kind, name } => {
            registry.add(UiWidget::new(widget, kind, name));
        }
        EngineMessage::DataUpdate { widget, payload } => match payload {
            UpdatePayload::Text(text) => apply_text(registry, widget, text),
            UpdatePayload::Value(value) => match registry.update_data(widget, value) {
                DataSwap::Superseded(old) => forward_drop(ctx, old),
                DataSwap::NoSuchWidget(undelivered) => forward_drop(ctx, undelivered),
                DataSwap::Fresh | DataSwap::Unchanged => {}
            },
        },
        EngineMessage::Result { line, value } => {
            registry.console_push(line);
            if let Some(value) = value {
                forward_drop(ctx, value);
            }
        }
    }
}

fn apply_text(registry: &mut WidgetRegistry, widget: abacus_bridge::WidgetId, text: String) {
    match registry.get_mut(widget) {
        Some(pane) => match &mut pane.state {
            PaneState::Text(state) => state.body = text,
            _ => warn!(%widget, kind = %pane.kind(), "text payload for a non-text pane"),
        },
        None => debug!(%widget, "text update for unknown widget"),
    }
}

/// Send a superseded engine value back for disposal and wake the engine.
///
/// If the UI→engine queue is full the handle is dropped here instead:
/// the runtime value stays resident in the engine store until session end
/// (a leak, logged) — the one thing this function will never do is free
/// it on this thread.
fn forward_drop(ctx: &SharedContext, value: ValueHandle) {
    match ctx.ui_to_engine().push(UiMessage::Drop { value }) {
        Ok(()) => {
            ctx.wake_engine();
        }
        Err(QueueFull(UiMessage::Drop { value })) => {
            warn!(id = value.raw(), "command queue full, leaking engine value");
        }
        Err(QueueFull(_)) => unreachable!("push returns the rejected message"),
    }
}

/// Register the built-in console pane, present from the first frame.
pub fn install_console(registry: &mut WidgetRegistry) {
    registry.add(UiWidget::new(
        abacus_bridge::WidgetId::detached(),
        WidgetKind::Console,
        "console",
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use abacus_bridge::{ConsoleLine, ConsoleTag, WidgetId};

    fn ctx() -> SharedContext {
        SharedContext::new(vec![])
    }

    fn send(ctx: &SharedContext, msg: EngineMessage) {
        ctx.engine_to_ui().push(msg).unwrap();
    }

    #[test]
    fn widget_created_registers_a_pane() {
        let ctx = ctx();
        let mut reg = WidgetRegistry::new();
        send(
            &ctx,
            EngineMessage::WidgetCreated {
                widget: WidgetId::new(0, 0),
                kind: WidgetKind::Table,
                name: "T".into(),
            },
        );
        assert_eq!(pump_frame(&ctx, &mut reg), 1);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(WidgetId::new(0, 0)).unwrap().name(), "T");
    }

    #[test]
    fn superseded_data_comes_back_as_exactly_one_drop() {
        let ctx = ctx();
        let mut reg = WidgetRegistry::new();
        let id = WidgetId::new(0, 0);
        send(
            &ctx,
            EngineMessage::WidgetCreated {
                widget: id,
                kind: WidgetKind::Chart,
                name: "C".into(),
            },
        );
        send(
            &ctx,
            EngineMessage::DataUpdate {
                widget: id,
                payload: UpdatePayload::Value(ValueHandle::from_raw(1)),
            },
        );
        send(
            &ctx,
            EngineMessage::DataUpdate {
                widget: id,
                payload: UpdatePayload::Value(ValueHandle::from_raw(2)),
            },
        );
        pump_frame(&ctx, &mut reg);

        // The first value was superseded by the second: one Drop, for it.
        match ctx.ui_to_engine().pop() {
            Some(UiMessage::Drop { value }) => assert_eq!(value.raw(), 1),
            other => panic!("expected one Drop, got {other:?}"),
        }
        assert!(ctx.ui_to_engine().is_empty());
        assert_eq!(reg.get(id).unwrap().render_data().unwrap().raw(), 2);
    }

    #[test]
    fn text_updates_replace_the_body_without_drops() {
        let ctx = ctx();
        let mut reg = WidgetRegistry::new();
        let id = WidgetId::new(0, 0);
        send(
            &ctx,
            EngineMessage::WidgetCreated {
                widget: id,
                kind: WidgetKind::Text,
                name: "label".into(),
            },
        );
        send(
            &ctx,
            EngineMessage::DataUpdate {
                widget: id,
                payload: UpdatePayload::Text("42".into()),
            },
        );
        pump_frame(&ctx, &mut reg);
        match &reg.get(id).unwrap().state {
            PaneState::Text(state) => assert_eq!(state.body, "42"),
            other => panic!("expected text state, got {other:?}"),
        }
        assert!(ctx.ui_to_engine().is_empty());
    }

    #[test]
    fn results_land_in_the_console_and_return_their_value() {
        let ctx = ctx();
        let mut reg = WidgetRegistry::new();
        install_console(&mut reg);
        send(
            &ctx,
            EngineMessage::Result {
                line: ConsoleLine::output("2"),
                value: Some(ValueHandle::from_raw(5)),
            },
        );
        pump_frame(&ctx, &mut reg);

        let pane = reg.find_by_kind(WidgetKind::Console).unwrap();
        match &pane.state {
            PaneState::Console(console) => {
                let line = console.lines().next().unwrap();
                assert_eq!(line.tag, ConsoleTag::Output);
                assert_eq!(line.text, "2");
            }
            other => panic!("expected console state, got {other:?}"),
        }
        match ctx.ui_to_engine().pop() {
            Some(UiMessage::Drop { value }) => assert_eq!(value.raw(), 5),
            other => panic!("expected a Drop, got {other:?}"),
        }
    }

    #[test]
    fn batch_budget_leaves_the_rest_for_next_frame() {
        let ctx = ctx();
        let mut reg = WidgetRegistry::new();
        install_console(&mut reg);
        for i in 0..10 {
            send(
                &ctx,
                EngineMessage::Result {
                    line: ConsoleLine::output(format!("{i}")),
                    value: None,
                },
            );
        }
        assert_eq!(pump_frame_with_budget(&ctx, &mut reg, 4), 4);
        assert_eq!(ctx.engine_to_ui().len(), 6);
        assert_eq!(pump_frame_with_budget(&ctx, &mut reg, 64), 6);
    }

    #[test]
    fn full_command_queue_leaks_rather_than_frees() {
        let ctx = SharedContext::with_queue_capacity(vec![], 2);
        let mut reg = WidgetRegistry::new();
        let id = WidgetId::new(0, 0);
        reg.add(UiWidget::new(id, WidgetKind::Chart, "C"));
        reg.update_data(id, ValueHandle::from_raw(1));

        // Occupy the single usable UI→engine slot.
        ctx.ui_to_engine()
            .push(UiMessage::Evaluate { expr: "1".into() })
            .unwrap();
        send(
            &ctx,
            EngineMessage::DataUpdate {
                widget: id,
                payload: UpdatePayload::Value(ValueHandle::from_raw(2)),
            },
        );
        pump_frame(&ctx, &mut reg);

        // The superseded handle could not be forwarded; it was leaked in
        // place, and nothing else was pushed.
        assert_eq!(ctx.ui_to_engine().len(), 1);
        assert_eq!(reg.get(id).unwrap().render_data().unwrap().raw(), 2);
    }
}
