//! The engine message pump: executes UI commands, queues replies.
//!
//! Invoked on every wake of the engine loop. Drains the UI→engine queue to
//! empty or until the quit flag becomes visible — the flag is checked
//! before every pop so shutdown stays prompt even with a full queue of
//! unprocessed work.

use crate::eval::{self, EvalError, HostCaps};
use crate::service::EngineService;
use crate::store::ValueStore;
use crate::value::{Value, format_value};
use crate::widget::{EngineWidget, WidgetTable};
use abacus_bridge::{
    ConsoleLine, EngineMessage, SharedContext, UiMessage, UpdatePayload, WidgetId, WidgetKind,
};
use tracing::{debug, warn};

/// The dashboard capabilities scripts reach through `widget` and `draw`.
///
/// Borrowed from the service for the duration of one evaluation; holds the
/// explicit context the capabilities need instead of any thread-local.
struct Capabilities<'a> {
    widgets: &'a mut WidgetTable,
    store: &'a mut ValueStore,
    ctx: &'a SharedContext,
}

impl HostCaps for Capabilities<'_> {
    fn create_widget(&mut self, kind: WidgetKind, name: &str) -> Result<Value, EvalError> {
        let id = self.widgets.insert(EngineWidget::new(kind, name));
        let created = EngineMessage::WidgetCreated {
            widget: id,
            kind,
            name: name.to_string(),
        };
        if self.ctx.engine_to_ui().push(created).is_err() {
            // The UI never learns about this widget; unwind the insert so
            // the table does not accumulate invisible panes.
            self.widgets.remove(id);
            warn!(%id, "engine→UI queue full, widget creation dropped");
            return Err(EvalError::Bridge("engine→UI queue full"));
        }
        debug!(%id, %kind, name, "widget created");
        Ok(Value::Widget {
            id,
            kind,
            name: name.to_string(),
        })
    }

    fn draw(&mut self, widget: WidgetId, value: Value) -> Result<(), EvalError> {
        let entry = self
            .widgets
            .get_mut(widget)
            .ok_or(EvalError::StaleWidget(widget))?;

        // Post-filter runs engine-side, before the value crosses over.
        let display = match &entry.post_filter {
            Some(filter) => eval::eval_filter(filter, value.clone())?,
            None => value.clone(),
        };
        entry.source = Some(value);

        // The text kind receives finished text; every other kind receives
        // an exported value the UI holds as an opaque handle.
        let payload = match entry.kind {
            WidgetKind::Text => UpdatePayload::Text(format_value(&display)),
            _ => UpdatePayload::Value(self.store.export(display)),
        };
        let update = EngineMessage::DataUpdate { widget, payload };
        if let Err(rejected) = self.ctx.engine_to_ui().push(update) {
            // Reclaim the export right here: this is the engine thread,
            // the one place disposal is legal.
            if let EngineMessage::DataUpdate {
                payload: UpdatePayload::Value(handle),
                ..
            } = rejected.0
            {
                self.store.dispose(handle);
            }
            warn!(%widget, "engine→UI queue full, draw dropped");
            return Err(EvalError::Bridge("engine→UI queue full"));
        }
        Ok(())
    }
}

impl EngineService {
    /// Drain the UI→engine queue: to empty, or until quit is requested.
    pub fn drain(&mut self) {
        while !self.ctx.quit_requested() {
            let Some(msg) = self.ctx.ui_to_engine().pop() else {
                break;
            };
            self.handle(msg);
        }
    }

    fn handle(&mut self, msg: UiMessage) {
        match msg {
            UiMessage::Evaluate { expr } => self.handle_evaluate(&expr),
            UiMessage::SetPostFilter { widget, expr } => {
                self.handle_set_post_filter(widget, expr);
            }
            UiMessage::Drop { value } => {
                self.store.dispose(value);
            }
            UiMessage::Quit => {
                debug!("quit command received");
                self.ctx.request_quit();
            }
        }
    }

    /// Evaluate a console expression; push a line back for display.
    pub(crate) fn eval_line(&mut self, expr: &str) -> Result<(), EvalError> {
        let mut caps = Capabilities {
            widgets: &mut self.widgets,
            store: &mut self.store,
            ctx: &self.ctx,
        };
        self.interp.eval(expr, &mut caps).map(|_| ())
    }

    fn handle_evaluate(&mut self, expr: &str) {
        let mut caps = Capabilities {
            widgets: &mut self.widgets,
            store: &mut self.store,
            ctx: &self.ctx,
        };
        match self.interp.eval(expr, &mut caps) {
            Ok(value) => {
                let text = format_value(&value);
                // Export the result so the UI could keep it; the UI sends
                // the handle straight back as a Drop once displayed.
                let handle = self.store.export(value);
                let reply = EngineMessage::Result {
                    line: ConsoleLine::output(text),
                    value: Some(handle),
                };
                if let Err(rejected) = self.ctx.engine_to_ui().push(reply) {
                    if let EngineMessage::Result {
                        value: Some(handle),
                        ..
                    } = rejected.0
                    {
                        self.store.dispose(handle);
                    }
                    warn!("engine→UI queue full, result dropped");
                }
            }
            Err(err) => self.report_error(err.to_string()),
        }
    }

    fn handle_set_post_filter(&mut self, widget: WidgetId, expr: Option<String>) {
        let Some(entry) = self.widgets.get_mut(widget) else {
            warn!(%widget, "set-post-filter for a stale widget");
            return;
        };
        match expr {
            None => {
                entry.post_filter = None;
                debug!(%widget, "post-filter cleared");
            }
            Some(src) => match eval::parse(&src) {
                Ok(filter) => {
                    entry.post_filter = Some(filter);
                    debug!(%widget, filter = %src, "post-filter installed");
                }
                // Parse failure keeps the previous filter; the error
                // result is discarded, not displayed.
                Err(err) => debug!(%widget, %err, "post-filter rejected"),
            },
        }
    }

    /// Push an error line to the console sink.
    pub(crate) fn report_error(&mut self, text: String) {
        let reply = EngineMessage::Result {
            line: ConsoleLine::error(text),
            value: None,
        };
        if self.ctx.engine_to_ui().push(reply).is_err() {
            warn!("engine→UI queue full, error line dropped");
        }
    }
}
