//! Runtime values and their display formatting.
//!
//! Formatting lives here, on the engine side, because only the engine can
//! look inside a value; the UI receives finished text.

use abacus_bridge::{WidgetId, WidgetKind};
use std::fmt::Write as _;

/// A value in the array runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// 64-bit integer atom.
    Int(i64),
    /// Double-precision float atom.
    Float(f64),
    /// Character string atom.
    Str(String),
    /// Homogeneous integer vector.
    IntVec(Vec<i64>),
    /// Homogeneous float vector.
    FloatVec(Vec<f64>),
    /// General list of mixed values.
    List(Vec<Value>),
    /// A dashboard widget handle, as returned by the `widget` capability.
    Widget {
        /// Bridge-visible id.
        id: WidgetId,
        /// Display kind.
        kind: WidgetKind,
        /// Display name.
        name: String,
    },
}

impl Value {
    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::IntVec(_) => "int vector",
            Value::FloatVec(_) => "float vector",
            Value::List(_) => "list",
            Value::Widget { .. } => "widget",
        }
    }
}

/// Format a value the way the console shows it.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => format!("\"{s}\""),
        Value::IntVec(items) => format_vector(items.iter()),
        Value::FloatVec(items) => format_vector(items.iter()),
        Value::List(items) => {
            let mut out = String::from("(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                out.push_str(&format_value(item));
            }
            out.push(')');
            out
        }
        Value::Widget { kind, name, .. } => format!("widget<{kind}:\"{name}\">"),
    }
}

fn format_vector<T: std::fmt::Display>(items: impl ExactSizeIterator<Item = T>) -> String {
    if items.len() == 0 {
        return "()".to_string();
    }
    let mut out = String::new();
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{item}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_format_plainly() {
        assert_eq!(format_value(&Value::Int(2)), "2");
        assert_eq!(format_value(&Value::Float(2.5)), "2.5");
        assert_eq!(format_value(&Value::Str("hi".into())), "\"hi\"");
    }

    #[test]
    fn vectors_format_space_separated() {
        assert_eq!(format_value(&Value::IntVec(vec![1, 2, 3])), "1 2 3");
        assert_eq!(format_value(&Value::IntVec(vec![])), "()");
    }

    #[test]
    fn lists_format_parenthesized() {
        let v = Value::List(vec![Value::Int(1), Value::IntVec(vec![2, 3])]);
        assert_eq!(format_value(&v), "(1;2 3)");
    }

    #[test]
    fn widgets_format_with_kind_and_name() {
        let v = Value::Widget {
            id: WidgetId::new(0, 0),
            kind: WidgetKind::Table,
            name: "trades".into(),
        };
        assert_eq!(format_value(&v), "widget<table:\"trades\">");
    }
}
