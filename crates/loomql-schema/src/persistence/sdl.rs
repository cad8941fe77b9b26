//! GraphQL SDL rendering of persisted factories.

use std::fmt::Write;

use serde_json::Value;

use super::factory::{ArgumentFactory, FieldFactory, TypeFactory};

/// Renders every type as SDL, in artifact order, separated by blank lines.
pub fn print_sdl(types: &[TypeFactory]) -> String {
    let blocks: Vec<String> = types.iter().map(print_type).collect();
    let mut sdl = blocks.join("\n");
    if !sdl.is_empty() {
        sdl.push('\n');
    }
    sdl
}

fn print_type(ty: &TypeFactory) -> String {
    let mut out = String::new();
    print_description(&mut out, ty.description(), "");

    match ty {
        TypeFactory::Object {
            name,
            is_input,
            interfaces,
            fields,
            ..
        } => {
            let keyword = if *is_input { "input" } else { "type" };
            let _ = write!(out, "{keyword} {name}");
            if !interfaces.is_empty() {
                let _ = write!(out, " implements {}", interfaces.join(" & "));
            }
            print_fields(&mut out, fields);
        }
        TypeFactory::Interface { name, fields, .. } => {
            let _ = write!(out, "interface {name}");
            print_fields(&mut out, fields);
        }
        TypeFactory::Union { name, types, .. } => {
            let _ = writeln!(out, "union {name} = {}", types.join(" | "));
        }
        TypeFactory::Enum { name, values, .. } => {
            let _ = writeln!(out, "enum {name} {{");
            for value in values {
                print_description(&mut out, value.description.as_deref(), "  ");
                let _ = write!(out, "  {}", value.name);
                if let Some(reason) = &value.deprecation_reason {
                    let _ = write!(out, " @deprecated(reason: {})", string_literal(reason));
                }
                out.push('\n');
            }
            out.push_str("}\n");
        }
        TypeFactory::Scalar { name, .. } => {
            let _ = writeln!(out, "scalar {name}");
        }
    }
    out
}

fn print_fields(out: &mut String, fields: &[FieldFactory]) {
    out.push_str(" {\n");
    for field in fields {
        print_description(out, field.description.as_deref(), "  ");
        let _ = write!(out, "  {}", field.name);
        if !field.args.is_empty() {
            let args: Vec<String> = field.args.iter().map(print_argument).collect();
            let _ = write!(out, "({})", args.join(", "));
        }
        let _ = writeln!(out, ": {}", field.type_ref);
    }
    out.push_str("}\n");
}

fn print_argument(argument: &ArgumentFactory) -> String {
    let mut out = format!("{}: {}", argument.name, argument.type_ref);
    if let Some(default) = &argument.default_value {
        let _ = write!(out, " = {}", value_literal(default));
    }
    out
}

fn print_description(out: &mut String, description: Option<&str>, indent: &str) {
    let Some(description) = description else {
        return;
    };
    if description.contains('\n') || description.contains('"') {
        let _ = writeln!(out, "{indent}\"\"\"");
        for line in description.lines() {
            let _ = writeln!(out, "{indent}{}", line.replace("\"\"\"", "\\\"\"\""));
        }
        let _ = writeln!(out, "{indent}\"\"\"");
    } else {
        let _ = writeln!(out, "{indent}\"{description}\"");
    }
}

fn string_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// JSON value as a GraphQL input literal: object keys are unquoted.
fn value_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => string_literal(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(value_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {}", value_literal(v))).collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
