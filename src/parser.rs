use crate::error::RenderError;
use crate::ir::{Component, Connection, Diagram, Group};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("json object pattern"));

/// Parse a diagram document. The input may be a bare JSON object or a whole
/// model reply with prose around it; in the latter case the outermost `{...}`
/// is extracted first. Strict JSON is tried before JSON5 so that trailing
/// commas or comments in model output still parse.
pub fn parse_diagram(input: &str) -> Result<Diagram, RenderError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RenderError::Schema("empty input".into()));
    }

    let candidate = if trimmed.starts_with('{') {
        trimmed
    } else {
        JSON_OBJECT
            .find(trimmed)
            .map(|m| m.as_str())
            .ok_or_else(|| RenderError::Schema("no JSON object found in input".into()))?
    };

    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(json_err) => json5::from_str(candidate)
            .map_err(|_| RenderError::Schema(format!("invalid JSON: {json_err}")))?,
    };

    diagram_from_value(&value)
}

/// Build and validate a `Diagram` from an already-parsed JSON value.
pub fn diagram_from_value(value: &Value) -> Result<Diagram, RenderError> {
    let root = value
        .as_object()
        .ok_or_else(|| RenderError::Schema("top level is not an object".into()))?;

    let groups = match root.get("groups") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => parse_groups(items)?,
        Some(_) => return Err(RenderError::Schema("`groups` is not a sequence".into())),
    };

    let components = match root.get("components") {
        Some(Value::Array(items)) => parse_components(items)?,
        Some(_) => return Err(RenderError::Schema("`components` is not a sequence".into())),
        None => return Err(RenderError::Schema("missing `components`".into())),
    };

    let connections = match root.get("connections") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => parse_connections(items)?,
        Some(_) => {
            return Err(RenderError::Schema("`connections` is not a sequence".into()));
        }
    };

    let diagram = Diagram {
        groups,
        components,
        connections,
    };
    check_unique_names(&diagram)?;
    warn_dangling_groups(&diagram);
    Ok(diagram)
}

fn parse_groups(items: &[Value]) -> Result<Vec<Group>, RenderError> {
    let mut groups = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| RenderError::Schema(format!("groups[{idx}] is not an object")))?;
        groups.push(Group {
            name: required_string(obj, "name", &format!("groups[{idx}]"))?,
            kind: kind_field(obj),
        });
    }
    Ok(groups)
}

fn parse_components(items: &[Value]) -> Result<Vec<Component>, RenderError> {
    let mut components = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| RenderError::Schema(format!("components[{idx}] is not an object")))?;
        components.push(Component {
            name: required_string(obj, "name", &format!("components[{idx}]"))?,
            kind: kind_field(obj),
            group: optional_string(obj, "group"),
            // Source documents spell the hint three ways depending on which
            // prompt produced them.
            icon_hint: optional_string(obj, "icon_hint")
                .or_else(|| optional_string(obj, "image"))
                .or_else(|| optional_string(obj, "logo")),
        });
    }
    Ok(components)
}

fn parse_connections(items: &[Value]) -> Result<Vec<Connection>, RenderError> {
    let mut connections = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| RenderError::Schema(format!("connections[{idx}] is not an object")))?;
        connections.push(Connection {
            from: required_string(obj, "from", &format!("connections[{idx}]"))?,
            to: required_string(obj, "to", &format!("connections[{idx}]"))?,
            label: optional_string(obj, "label").unwrap_or_default(),
        });
    }
    Ok(connections)
}

fn required_string(
    obj: &serde_json::Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<String, RenderError> {
    match obj.get(key).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(RenderError::Schema(format!(
            "{context} is missing a `{key}` string"
        ))),
    }
}

fn optional_string(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn kind_field(obj: &serde_json::Map<String, Value>) -> String {
    // "kind" is canonical; older documents use "type".
    optional_string(obj, "kind")
        .or_else(|| optional_string(obj, "type"))
        .unwrap_or_default()
}

fn check_unique_names(diagram: &Diagram) -> Result<(), RenderError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for group in &diagram.groups {
        if !seen.insert(group.name.as_str()) {
            return Err(RenderError::Schema(format!(
                "duplicate group name `{}`",
                group.name
            )));
        }
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for component in &diagram.components {
        if !seen.insert(component.name.as_str()) {
            return Err(RenderError::Schema(format!(
                "duplicate component name `{}`",
                component.name
            )));
        }
    }
    Ok(())
}

fn warn_dangling_groups(diagram: &Diagram) {
    for component in &diagram.components {
        if let Some(group) = component.group.as_deref()
            && diagram.group(group).is_none()
        {
            warn!(
                "component `{}` references undeclared group `{}`; treating as ungrouped",
                component.name, group
            );
        }
    }
}
