//! Parameter validation — classify failures, coerce valid input.
//!
//! Every field-level problem lands in exactly one bucket: a required
//! parameter that is absent goes to `missing`, anything else to `errors`.
//! Defaults are applied only when the whole input is valid.

use crate::tools::aliases::AliasTable;
use crate::tools::catalog::{display_value, number_value, value_type_name, ParamKind, ParameterSpec};
use regex::Regex;
use serde_json::{Map, Value};

// =============================================================================
// Outcome
// =============================================================================

/// Result of validating one argument bag against a tool's parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid {
        coerced_input: Map<String, Value>,
    },
    Invalid {
        missing: Vec<ParameterSpec>,
        errors: Vec<String>,
        suggestions: Vec<String>,
    },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid { .. })
    }

    pub fn coerced_input(&self) -> Option<&Map<String, Value>> {
        match self {
            ValidationOutcome::Valid { coerced_input } => Some(coerced_input),
            ValidationOutcome::Invalid { .. } => None,
        }
    }
}

// =============================================================================
// Path lookup
// =============================================================================

/// Where a dotted parameter path points inside the raw input.
#[derive(Debug, PartialEq)]
pub(crate) enum Lookup<'a> {
    /// Absent or `null`.
    Absent,
    Found(&'a Value),
    /// An intermediate segment exists but is not an object.
    Blocked { path: String, value: &'a Value },
}

/// Resolve `path` in `raw`. An exact top-level key wins over nesting.
pub(crate) fn lookup<'a>(raw: &'a Map<String, Value>, path: &str) -> Lookup<'a> {
    if let Some(v) = raw.get(path) {
        return if v.is_null() { Lookup::Absent } else { Lookup::Found(v) };
    }
    if !path.contains('.') {
        return Lookup::Absent;
    }

    let segments: Vec<&str> = path.split('.').collect();
    let mut current = raw;
    for (i, segment) in segments.iter().enumerate() {
        let value = match current.get(*segment) {
            None | Some(Value::Null) => return Lookup::Absent,
            Some(v) => v,
        };
        if i == segments.len() - 1 {
            return Lookup::Found(value);
        }
        match value {
            Value::Object(map) => current = map,
            other => {
                return Lookup::Blocked {
                    path: segments[..=i].join("."),
                    value: other,
                }
            }
        }
    }
    Lookup::Absent
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = target;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

// =============================================================================
// Field checks
// =============================================================================

/// Check one present value against its spec. Returns the coerced value or
/// the reason it was rejected.
pub fn check_value(spec: &ParameterSpec, value: &Value) -> Result<Value, String> {
    if !spec.kind.accepts(value) {
        return Err(format!(
            "Expected {}, received {}",
            spec.json_type(),
            value_type_name(value)
        ));
    }
    let c = spec.constraints();

    match spec.kind {
        ParamKind::Number => {
            let n = value.as_f64().unwrap_or_default();
            if c.integer && n.fract() != 0.0 {
                return Err("Expected integer, received float".to_string());
            }
            if let Some(min) = c.min {
                if n < min {
                    return Err(format!("Number must be greater than or equal to {}", min));
                }
            }
            if let Some(max) = c.max {
                if n > max {
                    return Err(format!("Number must be less than or equal to {}", max));
                }
            }
            if c.integer {
                return Ok(number_value(n));
            }
        }
        ParamKind::String => {
            let s = value.as_str().unwrap_or_default();
            let len = s.chars().count() as f64;
            if let Some(min) = c.min {
                if len < min {
                    return Err(format!("String must contain at least {} character(s)", min));
                }
            }
            if let Some(max) = c.max {
                if len > max {
                    return Err(format!("String must contain at most {} character(s)", max));
                }
            }
            if let Some(allowed) = &c.allowed_values {
                if !allowed.iter().any(|a| a == s) {
                    let expected: Vec<String> = allowed.iter().map(|a| format!("'{}'", a)).collect();
                    return Err(format!(
                        "Invalid enum value. Expected {}, received '{}'",
                        expected.join(" | "),
                        s
                    ));
                }
            }
            if let Some(pattern) = &c.pattern {
                let re = Regex::new(pattern)
                    .map_err(|e| format!("Invalid pattern constraint '{}': {}", pattern, e))?;
                if !re.is_match(s) {
                    return Err(format!("Invalid: must match pattern {}", pattern));
                }
            }
        }
        ParamKind::Array => {
            let len = value.as_array().map_or(0, |a| a.len()) as f64;
            if let Some(min) = c.min {
                if len < min {
                    return Err(format!("Array must contain at least {} element(s)", min));
                }
            }
            if let Some(max) = c.max {
                if len > max {
                    return Err(format!("Array must contain at most {} element(s)", max));
                }
            }
        }
        ParamKind::Boolean | ParamKind::Object => {}
    }

    Ok(value.clone())
}

/// `Parameter '<path>': <reason>`, plus the spec's description and examples.
fn invalid_message(path: &str, reason: &str, spec: Option<&ParameterSpec>) -> String {
    let mut msg = format!("Parameter '{}': {}", path, reason);
    if let Some(spec) = spec {
        msg.push_str(&format!("\n  Expected: {}", spec.description));
        if !spec.examples.is_empty() {
            msg.push_str(&format!("\n  Examples: {}", spec.examples.join(", ")));
        }
    }
    msg
}

// =============================================================================
// Validator
// =============================================================================

/// Runs raw input against a parameter list.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    aliases: &'a AliasTable,
}

impl<'a> Validator<'a> {
    pub fn new(aliases: &'a AliasTable) -> Self {
        Self { aliases }
    }

    /// Validate `raw` against `specs`.
    ///
    /// `null` is treated as an empty argument bag. Keys with no matching spec
    /// are dropped from the coerced input.
    pub fn validate(&self, specs: &[ParameterSpec], raw: &Value) -> ValidationOutcome {
        let empty = Map::new();
        let raw = match raw {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return ValidationOutcome::Invalid {
                    missing: Vec::new(),
                    errors: vec![format!(
                        "Validation failed: arguments must be an object, received {}",
                        value_type_name(other)
                    )],
                    suggestions: Vec::new(),
                };
            }
        };

        let mut coerced = Map::new();
        let mut missing = Vec::new();
        let mut errors = Vec::new();

        for spec in specs {
            match lookup(raw, &spec.name) {
                Lookup::Absent => {
                    if spec.required {
                        missing.push(spec.clone());
                    } else if let Some(default) = &spec.default_value {
                        insert_path(&mut coerced, &spec.name, default.clone());
                    }
                }
                Lookup::Found(value) => match check_value(spec, value) {
                    Ok(v) => insert_path(&mut coerced, &spec.name, v),
                    Err(reason) => errors.push(invalid_message(&spec.name, &reason, Some(spec))),
                },
                Lookup::Blocked { path, value } => {
                    // Parent of a nested spec is not an object. Report it once.
                    let reason = format!("Expected object, received {}", value_type_name(value));
                    let msg = invalid_message(
                        &path,
                        &reason,
                        specs.iter().find(|s| s.name == path),
                    );
                    if !errors.contains(&msg) {
                        errors.push(msg);
                    }
                }
            }
        }

        if missing.is_empty() && errors.is_empty() {
            return ValidationOutcome::Valid {
                coerced_input: coerced,
            };
        }

        let suggestions = if missing.is_empty() {
            Vec::new()
        } else {
            self.aliases.suggest(raw, specs)
        };
        ValidationOutcome::Invalid {
            missing,
            errors,
            suggestions,
        }
    }
}

/// Validate with an explicit alias table.
pub fn validate(specs: &[ParameterSpec], raw: &Value, aliases: &AliasTable) -> ValidationOutcome {
    Validator::new(aliases).validate(specs, raw)
}

/// Check a declared default against its own spec (used at registration).
pub fn check_default(spec: &ParameterSpec) -> Result<(), String> {
    match &spec.default_value {
        Some(default) => check_value(spec, default).map(|_| ()).map_err(|reason| {
            format!(
                "default {} for '{}' is invalid: {}",
                display_value(default),
                spec.name,
                reason
            )
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Tests
// =============================================================================
