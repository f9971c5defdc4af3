//! Parameter coercion
//!
//! The model supplies tool parameters as a flat, positional list of loosely
//! typed JSON values. Coercion matches them against the tool's declared
//! parameters, strictly left to right, and converts each to its declared
//! type.

use sdk::errors::EngineError;
use sdk::types::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::config::ExtraParamsPolicy;

/// Coerce positional `raw` values into named, typed tool arguments.
///
/// Values are consumed front to back in the tool's declared parameter
/// order. Running out of values is an `InsufficientParameters` error;
/// surplus values are handled according to `extra`.
pub fn coerce_parameters(
    tool: &ToolDescriptor,
    raw: &[Value],
    extra: ExtraParamsPolicy,
) -> Result<Map<String, Value>, EngineError> {
    let mut values = raw.iter();
    let mut arguments = Map::new();

    for spec in &tool.params {
        let value = values
            .next()
            .ok_or_else(|| EngineError::InsufficientParameters {
                tool: tool.name.clone(),
                param: spec.name.clone(),
            })?;
        arguments.insert(spec.name.clone(), coerce_value(&tool.name, spec, value)?);
    }

    let surplus = values.len();
    if surplus > 0 {
        match extra {
            ExtraParamsPolicy::Ignore => {
                debug!("Dropping {} extra parameter(s) for {}", surplus, tool.name);
            }
            ExtraParamsPolicy::Warn => {
                warn!(
                    "{} takes {} parameter(s) but {} were supplied; extras dropped",
                    tool.name,
                    tool.params.len(),
                    raw.len()
                );
            }
            ExtraParamsPolicy::Reject => {
                return Err(EngineError::ExtraParameters {
                    tool: tool.name.clone(),
                    expected: tool.params.len(),
                    got: raw.len(),
                });
            }
        }
    }

    Ok(arguments)
}

/// Convert one raw value to the parameter's declared type.
pub fn coerce_value(tool: &str, spec: &ParamSpec, raw: &Value) -> Result<Value, EngineError> {
    let mismatch = || EngineError::TypeMismatch {
        tool: tool.to_string(),
        param: spec.name.clone(),
        expected: spec.ty.to_string(),
        value: raw.to_string(),
    };

    match &spec.ty {
        ParamType::Integer => to_integer(raw).ok_or_else(mismatch),
        ParamType::Number => to_number(raw).ok_or_else(mismatch),
        ParamType::Array => Ok(to_array(raw)),
        ParamType::String | ParamType::Other(_) => Ok(Value::String(stringify(raw))),
    }
}

fn to_integer(raw: &Value) -> Option<Value> {
    match raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(raw.clone()),
        Value::Number(n) => {
            let f = n.as_f64()?;
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Some(Value::from(f as i64))
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn to_number(raw: &Value) -> Option<Value> {
    match raw {
        Value::Number(_) => Some(raw.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => None,
    }
}

/// Arrays pass through. A string like `"[1, 2, foo]"` has one enclosing
/// bracket pair removed and is split on commas; each trimmed element is an
/// integer if it parses as one, otherwise a string.
fn to_array(raw: &Value) -> Value {
    let Value::String(s) = raw else {
        return raw.clone();
    };

    let mut body = s.trim();
    if let Some(inner) = body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        body = inner;
    }
    if body.trim().is_empty() {
        return Value::Array(Vec::new());
    }

    Value::Array(
        body.split(',')
            .map(str::trim)
            .map(|element| match element.parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(element.to_string()),
            })
            .collect(),
    )
}

fn stringify(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_tool() -> ToolDescriptor {
        ToolDescriptor::new("add", "Add two integers")
            .with_param("a", ParamType::Integer)
            .with_param("b", ParamType::Integer)
    }

    #[test]
    fn test_coerce_add() {
        let args = coerce_parameters(&add_tool(), &[json!(2), json!("3")], ExtraParamsPolicy::Ignore)
            .unwrap();
        assert_eq!(Value::Object(args), json!({"a": 2, "b": 3}));
    }

    #[test]
    fn test_insufficient_parameters_names_missing_param() {
        let err = coerce_parameters(&add_tool(), &[json!(2)], ExtraParamsPolicy::Ignore).unwrap_err();
        match err {
            EngineError::InsufficientParameters { tool, param } => {
                assert_eq!(tool, "add");
                assert_eq!(param, "b");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_extra_parameter_policies() {
        let raw = [json!(1), json!(2), json!(3)];

        let args = coerce_parameters(&add_tool(), &raw, ExtraParamsPolicy::Ignore).unwrap();
        assert_eq!(args.len(), 2);

        let args = coerce_parameters(&add_tool(), &raw, ExtraParamsPolicy::Warn).unwrap();
        assert_eq!(args.len(), 2);

        let err = coerce_parameters(&add_tool(), &raw, ExtraParamsPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ExtraParameters { expected: 2, got: 3, .. }
        ));
    }

    #[test]
    fn test_integer_coercion() {
        let spec = ParamSpec::new("n", ParamType::Integer);
        assert_eq!(coerce_value("t", &spec, &json!(" 42 ")).unwrap(), json!(42));
        assert_eq!(coerce_value("t", &spec, &json!(4.0)).unwrap(), json!(4));
        assert_eq!(coerce_value("t", &spec, &json!(-7)).unwrap(), json!(-7));

        for bad in [json!("two"), json!(2.5), json!(true), json!(null), json!([1])] {
            let err = coerce_value("t", &spec, &bad).unwrap_err();
            assert!(matches!(err, EngineError::TypeMismatch { .. }), "{:?}", bad);
        }
    }

    #[test]
    fn test_number_coercion() {
        let spec = ParamSpec::new("x", ParamType::Number);
        assert_eq!(coerce_value("t", &spec, &json!("7.59982224609308e+33")).unwrap(), json!(7.59982224609308e33));
        assert_eq!(coerce_value("t", &spec, &json!(3)).unwrap(), json!(3));
        assert!(coerce_value("t", &spec, &json!("NaN")).is_err());
        assert!(coerce_value("t", &spec, &json!("abc")).is_err());
    }

    #[test]
    fn test_array_coercion() {
        let spec = ParamSpec::new("xs", ParamType::Array);
        assert_eq!(
            coerce_value("t", &spec, &json!("[1, 2, foo]")).unwrap(),
            json!([1, 2, "foo"])
        );
        assert_eq!(coerce_value("t", &spec, &json!("73,78")).unwrap(), json!([73, 78]));
        assert_eq!(coerce_value("t", &spec, &json!("[]")).unwrap(), json!([]));
        assert_eq!(coerce_value("t", &spec, &json!([1, "a"])).unwrap(), json!([1, "a"]));
    }

    #[test]
    fn test_string_coercion() {
        let spec = ParamSpec::new("s", ParamType::String);
        assert_eq!(coerce_value("t", &spec, &json!("INDIA")).unwrap(), json!("INDIA"));
        assert_eq!(coerce_value("t", &spec, &json!(5)).unwrap(), json!("5"));
        assert_eq!(coerce_value("t", &spec, &json!([73, 78])).unwrap(), json!("[73,78]"));

        let spec = ParamSpec::new("flag", ParamType::Other("boolean".into()));
        assert_eq!(coerce_value("t", &spec, &json!(true)).unwrap(), json!("true"));
    }

    #[test]
    fn test_arguments_keep_schema_order() {
        let tool = ToolDescriptor::new("draw", "")
            .with_param("z", ParamType::Integer)
            .with_param("a", ParamType::String);
        let args = coerce_parameters(&tool, &[json!(1), json!("x")], ExtraParamsPolicy::Ignore).unwrap();
        let keys: Vec<_> = args.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
