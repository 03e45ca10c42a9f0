//! A small reference function library.
//!
//! Enough to write real transformations in tests and from the CLI; embedders
//! supply their own [`Stdlib`] for the full library.

use regex::Regex;

use super::{CallContext, FunctionSignature, ParamType, Stdlib, StdlibError};
use crate::udm::{Object, Udm};

#[derive(Debug, Clone, Copy, Default)]
pub struct Builtins;

impl Builtins {
    pub fn new() -> Self {
        Builtins
    }

    /// Names of every function this registry provides.
    pub fn names() -> &'static [&'static str] {
        &[
            "count", "sum", "map", "filter", "keys", "values", "upper", "lower", "trim",
            "contains", "matches", "concat", "join", "split", "first", "last", "typeOf",
        ]
    }
}

impl Stdlib for Builtins {
    fn resolve(&self, name: &str) -> Option<FunctionSignature> {
        use ParamType as P;
        let sig = FunctionSignature::new(name);
        let sig = match name {
            "count" => sig.param("items", P::Array).returning(P::Number),
            "sum" => sig
                .param("items", P::Array)
                .optional("selector", P::Function)
                .returning(P::Number),
            "map" => sig
                .param("items", P::Array)
                .param("transform", P::Function)
                .returning(P::Array),
            "filter" => sig
                .param("items", P::Array)
                .param("predicate", P::Function)
                .returning(P::Array),
            "keys" => sig.param("object", P::Object).returning(P::Array),
            "values" => sig.param("object", P::Object).returning(P::Array),
            "upper" | "lower" | "trim" => sig.param("text", P::String).returning(P::String),
            "contains" => sig
                .param("haystack", P::Any)
                .param("needle", P::Any)
                .returning(P::Boolean),
            "matches" => sig
                .param("text", P::String)
                .param("pattern", P::String)
                .returning(P::Boolean),
            "concat" => sig.rest(P::Any).returning(P::String),
            "join" => sig
                .param("items", P::Array)
                .optional("separator", P::String)
                .returning(P::String),
            "split" => sig
                .param("text", P::String)
                .optional("separator", P::String)
                .returning(P::Array),
            "first" | "last" => sig.param("items", P::Array),
            "typeOf" => sig.param("value", P::Any).returning(P::String),
            _ => return None,
        };
        Some(sig)
    }

    fn invoke(
        &self,
        name: &str,
        args: Vec<Udm>,
        cx: &mut CallContext<'_, '_>,
    ) -> Result<Udm, StdlibError> {
        let count = args.len();
        let mut args = args.into_iter();
        let first = args.next().unwrap_or(Udm::Null);
        let second = args.next();

        match name {
            "count" => Ok(Udm::Integer(array(&first)?.len() as i64)),
            "sum" => sum(array(&first)?, second.as_ref(), cx),
            "map" => {
                let transform = required(second, "transform")?;
                let mut mapped = Vec::new();
                for item in array(&first)? {
                    cx.checkpoint()?;
                    mapped.push(cx.apply(&transform, vec![item.clone()])?);
                }
                Ok(Udm::Array(mapped))
            }
            "filter" => {
                let predicate = required(second, "predicate")?;
                let mut kept = Vec::new();
                for item in array(&first)? {
                    cx.checkpoint()?;
                    match cx.apply(&predicate, vec![item.clone()])? {
                        Udm::Boolean(true) => kept.push(item.clone()),
                        Udm::Boolean(false) | Udm::Null => {}
                        other => {
                            return Err(StdlibError::Failed(format!(
                                "filter predicate must return boolean, got {}",
                                other.type_name()
                            )));
                        }
                    }
                }
                Ok(Udm::Array(kept))
            }
            "keys" => {
                let keys = object(&first)?.properties.keys().map(Udm::from).collect();
                Ok(Udm::Array(keys))
            }
            "values" => {
                let values = object(&first)?.properties.values().cloned().collect();
                Ok(Udm::Array(values))
            }
            "upper" => Ok(Udm::String(text(&first)?.to_uppercase())),
            "lower" => Ok(Udm::String(text(&first)?.to_lowercase())),
            "trim" => Ok(Udm::String(text(&first)?.trim().to_string())),
            "contains" => {
                let needle = required(second, "needle")?;
                match (&first, &needle) {
                    (Udm::String(haystack), Udm::String(needle)) => {
                        Ok(Udm::Boolean(haystack.contains(needle.as_str())))
                    }
                    (Udm::Array(items), needle) => Ok(Udm::Boolean(items.contains(needle))),
                    (Udm::Object(object), Udm::String(key)) => {
                        Ok(Udm::Boolean(object.properties.contains_key(key)))
                    }
                    (haystack, needle) => Err(StdlibError::Failed(format!(
                        "cannot search {} in {}",
                        needle.type_name(),
                        haystack.type_name()
                    ))),
                }
            }
            "matches" => {
                let pattern = required(second, "pattern")?;
                let re = Regex::new(text(&pattern)?)
                    .map_err(|e| StdlibError::Failed(format!("invalid regex: {e}")))?;
                Ok(Udm::Boolean(re.is_match(text(&first)?)))
            }
            "concat" => {
                let mut out = String::new();
                let all = std::iter::once(first).chain(second).chain(args).take(count);
                for part in all {
                    cx.checkpoint()?;
                    let text = part
                        .as_string()
                        .map_err(|e| StdlibError::Failed(e.to_string()))?;
                    out.push_str(&text);
                }
                Ok(Udm::String(out))
            }
            "join" => {
                let separator = match &second {
                    Some(sep) => text(sep)?.to_string(),
                    None => ",".to_string(),
                };
                let parts = array(&first)?
                    .iter()
                    .map(|item| item.as_string())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| StdlibError::Failed(e.to_string()))?;
                Ok(Udm::String(parts.join(&separator)))
            }
            "split" => {
                let input = text(&first)?;
                let parts: Vec<Udm> = match &second {
                    None => input.split_whitespace().map(Udm::from).collect(),
                    Some(sep) => {
                        let sep = text(sep)?;
                        if sep.is_empty() {
                            input.chars().map(|c| Udm::String(c.to_string())).collect()
                        } else {
                            input.split(sep).map(Udm::from).collect()
                        }
                    }
                };
                Ok(Udm::Array(parts))
            }
            "first" => Ok(array(&first)?.first().cloned().unwrap_or(Udm::Null)),
            "last" => Ok(array(&first)?.last().cloned().unwrap_or(Udm::Null)),
            "typeOf" => Ok(Udm::from(first.type_name())),
            _ => Err(StdlibError::Failed(format!("unknown function '{}'", name))),
        }
    }
}

/// Sum numbers, optionally projecting each element through `selector`.
fn sum(
    items: &[Udm],
    selector: Option<&Udm>,
    cx: &mut CallContext<'_, '_>,
) -> Result<Udm, StdlibError> {
    let mut sum_int: i64 = 0;
    let mut sum_float: f64 = 0.0;
    let mut has_float = false;

    for item in items {
        cx.checkpoint()?;
        let value = match selector {
            Some(selector) => cx.apply(selector, vec![item.clone()])?,
            None => item.clone(),
        };

        match value {
            Udm::Integer(n) if !has_float => match sum_int.checked_add(n) {
                Some(total) => sum_int = total,
                None => {
                    sum_float = sum_int as f64 + n as f64;
                    has_float = true;
                }
            },
            Udm::Integer(n) => sum_float += n as f64,
            Udm::Float(n) => {
                if !has_float {
                    sum_float = sum_int as f64;
                    has_float = true;
                }
                sum_float += n;
            }
            other => {
                return Err(StdlibError::Failed(format!(
                    "sum requires numeric values, got {}",
                    other.type_name()
                )));
            }
        }
    }

    if has_float {
        Ok(Udm::Float(sum_float))
    } else {
        Ok(Udm::Integer(sum_int))
    }
}

fn required(arg: Option<Udm>, name: &str) -> Result<Udm, StdlibError> {
    arg.ok_or_else(|| StdlibError::Failed(format!("missing argument '{}'", name)))
}

fn array(value: &Udm) -> Result<&[Udm], StdlibError> {
    value.as_array().ok_or_else(|| expected("array", value))
}

fn object(value: &Udm) -> Result<&Object, StdlibError> {
    value.as_object().ok_or_else(|| expected("object", value))
}

fn text(value: &Udm) -> Result<&str, StdlibError> {
    match value {
        Udm::String(s) => Ok(s),
        other => Err(expected("string", other)),
    }
}

fn expected(kind: &str, found: &Udm) -> StdlibError {
    StdlibError::Failed(format!("expected {}, got {}", kind, found.type_name()))
}
