//! The call contract between the evaluator and a function library.
//!
//! The evaluator never implements functions itself. It asks a [`Stdlib`] for
//! a [`FunctionSignature`], checks the arguments against it and only then
//! invokes the function with a [`CallContext`] that can call closures back.

mod builtins;

use std::fmt;

pub use builtins::Builtins;

use crate::diagnostics::Location;
use crate::evaluator::{Fault, Run};
use crate::udm::Udm;

/// A read-only function registry, shared across evaluations.
pub trait Stdlib: Send + Sync {
    fn resolve(&self, name: &str) -> Option<FunctionSignature>;

    /// Called only with arguments that passed [`FunctionSignature::check`].
    fn invoke(
        &self,
        name: &str,
        args: Vec<Udm>,
        cx: &mut CallContext<'_, '_>,
    ) -> Result<Udm, StdlibError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StdlibError {
    /// The function rejected its input
    #[error("{0}")]
    Failed(String),
    /// A closure or checkpoint stopped the evaluation; just propagate it
    #[error("evaluation interrupted")]
    Interrupted(Interrupt),
}

/// Opaque evaluator state carried by [`StdlibError::Interrupted`].
#[derive(Debug)]
pub struct Interrupt(pub(crate) Fault);

/// Parameter kinds checked at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Any,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Function,
}

impl ParamType {
    pub fn accepts(self, value: &Udm) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::String => matches!(value, Udm::String(_)),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => matches!(value, Udm::Boolean(_)),
            ParamType::Array => matches!(value, Udm::Array(_)),
            ParamType::Object => matches!(value, Udm::Object(_)),
            ParamType::Function => matches!(value, Udm::Lambda(_)),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Any => "any",
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Function => "function",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
    pub optional: bool,
}

/// Name, parameters and result kind of a library function.
///
/// ```
/// use utlx_core::stdlib::{FunctionSignature, ParamType};
///
/// let sig = FunctionSignature::new("join")
///     .param("items", ParamType::Array)
///     .optional("separator", ParamType::String)
///     .returning(ParamType::String);
/// assert_eq!(sig.to_string(), "join(items: array, separator?: string) -> string");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Param>,
    /// Kind of any arguments past the declared parameters
    pub variadic: Option<ParamType>,
    pub returns: ParamType,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionSignature {
            name: name.into(),
            params: Vec::new(),
            variadic: None,
            returns: ParamType::Any,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
            optional: false,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
            optional: true,
        });
        self
    }

    pub fn rest(mut self, ty: ParamType) -> Self {
        self.variadic = Some(ty);
        self
    }

    pub fn returning(mut self, ty: ParamType) -> Self {
        self.returns = ty;
        self
    }

    /// Check arity and argument kinds.
    pub fn check(&self, args: &[Udm]) -> Result<(), String> {
        let required = self.params.iter().filter(|p| !p.optional).count();
        let too_many = self.variadic.is_none() && args.len() > self.params.len();
        if args.len() < required || too_many {
            let expected = if self.variadic.is_some() {
                format!("at least {}", required)
            } else if required == self.params.len() {
                required.to_string()
            } else {
                format!("{} to {}", required, self.params.len())
            };
            return Err(format!(
                "'{}' expects {} argument{}, got {}",
                self.name,
                expected,
                if expected == "1" { "" } else { "s" },
                args.len()
            ));
        }

        for (i, arg) in args.iter().enumerate() {
            let (name, ty) = match self.params.get(i) {
                Some(param) => (param.name.as_str(), param.ty),
                None => ("...", self.variadic.unwrap_or(ParamType::Any)),
            };
            if !ty.accepts(arg) {
                return Err(format!(
                    "argument {} ('{}') of '{}' must be {}, found {}",
                    i + 1,
                    name,
                    self.name,
                    ty,
                    arg.type_name()
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let mark = if p.optional { "?" } else { "" };
                format!("{}{}: {}", p.name, mark, p.ty)
            })
            .collect();
        if let Some(ty) = self.variadic {
            params.push(format!("...rest: {}", ty));
        }
        write!(f, "{}({}) -> {}", self.name, params.join(", "), self.returns)
    }
}

/// Evaluator access for a running library function.
pub struct CallContext<'r, 'a> {
    run: &'r mut Run<'a>,
    location: Location,
}

impl<'r, 'a> CallContext<'r, 'a> {
    pub(crate) fn new(run: &'r mut Run<'a>, location: Location) -> Self {
        CallContext { run, location }
    }

    /// Where the call appears in the script.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Call a closure passed as an argument.
    pub fn apply(&mut self, function: &Udm, args: Vec<Udm>) -> Result<Udm, StdlibError> {
        let Udm::Lambda(closure) = function else {
            return Err(StdlibError::Failed(format!(
                "expected a function, found {}",
                function.type_name()
            )));
        };
        self.run
            .call_closure(closure, args, self.location)
            .map_err(|fault| StdlibError::Interrupted(Interrupt(fault)))
    }

    /// Count one unit of work and honour cancellation. Call once per element
    /// when iterating.
    pub fn checkpoint(&mut self) -> Result<(), StdlibError> {
        self.run
            .step(self.location)
            .map_err(|fault| StdlibError::Interrupted(Interrupt(fault)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_messages() {
        let sig = FunctionSignature::new("upper").param("text", ParamType::String);
        assert_eq!(
            sig.check(&[]).unwrap_err(),
            "'upper' expects 1 argument, got 0"
        );

        let sig = FunctionSignature::new("concat").rest(ParamType::Any);
        assert!(sig.check(&[]).is_ok());

        let sig = FunctionSignature::new("split")
            .param("text", ParamType::String)
            .optional("sep", ParamType::String);
        assert_eq!(
            sig.check(&[Udm::from("a"), Udm::from(","), Udm::Null])
                .unwrap_err(),
            "'split' expects 1 to 2 arguments, got 3"
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let sig = FunctionSignature::new("upper").param("text", ParamType::String);
        assert_eq!(
            sig.check(&[Udm::Integer(1)]).unwrap_err(),
            "argument 1 ('text') of 'upper' must be string, found number"
        );
    }
}
