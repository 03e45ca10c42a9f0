//! Expression evaluator over UDM values.
//!
//! One evaluation is a [`Run`]: it walks the AST with an immutable [`Env`],
//! records diagnostics and threads a [`Flow`] result through every node.
//! A failing node reports once and returns [`Fault::Tainted`]; everything that
//! merely forwards that value returns `Tainted` too, without a new report.
//!
//! Two entry points share the same walk:
//!
//! - [`Evaluator::evaluate`] is strict: the first diagnostic ends the run and
//!   becomes the [`EvalError`].
//! - [`Evaluator::validate`] collects: independent faults are all reported,
//!   up to the configured error ceiling.
//!
//! Recursion depth, step budget and cancellation are checked on every step
//! and always end the run.

mod cancel;
mod env;
mod operators;

use std::slice;
use std::sync::Arc;

use tracing::{debug, trace};

pub use cancel::CancellationToken;
pub use env::{Binding, Closure, Env};

use crate::ast::{BinOp, Expr, ExprKind, Literal, MemberKey, ObjectEntry, UnaryOp};
use crate::config::{Config, Limits};
use crate::diagnostics::{Diagnostic, Diagnostics, ErrorKind, Location, Push, Section};
use crate::stdlib::{CallContext, Stdlib, StdlibError};
use crate::udm::{Navigation, Object, PathSegment, Udm};

/// Evaluates expressions against a function library.
///
/// Holds only read-only state, so one evaluator can serve many threads.
pub struct Evaluator {
    stdlib: Arc<dyn Stdlib>,
    limits: Limits,
    max_errors: usize,
    fail_fast: bool,
    cancel: Option<CancellationToken>,
}

/// Strict evaluation failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{primary}")]
pub struct EvalError {
    /// The diagnostic that stopped the evaluation
    pub primary: Diagnostic,
    /// Everything recorded during the run, `primary` included
    pub diagnostics: Vec<Diagnostic>,
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        self.primary.kind
    }

    pub fn location(&self) -> Location {
        self.primary.location
    }
}

/// Result of a collecting evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// The output, when no fault touched it
    pub value: Option<Udm>,
    pub diagnostics: Vec<Diagnostic>,
    /// A terminal fault (error ceiling, resource limit, cancellation) ended the run
    pub aborted: bool,
}

impl Evaluation {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Why a node produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Already reported further down; dependents stay quiet
    Tainted,
    Abort(Abort),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Abort {
    /// Strict mode stops at the first diagnostic
    Halted,
    TooManyErrors,
    ResourceExhausted,
    Cancelled,
}

pub(crate) type Flow<T> = Result<T, Fault>;

impl Evaluator {
    pub fn new(stdlib: Arc<dyn Stdlib>, config: &Config) -> Self {
        Evaluator {
            stdlib,
            limits: config.limits,
            max_errors: config.max_errors,
            fail_fast: config.fail_fast,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Evaluate strictly: the first fault is returned as the error.
    #[tracing::instrument(skip_all)]
    pub fn evaluate(&self, expr: &Expr, env: &Env) -> Result<Udm, EvalError> {
        let mut run = Run::new(self, true);
        let result = run.eval(expr, env);
        debug!(steps = run.steps, ok = result.is_ok(), "evaluation finished");

        let diagnostics = run.diagnostics.into_vec();
        match result {
            Ok(value) => Ok(value),
            Err(_) => {
                let primary = diagnostics
                    .iter()
                    .rev()
                    .find(|d| d.kind.is_abort())
                    .or_else(|| diagnostics.iter().find(|d| d.is_error()))
                    .cloned()
                    .unwrap_or_else(|| {
                        Diagnostic::error(
                            ErrorKind::Parse,
                            Section::Content,
                            expr.location,
                            "cannot evaluate an expression that failed to parse",
                        )
                    });
                Err(EvalError {
                    primary,
                    diagnostics,
                })
            }
        }
    }

    /// Evaluate collecting every independent fault. With `failFast` the
    /// first fault aborts the run.
    #[tracing::instrument(skip_all)]
    pub fn validate(&self, expr: &Expr, env: &Env) -> Evaluation {
        let mut run = Run::new(self, self.fail_fast);
        let result = run.eval(expr, env);
        let aborted = matches!(result, Err(Fault::Abort(_)));
        debug!(
            steps = run.steps,
            errors = run.diagnostics.error_count(),
            aborted,
            "validation finished"
        );
        Evaluation {
            value: result.ok(),
            diagnostics: run.diagnostics.into_vec(),
            aborted,
        }
    }
}

/// State of a single evaluation.
pub(crate) struct Run<'a> {
    evaluator: &'a Evaluator,
    diagnostics: Diagnostics,
    strict: bool,
    depth: usize,
    steps: u64,
}

impl<'a> Run<'a> {
    fn new(evaluator: &'a Evaluator, strict: bool) -> Self {
        let ceiling = if strict { 1 } else { evaluator.max_errors };
        Run {
            evaluator,
            diagnostics: Diagnostics::new(ceiling),
            strict,
            depth: 0,
            steps: 0,
        }
    }

    /// Record a recoverable fault and decide how far it propagates.
    fn report(&mut self, kind: ErrorKind, location: Location, message: impl Into<String>) -> Fault {
        let diagnostic = Diagnostic::error(kind, Section::Content, location, message);
        match self.diagnostics.push(diagnostic) {
            Push::Saturated => Fault::Abort(Abort::TooManyErrors),
            Push::Recorded if self.strict => Fault::Abort(Abort::Halted),
            Push::Recorded => Fault::Tainted,
        }
    }

    fn terminate(
        &mut self,
        abort: Abort,
        kind: ErrorKind,
        location: Location,
        message: String,
    ) -> Fault {
        debug!(%location, %message, "evaluation aborted");
        self.diagnostics.push_terminal(Diagnostic::error(
            kind,
            Section::Content,
            location,
            message,
        ));
        Fault::Abort(abort)
    }

    /// One unit of work: honours cancellation and the step budget.
    pub(crate) fn step(&mut self, location: Location) -> Flow<()> {
        if self
            .evaluator
            .cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(self.terminate(
                Abort::Cancelled,
                ErrorKind::Cancelled,
                location,
                "evaluation cancelled".to_string(),
            ));
        }
        self.steps += 1;
        if let Some(max) = self.evaluator.limits.max_steps
            && self.steps > max
        {
            return Err(self.terminate(
                Abort::ResourceExhausted,
                ErrorKind::ResourceExhausted,
                location,
                format!("step budget of {} exceeded", max),
            ));
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr, env: &Env) -> Flow<Udm> {
        self.step(expr.location)?;
        if self.depth >= self.evaluator.limits.max_depth {
            return Err(self.too_deep(expr.location));
        }
        self.depth += 1;
        let result = self.eval_node(expr, env);
        self.depth -= 1;
        result
    }

    #[cold]
    fn too_deep(&mut self, location: Location) -> Fault {
        let max = self.evaluator.limits.max_depth;
        self.terminate(
            Abort::ResourceExhausted,
            ErrorKind::ResourceExhausted,
            location,
            format!("recursion depth of {} exceeded", max),
        )
    }

    /// Dispatch only. Every arm is a call so the recursive path keeps small
    /// stack frames.
    fn eval_node(&mut self, expr: &Expr, env: &Env) -> Flow<Udm> {
        let location = expr.location;
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal)),
            ExprKind::Identifier(name) => self.lookup(name, env, location),
            ExprKind::Binary { op, left, right } => {
                self.eval_binary(*op, left, right, env, location)
            }
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, env, location),
            ExprKind::Member { object, key, safe } => {
                self.eval_member(object, key, *safe, env, location)
            }
            ExprKind::Index { object, index } => self.eval_index(object, index, env, location),
            ExprKind::Call { callee, args } => self.eval_call(callee, args, None, env, location),
            ExprKind::Lambda { params, body } => Ok(closure(params, body, env)),
            ExprKind::Pipe { source, target } => self.eval_pipe(source, target, env),
            ExprKind::Object(entries) => self.eval_object(entries, env),
            ExprKind::Array(items) => self.eval_all(items, env).map(Udm::Array),
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => self.eval_conditional(condition, then_branch, else_branch, env),
            // Reported by the parser
            ExprKind::Errored => Err(Fault::Tainted),
        }
    }

    fn lookup(&mut self, name: &str, env: &Env, location: Location) -> Flow<Udm> {
        match env.lookup(name) {
            Some(Binding::Value(value)) => Ok(value.clone()),
            Some(Binding::Tainted) => {
                trace!(%name, "reference to tainted binding");
                Err(Fault::Tainted)
            }
            None => Err(self.report(
                ErrorKind::UndefinedVariable,
                location,
                format!("undefined variable '{}'", name),
            )),
        }
    }

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        env: &Env,
        location: Location,
    ) -> Flow<Udm> {
        let value = self.eval(operand, env)?;
        operators::apply_unary(op, &value)
            .map_err(|message| self.report(ErrorKind::TypeMismatch, location, message))
    }

    fn eval_pipe(&mut self, source: &Expr, target: &Expr, env: &Env) -> Flow<Udm> {
        let value = self.eval(source, env)?;
        self.pipe_into(value, target, env)
    }

    fn eval_conditional(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
        env: &Env,
    ) -> Flow<Udm> {
        let value = self.eval(condition, env)?;
        match value.as_boolean() {
            Ok(true) => self.eval(then_branch, env),
            Ok(false) => self.eval(else_branch, env),
            Err(e) => Err(self.report(
                ErrorKind::TypeMismatch,
                condition.location,
                format!("if condition: {}", e),
            )),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        env: &Env,
        location: Location,
    ) -> Flow<Udm> {
        match op {
            BinOp::And | BinOp::Or => {
                let l = self.eval(left, env)?;
                let l = self.truth(op, &l, left.location)?;
                // && stops on false, || stops on true
                if l == (op == BinOp::Or) {
                    return Ok(Udm::Boolean(l));
                }
                let r = self.eval(right, env)?;
                let r = self.truth(op, &r, right.location)?;
                Ok(Udm::Boolean(r))
            }
            BinOp::NullCoalesce => {
                let value = self.eval(left, env)?;
                if value.is_null() {
                    self.eval(right, env)
                } else {
                    Ok(value)
                }
            }
            _ => {
                let (l, r) = self.eval_pair(left, right, env)?;
                operators::apply_binop(op, &l, &r)
                    .map_err(|message| self.report(ErrorKind::TypeMismatch, location, message))
            }
        }
    }

    fn truth(&mut self, op: BinOp, value: &Udm, location: Location) -> Flow<bool> {
        value.as_boolean().map_err(|e| {
            self.report(
                ErrorKind::TypeMismatch,
                location,
                format!("'{}' operand: {}", op, e),
            )
        })
    }

    /// Evaluate both operands so independent faults on each side are reported.
    fn eval_pair(&mut self, left: &Expr, right: &Expr, env: &Env) -> Flow<(Udm, Udm)> {
        let l = self.eval(left, env);
        if let Err(Fault::Abort(abort)) = l {
            return Err(Fault::Abort(abort));
        }
        let r = self.eval(right, env)?;
        Ok((l?, r))
    }

    fn eval_all(&mut self, exprs: &[Expr], env: &Env) -> Flow<Vec<Udm>> {
        self.eval_args(None, exprs, env)
    }

    /// Evaluate arguments in order, with an optional piped value first.
    fn eval_args(&mut self, piped: Option<Udm>, exprs: &[Expr], env: &Env) -> Flow<Vec<Udm>> {
        let mut values: Vec<Udm> = piped.into_iter().collect();
        let mut tainted = false;
        for expr in exprs {
            if let Some(value) = absorb(self.eval(expr, env), &mut tainted)? {
                values.push(value);
            }
        }
        if tainted {
            Err(Fault::Tainted)
        } else {
            Ok(values)
        }
    }

    fn eval_member(
        &mut self,
        object: &Expr,
        key: &MemberKey,
        safe: bool,
        env: &Env,
        location: Location,
    ) -> Flow<Udm> {
        let receiver = self.eval(object, env)?;
        let (segment, label) = match key {
            MemberKey::Property(name) => (PathSegment::Property(name.clone()), name.clone()),
            MemberKey::Attribute(name) => {
                (PathSegment::Attribute(name.clone()), format!("@{}", name))
            }
        };

        match &receiver {
            Udm::Null if safe => return Ok(Udm::Null),
            Udm::Null => {
                return Err(self.report(
                    ErrorKind::MissingPath,
                    location,
                    format!("cannot read '{}' of null", label),
                ));
            }
            Udm::Object(_) => {}
            other => {
                let found = other.type_name();
                return Err(self.report(
                    ErrorKind::TypeMismatch,
                    location,
                    format!("cannot read '{}' of {}", label, found),
                ));
            }
        }

        match receiver.get(slice::from_ref(&segment)) {
            Navigation::Found(value) => Ok(value.clone()),
            Navigation::Attribute(text) => Ok(Udm::from(text)),
            Navigation::Missing { .. } if safe => Ok(Udm::Null),
            Navigation::Missing { .. } => Err(self.report(
                ErrorKind::MissingPath,
                location,
                format!("'{}' is not present", label),
            )),
        }
    }

    fn eval_index(
        &mut self,
        object: &Expr,
        index: &Expr,
        env: &Env,
        location: Location,
    ) -> Flow<Udm> {
        let (target, index) = self.eval_pair(object, index, env)?;
        let segment = match (&target, &index) {
            (Udm::Null, _) => {
                return Err(self.report(ErrorKind::MissingPath, location, "cannot index null"));
            }
            (Udm::Array(_), Udm::Integer(i)) => PathSegment::Index(*i),
            (Udm::Object(_), Udm::String(key)) => PathSegment::Property(key.clone()),
            (t, i) => {
                let message = format!("cannot index {} with {}", t.type_name(), i.type_name());
                return Err(self.report(ErrorKind::TypeMismatch, location, message));
            }
        };

        if let Navigation::Found(value) = target.get(slice::from_ref(&segment)) {
            return Ok(value.clone());
        }
        let message = match (&segment, &target) {
            (PathSegment::Index(i), Udm::Array(items)) => format!(
                "index {} is out of bounds for array of length {}",
                i,
                items.len()
            ),
            (PathSegment::Property(key), _) => format!("'{}' is not present", key),
            _ => "path is not present".to_string(),
        };
        Err(self.report(ErrorKind::MissingPath, location, message))
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        piped: Option<Udm>,
        env: &Env,
        location: Location,
    ) -> Flow<Udm> {
        // A name not bound in scope refers to the function library
        if let ExprKind::Identifier(name) = &callee.kind
            && !env.contains(name)
        {
            return self.call_library(name, callee.location, args, piped, env, location);
        }

        let function = self.eval(callee, env);
        if let Err(Fault::Abort(abort)) = function {
            return Err(Fault::Abort(abort));
        }
        let values = self.eval_args(piped, args, env)?;
        self.apply(function?, values, location)
    }

    fn call_library(
        &mut self,
        name: &str,
        name_at: Location,
        args: &[Expr],
        piped: Option<Udm>,
        env: &Env,
        location: Location,
    ) -> Flow<Udm> {
        let values = self.eval_args(piped, args, env);
        if let Err(Fault::Abort(abort)) = values {
            return Err(Fault::Abort(abort));
        }
        let evaluator = self.evaluator;
        let Some(signature) = evaluator.stdlib.resolve(name) else {
            return Err(self.report(
                ErrorKind::UndefinedVariable,
                name_at,
                format!("undefined function '{}'", name),
            ));
        };
        let values = values?;
        if let Err(message) = signature.check(&values) {
            return Err(self.report(
                ErrorKind::FunctionCall,
                location,
                format!("{}; expected {}", message, signature),
            ));
        }
        trace!(function = %name, args = values.len(), "invoking library function");
        let result = evaluator
            .stdlib
            .invoke(name, values, &mut CallContext::new(self, location));
        match result {
            Ok(value) => Ok(value),
            Err(StdlibError::Failed(message)) => Err(self.report(
                ErrorKind::FunctionCall,
                location,
                format!("{}: {}", name, message),
            )),
            Err(StdlibError::Interrupted(interrupt)) => Err(interrupt.0),
        }
    }

    /// `value |> target`: the value becomes the first argument.
    fn pipe_into(&mut self, value: Udm, target: &Expr, env: &Env) -> Flow<Udm> {
        match &target.kind {
            ExprKind::Pipe {
                source,
                target: next,
            } => {
                let value = self.pipe_into(value, source, env)?;
                self.pipe_into(value, next, env)
            }
            ExprKind::Call { callee, args } => {
                self.eval_call(callee, args, Some(value), env, target.location)
            }
            ExprKind::Identifier(_) => {
                self.eval_call(target, &[], Some(value), env, target.location)
            }
            _ => {
                let function = self.eval(target, env)?;
                self.apply(function, vec![value], target.location)
            }
        }
    }

    fn apply(&mut self, function: Udm, args: Vec<Udm>, location: Location) -> Flow<Udm> {
        match function {
            Udm::Lambda(closure) => self.call_closure(&closure, args, location),
            other => {
                let found = other.type_name();
                Err(self.report(
                    ErrorKind::TypeMismatch,
                    location,
                    format!("cannot call a value of type {}", found),
                ))
            }
        }
    }

    pub(crate) fn call_closure(
        &mut self,
        closure: &Closure,
        args: Vec<Udm>,
        location: Location,
    ) -> Flow<Udm> {
        if args.len() != closure.params.len() {
            return Err(self.report(
                ErrorKind::FunctionCall,
                location,
                format!(
                    "lambda ({}) expects {} argument{}, got {}",
                    closure.params.join(", "),
                    closure.params.len(),
                    if closure.params.len() == 1 { "" } else { "s" },
                    args.len()
                ),
            ));
        }
        let mut env = closure.env.clone();
        for (param, arg) in closure.params.iter().zip(args) {
            env = env.bind(param.as_str(), arg);
        }
        self.eval(&closure.body, &env)
    }

    /// Entries apply in order; `let` bindings are visible to later entries.
    fn eval_object(&mut self, entries: &[ObjectEntry], env: &Env) -> Flow<Udm> {
        let mut object = Object::new();
        let mut scope = env.clone();
        let mut tainted = false;

        for entry in entries {
            match entry {
                ObjectEntry::Property { key, value } => {
                    if let Some(value) = absorb(self.eval(value, &scope), &mut tainted)? {
                        object = object.with_property(key.as_str(), value);
                    }
                }
                ObjectEntry::Attribute { name, value: expr } => {
                    let Some(value) = absorb(self.eval(expr, &scope), &mut tainted)? else {
                        continue;
                    };
                    match value.as_string() {
                        Ok(text) => object = object.with_attribute(name.as_str(), text),
                        Err(e) => {
                            let fault = self.report(
                                ErrorKind::TypeMismatch,
                                expr.location,
                                format!("attribute '@{}': {}", name, e),
                            );
                            absorb(Err(fault), &mut tainted)?;
                        }
                    }
                }
                ObjectEntry::Spread(source) => {
                    let Some(value) = absorb(self.eval(source, &scope), &mut tainted)? else {
                        continue;
                    };
                    match value {
                        Udm::Object(spread) => object = object.merged(&spread),
                        other => {
                            let fault = self.report(
                                ErrorKind::TypeMismatch,
                                source.location,
                                format!("cannot spread {} into an object", other.type_name()),
                            );
                            absorb(Err(fault), &mut tainted)?;
                        }
                    }
                }
                ObjectEntry::Let { name, value } => match self.eval(value, &scope) {
                    Ok(value) => scope = scope.bind(name.as_str(), value),
                    Err(Fault::Tainted) => scope = scope.bind_tainted(name.as_str()),
                    Err(abort) => return Err(abort),
                },
            }
        }

        if tainted {
            Err(Fault::Tainted)
        } else {
            Ok(Udm::Object(object))
        }
    }
}

/// Keep going past a tainted result, but not past an abort.
fn absorb(result: Flow<Udm>, tainted: &mut bool) -> Flow<Option<Udm>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Fault::Tainted) => {
            *tainted = true;
            Ok(None)
        }
        Err(abort) => Err(abort),
    }
}

fn closure(params: &[String], body: &Arc<Expr>, env: &Env) -> Udm {
    Udm::Lambda(Arc::new(Closure {
        params: params.to_vec(),
        body: Arc::clone(body),
        env: env.clone(),
    }))
}

fn literal_value(literal: &Literal) -> Udm {
    match literal {
        Literal::Null => Udm::Null,
        Literal::Boolean(b) => Udm::Boolean(*b),
        Literal::Integer(n) => Udm::Integer(*n),
        Literal::Float(n) => Udm::Float(*n),
        Literal::String(s) => Udm::String(s.clone()),
    }
}
