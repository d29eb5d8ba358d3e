//! Compilation sessions
//!
//! A [`Session`] is one compilation unit: it parses source, checks each
//! declaration in order against everything declared before it, and
//! evaluates globals and standalone expressions on demand.

use crate::config::SessionConfig;
use crate::environment::Environment;
use crate::error::Error;
use crate::parser::ast::{Expr, Item, ItemKind};
use crate::parser::checker::{CheckerOptions, FixtureReport, TypeChecker};
use crate::parser::parser::Parser;
use crate::parser::types::Ty;
use crate::vm::{Env, HostPrimitives, StandardHost, Transcript, Value, VmError};
use std::rc::Rc;

/// Declarations loaded before any user source.
pub const PRELUDE: &str = include_str!("prelude.meml");

/// One compilation unit.
pub struct Session {
    env: Environment,
    config: SessionConfig,
    transcript: Option<Transcript>,

    // Resolved method calls are keyed by node address, so every parsed
    // tree stays alive as long as the session.
    items: Vec<Rc<Item>>,
    expressions: Vec<Rc<Expr>>,

    report: FixtureReport,
    normalizations: usize,
}

impl Session {
    /// Session with the default configuration and a [`StandardHost`].
    pub fn new() -> Result<Self, Error> {
        Self::with_config(SessionConfig::default())
    }

    /// Session with a [`StandardHost`] whose output is kept in a transcript.
    pub fn with_config(config: SessionConfig) -> Result<Self, Error> {
        let host = StandardHost::new();
        let transcript = host.transcript();
        let mut session = Self::with_host(config, Box::new(host))?;
        session.transcript = Some(transcript);
        Ok(session)
    }

    /// Session served by a custom host.
    pub fn with_host(config: SessionConfig, host: Box<dyn HostPrimitives>) -> Result<Self, Error> {
        config.validate()?;
        let mut env = Environment::new(host);
        env.max_call_depth = config.max_call_depth;

        let mut session = Self {
            env,
            config,
            transcript: None,
            items: Vec::new(),
            expressions: Vec::new(),
            report: FixtureReport::default(),
            normalizations: 0,
        };
        if session.config.prelude {
            session.load(PRELUDE)?;
        }
        Ok(session)
    }

    /// Parse and check `source`, registering its declarations.
    ///
    /// Stops at the first error. A parse error registers nothing; after a
    /// check error the declarations before it stay registered, along with
    /// the operators they declared. A function may be used before its
    /// declaration in the same source.
    pub fn load(&mut self, source: &str) -> Result<FixtureReport, Error> {
        let operators = self.env.operators.len();
        let parsed = Parser::new(source, &mut self.env.interner, &mut self.env.operators)?
            .with_max_depth(self.config.max_parse_depth)
            .parse();
        let items: Vec<Rc<Item>> = match parsed {
            Ok(items) => items.into_iter().map(Rc::new).collect(),
            Err(err) => {
                self.env.operators.truncate(operators);
                return Err(err.into());
            }
        };
        self.items.extend(items.iter().cloned());

        let options = self.checker_options();
        let mut checker = TypeChecker::new(&mut self.env).with_options(options);
        checker.expect_forward(&items);
        let mut report = FixtureReport::default();
        let mut failure = None;
        for (index, item) in items.iter().enumerate() {
            match checker.check_directed(item) {
                Ok(outcome) => report.record(&outcome),
                Err(err) => {
                    checker.discard_forward();
                    failure = Some((index, err));
                    break;
                }
            }
        }
        self.normalizations += checker.normalizations();

        if let Some((index, err)) = failure {
            let kept = items[..index]
                .iter()
                .filter(|item| matches!(item.kind, ItemKind::Infix(_)))
                .count();
            self.env.operators.truncate(operators + kept);
            return Err(err.into());
        }

        self.report.checked += report.checked;
        self.report.expected_failures += report.expected_failures;
        tracing::info!(
            checked = report.checked,
            expected_failures = report.expected_failures,
            normalizations = self.normalizations,
            "loaded source"
        );
        Ok(report)
    }

    /// Value of the global `name`.
    pub fn evaluate(&mut self, name: &str) -> Result<Value, Error> {
        let symbol = self
            .env
            .interner
            .get(name)
            .filter(|symbol| self.env.globals.contains(*symbol))
            .ok_or_else(|| VmError::UndefinedGlobal {
                name: name.to_string(),
            })?;
        Ok(self.env.interpreter().global(symbol)?)
    }

    /// Call the global function `name`.
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let function = self.evaluate(name)?;
        Ok(self.env.interpreter().apply(function, args)?)
    }

    /// Call `main()`.
    pub fn run_main(&mut self) -> Result<Value, Error> {
        self.call("main", Vec::new())
    }

    /// Check and evaluate a standalone expression.
    pub fn eval_expression(&mut self, source: &str) -> Result<Value, Error> {
        let expr = self.check_expression(source)?.0;
        Ok(self.env.interpreter().eval(&expr, &Env::empty())?)
    }

    /// Infer the type of a standalone expression, rendered.
    pub fn type_of(&mut self, source: &str) -> Result<String, Error> {
        let ty = self.check_expression(source)?.1;
        Ok(self.display_type(&ty))
    }

    fn check_expression(&mut self, source: &str) -> Result<(Rc<Expr>, Ty), Error> {
        let expr = Parser::new(source, &mut self.env.interner, &mut self.env.operators)?
            .with_max_depth(self.config.max_parse_depth)
            .parse_standalone_expression()?;
        let expr = Rc::new(expr);
        self.expressions.push(Rc::clone(&expr));

        let options = self.checker_options();
        let ty = TypeChecker::new(&mut self.env)
            .with_options(options)
            .infer_expression(&expr)?;
        Ok((expr, ty))
    }

    fn checker_options(&self) -> CheckerOptions {
        CheckerOptions {
            trace_typing: self.config.trace_typing,
        }
    }

    /// Render a value.
    pub fn render(&self, value: &Value) -> String {
        value
            .display(&self.env.interner, &self.env.types)
            .to_string()
    }

    /// Render a type.
    pub fn display_type(&self, ty: &Ty) -> String {
        ty.display(&self.env.interner).to_string()
    }

    /// Lines printed so far, if the host keeps a transcript.
    pub fn output(&self) -> Vec<String> {
        self.transcript
            .as_ref()
            .map(Transcript::lines)
            .unwrap_or_default()
    }

    /// Take the printed lines.
    pub fn take_output(&self) -> Vec<String> {
        self.transcript
            .as_ref()
            .map(Transcript::take)
            .unwrap_or_default()
    }

    /// Declarations checked so far, across every load
    pub fn report(&self) -> &FixtureReport {
        &self.report
    }

    /// Annotations evaluated so far
    pub fn normalizations(&self) -> usize {
        self.normalizations
    }

    /// Configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Declaration state
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Declaration state, mutably
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }
}
