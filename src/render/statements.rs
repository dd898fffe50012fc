//! Statement rendering implementation
//!
//! This module handles rendering of the non-loop statements:
//!
//! - `if` / `else`
//! - Assignment and `print`
//! - Function definitions and calls
//! - `include` (raw splice) and `parse` (render a sub-template in place)
//!
//! # Function Calls
//!
//! A call evaluates its arguments in the caller's scope, then renders the
//! function body in a new frame built from the bindings captured at the
//! definition plus the parameters. The function's own name is bound inside
//! the frame so functions can recurse. The call's result is the value of the
//! first `return` reached; a body that never returns yields absent, which
//! prints as empty text.

use crate::context::value::{Callable, Value};
use crate::loader::normalize_path;
use crate::parser::ast::*;
use crate::parser::parse::compile_with;
use crate::render::engine::{ControlFlow, Renderer};
use crate::render::errors::RenderError;
use rustc_hash::FxHashMap;
use std::sync::Arc;

impl Renderer<'_> {
    pub(crate) fn execute_if(
        &mut self,
        condition: &AstNode,
        then_branch: &[AstNode],
        else_branch: Option<&[AstNode]>,
        output: &mut String,
    ) -> Result<ControlFlow, RenderError> {
        if self.evaluate_expr(condition)?.is_truthy() {
            self.render_block(then_branch, output)
        } else if let Some(else_stmts) = else_branch {
            self.render_block(else_stmts, output)
        } else {
            Ok(ControlFlow::Normal)
        }
    }

    pub(crate) fn execute_assignment(
        &mut self,
        name: &str,
        value: &AstNode,
    ) -> Result<(), RenderError> {
        let value = self.evaluate_expr(value)?;
        self.scopes.assign(name, value);
        Ok(())
    }

    pub(crate) fn execute_print(
        &mut self,
        expr: &AstNode,
        location: SourceLocation,
        output: &mut String,
    ) -> Result<(), RenderError> {
        let value = self.evaluate_expr(expr)?;
        match value.to_output() {
            Some(text) => {
                output.push_str(&text);
                Ok(())
            }
            None => Err(RenderError::type_error(
                format!("cannot print a {}", value.type_name()),
                location,
            )),
        }
    }

    /// Bind a function under its name, capturing what is visible now
    pub(crate) fn execute_function_def(
        &mut self,
        name: &str,
        params: &[String],
        body: &Arc<Block>,
    ) {
        let callable = Callable {
            name: name.to_string(),
            params: params.to_vec(),
            body: Arc::clone(body),
            captured: Arc::new(self.scopes.snapshot()),
        };
        self.scopes.assign(name, Value::Callable(Arc::new(callable)));
    }

    pub(crate) fn call_function(
        &mut self,
        name: &str,
        args: &[AstNode],
        location: SourceLocation,
    ) -> Result<Value, RenderError> {
        let callable = match self.scopes.get(name) {
            Some(Value::Callable(callable)) => Arc::clone(callable),
            None | Some(Value::Absent) => {
                return Err(RenderError::UndefinedFunction {
                    name: name.to_string(),
                    location,
                })
            }
            Some(other) => {
                return Err(RenderError::NotCallable {
                    name: name.to_string(),
                    found: other.type_name(),
                    location,
                })
            }
        };

        if args.len() < callable.params.len() {
            return Err(RenderError::ArgumentCountMismatch {
                function: name.to_string(),
                expected: callable.params.len(),
                got: args.len(),
                location,
            });
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.evaluate_expr(arg)?);
        }

        if self.scopes.call_depth() >= self.options.max_call_depth {
            return Err(RenderError::CallDepthExceeded {
                function: name.to_string(),
                limit: self.options.max_call_depth,
                location,
            });
        }

        tracing::trace!(function = name, args = arg_values.len(), "calling function");

        // Extra arguments are dropped by the zip
        let mut bindings = FxHashMap::default();
        bindings.insert(callable.name.clone(), Value::Callable(Arc::clone(&callable)));
        for (param, value) in callable.params.iter().zip(arg_values) {
            bindings.insert(param.clone(), value);
        }

        // Body text is discarded; only a returned value leaves the call
        self.scopes.push_frame(Arc::clone(&callable.captured), bindings);
        let mut discarded = String::new();
        let result = self.render_block(&callable.body, &mut discarded);
        self.scopes.pop_frame();

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Normal => Ok(Value::Absent),
        }
    }

    /// Evaluate the path operand of `include` / `parse`
    fn evaluate_path(&mut self, path: &AstNode, location: SourceLocation) -> Result<String, RenderError> {
        let value = self.evaluate_expr(path)?;
        match value.as_str() {
            Some(path) => Ok(path.to_string()),
            None => Err(RenderError::type_error(
                format!("template path must be a string, found {}", value.type_name()),
                location,
            )),
        }
    }

    fn read_template(&self, path: &str, location: SourceLocation) -> Result<String, RenderError> {
        self.loader
            .read_text(path)
            .map_err(|source| RenderError::TemplateNotFound { source, location })
    }

    /// Splice a file's text into the output without compiling it
    pub(crate) fn execute_include(
        &mut self,
        path: &AstNode,
        location: SourceLocation,
        output: &mut String,
    ) -> Result<(), RenderError> {
        let path = self.evaluate_path(path, location)?;
        tracing::debug!(path = %path, "including template");
        let text = self.read_template(&path, location)?;
        output.push_str(&text);
        Ok(())
    }

    /// Compile a file and render it in place against the current scope
    pub(crate) fn execute_parse(
        &mut self,
        path: &AstNode,
        location: SourceLocation,
        output: &mut String,
    ) -> Result<(), RenderError> {
        let path = normalize_path(&self.evaluate_path(path, location)?);

        if self.include_stack.contains(&path) {
            return Err(RenderError::SelfInclusion { path, location });
        }
        if self.include_depth >= self.options.max_include_depth {
            return Err(RenderError::IncludeDepthExceeded {
                path,
                limit: self.options.max_include_depth,
                location,
            });
        }

        tracing::debug!(path = %path, depth = self.include_depth + 1, "parsing template");
        let source = self.read_template(&path, location)?;
        let template = compile_with(&source, &self.compile_options).map_err(|source| {
            RenderError::Compile {
                path: path.clone(),
                source,
                location,
            }
        })?;

        self.include_stack.push(path);
        self.include_depth += 1;
        let result = self.render_block(&template.nodes, output);
        self.include_depth -= 1;
        self.include_stack.pop();

        // Sub-templates cannot return at top level, so the flow is always Normal
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{Context, Value};
    use crate::loader::MemoryLoader;
    use crate::parser::parse::compile;
    use crate::render::engine::{RenderOptions, Renderer};
    use crate::render::errors::{ErrorKind, RenderError};

    fn render_with(
        source: &str,
        context: &mut Context,
        loader: &MemoryLoader,
    ) -> Result<String, RenderError> {
        let template = compile(source).unwrap();
        Renderer::new(context, loader).render(&template)
    }

    fn render(source: &str) -> Result<String, RenderError> {
        render_with(source, &mut Context::new(), &MemoryLoader::new())
    }

    #[test]
    fn test_if_else() {
        let source = "{% if age < 18 %}minor{% else %}adult{% end %}";
        let mut young: Context = [("age", 15)].into_iter().collect();
        let mut old: Context = [("age", 40)].into_iter().collect();
        let loader = MemoryLoader::new();
        assert_eq!(render_with(source, &mut young, &loader).unwrap(), "minor");
        assert_eq!(render_with(source, &mut old, &loader).unwrap(), "adult");
        assert_eq!(render("{% if 0 %}x{% end %}").unwrap(), "");
    }

    #[test]
    fn test_function_return_value() {
        let source = "{% function double(x) %}{% return x * 2 %}{% end %}{{ double(21) }}";
        assert_eq!(render(source).unwrap(), "42");
    }

    #[test]
    fn test_function_without_return_yields_nothing() {
        let source = "{% function greet(name) %}Hello, {{ name }}!{% end %}[{% greet('Ada') %}]";
        assert_eq!(render(source).unwrap(), "[]");

        let source = "{% function f() %}body{% end %}[{{ f() }}]{% if f() %}yes{% else %}no{% end %}";
        assert_eq!(render(source).unwrap(), "[]no");
    }

    #[test]
    fn test_return_discards_earlier_body_text() {
        let source = "{% function f() %}noise{% return 'value' %}more{% end %}[{{ f() }}]";
        assert_eq!(render(source).unwrap(), "[value]");
    }

    #[test]
    fn test_too_few_arguments() {
        let err = render("{% function add(a, b) %}{% end %}{{ add(1) }}").unwrap_err();
        assert!(matches!(err, RenderError::ArgumentCountMismatch { expected: 2, got: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::Name);
    }

    #[test]
    fn test_extra_arguments_are_ignored() {
        let source = "{% function one(a) %}{% return a %}{% end %}{{ one(1, 2, 3) }}";
        assert_eq!(render(source).unwrap(), "1");
    }

    #[test]
    fn test_undefined_and_uncallable() {
        assert!(matches!(
            render("{{ nope() }}").unwrap_err(),
            RenderError::UndefinedFunction { .. }
        ));
        let err = render("{% x = 1 %}{{ x() }}").unwrap_err();
        assert!(matches!(err, RenderError::NotCallable { found: "integer", .. }));
        assert_eq!(err.kind(), ErrorKind::Name);
    }

    #[test]
    fn test_closure_captures_definition_scope() {
        let source = "{% n = 1 %}{% function get() %}{% return n %}{% end %}{% n = 2 %}{{ get() }}";
        assert_eq!(render(source).unwrap(), "1");
    }

    #[test]
    fn test_call_does_not_leak_assignments() {
        let mut context = Context::new();
        let source = "{% function f(a) %}{% inner = a %}{% end %}{% f(5) %}[{{ inner }}]";
        let out = render_with(source, &mut context, &MemoryLoader::new()).unwrap();
        assert_eq!(out, "[]");
        assert!(context.get("inner").is_none());
        assert!(matches!(context.get("f"), Some(Value::Callable(_))));
    }

    #[test]
    fn test_recursion() {
        let source = "{% function fact(n) %}{% if n < 2 %}{% return 1 %}{% end %}\
                      {% return n * fact(n - 1) %}{% end %}{{ fact(10) }}";
        assert_eq!(render(source).unwrap(), "3628800");
    }

    #[test]
    fn test_call_depth_limit() {
        let template = compile("{% function f() %}{% return f() %}{% end %}{{ f() }}").unwrap();
        let mut context = Context::new();
        let loader = MemoryLoader::new();
        let err = Renderer::new(&mut context, &loader)
            .with_options(RenderOptions::default().with_max_call_depth(8))
            .render(&template)
            .unwrap_err();
        assert!(matches!(err, RenderError::CallDepthExceeded { limit: 8, .. }));
        assert_eq!(err.kind(), ErrorKind::Recursion);
    }

    #[test]
    fn test_include_is_raw() {
        let loader = MemoryLoader::new().with("raw.html", "{{ not compiled }}");
        let out = render_with("<{% include 'raw.html' %}>", &mut Context::new(), &loader);
        assert_eq!(out.unwrap(), "<{{ not compiled }}>");
    }

    #[test]
    fn test_parse_renders_in_current_scope() {
        let loader = MemoryLoader::new().with("item.html", "<li>{{ p }}</li>");
        let source = "{% list p as items %}{% parse 'item.html' %}{% end %}";
        let mut context: Context = [("items", vec!["a", "b"])].into_iter().collect();
        assert_eq!(
            render_with(source, &mut context, &loader).unwrap(),
            "<li>a</li><li>b</li>"
        );
    }

    #[test]
    fn test_parse_assignments_reach_caller() {
        let loader = MemoryLoader::new().with("vars.html", "{% title = 'Home' %}");
        let out = render_with("{% parse 'vars.html' %}{{ title }}", &mut Context::new(), &loader);
        assert_eq!(out.unwrap(), "Home");
    }

    #[test]
    fn test_self_parse_is_recursion_error() {
        let loader = MemoryLoader::new().with("self.html", "x{% parse 'self.html' %}");
        let err = render_with("{% parse 'self.html' %}", &mut Context::new(), &loader).unwrap_err();
        assert!(matches!(err, RenderError::SelfInclusion { .. }));
        assert_eq!(err.kind(), ErrorKind::Recursion);
    }

    #[test]
    fn test_indirect_cycle_is_recursion_error() {
        let loader = MemoryLoader::new()
            .with("a.html", "{% parse 'b.html' %}")
            .with("b.html", "{% parse './a.html' %}");
        let err = render_with("{% parse 'a.html' %}", &mut Context::new(), &loader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Recursion);
    }

    #[test]
    fn test_missing_and_broken_targets() {
        let loader = MemoryLoader::new().with("bad.html", "{% if %}");
        let mut context = Context::new();
        let err = render_with("{% include 'gone.html' %}", &mut context, &loader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        let err = render_with("{% parse 'bad.html' %}", &mut context, &loader).unwrap_err();
        assert!(matches!(err, RenderError::Compile { .. }));
        assert_eq!(err.kind(), ErrorKind::Syntax);
        let err = render_with("{% include 3 %}", &mut context, &loader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }
}
