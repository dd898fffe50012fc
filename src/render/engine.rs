// Rendering engine for compiled templates

use crate::context::{Context, ScopeStack};
use crate::context::value::Value;
use crate::loader::{normalize_path, Loader};
use crate::parser::ast::*;
use crate::parser::parse::CompileOptions;
use crate::render::constants::{MAX_CALL_DEPTH, MAX_INCLUDE_DEPTH, MAX_LOOP_ITERATIONS};
use crate::render::errors::RenderError;

/// Limits applied while rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum nesting of `parse` statements
    pub max_include_depth: usize,
    /// Maximum nesting of function calls
    pub max_call_depth: usize,
    /// Iteration cap for each `while` loop; `None` disables the cap
    pub max_loop_iterations: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            max_include_depth: MAX_INCLUDE_DEPTH,
            max_call_depth: MAX_CALL_DEPTH,
            max_loop_iterations: Some(MAX_LOOP_ITERATIONS),
        }
    }
}

impl RenderOptions {
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_loop_iterations(mut self, limit: Option<usize>) -> Self {
        self.max_loop_iterations = limit;
        self
    }
}

/// Result of rendering a node sequence
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ControlFlow {
    /// Keep rendering the following siblings
    Normal,
    /// A `return` ran; siblings are skipped up to the enclosing call
    Return(Value),
}

/// Renders compiled templates against one caller-owned [`Context`]
pub struct Renderer<'a> {
    /// Caller's context plus loop and call scopes
    pub(crate) scopes: ScopeStack<'a>,

    /// Source of `include` and `parse` targets
    pub(crate) loader: &'a dyn Loader,

    pub(crate) options: RenderOptions,

    /// Options for templates compiled by `parse`
    pub(crate) compile_options: CompileOptions,

    /// Normalized paths of the templates being rendered, outermost first
    pub(crate) include_stack: Vec<String>,

    /// Number of active `parse` statements
    pub(crate) include_depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(context: &'a mut Context, loader: &'a dyn Loader) -> Self {
        Renderer {
            scopes: ScopeStack::new(context),
            loader,
            options: RenderOptions::default(),
            compile_options: CompileOptions::default(),
            include_stack: Vec::new(),
            include_depth: 0,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_compile_options(mut self, compile_options: CompileOptions) -> Self {
        self.compile_options = compile_options;
        self
    }

    /// Render a template to completion. On error nothing is returned; the
    /// context keeps any assignments made before the failure.
    pub fn render(&mut self, template: &Template) -> Result<String, RenderError> {
        let name = template.name().map(normalize_path);
        tracing::debug!(
            template = name.as_deref().unwrap_or("<inline>"),
            "rendering template"
        );

        if let Some(name) = &name {
            self.include_stack.push(name.clone());
        }
        let mut output = String::new();
        let result = self.render_block(&template.nodes, &mut output);
        if name.is_some() {
            self.include_stack.pop();
        }
        result?;

        tracing::debug!(bytes = output.len(), "rendered template");
        Ok(output)
    }

    /// Render `block` in order, stopping at the first `return`
    pub(crate) fn render_block(
        &mut self,
        block: &[AstNode],
        output: &mut String,
    ) -> Result<ControlFlow, RenderError> {
        for node in block {
            let flow = self.execute_statement(node, output)?;
            if !matches!(flow, ControlFlow::Normal) {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Render a single node, appending any text it produces
    fn execute_statement(
        &mut self,
        node: &AstNode,
        output: &mut String,
    ) -> Result<ControlFlow, RenderError> {
        match node {
            AstNode::Text(text, _) => {
                output.push_str(text);
            }

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                return self.execute_if(condition, then_branch, else_branch.as_deref(), output);
            }

            AstNode::While {
                condition,
                body,
                location,
            } => {
                return self.execute_while(condition, body, *location, output);
            }

            AstNode::List {
                var,
                collection,
                reverse,
                body,
                location,
            } => {
                return self.execute_list(var, collection, *reverse, body, *location, output);
            }

            AstNode::Assignment { name, value, .. } => {
                self.execute_assignment(name, value)?;
            }

            AstNode::FunctionDef {
                name, params, body, ..
            } => {
                self.execute_function_def(name, params, body);
            }

            AstNode::Return { expr, .. } => {
                return self.execute_return(expr);
            }

            AstNode::Print { expr, location } => {
                self.execute_print(expr, *location, output)?;
            }

            AstNode::Include { path, location } => {
                self.execute_include(path, *location, output)?;
            }

            AstNode::Parse { path, location } => {
                self.execute_parse(path, *location, output)?;
            }

            // A call statement prints its result like `{{ f(x) }}`
            AstNode::NumberLiteral(..)
            | AstNode::StringLiteral(..)
            | AstNode::BooleanLiteral(..)
            | AstNode::Variable { .. }
            | AstNode::UnaryOp { .. }
            | AstNode::BinaryOp { .. }
            | AstNode::FunctionCall { .. } => {
                self.execute_print(node, *node.location(), output)?;
            }
        }

        Ok(ControlFlow::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::parser::parse::compile;
    use crate::render::errors::ErrorKind;

    fn render_with(source: &str, context: &mut Context) -> Result<String, RenderError> {
        let template = compile(source).unwrap();
        let loader = MemoryLoader::new();
        Renderer::new(context, &loader).render(&template)
    }

    fn render(source: &str) -> Result<String, RenderError> {
        render_with(source, &mut Context::new())
    }

    #[test]
    fn test_text_passes_through() {
        assert_eq!(render("plain { text } %}").unwrap(), "plain { text } %}");
        assert_eq!(render("").unwrap(), "");
    }

    #[test]
    fn test_print_forms() {
        assert_eq!(render("{{ 1 }}{{ 'a' }}{{ true }}{% print false %}").unwrap(), "1atruefalse");
        assert_eq!(render("[{{ missing }}]").unwrap(), "[]");
    }

    #[test]
    fn test_top_level_assignment_persists() {
        let mut context = Context::new();
        assert_eq!(render_with("{% x = 2 * 3 %}{{ x }}", &mut context).unwrap(), "6");
        assert_eq!(context.get("x"), Some(&Value::Integer(6)));
    }

    #[test]
    fn test_error_discards_output() {
        let err = render("before{{ 1 / 0 }}after").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arithmetic);
        assert_eq!(err.location(), SourceLocation::new(1, 12));
    }

    #[test]
    fn test_printing_a_list_is_a_type_error() {
        let mut context: Context = [("items", vec![1, 2])].into_iter().collect();
        let err = render_with("{{ items }}", &mut context).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_options_builders() {
        let options = RenderOptions::default()
            .with_max_call_depth(3)
            .with_max_include_depth(2)
            .with_max_loop_iterations(None);
        assert_eq!(options.max_call_depth, 3);
        assert_eq!(options.max_include_depth, 2);
        assert_eq!(options.max_loop_iterations, None);
        assert_eq!(RenderOptions::default().max_loop_iterations, Some(MAX_LOOP_ITERATIONS));
    }
}
