//! Loop statement rendering (`while`, `list`, `rlist`).
//!
//! Adds `impl Renderer` methods for the loop forms. A `return` inside a loop
//! body is reported through `LoopBodyResult` so the loop driver can stop and
//! hand the value to the enclosing call.
//!
//! A `while` body renders directly in the enclosing scope so its assignments
//! can end the loop. Each `list` iteration gets a fresh scope holding the
//! loop variable and the `first`, `last` and `index` metadata; it is
//! discarded when the iteration ends.

use crate::context::value::Value;
use crate::parser::ast::{AstNode, SourceLocation};
use crate::render::engine::{ControlFlow, Renderer};
use crate::render::errors::RenderError;
use rustc_hash::FxHashMap;

/// Result returned by [`Renderer::execute_loop_body`] to signal how the body ended.
pub(crate) enum LoopBodyResult {
    /// Body completed normally; the loop should iterate again.
    Continue,
    /// `return` ran inside the body; the loop unwinds with this signal.
    Exit(ControlFlow),
}

impl Renderer<'_> {
    /// Renders `body` once, inside a scope holding `bindings` when given.
    pub(crate) fn execute_loop_body(
        &mut self,
        bindings: Option<FxHashMap<String, Value>>,
        body: &[AstNode],
        output: &mut String,
    ) -> Result<LoopBodyResult, RenderError> {
        let scoped = bindings.is_some();
        if let Some(bindings) = bindings {
            self.scopes.push_scope(bindings);
        }
        let result = self.render_block(body, output);
        if scoped {
            self.scopes.pop_scope();
        }

        match result? {
            ControlFlow::Normal => Ok(LoopBodyResult::Continue),
            flow => Ok(LoopBodyResult::Exit(flow)),
        }
    }

    /// Renders a `while condition ... end` loop.
    ///
    /// The condition is evaluated before each iteration. When
    /// [`max_loop_iterations`](crate::RenderOptions::max_loop_iterations) is
    /// set, running past it is an error.
    pub(crate) fn execute_while(
        &mut self,
        condition: &AstNode,
        body: &[AstNode],
        location: SourceLocation,
        output: &mut String,
    ) -> Result<ControlFlow, RenderError> {
        let mut iterations: usize = 0;

        while self.evaluate_expr(condition)?.is_truthy() {
            if let Some(limit) = self.options.max_loop_iterations {
                if iterations >= limit {
                    return Err(RenderError::LoopLimitExceeded { limit, location });
                }
            }
            iterations += 1;

            if let LoopBodyResult::Exit(flow) = self.execute_loop_body(None, body, output)? {
                return Ok(flow);
            }
        }

        Ok(ControlFlow::Normal)
    }

    /// Renders `list var as collection ... end`, or `rlist` when `reverse`.
    ///
    /// An absent collection renders nothing; any other non-list is a type error.
    pub(crate) fn execute_list(
        &mut self,
        var: &str,
        collection: &[String],
        reverse: bool,
        body: &[AstNode],
        location: SourceLocation,
        output: &mut String,
    ) -> Result<ControlFlow, RenderError> {
        let value = self.scopes.lookup(collection);
        if value.is_absent() {
            tracing::trace!(collection = %collection.join("."), "iterating absent collection");
            return Ok(ControlFlow::Normal);
        }
        let Some(items) = value.as_list() else {
            return Err(RenderError::type_error(
                format!(
                    "cannot iterate over '{}', a {}",
                    collection.join("."),
                    value.type_name()
                ),
                location,
            ));
        };
        let mut items = items.to_vec();
        if reverse {
            items.reverse();
        }

        let len = items.len();
        for (index, item) in items.into_iter().enumerate() {
            let mut bindings = FxHashMap::default();
            bindings.insert("first".to_string(), Value::Boolean(index == 0));
            bindings.insert("last".to_string(), Value::Boolean(index + 1 == len));
            bindings.insert("index".to_string(), Value::from(index));
            // The loop variable wins over metadata of the same name
            bindings.insert(var.to_string(), item);

            if let LoopBodyResult::Exit(flow) =
                self.execute_loop_body(Some(bindings), body, output)?
            {
                return Ok(flow);
            }
        }

        Ok(ControlFlow::Normal)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{Context, Value};
    use crate::loader::MemoryLoader;
    use crate::parser::parse::compile;
    use crate::render::engine::{RenderOptions, Renderer};
    use crate::render::errors::{ErrorKind, RenderError};

    fn render_with(source: &str, context: &mut Context) -> Result<String, RenderError> {
        let template = compile(source).unwrap();
        let loader = MemoryLoader::new();
        Renderer::new(context, &loader).render(&template)
    }

    fn pages() -> Context {
        let pages: Vec<Value> = ["a", "b", "c"]
            .into_iter()
            .map(|title| [("title", title)].into_iter().collect())
            .collect();
        [("pages", pages)].into_iter().collect()
    }

    #[test]
    fn test_list_and_rlist_order() {
        let mut context = pages();
        assert_eq!(
            render_with("{% list p as pages %}{{ p.title }}{% end %}", &mut context).unwrap(),
            "abc"
        );
        assert_eq!(
            render_with("{% rlist p as pages %}{{ p.title }}{% end %}", &mut context).unwrap(),
            "cba"
        );
    }

    #[test]
    fn test_loop_metadata() {
        let mut context = pages();
        let source = "{% list p as pages %}{% if first %}[{% end %}{{ index }}{{ p.title }}\
                      {% if last %}]{% else %},{% end %}{% end %}";
        assert_eq!(render_with(source, &mut context).unwrap(), "[0a,1b,2c]");
        assert!(context.get("first").is_none());
        assert!(context.get("p").is_none());
    }

    #[test]
    fn test_rlist_metadata_follows_iteration_order() {
        let mut context = pages();
        let source = "{% rlist p as pages %}{% if first %}{{ p.title }}{% end %}{% end %}";
        assert_eq!(render_with(source, &mut context).unwrap(), "c");
    }

    #[test]
    fn test_absent_and_invalid_collections() {
        let mut context: Context = [("n", 3)].into_iter().collect();
        assert_eq!(
            render_with("{% list x as missing %}{{ x }}{% end %}", &mut context).unwrap(),
            ""
        );
        let err = render_with("{% list x as n %}{% end %}", &mut context).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_loop_scope_is_discarded() {
        let mut context: Context = [("items", vec![1, 2])].into_iter().collect();
        context.insert("total", 0);
        let source = "{% list i as items %}{% total = total + i %}{{ total }}{% end %}|{{ total }}";
        assert_eq!(render_with(source, &mut context).unwrap(), "12|0");
        assert_eq!(context.get("total"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_while_counts() {
        let mut context = Context::new();
        let source = "{% i = 0 %}{% while i < 3 %}{{ i }}{% i = i + 1 %}{% end %}";
        assert_eq!(render_with(source, &mut context).unwrap(), "012");
        assert_eq!(context.get("i"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_while_limit() {
        let template = compile("{% while true %}x{% end %}").unwrap();
        let mut context = Context::new();
        let loader = MemoryLoader::new();
        let err = Renderer::new(&mut context, &loader)
            .with_options(RenderOptions::default().with_max_loop_iterations(Some(5)))
            .render(&template)
            .unwrap_err();
        assert!(matches!(err, RenderError::LoopLimitExceeded { limit: 5, .. }));
        assert_eq!(err.kind(), ErrorKind::Limit);
    }

    #[test]
    fn test_return_inside_loop_stops_the_call() {
        let mut context: Context = [("items", vec![4, 7, 9])].into_iter().collect();
        let source = "{% function first_odd(xs) %}{% list x as xs %}{% if x % 2 == 1 %}\
                      {% return x %}{% end %}{% end %}{% return 0 %}{% end %}{{ first_odd(items) }}";
        assert_eq!(render_with(source, &mut context).unwrap(), "7");
    }
}
