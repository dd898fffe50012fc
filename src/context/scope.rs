//! Render context and scope stack
//!
//! This module provides the name-to-value bindings used while rendering:
//! - [`Context`]: the caller-owned top-level bindings for one render call
//! - [`ScopeStack`]: derived scopes layered over a [`Context`] while a
//!   template runs
//!
//! # Scoping Model
//!
//! Each loop iteration pushes a scope holding the iteration bindings and
//! pops it afterwards. Each function call pushes a frame whose base is the
//! function's captured bindings instead of the caller's. Assignments write
//! into the innermost scope, so top-level assignments land in the
//! [`Context`] while assignments inside a loop body or call are discarded
//! with it.

use super::value::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Top-level bindings a template is rendered against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: FxHashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object. Returns `None` for any other JSON
    /// value.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match Value::from(json) {
            Value::Map(vars) => Some(Context { vars }),
            _ => None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Resolve a dotted path such as `page.meta.title`
    pub fn lookup(&self, path: &str) -> Value {
        let mut keys = path.split('.');
        match keys.next().and_then(|first| self.vars.get(first)) {
            Some(value) => {
                let rest: Vec<&str> = keys.collect();
                value.get_path(rest.as_slice())
            }
            None => Value::Absent,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub(crate) fn vars(&self) -> &FxHashMap<String, Value> {
        &self.vars
    }

    pub(crate) fn vars_mut(&mut self) -> &mut FxHashMap<String, Value> {
        &mut self.vars
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        context.extend(iter);
        context
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Context {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

/// Bindings of one function call
#[derive(Debug)]
struct Frame {
    /// Bindings captured when the function was defined
    captured: Arc<FxHashMap<String, Value>>,
    scopes: Vec<FxHashMap<String, Value>>,
}

/// Derived scopes layered over a caller's [`Context`]
#[derive(Debug)]
pub struct ScopeStack<'a> {
    globals: &'a mut Context,
    /// Loop scopes opened outside any function call
    scopes: Vec<FxHashMap<String, Value>>,
    frames: Vec<Frame>,
}

impl<'a> ScopeStack<'a> {
    pub fn new(globals: &'a mut Context) -> Self {
        ScopeStack {
            globals,
            scopes: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn current_scopes(&self) -> &[FxHashMap<String, Value>] {
        match self.frames.last() {
            Some(frame) => &frame.scopes,
            None => &self.scopes,
        }
    }

    fn current_scopes_mut(&mut self) -> &mut Vec<FxHashMap<String, Value>> {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.scopes,
            None => &mut self.scopes,
        }
    }

    /// Bindings under the current scopes: the captured bindings inside a
    /// call, the global context otherwise
    fn base(&self) -> &FxHashMap<String, Value> {
        match self.frames.last() {
            Some(frame) => &frame.captured,
            None => self.globals.vars(),
        }
    }

    /// Look up a single name, innermost scope first
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.current_scopes()
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.base().get(name))
    }

    /// Resolve a dotted path; unresolved paths are [`Value::Absent`]
    pub fn lookup(&self, path: &[String]) -> Value {
        match path.split_first() {
            Some((first, rest)) => match self.get(first) {
                Some(value) => value.get_path(rest),
                None => Value::Absent,
            },
            None => Value::Absent,
        }
    }

    /// Bind `name` in the innermost scope
    pub fn assign(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(scope) = self.current_scopes_mut().last_mut() {
            scope.insert(name, value);
        } else if let Some(frame) = self.frames.last_mut() {
            frame.scopes.push(FxHashMap::from_iter([(name, value)]));
        } else {
            self.globals.vars_mut().insert(name, value);
        }
    }

    pub fn push_scope(&mut self, bindings: FxHashMap<String, Value>) {
        self.current_scopes_mut().push(bindings);
    }

    pub fn pop_scope(&mut self) {
        self.current_scopes_mut().pop();
    }

    /// Enter a function call whose body sees `captured` overlaid with
    /// `bindings`
    pub fn push_frame(
        &mut self,
        captured: Arc<FxHashMap<String, Value>>,
        bindings: FxHashMap<String, Value>,
    ) {
        self.frames.push(Frame {
            captured,
            scopes: vec![bindings],
        });
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Number of active function calls
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Flatten everything currently visible into one map, inner bindings
    /// shadowing outer ones
    pub fn snapshot(&self) -> FxHashMap<String, Value> {
        let mut flat = self.base().clone();
        for scope in self.current_scopes() {
            flat.extend(scope.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        flat
    }
}
