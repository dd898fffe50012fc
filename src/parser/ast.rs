// AST (Abstract Syntax Tree) definitions for compiled templates

use std::fmt;
use std::sync::Arc;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical (short-circuiting)
    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg, // -x
    Not, // not x
}

/// A statement sequence sharing one scope, closed by `end`
pub type Block = Vec<AstNode>;

/// AST nodes representing statements and expressions
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // Literal template text between tags
    Text(String, SourceLocation),

    // Expressions
    NumberLiteral(i64, SourceLocation),
    StringLiteral(String, SourceLocation),
    BooleanLiteral(bool, SourceLocation),
    Variable {
        path: Vec<String>, // `page.meta.title` -> ["page", "meta", "title"]
        location: SourceLocation,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    FunctionCall {
        name: String,
        args: Vec<AstNode>,
        location: SourceLocation,
    },

    // Statements
    If {
        condition: Box<AstNode>,
        then_branch: Block,
        else_branch: Option<Block>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Block,
        location: SourceLocation,
    },
    List {
        var: String,
        collection: Vec<String>,
        reverse: bool,
        body: Block,
        location: SourceLocation,
    },
    Assignment {
        name: String,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    FunctionDef {
        name: String,
        params: Vec<String>,
        // Shared with every callable created from this definition
        body: Arc<Block>,
        location: SourceLocation,
    },
    Return {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    Print {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    Include {
        path: Box<AstNode>,
        location: SourceLocation,
    },
    Parse {
        path: Box<AstNode>,
        location: SourceLocation,
    },
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            AstNode::Text(_, loc) => loc,
            AstNode::NumberLiteral(_, loc) => loc,
            AstNode::StringLiteral(_, loc) => loc,
            AstNode::BooleanLiteral(_, loc) => loc,
            AstNode::Variable { location, .. } => location,
            AstNode::UnaryOp { location, .. } => location,
            AstNode::BinaryOp { location, .. } => location,
            AstNode::FunctionCall { location, .. } => location,
            AstNode::If { location, .. } => location,
            AstNode::While { location, .. } => location,
            AstNode::List { location, .. } => location,
            AstNode::Assignment { location, .. } => location,
            AstNode::FunctionDef { location, .. } => location,
            AstNode::Return { location, .. } => location,
            AstNode::Print { location, .. } => location,
            AstNode::Include { location, .. } => location,
            AstNode::Parse { location, .. } => location,
        }
    }

    /// Count this node and every node nested below it
    pub fn node_count(&self) -> usize {
        let children: usize = match self {
            AstNode::Text(..)
            | AstNode::NumberLiteral(..)
            | AstNode::StringLiteral(..)
            | AstNode::BooleanLiteral(..)
            | AstNode::Variable { .. } => 0,
            AstNode::UnaryOp { operand, .. } => operand.node_count(),
            AstNode::BinaryOp { left, right, .. } => left.node_count() + right.node_count(),
            AstNode::FunctionCall { args, .. } => args.iter().map(AstNode::node_count).sum(),
            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                condition.node_count()
                    + block_node_count(then_branch)
                    + else_branch.as_deref().map_or(0, block_node_count)
            }
            AstNode::While {
                condition, body, ..
            } => condition.node_count() + block_node_count(body),
            AstNode::List { body, .. } => block_node_count(body),
            AstNode::FunctionDef { body, .. } => block_node_count(body),
            AstNode::Assignment { value: expr, .. }
            | AstNode::Return { expr, .. }
            | AstNode::Print { expr, .. }
            | AstNode::Include { path: expr, .. }
            | AstNode::Parse { path: expr, .. } => expr.node_count(),
        };
        children + 1
    }
}

pub(crate) fn block_node_count(block: &[AstNode]) -> usize {
    block.iter().map(AstNode::node_count).sum()
}

/// A compiled template: the root block plus the name it was loaded under
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub nodes: Block,
    name: Option<String>,
}

impl Template {
    pub fn new(nodes: Block) -> Self {
        Template { nodes, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Path the template was loaded from, if it came through a loader
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
