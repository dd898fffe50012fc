//! Statement parsing implementation
//!
//! This module handles template-level structure and every statement form:
//!
//! - Literal text runs and `{{ expr }}` output tags
//! - Command tags holding one or more statements
//! - Block statements: `if`/`else`, `while`, `list`/`rlist`, `function`,
//!   each closed by `{% end %}`
//! - Simple statements: assignment, call, `return`, `print`, `include`, `parse`
//!
//! # Grammar
//!
//! ```text
//! template  ::= node*
//! node      ::= TEXT | '{{' expr '}}' | '{%' stmt* '%}'
//! stmt      ::= assignment | if_stmt | while_stmt | list_stmt | function_def
//!             | call_stmt | return_stmt | print_stmt | include_stmt | parse_stmt
//! if_stmt   ::= 'if' expr '%}' node* ['{%' 'else' '%}' node*] '{%' 'end'
//! list_stmt ::= ('list' | 'rlist') IDENT 'as' path '%}' node* '{%' 'end'
//! ```
//!
//! A block-opening statement must be the last statement of its tag.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Symbol, Token};
use crate::parser::parse::{Parser, SyntaxError};
use std::sync::Arc;

/// The open block a node sequence belongs to
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenBlock {
    keyword: Keyword,
    location: SourceLocation,
    allow_else: bool,
}

/// Tag that ended a block's node sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminator {
    End,
    Else,
}

impl Parser {
    /// Parse nodes until end of input (`open` is `None`) or until the tag
    /// that closes `open`.
    pub(crate) fn parse_nodes(
        &mut self,
        open: Option<OpenBlock>,
    ) -> Result<(Block, Terminator), SyntaxError> {
        self.nested(|parser| parser.parse_node_sequence(open))
    }

    fn parse_node_sequence(
        &mut self,
        open: Option<OpenBlock>,
    ) -> Result<(Block, Terminator), SyntaxError> {
        let mut nodes = Vec::new();

        loop {
            match self.peek() {
                Token::Eof(_) => {
                    return match open {
                        None => Ok((nodes, Terminator::End)),
                        Some(block) => Err(SyntaxError {
                            message: format!(
                                "Unterminated '{}' block opened at {}, expected '{{% end %}}'",
                                block.keyword.as_str(),
                                block.location
                            ),
                            location: self.current_location(),
                        }),
                    };
                }
                Token::Text(text, loc) => {
                    nodes.push(AstNode::Text(text.clone(), *loc));
                    self.advance();
                }
                Token::Symbol(Symbol::OutputOpen, _) => {
                    nodes.push(self.parse_output_tag()?);
                }
                Token::Symbol(Symbol::CommandOpen, _) => {
                    if let Some(terminator) = self.parse_block_terminator(open)? {
                        return Ok((nodes, terminator));
                    }
                    self.parse_command_tag(&mut nodes)?;
                }
                _ => return Err(self.error_here("Expected template text or tag")),
            }
        }
    }

    /// `{{ expr }}` is an implicit print
    fn parse_output_tag(&mut self) -> Result<AstNode, SyntaxError> {
        let location = self.expect_symbol(Symbol::OutputOpen, "to open output tag")?;
        let expr = self.parse_expression()?;
        self.expect_symbol(Symbol::OutputClose, "after expression")?;
        Ok(AstNode::Print {
            expr: Box::new(expr),
            location,
        })
    }

    /// Consume `{% end %}` / `{% else %}` if it closes `open`.
    /// Returns `None` when the next tag is an ordinary command tag.
    fn parse_block_terminator(
        &mut self,
        open: Option<OpenBlock>,
    ) -> Result<Option<Terminator>, SyntaxError> {
        let (terminator, location) = match self.peek_ahead(1) {
            Some(Token::Keyword(Keyword::End, loc)) => (Terminator::End, *loc),
            Some(Token::Keyword(Keyword::Else, loc)) => (Terminator::Else, *loc),
            _ => return Ok(None),
        };
        let word = match terminator {
            Terminator::End => "end",
            Terminator::Else => "else",
        };

        let block = open.ok_or_else(|| SyntaxError {
            message: format!("Unmatched '{}' with no open block", word),
            location,
        })?;
        if terminator == Terminator::Else && !block.allow_else {
            return Err(SyntaxError {
                message: format!(
                    "Unexpected 'else' in '{}' block opened at {}",
                    block.keyword.as_str(),
                    block.location
                ),
                location,
            });
        }

        self.advance(); // {%
        self.advance(); // end / else
        self.expect_tag_close(&format!("after '{}'", word))?;
        Ok(Some(terminator))
    }

    /// Parse the statements of one `{% ... %}` tag
    fn parse_command_tag(&mut self, nodes: &mut Block) -> Result<(), SyntaxError> {
        self.expect_symbol(Symbol::CommandOpen, "to open command tag")?;

        loop {
            if self.match_symbol(Symbol::CommandClose) {
                return Ok(());
            }
            let opens_block = matches!(
                self.peek(),
                Token::Keyword(
                    Keyword::If | Keyword::While | Keyword::List | Keyword::Rlist | Keyword::Function,
                    _
                )
            );
            nodes.push(self.parse_statement()?);
            if opens_block {
                // The block consumed everything through its `{% end %}`
                return Ok(());
            }
        }
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, SyntaxError> {
        let loc = self.current_location();

        let keyword = match self.peek() {
            Token::Keyword(keyword, _) => Some(*keyword),
            _ => None,
        };
        let is_ident = matches!(self.peek(), Token::Ident(_, _));

        match keyword {
            Some(keyword) => match keyword {
                Keyword::If => self.parse_if_statement(),
                Keyword::While => self.parse_while_statement(),
                Keyword::List | Keyword::Rlist => self.parse_list_statement(),
                Keyword::Function => self.parse_function_definition(),
                Keyword::Return => self.parse_return_statement(),
                Keyword::Print => {
                    self.advance();
                    let expr = Box::new(self.parse_expression()?);
                    Ok(AstNode::Print {
                        expr,
                        location: loc,
                    })
                }
                Keyword::Include => {
                    self.advance();
                    let path = Box::new(self.parse_expression()?);
                    Ok(AstNode::Include {
                        path,
                        location: loc,
                    })
                }
                Keyword::Parse => {
                    self.advance();
                    let path = Box::new(self.parse_expression()?);
                    Ok(AstNode::Parse {
                        path,
                        location: loc,
                    })
                }
                Keyword::Use | Keyword::Region => Err(SyntaxError {
                    message: format!("'{}' is a reserved keyword", keyword.as_str()),
                    location: loc,
                }),
                Keyword::End | Keyword::Else => Err(SyntaxError {
                    message: format!(
                        "'{}' must start its own tag and close an open block",
                        keyword.as_str()
                    ),
                    location: loc,
                }),
                Keyword::Or | Keyword::And | Keyword::Not | Keyword::As => {
                    Err(self.error_here("Expected statement"))
                }
            },
            None if is_ident => match self.peek_ahead(1) {
                Some(Token::Symbol(Symbol::Assign, _)) => self.parse_assignment(),
                Some(Token::Symbol(Symbol::LParen, _)) => {
                    let name = self.expect_identifier("for function name")?;
                    self.parse_call(name, loc)
                }
                _ => {
                    self.advance();
                    Err(self.error_here("Expected '=' or '(' after identifier"))
                }
            },
            _ => Err(self.error_here("Expected statement")),
        }
    }

    fn parse_assignment(&mut self) -> Result<AstNode, SyntaxError> {
        let location = self.current_location();
        let name = self.expect_identifier("as assignment target")?;
        self.expect_symbol(Symbol::Assign, "after assignment target")?;
        let value = Box::new(self.parse_expression()?);
        Ok(AstNode::Assignment {
            name,
            value,
            location,
        })
    }

    /// Parse if statement
    fn parse_if_statement(&mut self) -> Result<AstNode, SyntaxError> {
        let loc = self.expect_keyword(Keyword::If, "")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect_tag_close("after if condition")?;

        let (then_branch, terminator) = self.parse_nodes(Some(OpenBlock {
            keyword: Keyword::If,
            location: loc,
            allow_else: true,
        }))?;

        let else_branch = if terminator == Terminator::Else {
            let (nodes, _) = self.parse_nodes(Some(OpenBlock {
                keyword: Keyword::Else,
                location: loc,
                allow_else: false,
            }))?;
            Some(nodes)
        } else {
            None
        };

        Ok(AstNode::If {
            condition,
            then_branch,
            else_branch,
            location: loc,
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<AstNode, SyntaxError> {
        let loc = self.expect_keyword(Keyword::While, "")?;
        let condition = Box::new(self.parse_expression()?);
        self.expect_tag_close("after while condition")?;

        let (body, _) = self.parse_nodes(Some(OpenBlock {
            keyword: Keyword::While,
            location: loc,
            allow_else: false,
        }))?;

        Ok(AstNode::While {
            condition,
            body,
            location: loc,
        })
    }

    /// Parse `list var as collection` / `rlist var as collection`
    fn parse_list_statement(&mut self) -> Result<AstNode, SyntaxError> {
        let loc = self.current_location();
        let keyword = if self.match_keyword(Keyword::Rlist) {
            Keyword::Rlist
        } else {
            self.expect_keyword(Keyword::List, "")?;
            Keyword::List
        };

        let var = self.expect_identifier("for loop variable")?;
        self.expect_keyword(Keyword::As, "after loop variable")?;
        let first = self.expect_identifier("for loop collection")?;
        let collection = self.parse_path_tail(first)?;
        self.expect_tag_close("after loop collection")?;

        let (body, _) = self.parse_nodes(Some(OpenBlock {
            keyword,
            location: loc,
            allow_else: false,
        }))?;

        Ok(AstNode::List {
            var,
            collection,
            reverse: keyword == Keyword::Rlist,
            body,
            location: loc,
        })
    }

    /// Parse function definition: function name(params) ... end
    fn parse_function_definition(&mut self) -> Result<AstNode, SyntaxError> {
        let loc = self.expect_keyword(Keyword::Function, "")?;
        let name = self.expect_identifier("after 'function'")?;
        self.expect_symbol(Symbol::LParen, "after function name")?;

        let params = self.parse_parameter_list()?;

        self.expect_symbol(Symbol::RParen, "after parameters")?;
        self.expect_tag_close("after function signature")?;

        self.function_depth += 1;
        let body = self.parse_nodes(Some(OpenBlock {
            keyword: Keyword::Function,
            location: loc,
            allow_else: false,
        }));
        self.function_depth -= 1;
        let (body, _) = body?;

        Ok(AstNode::FunctionDef {
            name,
            params,
            body: Arc::new(body),
            location: loc,
        })
    }

    /// Parse parameter list: (name, name, ...)
    fn parse_parameter_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut params: Vec<String> = Vec::new();

        if self.check_symbol(Symbol::RParen) {
            return Ok(params);
        }

        loop {
            let location = self.current_location();
            let param = self.expect_identifier("for parameter name")?;
            if params.contains(&param) {
                return Err(SyntaxError {
                    message: format!("Duplicate parameter '{}'", param),
                    location,
                });
            }
            params.push(param);

            if !self.match_symbol(Symbol::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse return statement
    fn parse_return_statement(&mut self) -> Result<AstNode, SyntaxError> {
        let loc = self.expect_keyword(Keyword::Return, "")?;
        if self.function_depth == 0 {
            return Err(SyntaxError {
                message: "'return' outside of a function body".to_string(),
                location: loc,
            });
        }

        let expr = Box::new(self.parse_expression()?);
        Ok(AstNode::Return {
            expr,
            location: loc,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{compile, CompileError};

    fn syntax_error(source: &str) -> String {
        match compile(source) {
            Err(CompileError::Syntax(err)) => err.message,
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let template = compile("{% if a %}yes{% else %}no{% end %}").unwrap();
        assert_eq!(template.nodes.len(), 1);
        match &template.nodes[0] {
            AstNode::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("Expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_and_rlist() {
        let template = compile("{% rlist p as site.pages %}{{ p }}{% end %}").unwrap();
        match &template.nodes[0] {
            AstNode::List {
                var,
                collection,
                reverse,
                body,
                ..
            } => {
                assert_eq!(var, "p");
                assert_eq!(collection, &vec!["site".to_string(), "pages".to_string()]);
                assert!(*reverse);
                assert_eq!(body.len(), 1);
            }
            other => panic!("Expected list statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_definition() {
        let template =
            compile("{% function add(a, b) %}{% return a + b %}{% end %}").unwrap();
        match &template.nodes[0] {
            AstNode::FunctionDef {
                name, params, body, ..
            } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
                assert!(matches!(body[0], AstNode::Return { .. }));
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_several_statements_in_one_tag() {
        let template = compile("{% x = 1 y = x + 1 print y %}").unwrap();
        assert_eq!(template.nodes.len(), 3);
        assert!(matches!(template.nodes[0], AstNode::Assignment { .. }));
        assert!(matches!(template.nodes[2], AstNode::Print { .. }));
    }

    #[test]
    fn test_call_statement() {
        let template = compile("{% greet('bob') %}").unwrap();
        assert!(matches!(&template.nodes[0], AstNode::FunctionCall { name, args, .. }
            if name == "greet" && args.len() == 1));
    }

    #[test]
    fn test_nested_blocks() {
        let source = "{% list p as pages %}{% if p.draft %}{% else %}{{ p.title }}{% end %}{% end %}";
        let template = compile(source).unwrap();
        assert_eq!(template.nodes.len(), 1);
        assert!(template.nodes[0].node_count() > 3);
    }

    #[test]
    fn test_unmatched_end() {
        assert!(syntax_error("a{% end %}").contains("Unmatched 'end'"));
        assert!(syntax_error("{% else %}").contains("Unmatched 'else'"));
    }

    #[test]
    fn test_unterminated_block() {
        let message = syntax_error("{% if a %}never closed");
        assert!(message.contains("Unterminated 'if' block opened at line 1, column 4"));
    }

    #[test]
    fn test_else_only_inside_if() {
        assert!(syntax_error("{% while a %}{% else %}{% end %}").contains("Unexpected 'else'"));
        assert!(syntax_error("{% if a %}{% else %}{% else %}{% end %}")
            .contains("Unexpected 'else'"));
    }

    #[test]
    fn test_return_outside_function() {
        assert!(syntax_error("{% return 1 %}").contains("outside of a function"));
    }

    #[test]
    fn test_reserved_keywords() {
        assert!(syntax_error("{% use x %}").contains("reserved"));
        assert!(syntax_error("{% region x %}").contains("reserved"));
    }

    #[test]
    fn test_duplicate_parameter() {
        assert!(syntax_error("{% function f(a, a) %}{% end %}").contains("Duplicate parameter"));
    }

    #[test]
    fn test_bare_identifier_is_not_a_statement() {
        assert!(syntax_error("{% x %}").contains("Expected '=' or '('"));
    }

    #[test]
    fn test_block_must_close_its_tag() {
        let err = compile("{% if a x = 1 %}{% end %}").unwrap_err();
        assert_eq!(err.location(), SourceLocation::new(1, 9));
    }
}
