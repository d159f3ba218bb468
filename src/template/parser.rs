use super::ast::{Branch, IndexPredicate, Node, Template, Test};
use super::lexer::{Lexer, Token, TokenKind};
use crate::config::TemplateConfig;
use crate::error::{ParseError, Result};

/// A command token after argument-count dispatch
#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Lookup(String),
    For {
        var: String,
        key: String,
        reverse: bool,
    },
    EndFor,
    If(Test),
    Elif(Test),
    Else,
    EndIf,
    Last,
}

/// Where a block body stopped
struct Stop {
    directive: Directive,
    raw: String,
    line: usize,
}

/// Parser for YAT templates
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Variables bound by the enclosing `for` blocks, outermost first
    loop_vars: Vec<String>,
}

impl Parser {
    /// Lex `input` with the given markers and prepare to parse it
    pub fn new(input: &str, config: &TemplateConfig) -> Result<Self> {
        let tokens = Lexer::new(input, config)?.tokenize();
        Ok(Self::from_tokens(tokens))
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            loop_vars: Vec::new(),
        }
    }

    /// Parse the entire template
    pub fn parse(&mut self) -> Result<Template> {
        let (nodes, stop) = self.parse_nodes()?;

        // Any terminator reaching the top level has no block to close
        if let Some(stop) = stop {
            return Err(ParseError::unmatched_block(stop.line, stop.raw).into());
        }

        let template = Template::new(nodes);
        log::debug!(
            "Parsed template: {} tokens, {} directives",
            self.tokens.len(),
            template.directive_count()
        );
        Ok(template)
    }

    /// Parse nodes until a block terminator/branch directive or end of input
    fn parse_nodes(&mut self) -> std::result::Result<(Vec<Node>, Option<Stop>), ParseError> {
        let mut nodes = Vec::new();

        while self.position < self.tokens.len() {
            let token = self.tokens[self.position].clone();
            self.position += 1;

            match token.kind {
                TokenKind::Text(text) => push_text(&mut nodes, &text),
                TokenKind::Escape(mark) => push_text(&mut nodes, &mark),
                TokenKind::Comment => {}
                TokenKind::Command { args, raw } => {
                    let line = token.line;
                    match self.classify(&args, &raw, line)? {
                        Directive::Lookup(key) => nodes.push(Node::Lookup { key, line }),
                        Directive::For { var, key, reverse } => {
                            nodes.push(self.parse_loop(var, key, reverse, raw, line)?);
                        }
                        Directive::If(test) => {
                            nodes.push(self.parse_conditional(test, raw, line)?);
                        }
                        Directive::Last => {
                            if self.loop_vars.is_empty() {
                                return Err(ParseError::unmatched_block(line, raw));
                            }
                            nodes.push(Node::Last { line });
                        }
                        directive => {
                            return Ok((
                                nodes,
                                Some(Stop {
                                    directive,
                                    raw,
                                    line,
                                }),
                            ));
                        }
                    }
                }
            }
        }

        Ok((nodes, None))
    }

    /// Parse a loop block up to its `endfor`
    fn parse_loop(
        &mut self,
        var: String,
        key: String,
        reverse: bool,
        opener: String,
        line: usize,
    ) -> std::result::Result<Node, ParseError> {
        self.loop_vars.push(var.clone());
        let parsed = self.parse_nodes();
        self.loop_vars.pop();
        let (body, stop) = parsed?;

        match stop {
            Some(Stop {
                directive: Directive::EndFor,
                ..
            }) => Ok(Node::Loop {
                var,
                key,
                reverse,
                body,
                line,
            }),
            Some(stop) => Err(ParseError::unmatched_block(stop.line, stop.raw)),
            None => Err(ParseError::unclosed_block(line, opener)),
        }
    }

    /// Parse a conditional block with its `elif*`/`else` arms up to `endif`
    fn parse_conditional(
        &mut self,
        test: Test,
        opener: String,
        line: usize,
    ) -> std::result::Result<Node, ParseError> {
        let kind = test.kind();
        let mut branches = Vec::new();
        let mut current = Some((test, line));
        let mut else_branch = None;

        loop {
            let (body, stop) = self.parse_nodes()?;

            match current.take() {
                Some((test, line)) => branches.push(Branch { test, body, line }),
                None => else_branch = Some(body),
            }

            let Some(stop) = stop else {
                return Err(ParseError::unclosed_block(line, opener));
            };

            match stop.directive {
                Directive::EndIf => break,
                Directive::Else if else_branch.is_none() => {
                    // marks that the next body belongs to `else`
                    else_branch = Some(Vec::new());
                }
                Directive::Elif(test) if else_branch.is_none() && test.kind() == kind => {
                    current = Some((test, stop.line));
                }
                _ => return Err(ParseError::unmatched_block(stop.line, stop.raw)),
            }
        }

        Ok(Node::Conditional {
            branches,
            else_branch,
        })
    }

    /// Argument-count dispatch of a command into a directive
    fn classify(
        &self,
        args: &[String],
        raw: &str,
        line: usize,
    ) -> std::result::Result<Directive, ParseError> {
        let invalid = || ParseError::invalid_directive(line, raw);
        let name = |arg: &String| -> std::result::Result<String, ParseError> {
            if arg.starts_with('"') {
                Err(invalid())
            } else {
                Ok(arg.clone())
            }
        };
        // loop variables are single path segments
        let var_name = |arg: &String| -> std::result::Result<String, ParseError> {
            if arg.contains('.') {
                Err(invalid())
            } else {
                name(arg)
            }
        };

        match args {
            [keyword] => Ok(match keyword.as_str() {
                "endfor" => Directive::EndFor,
                "else" => Directive::Else,
                "last" => Directive::Last,
                "endif" => Directive::EndIf,
                _ => Directive::Lookup(name(keyword)?),
            }),
            [keyword, key] => match keyword.as_str() {
                "if-any" => Ok(Directive::If(Test::Any { key: name(key)? })),
                "elif-any" => Ok(Directive::Elif(Test::Any { key: name(key)? })),
                _ => Err(invalid()),
            },
            [keyword, subject, op, object] => match (keyword.as_str(), op.as_str()) {
                ("for", "in") | ("for-inv", "in") => Ok(Directive::For {
                    var: var_name(subject)?,
                    key: name(object)?,
                    reverse: keyword == "for-inv",
                }),
                ("if", "is") | ("elif", "is") => {
                    let test = Test::Is {
                        key: name(subject)?,
                        literal: unquote(object),
                    };
                    Ok(if keyword == "if" {
                        Directive::If(test)
                    } else {
                        Directive::Elif(test)
                    })
                }
                ("if-index", "is") | ("elif-index", "is") => {
                    let var = var_name(subject)?;
                    if !self.loop_vars.contains(&var) {
                        return Err(invalid());
                    }
                    let predicate = IndexPredicate::parse(object).ok_or_else(invalid)?;
                    let test = Test::Index { var, predicate };
                    Ok(if keyword == "if-index" {
                        Directive::If(test)
                    } else {
                        Directive::Elif(test)
                    })
                }
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

/// Append text, merging with a preceding text node
fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(prev)) = nodes.last_mut() {
        prev.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

/// Strip surrounding double quotes and resolve backslash escapes
fn unquote(arg: &str) -> String {
    let Some(inner) = arg
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return arg.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
