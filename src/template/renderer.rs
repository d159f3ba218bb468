use super::ast::{Node, Template, Test};
use crate::error::GenerationError;
use crate::value::Value;

type RenderResult<T> = std::result::Result<T, GenerationError>;

/// Loop control flow state
#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopControl {
    None,
    Last,
}

/// One level of the lookup scope stack
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    /// Caller-supplied data, always at the bottom
    Root(&'a Value),

    /// Binding for one iteration of a `for` block
    Loop(LoopContext<'a>),
}

#[derive(Debug, Clone, Copy)]
struct LoopContext<'a> {
    var: &'a str,
    item: &'a Value,
    index: usize,
    len: usize,
}

/// Replays a parsed template against one data tree
///
/// The scope stack lives here, so each `generate` call gets its own and a
/// `Template` can be shared freely.
pub struct Renderer<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> Renderer<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            scopes: vec![Scope::Root(root)],
        }
    }

    /// Render a template to string
    pub fn render(&mut self, template: &'a Template) -> RenderResult<String> {
        let mut output = String::new();
        self.render_nodes(&template.nodes, &mut output)?;
        Ok(output)
    }

    fn render_nodes(&mut self, nodes: &'a [Node], output: &mut String) -> RenderResult<LoopControl> {
        for node in nodes {
            if self.render_node(node, output)? == LoopControl::Last {
                return Ok(LoopControl::Last);
            }
        }
        Ok(LoopControl::None)
    }

    fn render_node(&mut self, node: &'a Node, output: &mut String) -> RenderResult<LoopControl> {
        match node {
            Node::Text(text) => output.push_str(text),

            Node::Lookup { key, line } => output.push_str(&self.get_text(key, *line)?),

            Node::Loop {
                var,
                key,
                reverse,
                body,
                line,
            } => {
                let items = self.get_list(key, *line)?;
                let len = items.len();

                for i in 0..len {
                    let item = if *reverse { &items[len - 1 - i] } else { &items[i] };
                    self.scopes.push(Scope::Loop(LoopContext {
                        var,
                        item,
                        index: i,
                        len,
                    }));
                    let control = self.render_nodes(body, output);
                    self.scopes.pop();

                    if control? == LoopControl::Last {
                        break;
                    }
                }
            }

            Node::Conditional {
                branches,
                else_branch,
            } => {
                for branch in branches {
                    if self.evaluate_test(&branch.test, branch.line)? {
                        return self.render_nodes(&branch.body, output);
                    }
                }
                if let Some(body) = else_branch {
                    return self.render_nodes(body, output);
                }
            }

            Node::Last { .. } => return Ok(LoopControl::Last),
        }

        Ok(LoopControl::None)
    }

    fn evaluate_test(&self, test: &Test, line: usize) -> RenderResult<bool> {
        match test {
            Test::Is { key, literal } => Ok(self.get_text(key, line)? == *literal),
            Test::Any { key } => Ok(self.has_key(key)),
            Test::Index { var, predicate } => {
                let (index, len) = self.loop_position(var, line)?;
                Ok(predicate.matches(index, len))
            }
        }
    }

    /// Resolve a dotted key against the scope stack, innermost scope first
    ///
    /// A scope answers only if the whole path resolves in it to a non-null
    /// value; otherwise the search continues outward.
    pub fn get_value(&self, key: &str, line: usize) -> RenderResult<&'a Value> {
        let path: Vec<&str> = key.split('.').collect();

        for scope in self.scopes.iter().rev() {
            let found = match *scope {
                Scope::Root(root) => root.get_path(path.as_slice()),
                Scope::Loop(ctx) if path[0] == ctx.var => ctx.item.get_path(&path[1..]),
                Scope::Loop(_) => None,
            };
            if let Some(value) = found.filter(|v| !v.is_null()) {
                return Ok(value);
            }
        }

        Err(GenerationError::not_found(line, key))
    }

    /// Value of `key` as text; only strings and numbers qualify
    fn get_text(&self, key: &str, line: usize) -> RenderResult<String> {
        let value = self.get_value(key, line)?;
        value.to_text().ok_or_else(|| {
            GenerationError::unexpected_data(
                line,
                format!(
                    "\"{}\" should have string, int or float value, found {}",
                    key,
                    value.kind()
                ),
            )
        })
    }

    fn get_list(&self, key: &str, line: usize) -> RenderResult<&'a [Value]> {
        let value = self.get_value(key, line)?;
        value.as_sequence().ok_or_else(|| {
            GenerationError::unexpected_data(
                line,
                format!("\"{}\" should have list value, found {}", key, value.kind()),
            )
        })
    }

    fn has_key(&self, key: &str) -> bool {
        self.get_value(key, 0).is_ok()
    }

    /// Index and length of the innermost loop bound to `var`
    fn loop_position(&self, var: &str, line: usize) -> RenderResult<(usize, usize)> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| match scope {
                Scope::Loop(ctx) if ctx.var == var => Some((ctx.index, ctx.len)),
                _ => None,
            })
            .ok_or_else(|| {
                GenerationError::unexpected_data(
                    line,
                    format!("\"{}\" is not bound by an enclosing loop", var),
                )
            })
    }
}
