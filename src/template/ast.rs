/// AST node types for YAT templates
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain text content, already unescaped
    Text(String),

    /// Key lookup `[a.b.c]`
    Lookup { key: String, line: usize },

    /// Loop block `[for var in key]...[endfor]` (`for-inv` sets `reverse`)
    Loop {
        var: String,
        key: String,
        reverse: bool,
        body: Vec<Node>,
        line: usize,
    },

    /// `if`/`if-index`/`if-any` block with its `elif*` branches and `else`
    Conditional {
        branches: Vec<Branch>,
        else_branch: Option<Vec<Node>>,
    },

    /// `[last]`, leaves the innermost loop
    Last { line: usize },
}

/// One tested arm of a conditional
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub test: Test,
    pub body: Vec<Node>,
    pub line: usize,
}

/// Condition of a conditional arm
#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    /// `if key is literal`: text of `key` equals `literal`
    Is { key: String, literal: String },

    /// `if-index var is predicate`: position of the loop bound to `var`
    Index { var: String, predicate: IndexPredicate },

    /// `if-any key`: `key` resolves in some scope
    Any { key: String },
}

/// Which kind of conditional a test opens; `elif*` must match it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    If,
    IfIndex,
    IfAny,
}

impl Test {
    pub fn kind(&self) -> ConditionKind {
        match self {
            Test::Is { .. } => ConditionKind::If,
            Test::Index { .. } => ConditionKind::IfIndex,
            Test::Any { .. } => ConditionKind::IfAny,
        }
    }
}

/// Loop position tests for `if-index`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPredicate {
    First,
    Last,
    Even,
    Odd,
    At(usize),
}

impl IndexPredicate {
    /// `first`, `last`, `even`, `odd` or a non-negative decimal index
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "first" => Some(IndexPredicate::First),
            "last" => Some(IndexPredicate::Last),
            "even" => Some(IndexPredicate::Even),
            "odd" => Some(IndexPredicate::Odd),
            _ if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
                text.parse().ok().map(IndexPredicate::At)
            }
            _ => None,
        }
    }

    pub fn matches(&self, index: usize, len: usize) -> bool {
        match self {
            IndexPredicate::First => index == 0,
            IndexPredicate::Last => len > 0 && index == len - 1,
            IndexPredicate::Even => index % 2 == 0,
            IndexPredicate::Odd => index % 2 == 1,
            IndexPredicate::At(n) => index == *n,
        }
    }
}

/// Complete parsed template, reusable across any number of `generate` calls
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub nodes: Vec<Node>,
}

impl Template {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// True when the template holds no directives at all
    pub fn is_static(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Text(_)))
    }

    /// Number of directives (lookups, blocks, branches) in the tree
    pub fn directive_count(&self) -> usize {
        count_directives(&self.nodes)
    }
}

fn count_directives(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Text(_) => 0,
            Node::Lookup { .. } | Node::Last { .. } => 1,
            Node::Loop { body, .. } => 1 + count_directives(body),
            Node::Conditional {
                branches,
                else_branch,
            } => {
                branches
                    .iter()
                    .map(|b| 1 + count_directives(&b.body))
                    .sum::<usize>()
                    + else_branch
                        .as_ref()
                        .map(|body| 1 + count_directives(body))
                        .unwrap_or(0)
            }
        })
        .sum()
}
