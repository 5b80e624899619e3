//! Arena-allocated formula syntax tree.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. The parser
//! pushes children before their parent, so every node's children have
//! smaller ids than the node itself. Walks over the tree use that ordering or
//! an explicit stack; nothing here recurses.

use std::collections::HashMap;

use crate::references::Reference;
use crate::token::Operator;

/// Index of a node in an [`Ast`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Prefix and postfix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `x%`
    Percent,
}

/// A formula syntax node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Text(String),
    /// `TRUE` or `FALSE`.
    Bool(bool),
    /// Error literal like `#N/A`.
    Error(String),
    /// Cell or range reference.
    Reference(Reference),
    /// Named range or other identifier.
    Name(String),
    /// An omitted argument, as in `IF(A1,,0)`.
    Missing,
    /// Prefix or postfix operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: NodeId,
    },
    /// Infix operation.
    Binary {
        /// Operator.
        op: Operator,
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
    /// Function call with upper-cased name.
    Call {
        /// Function name.
        name: String,
        /// Arguments in order.
        args: Vec<NodeId>,
    },
}

impl Node {
    /// Returns the call name if this is a call.
    #[must_use]
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Self::Call { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A parsed formula.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node and returns its id.
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Marks the root node.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Returns the root node id. Empty trees have none.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns a node.
    ///
    /// Ids come from this tree, so the lookup is infallible in practice;
    /// a foreign id yields `Missing`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id.0).unwrap_or(&Node::Missing)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct children of a node, left to right.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.node(id) {
            Node::Unary { operand, .. } => vec![*operand],
            Node::Binary { left, right, .. } => vec![*left, *right],
            Node::Call { args, .. } => args.clone(),
            _ => Vec::new(),
        }
    }

    /// Node ids of the subtree under `from` in pre-order.
    #[must_use]
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        order
    }

    /// References in the subtree under `from`, in pre-order.
    #[must_use]
    pub fn references(&self, from: NodeId) -> Vec<&Reference> {
        self.preorder(from)
            .into_iter()
            .filter_map(|id| match self.node(id) {
                Node::Reference(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Literal nodes in the subtree under `from`, in pre-order.
    #[must_use]
    pub fn literals(&self, from: NodeId) -> Vec<&Node> {
        self.preorder(from)
            .into_iter()
            .map(|id| self.node(id))
            .filter(|n| matches!(n, Node::Number(_) | Node::Text(_) | Node::Bool(_)))
            .collect()
    }

    /// True if any infix arithmetic operator appears under `from`.
    #[must_use]
    pub fn has_arithmetic(&self, from: NodeId) -> bool {
        self.preorder(from)
            .into_iter()
            .any(|id| matches!(self.node(id), Node::Binary { op, .. } if op.is_arithmetic()))
    }

    /// Renders the subtree under `from` back to formula text, replacing each
    /// reference with whatever `reference` returns for it.
    ///
    /// Children precede parents in the arena, so visiting the subtree in
    /// ascending id order renders every node after its operands.
    pub fn render(&self, from: NodeId, mut reference: impl FnMut(&Reference) -> String) -> String {
        let mut ids = self.preorder(from);
        ids.sort_unstable();
        let mut done: HashMap<NodeId, (String, u8)> = HashMap::with_capacity(ids.len());
        let get = |done: &HashMap<NodeId, (String, u8)>, id: &NodeId| {
            done.get(id).cloned().unwrap_or((String::new(), ATOM))
        };
        for id in ids {
            let rendered = match self.node(id) {
                Node::Number(n) => (format_number(*n), ATOM),
                Node::Text(s) => (format!("\"{}\"", s.replace('"', "\"\"")), ATOM),
                Node::Bool(b) => (if *b { "TRUE" } else { "FALSE" }.to_string(), ATOM),
                Node::Error(e) | Node::Name(e) => (e.clone(), ATOM),
                Node::Reference(r) => (reference(r), ATOM),
                Node::Missing => (String::new(), ATOM),
                Node::Unary { op, operand } => {
                    let (inner, prec) = get(&done, operand);
                    let inner = wrap(&inner, prec, UNARY);
                    let s = match op {
                        UnaryOp::Neg => format!("-{inner}"),
                        UnaryOp::Plus => format!("+{inner}"),
                        UnaryOp::Percent => format!("{inner}%"),
                    };
                    (s, UNARY)
                }
                Node::Binary { op, left, right } => {
                    let p = binary_precedence(*op);
                    let (l, lp) = get(&done, left);
                    let (r, rp) = get(&done, right);
                    let l = wrap(&l, lp, p);
                    let r = wrap(&r, rp, p + 1);
                    (format!("{l} {} {r}", op.symbol()), p)
                }
                Node::Call { name, args } => {
                    let args: Vec<String> = args.iter().map(|a| get(&done, a).0).collect();
                    (format!("{name}({})", args.join(", ")), ATOM)
                }
            };
            done.insert(id, rendered);
        }
        done.remove(&from).map(|(text, _)| text).unwrap_or_default()
    }
}

const ATOM: u8 = 10;
const UNARY: u8 = 7;

/// Binding strength of infix operators, loosest first.
#[must_use]
pub const fn binary_precedence(op: Operator) -> u8 {
    match op {
        Operator::Eq | Operator::Ne | Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => 1,
        Operator::Concat => 2,
        Operator::Add | Operator::Sub => 3,
        Operator::Mul | Operator::Div => 4,
        Operator::Pow => 5,
        Operator::Percent => 6,
    }
}

fn wrap(text: &str, inner: u8, outer: u8) -> String {
    if inner < outer {
        format!("({text})")
    } else {
        text.to_string()
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}
