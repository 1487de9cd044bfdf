//! Dense columnar storage for the index-overlay AST.
//!
//! Tree structure is encoded by `u32` indices into parallel columns instead
//! of pointers between heap nodes. The arena is grown append-only during
//! parsing (children strictly before their parents, so allocation order is a
//! post-order traversal) and never mutated afterwards; rules and the
//! rewriter borrow it read-only.

use javelin_core::{TextRange, TextSize};

/// Syntactic category of an arena node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    PackageDeclaration,
    ImportDeclaration,

    ClassDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    RecordDeclaration,
    AnnotationDeclaration,

    EnumConstant,
    FieldDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    InitializerBlock,
    Parameter,
    Annotation,

    Block,
    LocalVariableDeclaration,
    ExpressionStatement,
    IfStatement,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForEachStatement,
    SwitchStatement,
    SwitchCase,
    TryStatement,
    CatchClause,
    ReturnStatement,
    ThrowStatement,
    BreakStatement,
    ContinueStatement,
    YieldStatement,
    SynchronizedStatement,
    LabeledStatement,
    AssertStatement,
    EmptyStatement,

    Identifier,
    QualifiedName,
    Literal,
    BinaryExpression,
    UnaryExpression,
    PostfixExpression,
    AssignmentExpression,
    ConditionalExpression,
    InstanceofExpression,
    CastExpression,
    ParenthesizedExpression,
    MethodInvocation,
    FieldAccess,
    ArrayAccess,
    ObjectCreation,
    ArrayCreation,
    ArrayInitializer,
    LambdaExpression,
    MethodReference,
    SwitchExpression,
    ThisExpression,
    SuperExpression,
    ClassLiteral,

    /// Placeholder allocated while recovering from a parse error.
    Error,
}

/// Shape of a literal node's attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    String,
    TextBlock,
    Null,
}

/// Kind-specific payload stored in the arena's side table.
///
/// A tagged enum instead of downcastable objects: the node's kind tells the
/// reader which variant to expect, and mismatches are `None`, not casts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAttr {
    /// Declared name of a class / interface / enum / record / annotation.
    TypeName { name: String },
    /// Simple name carried by identifiers, labels, methods, and fields.
    Name { text: String },
    Parameter {
        name: String,
        is_final: bool,
        is_varargs: bool,
        is_receiver: bool,
    },
    Import {
        path: String,
        is_static: bool,
        on_demand: bool,
    },
    Operator { text: String },
    Literal { kind: LiteralKind },
}

/// Opaque 32-bit handle to a node. `NodeIndex::NONE` (0) is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self.0 != 0
    }

    /// Position in allocation order (0-based).
    #[inline]
    fn slot(self) -> usize {
        debug_assert!(self.0 != 0);
        (self.0 - 1) as usize
    }

    fn from_slot(slot: usize) -> Self {
        NodeIndex(slot as u32 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttrId(u32);

impl AttrId {
    const NONE: AttrId = AttrId(0);
}

/// The arena itself: parallel columns plus the attribute side table.
#[derive(Debug, Default)]
pub struct NodeArena {
    kinds: Vec<NodeKind>,
    starts: Vec<u32>,
    ends: Vec<u32>,
    first_child: Vec<NodeIndex>,
    next_sibling: Vec<NodeIndex>,
    // Not part of the observable model: O(1) tail for `append_child`.
    last_child: Vec<NodeIndex>,
    attr_ids: Vec<AttrId>,
    attrs: Vec<NodeAttr>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            kinds: Vec::with_capacity(nodes),
            starts: Vec::with_capacity(nodes),
            ends: Vec::with_capacity(nodes),
            first_child: Vec::with_capacity(nodes),
            next_sibling: Vec::with_capacity(nodes),
            last_child: Vec::with_capacity(nodes),
            attr_ids: Vec::with_capacity(nodes),
            attrs: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Push a node with no children and no attribute.
    pub fn allocate(&mut self, kind: NodeKind, range: TextRange) -> NodeIndex {
        self.allocate_inner(kind, range, AttrId::NONE)
    }

    /// Push a node carrying a kind-specific payload.
    pub fn allocate_with_attr(
        &mut self,
        kind: NodeKind,
        range: TextRange,
        attr: NodeAttr,
    ) -> NodeIndex {
        self.attrs.push(attr);
        let id = AttrId(self.attrs.len() as u32);
        self.allocate_inner(kind, range, id)
    }

    fn allocate_inner(&mut self, kind: NodeKind, range: TextRange, attr: AttrId) -> NodeIndex {
        debug_assert!(range.start() <= range.end());
        self.kinds.push(kind);
        self.starts.push(u32::from(range.start()));
        self.ends.push(u32::from(range.end()));
        self.first_child.push(NodeIndex::NONE);
        self.next_sibling.push(NodeIndex::NONE);
        self.last_child.push(NodeIndex::NONE);
        self.attr_ids.push(attr);
        NodeIndex::from_slot(self.kinds.len() - 1)
    }

    /// Link `child` as the last child of `parent`.
    ///
    /// Construction is post-order: the child must have been allocated before
    /// the parent, and after any previously appended sibling.
    pub fn append_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        debug_assert!(child < parent, "children must be allocated before parents");
        let tail = self.last_child[parent.slot()];
        if tail.is_none() {
            self.first_child[parent.slot()] = child;
        } else {
            debug_assert!(tail < child, "siblings must be appended in order");
            self.next_sibling[tail.slot()] = child;
        }
        self.last_child[parent.slot()] = child;
    }

    #[inline]
    pub fn kind(&self, node: NodeIndex) -> NodeKind {
        self.kinds[node.slot()]
    }

    #[inline]
    pub fn range(&self, node: NodeIndex) -> TextRange {
        TextRange::new(
            TextSize::from(self.starts[node.slot()]),
            TextSize::from(self.ends[node.slot()]),
        )
    }

    pub fn attr(&self, node: NodeIndex) -> Option<&NodeAttr> {
        let id = self.attr_ids[node.slot()];
        if id.0 == 0 {
            None
        } else {
            Some(&self.attrs[(id.0 - 1) as usize])
        }
    }

    /// The declared type name, when `node` is a type declaration.
    pub fn type_name(&self, node: NodeIndex) -> Option<&str> {
        match self.attr(node)? {
            NodeAttr::TypeName { name } => Some(name),
            _ => None,
        }
    }

    /// The simple name, when `node` carries one.
    pub fn name(&self, node: NodeIndex) -> Option<&str> {
        match self.attr(node)? {
            NodeAttr::Name { text } => Some(text),
            _ => None,
        }
    }

    pub fn children(&self, node: NodeIndex) -> Children<'_> {
        Children {
            arena: self,
            next: self.first_child[node.slot()],
        }
    }

    /// All nodes in allocation (post-) order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.len()).map(NodeIndex::from_slot)
    }

    /// The compilation-unit root: the last allocated node, by construction.
    pub fn root(&self) -> Option<NodeIndex> {
        if self.is_empty() {
            None
        } else {
            Some(NodeIndex::from_slot(self.len() - 1))
        }
    }

    /// Pre-order traversal from `node`, parents before children.
    pub fn preorder(&self, node: NodeIndex) -> Preorder<'_> {
        Preorder {
            arena: self,
            stack: vec![node],
        }
    }

    /// Render the tree for debugging and golden assertions.
    pub fn dump(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let Some(root) = self.root() else {
            return out;
        };
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let range = self.range(node);
            let _ = write!(
                out,
                "{:indent$}{:?}@{}..{}",
                "",
                self.kind(node),
                u32::from(range.start()),
                u32::from(range.end()),
                indent = depth * 2
            );
            match self.attr(node) {
                Some(NodeAttr::TypeName { name }) => {
                    let _ = write!(out, " name={name}");
                }
                Some(NodeAttr::Name { text }) => {
                    let _ = write!(out, " name={text}");
                }
                Some(NodeAttr::Parameter {
                    name,
                    is_final,
                    is_varargs,
                    is_receiver,
                }) => {
                    let _ = write!(
                        out,
                        " param={name} final={is_final} varargs={is_varargs} receiver={is_receiver}"
                    );
                }
                Some(NodeAttr::Import {
                    path,
                    is_static,
                    on_demand,
                }) => {
                    let _ = write!(out, " path={path} static={is_static} on_demand={on_demand}");
                }
                Some(NodeAttr::Operator { text }) => {
                    let _ = write!(out, " op={text}");
                }
                Some(NodeAttr::Literal { kind }) => {
                    let _ = write!(out, " literal={kind:?}");
                }
                None => {}
            }
            out.push('\n');
            let children: Vec<_> = self.children(node).collect();
            for child in children.into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

/// Arenas are equal iff their (kind, range, attribute) tuples match in
/// allocation order. Tree links are derived from the same construction
/// order, so they participate implicitly.
impl PartialEq for NodeArena {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        if self.kinds != other.kinds || self.starts != other.starts || self.ends != other.ends {
            return false;
        }
        self.nodes()
            .all(|node| self.attr(node) == other.attr(node))
    }
}

impl Eq for NodeArena {}

pub struct Children<'a> {
    arena: &'a NodeArena,
    next: NodeIndex,
}

impl Iterator for Children<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        if self.next.is_none() {
            return None;
        }
        let current = self.next;
        self.next = self.arena.next_sibling[current.slot()];
        Some(current)
    }
}

pub struct Preorder<'a> {
    arena: &'a NodeArena,
    stack: Vec<NodeIndex>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let node = self.stack.pop()?;
        let children: Vec<_> = self.arena.children(node).collect();
        for child in children.into_iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::from(start), TextSize::from(end))
    }

    #[test]
    fn post_order_construction_and_links() {
        let mut arena = NodeArena::new();
        let a = arena.allocate(NodeKind::Identifier, range(0, 1));
        let b = arena.allocate(NodeKind::Identifier, range(4, 5));
        let parent = arena.allocate(NodeKind::BinaryExpression, range(0, 5));
        arena.append_child(parent, a);
        arena.append_child(parent, b);

        assert_eq!(arena.children(parent).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(arena.root(), Some(parent));
        assert_eq!(
            arena.preorder(parent).collect::<Vec<_>>(),
            vec![parent, a, b]
        );
    }

    #[test]
    fn equality_is_tuple_sequence_equality() {
        let build = || {
            let mut arena = NodeArena::new();
            let child = arena.allocate_with_attr(
                NodeKind::Parameter,
                range(16, 21),
                NodeAttr::Parameter {
                    name: "x".into(),
                    is_final: false,
                    is_varargs: false,
                    is_receiver: false,
                },
            );
            let record = arena.allocate_with_attr(
                NodeKind::RecordDeclaration,
                range(0, 25),
                NodeAttr::TypeName {
                    name: "MyRecord".into(),
                },
            );
            arena.append_child(record, child);
            let unit = arena.allocate(NodeKind::CompilationUnit, range(0, 26));
            arena.append_child(unit, record);
            arena
        };

        assert_eq!(build(), build());

        let mut other = build();
        let extra = other.allocate(NodeKind::EmptyStatement, range(25, 26));
        let _ = extra;
        assert_ne!(build(), other);
    }

    #[test]
    fn attribute_accessors_check_the_variant() {
        let mut arena = NodeArena::new();
        let node = arena.allocate_with_attr(
            NodeKind::ClassDeclaration,
            range(0, 10),
            NodeAttr::TypeName { name: "A".into() },
        );
        assert_eq!(arena.type_name(node), Some("A"));
        assert_eq!(arena.name(node), None);

        let plain = arena.allocate(NodeKind::Block, range(0, 2));
        assert_eq!(arena.attr(plain), None);
    }

    #[test]
    fn none_index_is_reserved() {
        assert!(NodeIndex::NONE.is_none());
        let mut arena = NodeArena::new();
        let first = arena.allocate(NodeKind::CompilationUnit, range(0, 0));
        assert!(first.is_some());
        assert_ne!(first, NodeIndex::NONE);
    }
}
