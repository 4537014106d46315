use crate::{
    AttrValue, GrammarError, IGrammar, PNodeData, ParseMatch, ParseNode, ParseResult, StrVec,
};
use ptree::TreeItem;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

/// Parse a raw input line: the line is wrapped in a one element token vector, so the root node is
/// usually a [ShellLexer](crate::production::ShellLexer) or a
/// [ReLexer](crate::production::ReLexer) splitting it further.
///
/// The returned tree reports failure through [matches](ParseNode::matches); an [Err] is only
/// returned for an invalid grammar.
pub fn parse(node: &Rc<dyn IGrammar>, line: &str) -> Result<ParseNode, GrammarError> {
    let mut vec = StrVec::new();
    vec.push(line);
    parse_strvec(node, &vec)
}

/// Parse a token vector with the given grammar.
pub fn parse_strvec(node: &Rc<dyn IGrammar>, input: &StrVec) -> Result<ParseNode, GrammarError> {
    let root = ParseNode::new(node.clone());
    if let ParseMatch::Consumed(count) = node.parse(&root, input)? {
        root.set_strvec(input.ndup(0, count)?);
    }
    Ok(root)
}

/// Dispatch a parse to `child`, recording its outcome under `state`.
///
/// This is the recursion primitive used by every combinator: a parse tree node is allocated and
/// linked for the child before dispatch, and unlinked again when the child refuses to match or
/// fails.
pub fn parse_child(child: &Rc<dyn IGrammar>, state: &ParseNode, input: &StrVec) -> ParseResult {
    let child_state = ParseNode::new(child.clone());
    state.link_child(&child_state);
    match child.parse(&child_state, input) {
        Ok(ParseMatch::Consumed(count)) => match input.ndup(0, count) {
            Ok(consumed) => {
                child_state.set_strvec(consumed);
                Ok(ParseMatch::Consumed(count))
            }
            Err(err) => {
                state.unlink_child(&child_state);
                Err(err)
            }
        },
        Ok(ParseMatch::NoMatch) => {
            state.unlink_child(&child_state);
            Ok(ParseMatch::NoMatch)
        }
        Err(err) => {
            state.unlink_child(&child_state);
            Err(err)
        }
    }
}

impl ParseNode {
    /// Create a detached parse tree node for a grammar node.
    pub fn new(grammar: Rc<dyn IGrammar>) -> Self {
        Self {
            data: Rc::new(RefCell::new(PNodeData {
                grammar,
                strvec: None,
                attrs: Default::default(),
                parent: Weak::new(),
                children: Vec::new(),
            })),
            anchor: None,
        }
    }

    /// The grammar node that produced this parse tree node.
    pub fn grammar(&self) -> Rc<dyn IGrammar> {
        self.data.borrow().grammar.clone()
    }

    /// The matched sub-vector; [None] when the node did not (or not yet) match.
    pub fn strvec(&self) -> Option<StrVec> {
        self.data.borrow().strvec.clone()
    }

    pub(crate) fn set_strvec(&self, vec: StrVec) {
        self.data.borrow_mut().strvec = Some(vec);
    }

    /// The number of tokens matched by this node.
    pub fn len(&self) -> usize {
        self.data
            .borrow()
            .strvec
            .as_ref()
            .map(StrVec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the node holds a matched sub-vector; on a tree root this is the outcome of the
    /// whole parse.
    pub fn matches(&self) -> bool {
        self.data.borrow().strvec.is_some()
    }

    /// Whether two handles designate the same tree node.
    pub fn ptr_eq(&self, other: &ParseNode) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    pub fn link_child(&self, child: &ParseNode) {
        child.data.borrow_mut().parent = Rc::downgrade(&self.data);
        self.data.borrow_mut().children.push(child.clone());
    }

    /// Detach `child` from this node; the handle keeps the child subtree alive.
    pub fn unlink_child(&self, child: &ParseNode) {
        let mut data = self.data.borrow_mut();
        if let Some(index) = data.children.iter().position(|c| c.ptr_eq(child)) {
            data.children.remove(index);
            child.data.borrow_mut().parent = Weak::new();
        }
    }

    /// Remove and drop the last linked child.
    pub fn del_last_child(&self) {
        let child = self.data.borrow_mut().children.pop();
        if let Some(child) = child {
            child.data.borrow_mut().parent = Weak::new();
        }
    }

    pub fn first_child(&self) -> Option<ParseNode> {
        self.data.borrow().children.first().cloned()
    }

    pub fn last_child(&self) -> Option<ParseNode> {
        self.data.borrow().children.last().cloned()
    }

    /// Handles on the direct children, in match order.
    pub fn children(&self) -> Vec<ParseNode> {
        self.data.borrow().children.clone()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.data.borrow().children.len()
    }

    /// Detach and return every child linked at or after `index`, preserving order.
    pub(crate) fn take_children_from(&self, index: usize) -> Vec<ParseNode> {
        let taken: Vec<ParseNode> = self.data.borrow_mut().children.split_off(index);
        for child in &taken {
            child.data.borrow_mut().parent = Weak::new();
        }
        taken
    }

    pub fn parent(&self) -> Option<ParseNode> {
        let parent = self.data.borrow().parent.upgrade()?;
        Some(ParseNode {
            data: parent,
            anchor: None,
        })
    }

    pub fn root(&self) -> ParseNode {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    pub fn next_sibling(&self) -> Option<ParseNode> {
        let parent = self.parent()?;
        let data = parent.data.borrow();
        let index = data.children.iter().position(|c| c.ptr_eq(self))?;
        data.children.get(index + 1).cloned()
    }

    fn has_id(&self, id: &str) -> bool {
        self.data.borrow().grammar.base().id() == Some(id)
    }

    /// Depth-first iteration over the tree rooted at `self`: the node following `cur`, skipping
    /// the children of `cur` when `iter_children` is false.
    pub fn iter_next(&self, cur: &ParseNode, iter_children: bool) -> Option<ParseNode> {
        if iter_children {
            if let Some(child) = cur.first_child() {
                return Some(child);
            }
        }
        let mut node = cur.clone();
        loop {
            if node.ptr_eq(self) {
                return None;
            }
            if let Some(sibling) = node.next_sibling() {
                return Some(sibling);
            }
            node = node.parent()?;
        }
    }

    /// First node of the subtree (including `self`) produced by a grammar node with the given
    /// id.
    pub fn find(&self, id: &str) -> Option<ParseNode> {
        if self.has_id(id) {
            return Some(self.clone());
        }
        self.find_next(self, id, true)
    }

    /// The match following `prev` in depth-first order; the children of `prev` are skipped when
    /// `iter_children` is false.
    pub fn find_next(&self, prev: &ParseNode, id: &str, iter_children: bool) -> Option<ParseNode> {
        let mut cur = self.iter_next(prev, iter_children)?;
        loop {
            if cur.has_id(id) {
                return Some(cur);
            }
            cur = self.iter_next(&cur, true)?;
        }
    }

    pub fn attr(&self, key: &str) -> Option<AttrValue> {
        self.data.borrow().attrs.get(key).cloned()
    }

    pub fn set_attr(&self, key: &str, value: AttrValue) {
        self.data.borrow_mut().attrs.insert(key.to_string(), value);
    }

    /// Deep copy of the whole tree containing `self`; the returned handle designates the node
    /// corresponding to `self` inside the copy and keeps the copied root alive.
    pub fn duplicate(&self) -> ParseNode {
        fn dup_rec(node: &ParseNode, target: &ParseNode, found: &mut Option<ParseNode>) -> ParseNode {
            let copy = ParseNode::new(node.grammar());
            {
                let source = node.data.borrow();
                let mut data = copy.data.borrow_mut();
                data.strvec = source.strvec.clone();
                data.attrs = source.attrs.clone();
            }
            if node.ptr_eq(target) {
                *found = Some(copy.clone());
            }
            for child in node.children() {
                let child_copy = dup_rec(&child, target, found);
                copy.link_child(&child_copy);
            }
            copy
        }

        let root = self.root();
        let mut found = None;
        let copy_root = dup_rec(&root, self, &mut found);
        match found {
            Some(mut cursor) => {
                cursor.anchor = Some(copy_root.data);
                cursor
            }
            None => copy_root,
        }
    }

    /// Pretty print the tree on stdout.
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}

impl TreeItem for ParseNode {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        let data = self.data.borrow();
        match &data.strvec {
            Some(vec) => write!(f, "{} # {:?}", data.grammar.describe(), vec),
            None => write!(f, "{} # <no match>", data.grammar.describe()),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(self.children())
    }
}

impl Debug for ParseNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let data = self.data.borrow();
        let mut debug_struct = f.debug_struct("ParseNode");
        debug_struct
            .field("node", &data.grammar.describe())
            .field("strvec", &data.strvec);
        if !data.children.is_empty() {
            debug_struct.field("children", &data.children);
        }
        debug_struct.finish()
    }
}
