//! cligram is a library to build interactive command line interpreters by composing a grammar
//! graph whose nodes all understand two operations over a token vector: *parse* (does a prefix of
//! the input match?) and *complete* (what could the next token be?).
//!
//! # Overview
//! Interactive command line tools usually implement their parser and their tab completion as two
//! separate pieces of code, and the two drift apart as commands evolve.
//! This library derives both behaviors from a single description of the command language.
//! A grammar is assembled from production utilities like [Literal](crate::production::Literal),
//! [Concat](crate::production::Concat) or [Union](crate::production::Union); the resulting graph
//! is then used to parse a [StrVec] of tokens into a [ParseNode] tree, or to compute a
//! [Completion] tree describing every acceptable continuation of a partial input.
//! Because the same nodes drive both paths, the executed commands and the proposed completions
//! can never disagree.
//!
//! # Design
//! Grammar nodes are reference counted trait objects implementing [IGrammar].
//! Terminal utilities ([Literal](crate::production::Literal),
//! [IntLiteral](crate::production::IntLiteral), [RegexField](crate::production::RegexField), ...)
//! match a single token, while combinators ([Concat](crate::production::Concat),
//! [Union](crate::production::Union), [Repeat](crate::production::Repeat),
//! [Subset](crate::production::Subset), ...) arrange other nodes.
//! Recursive grammars are closed through the [Bypass](crate::production::Bypass) utility which
//! holds a weak reference, so dropping the last external handle of a grammar frees the whole
//! graph even when it is self referential.
//! The [ShellLexer](crate::production::ShellLexer) utility bridges a raw input line to the token
//! level engine with shell-like quoting rules, and the
//! [Cmd](crate::production::Cmd)/[Expr](crate::production::Expr) utilities compile command
//! templates and operator grammars into the same node algebra.
//!
//! # Example
//! ```
//! use cligram::production::{Concat, Literal, ShellLexer, Union};
//! use cligram::{complete, parse, CompKind, IGrammar};
//! use std::rc::Rc;
//!
//! let action = Rc::new(Union::new(vec![
//!     Rc::new(Literal::new("list")) as Rc<dyn IGrammar>,
//!     Rc::new(Literal::new("add")),
//!     Rc::new(Literal::new("del")),
//! ]));
//!
//! let command = Rc::new(Concat::new(vec![
//!     Rc::new(Literal::new("pool")) as Rc<dyn IGrammar>,
//!     action,
//! ]));
//!
//! let line: Rc<dyn IGrammar> = Rc::new(ShellLexer::new(command));
//!
//! let tree = parse(&line, "pool add").unwrap();
//! assert!(tree.matches());
//!
//! let tree = parse(&line, "pool destroy").unwrap();
//! assert!(!tree.matches());
//!
//! // the same graph answers completion queries
//! let comp = complete(&line, "pool a").unwrap();
//! let proposals: Vec<&str> = comp
//!     .iter(CompKind::Full.into())
//!     .filter_map(|item| item.str())
//!     .collect();
//! assert_eq!(proposals, vec!["add"]);
//! ```

mod attrs;
mod complete;
#[cfg(test)]
mod __tests__;
mod config;
mod error;
pub mod examples;
mod node;
mod parse;
pub mod production;
mod registry;
mod shlex;
mod strvec;
mod util;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;
use std::rc::{Rc, Weak};

pub use complete::{
    complete, complete_child, complete_strvec, complete_strvec_expand, complete_unknown,
};
pub use config::{ConfigKind, ConfigSchema, ConfigValue, SchemaEntry};
pub use node::{check_type, find, get_callback, get_helps, set_callback, set_desc, set_help};
pub use parse::{parse, parse_child, parse_strvec};
pub use registry::{build_node, lookup_node_type, register_node_type, NodeBuildFn, NodeTypeInfo};
pub use shlex::{shlex_tokenize, ShLexMode, ShLexed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The failure categories reported by the library (a failed match is never a failure, see
/// [ParseMatch]).
pub enum ErrorKind {
    InvalidArgument,
    AlreadyExists,
    NotFound,
    BadFormat,
    NotPermitted,
    OutOfRange,
}

#[derive(Debug, Clone)]
/// An error returned for an invalid grammar, configuration or query.
///
/// A failed match is not an error: the parse path reports it through
/// [NoMatch](ParseMatch::NoMatch), which is data.
pub struct GrammarError {
    kind: ErrorKind,
    what: String,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The outcome of a parse dispatch: either the number of consumed tokens (zero is a valid match)
/// or a refusal to match.
pub enum ParseMatch {
    Consumed(usize),
    NoMatch,
}

/// A result returned from a grammar node when it tries to consume input tokens.
pub type ParseResult = Result<ParseMatch, GrammarError>;

/// A callback attached to a grammar node, dispatched with the matching parse tree.
pub type CommandFn = Rc<dyn Fn(&ParseNode)>;

#[derive(Clone)]
/// A typed value stored in an attribute dictionary.
pub enum AttrValue {
    /// A presence marker without payload.
    Flag,
    Int(i64),
    Str(String),
    /// An owned grammar node, kept alive as long as the dictionary.
    Node(Rc<dyn IGrammar>),
    Callback(CommandFn),
}

/// A dictionary of free form attributes with deterministic iteration order.
pub type AttrDict = BTreeMap<String, AttrValue>;

/// The shared header of every grammar node: an optional identity and a mutable attribute
/// dictionary.
pub struct NodeBase {
    id: Option<String>,
    attrs: RefCell<AttrDict>,
}

impl fmt::Debug for NodeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBase").field("id", &self.id).finish()
    }
}

impl fmt::Debug for dyn IGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// The polymorphic surface of a grammar node.
///
/// A node is used through `Rc<dyn IGrammar>`; cloning the handle shares the node.
/// Implementations provide [parse](IGrammar::parse) and usually override
/// [complete](IGrammar::complete); the default completion records a single unknown proposal.
pub trait IGrammar: Display {
    /// The shared node header (identity and attributes).
    fn base(&self) -> &NodeBase;

    /// The registry name of this node type.
    fn type_name(&self) -> &'static str;

    /// Try to match a prefix of `input`, recording structure under `state`, the parse tree node
    /// already allocated for this grammar node.
    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult;

    /// Propose completions of the last token of `input`.
    fn complete(
        &self,
        this: &Rc<dyn IGrammar>,
        comp: &mut Completion,
        input: &StrVec,
    ) -> Result<(), GrammarError> {
        complete_unknown(this, comp, input)
    }

    /// A short human readable description of the node.
    fn describe(&self) -> String {
        format!("<{}>", self.type_name())
    }

    /// The direct children of this node in the grammar graph.
    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        Vec::new()
    }
}

#[derive(Clone, Default)]
/// An ordered token vector with a per-token attribute dictionary.
///
/// Element strings are reference counted: duplicating a vector or a slice of it shares the
/// underlying strings instead of copying them.
/// Equality and ordering consider the token strings only, never the attributes; ordering
/// compares lengths first, then elements.
pub struct StrVec {
    entries: Vec<StrEntry>,
}

#[derive(Clone)]
struct StrEntry {
    value: Rc<str>,
    attrs: Option<Rc<AttrDict>>,
}

#[derive(Clone)]
/// A handle on a node of a parse tree.
///
/// The tree mirrors the grammar path taken by a parse: every node references the grammar node
/// that produced it and, when it matched, the consumed sub-vector.
/// Cloning the handle aliases the same tree node; [duplicate](ParseNode::duplicate) performs a
/// deep copy.
pub struct ParseNode {
    data: Rc<RefCell<PNodeData>>,
    // set on handles returned by duplicate() so the copied root outlives the cursor
    anchor: Option<Rc<RefCell<PNodeData>>>,
}

struct PNodeData {
    grammar: Rc<dyn IGrammar>,
    strvec: Option<StrVec>,
    attrs: AttrDict,
    parent: Weak<RefCell<PNodeData>>,
    children: Vec<ParseNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The nature of a completion proposal.
pub enum CompKind {
    /// The token is proposed in full; appending the completion yields a valid token.
    Full,
    /// Only a partial continuation is known (for example a directory in a file path).
    Partial,
    /// The node matches here but cannot enumerate proposals.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A set of [CompKind] values used to filter completion queries.
pub struct CompKindMask(u8);

/// A single completion proposal.
pub struct CompItem {
    kind: CompKind,
    current: Option<String>,
    full: Option<String>,
    completion: Option<String>,
    display: Option<String>,
}

/// A group of completion items, all produced by the same grammar node at the same parse state.
pub struct CompGroup {
    // stable identity, insertion position independent
    gid: usize,
    node: Rc<dyn IGrammar>,
    pstate: ParseNode,
    attrs: AttrDict,
    items: Vec<CompItem>,
}

/// The result of a completion query: ordered groups of typed proposals.
pub struct Completion {
    count_full: usize,
    count_partial: usize,
    count_unknown: usize,
    next_gid: usize,
    groups: Vec<CompGroup>,
    cur_pstate: Option<ParseNode>,
    cur_group: Option<usize>,
    attrs: AttrDict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A description/help pair collected for a completion group, consumed by line editor
/// integrations.
pub struct HelpItem {
    pub desc: String,
    pub help: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to grammar utilities.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
