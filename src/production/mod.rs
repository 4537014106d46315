//! A module consist of production utilities which are helper utilities to write the grammar of a
//! command language.
//!
//! Each production utility represents a defined rule of operation over a token vector.
//! Terminal utilities like [Literal], [IntLiteral] or [RegexField] match a single token, whereas
//! non-terminal utilities arrange other symbols: [Concat] parses its children in series, [Union]
//! uses the first matching alternative and [Subset] accepts its children in any order.
//! The wrapper utilities [Optional], [Repeat], [Once], [Cond] or [Bypass] alter the behavior of
//! one associated symbol, and the lexer bridges [ShellLexer] and [ReLexer] split one raw token
//! into a vector which is then consumed by a sub-grammar.
//! Finally [Cmd] and [Expr] compile a command template or an operator precedence description
//! into a graph of the utilities above.
//!
//! Every utility answers both [parse](crate::IGrammar::parse) and
//! [complete](crate::IGrammar::complete) queries, so the grammar that executes commands is also
//! the grammar that proposes completions.

mod cmd;
mod expr;
mod non_terminals;
mod terminals;
mod wrappers;

#[cfg(test)]
mod __tests__;

use crate::{GrammarError, IGrammar, Log, NodeBase, ParseMatch, ParseNode, ParseResult, StrVec};
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::fmt;
use std::rc::{Rc, Weak};

pub use expr::ExprEvalOps;

/// A terminal symbol which matches one token equal to a fixed word.
///
/// Completion proposes the word whenever the token being completed is a prefix of it.
/// # Example
/// ```
/// use cligram::production::Literal;
/// use cligram::{parse_strvec, IGrammar, StrVec};
/// use std::rc::Rc;
///
/// let foo: Rc<dyn IGrammar> = Rc::new(Literal::new("foo"));
///
/// let input: StrVec = ["foo"].as_slice().into();
/// assert!(parse_strvec(&foo, &input).unwrap().matches());
///
/// let input: StrVec = ["fo"].as_slice().into();
/// assert!(!parse_strvec(&foo, &input).unwrap().matches());
/// ```
pub struct Literal {
    base: NodeBase,
    word: String,
    debugger: OnceCell<Log<&'static str>>,
}

/// A terminal symbol which matches one token parsed as a signed integer.
///
/// The token must parse entirely in the declared radix (0 auto-detects `0x` hexadecimal and
/// leading-zero octal) and fall within the configured bounds.
/// The utility never proposes completions.
pub struct IntLiteral {
    base: NodeBase,
    min: Option<i64>,
    max: Option<i64>,
    radix: u32,
    debugger: OnceCell<Log<&'static str>>,
}

/// A terminal symbol which matches one token parsed as an unsigned integer; a leading minus sign
/// is always rejected.
pub struct UintLiteral {
    base: NodeBase,
    min: Option<u64>,
    max: Option<u64>,
    radix: u32,
    debugger: OnceCell<Log<&'static str>>,
}

/// A terminal symbol which matches one token against a regular expression; the whole token must
/// match.
pub struct RegexField {
    base: NodeBase,
    pattern: String,
    regexp: Regex,
    debugger: OnceCell<Log<&'static str>>,
}

/// A terminal symbol which matches any single token, optionally restricted to tokens carrying a
/// named attribute (as produced by the [ReLexer] rules).
pub struct AnyTok {
    base: NodeBase,
    required_attr: Option<String>,
    debugger: OnceCell<Log<&'static str>>,
}

/// A production which matches zero tokens and always succeeds.
pub struct EmptyProd {
    base: NodeBase,
}

/// A terminal symbol which matches one non-empty whitespace token.
pub struct SpaceTok {
    base: NodeBase,
}

/// The filesystem access used by [FilePath] completion, injectable so tests are deterministic.
pub trait FileBrowser {
    /// Whether `path` names a directory.
    fn is_dir(&self, path: &str) -> std::io::Result<bool>;

    /// The entries of the directory `path` as `(name, is_directory)` pairs.
    fn read_dir(&self, path: &str) -> std::io::Result<Vec<(String, bool)>>;
}

/// The default [FileBrowser] backed by [std::fs].
pub struct StdFileBrowser;

/// A terminal symbol which matches any single token and completes filesystem paths: regular
/// files are proposed in full, directories partially with a trailing `/`.
pub struct FilePath {
    base: NodeBase,
    browser: Rc<dyn FileBrowser>,
}

/// A non-terminal utility implementing alternative derivations: the children are tried in
/// declared order and the first match wins.
///
/// Completion merges the proposals of every child.
/// # Example
/// ```
/// use cligram::production::{Literal, Union};
/// use cligram::{parse_strvec, IGrammar, StrVec};
/// use std::rc::Rc;
///
/// let keyword: Rc<dyn IGrammar> = Rc::new(Union::new(vec![
///     Rc::new(Literal::new("on")) as Rc<dyn IGrammar>,
///     Rc::new(Literal::new("off")),
/// ]));
///
/// let input: StrVec = ["off"].as_slice().into();
/// let tree = parse_strvec(&keyword, &input).unwrap();
/// assert_eq!(tree.strvec().unwrap(), input);
/// ```
pub struct Union {
    base: NodeBase,
    symbols: OnceCell<Vec<Rc<dyn IGrammar>>>,
    debugger: OnceCell<Log<&'static str>>,
}

/// A non-terminal utility deriving the concatenation of its children: every child must match in
/// series, each consuming a prefix of what the previous one left.
///
/// Completion walks the children along the parsed prefix and completes the first child that has
/// not fully consumed the remaining input.
/// # Example
/// ```
/// use cligram::production::{Concat, Literal};
/// use cligram::{parse_strvec, IGrammar, StrVec};
/// use std::rc::Rc;
///
/// let pair: Rc<dyn IGrammar> = Rc::new(Concat::new(vec![
///     Rc::new(Literal::new("x")) as Rc<dyn IGrammar>,
///     Rc::new(Literal::new("y")),
/// ]));
///
/// let input: StrVec = ["x", "y"].as_slice().into();
/// let tree = parse_strvec(&pair, &input).unwrap();
/// assert!(tree.matches());
/// assert_eq!(tree.children().len(), 2);
/// ```
pub struct Concat {
    base: NodeBase,
    symbols: OnceCell<Vec<Rc<dyn IGrammar>>>,
    debugger: OnceCell<Log<&'static str>>,
}

/// A non-terminal utility matching the longest subset of its children, in any order, each child
/// at most once.
///
/// When several subsets tie in length the first one found by the left-first search wins, so
/// parsing stays deterministic. An empty subset is a valid zero token match.
pub struct Subset {
    base: NodeBase,
    symbols: Vec<Rc<dyn IGrammar>>,
    debugger: OnceCell<Log<&'static str>>,
}

/// A wrapper utility which makes its associated symbol optional: a failed match consumes zero
/// tokens and still succeeds.
pub struct Optional {
    base: NodeBase,
    symbol: Rc<dyn IGrammar>,
    debugger: OnceCell<Log<&'static str>>,
}

/// A wrapper utility parsing its associated symbol repeatedly, greedily, between `min` and `max`
/// times (`max == 0` lifts the upper bound).
///
/// A repetition consuming zero tokens stops the expansion, so a nullable child cannot loop.
/// # Example
/// ```
/// use cligram::production::{Literal, Repeat, Union};
/// use cligram::{parse_strvec, IGrammar, StrVec};
/// use std::rc::Rc;
///
/// let word = Rc::new(Union::new(vec![
///     Rc::new(Literal::new("foo")) as Rc<dyn IGrammar>,
///     Rc::new(Literal::new("bar")),
/// ]));
/// let words: Rc<dyn IGrammar> = Rc::new(Repeat::new(word, 0, 0));
///
/// let input: StrVec = ["foo", "foo", "bar"].as_slice().into();
/// let tree = parse_strvec(&words, &input).unwrap();
/// assert_eq!(tree.len(), 3);
///
/// let empty = StrVec::new();
/// assert!(parse_strvec(&words, &empty).unwrap().matches());
/// ```
pub struct Repeat {
    base: NodeBase,
    symbol: Rc<dyn IGrammar>,
    min: usize,
    max: usize,
    debugger: OnceCell<Log<&'static str>>,
}

/// A wrapper utility which refuses to match again: when the current parse tree already contains
/// a match of the associated symbol, parsing and completion both decline.
pub struct Once {
    base: NodeBase,
    symbol: Rc<dyn IGrammar>,
    debugger: OnceCell<Log<&'static str>>,
}

/// A one-child holder closing recursion cycles in a grammar.
///
/// The utility is created unbound with [init](Bypass::init), referenced wherever the recursion
/// occurs, and bound once the recursive grammar is assembled.
/// Only a weak reference is kept, so a self referential grammar is still freed when its last
/// external handle is dropped.
/// # Example
/// ```
/// use cligram::production::{Bypass, Concat, Literal, Union};
/// use cligram::{parse_strvec, IGrammar, StrVec};
/// use std::rc::Rc;
///
/// // nested ::= "x" | "(" nested ")"
/// let inner = Rc::new(Bypass::init());
/// let nested: Rc<dyn IGrammar> = Rc::new(Union::new(vec![
///     Rc::new(Literal::new("x")) as Rc<dyn IGrammar>,
///     Rc::new(Concat::new(vec![
///         Rc::new(Literal::new("(")) as Rc<dyn IGrammar>,
///         inner.clone(),
///         Rc::new(Literal::new(")")),
///     ])),
/// ]));
/// inner.bind(&nested).unwrap();
///
/// let input: StrVec = ["(", "(", "x", ")", ")"].as_slice().into();
/// assert!(parse_strvec(&nested, &input).unwrap().matches());
/// ```
pub struct Bypass {
    base: NodeBase,
    target: OnceCell<Weak<dyn IGrammar>>,
}

/// One tokenization rule of a [ReLexer]: a pattern matched at the current offset, whether the
/// matched text is kept as a token, and an optional attribute recorded on the produced token.
pub struct LexRule {
    regexp: Regex,
    keep: bool,
    attr: Option<String>,
}

/// A wrapper utility which re-tokenizes one input token against an ordered rule table and runs
/// its associated symbol over the resulting vector, which must be fully consumed.
pub struct ReLexer {
    base: NodeBase,
    symbol: Rc<dyn IGrammar>,
    rules: Vec<LexRule>,
    debugger: OnceCell<Log<&'static str>>,
}

/// A wrapper utility bridging a raw input line to the token level engine.
///
/// The single input token is split with shell-like quoting rules
/// (see [shlex_tokenize](crate::shlex_tokenize)) and the associated symbol must consume every
/// produced token.
/// During completion an unterminated quote is tolerated and the proposals are re-quoted so that
/// inserting them into the user's line yields well formed tokens.
pub struct ShellLexer {
    base: NodeBase,
    symbol: Rc<dyn IGrammar>,
    debugger: OnceCell<Log<&'static str>>,
}

/// A builder invoked at parse or completion time with the current parse state, returning a fresh
/// grammar fragment.
pub type DynBuildFn = Rc<dyn Fn(&ParseNode) -> Result<Rc<dyn IGrammar>, GrammarError>>;

/// A builder returning the current string list of a [DynList] utility.
pub type DynListBuildFn = Rc<dyn Fn(&ParseNode) -> Result<Vec<String>, GrammarError>>;

/// A wrapper utility whose child grammar is built on demand: the builder sees the parse state
/// accumulated so far, and the fragment it returns lives exactly as long as the resulting parse
/// or completion tree.
pub struct Dynamic {
    base: NodeBase,
    build: DynBuildFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The matching behavior of a [DynList] utility; combine the constants with `|`.
pub struct DynListFlags(u8);

/// A terminal utility matching one token against a caller supplied string list, a regular
/// expression, or both.
///
/// With [MATCH_LIST](DynListFlags::MATCH_LIST) the token must be one of the listed strings, and
/// the listed strings are proposed as completions.
/// With [MATCH_REGEXP](DynListFlags::MATCH_REGEXP) the token must match the expression;
/// [EXCLUDE_LIST](DynListFlags::EXCLUDE_LIST) additionally rejects tokens present in the list.
/// # Example
/// ```
/// use cligram::production::{DynList, DynListFlags};
/// use cligram::{parse_strvec, IGrammar, StrVec};
/// use std::rc::Rc;
///
/// let names: Rc<dyn IGrammar> = Rc::new(DynList::new(
///     Rc::new(|_| Ok(vec!["foo".to_string(), "bar".to_string()])),
///     None,
///     DynListFlags::MATCH_LIST,
/// ).unwrap());
///
/// let input: StrVec = ["bar"].as_slice().into();
/// assert!(parse_strvec(&names, &input).unwrap().matches());
///
/// let input: StrVec = ["pouet"].as_slice().into();
/// assert!(!parse_strvec(&names, &input).unwrap().matches());
/// ```
pub struct DynList {
    base: NodeBase,
    build: DynListBuildFn,
    regexp: Option<Regex>,
    flags: DynListFlags,
}

impl fmt::Debug for DynList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynList")
            .field("regexp", &self.regexp)
            .field("flags", &self.flags)
            .finish()
    }
}

/// A utility compiling a human friendly command template into a grammar.
///
/// The template language supports literal words, `[optional]` parts, `(a,b,c)` subsets
/// (parentheses group, commas separate subset members), `a|b` alternatives and `x*`/`x+`
/// repetitions; identifiers naming one of the passed children are substituted by that child.
/// # Example
/// ```
/// use cligram::production::{Cmd, IntLiteral};
/// use cligram::{parse_strvec, IGrammar, StrVec};
/// use std::rc::Rc;
///
/// let value = Rc::new(IntLiteral::new(Some(0), Some(10), 10).with_id("value"))
///     as Rc<dyn IGrammar>;
/// let cmd: Rc<dyn IGrammar> =
///     Rc::new(Cmd::new("set [verbose] value", vec![value]).unwrap());
///
/// let input: StrVec = ["set", "7"].as_slice().into();
/// assert!(parse_strvec(&cmd, &input).unwrap().matches());
///
/// let input: StrVec = ["set", "verbose", "7"].as_slice().into();
/// assert!(parse_strvec(&cmd, &input).unwrap().matches());
///
/// let input: StrVec = ["set", "11"].as_slice().into();
/// assert!(!parse_strvec(&cmd, &input).unwrap().matches());
/// ```
pub struct Cmd {
    base: NodeBase,
    template: String,
    cmd: Rc<dyn IGrammar>,
    debugger: OnceCell<Log<&'static str>>,
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cmd")
            .field("template", &self.template)
            .finish()
    }
}

/// A utility building an operator precedence grammar from a value symbol, binary operators
/// (tightest first), prefix and postfix operators and parenthesis pairs.
///
/// The recursion of the generated grammar is closed through a [Bypass] node, and a matching
/// parse tree can be evaluated bottom-up with [eval](Expr::eval).
pub struct Expr {
    base: NodeBase,
    child: Rc<dyn IGrammar>,
    val_node: Rc<dyn IGrammar>,
    bin_ops: Vec<Rc<dyn IGrammar>>,
    pre_ops: Vec<Rc<dyn IGrammar>>,
    post_ops: Vec<Rc<dyn IGrammar>>,
    parens: Vec<(Rc<dyn IGrammar>, Rc<dyn IGrammar>)>,
    debugger: OnceCell<Log<&'static str>>,
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expr").finish()
    }
}

/// A wrapper utility admitting a child match only when a boolean predicate over the parse state
/// holds.
///
/// The predicate language supports nested calls of `root()`, `current()`, `first_child(ns)`,
/// `find(ns, id)`, `count(ns)`, `bool(x)`, `or(...)`, `and(...)` and `cmp(op, a, b)`.
/// # Example
/// ```
/// use cligram::production::{Cond, Literal, Repeat};
/// use cligram::{parse_strvec, IGrammar, StrVec};
/// use std::rc::Rc;
///
/// // accept at most three occurrences of "foo"
/// let word = Rc::new(Literal::new("foo").with_id("word")) as Rc<dyn IGrammar>;
/// let bounded: Rc<dyn IGrammar> = Rc::new(Cond::new(
///     "cmp(le, count(find(root(), word)), 3)",
///     Rc::new(Repeat::new(word, 0, 0)),
/// ).unwrap());
///
/// let input: StrVec = ["foo", "foo", "foo"].as_slice().into();
/// assert!(parse_strvec(&bounded, &input).unwrap().matches());
///
/// let input: StrVec = ["foo", "foo", "foo", "foo"].as_slice().into();
/// assert!(!parse_strvec(&bounded, &input).unwrap().matches());
/// ```
pub struct Cond {
    base: NodeBase,
    cond_str: String,
    parsed_cond: ParseNode,
    symbol: Rc<dyn IGrammar>,
    debugger: OnceCell<Log<&'static str>>,
}

impl fmt::Debug for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cond")
            .field("cond_str", &self.cond_str)
            .finish()
    }
}

pub(crate) trait GrammarLogger {
    fn get_debugger(&self) -> Option<&Log<&'static str>>;

    fn log_entry(&self) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.get_debugger() {
            if log_label.order() >= Log::Verbose(()).order() {
                println!("Entering '{}'", log_label)
            }
        }
    }

    fn log_result(&self, _input: &StrVec, _result: &ParseResult) {
        #[cfg(debug_assertions)]
        if let Some(log_label) = self.get_debugger() {
            match _result {
                Ok(ParseMatch::Consumed(count)) => {
                    if log_label.order() >= Log::Success(()).order() {
                        println!(
                            "Parsing success for '{}': consumed {} of [{}].",
                            log_label, count, _input
                        )
                    }
                }
                Ok(ParseMatch::NoMatch) => {
                    if log_label.order() >= Log::Result(()).order() {
                        println!("Unmatched production '{}' at [{}].", log_label, _input)
                    }
                }
                Err(err) => {
                    if log_label.order() >= Log::Result(()).order() {
                        println!("Parsing error for '{}': {}.", log_label, err)
                    }
                }
            }
        }
    }
}
