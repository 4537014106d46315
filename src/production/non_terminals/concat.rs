use crate::production::{Concat, GrammarLogger};
use crate::{
    complete_child, parse_child, Completion, ConfigSchema, GrammarError, IGrammar, NodeBase,
    NodeTypeInfo, ParseMatch, ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

use super::union::collect_children;

impl Concat {
    /// Create a [Concat] utility without its symbols; used with
    /// [set_symbols](Concat::set_symbols) when the grammar is recursive.
    pub fn init() -> Self {
        Self {
            base: NodeBase::new(),
            symbols: OnceCell::new(),
            debugger: OnceCell::new(),
        }
    }

    /// Create a [Concat] utility parsing `symbols` in series.
    pub fn new(symbols: Vec<Rc<dyn IGrammar>>) -> Self {
        let cell = OnceCell::new();
        if cell.set(symbols).is_err() {
            panic!("Internal error")
        }
        Self {
            base: NodeBase::new(),
            symbols: cell,
            debugger: OnceCell::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    /// Assign the symbols of a deferred concatenation.
    pub fn set_symbols(&self, symbols: Vec<Rc<dyn IGrammar>>) -> Result<(), String> {
        self.symbols
            .set(symbols)
            .map_err(|_| "Symbols are already set for this production.".to_string())
    }

    fn get_symbols(&self) -> &[Rc<dyn IGrammar>] {
        self.symbols.get_or_init(|| {
            if cfg!(debug_assertions) {
                panic!("Symbols are not set for this concatenation. Assign symbols before parsing.")
            }
            Vec::new()
        })
    }

    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }

    fn complete_symbols(
        symbols: &[Rc<dyn IGrammar>],
        comp: &mut Completion,
        input: &StrVec,
    ) -> Result<(), GrammarError> {
        let (first, rest) = match symbols.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };
        complete_child(first, comp, input)?;
        let pstate = match comp.cur_pstate() {
            Some(pstate) => pstate.clone(),
            None => return Ok(()),
        };
        match parse_child(first, &pstate, input)? {
            ParseMatch::NoMatch => Ok(()),
            ParseMatch::Consumed(count) => {
                let remaining = input.ndup(count, input.len() - count)?;
                let result = Self::complete_symbols(rest, comp, &remaining);
                pstate.del_last_child();
                result
            }
        }
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "seq",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "children",
                "The symbols to parse in series.",
                crate::ConfigKind::List,
            )
            .mandatory()
            .with_subschema(vec![SchemaEntry::element(
                "A symbol of the sequence.",
                crate::ConfigKind::Node,
            )])])),
            build: |id, config| {
                let children = collect_children(config, "seq")?;
                let mut node = Concat::new(children);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Concat {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Concat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base.id().unwrap_or("seq"))
    }
}

impl IGrammar for Concat {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "seq"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let mut consumed = 0;
        let mut matched = 0;
        let mut result = Ok(ParseMatch::NoMatch);
        let mut all_matched = true;
        for symbol in self.get_symbols() {
            let remaining = input.ndup(consumed, input.len() - consumed)?;
            match parse_child(symbol, state, &remaining) {
                Ok(ParseMatch::Consumed(count)) => {
                    consumed += count;
                    matched += 1;
                }
                Ok(ParseMatch::NoMatch) => {
                    for _ in 0..matched {
                        state.del_last_child();
                    }
                    all_matched = false;
                    break;
                }
                Err(err) => {
                    for _ in 0..matched {
                        state.del_last_child();
                    }
                    return Err(err);
                }
            }
        }
        if all_matched {
            result = Ok(ParseMatch::Consumed(consumed));
        }

        #[cfg(debug_assertions)]
        self.log_result(input, &result);

        result
    }

    fn complete(
        &self,
        _this: &Rc<dyn IGrammar>,
        comp: &mut Completion,
        input: &StrVec,
    ) -> Result<(), GrammarError> {
        Self::complete_symbols(self.get_symbols(), comp, input)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        self.get_symbols().to_vec()
    }
}
