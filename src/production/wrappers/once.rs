use crate::production::{GrammarLogger, Once};
use crate::{
    complete_child, parse_child, Completion, ConfigSchema, GrammarError, IGrammar, NodeBase,
    NodeTypeInfo, ParseMatch, ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

use super::optional::config_child;

/// Count the matches of `symbol` recorded anywhere in the tree containing `state`.
fn count_matches(state: &ParseNode, symbol: &Rc<dyn IGrammar>) -> usize {
    fn rec(pnode: &ParseNode, symbol: &Rc<dyn IGrammar>) -> usize {
        let mut count = if Rc::ptr_eq(&pnode.grammar(), symbol) {
            1
        } else {
            0
        };
        for child in pnode.children() {
            count += rec(&child, symbol);
        }
        count
    }
    rec(&state.root(), symbol)
}

impl Once {
    /// Create a [Once] utility: `symbol`, but at most once per parse.
    pub fn new(symbol: Rc<dyn IGrammar>) -> Self {
        Self {
            base: NodeBase::new(),
            symbol,
            debugger: OnceCell::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "once",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "child",
                "The symbol to accept at most once.",
                crate::ConfigKind::Node,
            )
            .mandatory()])),
            build: |id, config| {
                let mut node = Once::new(config_child(config, "once")?);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Once {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Once {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "once({})", self.symbol)
    }
}

impl IGrammar for Once {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "once"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = if count_matches(state, &self.symbol) > 0 {
            Ok(ParseMatch::NoMatch)
        } else {
            parse_child(&self.symbol, state, input)
        };

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
        if let Some(pstate) = comp.cur_pstate() {
            if count_matches(pstate, &self.symbol) > 0 {
                return Ok(());
            }
        }
        complete_child(&self.symbol, comp, input)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        vec![self.symbol.clone()]
    }
}
