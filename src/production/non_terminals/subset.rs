use crate::production::{GrammarLogger, Subset};
use crate::{
    complete_child, parse_child, Completion, ConfigSchema, GrammarError, IGrammar, NodeBase,
    NodeTypeInfo, ParseMatch, ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

use super::union::collect_children;

// the best subset found so far: number of matched children, tokens they consumed
#[derive(Debug, Clone, Copy, Default)]
struct SubsetOutcome {
    matched: usize,
    consumed: usize,
}

/// Left-first exhaustive search of the longest child subset.
///
/// Each child pnode linked under `state` during an attempt is collected again afterwards; only
/// the chain of the best attempt is relinked before returning. A candidate replaces the best
/// only when it matches strictly more children, so equal sized subsets keep the first one found.
fn parse_rec(
    table: &mut Vec<Option<Rc<dyn IGrammar>>>,
    state: &ParseNode,
    input: &StrVec,
) -> Result<SubsetOutcome, GrammarError> {
    let mut best = SubsetOutcome::default();
    let mut best_chain: Vec<ParseNode> = Vec::new();
    for index in 0..table.len() {
        let symbol = match &table[index] {
            Some(symbol) => symbol.clone(),
            None => continue,
        };
        let mark = state.child_count();
        match parse_child(&symbol, state, input)? {
            ParseMatch::NoMatch => continue,
            ParseMatch::Consumed(count) => {
                let remaining = match input.ndup(count, input.len() - count) {
                    Ok(remaining) => remaining,
                    Err(err) => {
                        state.take_children_from(mark);
                        return Err(err);
                    }
                };
                table[index] = None;
                let sub = parse_rec(table, state, &remaining);
                table[index] = Some(symbol);
                let sub = match sub {
                    Ok(sub) => sub,
                    Err(err) => {
                        state.take_children_from(mark);
                        return Err(err);
                    }
                };
                let chain = state.take_children_from(mark);
                if sub.matched + 1 > best.matched {
                    best = SubsetOutcome {
                        matched: sub.matched + 1,
                        consumed: count + sub.consumed,
                    };
                    best_chain = chain;
                }
            }
        }
    }
    for pnode in &best_chain {
        state.link_child(pnode);
    }
    Ok(best)
}

fn complete_rec(
    table: &mut Vec<Option<Rc<dyn IGrammar>>>,
    comp: &mut Completion,
    input: &StrVec,
) -> Result<(), GrammarError> {
    // first, every remaining child may complete the current position
    let symbols: Vec<Rc<dyn IGrammar>> = table.iter().flatten().cloned().collect();
    for symbol in &symbols {
        complete_child(symbol, comp, input)?;
    }
    let pstate = match comp.cur_pstate() {
        Some(pstate) => pstate.clone(),
        None => return Ok(()),
    };
    // then, advance over each matching child and complete with the others
    for index in 0..table.len() {
        let symbol = match &table[index] {
            Some(symbol) => symbol.clone(),
            None => continue,
        };
        match parse_child(&symbol, &pstate, input)? {
            ParseMatch::NoMatch => continue,
            ParseMatch::Consumed(count) => {
                let remaining = input.ndup(count, input.len() - count)?;
                table[index] = None;
                let result = complete_rec(table, comp, &remaining);
                table[index] = Some(symbol);
                pstate.del_last_child();
                result?;
            }
        }
    }
    Ok(())
}

impl Subset {
    /// Create a [Subset] utility matching the longest subset of `symbols`, in any order, each at
    /// most once.
    pub fn new(symbols: Vec<Rc<dyn IGrammar>>) -> Self {
        Self {
            base: NodeBase::new(),
            symbols,
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
            name: "subset",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "children",
                "The symbols the subset is drawn from.",
                crate::ConfigKind::List,
            )
            .mandatory()
            .with_subschema(vec![SchemaEntry::element(
                "A subset member.",
                crate::ConfigKind::Node,
            )])])),
            build: |id, config| {
                let children = collect_children(config, "subset")?;
                let mut node = Subset::new(children);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Subset {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base.id().unwrap_or("subset"))
    }
}

impl IGrammar for Subset {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "subset"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let mut table: Vec<Option<Rc<dyn IGrammar>>> =
            self.symbols.iter().cloned().map(Some).collect();
        let outcome = parse_rec(&mut table, state, input)?;
        // an empty subset is a valid zero token match
        let result = Ok(ParseMatch::Consumed(outcome.consumed));

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
        let mut table: Vec<Option<Rc<dyn IGrammar>>> =
            self.symbols.iter().cloned().map(Some).collect();
        complete_rec(&mut table, comp, input)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        self.symbols.clone()
    }
}
