use crate::production::{GrammarLogger, Repeat};
use crate::{
    complete_child, parse_child, Completion, ConfigKind, ConfigSchema, ConfigValue, GrammarError,
    IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

use super::optional::config_child;

impl Repeat {
    /// Create a [Repeat] utility parsing `symbol` greedily between `min` and `max` times;
    /// `max == 0` lifts the upper bound.
    pub fn new(symbol: Rc<dyn IGrammar>, min: usize, max: usize) -> Self {
        Self {
            base: NodeBase::new(),
            symbol,
            min,
            max,
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

    /// Complete the child at the current repetition boundary, then follow one more repetition of
    /// the parse as long as the bound allows and the child keeps consuming input.
    fn complete_depth(
        &self,
        comp: &mut Completion,
        input: &StrVec,
        max: usize,
    ) -> Result<(), GrammarError> {
        complete_child(&self.symbol, comp, input)?;
        if max == 1 {
            return Ok(());
        }
        let next_max = if max == 0 { 0 } else { max - 1 };
        let pstate = match comp.cur_pstate() {
            Some(pstate) => pstate.clone(),
            None => return Ok(()),
        };
        match parse_child(&self.symbol, &pstate, input)? {
            ParseMatch::NoMatch => Ok(()),
            ParseMatch::Consumed(0) => {
                pstate.del_last_child();
                Ok(())
            }
            ParseMatch::Consumed(count) => {
                let remaining = input.ndup(count, input.len() - count)?;
                let result = self.complete_depth(comp, &remaining, next_max);
                pstate.del_last_child();
                result
            }
        }
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "many",
            schema: Some(ConfigSchema::new(vec![
                SchemaEntry::new("child", "The repeated symbol.", ConfigKind::Node).mandatory(),
                SchemaEntry::new("min", "The minimum repetition count.", ConfigKind::U64),
                SchemaEntry::new(
                    "max",
                    "The maximum repetition count; 0 means unbounded.",
                    ConfigKind::U64,
                ),
            ])),
            build: |id, config| {
                let symbol = config_child(config, "many")?;
                let min = config.dict_get("min").and_then(ConfigValue::as_u64).unwrap_or(0);
                let max = config.dict_get("max").and_then(ConfigValue::as_u64).unwrap_or(0);
                let mut node = Repeat::new(symbol, min as usize, max as usize);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Repeat {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Repeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.min, self.max) {
            (1, 0) => write!(f, "{}+", self.symbol),
            (0, 0) => write!(f, "{}*", self.symbol),
            (min, max) => write!(f, "{}{{{},{}}}", self.symbol, min, max),
        }
    }
}

impl IGrammar for Repeat {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "many"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let mut consumed = 0;
        let mut count = 0;
        loop {
            if self.max != 0 && count == self.max {
                break;
            }
            let remaining = input.ndup(consumed, input.len() - consumed)?;
            match parse_child(&self.symbol, state, &remaining) {
                Ok(ParseMatch::NoMatch) => break,
                Ok(ParseMatch::Consumed(step)) => {
                    count += 1;
                    consumed += step;
                    // a repetition consuming nothing would never terminate
                    if step == 0 {
                        break;
                    }
                }
                Err(err) => {
                    for _ in 0..count {
                        state.del_last_child();
                    }
                    return Err(err);
                }
            }
        }

        let result = if count < self.min {
            for _ in 0..count {
                state.del_last_child();
            }
            Ok(ParseMatch::NoMatch)
        } else {
            Ok(ParseMatch::Consumed(consumed))
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
        self.complete_depth(comp, input, self.max)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        vec![self.symbol.clone()]
    }
}
