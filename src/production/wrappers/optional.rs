use crate::production::{GrammarLogger, Optional};
use crate::{
    complete_child, parse_child, Completion, ConfigKind, ConfigSchema, ConfigValue, ErrorKind,
    GrammarError, IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult,
    SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

pub(crate) fn config_child(
    config: &ConfigValue,
    what: &'static str,
) -> Result<Rc<dyn IGrammar>, GrammarError> {
    config
        .dict_get("child")
        .and_then(ConfigValue::as_node)
        .cloned()
        .ok_or_else(|| GrammarError::new(ErrorKind::BadFormat, what, "a child node is required"))
}

impl Optional {
    /// Create an [Optional] utility: `symbol` or nothing.
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
            name: "option",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "child",
                "The optional symbol.",
                ConfigKind::Node,
            )
            .mandatory()])),
            build: |id, config| {
                let mut node = Optional::new(config_child(config, "option")?);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Optional {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Optional {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}?", self.symbol)
    }
}

impl IGrammar for Optional {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "option"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = match parse_child(&self.symbol, state, input)? {
            ParseMatch::Consumed(count) => Ok(ParseMatch::Consumed(count)),
            ParseMatch::NoMatch => Ok(ParseMatch::Consumed(0)),
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
        complete_child(&self.symbol, comp, input)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        vec![self.symbol.clone()]
    }
}
