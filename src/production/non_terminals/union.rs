use crate::production::{GrammarLogger, Union};
use crate::{
    complete_child, parse_child, Completion, ConfigKind, ConfigSchema, ConfigValue, ErrorKind,
    GrammarError, IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult,
    SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

impl Union {
    /// Create a [Union] utility without its alternatives; used with
    /// [set_symbols](Union::set_symbols) when the grammar is recursive.
    pub fn init() -> Self {
        Self {
            base: NodeBase::new(),
            symbols: OnceCell::new(),
            debugger: OnceCell::new(),
        }
    }

    /// Create a [Union] utility with its alternative symbols.
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

    /// Assign the alternative symbols of a deferred union.
    pub fn set_symbols(&self, symbols: Vec<Rc<dyn IGrammar>>) -> Result<(), String> {
        self.symbols
            .set(symbols)
            .map_err(|_| "Symbols are already set for this production.".to_string())
    }

    fn get_symbols(&self) -> &[Rc<dyn IGrammar>] {
        self.symbols.get_or_init(|| {
            if cfg!(debug_assertions) {
                panic!("Symbols are not set for this union. Assign symbols before parsing.")
            }
            Vec::new()
        })
    }

    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "or",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "children",
                "The alternative symbols, tried in order.",
                ConfigKind::List,
            )
            .mandatory()
            .with_subschema(vec![SchemaEntry::element(
                "An alternative symbol.",
                ConfigKind::Node,
            )])])),
            build: |id, config| {
                let children = collect_children(config, "or")?;
                let mut node = Union::new(children);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

pub(crate) fn collect_children(
    config: &ConfigValue,
    what: &'static str,
) -> Result<Vec<Rc<dyn IGrammar>>, GrammarError> {
    let list = config
        .dict_get("children")
        .and_then(ConfigValue::as_list)
        .ok_or_else(|| {
            GrammarError::new(ErrorKind::BadFormat, what, "a children list is required")
        })?;
    list.iter()
        .map(|value| {
            value.as_node().cloned().ok_or_else(|| {
                GrammarError::new(ErrorKind::BadFormat, what, "children must be nodes")
            })
        })
        .collect()
}

impl GrammarLogger for Union {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Union {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base.id().unwrap_or("or"))
    }
}

impl IGrammar for Union {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "or"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let mut result = Ok(ParseMatch::NoMatch);
        for symbol in self.get_symbols() {
            match parse_child(symbol, state, input)? {
                ParseMatch::Consumed(count) => {
                    result = Ok(ParseMatch::Consumed(count));
                    break;
                }
                ParseMatch::NoMatch => continue,
            }
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
        for symbol in self.get_symbols() {
            complete_child(symbol, comp, input)?;
        }
        Ok(())
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        self.get_symbols().to_vec()
    }
}
