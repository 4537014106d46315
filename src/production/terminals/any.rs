use crate::production::{AnyTok, GrammarLogger};
use crate::{
    ConfigKind, ConfigSchema, ConfigValue, IGrammar, NodeBase, NodeTypeInfo, ParseMatch,
    ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

impl AnyTok {
    /// Create an [AnyTok] utility matching any single token.
    pub fn new() -> Self {
        Self {
            base: NodeBase::new(),
            required_attr: None,
            debugger: OnceCell::new(),
        }
    }

    /// Create an [AnyTok] utility matching any single token carrying the named attribute, as
    /// recorded by [ReLexer](crate::production::ReLexer) rules.
    pub fn with_attr(attr: &str) -> Self {
        Self {
            base: NodeBase::new(),
            required_attr: Some(attr.to_string()),
            debugger: OnceCell::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub fn assign_debugger(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "any",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "attr",
                "The attribute the matched token must carry, if any.",
                ConfigKind::Str,
            )])),
            build: |id, config| {
                let mut node = match config.dict_get("attr").and_then(ConfigValue::as_str) {
                    Some(attr) => AnyTok::with_attr(attr),
                    None => AnyTok::new(),
                };
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl Default for AnyTok {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarLogger for AnyTok {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for AnyTok {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.required_attr {
            Some(attr) => write!(f, "any<{}>", attr),
            None => write!(f, "any"),
        }
    }
}

impl IGrammar for AnyTok {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "any"
    }

    fn parse(&self, _state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = if input.is_empty() {
            Ok(ParseMatch::NoMatch)
        } else {
            match &self.required_attr {
                Some(attr) => {
                    if input.attrs(0).map_or(false, |attrs| attrs.contains_key(attr)) {
                        Ok(ParseMatch::Consumed(1))
                    } else {
                        Ok(ParseMatch::NoMatch)
                    }
                }
                None => Ok(ParseMatch::Consumed(1)),
            }
        };

        #[cfg(debug_assertions)]
        self.log_result(input, &result);

        result
    }
}
