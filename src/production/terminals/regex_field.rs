use crate::production::{GrammarLogger, RegexField};
use crate::{
    ConfigKind, ConfigSchema, ConfigValue, ErrorKind, GrammarError, IGrammar, NodeBase,
    NodeTypeInfo, ParseMatch, ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::fmt::Display;
use std::rc::Rc;

impl RegexField {
    /// Create a [RegexField] utility matching one token entirely against `pattern`.
    pub fn new(pattern: &str) -> Result<Self, GrammarError> {
        let regexp = Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| {
            GrammarError::new(
                ErrorKind::InvalidArgument,
                "re",
                format!("cannot compile {:?}: {}", pattern, err),
            )
        })?;
        Ok(Self {
            base: NodeBase::new(),
            pattern: pattern.to_string(),
            regexp,
            debugger: OnceCell::new(),
        })
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
            name: "re",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "pattern",
                "The regular expression the token must match entirely.",
                ConfigKind::Str,
            )
            .mandatory()])),
            build: |id, config| {
                let pattern = config
                    .dict_get("pattern")
                    .and_then(ConfigValue::as_str)
                    .ok_or_else(|| {
                        GrammarError::new(ErrorKind::BadFormat, "re", "a pattern value is required")
                    })?;
                let mut node = RegexField::new(pattern)?;
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for RegexField {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for RegexField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/", self.pattern.replace('/', "\\/"))
    }
}

impl IGrammar for RegexField {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "re"
    }

    fn parse(&self, _state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = match input.get(0) {
            Some(token) if self.regexp.is_match(token) => Ok(ParseMatch::Consumed(1)),
            _ => Ok(ParseMatch::NoMatch),
        };

        #[cfg(debug_assertions)]
        self.log_result(input, &result);

        result
    }
}
