use crate::production::{GrammarLogger, Literal};
use crate::{
    CompKind, Completion, ConfigKind, ConfigSchema, ConfigValue, ErrorKind, GrammarError,
    IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

impl Literal {
    /// Create a [Literal] utility matching one token equal to `word`.
    pub fn new(word: &str) -> Self {
        Self {
            base: NodeBase::new(),
            word: word.to_string(),
            debugger: OnceCell::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn assign_debugger(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "str",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "string",
                "The string to match.",
                ConfigKind::Str,
            )
            .mandatory()])),
            build: |id, config| {
                let word = config
                    .dict_get("string")
                    .and_then(ConfigValue::as_str)
                    .ok_or_else(|| {
                        GrammarError::new(ErrorKind::BadFormat, "str", "a string value is required")
                    })?;
                let mut node = Literal::new(word);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Literal {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.word)
    }
}

impl IGrammar for Literal {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "str"
    }

    fn parse(&self, _state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = if input.get(0) == Some(self.word.as_str()) {
            Ok(ParseMatch::Consumed(1))
        } else {
            Ok(ParseMatch::NoMatch)
        };

        #[cfg(debug_assertions)]
        self.log_result(input, &result);

        result
    }

    fn complete(
        &self,
        this: &Rc<dyn IGrammar>,
        comp: &mut Completion,
        input: &StrVec,
    ) -> Result<(), GrammarError> {
        if input.len() != 1 {
            return Ok(());
        }
        let token = input.get(0).expect("one token is present");
        if self.word.starts_with(token) {
            comp.add_item(this, CompKind::Full, Some(token), Some(&self.word))?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.word.clone()
    }
}
