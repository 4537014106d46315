use crate::production::SpaceTok;
use crate::{
    ConfigSchema, IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult, StrVec,
};
use std::fmt::Display;
use std::rc::Rc;

impl SpaceTok {
    /// Create a [SpaceTok] utility matching one non-empty whitespace token.
    pub fn new() -> Self {
        Self {
            base: NodeBase::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "space",
            schema: Some(ConfigSchema::new(Vec::new())),
            build: |id, _config| {
                let mut node = SpaceTok::new();
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl Default for SpaceTok {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SpaceTok {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "space")
    }
}

impl IGrammar for SpaceTok {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "space"
    }

    fn parse(&self, _state: &ParseNode, input: &StrVec) -> ParseResult {
        match input.get(0) {
            Some(token) if !token.is_empty() && token.chars().all(char::is_whitespace) => {
                Ok(ParseMatch::Consumed(1))
            }
            _ => Ok(ParseMatch::NoMatch),
        }
    }
}
