use crate::production::EmptyProd;
use crate::{
    ConfigSchema, IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult, StrVec,
};
use std::fmt::Display;
use std::rc::Rc;

impl EmptyProd {
    /// Create an [EmptyProd] utility: a null production consuming zero tokens.
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
            name: "empty",
            schema: Some(ConfigSchema::new(Vec::new())),
            build: |id, _config| {
                let mut node = EmptyProd::new();
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl Default for EmptyProd {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for EmptyProd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "empty")
    }
}

impl IGrammar for EmptyProd {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "empty"
    }

    fn parse(&self, _state: &ParseNode, _input: &StrVec) -> ParseResult {
        Ok(ParseMatch::Consumed(0))
    }
}
