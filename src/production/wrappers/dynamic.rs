use crate::production::{DynBuildFn, Dynamic};
use crate::{
    complete_child, parse_child, AttrValue, Completion, ErrorKind, GrammarError, IGrammar,
    NodeBase, NodeTypeInfo, ParseNode, ParseResult, StrVec,
};
use std::fmt::Display;
use std::rc::Rc;

fn anchor_key(node: &Rc<dyn IGrammar>) -> String {
    format!("_dyn_{:p}", Rc::as_ptr(node))
}

impl Dynamic {
    /// Create a [Dynamic] utility; `build` is invoked with the current parse state each time the
    /// node parses or completes, and the returned fragment lives as long as the resulting tree.
    pub fn new(build: DynBuildFn) -> Self {
        Self {
            base: NodeBase::new(),
            build,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            // built around a caller supplied closure, no configuration surface
            name: "dynamic",
            schema: None,
            build: |_id, _config| {
                Err(GrammarError::new(
                    ErrorKind::NotPermitted,
                    "dynamic",
                    "a dynamic node cannot be built from a configuration",
                ))
            },
        }
    }
}

impl Display for Dynamic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dynamic")
    }
}

impl IGrammar for Dynamic {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "dynamic"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        let symbol = (self.build)(state)?;
        // anchor the fragment to the parse tree so it lives as long as the result
        state.set_attr(&anchor_key(&symbol), AttrValue::Node(symbol.clone()));
        parse_child(&symbol, state, input)
    }

    fn complete(
        &self,
        _this: &Rc<dyn IGrammar>,
        comp: &mut Completion,
        input: &StrVec,
    ) -> Result<(), GrammarError> {
        let pstate = match comp.cur_pstate() {
            Some(pstate) => pstate.clone(),
            None => return Ok(()),
        };
        let symbol = (self.build)(&pstate)?;
        comp.set_attr(&anchor_key(&symbol), AttrValue::Node(symbol.clone()));
        complete_child(&symbol, comp, input)
    }
}
