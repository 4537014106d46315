use crate::production::Bypass;
use crate::{
    complete_child, parse_child, Completion, ErrorKind, GrammarError, IGrammar, NodeBase,
    NodeTypeInfo, ParseNode, ParseResult, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

impl Bypass {
    /// Create an unbound [Bypass] utility; reference it inside the recursive grammar, then bind
    /// it once the grammar is assembled.
    pub fn init() -> Self {
        Self {
            base: NodeBase::new(),
            target: OnceCell::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    /// Bind the utility to the node the recursion loops back to; only a weak reference is kept.
    pub fn bind(&self, target: &Rc<dyn IGrammar>) -> Result<(), GrammarError> {
        self.target.set(Rc::downgrade(target)).map_err(|_| {
            GrammarError::new(
                ErrorKind::AlreadyExists,
                "bypass",
                "the bypass is already bound",
            )
        })
    }

    fn target(&self) -> Result<Rc<dyn IGrammar>, GrammarError> {
        self.target
            .get()
            .and_then(|weak| weak.upgrade())
            .ok_or_else(|| {
                GrammarError::new(
                    ErrorKind::NotFound,
                    "bypass",
                    "the bypass target is not bound or no longer lives",
                )
            })
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            // the bypass only makes sense assembled in code, it has no configuration surface
            name: "bypass",
            schema: None,
            build: |_id, _config| {
                Err(GrammarError::new(
                    ErrorKind::NotPermitted,
                    "bypass",
                    "a bypass node cannot be built from a configuration",
                ))
            },
        }
    }
}

impl Default for Bypass {
    fn default() -> Self {
        Self::init()
    }
}

impl Display for Bypass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base.id().unwrap_or("bypass"))
    }
}

impl IGrammar for Bypass {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "bypass"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        parse_child(&self.target()?, state, input)
    }

    fn complete(
        &self,
        _this: &Rc<dyn IGrammar>,
        comp: &mut Completion,
        input: &StrVec,
    ) -> Result<(), GrammarError> {
        complete_child(&self.target()?, comp, input)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        match self.target() {
            Ok(target) => vec![target],
            Err(_) => Vec::new(),
        }
    }
}
