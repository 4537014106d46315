use crate::production::{Bypass, Concat, Expr, GrammarLogger, Repeat, Union};
use crate::{
    complete_child, parse_child, Completion, ConfigKind, ConfigSchema, ConfigValue, ErrorKind,
    GrammarError, IGrammar, NodeBase, NodeTypeInfo, ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

/// The evaluation callbacks of [Expr::eval]: one per syntactic role of the configured operator
/// nodes. Partial results merge left to right over the parse tree.
pub trait ExprEvalOps {
    type Value;

    /// Evaluate a match of the value node.
    fn eval_var(&self, var: &ParseNode) -> Result<Self::Value, GrammarError>;

    /// Apply a prefix operator.
    fn eval_pre_op(
        &self,
        operand: Self::Value,
        operator: &ParseNode,
    ) -> Result<Self::Value, GrammarError>;

    /// Apply a postfix operator.
    fn eval_post_op(
        &self,
        operand: Self::Value,
        operator: &ParseNode,
    ) -> Result<Self::Value, GrammarError>;

    /// Apply a binary operator.
    fn eval_bin_op(
        &self,
        left: Self::Value,
        operator: &ParseNode,
        right: Self::Value,
    ) -> Result<Self::Value, GrammarError>;

    /// Apply a parenthesis pair around an evaluated sub-expression.
    fn eval_parenthesis(
        &self,
        open: &ParseNode,
        close: &ParseNode,
        value: Self::Value,
    ) -> Result<Self::Value, GrammarError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpClass {
    Value,
    BinOp,
    PreOp,
    PostOp,
    ParenOpen,
    ParenClose,
    Other,
}

// the partial result of a subtree: a value, a pending operator, or both for a
// binary-operator-plus-operand chain waiting to merge leftwards
struct EvalSlot<V> {
    val: Option<V>,
    op: Option<(ParseNode, OpClass)>,
}

fn merge_slots<O: ExprEvalOps>(
    ops: &O,
    x: &mut EvalSlot<O::Value>,
    y: EvalSlot<O::Value>,
) -> Result<(), GrammarError> {
    if y.val.is_none() && y.op.is_none() {
        return Ok(());
    }
    if x.val.is_none() && x.op.is_none() {
        *x = y;
        return Ok(());
    }

    if x.val.is_some() && y.val.is_some() {
        if let Some((operator, OpClass::BinOp)) = &y.op {
            let left = x.val.take().expect("x holds a value");
            let right = y.val.expect("y holds a value");
            x.val = Some(ops.eval_bin_op(left, operator, right)?);
            return Ok(());
        }
    } else if x.val.is_none() && x.op.is_some() && y.val.is_some() && y.op.is_none() {
        let (operator, class) = x.op.clone().expect("x holds an operator");
        match class {
            OpClass::PreOp => {
                let operand = y.val.expect("y holds a value");
                x.val = Some(ops.eval_pre_op(operand, &operator)?);
                x.op = None;
                return Ok(());
            }
            OpClass::BinOp => {
                x.val = y.val;
                return Ok(());
            }
            _ => {}
        }
    } else if x.val.is_some() && x.op.is_none() && y.val.is_none() && y.op.is_some() {
        let (operator, _) = y.op.expect("y holds an operator");
        let operand = x.val.take().expect("x holds a value");
        x.val = Some(ops.eval_post_op(operand, &operator)?);
        return Ok(());
    }

    // the generated grammar cannot produce any other shape
    unreachable!("unexpected expression parse shape")
}

/// Assemble the precedence grammar:
///
/// ```text
/// post   ::= value | pre_op expr | open_i expr close_i
/// term   ::= post post_op*
/// next_k ::= next_{k-1} (bin_op_k next_{k-1})*
/// expr   ::= next_last
/// ```
///
/// The recursion on `expr` is closed through a [Bypass] node named `ref`.
fn build_grammar(
    val_node: &Rc<dyn IGrammar>,
    bin_ops: &[Rc<dyn IGrammar>],
    pre_ops: &[Rc<dyn IGrammar>],
    post_ops: &[Rc<dyn IGrammar>],
    parens: &[(Rc<dyn IGrammar>, Rc<dyn IGrammar>)],
) -> Rc<dyn IGrammar> {
    let reference = Rc::new(Bypass::init().with_id("ref"));
    let reference_dyn: Rc<dyn IGrammar> = reference.clone();

    let mut post_alts: Vec<Rc<dyn IGrammar>> = vec![val_node.clone()];
    if !pre_ops.is_empty() {
        let pre_op: Rc<dyn IGrammar> = Rc::new(Union::new(pre_ops.to_vec()).with_id("pre-op"));
        post_alts.push(Rc::new(Concat::new(vec![pre_op, reference_dyn.clone()])));
    }
    for (open, close) in parens {
        post_alts.push(Rc::new(Concat::new(vec![
            open.clone(),
            reference_dyn.clone(),
            close.clone(),
        ])));
    }
    let post: Rc<dyn IGrammar> = Rc::new(Union::new(post_alts).with_id("post"));
    let post_op: Rc<dyn IGrammar> = Rc::new(Union::new(post_ops.to_vec()).with_id("post-op"));
    let mut term: Rc<dyn IGrammar> = Rc::new(
        Concat::new(vec![post, Rc::new(Repeat::new(post_op, 0, 0))]).with_id("term"),
    );

    for op in bin_ops {
        let tail: Rc<dyn IGrammar> = Rc::new(Repeat::new(
            Rc::new(Concat::new(vec![op.clone(), term.clone()])),
            0,
            0,
        ));
        term = Rc::new(Concat::new(vec![term, tail]).with_id("next"));
    }

    reference
        .bind(&term)
        .expect("a freshly created bypass is unbound");
    term
}

fn collect_nodes(
    config: &ConfigValue,
    key: &str,
) -> Result<Vec<Rc<dyn IGrammar>>, GrammarError> {
    match config.dict_get(key).and_then(ConfigValue::as_list) {
        Some(list) => list
            .iter()
            .map(|value| {
                value.as_node().cloned().ok_or_else(|| {
                    GrammarError::new(
                        ErrorKind::BadFormat,
                        "expr",
                        format!("{} entries must be nodes", key),
                    )
                })
            })
            .collect(),
        None => Ok(Vec::new()),
    }
}

impl Expr {
    /// Create an [Expr] utility from a value node, binary operator levels (tightest first),
    /// prefix and postfix operators and parenthesis pairs.
    /// At least one operator is required.
    pub fn new(
        val_node: Rc<dyn IGrammar>,
        bin_ops: Vec<Rc<dyn IGrammar>>,
        pre_ops: Vec<Rc<dyn IGrammar>>,
        post_ops: Vec<Rc<dyn IGrammar>>,
        parens: Vec<(Rc<dyn IGrammar>, Rc<dyn IGrammar>)>,
    ) -> Result<Self, GrammarError> {
        if bin_ops.is_empty() && pre_ops.is_empty() && post_ops.is_empty() {
            return Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "expr",
                "at least one operator is required",
            ));
        }
        let child = build_grammar(&val_node, &bin_ops, &pre_ops, &post_ops, &parens);
        Ok(Self {
            base: NodeBase::new(),
            child,
            val_node,
            bin_ops,
            pre_ops,
            post_ops,
            parens,
            debugger: OnceCell::new(),
        })
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

    fn classify(&self, grammar: &Rc<dyn IGrammar>) -> OpClass {
        if Rc::ptr_eq(grammar, &self.val_node) {
            return OpClass::Value;
        }
        if self.bin_ops.iter().any(|op| Rc::ptr_eq(grammar, op)) {
            return OpClass::BinOp;
        }
        if self.pre_ops.iter().any(|op| Rc::ptr_eq(grammar, op)) {
            return OpClass::PreOp;
        }
        if self.post_ops.iter().any(|op| Rc::ptr_eq(grammar, op)) {
            return OpClass::PostOp;
        }
        if self.parens.iter().any(|(open, _)| Rc::ptr_eq(grammar, open)) {
            return OpClass::ParenOpen;
        }
        if self.parens.iter().any(|(_, close)| Rc::ptr_eq(grammar, close)) {
            return OpClass::ParenClose;
        }
        OpClass::Other
    }

    fn eval_rec<O: ExprEvalOps>(
        &self,
        parse: &ParseNode,
        ops: &O,
    ) -> Result<EvalSlot<O::Value>, GrammarError> {
        let mut slot = EvalSlot {
            val: None,
            op: None,
        };
        match self.classify(&parse.grammar()) {
            OpClass::Value => {
                slot.val = Some(ops.eval_var(parse)?);
            }
            class @ (OpClass::BinOp | OpClass::PreOp | OpClass::PostOp) => {
                slot.op = Some((parse.clone(), class));
            }
            _ => {}
        }

        let mut open = None;
        let mut close = None;
        for child in parse.children() {
            match self.classify(&child.grammar()) {
                OpClass::ParenOpen => {
                    open = Some(child);
                    continue;
                }
                OpClass::ParenClose => {
                    close = Some(child);
                    continue;
                }
                _ => {}
            }
            let child_slot = self.eval_rec(&child, ops)?;
            merge_slots(ops, &mut slot, child_slot)?;
        }

        if let (Some(open), Some(close)) = (open, close) {
            let value = slot.val.take().ok_or_else(|| {
                GrammarError::new(ErrorKind::InvalidArgument, "expr", "empty parenthesis")
            })?;
            slot.val = Some(ops.eval_parenthesis(&open, &close, value)?);
        }

        Ok(slot)
    }

    /// Evaluate a matching parse tree of this expression bottom-up with the given callbacks.
    pub fn eval<O: ExprEvalOps>(
        &self,
        parse: &ParseNode,
        ops: &O,
    ) -> Result<O::Value, GrammarError> {
        if !parse.matches() {
            return Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "expr",
                "the parse tree does not match",
            ));
        }
        let slot = self.eval_rec(parse, ops)?;
        match slot {
            EvalSlot {
                val: Some(value),
                op: None,
            } => Ok(value),
            _ => Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "expr",
                "the parse tree is not a complete expression",
            )),
        }
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        let node_list = |desc: &str| {
            vec![SchemaEntry::element(desc, ConfigKind::Node)]
        };
        NodeTypeInfo {
            name: "expr",
            schema: Some(ConfigSchema::new(vec![
                SchemaEntry::new("val", "The value node.", ConfigKind::Node).mandatory(),
                SchemaEntry::new("bin_ops", "The binary operators, tightest first.", ConfigKind::List)
                    .with_subschema(node_list("A binary operator.")),
                SchemaEntry::new("pre_ops", "The prefix operators.", ConfigKind::List)
                    .with_subschema(node_list("A prefix operator.")),
                SchemaEntry::new("post_ops", "The postfix operators.", ConfigKind::List)
                    .with_subschema(node_list("A postfix operator.")),
                SchemaEntry::new("open_parens", "The opening parenthesis symbols.", ConfigKind::List)
                    .with_subschema(node_list("An opening symbol.")),
                SchemaEntry::new("close_parens", "The closing parenthesis symbols.", ConfigKind::List)
                    .with_subschema(node_list("A closing symbol.")),
            ])),
            build: |id, config| {
                let val_node = config
                    .dict_get("val")
                    .and_then(ConfigValue::as_node)
                    .cloned()
                    .ok_or_else(|| {
                        GrammarError::new(ErrorKind::BadFormat, "expr", "a value node is required")
                    })?;
                let bin_ops = collect_nodes(config, "bin_ops")?;
                let pre_ops = collect_nodes(config, "pre_ops")?;
                let post_ops = collect_nodes(config, "post_ops")?;
                let open_parens = collect_nodes(config, "open_parens")?;
                let close_parens = collect_nodes(config, "close_parens")?;
                if open_parens.len() != close_parens.len() {
                    return Err(GrammarError::new(
                        ErrorKind::InvalidArgument,
                        "expr",
                        "open and close parenthesis lists must pair up",
                    ));
                }
                let parens = open_parens.into_iter().zip(close_parens).collect();
                let mut node = Expr::new(val_node, bin_ops, pre_ops, post_ops, parens)?;
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Expr {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base.id().unwrap_or("expr"))
    }
}

impl IGrammar for Expr {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "expr"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = parse_child(&self.child, state, input);

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
        complete_child(&self.child, comp, input)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        vec![self.child.clone()]
    }
}
