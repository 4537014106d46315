use crate::production::{
    Cmd, Concat, EmptyProd, Expr, ExprEvalOps, GrammarLogger, LexRule, Literal, Optional,
    ReLexer, Repeat, Subset, Union,
};
use crate::{
    complete_child, parse, parse_child, Completion, ConfigKind, ConfigSchema, ConfigValue,
    ErrorKind, GrammarError, IGrammar, NodeBase, NodeTypeInfo, ParseNode, ParseResult,
    SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

thread_local! {
    // the static template parser, built once per thread: an expression grammar over template
    // identifiers, fronted by a lexer splitting the template string
    static TEMPLATE_PARSER: (Rc<Expr>, Rc<dyn IGrammar>) = build_template_parser();
}

fn build_template_parser() -> (Rc<Expr>, Rc<dyn IGrammar>) {
    let value: Rc<dyn IGrammar> = Rc::new(
        crate::production::RegexField::new("[a-zA-Z0-9._-]+")
            .expect("the identifier pattern compiles"),
    );
    // binary operators, tightest first: implicit concatenation, alternative, subset
    let concat_op: Rc<dyn IGrammar> = Rc::new(EmptyProd::new());
    let alt_op: Rc<dyn IGrammar> = Rc::new(Literal::new("|"));
    let subset_op: Rc<dyn IGrammar> = Rc::new(Literal::new(","));
    let plus_op: Rc<dyn IGrammar> = Rc::new(Literal::new("+"));
    let star_op: Rc<dyn IGrammar> = Rc::new(Literal::new("*"));
    let open_paren: Rc<dyn IGrammar> = Rc::new(Literal::new("("));
    let close_paren: Rc<dyn IGrammar> = Rc::new(Literal::new(")"));
    let open_bracket: Rc<dyn IGrammar> = Rc::new(Literal::new("["));
    let close_bracket: Rc<dyn IGrammar> = Rc::new(Literal::new("]"));

    let expr = Rc::new(
        Expr::new(
            value,
            vec![concat_op, alt_op, subset_op],
            Vec::new(),
            vec![plus_op, star_op],
            vec![
                (open_paren, close_paren),
                (open_bracket, close_bracket),
            ],
        )
        .expect("the template grammar is well formed"),
    );

    let rules = vec![
        LexRule::new("[a-zA-Z0-9._-]+", true, None).expect("the identifier rule compiles"),
        LexRule::new("[*+|,()]", true, None).expect("the operator rule compiles"),
        LexRule::new("\\[", true, None).expect("the bracket rule compiles"),
        LexRule::new("\\]", true, None).expect("the bracket rule compiles"),
        LexRule::new("[ \t]+", false, None).expect("the blank rule compiles"),
    ];
    let expr_dyn: Rc<dyn IGrammar> = expr.clone();
    let lexer: Rc<dyn IGrammar> = Rc::new(ReLexer::new(expr_dyn, rules));
    (expr, lexer)
}

// the partially assembled grammar of a template subtree; keeping the combinator kind explicit
// lets consecutive operators of one kind flatten into a single node
enum TemplateVal {
    Node(Rc<dyn IGrammar>),
    Seq(Vec<Rc<dyn IGrammar>>),
    Alt(Vec<Rc<dyn IGrammar>>),
    Sub(Vec<Rc<dyn IGrammar>>),
}

impl TemplateVal {
    fn into_node(self) -> Rc<dyn IGrammar> {
        match self {
            TemplateVal::Node(node) => node,
            TemplateVal::Seq(symbols) => Rc::new(Concat::new(symbols)),
            TemplateVal::Alt(symbols) => Rc::new(Union::new(symbols)),
            TemplateVal::Sub(symbols) => Rc::new(Subset::new(symbols)),
        }
    }
}

struct TemplateOps<'t> {
    table: &'t [Rc<dyn IGrammar>],
}

fn operator_token(operator: &ParseNode) -> Option<String> {
    let vec = operator.strvec()?;
    if vec.len() == 1 {
        vec.get(0).map(str::to_string)
    } else {
        None
    }
}

impl ExprEvalOps for TemplateOps<'_> {
    type Value = TemplateVal;

    fn eval_var(&self, var: &ParseNode) -> Result<TemplateVal, GrammarError> {
        let vec = var.strvec().ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "cmd", "an identifier is expected")
        })?;
        let word = vec.get(0).ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "cmd", "an identifier is expected")
        })?;
        for child in self.table {
            if child.base().id() == Some(word) {
                return Ok(TemplateVal::Node(child.clone()));
            }
        }
        Ok(TemplateVal::Node(Rc::new(Literal::new(word))))
    }

    fn eval_pre_op(
        &self,
        _operand: TemplateVal,
        _operator: &ParseNode,
    ) -> Result<TemplateVal, GrammarError> {
        Err(GrammarError::new(
            ErrorKind::InvalidArgument,
            "cmd",
            "the template language has no prefix operator",
        ))
    }

    fn eval_post_op(
        &self,
        operand: TemplateVal,
        operator: &ParseNode,
    ) -> Result<TemplateVal, GrammarError> {
        match operator_token(operator).as_deref() {
            Some("*") => Ok(TemplateVal::Node(Rc::new(Repeat::new(
                operand.into_node(),
                0,
                0,
            )))),
            Some("+") => Ok(TemplateVal::Node(Rc::new(Repeat::new(
                operand.into_node(),
                1,
                0,
            )))),
            other => Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "cmd",
                format!("{:?} is not a postfix operator", other),
            )),
        }
    }

    fn eval_bin_op(
        &self,
        left: TemplateVal,
        operator: &ParseNode,
        right: TemplateVal,
    ) -> Result<TemplateVal, GrammarError> {
        let token = operator
            .strvec()
            .filter(|vec| vec.len() == 1)
            .and_then(|vec| vec.get(0).map(str::to_string));
        match token.as_deref() {
            // the empty operator token is the implicit concatenation
            None => Ok(match left {
                TemplateVal::Seq(mut symbols) => {
                    symbols.push(right.into_node());
                    TemplateVal::Seq(symbols)
                }
                left => TemplateVal::Seq(vec![left.into_node(), right.into_node()]),
            }),
            Some("|") => Ok(match (left, right) {
                (TemplateVal::Alt(mut symbols), right) => {
                    symbols.push(right.into_node());
                    TemplateVal::Alt(symbols)
                }
                (left, TemplateVal::Alt(mut symbols)) => {
                    symbols.insert(0, left.into_node());
                    TemplateVal::Alt(symbols)
                }
                (left, right) => TemplateVal::Alt(vec![left.into_node(), right.into_node()]),
            }),
            Some(",") => Ok(match (left, right) {
                (TemplateVal::Sub(mut symbols), right) => {
                    symbols.push(right.into_node());
                    TemplateVal::Sub(symbols)
                }
                (left, TemplateVal::Sub(mut symbols)) => {
                    symbols.insert(0, left.into_node());
                    TemplateVal::Sub(symbols)
                }
                (left, right) => TemplateVal::Sub(vec![left.into_node(), right.into_node()]),
            }),
            Some(other) => Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "cmd",
                format!("{:?} is not a binary operator", other),
            )),
        }
    }

    fn eval_parenthesis(
        &self,
        open: &ParseNode,
        _close: &ParseNode,
        value: TemplateVal,
    ) -> Result<TemplateVal, GrammarError> {
        match operator_token(open).as_deref() {
            Some("[") => Ok(TemplateVal::Node(Rc::new(Optional::new(value.into_node())))),
            Some("(") => Ok(value),
            other => Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "cmd",
                format!("{:?} is not a parenthesis", other),
            )),
        }
    }
}

impl Cmd {
    /// Create a [Cmd] utility from a template and the named children referenced by its
    /// identifiers (matched against the children ids; unmatched identifiers become literal
    /// words).
    pub fn new(template: &str, children: Vec<Rc<dyn IGrammar>>) -> Result<Self, GrammarError> {
        let cmd = TEMPLATE_PARSER.with(|(expr, parser)| {
            let tree = parse(parser, template)?;
            if !tree.matches() {
                return Err(GrammarError::new(
                    ErrorKind::BadFormat,
                    "cmd",
                    format!("{:?} is not a valid command template", template),
                ));
            }
            let expr_state = tree.first_child().ok_or_else(|| {
                GrammarError::new(ErrorKind::BadFormat, "cmd", "the template parse is empty")
            })?;
            let ops = TemplateOps { table: &children };
            Ok(expr.eval(&expr_state, &ops)?.into_node())
        })?;
        Ok(Self {
            base: NodeBase::new(),
            template: template.to_string(),
            cmd,
            debugger: OnceCell::new(),
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn set_log(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "cmd",
            schema: Some(ConfigSchema::new(vec![
                SchemaEntry::new("expr", "The command template.", ConfigKind::Str).mandatory(),
                SchemaEntry::new(
                    "children",
                    "The named children referenced by the template.",
                    ConfigKind::List,
                )
                .with_subschema(vec![SchemaEntry::element(
                    "A named child.",
                    ConfigKind::Node,
                )]),
            ])),
            build: |id, config| {
                let template = config
                    .dict_get("expr")
                    .and_then(ConfigValue::as_str)
                    .ok_or_else(|| {
                        GrammarError::new(ErrorKind::BadFormat, "cmd", "a template is required")
                    })?;
                let children = match config.dict_get("children").and_then(ConfigValue::as_list) {
                    Some(list) => list
                        .iter()
                        .map(|value| {
                            value.as_node().cloned().ok_or_else(|| {
                                GrammarError::new(
                                    ErrorKind::BadFormat,
                                    "cmd",
                                    "children must be nodes",
                                )
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    None => Vec::new(),
                };
                let mut node = Cmd::new(template, children)?;
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Cmd {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Cmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cmd({:?})", self.template)
    }
}

impl IGrammar for Cmd {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "cmd"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = parse_child(&self.cmd, state, input);

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
        complete_child(&self.cmd, comp, input)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        vec![self.cmd.clone()]
    }
}
