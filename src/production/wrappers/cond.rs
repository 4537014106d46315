use crate::production::{
    AnyTok, Bypass, Concat, Cond, GrammarLogger, LexRule, Literal, Optional, ReLexer, Repeat,
    Union,
};
use crate::{
    complete_child, parse, parse_child, Completion, ConfigKind, ConfigSchema, ConfigValue,
    ErrorKind, GrammarError, IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult,
    SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

use super::optional::config_child;

thread_local! {
    // the static predicate parser, built once per thread
    static PREDICATE_PARSER: Rc<dyn IGrammar> = build_predicate_parser();
}

/// The predicate grammar:
///
/// ```text
/// predicate ::= identifier "(" (predicate ("," predicate)*)? ")"
///             | identifier
///             | integer
/// ```
///
/// Token classes are told apart by the attributes the lexer rules record.
fn build_predicate_parser() -> Rc<dyn IGrammar> {
    let arg_ref = Rc::new(Bypass::init());
    let arg_ref_dyn: Rc<dyn IGrammar> = arg_ref.clone();

    let arg_tail: Rc<dyn IGrammar> = Rc::new(Repeat::new(
        Rc::new(Concat::new(vec![
            Rc::new(Literal::new(",")) as Rc<dyn IGrammar>,
            arg_ref_dyn.clone(),
        ])),
        0,
        0,
    ));
    let arg_list: Rc<dyn IGrammar> = Rc::new(
        Optional::new(Rc::new(Concat::new(vec![arg_ref_dyn, arg_tail])))
            .with_id("id_arg_list"),
    );
    let function: Rc<dyn IGrammar> = Rc::new(
        Concat::new(vec![
            Rc::new(AnyTok::with_attr("a_identifier").with_id("id_function_name"))
                as Rc<dyn IGrammar>,
            Rc::new(AnyTok::with_attr("a_open")),
            arg_list,
            Rc::new(AnyTok::with_attr("a_close")),
        ])
        .with_id("id_function"),
    );
    let predicate: Rc<dyn IGrammar> = Rc::new(
        Union::new(vec![
            function,
            Rc::new(AnyTok::with_attr("a_identifier").with_id("id_value_str")),
            Rc::new(AnyTok::with_attr("a_int").with_id("id_value_int")),
        ])
        .with_id("id_arg"),
    );
    arg_ref
        .bind(&predicate)
        .expect("a freshly created bypass is unbound");

    let rules = vec![
        LexRule::new("[_a-zA-Z][._a-zA-Z0-9]*", true, Some("a_identifier"))
            .expect("the identifier rule compiles"),
        LexRule::new("[0-9]+", true, Some("a_int")).expect("the integer rule compiles"),
        LexRule::new("\\(", true, Some("a_open")).expect("the parenthesis rule compiles"),
        LexRule::new("\\)", true, Some("a_close")).expect("the parenthesis rule compiles"),
        LexRule::new(",", true, None).expect("the comma rule compiles"),
        LexRule::new("[ \t]", false, None).expect("the blank rule compiles"),
    ];
    Rc::new(ReLexer::new(predicate, rules))
}

enum CondResult {
    NodeSet(Vec<ParseNode>),
    Bool(bool),
    Int(i64),
    Str(String),
}

fn truthy(result: &CondResult) -> bool {
    match result {
        CondResult::NodeSet(nodes) => !nodes.is_empty(),
        CondResult::Bool(value) => *value,
        CondResult::Int(value) => *value != 0,
        CondResult::Str(value) => !value.is_empty(),
    }
}

fn push_unique(nodes: &mut Vec<ParseNode>, node: ParseNode) {
    if !nodes.iter().any(|existing| existing.ptr_eq(&node)) {
        nodes.push(node);
    }
}

fn arity_error(name: &str, expected: &str) -> GrammarError {
    GrammarError::new(
        ErrorKind::InvalidArgument,
        "cond",
        format!("{}() takes {}", name, expected),
    )
}

type CondFn = fn(&ParseNode, Vec<CondResult>) -> Result<CondResult, GrammarError>;

fn eval_root(pstate: &ParseNode, args: Vec<CondResult>) -> Result<CondResult, GrammarError> {
    if !args.is_empty() {
        return Err(arity_error("root", "no argument"));
    }
    Ok(CondResult::NodeSet(vec![pstate.root()]))
}

fn eval_current(pstate: &ParseNode, args: Vec<CondResult>) -> Result<CondResult, GrammarError> {
    if !args.is_empty() {
        return Err(arity_error("current", "no argument"));
    }
    Ok(CondResult::NodeSet(vec![pstate.clone()]))
}

fn eval_first_child(
    _pstate: &ParseNode,
    mut args: Vec<CondResult>,
) -> Result<CondResult, GrammarError> {
    match (args.len(), args.pop()) {
        (1, Some(CondResult::NodeSet(nodes))) => {
            let mut out = Vec::new();
            for node in &nodes {
                if let Some(child) = node.first_child() {
                    push_unique(&mut out, child);
                }
            }
            Ok(CondResult::NodeSet(out))
        }
        _ => Err(arity_error("first_child", "one argument of type nodeset")),
    }
}

fn eval_find(_pstate: &ParseNode, mut args: Vec<CondResult>) -> Result<CondResult, GrammarError> {
    let id = match args.pop() {
        Some(CondResult::Str(id)) if args.len() == 1 => id,
        _ => return Err(arity_error("find", "two arguments (nodeset, str)")),
    };
    let nodes = match args.pop() {
        Some(CondResult::NodeSet(nodes)) => nodes,
        _ => return Err(arity_error("find", "two arguments (nodeset, str)")),
    };
    let mut out = Vec::new();
    for node in &nodes {
        let mut found = node.find(&id);
        while let Some(matched) = found {
            found = node.find_next(&matched, &id, true);
            push_unique(&mut out, matched);
        }
    }
    Ok(CondResult::NodeSet(out))
}

fn eval_count(_pstate: &ParseNode, mut args: Vec<CondResult>) -> Result<CondResult, GrammarError> {
    match (args.len(), args.pop()) {
        (1, Some(CondResult::NodeSet(nodes))) => Ok(CondResult::Int(nodes.len() as i64)),
        _ => Err(arity_error("count", "one argument of type nodeset")),
    }
}

fn eval_bool(_pstate: &ParseNode, mut args: Vec<CondResult>) -> Result<CondResult, GrammarError> {
    match (args.len(), args.pop()) {
        (1, Some(arg)) => Ok(CondResult::Bool(truthy(&arg))),
        _ => Err(arity_error("bool", "one argument")),
    }
}

fn eval_or(_pstate: &ParseNode, mut args: Vec<CondResult>) -> Result<CondResult, GrammarError> {
    if args.len() < 2 {
        return Err(arity_error("or", "at least two arguments"));
    }
    // the first true operand, or the last one
    let pos = args
        .iter()
        .position(truthy)
        .unwrap_or(args.len() - 1);
    Ok(args.swap_remove(pos))
}

fn eval_and(_pstate: &ParseNode, mut args: Vec<CondResult>) -> Result<CondResult, GrammarError> {
    if args.len() < 2 {
        return Err(arity_error("and", "at least two arguments"));
    }
    // the first false operand, or the last one
    let pos = args
        .iter()
        .position(|arg| !truthy(arg))
        .unwrap_or(args.len() - 1);
    Ok(args.swap_remove(pos))
}

fn eval_cmp(_pstate: &ParseNode, mut args: Vec<CondResult>) -> Result<CondResult, GrammarError> {
    if args.len() != 3 {
        return Err(arity_error("cmp", "three arguments (str, <type>, <type>)"));
    }
    let right = args.pop().expect("three arguments are present");
    let left = args.pop().expect("three arguments are present");
    let op = match args.pop() {
        Some(CondResult::Str(op)) => op,
        _ => return Err(arity_error("cmp", "three arguments (str, <type>, <type>)")),
    };
    if !["eq", "ne", "lt", "gt", "le", "ge"].contains(&op.as_str()) {
        return Err(GrammarError::new(
            ErrorKind::InvalidArgument,
            "cond",
            format!("{:?} is not a comparison operator", op),
        ));
    }

    let (eq, gt) = match (&left, &right) {
        (CondResult::Int(a), CondResult::Int(b)) => (a == b, a > b),
        (CondResult::Bool(a), CondResult::Bool(b)) => (a == b, false),
        (CondResult::Str(a), CondResult::Str(b)) => (a == b, false),
        (CondResult::NodeSet(a), CondResult::NodeSet(b)) => {
            let eq = a.len() == b.len()
                && a.iter().all(|node| b.iter().any(|other| other.ptr_eq(node)));
            (eq, false)
        }
        _ => {
            return Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "cond",
                "cmp() operands must share a type",
            ));
        }
    };
    if !matches!(left, CondResult::Int(_)) && op != "eq" && op != "ne" {
        return Err(GrammarError::new(
            ErrorKind::InvalidArgument,
            "cond",
            "ordering comparisons are only allowed on integers",
        ));
    }

    let value = match op.as_str() {
        "eq" => eq,
        "ne" => !eq,
        "lt" => !gt && !eq,
        "gt" => gt && !eq,
        "le" => !gt || eq,
        "ge" => gt || eq,
        _ => unreachable!("the operator set is closed"),
    };
    Ok(CondResult::Bool(value))
}

const COND_FUNCTIONS: &[(&str, CondFn)] = &[
    ("root", eval_root),
    ("current", eval_current),
    ("first_child", eval_first_child),
    ("find", eval_find),
    ("count", eval_count),
    ("bool", eval_bool),
    ("or", eval_or),
    ("and", eval_and),
    ("cmp", eval_cmp),
];

fn single_token(pnode: &ParseNode) -> Option<String> {
    let vec = pnode.strvec()?;
    if vec.len() == 1 {
        vec.get(0).map(str::to_string)
    } else {
        None
    }
}

fn eval_condition(cond: &ParseNode, pstate: &ParseNode) -> Result<CondResult, GrammarError> {
    if let Some(function) = cond.find("id_function") {
        let mut function_name = None;
        let mut arg_list = None;
        for child in function.children() {
            let grammar = child.grammar();
            match grammar.base().id() {
                Some("id_function_name") => function_name = Some(child.clone()),
                Some("id_arg_list") => arg_list = Some(child.clone()),
                _ => {}
            }
        }
        let name = function_name.as_ref().and_then(single_token).ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "cond", "a function name is expected")
        })?;

        let mut args = Vec::new();
        if let Some(arg_list) = arg_list {
            let mut arg = arg_list.find("id_arg");
            while let Some(current) = arg {
                args.push(eval_condition(&current, pstate)?);
                arg = arg_list.find_next(&current, "id_arg", false);
            }
        }

        let function = COND_FUNCTIONS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, function)| function)
            .ok_or_else(|| {
                GrammarError::new(
                    ErrorKind::NotFound,
                    "cond",
                    format!("no function named {:?}", name),
                )
            })?;
        return function(pstate, args);
    }

    if let Some(value) = cond.find("id_value_str") {
        let token = single_token(&value).ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "cond", "a value is expected")
        })?;
        return Ok(CondResult::Str(token));
    }

    if let Some(value) = cond.find("id_value_int") {
        let token = single_token(&value).ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "cond", "a value is expected")
        })?;
        let parsed = token.parse::<i64>().map_err(|_| {
            GrammarError::new(
                ErrorKind::BadFormat,
                "cond",
                format!("{:?} is not an integer", token),
            )
        })?;
        return Ok(CondResult::Int(parsed));
    }

    Err(GrammarError::new(
        ErrorKind::InvalidArgument,
        "cond",
        "the predicate tree is malformed",
    ))
}

impl Cond {
    /// Create a [Cond] utility admitting a match of `symbol` only when `cond_str` evaluates to
    /// true on the resulting parse state.
    pub fn new(cond_str: &str, symbol: Rc<dyn IGrammar>) -> Result<Self, GrammarError> {
        let parsed_cond = PREDICATE_PARSER.with(|parser| {
            let tree = parse(parser, cond_str)?;
            if !tree.matches() {
                return Err(GrammarError::new(
                    ErrorKind::InvalidArgument,
                    "cond",
                    format!("{:?} is not a valid predicate", cond_str),
                ));
            }
            Ok(tree)
        })?;
        Ok(Self {
            base: NodeBase::new(),
            cond_str: cond_str.to_string(),
            parsed_cond,
            symbol,
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

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "cond",
            schema: Some(ConfigSchema::new(vec![
                SchemaEntry::new("expr", "The boolean predicate.", ConfigKind::Str).mandatory(),
                SchemaEntry::new("child", "The guarded symbol.", ConfigKind::Node).mandatory(),
            ])),
            build: |id, config| {
                let cond_str = config
                    .dict_get("expr")
                    .and_then(ConfigValue::as_str)
                    .ok_or_else(|| {
                        GrammarError::new(ErrorKind::BadFormat, "cond", "a predicate is required")
                    })?;
                let mut node = Cond::new(cond_str, config_child(config, "cond")?)?;
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for Cond {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for Cond {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cond({:?})", self.cond_str)
    }
}

impl IGrammar for Cond {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "cond"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = match parse_child(&self.symbol, state, input)? {
            ParseMatch::NoMatch => Ok(ParseMatch::NoMatch),
            ParseMatch::Consumed(count) => {
                if truthy(&eval_condition(&self.parsed_cond, state)?) {
                    Ok(ParseMatch::Consumed(count))
                } else {
                    state.del_last_child();
                    Ok(ParseMatch::NoMatch)
                }
            }
        };

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
        complete_child(&self.symbol, comp, input)
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        vec![self.symbol.clone()]
    }
}
