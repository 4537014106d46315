use crate::production::{Expr, ExprEvalOps, IntLiteral, LexRule, Literal, ReLexer};
use crate::{parse, ErrorKind, GrammarError, IGrammar, ParseNode};
use std::rc::Rc;

// arithmetic callbacks: `^` squares, `!` is logical not, `*` and `+` compute
struct ArithOps;

fn operator_token(operator: &ParseNode) -> Result<String, GrammarError> {
    operator
        .strvec()
        .and_then(|vec| vec.get(0).map(str::to_string))
        .ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "test", "an operator is expected")
        })
}

impl ExprEvalOps for ArithOps {
    type Value = i64;

    fn eval_var(&self, var: &ParseNode) -> Result<i64, GrammarError> {
        let token = operator_token(var)?;
        token.parse::<i64>().map_err(|_| {
            GrammarError::new(ErrorKind::BadFormat, "test", "an integer is expected")
        })
    }

    fn eval_pre_op(&self, operand: i64, operator: &ParseNode) -> Result<i64, GrammarError> {
        match operator_token(operator)?.as_str() {
            "!" => Ok((operand == 0) as i64),
            other => Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "test",
                format!("{:?} is not a prefix operator", other),
            )),
        }
    }

    fn eval_post_op(&self, operand: i64, operator: &ParseNode) -> Result<i64, GrammarError> {
        match operator_token(operator)?.as_str() {
            "^" => Ok(operand * operand),
            other => Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "test",
                format!("{:?} is not a postfix operator", other),
            )),
        }
    }

    fn eval_bin_op(
        &self,
        left: i64,
        operator: &ParseNode,
        right: i64,
    ) -> Result<i64, GrammarError> {
        match operator_token(operator)?.as_str() {
            "*" => Ok(left * right),
            "+" => Ok(left + right),
            other => Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "test",
                format!("{:?} is not a binary operator", other),
            )),
        }
    }

    fn eval_parenthesis(
        &self,
        _open: &ParseNode,
        _close: &ParseNode,
        value: i64,
    ) -> Result<i64, GrammarError> {
        Ok(value)
    }
}

// the arithmetic grammar of the evaluation scenario: int values, `*` and `+` binary operators
// (tightest first), `!` prefix, `^` postfix, one parenthesis pair, fronted by a lexer
fn arith() -> (Rc<Expr>, Rc<dyn IGrammar>) {
    let value: Rc<dyn IGrammar> = Rc::new(IntLiteral::new(Some(0), Some(255), 10));
    let mul: Rc<dyn IGrammar> = Rc::new(Literal::new("*"));
    let add: Rc<dyn IGrammar> = Rc::new(Literal::new("+"));
    let not: Rc<dyn IGrammar> = Rc::new(Literal::new("!"));
    let square: Rc<dyn IGrammar> = Rc::new(Literal::new("^"));
    let open: Rc<dyn IGrammar> = Rc::new(Literal::new("("));
    let close: Rc<dyn IGrammar> = Rc::new(Literal::new(")"));

    let expr = Rc::new(
        Expr::new(
            value,
            vec![mul, add],
            vec![not],
            vec![square],
            vec![(open, close)],
        )
        .unwrap(),
    );

    let rules = vec![
        LexRule::new("[0-9]+", true, None).unwrap(),
        LexRule::new("[+*!^()]", true, None).unwrap(),
        LexRule::new("[ \t]+", false, None).unwrap(),
    ];
    let lexer: Rc<dyn IGrammar> = Rc::new(ReLexer::new(expr.clone() as Rc<dyn IGrammar>, rules));
    (expr, lexer)
}

fn eval(line: &str) -> Option<i64> {
    let (expr, lexer) = arith();
    let tree = parse(&lexer, line).unwrap();
    if !tree.matches() {
        return None;
    }
    let expr_state = tree.first_child().unwrap();
    Some(expr.eval(&expr_state, &ArithOps).unwrap())
}

#[test]
fn evaluates_with_the_usual_precedence() {
    assert_eq!(eval("1"), Some(1));
    assert_eq!(eval("1 + 2"), Some(3));
    assert_eq!(eval("2 * 3 + 4"), Some(10));
    assert_eq!(eval("2 + 3 * 4"), Some(14));
}

#[test]
fn evaluates_unary_operators_and_parenthesis() {
    assert_eq!(eval("3^"), Some(9));
    assert_eq!(eval("!3"), Some(0));
    assert_eq!(eval("!0"), Some(1));
    assert_eq!(eval("(1 + 2) * 3"), Some(9));
    assert_eq!(eval("1 + 4 * (2 + 3^)^"), Some(485));
}

#[test]
fn rejects_malformed_expressions() {
    assert_eq!(eval("("), None);
    assert_eq!(eval("1+*1"), None);
    assert_eq!(eval("1 +"), None);
    assert_eq!(eval(")"), None);
}

#[test]
fn requires_at_least_one_operator() {
    let value: Rc<dyn IGrammar> = Rc::new(IntLiteral::new(None, None, 10));
    let err = Expr::new(value, Vec::new(), Vec::new(), Vec::new(), Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn eval_refuses_an_unmatched_tree() {
    let (expr, lexer) = arith();
    let tree = parse(&lexer, "(").unwrap();
    assert!(!tree.matches());
    assert!(expr.eval(&tree, &ArithOps).is_err());
}
