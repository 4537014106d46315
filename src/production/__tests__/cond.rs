use crate::production::{Concat, Cond, Literal, Repeat, Union};
use crate::{parse_strvec, ErrorKind, IGrammar, StrVec};
use std::rc::Rc;

fn sv(tokens: &[&str]) -> StrVec {
    tokens.into()
}

fn consumed(grammar: &Rc<dyn IGrammar>, input: &[&str]) -> Option<usize> {
    let tree = parse_strvec(grammar, &sv(input)).unwrap();
    if tree.matches() {
        Some(tree.len())
    } else {
        None
    }
}

fn repeated_foo() -> Rc<dyn IGrammar> {
    Rc::new(Repeat::new(
        Rc::new(Literal::new("foo").with_id("id_node")) as Rc<dyn IGrammar>,
        0,
        0,
    ))
}

#[test]
fn count_bound_admits_up_to_three() {
    let grammar: Rc<dyn IGrammar> = Rc::new(
        Cond::new(
            "cmp(le, count(find(root(), id_node)), 3)",
            repeated_foo(),
        )
        .unwrap(),
    );
    assert_eq!(consumed(&grammar, &[]), Some(0));
    assert_eq!(consumed(&grammar, &["foo"]), Some(1));
    assert_eq!(consumed(&grammar, &["foo", "foo", "foo"]), Some(3));
    assert_eq!(consumed(&grammar, &["foo", "foo", "foo", "foo"]), None);
}

#[test]
fn rejected_matches_leave_no_children() {
    let grammar: Rc<dyn IGrammar> = Rc::new(
        Cond::new(
            "cmp(lt, count(find(root(), id_node)), 1)",
            repeated_foo(),
        )
        .unwrap(),
    );
    let tree = parse_strvec(&grammar, &sv(&["foo"])).unwrap();
    assert!(!tree.matches());
    assert!(tree.children().is_empty());
}

#[test]
fn boolean_connectives() {
    // or() keeps the match as long as one operand holds
    let grammar: Rc<dyn IGrammar> = Rc::new(
        Cond::new(
            "or(cmp(eq, count(find(root(), id_a)), 1), cmp(eq, count(find(root(), id_b)), 1))",
            Rc::new(Union::new(vec![
                Rc::new(Literal::new("a").with_id("id_a")) as Rc<dyn IGrammar>,
                Rc::new(Literal::new("b").with_id("id_b")),
                Rc::new(Literal::new("c").with_id("id_c")),
            ])),
        )
        .unwrap(),
    );
    assert_eq!(consumed(&grammar, &["a"]), Some(1));
    assert_eq!(consumed(&grammar, &["b"]), Some(1));
    assert_eq!(consumed(&grammar, &["c"]), None);

    let grammar: Rc<dyn IGrammar> = Rc::new(
        Cond::new(
            "and(bool(current()), cmp(ge, count(find(root(), id_x)), 2))",
            Rc::new(Concat::new(vec![
                Rc::new(Literal::new("x").with_id("id_x")) as Rc<dyn IGrammar>,
                Rc::new(Literal::new("x").with_id("id_x")),
            ])),
        )
        .unwrap(),
    );
    assert_eq!(consumed(&grammar, &["x", "x"]), Some(2));
}

#[test]
fn first_child_navigates_the_state() {
    // the current node is the cond state itself, its first child the matched symbol
    let grammar: Rc<dyn IGrammar> = Rc::new(
        Cond::new(
            "bool(first_child(current()))",
            Rc::new(Literal::new("go")),
        )
        .unwrap(),
    );
    assert_eq!(consumed(&grammar, &["go"]), Some(1));
}

#[test]
fn completion_is_delegated_to_the_child() {
    use crate::{complete_strvec, CompKindMask};
    let grammar: Rc<dyn IGrammar> = Rc::new(
        Cond::new(
            "cmp(le, count(find(root(), id_node)), 3)",
            repeated_foo(),
        )
        .unwrap(),
    );
    let comp = complete_strvec(&grammar, &sv(&["f"])).unwrap();
    let words: Vec<&str> = comp
        .iter(CompKindMask::FULL)
        .filter_map(|item| item.str())
        .collect();
    assert_eq!(words, vec!["foo"]);
}

#[test]
fn invalid_predicates_are_rejected() {
    let child = repeated_foo();
    let err = Cond::new("cmp(le,", child.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // an unknown function only fails at evaluation time
    let grammar: Rc<dyn IGrammar> =
        Rc::new(Cond::new("frobnicate()", child).unwrap());
    let err = parse_strvec(&grammar, &sv(&["foo"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn integer_and_string_values() {
    // a bare integer is truthy when non zero
    let always: Rc<dyn IGrammar> =
        Rc::new(Cond::new("1", Rc::new(Literal::new("go"))).unwrap());
    assert_eq!(consumed(&always, &["go"]), Some(1));

    let never: Rc<dyn IGrammar> =
        Rc::new(Cond::new("0", Rc::new(Literal::new("go"))).unwrap());
    assert_eq!(consumed(&never, &["go"]), None);

    // a bare identifier evaluates to a non-empty string
    let named: Rc<dyn IGrammar> =
        Rc::new(Cond::new("anything", Rc::new(Literal::new("go"))).unwrap());
    assert_eq!(consumed(&named, &["go"]), Some(1));
}
