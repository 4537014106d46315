use crate::production::{Bypass, Concat, Literal, Once, Optional, Repeat, Subset, Union};
use crate::{complete_strvec, parse_strvec, CompKindMask, IGrammar, StrVec};
use std::rc::Rc;

fn sv(tokens: &[&str]) -> StrVec {
    tokens.into()
}

fn lit(word: &str) -> Rc<dyn IGrammar> {
    Rc::new(Literal::new(word))
}

fn consumed(grammar: &Rc<dyn IGrammar>, input: &[&str]) -> Option<usize> {
    let tree = parse_strvec(grammar, &sv(input)).unwrap();
    if tree.matches() {
        Some(tree.len())
    } else {
        None
    }
}

fn full_words(grammar: &Rc<dyn IGrammar>, input: &[&str]) -> Vec<String> {
    let comp = complete_strvec(grammar, &sv(input)).unwrap();
    let mut words: Vec<String> = comp
        .iter(CompKindMask::FULL)
        .filter_map(|item| item.str().map(str::to_string))
        .collect();
    words.sort();
    words
}

#[test]
fn union_takes_the_first_matching_alternative() {
    let node: Rc<dyn IGrammar> = Rc::new(Union::new(vec![lit("foo"), lit("bar")]));
    assert_eq!(consumed(&node, &["foo"]), Some(1));
    assert_eq!(consumed(&node, &["bar"]), Some(1));
    assert_eq!(consumed(&node, &["titi"]), None);
    assert_eq!(consumed(&node, &[]), None);
}

#[test]
fn union_completion_merges_alternatives() {
    let node: Rc<dyn IGrammar> = Rc::new(Union::new(vec![lit("foo"), lit("bar"), lit("bar2")]));
    assert_eq!(full_words(&node, &[""]), vec!["bar", "bar2", "foo"]);
    assert_eq!(full_words(&node, &["b"]), vec!["bar", "bar2"]);
}

#[test]
fn concat_consumes_children_in_series() {
    let node: Rc<dyn IGrammar> = Rc::new(Concat::new(vec![lit("x"), lit("y")]));
    assert_eq!(consumed(&node, &["x", "y"]), Some(2));
    assert_eq!(consumed(&node, &["x", "y", "z"]), Some(2));
    assert_eq!(consumed(&node, &["x"]), None);
    assert_eq!(consumed(&node, &["y", "x"]), None);
}

#[test]
fn concat_rolls_back_on_failure() {
    let node: Rc<dyn IGrammar> = Rc::new(Concat::new(vec![lit("x"), lit("y")]));
    let tree = parse_strvec(&node, &sv(&["x", "z"])).unwrap();
    assert!(!tree.matches());
    assert!(tree.children().is_empty());
}

#[test]
fn concat_completes_along_the_parsed_prefix() {
    let node: Rc<dyn IGrammar> = Rc::new(Concat::new(vec![lit("x"), lit("y")]));
    assert_eq!(full_words(&node, &[""]), vec!["x"]);
    assert_eq!(full_words(&node, &["x", ""]), vec!["y"]);
    assert_eq!(full_words(&node, &["z", ""]), Vec::<String>::new());
}

#[test]
fn optional_matches_with_or_without_its_child() {
    let node: Rc<dyn IGrammar> = Rc::new(Optional::new(lit("foo")));
    assert_eq!(consumed(&node, &["foo"]), Some(1));
    assert_eq!(consumed(&node, &["bar"]), Some(0));
    assert_eq!(consumed(&node, &[]), Some(0));
}

#[test]
fn repeat_parses_greedily_within_bounds() {
    let unbounded: Rc<dyn IGrammar> = Rc::new(Repeat::new(lit("foo"), 0, 0));
    assert_eq!(consumed(&unbounded, &[]), Some(0));
    assert_eq!(consumed(&unbounded, &["bar"]), Some(0));
    assert_eq!(consumed(&unbounded, &["foo", "bar"]), Some(1));
    assert_eq!(consumed(&unbounded, &["foo", "foo", "bar"]), Some(2));

    let at_least_one: Rc<dyn IGrammar> = Rc::new(Repeat::new(lit("foo"), 1, 0));
    assert_eq!(consumed(&at_least_one, &["bar"]), None);
    assert_eq!(consumed(&at_least_one, &[]), None);
    assert_eq!(consumed(&at_least_one, &["foo", "bar"]), Some(1));
    assert_eq!(consumed(&at_least_one, &["foo", "foo", "bar"]), Some(2));

    let bounded: Rc<dyn IGrammar> = Rc::new(Repeat::new(lit("foo"), 1, 2));
    assert_eq!(consumed(&bounded, &["bar"]), None);
    assert_eq!(consumed(&bounded, &["foo", "bar"]), Some(1));
    assert_eq!(consumed(&bounded, &["foo", "foo", "bar"]), Some(2));
    assert_eq!(consumed(&bounded, &["foo", "foo", "foo"]), Some(2));
}

#[test]
fn repeat_stops_on_zero_consumption() {
    use crate::production::EmptyProd;
    let node: Rc<dyn IGrammar> = Rc::new(Repeat::new(Rc::new(EmptyProd::new()), 0, 0));
    // a nullable child terminates after one round instead of looping
    assert_eq!(consumed(&node, &["foo"]), Some(0));
    assert_eq!(consumed(&node, &[]), Some(0));
}

#[test]
fn repeat_completes_every_reachable_boundary() {
    let node: Rc<dyn IGrammar> = Rc::new(Repeat::new(lit("foo"), 2, 4));
    assert_eq!(full_words(&node, &[""]), vec!["foo"]);
    assert_eq!(full_words(&node, &["f"]), vec!["foo"]);
    assert_eq!(full_words(&node, &["foo", ""]), vec!["foo"]);
    assert_eq!(full_words(&node, &["foo", "foo", "foo", ""]), vec!["foo"]);
    assert_eq!(
        full_words(&node, &["foo", "foo", "foo", "foo", ""]),
        Vec::<String>::new()
    );
}

#[test]
fn repeat_many_of_union() {
    // the grammar of the repetition scenario: many(or(foo, bar), 0, 0)
    let node: Rc<dyn IGrammar> = Rc::new(Repeat::new(
        Rc::new(Union::new(vec![lit("foo"), lit("bar")])),
        0,
        0,
    ));
    assert_eq!(consumed(&node, &["foo", "foo", "bar"]), Some(3));
    assert_eq!(consumed(&node, &[]), Some(0));
    assert_eq!(full_words(&node, &["foo", ""]), vec!["bar", "foo"]);
}

#[test]
fn subset_matches_any_order_each_child_once() {
    let node: Rc<dyn IGrammar> =
        Rc::new(Subset::new(vec![lit("foo"), lit("bar"), lit("titi")]));
    assert_eq!(consumed(&node, &[]), Some(0));
    assert_eq!(consumed(&node, &["foo"]), Some(1));
    assert_eq!(consumed(&node, &["bar", "foo"]), Some(2));
    assert_eq!(consumed(&node, &["foo", "bar", "titi"]), Some(3));
    assert_eq!(consumed(&node, &["titi", "foo", "bar"]), Some(3));
    // each child matches at most once
    assert_eq!(consumed(&node, &["foo", "foo"]), Some(1));
    // an unknown token stops the subset
    assert_eq!(consumed(&node, &["x", "foo"]), Some(0));
}

#[test]
fn subset_prefers_the_first_equal_sized_match() {
    let first = Rc::new(Literal::new("x").with_id("id_first")) as Rc<dyn IGrammar>;
    let second = Rc::new(Literal::new("x").with_id("id_second")) as Rc<dyn IGrammar>;
    let node: Rc<dyn IGrammar> = Rc::new(Subset::new(vec![first, second]));

    let tree = parse_strvec(&node, &sv(&["x"])).unwrap();
    assert_eq!(tree.len(), 1);
    let matched = tree.first_child().unwrap();
    assert_eq!(matched.grammar().base().id(), Some("id_first"));
}

#[test]
fn subset_completes_remaining_members() {
    let node: Rc<dyn IGrammar> = Rc::new(Subset::new(vec![lit("foo"), lit("bar")]));
    assert_eq!(full_words(&node, &[""]), vec!["bar", "foo"]);
    assert_eq!(full_words(&node, &["foo", ""]), vec!["bar"]);
    assert_eq!(full_words(&node, &["bar", "foo", ""]), Vec::<String>::new());
}

#[test]
fn once_refuses_a_second_match() {
    let foo = lit("foo");
    let node: Rc<dyn IGrammar> = Rc::new(Repeat::new(
        Rc::new(Union::new(vec![
            Rc::new(Once::new(foo)) as Rc<dyn IGrammar>,
            lit("bar"),
        ])),
        0,
        0,
    ));
    assert_eq!(consumed(&node, &["foo", "bar", "bar"]), Some(3));
    assert_eq!(consumed(&node, &["bar", "foo", "bar"]), Some(3));
    // the second foo is refused, the repetition stops before it
    assert_eq!(consumed(&node, &["bar", "bar", "foo", "foo"]), Some(3));

    // completion stops proposing foo once it matched
    assert_eq!(full_words(&node, &[""]), vec!["bar", "foo"]);
    assert_eq!(full_words(&node, &["foo", ""]), vec!["bar"]);
}

#[test]
fn bypass_closes_recursive_grammars() {
    let inner = Rc::new(Bypass::init());
    let nested: Rc<dyn IGrammar> = Rc::new(Union::new(vec![
        lit("x"),
        Rc::new(Concat::new(vec![lit("("), inner.clone() as Rc<dyn IGrammar>, lit(")")])),
    ]));
    inner.bind(&nested).unwrap();

    assert_eq!(consumed(&nested, &["x"]), Some(1));
    assert_eq!(consumed(&nested, &["(", "x", ")"]), Some(3));
    assert_eq!(consumed(&nested, &["(", "(", "x", ")", ")"]), Some(5));
    assert_eq!(consumed(&nested, &["(", "x"]), None);

    // completion crosses the cycle as well
    assert_eq!(full_words(&nested, &["(", ""]), vec!["(", "x"]);
}
