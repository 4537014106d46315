use crate::production::{Cmd, IntLiteral};
use crate::{complete_strvec, parse_strvec, CompKindMask, ErrorKind, IGrammar, StrVec};
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

fn full_words(grammar: &Rc<dyn IGrammar>, input: &[&str]) -> Vec<String> {
    let comp = complete_strvec(grammar, &sv(input)).unwrap();
    let mut words: Vec<String> = comp
        .iter(CompKindMask::FULL)
        .filter_map(|item| item.str().map(str::to_string))
        .collect();
    words.sort();
    words
}

fn command_grammar() -> Rc<dyn IGrammar> {
    Rc::new(
        Cmd::new(
            "command [option] (subset1, subset2, subset3, subset4) x|y z*",
            vec![
                Rc::new(IntLiteral::new(Some(0), Some(10), 10).with_id("x"))
                    as Rc<dyn IGrammar>,
                Rc::new(IntLiteral::new(Some(20), Some(30), 10).with_id("y")),
            ],
        )
        .unwrap(),
    )
}

#[test]
fn template_words_subsets_and_named_children() {
    let grammar = command_grammar();
    assert_eq!(consumed(&grammar, &["command", "1"]), Some(2));
    assert_eq!(consumed(&grammar, &["command", "subset1", "1"]), Some(3));
    assert_eq!(
        consumed(&grammar, &["command", "subset3", "subset2", "1"]),
        Some(4)
    );
    assert_eq!(
        consumed(
            &grammar,
            &["command", "subset2", "subset3", "subset1", "1"]
        ),
        Some(5)
    );
    assert_eq!(
        consumed(
            &grammar,
            &["command", "subset3", "subset1", "subset4", "subset2", "4"]
        ),
        Some(6)
    );
    assert_eq!(consumed(&grammar, &["command", "option", "1"]), Some(3));
    assert_eq!(consumed(&grammar, &["command", "15"]), None);
    assert_eq!(consumed(&grammar, &["foo"]), None);
}

#[test]
fn alternatives_bind_looser_than_concatenation() {
    // "a b|c" reads as (a b) | c
    let grammar: Rc<dyn IGrammar> = Rc::new(Cmd::new("a b|c", Vec::new()).unwrap());
    assert_eq!(consumed(&grammar, &["a", "b"]), Some(2));
    assert_eq!(consumed(&grammar, &["c"]), Some(1));
    assert_eq!(consumed(&grammar, &["a", "c"]), None);
    assert_eq!(consumed(&grammar, &["b"]), None);
}

#[test]
fn repetition_suffixes() {
    let grammar: Rc<dyn IGrammar> = Rc::new(Cmd::new("go x+", Vec::new()).unwrap());
    assert_eq!(consumed(&grammar, &["go"]), None);
    assert_eq!(consumed(&grammar, &["go", "x"]), Some(2));
    assert_eq!(consumed(&grammar, &["go", "x", "x", "x"]), Some(4));

    let grammar: Rc<dyn IGrammar> = Rc::new(Cmd::new("go x*", Vec::new()).unwrap());
    assert_eq!(consumed(&grammar, &["go"]), Some(1));
    assert_eq!(consumed(&grammar, &["go", "x", "x"]), Some(3));
}

#[test]
fn nested_optional_groups() {
    let grammar: Rc<dyn IGrammar> = Rc::new(Cmd::new("[foo [bar]]", Vec::new()).unwrap());
    assert_eq!(consumed(&grammar, &[]), Some(0));
    assert_eq!(consumed(&grammar, &["foo"]), Some(1));
    assert_eq!(consumed(&grammar, &["foo", "bar"]), Some(2));
    // an unknown word is simply not consumed by the optional group
    assert_eq!(consumed(&grammar, &["x"]), Some(0));
}

#[test]
fn template_completion() {
    let grammar: Rc<dyn IGrammar> = Rc::new(
        Cmd::new(
            "good morning [count] bob",
            vec![Rc::new(IntLiteral::new(Some(0), Some(10), 10).with_id("count"))
                as Rc<dyn IGrammar>],
        )
        .unwrap(),
    );
    assert_eq!(consumed(&grammar, &["good", "morning", "1", "bob"]), Some(4));
    assert_eq!(consumed(&grammar, &["good", "morning", "bob"]), Some(3));

    assert_eq!(full_words(&grammar, &[""]), vec!["good"]);
    assert_eq!(full_words(&grammar, &["g"]), vec!["good"]);
    assert_eq!(full_words(&grammar, &["good", "morning", ""]), vec!["bob"]);
}

#[test]
fn invalid_templates_are_rejected() {
    let err = Cmd::new("a |", Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
    let err = Cmd::new("(a", Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
}
