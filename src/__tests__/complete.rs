use crate::production::{Concat, Literal, ShellLexer, Union};
use crate::{
    complete_strvec, complete_strvec_expand, get_helps, set_desc, set_help, CompKind,
    CompKindMask, Completion, ErrorKind, IGrammar, StrVec,
};
use std::rc::Rc;

fn sv(tokens: &[&str]) -> StrVec {
    tokens.into()
}

fn words(grammar: &Rc<dyn IGrammar>, input: &[&str], mask: CompKindMask) -> Vec<String> {
    let comp = complete_strvec(grammar, &sv(input)).unwrap();
    comp.iter(mask)
        .filter_map(|item| item.str().map(str::to_string))
        .collect()
}

fn foobar() -> Rc<dyn IGrammar> {
    Rc::new(Union::new(vec![
        Rc::new(Literal::new("foo")) as Rc<dyn IGrammar>,
        Rc::new(Literal::new("bar")),
        Rc::new(Literal::new("bar2")),
        Rc::new(Literal::new("toto")),
        Rc::new(Literal::new("titi")),
    ]))
}

#[test]
fn proposals_are_grouped_and_ordered() {
    let grammar = foobar();
    assert_eq!(
        words(&grammar, &[""], CompKindMask::FULL),
        vec!["bar", "bar2", "foo", "titi", "toto"]
    );
    assert_eq!(
        words(&grammar, &["b"], CompKindMask::FULL),
        vec!["bar", "bar2"]
    );
    assert_eq!(words(&grammar, &["t"], CompKindMask::FULL), vec!["titi", "toto"]);
    assert_eq!(words(&grammar, &["x"], CompKindMask::FULL), Vec::<String>::new());
}

#[test]
fn prefix_property_holds() {
    let grammar = foobar();
    let comp = complete_strvec(&grammar, &sv(&["ba"])).unwrap();
    for item in comp.iter(CompKindMask::FULL) {
        let current = item.current().unwrap();
        let full = item.str().unwrap();
        let completion = item.completion().unwrap();
        assert_eq!(current, "ba");
        assert!(full.starts_with(current));
        assert_eq!(format!("{}{}", current, completion), full);
        assert_eq!(item.display().unwrap(), full);
    }
}

#[test]
fn counts_follow_the_mask() {
    let grammar = foobar();
    let comp = complete_strvec(&grammar, &sv(&["b"])).unwrap();
    assert_eq!(comp.count(CompKindMask::FULL), 2);
    assert_eq!(comp.count(CompKindMask::PARTIAL), 0);
    assert_eq!(comp.count(CompKindMask::ALL), 2);
    assert_eq!(comp.count(CompKindMask::NONE), 0);
}

#[test]
fn unknown_items_carry_no_proposal() {
    let grammar: Rc<dyn IGrammar> =
        Rc::new(crate::production::IntLiteral::new(Some(0), Some(10), 10));
    let comp = complete_strvec(&grammar, &sv(&["4"])).unwrap();
    assert_eq!(comp.count(CompKindMask::UNKNOWN), 1);
    let item = comp.iter(CompKindMask::UNKNOWN).next().unwrap();
    assert_eq!(item.kind(), CompKind::Unknown);
    assert!(item.str().is_none());
    assert!(item.completion().is_none());
    assert!(item.display().is_none());

    // no unknown item is recorded for a multi token input
    let comp = complete_strvec(&grammar, &sv(&["4", ""])).unwrap();
    assert_eq!(comp.count(CompKindMask::ALL), 0);
}

#[test]
fn add_item_validates_the_prefix_relation() {
    let mut comp = Completion::new();
    let node: Rc<dyn IGrammar> = Rc::new(Literal::new("foo"));
    let err = comp
        .add_item(&node, CompKind::Unknown, Some("x"), Some("xy"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = comp
        .add_item(&node, CompKind::Full, Some("zz"), Some("xy"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = comp
        .add_item(&node, CompKind::Full, None, Some("xy"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn groups_expose_their_state() {
    let grammar = foobar();
    let comp = complete_strvec(&grammar, &sv(&["f"])).unwrap();
    assert_eq!(comp.groups().len(), 1);
    let group = &comp.groups()[0];
    assert_eq!(group.node().describe(), "foo");
    assert_eq!(group.items().len(), 1);
    // the recorded parse state is a private copy rooted at the queried grammar
    let pstate = group.pstate();
    assert_eq!(pstate.root().grammar().type_name(), "or");
}

#[test]
fn expansion_is_idempotent() {
    let grammar: Rc<dyn IGrammar> = Rc::new(Concat::new(vec![
        Rc::new(Literal::new("foo")) as Rc<dyn IGrammar>,
        Rc::new(Literal::new("bar")),
    ]));

    let expanded = complete_strvec_expand(&grammar, CompKindMask::FULL, &sv(&["f", "b"])).unwrap();
    assert_eq!(expanded, sv(&["foo", "bar"]));

    let again = complete_strvec_expand(&grammar, CompKindMask::FULL, &expanded).unwrap();
    assert_eq!(again, expanded);
}

#[test]
fn ambiguous_positions_are_left_alone() {
    let grammar = foobar();
    // "b" expands to both bar and bar2, so it must stay untouched
    let expanded = complete_strvec_expand(&grammar, CompKindMask::FULL, &sv(&["b"])).unwrap();
    assert_eq!(expanded, sv(&["b"]));
    let expanded = complete_strvec_expand(&grammar, CompKindMask::FULL, &sv(&["f"])).unwrap();
    assert_eq!(expanded, sv(&["foo"]));
}

#[test]
fn helps_walk_the_completion_groups() {
    let hello = Rc::new(Literal::new("hello")) as Rc<dyn IGrammar>;
    set_help(&hello, "Say hello");
    set_desc(&hello, "<greeting>");
    let world = Rc::new(Literal::new("world")) as Rc<dyn IGrammar>;
    set_help(&world, "Greet the world");

    let grammar: Rc<dyn IGrammar> = Rc::new(ShellLexer::new(Rc::new(Union::new(vec![
        hello, world,
    ]))));

    let mut helps = get_helps(&grammar, "").unwrap();
    helps.sort_by(|a, b| a.help.cmp(&b.help));
    assert_eq!(helps.len(), 2);
    assert_eq!(helps[0].help, "Greet the world");
    assert_eq!(helps[0].desc, "world");
    assert_eq!(helps[1].help, "Say hello");
    assert_eq!(helps[1].desc, "<greeting>");
}
