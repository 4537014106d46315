use crate::production::{AnyTok, EmptyProd, IntLiteral, Literal, RegexField, SpaceTok, UintLiteral};
use crate::{parse_strvec, AttrDict, AttrValue, IGrammar, StrVec};
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

#[test]
fn literal_matches_one_equal_token() {
    let foo: Rc<dyn IGrammar> = Rc::new(Literal::new("foo"));
    assert_eq!(consumed(&foo, &["foo"]), Some(1));
    assert_eq!(consumed(&foo, &["foo", "bar"]), Some(1));
    assert_eq!(consumed(&foo, &["fo"]), None);
    assert_eq!(consumed(&foo, &["foobar"]), None);
    assert_eq!(consumed(&foo, &[]), None);
    assert_eq!(foo.describe(), "foo");
}

#[test]
fn int_checks_range_and_radix() {
    let node: Rc<dyn IGrammar> = Rc::new(IntLiteral::new(Some(0), Some(10), 10));
    assert_eq!(consumed(&node, &["0"]), Some(1));
    assert_eq!(consumed(&node, &["10"]), Some(1));
    assert_eq!(consumed(&node, &["11"]), None);
    assert_eq!(consumed(&node, &["-1"]), None);
    assert_eq!(consumed(&node, &["4x"]), None);
    assert_eq!(consumed(&node, &[""]), None);

    let negative: Rc<dyn IGrammar> = Rc::new(IntLiteral::new(Some(-10), Some(-1), 10));
    assert_eq!(consumed(&negative, &["-5"]), Some(1));
    assert_eq!(consumed(&negative, &["5"]), None);

    let hex: Rc<dyn IGrammar> = Rc::new(IntLiteral::new(None, None, 16));
    assert_eq!(consumed(&hex, &["0x1A"]), Some(1));
    assert_eq!(consumed(&hex, &["1A"]), Some(1));
    assert_eq!(consumed(&hex, &["1G"]), None);
}

#[test]
fn int_radix_zero_guesses_like_c() {
    let guess = IntLiteral::new(None, None, 0);
    let node: Rc<dyn IGrammar> = Rc::new(IntLiteral::new(None, None, 0));

    let tree = parse_strvec(&node, &sv(&["0x10"])).unwrap();
    assert!(tree.matches());
    assert_eq!(guess.value(&tree).unwrap(), 16);

    // leading zero means octal, a lone zero is just zero
    let tree = parse_strvec(&node, &sv(&["010"])).unwrap();
    assert_eq!(guess.value(&tree).unwrap(), 8);
    let tree = parse_strvec(&node, &sv(&["0"])).unwrap();
    assert_eq!(guess.value(&tree).unwrap(), 0);
    // 8 is not an octal digit
    assert_eq!(consumed(&node, &["08"]), None);
}

#[test]
fn uint_rejects_signs() {
    let node: Rc<dyn IGrammar> = Rc::new(UintLiteral::new(Some(0), Some(100), 10));
    assert_eq!(consumed(&node, &["42"]), Some(1));
    assert_eq!(consumed(&node, &["-1"]), None);
    assert_eq!(consumed(&node, &["101"]), None);
}

#[test]
fn regex_matches_the_whole_token() {
    let node: Rc<dyn IGrammar> = Rc::new(RegexField::new("foo[0-9]+").unwrap());
    assert_eq!(consumed(&node, &["foo123"]), Some(1));
    assert_eq!(consumed(&node, &["foo"]), None);
    assert_eq!(consumed(&node, &["xfoo123"]), None);
    assert_eq!(consumed(&node, &["foo123x"]), None);

    assert!(RegexField::new("((unbalanced").is_err());
}

#[test]
fn any_accepts_every_token() {
    let node: Rc<dyn IGrammar> = Rc::new(AnyTok::new());
    assert_eq!(consumed(&node, &["anything"]), Some(1));
    assert_eq!(consumed(&node, &[""]), Some(1));
    assert_eq!(consumed(&node, &[]), None);
}

#[test]
fn any_can_require_an_attribute() {
    let node: Rc<dyn IGrammar> = Rc::new(AnyTok::with_attr("a_word"));

    let mut tagged = sv(&["hello"]);
    let mut attrs = AttrDict::new();
    attrs.insert("a_word".into(), AttrValue::Flag);
    tagged.set_attrs(0, attrs).unwrap();
    assert!(parse_strvec(&node, &tagged).unwrap().matches());

    let plain = sv(&["hello"]);
    assert!(!parse_strvec(&node, &plain).unwrap().matches());
}

#[test]
fn empty_always_matches_zero_tokens() {
    let node: Rc<dyn IGrammar> = Rc::new(EmptyProd::new());
    assert_eq!(consumed(&node, &[]), Some(0));
    assert_eq!(consumed(&node, &["foo"]), Some(0));
}

#[test]
fn space_matches_whitespace_tokens() {
    let node: Rc<dyn IGrammar> = Rc::new(SpaceTok::new());
    assert_eq!(consumed(&node, &[" "]), Some(1));
    assert_eq!(consumed(&node, &[" \t "]), Some(1));
    assert_eq!(consumed(&node, &["x"]), None);
    assert_eq!(consumed(&node, &[""]), None);
    assert_eq!(consumed(&node, &[]), None);
}
