use crate::production::{Concat, LexRule, Literal, Optional, ReLexer, ShellLexer};
use crate::{complete, parse, CompKindMask, IGrammar};
use std::rc::Rc;

fn lit(word: &str) -> Rc<dyn IGrammar> {
    Rc::new(Literal::new(word))
}

fn matches(grammar: &Rc<dyn IGrammar>, line: &str) -> bool {
    parse(grammar, line).unwrap().matches()
}

fn full_words(grammar: &Rc<dyn IGrammar>, line: &str) -> Vec<String> {
    let comp = complete(grammar, line).unwrap();
    let mut words: Vec<String> = comp
        .iter(CompKindMask::FULL)
        .filter_map(|item| item.str().map(str::to_string))
        .collect();
    words.sort();
    words
}

fn word_number_lexer(child: Rc<dyn IGrammar>) -> Rc<dyn IGrammar> {
    Rc::new(ReLexer::new(
        child,
        vec![
            LexRule::new("[a-z]+", true, Some("a_word")).unwrap(),
            LexRule::new("[0-9]+", true, None).unwrap(),
            LexRule::new("[ \t]+", false, None).unwrap(),
        ],
    ))
}

#[test]
fn re_lex_splits_one_token_for_its_child() {
    let grammar = word_number_lexer(Rc::new(Concat::new(vec![lit("foo"), lit("123")])));
    assert!(matches(&grammar, "foo 123"));
    assert!(matches(&grammar, "foo123"));
    assert!(!matches(&grammar, "foo 124"));
}

#[test]
fn re_lex_requires_full_consumption() {
    let grammar = word_number_lexer(lit("foo"));
    assert!(matches(&grammar, "foo"));
    // "123" is tokenized but not consumed by the child
    assert!(!matches(&grammar, "foo 123"));
}

#[test]
fn re_lex_rejects_untokenizable_input() {
    let grammar = word_number_lexer(lit("foo"));
    assert!(!matches(&grammar, "foo!"));
}

#[test]
fn re_lex_records_rule_attributes() {
    use crate::production::AnyTok;
    let grammar = word_number_lexer(Rc::new(AnyTok::with_attr("a_word")));
    assert!(matches(&grammar, "hello"));
    // a number token does not carry the word attribute
    assert!(!matches(&grammar, "42"));
}

fn xy_line() -> Rc<dyn IGrammar> {
    Rc::new(ShellLexer::new(Rc::new(Concat::new(vec![
        lit("x"),
        lit("y"),
    ]))))
}

#[test]
fn sh_lex_drives_a_sub_grammar() {
    let grammar = xy_line();
    let tree = parse(&grammar, "x y").unwrap();
    assert!(tree.matches());
    // one raw token consumed at the root, two parsed leaves below
    assert_eq!(tree.len(), 1);
    let seq_state = tree.first_child().unwrap();
    assert_eq!(seq_state.children().len(), 2);

    assert!(!parse(&grammar, "xcdscds").unwrap().matches());
    assert!(!parse(&grammar, "x").unwrap().matches());
    // every produced token must be consumed
    assert!(!parse(&grammar, "x y z").unwrap().matches());
}

#[test]
fn sh_lex_understands_quotes() {
    let grammar: Rc<dyn IGrammar> = Rc::new(ShellLexer::new(Rc::new(Concat::new(vec![
        lit("say"),
        lit("hello world"),
    ]))));
    assert!(matches(&grammar, "say 'hello world'"));
    assert!(matches(&grammar, "say \"hello world\""));
    assert!(!matches(&grammar, "say hello world"));
    // an unterminated quote never parses
    assert!(!matches(&grammar, "say 'hello world"));
}

#[test]
fn sh_lex_completes_the_empty_line() {
    let grammar = xy_line();
    assert_eq!(full_words(&grammar, ""), vec!["x"]);
    assert_eq!(full_words(&grammar, "x "), vec!["y"]);
    assert_eq!(full_words(&grammar, "x y"), vec!["y"]);
}

#[test]
fn sh_lex_requotes_proposals() {
    // the quoting scenario: seq(foo, option(toto), bar, titi)
    let grammar: Rc<dyn IGrammar> = Rc::new(ShellLexer::new(Rc::new(Concat::new(vec![
        lit("foo"),
        Rc::new(Optional::new(lit("toto"))),
        lit("bar"),
        lit("titi"),
    ]))));

    assert_eq!(full_words(&grammar, "foo "), vec!["bar", "toto"]);
    // the missing quote is re-added around the proposal
    assert_eq!(full_words(&grammar, "foo 'b"), vec!["'bar'"]);

    let comp = complete(&grammar, "foo 'b").unwrap();
    let item = comp.iter(CompKindMask::FULL).next().unwrap();
    assert_eq!(item.completion(), Some("ar'"));
    assert_eq!(item.current(), Some("b"));
}
