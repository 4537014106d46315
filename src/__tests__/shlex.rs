use crate::{shlex_tokenize, AttrValue, ErrorKind, ShLexMode, StrVec};

fn tokens(line: &str, mode: ShLexMode) -> StrVec {
    shlex_tokenize(line, mode).unwrap().vec
}

fn sv(expected: &[&str]) -> StrVec {
    expected.into()
}

#[test]
fn splits_on_blanks() {
    assert_eq!(tokens("foo bar", ShLexMode::Strict), sv(&["foo", "bar"]));
    assert_eq!(tokens("  foo\t bar  ", ShLexMode::Strict), sv(&["foo", "bar"]));
    assert_eq!(tokens("", ShLexMode::Strict), sv(&[]));
}

#[test]
fn quotes_group_words() {
    assert_eq!(
        tokens("foo 'bar baz'", ShLexMode::Strict),
        sv(&["foo", "bar baz"])
    );
    assert_eq!(
        tokens("foo \"bar baz\"", ShLexMode::Strict),
        sv(&["foo", "bar baz"])
    );
    // adjacent segments concatenate into a single token
    assert_eq!(tokens("a\"b c\"d", ShLexMode::Strict), sv(&["ab cd"]));
}

#[test]
fn escapes_inside_quotes() {
    assert_eq!(tokens(r"'a\'b'", ShLexMode::Strict), sv(&["a'b"]));
    assert_eq!(tokens(r"'a\\b'", ShLexMode::Strict), sv(&["a\\b"]));
    // a double quote needs no escape inside single quotes
    assert_eq!(tokens("'a\"b'", ShLexMode::Strict), sv(&["a\"b"]));
}

#[test]
fn comments_run_to_end_of_line() {
    assert_eq!(tokens("foo # rest is ignored", ShLexMode::Strict), sv(&["foo"]));
    assert_eq!(tokens("# only a comment", ShLexMode::Strict), sv(&[]));
    // a hash inside a quoted token stays literal
    assert_eq!(tokens("'#tag'", ShLexMode::Strict), sv(&["#tag"]));
}

#[test]
fn strict_rejects_unterminated_quote() {
    let err = shlex_tokenize("foo 'bar", ShLexMode::Strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
    let err = shlex_tokenize("\"bar", ShLexMode::TrailingSpace).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadFormat);
}

#[test]
fn trailing_space_appends_empty_token() {
    assert_eq!(tokens("foo ", ShLexMode::TrailingSpace), sv(&["foo", ""]));
    assert_eq!(tokens("foo", ShLexMode::TrailingSpace), sv(&["foo"]));
    assert_eq!(tokens("", ShLexMode::TrailingSpace), sv(&[""]));
}

#[test]
fn lenient_reports_missing_quote() {
    let lexed = shlex_tokenize("foo 'b", ShLexMode::Lenient).unwrap();
    assert_eq!(lexed.vec, sv(&["foo", "b"]));
    assert_eq!(lexed.missing_quote, Some('\''));

    let lexed = shlex_tokenize("foo bar", ShLexMode::Lenient).unwrap();
    assert_eq!(lexed.missing_quote, None);
}

#[test]
fn lenient_records_byte_offsets() {
    let lexed = shlex_tokenize("foo 'b", ShLexMode::Lenient).unwrap();
    let get = |index: usize, key: &str| {
        lexed
            .vec
            .attrs(index)
            .and_then(|attrs| attrs.get(key))
            .and_then(AttrValue::as_int)
    };
    assert_eq!(get(0, "start"), Some(0));
    assert_eq!(get(0, "end"), Some(3));
    assert_eq!(get(1, "start"), Some(4));
    assert_eq!(get(1, "end"), Some(6));

    let lexed = shlex_tokenize("a ", ShLexMode::Lenient).unwrap();
    assert_eq!(lexed.vec, sv(&["a", ""]));
    let end = lexed
        .vec
        .attrs(1)
        .and_then(|attrs| attrs.get("start"))
        .and_then(AttrValue::as_int);
    assert_eq!(end, Some(2));
}
