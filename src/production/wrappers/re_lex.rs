use crate::production::{GrammarLogger, LexRule, ReLexer};
use crate::{
    parse_child, AttrDict, AttrValue, ConfigKind, ConfigSchema, ConfigValue, ErrorKind,
    GrammarError, IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult,
    SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::fmt::Display;
use std::rc::Rc;

use super::optional::config_child;

impl LexRule {
    /// Create a tokenization rule: `pattern` is matched at the current offset; a rule with
    /// `keep` unset consumes its match silently, and `attr` is recorded on the produced token.
    pub fn new(pattern: &str, keep: bool, attr: Option<&str>) -> Result<Self, GrammarError> {
        let regexp = Regex::new(&format!("^(?:{})", pattern)).map_err(|err| {
            GrammarError::new(
                ErrorKind::InvalidArgument,
                "re_lex",
                format!("cannot compile {:?}: {}", pattern, err),
            )
        })?;
        Ok(Self {
            regexp,
            keep,
            attr: attr.map(str::to_string),
        })
    }
}

impl ReLexer {
    /// Create a [ReLexer] utility re-tokenizing one input token against `rules` (first matching
    /// rule wins) and running `symbol` over the produced vector.
    pub fn new(symbol: Rc<dyn IGrammar>, rules: Vec<LexRule>) -> Self {
        Self {
            base: NodeBase::new(),
            symbol,
            rules,
            debugger: OnceCell::new(),
        }
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

    fn tokenize(&self, token: &str) -> Result<StrVec, GrammarError> {
        let mut vec = StrVec::new();
        let mut off = 0;
        while off < token.len() {
            let mut advanced = false;
            for rule in &self.rules {
                let matched = match rule.regexp.find(&token[off..]) {
                    Some(matched) if !matched.as_str().is_empty() => matched,
                    _ => continue,
                };
                if rule.keep {
                    let index = vec.len();
                    vec.push(matched.as_str());
                    if let Some(attr) = &rule.attr {
                        let mut attrs = AttrDict::new();
                        attrs.insert(attr.clone(), AttrValue::Flag);
                        vec.set_attrs(index, attrs)?;
                    }
                }
                off += matched.end();
                advanced = true;
                break;
            }
            if !advanced {
                return Err(GrammarError::new(
                    ErrorKind::BadFormat,
                    "re_lex",
                    format!("cannot tokenize {:?} at offset {}", token, off),
                ));
            }
        }
        Ok(vec)
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "re_lex",
            schema: Some(ConfigSchema::new(vec![
                SchemaEntry::new("child", "The sub-grammar fed by the lexer.", ConfigKind::Node)
                    .mandatory(),
                SchemaEntry::new("patterns", "The ordered rule table.", ConfigKind::List)
                    .mandatory()
                    .with_subschema(vec![SchemaEntry::element(
                        "A tokenization rule.",
                        ConfigKind::Dict,
                    )
                    .with_subschema(vec![
                        SchemaEntry::new("pattern", "The pattern to match.", ConfigKind::Str)
                            .mandatory(),
                        SchemaEntry::new(
                            "keep",
                            "Whether to keep or drop the matched string.",
                            ConfigKind::Bool,
                        ),
                        SchemaEntry::new(
                            "attr",
                            "The optional attribute name to attach.",
                            ConfigKind::Str,
                        ),
                    ])]),
            ])),
            build: |id, config| {
                let symbol = config_child(config, "re_lex")?;
                let patterns = config
                    .dict_get("patterns")
                    .and_then(ConfigValue::as_list)
                    .ok_or_else(|| {
                        GrammarError::new(ErrorKind::BadFormat, "re_lex", "a rule table is required")
                    })?;
                let mut rules = Vec::new();
                for value in patterns {
                    let pattern = value
                        .dict_get("pattern")
                        .and_then(ConfigValue::as_str)
                        .ok_or_else(|| {
                            GrammarError::new(
                                ErrorKind::BadFormat,
                                "re_lex",
                                "a rule requires a pattern",
                            )
                        })?;
                    let keep = value
                        .dict_get("keep")
                        .and_then(ConfigValue::as_bool)
                        .unwrap_or(true);
                    let attr = value.dict_get("attr").and_then(ConfigValue::as_str);
                    rules.push(LexRule::new(pattern, keep, attr)?);
                }
                let mut node = ReLexer::new(symbol, rules);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for ReLexer {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for ReLexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "re_lex({})", self.symbol)
    }
}

impl IGrammar for ReLexer {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "re_lex"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = (|| {
            let token = match input.get(0) {
                Some(token) => token,
                None => return Ok(ParseMatch::NoMatch),
            };
            let sub_vec = match self.tokenize(token) {
                Ok(sub_vec) => sub_vec,
                // a token the rules cannot split is not part of the language
                Err(_) => return Ok(ParseMatch::NoMatch),
            };
            match parse_child(&self.symbol, state, &sub_vec)? {
                ParseMatch::Consumed(count) if count == sub_vec.len() => {
                    Ok(ParseMatch::Consumed(1))
                }
                ParseMatch::Consumed(_) => {
                    // partial consumption of the sub-vector rejects the whole token
                    state.del_last_child();
                    Ok(ParseMatch::NoMatch)
                }
                ParseMatch::NoMatch => Ok(ParseMatch::NoMatch),
            }
        })();

        #[cfg(debug_assertions)]
        self.log_result(input, &result);

        result
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        vec![self.symbol.clone()]
    }
}
