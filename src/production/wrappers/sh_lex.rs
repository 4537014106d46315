use crate::production::{GrammarLogger, ShellLexer};
use crate::{
    complete_child, parse_child, shlex_tokenize, CompKindMask, Completion, ConfigSchema,
    GrammarError, IGrammar, NodeBase, NodeTypeInfo, ParseMatch, ParseNode, ParseResult,
    SchemaEntry, ShLexMode, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

use super::optional::config_child;

impl ShellLexer {
    /// Create a [ShellLexer] utility splitting one raw line into tokens consumed by `symbol`.
    pub fn new(symbol: Rc<dyn IGrammar>) -> Self {
        Self {
            base: NodeBase::new(),
            symbol,
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

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "sh_lex",
            schema: Some(ConfigSchema::new(vec![SchemaEntry::new(
                "child",
                "The sub-grammar fed by the lexer.",
                crate::ConfigKind::Node,
            )
            .mandatory()])),
            build: |id, config| {
                let mut node = ShellLexer::new(config_child(config, "sh_lex")?);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for ShellLexer {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for ShellLexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sh_lex({})", self.symbol)
    }
}

impl IGrammar for ShellLexer {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "sh_lex"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        let result = (|| {
            if input.len() != 1 {
                return Ok(ParseMatch::NoMatch);
            }
            let line = input.get(0).expect("one token is present");
            let lexed = match shlex_tokenize(line, ShLexMode::Strict) {
                Ok(lexed) => lexed,
                // an unterminated quote is not part of the language
                Err(_) => return Ok(ParseMatch::NoMatch),
            };
            match parse_child(&self.symbol, state, &lexed.vec)? {
                ParseMatch::Consumed(count) if count == lexed.vec.len() => {
                    Ok(ParseMatch::Consumed(1))
                }
                ParseMatch::Consumed(_) => {
                    // the whole line must be consumed
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

    fn complete(
        &self,
        _this: &Rc<dyn IGrammar>,
        comp: &mut Completion,
        input: &StrVec,
    ) -> Result<(), GrammarError> {
        if input.len() != 1 {
            return Ok(());
        }
        let line = input.get(0).expect("one token is present");
        let lexed = shlex_tokenize(line, ShLexMode::Lenient)?;

        // proposals accumulate in a scratch tree so they can be re-quoted before publication
        let mut scratch = Completion::new();
        complete_child(&self.symbol, &mut scratch, &lexed.vec)?;

        if let Some(quote) = lexed.missing_quote {
            for item in scratch.iter_mut(CompKindMask::FULL) {
                let full = item.str().unwrap_or_default().to_string();
                item.set_str(&format!("{}{}{}", quote, full, quote))?;
                let completion = item.completion().unwrap_or_default().to_string();
                item.set_completion(&format!("{}{}", completion, quote))?;
            }
        }

        comp.merge(scratch);
        Ok(())
    }

    fn children(&self) -> Vec<Rc<dyn IGrammar>> {
        vec![self.symbol.clone()]
    }
}
