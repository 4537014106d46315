use crate::production::{DynList, DynListBuildFn, DynListFlags};
use crate::{
    complete_unknown, CompKind, Completion, ErrorKind, GrammarError, IGrammar, NodeBase,
    NodeTypeInfo, ParseMatch, ParseNode, ParseResult, StrVec,
};
use regex::Regex;
use std::fmt::Display;
use std::ops::BitOr;
use std::rc::Rc;

impl DynListFlags {
    /// Accept tokens present in the built list.
    pub const MATCH_LIST: DynListFlags = DynListFlags(1);
    /// Accept tokens matching the regular expression.
    pub const MATCH_REGEXP: DynListFlags = DynListFlags(1 << 1);
    /// Restrict [MATCH_REGEXP](DynListFlags::MATCH_REGEXP) to tokens absent from the list.
    pub const EXCLUDE_LIST: DynListFlags = DynListFlags(1 << 2);

    pub fn contains(self, other: DynListFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DynListFlags {
    type Output = DynListFlags;

    fn bitor(self, rhs: DynListFlags) -> DynListFlags {
        DynListFlags(self.0 | rhs.0)
    }
}

impl DynList {
    /// Create a [DynList] utility; `build` returns the current string list, `pattern` is
    /// required when [MATCH_REGEXP](DynListFlags::MATCH_REGEXP) is set.
    pub fn new(
        build: DynListBuildFn,
        pattern: Option<&str>,
        flags: DynListFlags,
    ) -> Result<Self, GrammarError> {
        if flags.contains(DynListFlags::MATCH_REGEXP) && pattern.is_none() {
            return Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "dynlist",
                "regexp matching requires a pattern",
            ));
        }
        let regexp = match pattern {
            Some(pattern) => Some(Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| {
                GrammarError::new(
                    ErrorKind::InvalidArgument,
                    "dynlist",
                    format!("cannot compile {:?}: {}", pattern, err),
                )
            })?),
            None => None,
        };
        Ok(Self {
            base: NodeBase::new(),
            build,
            regexp,
            flags,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    fn token_matches(&self, token: &str, list: &[String]) -> bool {
        if self.flags.contains(DynListFlags::MATCH_LIST)
            && list.iter().any(|name| name == token)
        {
            return true;
        }
        if self.flags.contains(DynListFlags::MATCH_REGEXP) {
            let matched = self
                .regexp
                .as_ref()
                .map_or(false, |regexp| regexp.is_match(token));
            if matched
                && !(self.flags.contains(DynListFlags::EXCLUDE_LIST)
                    && list.iter().any(|name| name == token))
            {
                return true;
            }
        }
        false
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            // built around a caller supplied closure, no configuration surface
            name: "dynlist",
            schema: None,
            build: |_id, _config| {
                Err(GrammarError::new(
                    ErrorKind::NotPermitted,
                    "dynlist",
                    "a dynlist node cannot be built from a configuration",
                ))
            },
        }
    }
}

impl Display for DynList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dynlist")
    }
}

impl IGrammar for DynList {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "dynlist"
    }

    fn parse(&self, state: &ParseNode, input: &StrVec) -> ParseResult {
        let token = match input.get(0) {
            Some(token) => token,
            None => return Ok(ParseMatch::NoMatch),
        };
        let list = (self.build)(state)?;
        if self.token_matches(token, &list) {
            Ok(ParseMatch::Consumed(1))
        } else {
            Ok(ParseMatch::NoMatch)
        }
    }

    fn complete(
        &self,
        this: &Rc<dyn IGrammar>,
        comp: &mut Completion,
        input: &StrVec,
    ) -> Result<(), GrammarError> {
        if input.len() != 1 {
            return Ok(());
        }
        let token = input.get(0).expect("one token is present").to_string();
        let pstate = match comp.cur_pstate() {
            Some(pstate) => pstate.clone(),
            None => return Ok(()),
        };
        let list = (self.build)(&pstate)?;
        let mut proposed = false;
        if self.flags.contains(DynListFlags::MATCH_LIST) {
            for name in &list {
                if name.starts_with(&token) {
                    comp.add_item(this, CompKind::Full, Some(&token), Some(name))?;
                    proposed = true;
                }
            }
        }
        // free form tokens admitted by the expression cannot be enumerated
        if !proposed && self.flags.contains(DynListFlags::MATCH_REGEXP) {
            complete_unknown(this, comp, input)?;
        }
        Ok(())
    }
}
