use crate::production::{GrammarLogger, IntLiteral, UintLiteral};
use crate::{
    ConfigKind, ConfigSchema, ConfigValue, ErrorKind, GrammarError, IGrammar, NodeBase,
    NodeTypeInfo, ParseMatch, ParseNode, ParseResult, SchemaEntry, StrVec,
};
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use std::rc::Rc;

/// Split the radix prefix of a numeric token: radix 0 auto-detects `0x` hexadecimal and
/// leading-zero octal the way the C library does, radix 16 tolerates an explicit `0x`.
fn strip_radix_prefix(digits: &str, radix: u32) -> (u32, &str) {
    match radix {
        0 => {
            if digits.starts_with("0x") || digits.starts_with("0X") {
                (16, &digits[2..])
            } else if digits.len() > 1 && digits.starts_with('0') {
                (8, &digits[1..])
            } else {
                (10, digits)
            }
        }
        16 => {
            if digits.starts_with("0x") || digits.starts_with("0X") {
                (16, &digits[2..])
            } else {
                (16, digits)
            }
        }
        radix => (radix, digits),
    }
}

fn accumulate(digits: &str, radix: u32) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    let mut value: u64 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(radix)?;
        value = value.checked_mul(radix as u64)?.checked_add(digit as u64)?;
    }
    Some(value)
}

fn check_radix(radix: u32, what: &'static str) -> Result<(), GrammarError> {
    if radix == 0 || (2..=36).contains(&radix) {
        Ok(())
    } else {
        Err(GrammarError::new(
            ErrorKind::InvalidArgument,
            what,
            format!("{} is not a valid radix", radix),
        ))
    }
}

fn parse_i64_token(token: &str, radix: u32) -> Option<i64> {
    let (negative, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let (radix, digits) = strip_radix_prefix(rest, radix);
    let value = accumulate(digits, radix)?;
    let signed = if negative {
        -(value as i128)
    } else {
        value as i128
    };
    if signed < i64::MIN as i128 || signed > i64::MAX as i128 {
        return None;
    }
    Some(signed as i64)
}

fn parse_u64_token(token: &str, radix: u32) -> Option<u64> {
    let rest = token.strip_prefix('+').unwrap_or(token);
    if rest.starts_with('-') {
        return None;
    }
    let (radix, digits) = strip_radix_prefix(rest, radix);
    accumulate(digits, radix)
}

impl IntLiteral {
    /// Create an [IntLiteral] utility accepting one signed integer token within
    /// `[min, max]` (either bound may be lifted) in the given radix; radix 0 auto-detects.
    pub fn new(min: Option<i64>, max: Option<i64>, radix: u32) -> Self {
        Self {
            base: NodeBase::new(),
            min,
            max,
            radix,
            debugger: OnceCell::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub fn assign_debugger(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }

    /// Extract the value matched by this node inside a parse tree.
    pub fn value(&self, pnode: &ParseNode) -> Result<i64, GrammarError> {
        let vec = pnode.strvec().ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "int", "the node did not match")
        })?;
        let token = vec.get(0).ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "int", "the match is empty")
        })?;
        parse_i64_token(token, self.radix).ok_or_else(|| {
            GrammarError::new(
                ErrorKind::BadFormat,
                "int",
                format!("{:?} is not an integer", token),
            )
        })
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "int",
            schema: Some(ConfigSchema::new(vec![
                SchemaEntry::new("min", "The minimum valid value (included).", ConfigKind::I64),
                SchemaEntry::new("max", "The maximum valid value (included).", ConfigKind::I64),
                SchemaEntry::new(
                    "base",
                    "The radix to use. If unset or 0, try to guess.",
                    ConfigKind::U64,
                ),
            ])),
            build: |id, config| {
                let min = config.dict_get("min").and_then(ConfigValue::as_i64);
                let max = config.dict_get("max").and_then(ConfigValue::as_i64);
                let radix = config
                    .dict_get("base")
                    .and_then(ConfigValue::as_u64)
                    .unwrap_or(0) as u32;
                check_radix(radix, "int")?;
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(GrammarError::new(
                            ErrorKind::InvalidArgument,
                            "int",
                            format!("the range [{}, {}] is empty", min, max),
                        ));
                    }
                }
                let mut node = IntLiteral::new(min, max, radix);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for IntLiteral {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for IntLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "int")
    }
}

impl IGrammar for IntLiteral {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "int"
    }

    fn parse(&self, _state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        check_radix(self.radix, "int")?;
        let result = match input.get(0).and_then(|token| parse_i64_token(token, self.radix)) {
            Some(value)
                if self.min.map_or(true, |min| value >= min)
                    && self.max.map_or(true, |max| value <= max) =>
            {
                Ok(ParseMatch::Consumed(1))
            }
            _ => Ok(ParseMatch::NoMatch),
        };

        #[cfg(debug_assertions)]
        self.log_result(input, &result);

        result
    }
}

impl UintLiteral {
    /// Create a [UintLiteral] utility accepting one unsigned integer token; a minus sign is
    /// always rejected.
    pub fn new(min: Option<u64>, max: Option<u64>, radix: u32) -> Self {
        Self {
            base: NodeBase::new(),
            min,
            max,
            radix,
            debugger: OnceCell::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub fn assign_debugger(&self, debugger: crate::Log<&'static str>) -> Result<(), String> {
        self.debugger
            .set(debugger)
            .map_err(|err| format!("Debugger {} is already set for this production.", err))
    }

    /// Extract the value matched by this node inside a parse tree.
    pub fn value(&self, pnode: &ParseNode) -> Result<u64, GrammarError> {
        let vec = pnode.strvec().ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "uint", "the node did not match")
        })?;
        let token = vec.get(0).ok_or_else(|| {
            GrammarError::new(ErrorKind::InvalidArgument, "uint", "the match is empty")
        })?;
        parse_u64_token(token, self.radix).ok_or_else(|| {
            GrammarError::new(
                ErrorKind::BadFormat,
                "uint",
                format!("{:?} is not an unsigned integer", token),
            )
        })
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "uint",
            schema: Some(ConfigSchema::new(vec![
                SchemaEntry::new("min", "The minimum valid value (included).", ConfigKind::U64),
                SchemaEntry::new("max", "The maximum valid value (included).", ConfigKind::U64),
                SchemaEntry::new(
                    "base",
                    "The radix to use. If unset or 0, try to guess.",
                    ConfigKind::U64,
                ),
            ])),
            build: |id, config| {
                let min = config.dict_get("min").and_then(ConfigValue::as_u64);
                let max = config.dict_get("max").and_then(ConfigValue::as_u64);
                let radix = config
                    .dict_get("base")
                    .and_then(ConfigValue::as_u64)
                    .unwrap_or(0) as u32;
                check_radix(radix, "uint")?;
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(GrammarError::new(
                            ErrorKind::InvalidArgument,
                            "uint",
                            format!("the range [{}, {}] is empty", min, max),
                        ));
                    }
                }
                let mut node = UintLiteral::new(min, max, radix);
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl GrammarLogger for UintLiteral {
    fn get_debugger(&self) -> Option<&crate::Log<&'static str>> {
        self.debugger.get()
    }
}

impl Display for UintLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "uint")
    }
}

impl IGrammar for UintLiteral {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "uint"
    }

    fn parse(&self, _state: &ParseNode, input: &StrVec) -> ParseResult {
        #[cfg(debug_assertions)]
        self.log_entry();

        check_radix(self.radix, "uint")?;
        let result = match input.get(0).and_then(|token| parse_u64_token(token, self.radix)) {
            Some(value)
                if self.min.map_or(true, |min| value >= min)
                    && self.max.map_or(true, |max| value <= max) =>
            {
                Ok(ParseMatch::Consumed(1))
            }
            _ => Ok(ParseMatch::NoMatch),
        };

        #[cfg(debug_assertions)]
        self.log_result(input, &result);

        result
    }
}
