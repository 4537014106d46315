use crate::AttrValue;
use std::fmt::{Debug, Formatter};

impl AttrValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Debug for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Flag => write!(f, "Flag"),
            AttrValue::Int(n) => write!(f, "Int({})", n),
            AttrValue::Str(s) => write!(f, "Str({:?})", s),
            AttrValue::Node(node) => write!(f, "Node({})", node.describe()),
            AttrValue::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Flag, AttrValue::Flag) => true,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Node(a), AttrValue::Node(b)) => std::rc::Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
