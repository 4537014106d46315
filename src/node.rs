use crate::{
    complete, AttrDict, AttrValue, CommandFn, ErrorKind, GrammarError, HelpItem, IGrammar,
    NodeBase,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

// well known attribute keys consumed by line editor integrations
pub(crate) const ATTR_HELP: &str = "help";
pub(crate) const ATTR_DESC: &str = "desc";
pub(crate) const ATTR_CALLBACK: &str = "callback";

impl NodeBase {
    pub fn new() -> Self {
        Self {
            id: None,
            attrs: RefCell::new(AttrDict::new()),
        }
    }

    pub(crate) fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    /// The identity of the node; grammar nodes without an id cannot be found by
    /// [find](crate::find).
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn attr(&self, key: &str) -> Option<AttrValue> {
        self.attrs.borrow().get(key).cloned()
    }

    pub fn set_attr(&self, key: &str, value: AttrValue) {
        self.attrs.borrow_mut().insert(key.to_string(), value);
    }
}

impl Default for NodeBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first search for the first node of the grammar graph whose id equals `id`.
/// Cycles closed through [Bypass](crate::production::Bypass) nodes are visited once.
pub fn find(node: &Rc<dyn IGrammar>, id: &str) -> Option<Rc<dyn IGrammar>> {
    fn rec(
        node: &Rc<dyn IGrammar>,
        id: &str,
        visited: &mut HashSet<*const ()>,
    ) -> Option<Rc<dyn IGrammar>> {
        if !visited.insert(Rc::as_ptr(node) as *const ()) {
            return None;
        }
        if node.base().id() == Some(id) {
            return Some(node.clone());
        }
        for child in node.children() {
            if let Some(found) = rec(&child, id, visited) {
                return Some(found);
            }
        }
        None
    }
    rec(node, id, &mut HashSet::new())
}

/// Verify that a node has the expected registry type.
pub fn check_type(node: &Rc<dyn IGrammar>, type_name: &str) -> Result<(), GrammarError> {
    if node.type_name() != type_name {
        return Err(GrammarError::new(
            ErrorKind::InvalidArgument,
            "node",
            format!(
                "expected a {:?} node, got a {:?} node",
                type_name,
                node.type_name()
            ),
        ));
    }
    Ok(())
}

/// Attach a help string to a node, under the well known `help` attribute key.
pub fn set_help(node: &Rc<dyn IGrammar>, help: &str) {
    node.base().set_attr(ATTR_HELP, AttrValue::Str(help.to_string()));
}

/// Attach a short description to a node, under the well known `desc` attribute key.
pub fn set_desc(node: &Rc<dyn IGrammar>, desc: &str) {
    node.base().set_attr(ATTR_DESC, AttrValue::Str(desc.to_string()));
}

/// Attach a command callback to a node, under the well known `callback` attribute key.
/// The callback is not invoked by the library; interpreters fetch it with
/// [get_callback] after a successful parse.
pub fn set_callback(node: &Rc<dyn IGrammar>, callback: CommandFn) {
    node.base().set_attr(ATTR_CALLBACK, AttrValue::Callback(callback));
}

/// The command callback attached to a node, if any.
pub fn get_callback(node: &Rc<dyn IGrammar>) -> Option<CommandFn> {
    match node.base().attr(ATTR_CALLBACK) {
        Some(AttrValue::Callback(callback)) => Some(callback),
        _ => None,
    }
}

/// Collect the description/help pairs documenting the possible continuations of a partial input
/// line: each completion group's parse state is walked upwards until an annotated node is found.
pub fn get_helps(node: &Rc<dyn IGrammar>, line: &str) -> Result<Vec<HelpItem>, GrammarError> {
    let comp = complete(node, line)?;
    let mut helps: Vec<HelpItem> = Vec::new();
    for group in comp.groups() {
        let mut cursor = Some(group.pstate().clone());
        while let Some(pnode) = cursor {
            let grammar = pnode.grammar();
            if let Some(AttrValue::Str(help)) = grammar.base().attr(ATTR_HELP) {
                let desc = match grammar.base().attr(ATTR_DESC) {
                    Some(AttrValue::Str(desc)) => desc,
                    _ => grammar.describe(),
                };
                let item = HelpItem { desc, help };
                if !helps.contains(&item) {
                    helps.push(item);
                }
                break;
            }
            cursor = pnode.parent();
        }
    }
    Ok(helps)
}
