use crate::{
    AttrValue, CompGroup, CompItem, CompKind, CompKindMask, Completion, ErrorKind, GrammarError,
    IGrammar, ParseNode, StrVec,
};
use std::ops::BitOr;
use std::rc::Rc;

impl From<CompKind> for CompKindMask {
    fn from(kind: CompKind) -> Self {
        match kind {
            CompKind::Full => CompKindMask::FULL,
            CompKind::Partial => CompKindMask::PARTIAL,
            CompKind::Unknown => CompKindMask::UNKNOWN,
        }
    }
}

impl BitOr for CompKindMask {
    type Output = CompKindMask;

    fn bitor(self, rhs: CompKindMask) -> CompKindMask {
        CompKindMask(self.0 | rhs.0)
    }
}

impl CompKindMask {
    pub const NONE: CompKindMask = CompKindMask(0);
    pub const FULL: CompKindMask = CompKindMask(1);
    pub const PARTIAL: CompKindMask = CompKindMask(1 << 1);
    pub const UNKNOWN: CompKindMask = CompKindMask(1 << 2);
    pub const ALL: CompKindMask = CompKindMask(0b111);

    pub fn contains(self, kind: CompKind) -> bool {
        self.0 & CompKindMask::from(kind).0 != 0
    }
}

impl CompItem {
    /// The proposed token as if fully typed; absent for unknown items.
    pub fn str(&self) -> Option<&str> {
        self.full.as_deref()
    }

    /// The prefix the proposal was computed from.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The characters to append to the current token to obtain the full proposal.
    pub fn completion(&self) -> Option<&str> {
        self.completion.as_deref()
    }

    /// What completion interfaces should display for this proposal.
    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn kind(&self) -> CompKind {
        self.kind
    }

    fn check_mutable(&self) -> Result<(), GrammarError> {
        if self.kind == CompKind::Unknown {
            return Err(GrammarError::new(
                ErrorKind::InvalidArgument,
                "comp",
                "an unknown completion item has no proposal to mutate",
            ));
        }
        Ok(())
    }

    /// Replace the proposed token (used by lexer bridges to re-quote proposals).
    pub fn set_str(&mut self, value: &str) -> Result<(), GrammarError> {
        self.check_mutable()?;
        self.full = Some(value.to_string());
        Ok(())
    }

    pub fn set_completion(&mut self, value: &str) -> Result<(), GrammarError> {
        self.check_mutable()?;
        self.completion = Some(value.to_string());
        Ok(())
    }

    pub fn set_display(&mut self, value: &str) -> Result<(), GrammarError> {
        self.check_mutable()?;
        self.display = Some(value.to_string());
        Ok(())
    }
}

impl CompGroup {
    /// The grammar node whose completion produced this group.
    pub fn node(&self) -> &Rc<dyn IGrammar> {
        &self.node
    }

    /// The parse state at the suggestion point; a private copy, never the live parse.
    pub fn pstate(&self) -> &ParseNode {
        &self.pstate
    }

    pub fn attrs(&self) -> &crate::AttrDict {
        &self.attrs
    }

    pub fn items(&self) -> &[CompItem] {
        &self.items
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl Completion {
    pub fn new() -> Self {
        Self {
            count_full: 0,
            count_partial: 0,
            count_unknown: 0,
            next_gid: 0,
            groups: Vec::new(),
            cur_pstate: None,
            cur_group: None,
            attrs: Default::default(),
        }
    }

    /// The copy-on-read parse state of the node currently completing; context dependent nodes
    /// inspect it to decide what to propose.
    pub fn cur_pstate(&self) -> Option<&ParseNode> {
        self.cur_pstate.as_ref()
    }

    pub fn groups(&self) -> &[CompGroup] {
        &self.groups
    }

    /// The number of recorded items whose kind belongs to `mask`.
    pub fn count(&self, mask: CompKindMask) -> usize {
        let mut count = 0;
        if mask.contains(CompKind::Full) {
            count += self.count_full;
        }
        if mask.contains(CompKind::Partial) {
            count += self.count_partial;
        }
        if mask.contains(CompKind::Unknown) {
            count += self.count_unknown;
        }
        count
    }

    pub fn iter(&self, mask: CompKindMask) -> impl Iterator<Item = &CompItem> {
        self.groups
            .iter()
            .flat_map(|group| group.items.iter())
            .filter(move |item| mask.contains(item.kind))
    }

    pub fn iter_mut(&mut self, mask: CompKindMask) -> impl Iterator<Item = &mut CompItem> {
        self.groups
            .iter_mut()
            .flat_map(|group| group.items.iter_mut())
            .filter(move |item| mask.contains(item.kind))
    }

    pub fn attr(&self, key: &str) -> Option<AttrValue> {
        self.attrs.get(key).cloned()
    }

    pub fn set_attr(&mut self, key: &str, value: AttrValue) {
        self.attrs.insert(key.to_string(), value);
    }

    /// Record a completion proposal for `node`.
    ///
    /// `current` and `full` are both absent for an [Unknown](CompKind::Unknown) item; otherwise
    /// `current` must be a prefix of `full` and the appended characters are derived from the
    /// two.
    /// Consecutive proposals of one node land in the same group; a fresh group snapshots the
    /// current parse state.
    pub fn add_item(
        &mut self,
        node: &Rc<dyn IGrammar>,
        kind: CompKind,
        current: Option<&str>,
        full: Option<&str>,
    ) -> Result<(), GrammarError> {
        let item = match (kind, current, full) {
            (CompKind::Unknown, None, None) => CompItem {
                kind,
                current: None,
                full: None,
                completion: None,
                display: None,
            },
            (CompKind::Unknown, _, _) => {
                return Err(GrammarError::new(
                    ErrorKind::InvalidArgument,
                    "comp",
                    "an unknown completion item cannot carry a proposal",
                ));
            }
            (_, Some(current), Some(full)) => {
                if !full.starts_with(current) {
                    return Err(GrammarError::new(
                        ErrorKind::InvalidArgument,
                        "comp",
                        format!("{:?} is not a prefix of {:?}", current, full),
                    ));
                }
                CompItem {
                    kind,
                    current: Some(current.to_string()),
                    full: Some(full.to_string()),
                    completion: Some(full[current.len()..].to_string()),
                    display: Some(full.to_string()),
                }
            }
            _ => {
                return Err(GrammarError::new(
                    ErrorKind::InvalidArgument,
                    "comp",
                    "a full or partial completion item requires both current and full",
                ));
            }
        };

        let group_pos = match self.cur_group {
            Some(gid) => self
                .groups
                .iter()
                .position(|group| group.gid == gid)
                .expect("the current completion group is always present"),
            None => {
                let pstate = match &self.cur_pstate {
                    Some(pstate) => pstate.duplicate(),
                    None => {
                        return Err(GrammarError::new(
                            ErrorKind::InvalidArgument,
                            "comp",
                            "completion items can only be added during a completion dispatch",
                        ));
                    }
                };
                let gid = self.next_gid;
                self.next_gid += 1;
                let group = CompGroup {
                    gid,
                    node: node.clone(),
                    pstate,
                    attrs: Default::default(),
                    items: Vec::new(),
                };
                // keep groups ordered by their first proposal
                let pos = self
                    .groups
                    .iter()
                    .position(|g| match (g.items.first(), &item.full) {
                        (Some(first), Some(full)) => {
                            first.full.as_deref().map_or(false, |s| s > full.as_str())
                        }
                        _ => false,
                    })
                    .unwrap_or(self.groups.len());
                self.groups.insert(pos, group);
                self.cur_group = Some(gid);
                pos
            }
        };

        match kind {
            CompKind::Full => self.count_full += 1,
            CompKind::Partial => self.count_partial += 1,
            CompKind::Unknown => self.count_unknown += 1,
        }

        let group = &mut self.groups[group_pos];
        let pos = group
            .items
            .iter()
            .position(|existing| match (&existing.full, &item.full) {
                (Some(existing), Some(new)) => existing > new,
                _ => false,
            })
            .unwrap_or(group.items.len());
        group.items.insert(pos, item);
        Ok(())
    }

    /// Transfer every group of `src` into this completion tree.
    pub fn merge(&mut self, src: Completion) {
        self.count_full += src.count_full;
        self.count_partial += src.count_partial;
        self.count_unknown += src.count_unknown;
        for mut group in src.groups {
            group.gid = self.next_gid;
            self.next_gid += 1;
            self.groups.push(group);
        }
    }
}

/// Compute the completions of a raw input line; as for [parse](crate::parse), the line is wrapped
/// in a one element token vector.
pub fn complete(node: &Rc<dyn IGrammar>, line: &str) -> Result<Completion, GrammarError> {
    let mut vec = StrVec::new();
    vec.push(line);
    complete_strvec(node, &vec)
}

/// Compute the completions of a token vector.
pub fn complete_strvec(
    node: &Rc<dyn IGrammar>,
    input: &StrVec,
) -> Result<Completion, GrammarError> {
    let mut comp = Completion::new();
    complete_child(node, &mut comp, input)?;
    Ok(comp)
}

/// Dispatch a completion to `node`, accumulating proposals into `comp`.
///
/// Mirrors [parse_child](crate::parse_child): a parse state node is linked for the child during
/// the dispatch so context dependent nodes can inspect the in-progress parse, then removed; the
/// current group is reset so the child's proposals are grouped under it.
pub fn complete_child(
    node: &Rc<dyn IGrammar>,
    comp: &mut Completion,
    input: &StrVec,
) -> Result<(), GrammarError> {
    let child_pstate = ParseNode::new(node.clone());
    let saved_pstate = comp.cur_pstate.take();
    if let Some(parent) = &saved_pstate {
        parent.link_child(&child_pstate);
    }
    comp.cur_pstate = Some(child_pstate.clone());
    let saved_group = comp.cur_group.take();

    let ret = node.complete(node, comp, input);

    if let Some(parent) = &saved_pstate {
        parent.unlink_child(&child_pstate);
        debug_assert!(child_pstate.first_child().is_none());
    }
    comp.cur_pstate = saved_pstate;
    comp.cur_group = saved_group;
    ret
}

/// The default completion of a node that cannot enumerate proposals: one unknown item when the
/// input holds a single token.
pub fn complete_unknown(
    node: &Rc<dyn IGrammar>,
    comp: &mut Completion,
    input: &StrVec,
) -> Result<(), GrammarError> {
    if input.len() != 1 {
        return Ok(());
    }
    comp.add_item(node, CompKind::Unknown, None, None)
}

/// Expand every position of `input` whose completion is unambiguous under `mask` to its full
/// form; idempotent on its own output.
pub fn complete_strvec_expand(
    node: &Rc<dyn IGrammar>,
    mask: CompKindMask,
    input: &StrVec,
) -> Result<StrVec, GrammarError> {
    let mut expanded = StrVec::new();
    for index in 0..input.len() {
        let current = input.get(index).expect("index is in range").to_string();
        expanded.push(&current);
        let comp = complete_strvec(node, &expanded)?;
        if comp.count(mask) == 1 {
            if let Some(item) = comp.iter(mask).next() {
                if let Some(full) = item.str() {
                    if full != current {
                        expanded.set(index, full)?;
                    }
                }
            }
        }
    }
    Ok(expanded)
}
