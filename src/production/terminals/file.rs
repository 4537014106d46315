use crate::production::{FileBrowser, FilePath, StdFileBrowser};
use crate::{
    CompKind, Completion, ConfigSchema, GrammarError, IGrammar, NodeBase, NodeTypeInfo,
    ParseMatch, ParseNode, ParseResult, StrVec,
};
use std::fmt::Display;
use std::fs;
use std::rc::Rc;

impl FileBrowser for StdFileBrowser {
    fn is_dir(&self, path: &str) -> std::io::Result<bool> {
        Ok(fs::metadata(path)?.is_dir())
    }

    fn read_dir(&self, path: &str) -> std::io::Result<Vec<(String, bool)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let is_dir = entry.file_type()?.is_dir();
            entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        Ok(entries)
    }
}

impl FilePath {
    /// Create a [FilePath] utility browsing the real filesystem.
    pub fn new() -> Self {
        Self::with_browser(Rc::new(StdFileBrowser))
    }

    /// Create a [FilePath] utility with an injected [FileBrowser], so completion behavior is
    /// deterministic under test.
    pub fn with_browser(browser: Rc<dyn FileBrowser>) -> Self {
        Self {
            base: NodeBase::new(),
            browser,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.set_id(Some(id.into()));
        self
    }

    pub(crate) fn node_type() -> NodeTypeInfo {
        NodeTypeInfo {
            name: "file",
            schema: Some(ConfigSchema::new(Vec::new())),
            build: |id, _config| {
                let mut node = FilePath::new();
                node.base.set_id(id);
                Ok(Rc::new(node))
            },
        }
    }
}

impl Default for FilePath {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file")
    }
}

impl IGrammar for FilePath {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn type_name(&self) -> &'static str {
        "file"
    }

    fn parse(&self, _state: &ParseNode, input: &StrVec) -> ParseResult {
        if input.is_empty() {
            Ok(ParseMatch::NoMatch)
        } else {
            Ok(ParseMatch::Consumed(1))
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
        let token = input.get(0).expect("one token is present");
        let (dir_part, base_part) = match token.rfind('/') {
            Some(index) => (&token[..=index], &token[index + 1..]),
            None => ("", token),
        };
        let dir_path = if dir_part.is_empty() { "." } else { dir_part };
        let entries = match self.browser.read_dir(dir_path) {
            Ok(entries) => entries,
            // an unreadable directory simply yields no proposal
            Err(_) => return Ok(()),
        };
        for (name, is_dir) in entries {
            if name == "." || name == ".." {
                continue;
            }
            if name.starts_with('.') && !base_part.starts_with('.') {
                continue;
            }
            if !name.starts_with(base_part) {
                continue;
            }
            let full = format!("{}{}{}", dir_part, name, if is_dir { "/" } else { "" });
            let kind = if is_dir {
                CompKind::Partial
            } else {
                CompKind::Full
            };
            comp.add_item(this, kind, Some(token), Some(&full))?;
        }
        Ok(())
    }
}
