use crate::{ErrorKind, GrammarError, IGrammar};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Dictionary keys reserved for the node header; user schemas must not declare them.
pub(crate) const RESERVED_KEYS: [&str; 4] = ["id", "attrs", "help", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The type tag of a [ConfigValue].
pub enum ConfigKind {
    Bool,
    I64,
    U64,
    Str,
    Node,
    List,
    Dict,
}

#[derive(Clone)]
/// A typed, tree shaped configuration value used to build grammar nodes.
///
/// Values own their contents; a [Node](ConfigValue::Node) arm keeps a reference on the grammar
/// node it carries. Duplication is deep ([Clone]); comparison is structural, with nodes compared
/// by identity.
pub enum ConfigValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    Str(String),
    Node(Rc<dyn IGrammar>),
    List(Vec<ConfigValue>),
    Dict(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn kind(&self) -> ConfigKind {
        match self {
            ConfigValue::Bool(_) => ConfigKind::Bool,
            ConfigValue::I64(_) => ConfigKind::I64,
            ConfigValue::U64(_) => ConfigKind::U64,
            ConfigValue::Str(_) => ConfigKind::Str,
            ConfigValue::Node(_) => ConfigKind::Node,
            ConfigValue::List(_) => ConfigKind::List,
            ConfigValue::Dict(_) => ConfigKind::Dict,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ConfigValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Rc<dyn IGrammar>> {
        match self {
            ConfigValue::Node(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Dict(v) => Some(v),
            _ => None,
        }
    }

    /// Fetch a value of a dict configuration by key.
    pub fn dict_get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_dict().and_then(|dict| dict.get(key))
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConfigValue::Bool(a), ConfigValue::Bool(b)) => a == b,
            (ConfigValue::I64(a), ConfigValue::I64(b)) => a == b,
            (ConfigValue::U64(a), ConfigValue::U64(b)) => a == b,
            (ConfigValue::Str(a), ConfigValue::Str(b)) => a == b,
            (ConfigValue::Node(a), ConfigValue::Node(b)) => Rc::ptr_eq(a, b),
            (ConfigValue::List(a), ConfigValue::List(b)) => a == b,
            (ConfigValue::Dict(a), ConfigValue::Dict(b)) => a == b,
            _ => false,
        }
    }
}

impl Debug for ConfigValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Bool(v) => write!(f, "{}", v),
            ConfigValue::I64(v) => write!(f, "{}", v),
            ConfigValue::U64(v) => write!(f, "{}", v),
            ConfigValue::Str(v) => write!(f, "{:?}", v),
            ConfigValue::Node(v) => write!(f, "{}", v.describe()),
            ConfigValue::List(v) => f.debug_list().entries(v.iter()).finish(),
            ConfigValue::Dict(v) => f.debug_map().entries(v.iter()).finish(),
        }
    }
}

#[derive(Debug, Clone)]
/// One entry of a configuration schema.
///
/// Entries of a dict schema carry a key; a list schema has exactly one keyless entry describing
/// its element type.
pub struct SchemaEntry {
    key: Option<String>,
    desc: String,
    kind: ConfigKind,
    subschema: Vec<SchemaEntry>,
    mandatory: bool,
}

impl SchemaEntry {
    /// Create a keyed entry for a dict schema.
    pub fn new(key: &str, desc: &str, kind: ConfigKind) -> Self {
        Self {
            key: Some(key.to_string()),
            desc: desc.to_string(),
            kind,
            subschema: Vec::new(),
            mandatory: false,
        }
    }

    /// Create the keyless element entry of a list schema.
    pub fn element(desc: &str, kind: ConfigKind) -> Self {
        Self {
            key: None,
            desc: desc.to_string(),
            kind,
            subschema: Vec::new(),
            mandatory: false,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn with_subschema(mut self, subschema: Vec<SchemaEntry>) -> Self {
        self.subschema = subschema;
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn kind(&self) -> ConfigKind {
        self.kind
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }
}

#[derive(Debug, Clone, Default)]
/// The dict schema a node type declares for its configuration.
pub struct ConfigSchema {
    entries: Vec<SchemaEntry>,
}

fn check_entries(entries: &[SchemaEntry], dict_context: bool) -> Result<(), GrammarError> {
    if !dict_context && entries.len() != 1 {
        return Err(GrammarError::new(
            ErrorKind::BadFormat,
            "schema",
            "a list schema requires exactly one element entry",
        ));
    }
    let mut seen: Vec<&str> = Vec::new();
    for entry in entries {
        match (&entry.key, dict_context) {
            (Some(key), true) => {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    return Err(GrammarError::new(
                        ErrorKind::NotPermitted,
                        "schema",
                        format!("key {:?} is reserved", key),
                    ));
                }
                if seen.contains(&key.as_str()) {
                    return Err(GrammarError::new(
                        ErrorKind::AlreadyExists,
                        "schema",
                        format!("key {:?} is declared twice", key),
                    ));
                }
                seen.push(key);
            }
            (None, true) => {
                return Err(GrammarError::new(
                    ErrorKind::BadFormat,
                    "schema",
                    "a dict schema entry requires a key",
                ));
            }
            (Some(key), false) => {
                return Err(GrammarError::new(
                    ErrorKind::BadFormat,
                    "schema",
                    format!("a list element entry cannot have a key ({:?})", key),
                ));
            }
            (None, false) => {}
        }
        match entry.kind {
            ConfigKind::List => check_entries(&entry.subschema, false)?,
            ConfigKind::Dict => check_entries(&entry.subschema, true)?,
            _ => {
                if !entry.subschema.is_empty() {
                    return Err(GrammarError::new(
                        ErrorKind::BadFormat,
                        "schema",
                        "only list and dict entries can declare a subschema",
                    ));
                }
            }
        }
    }
    Ok(())
}

fn validate_value(entry: &SchemaEntry, value: &ConfigValue) -> Result<(), GrammarError> {
    if entry.kind != value.kind() {
        return Err(GrammarError::new(
            ErrorKind::BadFormat,
            "config",
            format!(
                "expected a {:?} value for {:?}, got {:?}",
                entry.kind,
                entry.key().unwrap_or("element"),
                value.kind()
            ),
        ));
    }
    match value {
        ConfigValue::List(list) => {
            let element_entry = entry.subschema.first().ok_or_else(|| {
                GrammarError::new(
                    ErrorKind::BadFormat,
                    "schema",
                    "a list entry is missing its element schema",
                )
            })?;
            for element in list {
                validate_value(element_entry, element)?;
            }
            Ok(())
        }
        ConfigValue::Dict(_) => validate_dict(&entry.subschema, value),
        _ => Ok(()),
    }
}

fn validate_dict(entries: &[SchemaEntry], value: &ConfigValue) -> Result<(), GrammarError> {
    let dict = value.as_dict().ok_or_else(|| {
        GrammarError::new(
            ErrorKind::BadFormat,
            "config",
            "a dict configuration value is required",
        )
    })?;
    for (key, element) in dict {
        let entry = entries
            .iter()
            .find(|entry| entry.key() == Some(key.as_str()))
            .ok_or_else(|| {
                GrammarError::new(
                    ErrorKind::BadFormat,
                    "config",
                    format!("unexpected key {:?}", key),
                )
            })?;
        validate_value(entry, element)?;
    }
    for entry in entries {
        if entry.mandatory && !dict.contains_key(entry.key().unwrap_or_default()) {
            return Err(GrammarError::new(
                ErrorKind::BadFormat,
                "config",
                format!("mandatory key {:?} is missing", entry.key().unwrap_or_default()),
            ));
        }
    }
    Ok(())
}

impl ConfigSchema {
    pub fn new(entries: Vec<SchemaEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Verify that the schema itself is well formed; run once when the node type is registered.
    pub fn check(&self) -> Result<(), GrammarError> {
        check_entries(&self.entries, true)
    }

    /// Validate a runtime configuration value against the schema.
    pub fn validate(&self, value: &ConfigValue) -> Result<(), GrammarError> {
        validate_dict(&self.entries, value)
    }
}
