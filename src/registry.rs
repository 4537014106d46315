use crate::production::{
    AnyTok, Bypass, Cmd, Concat, Cond, DynList, Dynamic, EmptyProd, Expr, FilePath, IntLiteral,
    Literal, Once, Optional, ReLexer, Repeat, ShellLexer, SpaceTok, Subset, UintLiteral, Union,
    RegexField,
};
use crate::{ConfigSchema, ConfigValue, ErrorKind, GrammarError, IGrammar};
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::sync::Mutex;

/// Build a node of a registered type from a validated configuration value.
pub type NodeBuildFn =
    fn(Option<String>, &ConfigValue) -> Result<Rc<dyn IGrammar>, GrammarError>;

#[derive(Debug, Clone)]
/// The registry descriptor of a node type: a unique name, the configuration schema it accepts,
/// and a factory building an instance from a validated configuration.
///
/// Node types without a configuration surface (the callback based utilities) register without a
/// schema and cannot be built through [build_node].
pub struct NodeTypeInfo {
    pub name: &'static str,
    pub schema: Option<ConfigSchema>,
    pub build: NodeBuildFn,
}

static REGISTRY: Lazy<Mutex<Vec<NodeTypeInfo>>> = Lazy::new(|| Mutex::new(builtin_node_types()));

fn builtin_node_types() -> Vec<NodeTypeInfo> {
    let types = vec![
        Literal::node_type(),
        IntLiteral::node_type(),
        UintLiteral::node_type(),
        RegexField::node_type(),
        AnyTok::node_type(),
        EmptyProd::node_type(),
        SpaceTok::node_type(),
        FilePath::node_type(),
        Union::node_type(),
        Concat::node_type(),
        Subset::node_type(),
        Optional::node_type(),
        Repeat::node_type(),
        Once::node_type(),
        Bypass::node_type(),
        ReLexer::node_type(),
        ShellLexer::node_type(),
        Dynamic::node_type(),
        DynList::node_type(),
        Cmd::node_type(),
        Expr::node_type(),
        Cond::node_type(),
    ];
    for info in &types {
        if let Some(schema) = &info.schema {
            schema
                .check()
                .expect("builtin node type schemas are well formed");
        }
    }
    types
}

/// Register an additional node type.
///
/// A duplicate name is rejected unless `override_existing` is set, in which case the new type is
/// inserted at the head of the registry and shadows the previous registration.
pub fn register_node_type(
    info: NodeTypeInfo,
    override_existing: bool,
) -> Result<(), GrammarError> {
    if let Some(schema) = &info.schema {
        schema.check()?;
    }
    let mut registry = REGISTRY
        .lock()
        .expect("the node type registry is not poisoned");
    if registry.iter().any(|existing| existing.name == info.name) {
        if !override_existing {
            return Err(GrammarError::new(
                ErrorKind::AlreadyExists,
                "registry",
                format!("a node type named {:?} is already registered", info.name),
            ));
        }
        registry.insert(0, info);
    } else {
        registry.push(info);
    }
    Ok(())
}

/// Look a node type up by name; the most recent registration wins.
pub fn lookup_node_type(name: &str) -> Option<NodeTypeInfo> {
    REGISTRY
        .lock()
        .expect("the node type registry is not poisoned")
        .iter()
        .find(|info| info.name == name)
        .cloned()
}

/// Build a grammar node by type name, validating `config` against the type's schema.
pub fn build_node(
    type_name: &str,
    id: Option<&str>,
    config: &ConfigValue,
) -> Result<Rc<dyn IGrammar>, GrammarError> {
    let info = lookup_node_type(type_name).ok_or_else(|| {
        GrammarError::new(
            ErrorKind::NotFound,
            "registry",
            format!("no node type named {:?}", type_name),
        )
    })?;
    let schema = info.schema.as_ref().ok_or_else(|| {
        GrammarError::new(
            ErrorKind::NotPermitted,
            "registry",
            format!(
                "the {:?} node type cannot be built from a configuration",
                type_name
            ),
        )
    })?;
    schema.validate(config)?;
    (info.build)(id.map(str::to_string), config)
}
