//! A small IP pool command line: `pool list|add|del <name>`, `addr pool <name> list|add|del
//! <a.b.c.d>` and `exit`, driving an in-memory store.
//!
//! The grammar demonstrates how one graph serves parsing, dispatching (through node callbacks)
//! and completion: the [DynList](crate::production::DynList) utilities propose the pool names
//! and addresses currently present in the store.

use crate::production::{Concat, DynList, DynListBuildFn, DynListFlags, Literal, ShellLexer, Union};
use crate::{
    get_callback, parse, set_callback, set_desc, set_help, CommandFn, GrammarError, IGrammar,
    ParseNode,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

pub const POOL_REGEXP: &str = "[A-Za-z][-_a-zA-Z0-9]+";
pub const IP_REGEXP: &str =
    "((25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9][0-9]|[0-9])\\.){3}(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9][0-9]|[0-9])";

const ID_POOL_NAME: &str = "id_pool_name";
const ID_ADDR: &str = "id_addr";

/// A very simple in-memory IP pool store.
#[derive(Default)]
pub struct IpPoolStore {
    pools: RefCell<BTreeMap<String, Vec<String>>>,
}

impl IpPoolStore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn pool_names(&self) -> Vec<String> {
        self.pools.borrow().keys().cloned().collect()
    }

    pub fn add_pool(&self, name: &str) -> bool {
        self.pools
            .borrow_mut()
            .insert(name.to_string(), Vec::new())
            .is_none()
    }

    pub fn del_pool(&self, name: &str) -> bool {
        self.pools.borrow_mut().remove(name).is_some()
    }

    pub fn addrs(&self, pool: &str) -> Vec<String> {
        self.pools
            .borrow()
            .get(pool)
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_addr(&self, pool: &str, addr: &str) -> bool {
        let mut pools = self.pools.borrow_mut();
        match pools.get_mut(pool) {
            Some(addrs) if !addrs.iter().any(|a| a == addr) => {
                addrs.push(addr.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn del_addr(&self, pool: &str, addr: &str) -> bool {
        let mut pools = self.pools.borrow_mut();
        match pools.get_mut(pool) {
            Some(addrs) => {
                let before = addrs.len();
                addrs.retain(|a| a != addr);
                addrs.len() != before
            }
            None => false,
        }
    }
}

fn with_help(node: Rc<dyn IGrammar>, help: &str) -> Rc<dyn IGrammar> {
    set_help(&node, help);
    node
}

fn with_desc(node: Rc<dyn IGrammar>, desc: &str) -> Rc<dyn IGrammar> {
    set_desc(&node, desc);
    node
}

fn with_cb(node: Rc<dyn IGrammar>, callback: CommandFn) -> Rc<dyn IGrammar> {
    set_callback(&node, callback);
    node
}

fn found_token(parse: &ParseNode, id: &str) -> Option<String> {
    parse
        .find(id)
        .and_then(|pnode| pnode.strvec())
        .and_then(|vec| vec.get(0).map(str::to_string))
}

/// The interactive IP pool command line: grammar, store and exit flag.
pub struct IpPoolCli {
    grammar: Rc<dyn IGrammar>,
    store: Rc<IpPoolStore>,
    done: Rc<Cell<bool>>,
}

fn pool_commands(store: &Rc<IpPoolStore>) -> Result<Rc<dyn IGrammar>, GrammarError> {
    let list_store = store.clone();
    let list_cb: CommandFn = Rc::new(move |_parse| {
        for name in list_store.pool_names() {
            println!("{}", name);
        }
    });

    let add_store = store.clone();
    let add_cb: CommandFn = Rc::new(move |parse| {
        if let Some(name) = found_token(parse, ID_POOL_NAME) {
            if !add_store.add_pool(&name) {
                eprintln!("Failed to add pool");
            }
        }
    });

    let del_store = store.clone();
    let del_cb: CommandFn = Rc::new(move |parse| {
        if let Some(name) = found_token(parse, ID_POOL_NAME) {
            if !del_store.del_pool(&name) {
                eprintln!("Failed to delete pool");
            }
        }
    });

    let names_store = store.clone();
    let pool_names: DynListBuildFn =
        Rc::new(move |_pstate: &ParseNode| Ok(names_store.pool_names()));

    // a new pool name matches the regexp but must not exist yet
    let new_pool = Rc::new(
        DynList::new(
            pool_names.clone(),
            Some(POOL_REGEXP),
            DynListFlags::MATCH_REGEXP | DynListFlags::EXCLUDE_LIST,
        )?
        .with_id(ID_POOL_NAME),
    );
    let known_pool = Rc::new(
        DynList::new(pool_names, Some(POOL_REGEXP), DynListFlags::MATCH_LIST)?
            .with_id(ID_POOL_NAME),
    );

    let subcommands: Rc<dyn IGrammar> = Rc::new(Union::new(vec![
        with_cb(
            with_help(
                Rc::new(Literal::new("list")),
                "Display the list of IP pools",
            ),
            list_cb,
        ),
        with_cb(
            Rc::new(Concat::new(vec![
                with_help(Rc::new(Literal::new("add")), "Create an IP pool"),
                with_help(
                    with_desc(new_pool, "<pool-name>"),
                    "The name of the pool to create",
                ),
            ])),
            add_cb,
        ),
        with_cb(
            Rc::new(Concat::new(vec![
                with_help(Rc::new(Literal::new("del")), "Delete an IP pool"),
                with_help(
                    with_desc(known_pool, "<pool-name>"),
                    "The name of the pool to delete",
                ),
            ])),
            del_cb,
        ),
    ]));

    Ok(Rc::new(Concat::new(vec![
        with_help(
            Rc::new(Literal::new("pool")),
            "Add, delete, or list pools",
        ),
        subcommands,
    ])))
}

fn addr_commands(store: &Rc<IpPoolStore>) -> Result<Rc<dyn IGrammar>, GrammarError> {
    let list_store = store.clone();
    let list_cb: CommandFn = Rc::new(move |parse| {
        if let Some(pool) = found_token(parse, ID_POOL_NAME) {
            for addr in list_store.addrs(&pool) {
                println!("{}", addr);
            }
        }
    });

    let add_store = store.clone();
    let add_cb: CommandFn = Rc::new(move |parse| {
        let pool = found_token(parse, ID_POOL_NAME);
        let addr = found_token(parse, ID_ADDR);
        if let (Some(pool), Some(addr)) = (pool, addr) {
            if !add_store.add_addr(&pool, &addr) {
                eprintln!("Failed to add address to pool");
            }
        }
    });

    let del_store = store.clone();
    let del_cb: CommandFn = Rc::new(move |parse| {
        let pool = found_token(parse, ID_POOL_NAME);
        let addr = found_token(parse, ID_ADDR);
        if let (Some(pool), Some(addr)) = (pool, addr) {
            if !del_store.del_addr(&pool, &addr) {
                eprintln!("Failed to delete address from pool");
            }
        }
    });

    let names_store = store.clone();
    let pool_names: DynListBuildFn =
        Rc::new(move |_pstate: &ParseNode| Ok(names_store.pool_names()));
    let known_pool = Rc::new(
        DynList::new(pool_names, Some(POOL_REGEXP), DynListFlags::MATCH_LIST)?
            .with_id(ID_POOL_NAME),
    );

    // the address list depends on the pool named earlier on the same line
    let addrs_store = store.clone();
    let pool_addrs: DynListBuildFn = Rc::new(move |pstate: &ParseNode| {
        let pool = found_token(&pstate.root(), ID_POOL_NAME);
        Ok(match pool {
            Some(pool) => addrs_store.addrs(&pool),
            None => Vec::new(),
        })
    });

    let new_addr = Rc::new(
        DynList::new(
            pool_addrs.clone(),
            Some(IP_REGEXP),
            DynListFlags::MATCH_REGEXP | DynListFlags::EXCLUDE_LIST,
        )?
        .with_id(ID_ADDR),
    );
    let known_addr = Rc::new(
        DynList::new(pool_addrs, Some(IP_REGEXP), DynListFlags::MATCH_LIST)?.with_id(ID_ADDR),
    );

    let subcommands: Rc<dyn IGrammar> = Rc::new(Union::new(vec![
        with_cb(
            with_help(
                Rc::new(Literal::new("list")),
                "Display the list of IP addresses in a pool",
            ),
            list_cb,
        ),
        Rc::new(Concat::new(vec![
            with_cb(
                with_help(
                    Rc::new(Literal::new("add")),
                    "Add an IP address into a pool",
                ),
                add_cb,
            ),
            with_help(with_desc(new_addr, "<a.b.c.d>"), "The IP to add"),
        ])),
        Rc::new(Concat::new(vec![
            with_cb(
                with_help(
                    Rc::new(Literal::new("del")),
                    "Delete an IP address from a pool",
                ),
                del_cb,
            ),
            with_help(with_desc(known_addr, "<a.b.c.d>"), "The IP to delete"),
        ])),
    ]));

    Ok(Rc::new(Concat::new(vec![
        with_help(
            Rc::new(Literal::new("addr")),
            "Add, delete, or list pool addresses",
        ),
        with_help(Rc::new(Literal::new("pool")), "The pool to work on"),
        with_help(with_desc(known_pool, "<pool-name>"), "The name of the pool"),
        subcommands,
    ])))
}

impl IpPoolCli {
    pub fn new() -> Result<Self, GrammarError> {
        let store = IpPoolStore::new();
        let done = Rc::new(Cell::new(false));

        let exit_flag = done.clone();
        let exit_cb: CommandFn = Rc::new(move |_parse| {
            exit_flag.set(true);
        });
        let exit_cmd = with_cb(
            with_help(Rc::new(Literal::new("exit")), "Quit the program"),
            exit_cb,
        );

        let commands: Rc<dyn IGrammar> = Rc::new(Union::new(vec![
            pool_commands(&store)?,
            addr_commands(&store)?,
            exit_cmd,
        ]));
        let grammar: Rc<dyn IGrammar> = Rc::new(ShellLexer::new(commands));

        Ok(Self {
            grammar,
            store,
            done,
        })
    }

    pub fn grammar(&self) -> &Rc<dyn IGrammar> {
        &self.grammar
    }

    pub fn store(&self) -> &Rc<IpPoolStore> {
        &self.store
    }

    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    /// Parse one input line and dispatch the callback of the matched command; returns whether
    /// the line matched the grammar.
    pub fn run_line(&self, line: &str) -> Result<bool, GrammarError> {
        let tree = parse(&self.grammar, line)?;
        if !tree.matches() {
            return Ok(false);
        }
        if let Some(callback) = find_callback(&tree) {
            callback(&tree);
        }
        Ok(true)
    }
}

/// The callback of the first matched node carrying one, in depth-first order.
fn find_callback(pnode: &ParseNode) -> Option<CommandFn> {
    if let Some(callback) = get_callback(&pnode.grammar()) {
        return Some(callback);
    }
    for child in pnode.children() {
        if let Some(callback) = find_callback(&child) {
            return Some(callback);
        }
    }
    None
}
