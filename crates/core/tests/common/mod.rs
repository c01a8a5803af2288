//! Shared test helpers for `cmdtree_core` integration tests.

#![allow(unreachable_pub)]

use cmdtree_core::{
    CliFlags, CommandDescriptor, CommandMatch, CommandTree, Mode, ParseOutcome, Privilege,
    Session, parse,
};

/// Operator mode used throughout the tests.
pub const EXEC: Mode = Mode(1);
/// Configuration mode.
#[allow(dead_code)]
pub const CONFIG: Mode = Mode(2);

/// Handler name derived from a template, e.g. `show ip route` -> `show_ip_route`.
pub fn handler_for(template: &str) -> String {
    template.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Normal-privilege session in `mode`.
#[allow(dead_code)]
pub fn session(mode: Mode) -> Session {
    Session::new(mode, Privilege::NORMAL)
}

/// A tree with every template installed into `mode` at normal privilege.
#[allow(dead_code)]
pub fn build(mode: Mode, templates: &[&str]) -> CommandTree {
    let mut tree = CommandTree::new();
    for t in templates {
        let d = CommandDescriptor::builder(*t, handler_for(t))
            .flags(CliFlags::MODIFIER)
            .build();
        tree.install(mode, d, Privilege::NORMAL)
            .unwrap_or_else(|e| panic!("install {t:?}: {e}"));
    }
    tree
}

/// A small router shell: exec and config modes plus the standard modifiers.
#[allow(dead_code)]
pub fn router() -> CommandTree {
    let mut tree = build(
        EXEC,
        &[
            "show ip route [A.B.C.D]",
            "show ip bgp [neighbors A.B.C.D]",
            "show ipv6 route",
            "show interface [IFNAME]",
            "show running-config",
            "show bgp {summary|neighbors A.B.C.D}",
            "ping A.B.C.D",
        ],
    );
    for t in ["hostname WORD", "interface IFNAME", "description LINE", "router bgp <1-65535>"] {
        let d = CommandDescriptor::builder(t, handler_for(t)).build();
        tree.install(CONFIG, d, Privilege::NORMAL).unwrap();
    }
    tree.install(
        EXEC,
        CommandDescriptor::builder("reload", "reload").build(),
        Privilege::VR_MAX,
    )
    .unwrap();
    tree.install_hidden(
        EXEC,
        CommandDescriptor::builder("debug all", "debug_all").build(),
        Privilege::NORMAL,
    )
    .unwrap();
    tree.install_standard_modifiers().unwrap();
    tree.sort();
    tree
}

/// Parse and insist on success.
#[allow(dead_code)]
pub fn expect_success(tree: &CommandTree, session: &Session, line: &str) -> CommandMatch {
    match parse(tree, session, line).outcome {
        ParseOutcome::Success(m) => m,
        other => panic!("{line:?}: expected success, got {other:?}"),
    }
}
