//! Installation, uninstallation, and tree-shape tests.

mod common;

use common::{EXEC, build, expect_success, handler_for, session};
use cmdtree_core::grammar::parser::compile;
use cmdtree_core::{
    CliFlags, CommandDescriptor, CommandTree, InstallError, ParseOutcome, Privilege, codes, parse,
};

#[test]
fn shared_prefix_is_counted_per_command() {
    let mut tree = build(EXEC, &["show ip route", "show ip bgp"]);
    let show = tree.lookup(EXEC, &["show"]).unwrap();
    let ip = tree.lookup(EXEC, &["show", "ip"]).unwrap();
    assert_eq!(tree.node(show).unwrap().refcount(), 2);
    assert_eq!(tree.node(ip).unwrap().refcount(), 2);
    assert_eq!(tree.node(ip).unwrap().children().len(), 2);

    let removed = tree.uninstall(EXEC, "show ip bgp").unwrap();
    assert_eq!(removed.handler, "show_ip_bgp");
    assert_eq!(tree.node(show).unwrap().refcount(), 1);
    assert!(tree.lookup(EXEC, &["show", "ip", "bgp"]).is_none());
    assert!(tree.lookup(EXEC, &["show", "ip", "route"]).is_some());

    tree.uninstall(EXEC, "show ip route").unwrap();
    assert!(tree.lookup(EXEC, &["show"]).is_none());
}

#[test]
fn registration_order_does_not_change_the_sorted_tree() {
    let templates = [
        "show ip route [A.B.C.D]",
        "show ip bgp",
        "show interface IFNAME",
        "show (ip|ipv6) mroute",
        "router bgp <1-65535>",
        "description LINE",
    ];
    let mut forward = build(EXEC, &templates);
    let reversed: Vec<&str> = templates.iter().rev().copied().collect();
    let mut backward = build(EXEC, &reversed);
    forward.sort();
    backward.sort();
    assert_eq!(forward.dump(EXEC), backward.dump(EXEC));
    assert_eq!(forward.node_count(), backward.node_count());
}

#[test]
fn plus_sign_handling_does_not_depend_on_registration_order() {
    let strict = || {
        CommandDescriptor::builder("mtu <68-9000>", "mtu")
            .flags(CliFlags::PLUS_SIGN_FORBIDDEN)
            .build()
    };
    let lenient = || CommandDescriptor::builder("mtu <68-9000> force", "mtu_force").build();

    let mut forward = CommandTree::new();
    forward.install(EXEC, strict(), Privilege::NORMAL).unwrap();
    forward.install(EXEC, lenient(), Privilege::NORMAL).unwrap();
    let mut backward = CommandTree::new();
    backward.install(EXEC, lenient(), Privilege::NORMAL).unwrap();
    backward.install(EXEC, strict(), Privilege::NORMAL).unwrap();
    forward.sort();
    backward.sort();
    assert_eq!(forward.dump(EXEC), backward.dump(EXEC));

    let s = session(EXEC);
    for line in ["mtu 100", "mtu +100", "mtu 100 force", "mtu +100 force"] {
        assert_eq!(
            parse(&forward, &s, line).outcome,
            parse(&backward, &s, line).outcome,
            "{line:?}"
        );
    }
    assert_eq!(expect_success(&forward, &s, "mtu 100").command.handler, "mtu");
    assert_eq!(parse(&forward, &s, "mtu +100").outcome, ParseOutcome::Incomplete);
    let m = expect_success(&forward, &s, "mtu +100 force");
    assert_eq!(m.command.handler, "mtu_force");
    assert_eq!(m.args, ["+100"]);

    // Same line, different `+` handling: still one command per line.
    let err = forward
        .install(EXEC, CommandDescriptor::builder("mtu <68-9000>", "other").build(), Privilege::NORMAL)
        .unwrap_err();
    assert!(matches!(err, InstallError::DuplicateCommand { .. }));
    forward.uninstall(EXEC, "mtu <68-9000>").unwrap();
    assert_eq!(parse(&forward, &s, "mtu 100").outcome, ParseOutcome::Incomplete);
    expect_success(&forward, &s, "mtu 100 force");
}

#[test]
fn shared_help_does_not_depend_on_registration_order() {
    let bgp = || {
        CommandDescriptor::builder("clear ip bgp", "clear_ip_bgp")
            .help(["Clear BGP state", "Internet Protocol", "BGP sessions"])
            .build()
    };
    let counters = || {
        CommandDescriptor::builder("clear counters", "clear_counters")
            .help(["Reset functions", "Interface counters"])
            .build()
    };
    let mut forward = CommandTree::new();
    forward.install(EXEC, bgp(), Privilege::NORMAL).unwrap();
    forward.install(EXEC, counters(), Privilege::NORMAL).unwrap();
    let mut backward = CommandTree::new();
    backward.install(EXEC, counters(), Privilege::NORMAL).unwrap();
    backward.install(EXEC, bgp(), Privilege::NORMAL).unwrap();
    for tree in [&forward, &backward] {
        let clear = tree.lookup(EXEC, &["clear"]).unwrap();
        assert_eq!(tree.node(clear).unwrap().help(), Some("Clear BGP state"));
    }

    forward.uninstall(EXEC, "clear ip bgp").unwrap();
    let clear = forward.lookup(EXEC, &["clear"]).unwrap();
    assert_eq!(forward.node(clear).unwrap().help(), Some("Reset functions"));
}

#[test]
fn sample_lines_resolve_to_their_own_command() {
    let templates = [
        "show ip route A.B.C.D",
        "show ip bgp [neighbors A.B.C.D]",
        "show bgp {summary|neighbors A.B.C.D}",
        "*s=show version",
        "interface IFNAME",
        "ip address A.B.C.D/M",
        "router bgp <1-65535>",
        "description LINE",
        "clock set HH:MM:SS",
    ];
    let tree = build(EXEC, &templates);
    for t in templates {
        let line = compile(t).unwrap().sample_line();
        let m = expect_success(&tree, &session(EXEC), &line);
        assert_eq!(m.command.template, t, "sample line {line:?}");
    }
}

#[test]
fn installer_errors_carry_codes() {
    let mut tree = build(EXEC, &["show ip route"]);
    let before = tree.dump(EXEC);

    let dup = tree
        .install(EXEC, CommandDescriptor::builder("show ip route", "again").build(), Privilege::NORMAL)
        .unwrap_err();
    assert!(matches!(dup, InstallError::DuplicateCommand { mode: Some(EXEC), .. }));
    assert_eq!(dup.code(), codes::INSTALL_DUPLICATE_COMMAND);

    let bad = tree
        .install(EXEC, CommandDescriptor::builder("show (ip|ipv6", "bad").build(), Privilege::NORMAL)
        .unwrap_err();
    assert_eq!(bad.code(), codes::INSTALL_MALFORMED_GRAMMAR);
    assert!(bad.to_diagnostic().span.is_some());

    let help = tree
        .install(
            EXEC,
            CommandDescriptor::builder("show clock", "clock").help(["Show"]).build(),
            Privilege::NORMAL,
        )
        .unwrap_err();
    assert!(matches!(help, InstallError::HelpMismatch { expected: 2, found: 1, .. }));

    assert_eq!(tree.dump(EXEC), before);
}

#[test]
fn node_privilege_is_the_minimum_of_its_commands() {
    let mut tree = CommandTree::new();
    tree.install(EXEC, CommandDescriptor::builder("clear ip bgp", "a").build(), Privilege::VR_MAX)
        .unwrap();
    tree.install(EXEC, CommandDescriptor::builder("clear counters", "b").build(), Privilege(5))
        .unwrap();
    let clear = tree.lookup(EXEC, &["clear"]).unwrap();
    let ip = tree.lookup(EXEC, &["clear", "ip"]).unwrap();
    assert_eq!(tree.node(clear).unwrap().privilege(), Privilege(5));
    assert_eq!(tree.node(ip).unwrap().privilege(), Privilege::VR_MAX);
}

#[test]
fn help_strings_land_on_their_positions() {
    let mut tree = CommandTree::new();
    let d = CommandDescriptor::builder("show ip route", handler_for("show ip route"))
        .help(["Show running system information", "IP information", "IP routing table"])
        .build();
    tree.install(EXEC, d, Privilege::NORMAL).unwrap();
    let route = tree.lookup(EXEC, &["show", "ip", "route"]).unwrap();
    let node = tree.node(route).unwrap();
    assert_eq!(node.help(), Some("IP routing table"));
    assert_eq!(node.leaf().map(|l| l.handler.as_str()), Some("show_ip_route"));
}
