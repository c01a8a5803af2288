//! The bundled sample command set loads and every command is reachable.

use std::path::{Path, PathBuf};

use cmdtree_core::grammar::parser::compile;
use cmdtree_core::{CommandSet, Mode, Privilege, Session, parse};

fn sample_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../samples/router.json")
}

#[test]
fn router_sample_builds() {
    let set = CommandSet::load(&sample_path()).unwrap();
    let tree = set.build().unwrap();
    assert_eq!(tree.modes().count(), set.modes.len());
    assert_eq!(tree.config_writers().count(), 3);
    assert!(tree.dump(Mode(1)).unwrap().contains("show"));
}

#[test]
fn every_sample_line_round_trips() {
    let set = CommandSet::load(&sample_path()).unwrap();
    let tree = set.build().unwrap();
    for entry in &set.commands {
        let line = compile(&entry.template).unwrap().sample_line();
        for mode in &entry.modes {
            let mode = set.resolve(mode).unwrap();
            let session = Session::new(mode, Privilege::PVR_MAX).with_advanced(true);
            let result = parse(&tree, &session, &line);
            let m = result
                .command()
                .unwrap_or_else(|| panic!("{line:?} in mode {mode}: {:?}", result.outcome));
            assert_eq!(m.command.template, entry.template);
        }
    }
}

#[test]
fn mode_transitions_are_reported() {
    let set = CommandSet::load(&sample_path()).unwrap();
    let tree = set.build().unwrap();
    let exec = Session::new(Mode(1), Privilege::NORMAL);
    let r = parse(&tree, &exec, "conf t");
    assert_eq!(r.command().unwrap().target_mode, Some(Mode(2)));

    let config = Session::new(Mode(2), Privilege::NORMAL);
    let r = parse(&tree, &config, "router bgp 65000");
    let m = r.command().unwrap();
    assert_eq!(m.target_mode, Some(Mode(4)));
    assert_eq!(m.command.module.as_deref(), Some("bgpd"));
    assert_eq!(m.args, ["65000"]);
}
