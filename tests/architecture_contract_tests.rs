//! Architecture contract tests.

mod support;

use support::architecture::{find_lines_containing, path_exists};

#[test]
fn domain_has_no_framework_or_outer_layer_imports() {
    let hits = find_lines_containing(
        "src/domain",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "crate::application",
            "crate::port",
            "tokio::",
            "reqwest::",
        ],
    );

    assert!(
        hits.is_empty(),
        "found forbidden imports in domain layer: {hits:#?}"
    );
}

#[test]
fn ports_depend_only_on_domain() {
    let hits = find_lines_containing(
        "src/port",
        &["crate::adapter", "crate::infrastructure", "crate::application"],
    );

    assert!(hits.is_empty(), "found outer-layer imports in ports: {hits:#?}");
}

#[test]
fn application_does_not_reach_adapters_or_infrastructure() {
    let hits = find_lines_containing(
        "src/application",
        &["crate::adapter", "crate::infrastructure", "reqwest::"],
    );

    assert!(
        hits.is_empty(),
        "found adapter or infrastructure imports in application layer: {hits:#?}"
    );
}

#[test]
fn outbound_adapters_do_not_import_cli() {
    let hits = find_lines_containing("src/adapter/outbound", &["adapter::inbound"]);
    assert!(hits.is_empty(), "outbound adapters import the CLI: {hits:#?}");
}

#[test]
fn testkit_is_feature_gated() {
    assert!(path_exists("src/testkit/mod.rs"));
    let hits = find_lines_containing("src", &["pub mod testkit;"]);
    assert_eq!(hits.len(), 1);
    let lib = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/src/lib.rs"))
        .unwrap();
    assert!(lib.contains("#[cfg(any(test, feature = \"testkit\"))]\npub mod testkit;"));
}
