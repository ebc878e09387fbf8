// tests/resolver.rs

//! Dependency resolution over a populated branch database.

mod common;

use apkdex::DependencyResolver;
use apkdex::resolver::Resolution;
use common::{package_id, pkg, setup_db};

fn target(resolution: &Resolution) -> Option<(&str, &str)> {
    resolution
        .target()
        .map(|t| (t.name.as_str(), t.repo.as_str()))
}

#[test]
fn test_highest_provided_version_wins() {
    let (_dir, conn) = setup_db(&[
        ("main", "x86_64", pkg("libfoo1", "1.2-r0").provides(&["so:libfoo.so=1.2"])),
        ("main", "x86_64", pkg("libfoo2", "1.10-r0").provides(&["so:libfoo.so=1.10"])),
        ("main", "x86_64", pkg("libfoo-old", "0.9-r0").provides(&["so:libfoo.so"])),
    ]);

    let resolution = DependencyResolver::new(&conn)
        .resolve("so:libfoo.so", "x86_64")
        .unwrap();
    assert_eq!(target(&resolution), Some(("libfoo2", "main")));
}

#[test]
fn test_priority_breaks_version_ties() {
    let (_dir, conn) = setup_db(&[
        ("main", "x86_64", pkg("busybox", "1.36").provides(&["cmd:sh=1"]).priority(10)),
        ("main", "x86_64", pkg("dash", "0.5").provides(&["cmd:sh=1"]).priority(50)),
        ("main", "x86_64", pkg("yash", "2.5").provides(&["cmd:sh=1"])),
    ]);

    let resolution = DependencyResolver::new(&conn).resolve("cmd:sh", "x86_64").unwrap();
    assert_eq!(target(&resolution), Some(("dash", "main")));
}

#[test]
fn test_full_tie_keeps_first_provider() {
    let (_dir, conn) = setup_db(&[
        ("main", "x86_64", pkg("mawk", "1.3").provides(&["awk"])),
        ("community", "x86_64", pkg("gawk", "5.3").provides(&["awk"])),
    ]);

    let resolution = DependencyResolver::new(&conn).resolve("awk", "x86_64").unwrap();
    assert_eq!(target(&resolution), Some(("mawk", "main")));
}

#[test]
fn test_direct_name_beats_providers() {
    let (_dir, conn) = setup_db(&[
        ("community", "x86_64", pkg("curl", "8.0")),
        ("main", "x86_64", pkg("curl-ng", "9.0").provides(&["curl=99"]).priority(100)),
    ]);

    let resolution = DependencyResolver::new(&conn).resolve("curl", "x86_64").unwrap();
    assert_eq!(target(&resolution), Some(("curl", "community")));
}

#[test]
fn test_unprovided_name_is_unresolved() {
    let (_dir, conn) = setup_db(&[("main", "x86_64", pkg("a", "1.0"))]);

    let resolution = DependencyResolver::new(&conn).resolve("ghost", "x86_64").unwrap();
    assert_eq!(
        resolution,
        Resolution::Unresolved {
            name: "ghost".to_string()
        }
    );
}

#[test]
fn test_resolution_is_per_arch() {
    let (_dir, conn) = setup_db(&[
        ("main", "aarch64", pkg("musl", "1.2")),
        ("main", "aarch64", pkg("musl-alt", "1.2").provides(&["so:libc.musl.so.1"])),
    ]);

    let resolver = DependencyResolver::new(&conn);
    assert!(resolver.resolve("musl", "x86_64").unwrap().target().is_none());
    assert!(
        resolver
            .resolve("so:libc.musl.so.1", "x86_64")
            .unwrap()
            .target()
            .is_none()
    );
    assert_eq!(
        resolver.resolve("musl", "aarch64").unwrap().target().unwrap().arch,
        "aarch64"
    );
}

#[test]
fn test_resolve_package_keeps_declaration_order() {
    let (_dir, conn) = setup_db(&[
        ("main", "x86_64", pkg("app", "1.0").depends(&["zlib>=1.2", "so:libc.musl.so.1", "ghost"])),
        ("main", "x86_64", pkg("zlib", "1.3")),
        ("main", "x86_64", pkg("musl", "1.2").provides(&["so:libc.musl.so.1=1"])),
    ]);

    let app = package_id(&conn, "main", "app");
    let deps = DependencyResolver::new(&conn)
        .resolve_package(app, "x86_64")
        .unwrap();

    let names: Vec<&str> = deps.iter().map(Resolution::name).collect();
    assert_eq!(names, vec!["zlib", "so:libc.musl.so.1", "ghost"]);
    assert_eq!(target(&deps[0]), Some(("zlib", "main")));
    assert_eq!(target(&deps[1]), Some(("musl", "main")));
    assert!(deps[2].target().is_none());
}

#[test]
fn test_resolution_serializes_with_status() {
    let (_dir, conn) = setup_db(&[("main", "x86_64", pkg("zlib", "1.3"))]);

    let resolver = DependencyResolver::new(&conn);
    let resolved = serde_json::to_value(resolver.resolve("zlib", "x86_64").unwrap()).unwrap();
    assert_eq!(resolved["status"], "resolved");
    assert_eq!(resolved["target"]["repo"], "main");

    let unresolved = serde_json::to_value(resolver.resolve("nope", "x86_64").unwrap()).unwrap();
    assert_eq!(unresolved["status"], "unresolved");
}
