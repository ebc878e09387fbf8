// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: branch to read
fn branch_arg() -> Arg {
    Arg::new("branch")
        .short('b')
        .long("branch")
        .value_name("BRANCH")
        .help("Branch to read (default: the configured default branch)")
}

fn build_cli() -> Command {
    Command::new("apkdex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Index apk repositories into per-branch SQLite databases")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .default_value("/etc/apkdex/config.toml")
                .global(true)
                .help("Path to the configuration file"),
        )
        .subcommand(
            Command::new("sync")
                .about("Sync branches with their remote indexes")
                .arg(
                    Arg::new("branch")
                        .short('b')
                        .long("branch")
                        .action(ArgAction::Append)
                        .help("Branch to sync (repeatable; default: all configured branches)"),
                )
                .arg(
                    Arg::new("arches")
                        .num_args(0..)
                        .help("Architectures to sync instead of the configured ones"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show one package with its dependencies, provides and files")
                .arg(branch_arg())
                .arg(Arg::new("repo").required(true).help("Repository"))
                .arg(Arg::new("arch").required(true).help("Architecture"))
                .arg(Arg::new("name").required(true).help("Package name"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print as JSON"),
                ),
        )
        .subcommand(
            Command::new("index")
                .about("Print the plain-text index of a repository, rendering it if needed")
                .arg(branch_arg())
                .arg(Arg::new("repo").required(true).help("Repository"))
                .arg(Arg::new("arch").required(true).help("Architecture")),
        )
        .subcommand(
            Command::new("maintainers")
                .about("List maintainers and how many packages each one has")
                .arg(branch_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("apkdex.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
