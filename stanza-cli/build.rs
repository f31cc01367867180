//! Build script for stanza-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    let file_arg = || {
        Arg::new("file")
            .value_name("FILE")
            .help("Configuration file to read")
            .required(true)
    };

    Command::new("stanza")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect block/statement configuration files")
        .long_about(
            "Command-line tool for parsing, printing and querying block/statement configuration files",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("include-dir")
                .long("include-dir")
                .help("Resolve relative %include paths against this directory")
                .value_name("DIR")
                .global(true)
                .env("STANZA_INCLUDE_DIR"),
        )
        .subcommands(vec![
            Command::new("print")
                .about("Parse a file and print its tree")
                .long_about("Parse a file, following its includes, and print it as text, JSON or YAML")
                .arg(file_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["text", "json", "yaml"])
                        .default_value("text")
                        .env("STANZA_OUTPUT_FORMAT"),
                )
                .arg(Arg::new("indent").long("indent").value_name("N").default_value("4")),
            Command::new("get")
                .about("Print one statement or block by qualified name")
                .long_about("Look up a node by a case-insensitive name path such as EXPORT::Path")
                .arg(file_arg())
                .arg(Arg::new("name").value_name("NAME").required(true))
                .arg(
                    Arg::new("show-location")
                        .long("show-location")
                        .action(clap::ArgAction::SetTrue),
                ),
            Command::new("find")
                .about("List blocks matching a search expression")
                .long_about("Search with an expression such as EXPORT(Export_Id = 1).CLIENT(Clients = *)")
                .arg(file_arg())
                .arg(Arg::new("expr").value_name("EXPR").required(true))
                .arg(Arg::new("print").long("print").action(clap::ArgAction::SetTrue)),
            Command::new("check")
                .about("Parse a file and report scan or parse errors")
                .long_about("Check that a configuration file and everything it includes parses")
                .arg(file_arg()),
        ])
}

fn main() {
    // Generate man pages at build time
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    // Generate main stanza.1 man page
    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("stanza.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
