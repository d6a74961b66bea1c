// Flag table for §6, built with clap's builder API the way the teacher's
// own `flags.rs` constructs its subcommands.

use clap::Arg;
use clap::ArgAction;
use clap::Command;

pub fn command() -> Command {
  Command::new("modhoist")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Discovers local monorepo modules, hoists their shared dependencies, and repairs node_modules symlinks")
    .arg(
      Arg::new("modules-folder")
        .help("Local-modules folder name")
        .default_value("modules")
        .index(1),
    )
    .arg(
      Arg::new("no-link")
        .long("no-link")
        .help("Disable the local-module source path in the satisfaction filter and symlink repair")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("link-only")
        .long("link-only")
        .help("Run symlink repair only, skipping planning and installation")
        .conflicts_with("dependency-check-only")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("cleanup")
        .long("cleanup")
        .help("Remove every module's private node_modules before the pipeline")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("dependency-check-only")
        .long("dependency-check-only")
        .help("Run the coalescer and diagnostic reporter only, then exit")
        .conflicts_with("link-only")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("trust-local-modules")
        .long("trust-local-modules")
        .visible_alias("assume-local-modules-satisfy-non-semver-dependency-versions")
        .help("Treat a same-named local module as satisfying any non-semver dependency range")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("no-hoist")
        .long("no-hoist")
        .help("Never hoist dependencies matching name[@range] (glob name, repeatable)")
        .value_name("name[@range]")
        .action(ArgAction::Append),
    )
    .arg(
      Arg::new("loglevel")
        .long("loglevel")
        .help("Set the log level")
        .value_parser(["critical", "error", "warn", "info", "verbose", "debug", "silly"])
        .default_value("info"),
    )
}
