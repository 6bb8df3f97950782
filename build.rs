// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: target environment name
fn env_arg() -> Arg {
    Arg::new("env")
        .short('n')
        .long("env")
        .value_name("NAME")
        .required(true)
        .help("Target environment name")
}

fn build_cli() -> Command {
    Command::new("caiman")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Caiman Contributors")
        .about("Package-state synchronization and mutation orchestration for conda environments")
        .subcommand_required(true)
        .subcommand(
            Command::new("prime")
                .about("Refresh the package view (installed + available) for an environment")
                .arg(env_arg()),
        )
        .subcommand(
            Command::new("update")
                .about("Update all packages or a selected subset")
                .arg(env_arg())
                .arg(Arg::new("all").long("all").help("Update every package"))
                .arg(Arg::new("names").help("Packages to update"))
                .arg(
                    Arg::new("versions")
                        .long("versions")
                        .help("Version pins aligned by index to the names"),
                ),
        )
        .subcommand(
            Command::new("update-all-confirm")
                .about("Update all packages after an explicit confirmation")
                .arg(env_arg()),
        )
        .subcommand(
            Command::new("refresh-available")
                .about("Invalidate the available-package cache and re-prime")
                .arg(env_arg()),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove packages from an environment")
                .arg(env_arg())
                .arg(Arg::new("names").required(true).help("Packages to remove")),
        )
        .subcommand(
            Command::new("apply-modifications")
                .about("Announce an intended batch modification")
                .arg(env_arg()),
        )
        .subcommand(Command::new("env").about("Environment operations (list, create, clone, remove, export, import)"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
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

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("caiman.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
        return;
    }

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
