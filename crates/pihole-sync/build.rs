use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::CommandFactory;

// cli.rs only depends on clap + clap_complete, both build-dependencies.
#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

/// Writes `pihole-sync.1` plus one page per subcommand into `$OUT_DIR/man`.
fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR")
        .ok_or_else(|| io::Error::other("OUT_DIR not set by Cargo"))?;
    let man_dir = PathBuf::from(out_dir).join("man");
    fs::create_dir_all(&man_dir)?;

    let cmd = cli::Cli::command();
    let bin = cmd.get_name().to_owned();
    write_page(cmd.clone(), &man_dir.join(format!("{bin}.1")))?;

    // Subcommands are a single level deep.
    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let page = format!("{bin}-{}", sub.get_name());
        write_page(sub.clone().name(page.clone()), &man_dir.join(format!("{page}.1")))?;
    }
    Ok(())
}

fn write_page(cmd: clap::Command, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    clap_mangen::Man::new(cmd).render(&mut out)
}
