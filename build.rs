use clap::CommandFactory;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=crates/datadash-cli/src/lib.rs");

    // Generate manpage using clap_mangen
    let cmd = datadash_cli::Args::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buffer: Vec<u8> = Default::default();
    man.render(&mut buffer)?;

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => return Err(io::Error::new(io::ErrorKind::NotFound, e)),
    };

    // Always write to OUT_DIR
    fs::write(out_dir.join("datadash.1"), &buffer)?;

    // In release mode, also write to target/release/ for easy access in CI.
    // OUT_DIR is target/release/build/xxx/out, so three levels up is target/release/.
    if env::var("PROFILE").unwrap_or_default() == "release" {
        if let Some(release_dir) = out_dir.ancestors().nth(3) {
            fs::write(release_dir.join("datadash.1"), &buffer)?;
        }
    }

    Ok(())
}
