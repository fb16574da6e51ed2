use std::env;
use std::path::{Path, PathBuf};

/// Compile the C stand-in for the native binding into `$OUT_DIR/test-binding`
///
/// Only the integration tests load it. A host without a working C compiler
/// still builds the crate; the native-backend tests then report the missing
/// library.
fn main() {
    let source = Path::new("tests/fixtures/jmac_binding.c");
    println!("cargo:rerun-if-changed={}", source.display());

    if env::var_os("CARGO_CFG_UNIX").is_none() {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));
    let lib_dir = out_dir.join("test-binding");
    std::fs::create_dir_all(&lib_dir).expect("create test-binding directory");

    let file_name = match env::var("CARGO_CFG_TARGET_OS").as_deref() {
        Ok("macos") | Ok("ios") => "libJMacNotification.dylib",
        _ => "libJMacNotification.so",
    };
    let output = lib_dir.join(file_name);

    let compiler = cc::Build::new().pic(true).get_compiler();
    let status = compiler
        .to_command()
        .arg("-shared")
        .arg("-o")
        .arg(&output)
        .arg(source)
        .status();

    match status {
        Ok(status) if status.success() => {}
        Ok(status) => println!(
            "cargo:warning=test binding '{}' failed to compile ({})",
            source.display(),
            status
        ),
        Err(e) => println!(
            "cargo:warning=no C compiler for test binding '{}': {}",
            source.display(),
            e
        ),
    }
}
