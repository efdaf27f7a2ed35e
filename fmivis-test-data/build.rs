//! Compile the C models into shared libraries that can be packed into FMUs.

use std::{env, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=models");

    // The FMUs are packed with `binaries/linux64` only
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if target_os != "linux" || target_arch != "x86_64" {
        println!("cargo:warning=BouncingBall test models are only built for x86_64 Linux");
        return;
    }

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    for version in ["fmi1", "fmi2"] {
        let lib_dir = out_dir.join(version);
        std::fs::create_dir_all(&lib_dir).expect("create the library directory");

        let mut build = cc::Build::new();
        build
            .file(format!("models/{version}/bouncing_ball.c"))
            .include("models")
            .out_dir(&lib_dir)
            .pic(true);
        let objects = build.compile_intermediates();

        let lib = lib_dir.join("BouncingBall.so");
        let status = build
            .get_compiler()
            .to_command()
            .arg("-shared")
            .arg("-o")
            .arg(&lib)
            .args(&objects)
            .status()
            .expect("run the C compiler");
        assert!(status.success(), "linking {lib:?} failed");

        println!(
            "cargo:rustc-env=FMIVIS_BOUNCING_BALL_{}={}",
            version.to_uppercase(),
            lib.display()
        );
    }
}
