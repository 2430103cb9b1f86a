//! Build script for detecting system dependencies and providing installation guidance.
//!
//! The `camera` feature links against the system `OpenCV`; this script checks
//! for it (and for pkg-config) and prints hints when they are missing.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_CAMERA").is_some() {
        check_pkg_config();
        check_opencv();
    }

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    for package in ["opencv4", "opencv"] {
        if let Ok(output) = Command::new("pkg-config").args(["--modversion", package]).output() {
            if output.status.success() {
                let version = String::from_utf8_lossy(&output.stdout);
                println!("cargo:warning=Found OpenCV version: {}", version.trim());
                return;
            }
        }
    }

    println!("cargo:warning=OpenCV not found via pkg-config. The `camera` feature needs it.");
    println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev clang libclang-dev");
    println!("cargo:warning=On macOS: brew install opencv");
}

fn check_pkg_config() {
    let found = Command::new("pkg-config")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());

    if !found {
        println!("cargo:warning=pkg-config not found. This is required to find system libraries.");
        println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
        println!("cargo:warning=On macOS: brew install pkg-config");
    }
}
