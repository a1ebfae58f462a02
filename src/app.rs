/// The application name
pub const NAME: &str = "cloudlog";

/// The application version
pub const VERSION: &str = env!("BUILD_VERSION");

// The file has been placed here by the build script. See build.rs
#[allow(dead_code)]
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

use built_info::*;

lazy_static! {
    static ref LONG_VERSION: String = {
        [
            VERSION.to_string(),
            format!(" - Package:\tv{}", PKG_VERSION),
            format!(" - Built:\t{}", BUILT_TIME_UTC),
            format!(" - googlelog:\tv{}", googlelog_version()),
            format!(" - Compiler:\t{}", RUSTC_VERSION),
            format!(" - OS/Arch:\t{}/{}", CFG_OS, CFG_TARGET_ARCH),
            format!(" - Debug:\t{}", DEBUG),
        ]
        .join("\n")
    };
}

pub fn long_version() -> &'static str {
    (*LONG_VERSION).as_str()
}

pub fn googlelog_version() -> &'static str {
    let googlelog_version = DEPENDENCIES.iter().find_map(|(name, version)| match *name {
        "googlelog" => Some(version),
        _ => None,
    });
    googlelog_version.unwrap_or(&"unknown")
}
