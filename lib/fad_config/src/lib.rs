//! Compiled-in defaults for the FAD driver.
//! The values come from `fad_flags.json` at the workspace root and are generated by `build.rs`;
//! an architecture section in that file overrides the `common` section.

#![no_std]
#![deny(missing_docs)]

include!(concat!(env!("OUT_DIR"), "/build_flags.rs"));
