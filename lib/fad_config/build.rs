use std::{collections::BTreeMap, env, fs, path::PathBuf};

type FlagMap = BTreeMap<String, String>;

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let flags_path = PathBuf::from(&manifest_dir).join("../../fad_flags.json");
    let flags_str = fs::read_to_string(&flags_path)
        .unwrap_or_else(|err| panic!("cannot read {}: {}", flags_path.display(), err));
    let sections: BTreeMap<String, FlagMap> =
        serde_json::from_str(&flags_str).expect("fad_flags.json must map sections to flag tables");

    let mut flags = match sections.get("common") {
        Some(common) => common.clone(),
        None => panic!("fad_flags.json has no \"common\" section"),
    };
    // Architecture sections override the common defaults.
    if let Some(arch) = sections.get(target_arch.as_str()) {
        flags.extend(arch.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    make_flags(&flags);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../fad_flags.json");
}

fn make_flags(flags: &FlagMap) {
    let mut s = String::new();
    for (key, value) in flags {
        let value: u32 = value
            .parse()
            .unwrap_or_else(|_| panic!("flag {} is not an unsigned integer: {}", key, value));
        s += format!("/// `{}` from fad_flags.json.\npub const {}: u32 = {};\n", key, key, value).as_str();
    }
    let out = PathBuf::from(env::var("OUT_DIR").expect("cargo sets OUT_DIR")).join("build_flags.rs");
    fs::write(out, s).expect("cannot write build_flags.rs");
}
