//! Encode the bundled JSONata library into the payload embedded by `library`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::env;
use std::fs;
use std::path::PathBuf;

const LIBRARY_PATH: &str = "assets/jsonata.js";
const LINE_WIDTH: usize = 76;

fn main() {
    println!("cargo:rerun-if-changed={LIBRARY_PATH}");
    println!("cargo:rerun-if-changed=build.rs");

    let source = fs::read(LIBRARY_PATH)
        .unwrap_or_else(|err| panic!("failed to read {LIBRARY_PATH}: {err}"));
    let encoded = STANDARD.encode(&source);

    // Wrapped like a MIME body; the decoder skips the line breaks.
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 1);
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        wrapped.push_str(std::str::from_utf8(line).expect("base64 output is ASCII"));
        wrapped.push('\n');
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("jsonata.js.b64"), wrapped)
        .unwrap_or_else(|err| panic!("failed to write encoded library: {err}"));
}
