//! The bundled JSONata library, base64-encoded at build time.

/// Encoded library source, wrapped at 76 columns.
pub static ENCODED: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/jsonata.js.b64"));
