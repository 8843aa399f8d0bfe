//! Builds the version substring embedded in the `.ident` directive.
//!
//! The original shelled out to `git log`/`git describe` at build time via a
//! small helper binary (`ExportVersion.c`) and exposed the result through a
//! pair of weak globals. Cargo already threads the crate version through at
//! compile time, so this just formats `CARGO_PKG_VERSION`.

pub fn version_string() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
