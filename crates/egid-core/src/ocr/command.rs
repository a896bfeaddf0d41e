//! Shell command construction for the external OCR program.

use std::path::Path;

/// Quote a string as a single shell word.
///
/// The result is wrapped in single quotes; embedded single quotes become
/// `'\''`. Nothing inside is interpreted by the shell.
pub fn quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Build the command that runs `script` on `image_ref` from `service_dir`.
///
/// Produces `cd <dir> && exec <executable> <script> <image_ref>` with every
/// part quoted separately.
pub fn build_command(executable: &str, service_dir: &Path, script: &str, image_ref: &str) -> String {
    format!(
        "cd {} && exec {} {} {}",
        quote(&service_dir.to_string_lossy()),
        quote(executable),
        quote(script),
        quote(image_ref)
    )
}
