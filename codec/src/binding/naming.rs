use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref RESERVED: HashSet<&'static str> = [
        "as", "async", "await", "box", "break", "const", "continue", "crate", "do", "dyn",
        "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in", "let",
        "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
        "return", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
        "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
    ]
    .into_iter()
    .collect();
}

/// Maps a schema node's local name to the name of the accessor generated for
/// it: dashes and dots become underscores, everything is lowercased, and
/// reserved words get a trailing underscore.
pub fn accessor_name(local_name: &str) -> String {
    let mut name: String = local_name
        .chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if RESERVED.contains(name.as_str()) {
        name.push('_');
    }
    name
}
