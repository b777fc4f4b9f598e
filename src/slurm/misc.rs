/// Joins `squeue` format specifiers into an `-o` argument
pub fn format_string<'a, I, S>(iter: I, delimiter: char) -> String
where
    I: Iterator<Item = &'a S>,
    S: ?Sized + AsRef<str> + 'a,
{
    iter.map(|v| v.as_ref())
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

/// Quotes a value for a POSIX shell, leaving plain words untouched
pub fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@'));

    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
