use crate::command::Flags;
use crate::lexer;

/// One parsed input line.
///
/// `parameters` holds every token after the name, flags and their values
/// included; `flags` is an additional view over the same tokens, not a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub parameters: Vec<String>,
    pub flags: Flags,
}

/// Parse a raw input line into an [`Invocation`].
///
/// Returns `None` when the line holds no tokens at all; callers should treat
/// that as a no-op rather than an error.
pub fn parse_line(line: &str) -> Option<Invocation> {
    let mut tokens = lexer::split_into_tokens(line).into_iter();
    let name = tokens.next()?;
    let parameters: Vec<String> = tokens.collect();
    let flags = parse_flags(&parameters);
    Some(Invocation {
        name,
        parameters,
        flags,
    })
}

/// Scan parameters left to right and collect `--key [value]` pairs.
///
/// A value token is consumed and never considered as a key itself. A flag
/// followed by another flag, or by nothing, is presence-only.
pub fn parse_flags(parameters: &[String]) -> Flags {
    let mut flags = Flags::new();
    let mut pos = 0;
    while pos < parameters.len() {
        let token = &parameters[pos];
        pos += 1;
        let Some(key) = token.strip_prefix("--") else {
            continue;
        };
        let key = key.replace('-', "_");
        match parameters.get(pos) {
            Some(next) if !next.starts_with("--") => {
                flags.insert(key, Some(next.clone()));
                pos += 1;
            }
            _ => flags.insert(key, None),
        }
    }
    flags
}
