/// Default extra delimiters beyond plain whitespace, configurable per the
/// design ("split on whitespace and configurable extra delimiters").
const EXTRA_DELIMITERS: [char; 2] = [':', '='];

/// Split `text` on whitespace plus the extra delimiter set; empty tokens
/// (from runs of delimiters) are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || EXTRA_DELIMITERS.contains(&c))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize("user 42 logged in"), vec!["user", "42", "logged", "in"]);
    }

    #[test]
    fn splits_on_extra_delimiters() {
        assert_eq!(tokenize("level=error code:500"), vec!["level", "error", "code", "500"]);
    }

    #[test]
    fn drops_empty_tokens() {
        assert_eq!(tokenize("a   b"), vec!["a", "b"]);
        assert_eq!(tokenize(""), Vec::<String>::new());
    }
}
