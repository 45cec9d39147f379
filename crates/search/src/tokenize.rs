/// Characters treated as token boundaries besides whitespace
const SEPARATORS: &[char] = &[
    '_', '.', ':', '(', ')', '[', ']', '{', '}', '=', '/', '\\', ',',
];

/// Lowercase word tokens for keyword indexing and queries.
///
/// Identifiers split on underscores and dots, so `load_config` and `pkg.load_config`
/// both yield `load` and `config`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}
