//! String helpers shared by the populator and mappers

use heck::ToLowerCamelCase;

/// Convert a snake_case name to lowerCamelCase, optionally prefixed.
///
/// The prefix is folded into the result, so `("name", "set")` and
/// `("name", "Set")` both give `"setName"`.
pub fn snake_to_camel(input: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        input.to_lower_camel_case()
    } else {
        format!("{}_{}", prefix, input).to_lower_camel_case()
    }
}
