//! Naming helpers for log targets.
//!
//! Component log targets are derived from role names with
//! [`camel_to_snake`], so a token named after a Rust type
//! (`"HTTPClient"`) still produces a conventional `http_client` target.

/// Converts a CamelCase (or mixed) name to snake_case.
///
/// Acronym runs stay together (`HTTPClient` → `http_client`) and digit runs
/// are split from a preceding letter (`RSA512Crypt` → `rsa_512_crypt`).
/// Already-snake input passes through unchanged.
pub(crate) fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        let next = chars.get(i + 1).copied();

        let boundary = match prev {
            None => false,
            Some(p) => {
                (c.is_ascii_uppercase() && (p.is_ascii_lowercase() || p.is_ascii_digit()))
                    || (c.is_ascii_uppercase()
                        && p.is_ascii_uppercase()
                        && next.is_some_and(|n| n.is_ascii_lowercase()))
                    || (c.is_ascii_digit() && p.is_ascii_alphabetic())
            }
        };

        if boundary {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("DB"), "db");
        assert_eq!(camel_to_snake("HTTPClient"), "http_client");
        assert_eq!(camel_to_snake("CoolXMLParser"), "cool_xml_parser");
        assert_eq!(camel_to_snake("MessageQueue"), "message_queue");
        assert_eq!(camel_to_snake("RSA512Crypt"), "rsa_512_crypt");
    }

    #[test]
    fn test_snake_passthrough() {
        assert_eq!(camel_to_snake("message_queue"), "message_queue");
        assert_eq!(camel_to_snake("db"), "db");
    }
}
