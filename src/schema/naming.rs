//! Identifier naming conventions: quoting, case conversion, table pluralisation.

use serde::Deserialize;

/// Case convention applied to derived table and column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Case {
    #[default]
    #[serde(rename = "snake_case")]
    SnakeCase,
    #[serde(rename = "camelCase")]
    CamelCase,
}

impl Case {
    pub fn apply(self, name: &str) -> String {
        match self {
            Case::SnakeCase => to_snake_case(name),
            Case::CamelCase => to_camel_case(name),
        }
    }
}

/// Back-tick quote an identifier.
///
/// ```rust
/// assert_eq!(mooring::schema::naming::escape("address"), "`address`");
/// ```
pub fn escape(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Plural table name for an entity name: `city` -> `cities`,
/// `address` -> `addresses`, `user` -> `users`.
pub fn table_name(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('y') {
        format!("{stem}ies")
    } else if name.ends_with('s') {
        format!("{name}es")
    } else {
        format!("{name}s")
    }
}

/// Default foreign-key property for a relation pointing back at `entity`:
/// `UserFixture` -> `userFixtureId`.
pub fn relation_column_name(entity: &str) -> String {
    format!("{}Id", lower_first(entity))
}

pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (idx, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch.to_ascii_lowercase());
        }
    }
    out
}

pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    lower_first(&out)
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("user"), "users");
        assert_eq!(table_name("city"), "cities");
        assert_eq!(table_name("address"), "addresses");
    }

    #[test]
    fn test_relation_column_name() {
        assert_eq!(relation_column_name("UserFixture"), "userFixtureId");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("address"), "`address`");
        assert_eq!(escape("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_snake_case("firstName"), "first_name");
        assert_eq!(to_snake_case("UserFixture"), "user_fixture");
        assert_eq!(to_snake_case("addressId"), "address_id");
        assert_eq!(to_camel_case("first_name"), "firstName");
        assert_eq!(to_camel_case("FirstName"), "firstName");
        assert_eq!(to_camel_case("second-address_id"), "secondAddressId");
        assert_eq!(Case::CamelCase.apply("is_active"), "isActive");
        assert_eq!(Case::SnakeCase.apply("isActive"), "is_active");
    }
}
