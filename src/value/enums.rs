//! Backed enumerations.
//!
//! An enum column stores a scalar "backing" value (a string or an integer) and
//! maps it to a Rust enum on the entity. The schema only needs to know the set
//! of legal backing values ([`EnumType`]); the entity converts with
//! [`BackedEnum`].

use super::scalar::Value;

/// A Rust enum whose variants are each backed by one scalar value.
///
/// ## Example
///
/// ```rust
/// use mooring::{BackedEnum, Value};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Status {
///     Active,
///     Banned,
/// }
///
/// impl BackedEnum for Status {
///     const NAME: &'static str = "Status";
///
///     fn cases() -> Vec<Self> {
///         vec![Status::Active, Status::Banned]
///     }
///
///     fn backing(&self) -> Value {
///         match self {
///             Status::Active => Value::from("active"),
///             Status::Banned => Value::from("banned"),
///         }
///     }
/// }
///
/// assert_eq!(Status::from_backing(&Value::from("banned")), Some(Status::Banned));
/// assert_eq!(Status::from_backing(&Value::from("gone")), None);
/// ```
pub trait BackedEnum: Sized + 'static {
    /// Name used for the enum in schema descriptions and errors.
    const NAME: &'static str;

    /// Every variant, in declaration order.
    fn cases() -> Vec<Self>;

    /// Backing scalar of this variant.
    fn backing(&self) -> Value;

    /// Find the variant backed by `value`.
    ///
    /// Integer-backed enums also accept numeric text, which is how some drivers
    /// hand integers back.
    fn from_backing(value: &Value) -> Option<Self> {
        Self::cases()
            .into_iter()
            .find(|case| backing_matches(&case.backing(), value))
    }

    /// Schema descriptor listing the legal backing values.
    fn enum_type() -> EnumType {
        EnumType {
            name: Self::NAME.to_string(),
            cases: Self::cases().iter().map(BackedEnum::backing).collect(),
        }
    }
}

/// Schema-side description of an enum column: its name and legal backing values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub cases: Vec<Value>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, cases: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            cases,
        }
    }

    /// The declared backing value equal to `raw`, if any.
    pub fn resolve(&self, raw: &Value) -> Option<Value> {
        self.cases
            .iter()
            .find(|case| backing_matches(case, raw))
            .cloned()
    }
}

fn backing_matches(backing: &Value, raw: &Value) -> bool {
    match (backing, raw) {
        (Value::Int(b), Value::Text(_)) => raw.as_int() == Some(*b),
        (Value::Text(b), Value::Int(r)) => b.parse::<i64>().ok() == Some(*r),
        _ => backing == raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Priority {
        Low,
        High,
    }

    impl BackedEnum for Priority {
        const NAME: &'static str = "Priority";

        fn cases() -> Vec<Self> {
            vec![Priority::Low, Priority::High]
        }

        fn backing(&self) -> Value {
            match self {
                Priority::Low => Value::Int(1),
                Priority::High => Value::Int(10),
            }
        }
    }

    #[test]
    fn test_int_backed_enum_accepts_numeric_text() {
        assert_eq!(
            Priority::from_backing(&Value::Text("10".to_string())),
            Some(Priority::High)
        );
        assert_eq!(Priority::from_backing(&Value::Int(1)), Some(Priority::Low));
        assert_eq!(Priority::from_backing(&Value::Int(2)), None);
    }

    #[test]
    fn test_enum_type_lists_cases() {
        let enum_type = Priority::enum_type();
        assert_eq!(enum_type.name, "Priority");
        assert_eq!(enum_type.cases, vec![Value::Int(1), Value::Int(10)]);
        assert_eq!(enum_type.resolve(&Value::Text("1".into())), Some(Value::Int(1)));
        assert_eq!(enum_type.resolve(&Value::Int(3)), None);
    }
}
