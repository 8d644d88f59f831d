//! `?ordering=` support. Only whitelisted columns ever reach the SQL text.

/// A sortable field of some resource.
pub trait OrderField: Copy + Sized + 'static {
    /// Query-string name paired with the field it selects.
    const FIELDS: &'static [(&'static str, Self)];

    /// Fully qualified column, e.g. `a.date`.
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy<F> {
    field: F,
    descending: bool,
}

impl<F: OrderField> OrderBy<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// Parses `name` or `-name`. Returns `None` for fields that are not orderable.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        F::FIELDS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, field)| Self {
                field: *field,
                descending,
            })
    }

    pub fn field(&self) -> F {
        self.field
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn to_sql(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {}", self.field.column(), direction)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Sample {
        Name,
        Date,
    }

    impl OrderField for Sample {
        const FIELDS: &'static [(&'static str, Self)] = &[("name", Self::Name), ("date", Self::Date)];

        fn column(self) -> &'static str {
            match self {
                Self::Name => "s.name",
                Self::Date => "s.date",
            }
        }
    }

    #[test]
    fn parses_ascending() {
        let order = OrderBy::<Sample>::parse("name").unwrap();
        assert_eq!(order.field(), Sample::Name);
        assert!(!order.is_descending());
        assert_eq!(order.to_sql(), "s.name ASC");
    }

    #[test]
    fn parses_descending() {
        let order = OrderBy::<Sample>::parse("-date").unwrap();
        assert_eq!(order, OrderBy::desc(Sample::Date));
        assert_eq!(order.to_sql(), "s.date DESC");
    }

    #[test]
    fn rejects_unknown_and_injection() {
        assert!(OrderBy::<Sample>::parse("email").is_none());
        assert!(OrderBy::<Sample>::parse("name; DROP TABLE users").is_none());
        assert!(OrderBy::<Sample>::parse("--name").is_none());
        assert!(OrderBy::<Sample>::parse("").is_none());
    }
}
