mod arena;

pub use arena::AstArena;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

/// Root of a parsed source text. All nodes and slices live in the
/// [`AstArena`]; string fields are views into the source buffer.
#[derive(Debug, PartialEq)]
pub struct Document<'a> {
    pub definitions: &'a [Definition<'a>],
}

impl<'a> Document<'a> {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Definition<'a> {
    Operation(&'a OperationDefinition<'a>),
    Fragment(&'a FragmentDefinition<'a>),
}

#[derive(Debug, PartialEq)]
pub struct OperationDefinition<'a> {
    pub operation: OperationKind,
    /// `None` for anonymous (shorthand) queries.
    pub name: Option<&'a str>,
    pub variable_definitions: &'a [VariableDefinition<'a>],
    pub directives: &'a [Directive<'a>],
    pub selection_set: SelectionSet<'a>,
    pub offset: usize,
}

#[derive(Debug, PartialEq)]
pub struct FragmentDefinition<'a> {
    pub name: &'a str,
    pub type_condition: &'a str,
    pub directives: &'a [Directive<'a>],
    pub selection_set: SelectionSet<'a>,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionSet<'a> {
    pub selections: &'a [Selection<'a>],
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection<'a> {
    Field(&'a Field<'a>),
    FragmentSpread(&'a FragmentSpread<'a>),
    InlineFragment(&'a InlineFragment<'a>),
}

#[derive(Debug, PartialEq)]
pub struct Field<'a> {
    pub alias: Option<&'a str>,
    pub name: &'a str,
    pub arguments: &'a [Argument<'a>],
    pub directives: &'a [Directive<'a>],
    /// Present iff the field has subselections in the source.
    pub selection_set: Option<SelectionSet<'a>>,
    pub offset: usize,
}

#[derive(Debug, PartialEq)]
pub struct FragmentSpread<'a> {
    pub name: &'a str,
    pub directives: &'a [Directive<'a>],
    pub offset: usize,
}

#[derive(Debug, PartialEq)]
pub struct InlineFragment<'a> {
    pub type_condition: Option<&'a str>,
    pub directives: &'a [Directive<'a>],
    pub selection_set: SelectionSet<'a>,
    pub offset: usize,
}

#[derive(Debug, PartialEq)]
pub struct VariableDefinition<'a> {
    /// Without the `$`.
    pub name: &'a str,
    pub ty: &'a TypeRef<'a>,
    pub default_value: Option<Value<'a>>,
    pub directives: &'a [Directive<'a>],
    pub offset: usize,
}

#[derive(Debug, PartialEq)]
pub struct Directive<'a> {
    /// Without the `@`.
    pub name: &'a str,
    pub arguments: &'a [Argument<'a>],
    pub offset: usize,
}

#[derive(Debug, PartialEq)]
pub struct Argument<'a> {
    pub name: &'a str,
    pub value: Value<'a>,
    pub offset: usize,
}

/// Type reference; recursion goes through arena-interior references.
/// The grammar cannot produce `NonNull` directly inside `NonNull`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeRef<'a> {
    Named { name: &'a str, offset: usize },
    List { of: &'a TypeRef<'a>, offset: usize },
    NonNull { of: &'a TypeRef<'a>, offset: usize },
}

impl<'a> TypeRef<'a> {
    pub fn offset(&self) -> usize {
        match *self {
            TypeRef::Named { offset, .. }
            | TypeRef::List { offset, .. }
            | TypeRef::NonNull { offset, .. } => offset,
        }
    }

    /// Name of the innermost named type.
    pub fn base_name(&self) -> &'a str {
        match *self {
            TypeRef::Named { name, .. } => name,
            TypeRef::List { of, .. } | TypeRef::NonNull { of, .. } => of.base_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Variable { name: &'a str, offset: usize },
    Int { raw: &'a str, offset: usize },
    Float { raw: &'a str, offset: usize },
    /// Raw lexeme including the surrounding quotes.
    String { raw: &'a str, offset: usize },
    Boolean { value: bool, offset: usize },
    Null { offset: usize },
    Enum { value: &'a str, offset: usize },
    List(&'a ListValue<'a>),
    Object(&'a ObjectValue<'a>),
}

impl<'a> Value<'a> {
    pub fn offset(&self) -> usize {
        match *self {
            Value::Variable { offset, .. }
            | Value::Int { offset, .. }
            | Value::Float { offset, .. }
            | Value::String { offset, .. }
            | Value::Boolean { offset, .. }
            | Value::Null { offset }
            | Value::Enum { offset, .. } => offset,
            Value::List(list) => list.offset,
            Value::Object(object) => object.offset,
        }
    }

    /// For string values: the content between the quotes (three for block
    /// strings). Escape sequences are left uninterpreted.
    pub fn string_content(&self) -> Option<&'a str> {
        let Value::String { raw, .. } = *self else {
            return None;
        };
        if let Some(inner) = raw
            .strip_prefix("\"\"\"")
            .and_then(|rest| rest.strip_suffix("\"\"\""))
        {
            return Some(inner);
        }
        let mut chars = raw.chars();
        let quote = chars.next()?;
        raw.strip_prefix(quote)?.strip_suffix(quote)
    }
}

#[derive(Debug, PartialEq)]
pub struct ListValue<'a> {
    pub values: &'a [Value<'a>],
    pub offset: usize,
}

#[derive(Debug, PartialEq)]
pub struct ObjectValue<'a> {
    pub fields: &'a [ObjectField<'a>],
    pub offset: usize,
}

#[derive(Debug, PartialEq)]
pub struct ObjectField<'a> {
    pub name: &'a str,
    pub value: Value<'a>,
    pub offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_base_name() {
        let named = TypeRef::Named {
            name: "ID",
            offset: 0,
        };
        let non_null = TypeRef::NonNull {
            of: &named,
            offset: 0,
        };
        let list = TypeRef::List {
            of: &non_null,
            offset: 0,
        };
        assert_eq!(list.base_name(), "ID");
        assert_eq!(non_null.base_name(), "ID");
    }

    #[test]
    fn test_string_content() {
        let regular = Value::String {
            raw: "\"abc\"",
            offset: 0,
        };
        assert_eq!(regular.string_content(), Some("abc"));

        let block = Value::String {
            raw: "\"\"\"a \" b\"\"\"",
            offset: 0,
        };
        assert_eq!(block.string_content(), Some("a \" b"));

        let not_a_string = Value::Null { offset: 0 };
        assert_eq!(not_a_string.string_content(), None);
    }
}
