use strum::{AsRefStr, VariantArray};

mod matcher;

pub(crate) use matcher::KeywordMatcher;

/// GraphQL keywords recognized by the tokenizer. Matching is exact and
/// case-sensitive; the built-in scalar names (`Int`, `Float`, `String`,
/// `Boolean`, `ID`) are ordinary identifiers, not keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, VariantArray)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Query,
    Mutation,
    Subscription,
    Fragment,
    On,
    True,
    False,
    Null,
    Type,
    Input,
    Enum,
    Interface,
    Union,
    Directive,
    Scalar,
    Extend,
    Implements,
    #[strum(serialize = "__typename")]
    Typename,
    #[strum(serialize = "__schema")]
    Schema,
    #[strum(serialize = "__get")]
    Get,
    #[strum(serialize = "__create")]
    Create,
    #[strum(serialize = "__update")]
    Update,
    #[strum(serialize = "__delete")]
    Delete,
}
