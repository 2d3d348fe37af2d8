use crate::diagnostic::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub declarations: Vec<Declaration>,
}

/// One declared entity. A declaration statement with several declarators (`int a, *b;`) is
/// lowered into one `Declaration` per declarator.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub span: Span,
    pub kind: DeclarationKind,
    pub declarator: Declarator,
    /// Declarations nested inside this one, in source order: the members of a struct or union
    /// defined in the specifiers, and the block scope declarations of a function body.
    pub nested: Vec<Declaration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Object,
    Typedef,
    FunctionDefinition,
    Field,
}

/// The type structure of a declared entity, outermost level first.
///
/// `char *copy(const char *src)` is lowered as
///
/// ```text
/// Function {
///     ret: Pointer(Named { base_names: ["char"], declared_name: Some("copy") }),
///     params: [Type { inner: Pointer(Named { qualifiers: ["const"], base_names: ["char"],
///                                            declared_name: Some("src") }) }],
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Declarator {
    Pointer(Box<Declarator>),
    /// A level that only carries qualifiers. Every declared object, parameter and type name is
    /// wrapped in one (usually without qualifiers); qualifiers written after a `*` also end up
    /// here.
    Type {
        qualifiers: Vec<String>,
        inner: Box<Declarator>,
    },
    Named {
        qualifiers: Vec<String>,
        base_names: Vec<String>,
        declared_name: Option<String>,
        span: Span,
    },
    Function {
        ret: Box<Declarator>,
        params: Vec<Declarator>,
    },
}

impl Declarator {
    /// A leaf without qualifiers.
    pub fn named(base_names: &[&str], declared_name: Option<&str>) -> Self {
        Declarator::Named {
            qualifiers: Vec::new(),
            base_names: base_names.iter().map(|s| s.to_string()).collect(),
            declared_name: declared_name.map(str::to_owned),
            span: Span::default(),
        }
    }

    pub fn pointer(inner: Declarator) -> Self {
        Declarator::Pointer(Box::new(inner))
    }

    pub fn qualified(qualifiers: &[&str], inner: Declarator) -> Self {
        Declarator::Type {
            qualifiers: qualifiers.iter().map(|s| s.to_string()).collect(),
            inner: Box::new(inner),
        }
    }

    pub fn qualifiers(&self) -> &[String] {
        match self {
            Declarator::Type { qualifiers, .. } | Declarator::Named { qualifiers, .. } => qualifiers,
            Declarator::Pointer(_) | Declarator::Function { .. } => &[],
        }
    }

    /// The wrapped declarator; the return declarator for a function.
    pub fn inner(&self) -> Option<&Declarator> {
        match self {
            Declarator::Pointer(inner)
            | Declarator::Type { inner, .. }
            | Declarator::Function { ret: inner, .. } => Some(inner),
            Declarator::Named { .. } => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Declarator::Function { .. })
    }
}
