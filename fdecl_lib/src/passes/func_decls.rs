//! Finds the function declarators of a translation unit and turns them into [`Signature`]s.
//!
//! Type strings are compact: every pointer level adds a `*` right after the base type
//! (`char **argv` gives `char**`) and only the first qualifier of a level is kept
//! (`const volatile int` gives `const int`). The latter can be lifted with
//! [`QualifierPolicy::All`].

use std::io::Write;

use crate::{
    ast::{Declaration, Declarator, TranslationUnit},
    diagnostic::Span,
    signature::{Parameter, Signature},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QualifierPolicy {
    /// Keep the first qualifier of each level and the first word of the base type.
    #[default]
    First,
    /// Keep every qualifier and every base type word (`const volatile unsigned long`).
    All,
}

impl QualifierPolicy {
    fn push_qualifiers(self, ty: &mut String, qualifiers: &[String]) {
        let qualifiers = match self {
            QualifierPolicy::First => qualifiers.get(..1).unwrap_or(qualifiers),
            QualifierPolicy::All => qualifiers,
        };
        for qualifier in qualifiers {
            ty.push_str(qualifier);
            ty.push(' ');
        }
    }

    fn push_base(self, ty: &mut String, base_names: &[String]) -> bool {
        match (self, base_names) {
            (_, []) => return false,
            (QualifierPolicy::First, [first, ..]) => ty.push_str(first),
            (QualifierPolicy::All, names) => ty.push_str(&names.join(" ")),
        }
        true
    }
}

/// A leaf declarator without a base type, like the parameters of an old style definition
/// `int f(a, b) int a, b; { ... }` or a type specifier the front end couldn't name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unable to resolve the base type of a declarator")]
pub struct UnresolvedBaseType {
    /// Where the base type should have been.
    pub span: Span,
    /// The enclosing declaration, when known.
    pub declaration: Option<Span>,
}

/// Builds the type string of the entity `node` declares, `char*` for `char *copy`.
///
/// For a function declarator this is the return type.
pub fn reconstruct(node: &Declarator) -> Result<String, UnresolvedBaseType> {
    reconstruct_with(node, QualifierPolicy::First)
}

pub fn reconstruct_with(
    node: &Declarator,
    policy: QualifierPolicy,
) -> Result<String, UnresolvedBaseType> {
    build_type(node, String::new(), policy)
}

fn build_type(
    node: &Declarator,
    mut ty: String,
    policy: QualifierPolicy,
) -> Result<String, UnresolvedBaseType> {
    policy.push_qualifiers(&mut ty, node.qualifiers());

    match node {
        Declarator::Named {
            base_names, span, ..
        } => {
            if !policy.push_base(&mut ty, base_names) {
                return Err(UnresolvedBaseType {
                    span: *span,
                    declaration: None,
                });
            }
            Ok(ty)
        }
        Declarator::Pointer(inner)
        | Declarator::Type { inner, .. }
        | Declarator::Function { ret: inner, .. } => {
            let mut ty = build_type(inner, ty, policy)?;
            if let Declarator::Pointer(_) = **inner {
                ty.push('*');
            }
            Ok(ty)
        }
    }
}

/// The identifier `node` declares, `None` for an abstract declarator.
pub fn resolve_name(node: &Declarator) -> Option<&str> {
    match node {
        Declarator::Named { declared_name, .. } => declared_name.as_deref(),
        Declarator::Pointer(inner)
        | Declarator::Type { inner, .. }
        | Declarator::Function { ret: inner, .. } => resolve_name(inner),
    }
}

pub fn extract_parameters(
    params: &[Declarator],
    policy: QualifierPolicy,
) -> Result<Vec<Parameter>, UnresolvedBaseType> {
    params
        .iter()
        .map(|param| {
            Ok(Parameter {
                ty: reconstruct_with(param, policy)?,
                name: resolve_name(param).map(str::to_owned),
            })
        })
        .collect()
}

/// Builds the signature of a function declarator. Abstract function declarators, like the type
/// of an unnamed function pointer parameter, have no name and so no signature.
pub fn signature_of(
    node: &Declarator,
    policy: QualifierPolicy,
) -> Result<Option<Signature>, UnresolvedBaseType> {
    let Declarator::Function { params, .. } = node else {
        return Ok(None);
    };
    let Some(name) = resolve_name(node) else {
        return Ok(None);
    };

    Ok(Some(Signature {
        return_type: reconstruct_with(node, policy)?,
        name: name.to_owned(),
        parameters: extract_parameters(params, policy)?,
    }))
}

#[derive(Debug, Clone, Copy)]
enum Walk<'a> {
    Declaration(&'a Declaration),
    Declarator(&'a Declarator, Span),
}

/// Pre-order walk over every function declarator of a translation unit, in source order.
///
/// A declaration is visited before its nested declarations. Inside a function declarator the
/// function itself comes first, then its parameters, then its return declarator, so the function
/// pointer parameters of a prototype are reported right after the prototype.
///
/// The function type a function returns resolves its name through the return declarator, so
/// `int (*getfn(void))(int);` gives both `int* getfn(void);` and `int getfn(int);`.
///
/// The walk keeps its own stack and borrows the tree, so it can be cloned or simply recreated to
/// walk the same tree again.
#[derive(Debug, Clone)]
pub struct FuncDecls<'a> {
    stack: Vec<Walk<'a>>,
    policy: QualifierPolicy,
}

impl<'a> FuncDecls<'a> {
    pub fn new(tu: &'a TranslationUnit) -> Self {
        Self::with_policy(tu, QualifierPolicy::default())
    }

    pub fn with_policy(tu: &'a TranslationUnit, policy: QualifierPolicy) -> Self {
        Self {
            stack: tu.declarations.iter().rev().map(Walk::Declaration).collect(),
            policy,
        }
    }
}

impl<'a> Iterator for FuncDecls<'a> {
    type Item = Result<Signature, UnresolvedBaseType>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(walk) = self.stack.pop() {
            let (node, declaration) = match walk {
                Walk::Declaration(decl) => {
                    self.stack
                        .extend(decl.nested.iter().rev().map(Walk::Declaration));
                    self.stack.push(Walk::Declarator(&decl.declarator, decl.span));
                    continue;
                }
                Walk::Declarator(node, declaration) => (node, declaration),
            };

            match node {
                Declarator::Named { .. } => {}
                Declarator::Pointer(inner) | Declarator::Type { inner, .. } => {
                    self.stack.push(Walk::Declarator(inner, declaration));
                }
                Declarator::Function { ret, params } => {
                    self.stack.push(Walk::Declarator(ret, declaration));
                    self.stack.extend(
                        params
                            .iter()
                            .rev()
                            .map(|param| Walk::Declarator(param, declaration)),
                    );

                    match signature_of(node, self.policy) {
                        Ok(Some(signature)) => return Some(Ok(signature)),
                        Ok(None) => {}
                        Err(err) => {
                            return Some(Err(UnresolvedBaseType {
                                declaration: Some(declaration),
                                ..err
                            }))
                        }
                    }
                }
            }
        }
        None
    }
}

/// Collects every signature, or the first unresolved base type.
pub fn signatures(
    tu: &TranslationUnit,
    policy: QualifierPolicy,
) -> Result<Vec<Signature>, UnresolvedBaseType> {
    let signatures = FuncDecls::with_policy(tu, policy).collect::<Result<Vec<_>, _>>()?;
    log::debug!("found {} function declarators", signatures.len());
    Ok(signatures)
}

/// Receives the signatures found by [`visit`].
pub trait Reporter {
    type Error;

    fn report(&mut self, signature: Signature) -> Result<(), Self::Error>;
}

impl<F, E> Reporter for F
where
    F: FnMut(Signature) -> Result<(), E>,
{
    type Error = E;

    fn report(&mut self, signature: Signature) -> Result<(), E> {
        self(signature)
    }
}

/// Writes each signature as a prototype line.
#[derive(Debug)]
pub struct PrintReporter<W> {
    out: W,
}

impl<W: Write> PrintReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for PrintReporter<W> {
    type Error = std::io::Error;

    fn report(&mut self, signature: Signature) -> std::io::Result<()> {
        writeln!(self.out, "{signature}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VisitError<E> {
    #[error(transparent)]
    UnresolvedBaseType(#[from] UnresolvedBaseType),
    #[error("the reporter failed")]
    Reporter(#[source] E),
}

/// Hands every function declarator signature of `tu` to `reporter`, in source order.
///
/// The whole tree is walked before the first report, so an [`UnresolvedBaseType`] means nothing
/// was reported. A reporter error stops the remaining reports.
pub fn visit<R: Reporter>(
    tu: &TranslationUnit,
    policy: QualifierPolicy,
    reporter: &mut R,
) -> Result<(), VisitError<R::Error>> {
    for signature in signatures(tu, policy)? {
        reporter.report(signature).map_err(VisitError::Reporter)?;
    }
    Ok(())
}
