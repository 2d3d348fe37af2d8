use crate::{
    ast::{Declaration, DeclarationKind, Declarator, TranslationUnit},
    cst::Cst,
    diagnostic::{AggregateResult, DiagnosticBuilder, Span},
    util::Ice,
};
use tree_sitter::Node;

/// Lowers the tree-sitter tree into [`Declaration`]s.
///
/// Only declarations are kept. Statements, expressions and preprocessor lines are searched for
/// declarations (a prototype inside a function body, a declaration in a `for` init, the
/// declarations guarded by an `#ifndef` when the source wasn't preprocessed) and otherwise dropped.
pub fn lower(cst: &Cst<'_>) -> AggregateResult<TranslationUnit> {
    AstBuilder::new(cst.source)
        .build_from_items(cst.tree.root_node())
        .map(|declarations| {
            log::debug!("lowered {} top level declarations", declarations.len());
            TranslationUnit { declarations }
        })
}

fn extract_span(node: Node<'_>) -> Span {
    Span::from(node.byte_range())
}

fn wrap(declarator: Declarator) -> Declarator {
    Declarator::Type {
        qualifiers: Vec::new(),
        inner: Box::new(declarator),
    }
}

/// Puts `name` on the leaf of an already built declarator. C declarators are written inside out,
/// so the identifier is only reached after all the levels around it have been built.
fn name_innermost(declarator: &mut Declarator, name: &str) {
    match declarator {
        Declarator::Pointer(inner)
        | Declarator::Type { inner, .. }
        | Declarator::Function { ret: inner, .. } => name_innermost(inner, name),
        Declarator::Named { declared_name, .. } => *declared_name = Some(name.to_owned()),
    }
}

fn is_type_qualifier(text: &str) -> bool {
    matches!(
        text,
        "const" | "volatile" | "restrict" | "__restrict" | "__restrict__" | "_Atomic"
    )
}

/// The specifiers of a declaration, shared by each of its declarators.
struct Specifiers {
    qualifiers: Vec<String>,
    base_names: Vec<String>,
    span: Span,
    nested: Vec<Declaration>,
}

impl Specifiers {
    fn leaf(&self) -> Declarator {
        Declarator::Named {
            qualifiers: self.qualifiers.clone(),
            base_names: self.base_names.clone(),
            declared_name: None,
            span: self.span,
        }
    }
}

struct AstBuilder<'a> {
    source: &'a str,
}

impl<'a> AstBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).ice()
    }

    /// The type qualifiers directly under `node`. The grammar also parses function specifiers
    /// (`_Noreturn`), `__extension__` and `alignas(..)` as `type_qualifier`; those don't change
    /// the type and are dropped.
    fn qualifiers_of(&self, node: Node<'_>) -> Vec<String> {
        let mut cursor = node.walk();
        let qualifiers = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "type_qualifier")
            .map(|child| self.text(child))
            .filter(|text| is_type_qualifier(text))
            .map(str::to_owned)
            .collect();
        qualifiers
    }

    fn build_from_items(&self, node: Node<'_>) -> AggregateResult<Vec<Declaration>> {
        let mut res = AggregateResult::new_ok(Vec::new());

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let items = match child.kind() {
                "declaration" => self.build_from_declaration(child, DeclarationKind::Object),
                "type_definition" => self.build_from_declaration(child, DeclarationKind::Typedef),
                "field_declaration" => self.build_from_declaration(child, DeclarationKind::Field),
                "function_definition" => self.build_from_function_definition(child).map(|d| vec![d]),
                "comment" => continue,
                _ => self.build_from_items(child),
            };
            items.add_to(&mut res, |r, items| r.extend(items));
        }

        res
    }

    fn build_from_specifiers(&self, node: Node<'_>) -> AggregateResult<Specifiers> {
        let qualifiers = self.qualifiers_of(node);

        let Some(ty) = node.child_by_field_name("type") else {
            let start = node.start_byte();
            return AggregateResult::new_ok(Specifiers {
                qualifiers,
                base_names: Vec::new(),
                span: Span::from(start..start),
                nested: Vec::new(),
            });
        };

        self.build_from_type_specifier(ty)
            .map(|(base_names, nested)| Specifiers {
                qualifiers,
                base_names,
                span: extract_span(ty),
                nested,
            })
    }

    /// Returns the base type words and the declarations of a struct or union body.
    fn build_from_type_specifier(
        &self,
        ty: Node<'_>,
    ) -> AggregateResult<(Vec<String>, Vec<Declaration>)> {
        let keyword = match ty.kind() {
            "primitive_type" | "type_identifier" => {
                return AggregateResult::new_ok((vec![self.text(ty).to_owned()], Vec::new()));
            }
            "sized_type_specifier" => {
                let words = self.text(ty).split_whitespace().map(str::to_owned).collect();
                return AggregateResult::new_ok((words, Vec::new()));
            }
            "struct_specifier" => "struct",
            "union_specifier" => "union",
            "enum_specifier" => "enum",
            _ => {
                let feature = format!("type specifier `{}`", self.text(ty));
                let diagnostic = DiagnosticBuilder::new(extract_span(ty)).build_unimplemented(&feature);
                return AggregateResult::new_rec((Vec::new(), Vec::new()), diagnostic);
            }
        };

        let base_name = match ty.child_by_field_name("name") {
            Some(name) => format!("{keyword} {}", self.text(name)),
            None => keyword.to_owned(),
        };

        let nested = match ty.child_by_field_name("body") {
            Some(body) if keyword != "enum" => self.build_from_items(body),
            _ => AggregateResult::new_ok(Vec::new()),
        };

        nested.map(|nested| (vec![base_name], nested))
    }

    /// Lowers a `declaration`, `type_definition` or `field_declaration`.
    fn build_from_declaration(
        &self,
        node: Node<'_>,
        kind: DeclarationKind,
    ) -> AggregateResult<Vec<Declaration>> {
        let span = extract_span(node);

        self.build_from_specifiers(node).and_then(|mut specifiers| {
            // Members of a struct defined in the specifiers belong to the first declarator only,
            // so that they are walked once.
            let mut nested = Some(std::mem::take(&mut specifiers.nested));

            let mut cursor = node.walk();
            let declarators: Vec<_> = node
                .children_by_field_name("declarator", &mut cursor)
                .collect();

            if declarators.is_empty() {
                return AggregateResult::new_ok(vec![Declaration {
                    span,
                    kind,
                    declarator: wrap(specifiers.leaf()),
                    nested: nested.take().unwrap_or_default(),
                }]);
            }

            let mut res = AggregateResult::new_ok(Vec::with_capacity(declarators.len()));
            for declarator in declarators {
                self.build_from_declarator(declarator, specifiers.leaf())
                    .map(|declarator| Declaration {
                        span,
                        kind,
                        declarator: wrap(declarator),
                        nested: nested.take().unwrap_or_default(),
                    })
                    .add_to(&mut res, |r, d| r.push(d));
            }
            res
        })
    }

    fn build_from_function_definition(&self, node: Node<'_>) -> AggregateResult<Declaration> {
        let span = extract_span(node);

        self.build_from_specifiers(node).and_then(|specifiers| {
            let declarator = self.build_from_optional_declarator(
                node.child_by_field_name("declarator"),
                specifiers.leaf(),
            );
            let body = match node.child_by_field_name("body") {
                Some(body) => self.build_from_items(body),
                None => AggregateResult::new_ok(Vec::new()),
            };

            declarator.zip(body).map(|(declarator, body)| {
                let mut nested = specifiers.nested;
                nested.extend(body);
                Declaration {
                    span,
                    kind: DeclarationKind::FunctionDefinition,
                    declarator: wrap(declarator),
                    nested,
                }
            })
        })
    }

    fn build_from_optional_declarator(
        &self,
        node: Option<Node<'_>>,
        ty: Declarator,
    ) -> AggregateResult<Declarator> {
        match node {
            Some(node) => self.build_from_declarator(node, ty),
            None => AggregateResult::new_ok(ty),
        }
    }

    /// Applies the declarator `node` to `ty`, the type built so far from the specifiers and the
    /// enclosing declarator levels.
    fn build_from_declarator(&self, node: Node<'_>, ty: Declarator) -> AggregateResult<Declarator> {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "primitive_type" => {
                let mut ty = ty;
                name_innermost(&mut ty, self.text(node));
                AggregateResult::new_ok(ty)
            }
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let qualifiers = self.qualifiers_of(node);
                let pointee = if qualifiers.is_empty() {
                    ty
                } else {
                    Declarator::Type {
                        qualifiers,
                        inner: Box::new(ty),
                    }
                };
                self.build_from_optional_declarator(
                    node.child_by_field_name("declarator"),
                    Declarator::Pointer(Box::new(pointee)),
                )
            }
            "function_declarator" | "abstract_function_declarator" => {
                let params = match node.child_by_field_name("parameters") {
                    Some(params) => self.build_from_parameter_list(params),
                    None => AggregateResult::new_ok(Vec::new()),
                };
                params.and_then(|params| {
                    self.build_from_optional_declarator(
                        node.child_by_field_name("declarator"),
                        Declarator::Function {
                            ret: Box::new(ty),
                            params,
                        },
                    )
                })
            }
            // Array dimensions and initializers don't show up in the type string.
            "array_declarator" | "abstract_array_declarator" | "init_declarator" => {
                self.build_from_optional_declarator(node.child_by_field_name("declarator"), ty)
            }
            "parenthesized_declarator"
            | "abstract_parenthesized_declarator"
            | "attributed_declarator" => {
                self.build_from_optional_declarator(self.wrapped_declarator(node), ty)
            }
            kind => {
                let feature = format!("declarator `{kind}`");
                let diagnostic = DiagnosticBuilder::new(extract_span(node)).build_unimplemented(&feature);
                AggregateResult::new_rec(ty, diagnostic)
            }
        }
    }

    /// The declarator inside parentheses or in front of attributes, which has no field name.
    fn wrapped_declarator<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let inner = node.named_children(&mut cursor).find(|child| {
            !matches!(
                child.kind(),
                "attribute_declaration" | "attribute_specifier" | "ms_call_modifier" | "comment"
            )
        });
        inner
    }

    fn build_from_parameter_list(&self, node: Node<'_>) -> AggregateResult<Vec<Declarator>> {
        let mut res = AggregateResult::new_ok(Vec::new());

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let param = match child.kind() {
                "parameter_declaration" => {
                    self.build_from_specifiers(child).and_then(|specifiers| {
                        self.build_from_optional_declarator(
                            child.child_by_field_name("declarator"),
                            specifiers.leaf(),
                        )
                    })
                }
                "variadic_parameter" => AggregateResult::new_ok(Declarator::Named {
                    qualifiers: Vec::new(),
                    base_names: vec!["...".to_owned()],
                    declared_name: None,
                    span: extract_span(child),
                }),
                // Old style identifier list; the types are declared after the declarator, which
                // leaves the parameter itself without a base type.
                "identifier" => {
                    let start = child.start_byte();
                    AggregateResult::new_ok(Declarator::Named {
                        qualifiers: Vec::new(),
                        base_names: Vec::new(),
                        declared_name: Some(self.text(child).to_owned()),
                        span: Span::from(start..start),
                    })
                }
                "comment" => continue,
                kind => {
                    let feature = format!("parameter `{kind}`");
                    res.add_rec_diagnostic(
                        DiagnosticBuilder::new(extract_span(child)).build_unimplemented(&feature),
                    );
                    continue;
                }
            };
            param.map(wrap).add_to(&mut res, |r, p| r.push(p));
        }

        res
    }
}
