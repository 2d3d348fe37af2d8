use super::{Code, Diagnostic, Span};

pub struct DiagnosticBuilder {
    span: Span,
    additional_spans: Vec<(Span, Option<String>)>,
}

impl DiagnosticBuilder {
    pub fn new(span: impl Into<Span>) -> Self {
        Self {
            span: span.into(),
            additional_spans: Vec::new(),
        }
    }

    fn add_additional_span(&mut self, span: impl Into<Span>, message: Option<String>) {
        self.additional_spans.push((span.into(), message));
    }

    fn build_custom(self, code: Code, message: String) -> Diagnostic {
        Diagnostic {
            code,
            message,
            main_span: (self.span, None),
            additional_spans: self.additional_spans,
        }
    }

    pub fn build_syntax_error(self, unexpected: &str) -> Diagnostic {
        let unexpected = unexpected.lines().next().unwrap_or_default().trim();
        let message = if unexpected.is_empty() {
            "syntax error".to_owned()
        } else {
            format!("unexpected input: `{unexpected}`")
        };
        self.build_custom(Code::SyntaxError, message)
    }

    pub fn build_missing_token(self, expected: &str) -> Diagnostic {
        self.build_custom(Code::MissingToken, format!("missing `{expected}`"))
    }

    pub fn build_unimplemented(self, feature: &str) -> Diagnostic {
        self.build_custom(Code::Unimplemented, format!("not implemented: {feature}"))
    }

    pub fn build_unresolved_base_type(self, declaration: Option<Span>) -> Diagnostic {
        let mut builder = self;
        if let Some(declaration) = declaration {
            builder.add_additional_span(
                declaration,
                Some("in this function declaration".to_owned()),
            );
        }
        let msg = "missing type specifier; unable to name the base type".to_owned();
        builder.build_custom(Code::UnresolvedBaseType, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_only_quotes_the_first_line() {
        let d = DiagnosticBuilder::new(0..10).build_syntax_error("  int (\nfoo bar");
        assert_eq!(d.code(), &Code::SyntaxError);
        assert_eq!(d.message(), "unexpected input: `int (`");
    }

    #[test]
    fn unresolved_base_type_points_at_the_declaration() {
        let d = DiagnosticBuilder::new(4..4).build_unresolved_base_type(Some(Span::from(0..12)));
        assert_eq!(d.code(), &Code::UnresolvedBaseType);
        assert_eq!(d.main_span(), &Span::from(4..4));
        assert_eq!(d.additional_spans_len(), 1);
    }
}
