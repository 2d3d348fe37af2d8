use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: String,
    /// `None` for an abstract parameter such as the `void` in `int f(void)`.
    pub name: Option<String>,
}

impl Parameter {
    pub fn new(ty: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            ty: ty.into(),
            name: name.map(str::to_owned),
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {name}", self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// The signature of one function declarator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub return_type: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
}

impl Display for Signature {
    /// Renders as a prototype, `<return type> <name>(<parameters>);`, without a line break.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{parameter}")?;
        }
        write!(f, ");")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_named_and_abstract_parameters() {
        let sig = Signature {
            return_type: "char*".to_owned(),
            name: "copy".to_owned(),
            parameters: vec![
                Parameter::new("const char*", Some("src")),
                Parameter::new("int", None),
            ],
        };
        assert_eq!(sig.to_string(), "char* copy(const char* src, int);");
    }

    #[test]
    fn renders_empty_parameter_list() {
        let sig = Signature {
            return_type: "int".to_owned(),
            name: "main".to_owned(),
            parameters: Vec::new(),
        };
        assert_eq!(sig.to_string(), "int main();");
    }
}
