pub trait Ice {
    type Target;

    /// Unwraps `self` or panics with an ICE (internal error). Only for states the tree-sitter
    /// front end guarantees can't happen, never for bad input.
    fn ice(self) -> Self::Target;
}

impl<T, M: std::fmt::Display> Ice for std::result::Result<T, M> {
    type Target = T;

    fn ice(self) -> T {
        self.map_err(|msg| format!("ICE: {msg}")).unwrap()
    }
}

impl<T> Ice for Option<T> {
    type Target = T;

    fn ice(self) -> T {
        self.ok_or("ICE: missing value").unwrap()
    }
}
