//! Location of the value being coded, for error reporting

use std::fmt::Display;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// Type being coded at this depth
    Type(String),
    Field(String),
    Index(usize),
}

/// Stack of [`PathSegment`]s from the root type down to the current value
///
/// Rendered as `bar.four[2]`, with nested type names that differ from the
/// field's declared name shown in angle brackets, e.g. `bar.inner<foo>.one`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodingPath(Vec<PathSegment>);

impl CodingPath {
    #[must_use]
    pub fn root(type_name: &str) -> Self {
        Self(vec![PathSegment::Type(type_name.to_owned())])
    }

    pub fn push(&mut self, seg: PathSegment) {
        self.0.push(seg)
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    pub fn push_field(&mut self, name: &str) {
        self.push(PathSegment::Field(name.to_owned()))
    }

    pub fn push_type(&mut self, name: &str) {
        self.push(PathSegment::Type(name.to_owned()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl Display for CodingPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (ix, seg) in self.0.iter().enumerate() {
            match seg {
                PathSegment::Type(name) if ix == 0 => f.write_str(name)?,
                PathSegment::Type(name) => write!(f, "<{name}>")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(ix) => write!(f, "[{ix}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        let mut path = CodingPath::root("bar");
        path.push_field("four");
        path.push(PathSegment::Index(2));
        assert_eq!(path.to_string(), "bar.four[2]");
        path.pop();
        path.pop();
        path.push_field("inner");
        path.push_type("foo");
        path.push_field("one");
        assert_eq!(path.to_string(), "bar.inner<foo>.one");
    }
}
