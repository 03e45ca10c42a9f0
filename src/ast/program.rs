use crate::ast::Expr;
use crate::diagnostics::Location;

/// A compiled script: header directives plus one content expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub directives: Vec<Directive>,
    pub content: Expr,
}

/// A header line such as `input json` or `schema ./order.xsd type:xsd`.
#[derive(Debug, Clone)]
pub struct Directive {
    /// Directive keyword (`%utlx`, `input`, `output`, `schema`)
    pub name: String,
    /// First argument: version, format or schema path
    pub value: String,
    /// Remaining `key=value` / `key:value` arguments, in order
    pub params: Vec<(String, String)>,
    pub location: Location,
}

impl PartialEq for Directive {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value && self.params == other.params
    }
}

impl Directive {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Program {
    /// Last directive with the given name wins.
    fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().rev().find(|d| d.name == name)
    }

    /// Language version from `%utlx`.
    pub fn version(&self) -> Option<&str> {
        self.directive("%utlx").map(|d| d.value.as_str())
    }

    pub fn input_format(&self) -> Option<&str> {
        self.directive("input").map(|d| d.value.as_str())
    }

    pub fn output_format(&self) -> Option<&str> {
        self.directive("output").map(|d| d.value.as_str())
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().filter(|d| d.name == "schema")
    }
}
