//! Raw declarations as spelled in a header, before name resolution.

use crate::domain::model::{Access, Location, RefKind};

#[derive(Debug, Clone, PartialEq)]
pub struct RawType {
    pub is_const: bool,
    /// Qualified name split at `::` (`["spark", "handle"]`).
    pub segments: Vec<String>,
    pub template_args: Vec<RawType>,
    pub ref_kind: Option<RefKind>,
}

impl RawType {
    pub fn named(name: &str) -> Self {
        Self {
            is_const: false,
            segments: vec![name.to_string()],
            template_args: Vec::new(),
            ref_kind: None,
        }
    }

    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn namespace(&self) -> Option<String> {
        if self.segments.len() > 1 {
            Some(self.segments[..self.segments.len() - 1].join("::"))
        } else {
            None
        }
    }

    pub fn qualified(&self) -> String {
        self.segments.join("::")
    }

    /// Written spelling without qualifiers, e.g. `spark::handle<int>`.
    pub fn spelling(&self) -> String {
        let mut s = self.qualified();
        if !self.template_args.is_empty() {
            let args: Vec<String> = self.template_args.iter().map(|a| a.spelling()).collect();
            s.push('<');
            s.push_str(&args.join(", "));
            s.push('>');
        }
        s
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawParam {
    pub name: String,
    pub ty: RawType,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawMethod {
    pub name: String,
    pub ret: RawType,
    pub params: Vec<RawParam>,
    pub is_virtual: bool,
    pub is_static: bool,
    pub is_const: bool,
    pub is_pure: bool,
    pub access: Access,
    pub annotation: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub name: String,
    pub ty: RawType,
    pub init: Option<String>,
    pub access: Access,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawClass {
    pub name: String,
    pub namespace: Option<String>,
    pub is_struct: bool,
    /// Class templates are kept for container lookups but are not
    /// classifiable entities themselves.
    pub template_params: Vec<String>,
    pub bases: Vec<RawType>,
    pub fields: Vec<RawField>,
    pub methods: Vec<RawMethod>,
    pub annotation: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawEnumConstant {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawEnum {
    pub name: String,
    pub namespace: Option<String>,
    pub is_scoped: bool,
    pub constants: Vec<RawEnumConstant>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawAlias {
    pub name: String,
    pub namespace: Option<String>,
    pub target: RawType,
    pub location: Location,
}

/// All declarations parsed out of one header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedHeader {
    pub path: String,
    pub classes: Vec<RawClass>,
    pub enums: Vec<RawEnum>,
    pub aliases: Vec<RawAlias>,
}
