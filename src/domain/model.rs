//! Language-neutral entity model for parsed header declarations.
//!
//! Everything the parser and composer produce lives here; the classifier and
//! manifest builder only ever see these types, never raw tokens.

use std::fmt;

/// Joins a namespace and a bare name into a fully qualified spelling.
pub fn qualified_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}::{}", ns, name),
        _ => name.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Private,
    Protected,
    Public,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Private => "private",
            Access::Protected => "protected",
            Access::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Lvalue,
    Rvalue,
    Pointer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Const/reference qualifiers of a used type (field, param or return).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeTraits {
    pub is_const: bool,
    pub ref_kind: Option<RefKind>,
}

/// Method qualifiers, plus the codegen annotation when present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiTraits {
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    pub is_static: bool,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    pub name: String,
    pub value: i64,
}

/// A class that is referenced but whose definition was not part of the scan
/// (for example `std::vector<T>` or a forward declaration).
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredClass {
    pub name: String,
    pub namespace: Option<String>,
    pub template_args: Vec<TypeEntity>,
    pub header: Option<String>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntity {
    pub name: String,
    pub namespace: Option<String>,
    pub template_args: Vec<TypeEntity>,
    pub bases: Vec<TypeEntity>,
    pub members: Vec<Field>,
    pub methods: Vec<Api>,
    pub header: Option<String>,
    pub location: Location,
    pub annotation: Option<String>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntity {
    pub name: String,
    pub namespace: Option<String>,
    pub constants: Vec<EnumConstant>,
    pub header: Option<String>,
    pub location: Location,
}

/// A resolved type as seen at a usage site.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeEntity {
    Primitive {
        name: String,
        alias: Option<String>,
    },
    /// Back-reference to a class currently being composed; breaks cycles.
    Recursive {
        name: String,
        namespace: Option<String>,
    },
    Declared(DeclaredClass),
    Class(Box<ClassEntity>),
    Enum(EnumEntity),
}

impl TypeEntity {
    pub fn name(&self) -> &str {
        match self {
            TypeEntity::Primitive { name, .. } => name,
            TypeEntity::Recursive { name, .. } => name,
            TypeEntity::Declared(d) => &d.name,
            TypeEntity::Class(c) => &c.name,
            TypeEntity::Enum(e) => &e.name,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            TypeEntity::Primitive { .. } => None,
            TypeEntity::Recursive { namespace, .. } => namespace.as_deref(),
            TypeEntity::Declared(d) => d.namespace.as_deref(),
            TypeEntity::Class(c) => c.namespace.as_deref(),
            TypeEntity::Enum(e) => e.namespace.as_deref(),
        }
    }

    pub fn template_args(&self) -> &[TypeEntity] {
        match self {
            TypeEntity::Declared(d) => &d.template_args,
            TypeEntity::Class(c) => &c.template_args,
            _ => &[],
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            TypeEntity::Primitive { alias, .. } => alias.as_deref(),
            TypeEntity::Declared(d) => d.alias.as_deref(),
            TypeEntity::Class(c) => c.alias.as_deref(),
            _ => None,
        }
    }

    pub fn header(&self) -> Option<&str> {
        match self {
            TypeEntity::Declared(d) => d.header.as_deref(),
            TypeEntity::Class(c) => c.header.as_deref(),
            TypeEntity::Enum(e) => e.header.as_deref(),
            _ => None,
        }
    }

    /// Qualified spelling including the first template argument, matching the
    /// way entities identify themselves in logs and reports.
    pub fn complete_name(&self) -> String {
        let base = qualified_name(self.namespace(), self.name());
        match self.template_args().first() {
            Some(arg) => format!("{}<{}>", base, arg.complete_name()),
            None => base,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeEntity::Primitive { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TypeEntity::Enum(_))
    }
}

impl fmt::Display for TypeEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.complete_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub access: Access,
    pub type_info: TypeEntity,
    pub traits: TypeTraits,
    pub init_value: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_info: TypeEntity,
    pub traits: TypeTraits,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiReturn {
    pub type_info: TypeEntity,
    pub traits: TypeTraits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Api {
    pub name: String,
    pub access: Access,
    pub returns: ApiReturn,
    pub params: Vec<Param>,
    pub traits: ApiTraits,
    pub location: Location,
}

impl Api {
    pub fn has_codegen_tag(&self) -> bool {
        self.traits.annotation.as_deref() == Some(crate::classify::rules::CODEGEN_TAG)
    }
}

impl ClassEntity {
    pub fn complete_name(&self) -> String {
        let base = qualified_name(self.namespace.as_deref(), &self.name);
        match self.template_args.first() {
            Some(arg) => format!("{}<{}>", base, arg.complete_name()),
            None => base,
        }
    }
}

impl EnumEntity {
    pub fn complete_name(&self) -> String {
        qualified_name(self.namespace.as_deref(), &self.name)
    }
}

/// A top-level declaration eligible for classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Class(ClassEntity),
    Enum(EnumEntity),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Class(c) => &c.name,
            Entity::Enum(e) => &e.name,
        }
    }

    pub fn complete_name(&self) -> String {
        match self {
            Entity::Class(c) => c.complete_name(),
            Entity::Enum(e) => e.complete_name(),
        }
    }

    pub fn header(&self) -> Option<&str> {
        match self {
            Entity::Class(c) => c.header.as_deref(),
            Entity::Enum(e) => e.header.as_deref(),
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Entity::Class(c) => &c.location,
            Entity::Enum(e) => &e.location,
        }
    }

    pub fn annotation(&self) -> Option<&str> {
        match self {
            Entity::Class(c) => c.annotation.as_deref(),
            Entity::Enum(_) => None,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.complete_name())
    }
}

/// Everything the transform stage hands to the load stage.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub manifest: crate::manifest::Manifest,
    pub unclassified: Vec<String>,
    pub ignored_callbacks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location {
            file: "test.h".to_string(),
            line: 1,
            column: 1,
        }
    }

    #[test]
    fn complete_name_includes_namespace_and_template_arg() {
        let handle = TypeEntity::Declared(DeclaredClass {
            name: "handle".to_string(),
            namespace: Some("spark".to_string()),
            template_args: vec![TypeEntity::Primitive {
                name: "int".to_string(),
                alias: None,
            }],
            header: None,
            alias: None,
        });
        assert_eq!(handle.complete_name(), "spark::handle<int>");
    }

    #[test]
    fn entity_display_matches_complete_name() {
        let entity = Entity::Enum(EnumEntity {
            name: "PresenceState".to_string(),
            namespace: Some("roster".to_string()),
            constants: vec![],
            header: None,
            location: loc(),
        });
        assert_eq!(entity.to_string(), "roster::PresenceState");
    }
}
