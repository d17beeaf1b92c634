//! Output IR: what classified entities look like once converted for the
//! manifest. [`build::Builder`] produces these from domain entities.

pub mod build;

pub use build::Builder;

use std::collections::BTreeSet;

use crate::domain::model::{Access, EnumConstant, RefKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeRefTraits {
    pub is_enum: bool,
    pub is_vector: bool,
    pub is_optional: bool,
    pub is_shared: bool,
    pub is_const: bool,
    pub ref_kind: Option<RefKind>,
}

impl TypeRefTraits {
    pub fn is_reference(&self) -> bool {
        self.ref_kind == Some(RefKind::Lvalue)
    }

    pub fn is_pointer(&self) -> bool {
        self.ref_kind == Some(RefKind::Pointer)
    }

    pub fn has_any(&self) -> bool {
        self.is_enum
            || self.is_vector
            || self.is_optional
            || self.is_const
            || self.ref_kind.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: String,
    pub namespace: Option<String>,
    pub container: Option<String>,
    pub alias: Option<String>,
    pub header: Option<String>,
    pub is_enum: bool,
    pub traits: TypeRefTraits,
}

impl TypeRef {
    pub fn full_name(&self) -> String {
        crate::domain::model::qualified_name(self.namespace.as_deref(), &self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub name: String,
    pub ty: TypeRef,
    pub init: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamRef {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRef {
    pub name: String,
    pub returns: TypeRef,
    pub params: Vec<ParamRef>,
    pub access: Access,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    pub is_static: bool,
}

/// Callback surface lifted from a `NotificationHelper<T>` base.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackDecl {
    pub ty: TypeRef,
    pub exposed: Vec<ApiRef>,
    pub unexposed: Vec<ApiRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelStruct {
    pub ty: TypeRef,
    pub base: Option<Box<ModelStruct>>,
    pub own_fields: Vec<FieldRef>,
    /// Own fields plus every field inherited through the base chain.
    pub fields: Vec<FieldRef>,
    pub header: Option<String>,
    pub dependent_headers: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnum {
    pub ty: TypeRef,
    pub constants: Vec<EnumConstant>,
    pub header: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModelDecl {
    pub ty: TypeRef,
    pub base: Option<Box<ViewModelDecl>>,
    pub apis: Vec<ApiRef>,
    pub callback: Option<CallbackDecl>,
    pub header: Option<String>,
    pub dependent_headers: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDecl {
    pub ty: TypeRef,
    /// Only APIs carrying the codegen annotation are exposed.
    pub apis: Vec<ApiRef>,
    pub callback: Option<CallbackDecl>,
    pub header: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub models: Vec<ModelStruct>,
    pub enums: Vec<ModelEnum>,
    pub viewmodels: Vec<ViewModelDecl>,
    pub services: Vec<ServiceDecl>,
    pub tool_version: String,
    pub generated_at: String,
}

impl Manifest {
    pub fn new(
        models: Vec<ModelStruct>,
        enums: Vec<ModelEnum>,
        viewmodels: Vec<ViewModelDecl>,
        services: Vec<ServiceDecl>,
    ) -> Self {
        Self {
            models,
            enums,
            viewmodels,
            services,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn total_entities(&self) -> usize {
        self.models.len() + self.enums.len() + self.viewmodels.len() + self.services.len()
    }
}
