//! Converts classified domain entities into the manifest IR: container and
//! string normalization, time-alias mapping, base-chain flattening and
//! dependent-header computation.

use std::collections::BTreeSet;

use crate::classify::rules::CALLBACK_BASE;
use crate::domain::model::{
    Api, ClassEntity, EnumEntity, Field, TypeEntity, TypeTraits,
};
use crate::manifest::{
    ApiRef, CallbackDecl, FieldRef, ModelEnum, ModelStruct, ParamRef, ServiceDecl, TypeRef,
    TypeRefTraits, ViewModelDecl,
};

const TIME_ALIASES: &[&str] = &["spark::ms_time_t", "spark::min_time_t"];

pub struct Builder {
    platform_time_type: String,
}

impl Builder {
    pub fn new(platform_time_type: &str) -> Self {
        Self {
            platform_time_type: platform_time_type.to_string(),
        }
    }

    // -- type conversion ----------------------------------------------------

    fn bare_type_ref(name: &str, namespace: Option<&str>) -> TypeRef {
        TypeRef {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            container: None,
            alias: None,
            header: None,
            is_enum: false,
            traits: TypeRefTraits::default(),
        }
    }

    pub fn type_ref(&self, entity: &TypeEntity) -> TypeRef {
        match entity {
            TypeEntity::Primitive { name, alias } => {
                let mut r = Self::bare_type_ref(name, None);
                self.apply_alias(&mut r, alias.as_deref());
                r
            }
            TypeEntity::Recursive { name, namespace } => {
                Self::bare_type_ref(name, namespace.as_deref())
            }
            TypeEntity::Declared(_) | TypeEntity::Class(_) => {
                let args = entity.template_args();
                if let Some(first) = args.first() {
                    // Containers collapse onto their first argument.
                    let mut inner = self.type_ref(first);
                    let container = crate::domain::model::qualified_name(
                        entity.namespace(),
                        entity.name(),
                    );
                    Self::set_container(&mut inner, Some(container));
                    self.apply_alias(&mut inner, entity.alias());
                    inner
                } else {
                    let mut r = Self::bare_type_ref(entity.name(), entity.namespace());
                    r.header = entity.header().map(str::to_string);
                    self.apply_alias(&mut r, entity.alias());
                    r
                }
            }
            TypeEntity::Enum(e) => {
                let mut r = Self::bare_type_ref(&e.name, e.namespace.as_deref());
                r.is_enum = true;
                r.header = e.header.clone();
                r
            }
        }
    }

    /// `std::basic_string` spellings collapse to `std::string`/`std::wstring`
    /// so the manifest never leaks template plumbing.
    fn set_container(r: &mut TypeRef, container: Option<String>) {
        r.container = container;
        let container = r.container.as_deref();

        if r.name == "char"
            && matches!(container, Some("std::basic_string") | Some("std::string"))
        {
            r.name = "string".to_string();
            r.namespace = Some("std".to_string());
            r.container = None;
        } else if r.name == "basic_string" && container == Some("std::vector") {
            r.name = "string".to_string();
            r.namespace = Some("std".to_string());
        }

        if r.name == "wchar_t"
            && matches!(
                r.container.as_deref(),
                Some("std::basic_string") | Some("std::wstring")
            )
        {
            r.name = "wstring".to_string();
            r.namespace = Some("std".to_string());
            r.container = None;
        }
    }

    /// Records the written alias; platform time aliases additionally rewrite
    /// the type to the configured platform time type.
    fn apply_alias(&self, r: &mut TypeRef, alias: Option<&str>) {
        let Some(alias) = alias else {
            return;
        };
        r.alias = Some(alias.to_string());
        if TIME_ALIASES.iter().any(|t| alias.contains(t)) {
            r.name = self.platform_time_type.clone();
            r.namespace = None;
        }
    }

    fn with_traits(&self, entity: &TypeEntity, traits: &TypeTraits) -> TypeRef {
        let mut r = self.type_ref(entity);
        r.traits = TypeRefTraits {
            is_enum: r.is_enum,
            is_vector: r.container.as_deref() == Some("std::vector"),
            is_optional: r.container.as_deref() == Some("std::optional"),
            is_shared: r.container.as_deref() == Some("std::shared_ptr"),
            is_const: traits.is_const,
            ref_kind: traits.ref_kind,
        };
        r
    }

    // -- member conversion --------------------------------------------------

    fn field(&self, f: &Field) -> FieldRef {
        FieldRef {
            name: f.name.clone(),
            ty: self.with_traits(&f.type_info, &f.traits),
            init: f.init_value.clone(),
        }
    }

    fn api(&self, a: &Api) -> ApiRef {
        ApiRef {
            name: a.name.clone(),
            returns: self.with_traits(&a.returns.type_info, &a.returns.traits),
            params: a
                .params
                .iter()
                .map(|p| ParamRef {
                    name: p.name.clone(),
                    ty: self.with_traits(&p.type_info, &p.traits),
                })
                .collect(),
            access: a.access,
            is_const: a.traits.is_const,
            is_virtual: a.traits.is_virtual,
            is_abstract: a.traits.is_abstract,
            is_static: a.traits.is_static,
        }
    }

    fn callback(&self, entity: &TypeEntity, split_by_tag: bool) -> Option<CallbackDecl> {
        let TypeEntity::Class(class) = entity else {
            tracing::warn!(
                "callback base {} is not a scanned class definition",
                entity.complete_name()
            );
            return None;
        };
        let (exposed, unexposed) = if split_by_tag {
            let exposed = class
                .methods
                .iter()
                .filter(|m| m.has_codegen_tag())
                .map(|m| self.api(m))
                .collect();
            let unexposed = class
                .methods
                .iter()
                .filter(|m| !m.has_codegen_tag())
                .map(|m| self.api(m))
                .collect();
            (exposed, unexposed)
        } else {
            (class.methods.iter().map(|m| self.api(m)).collect(), Vec::new())
        };
        Some(CallbackDecl {
            ty: self.type_ref(entity),
            exposed,
            unexposed,
        })
    }

    fn callback_arg<'e>(base: &'e TypeEntity) -> Option<&'e TypeEntity> {
        if base.name() == CALLBACK_BASE {
            base.template_args().first()
        } else {
            None
        }
    }

    // -- entities -----------------------------------------------------------

    pub fn model(&self, class: &ClassEntity) -> ModelStruct {
        let base = class.bases.first().and_then(|b| match b {
            TypeEntity::Class(base_class) => Some(Box::new(self.model(base_class))),
            _ => None,
        });

        let own_fields: Vec<FieldRef> = class.members.iter().map(|f| self.field(f)).collect();
        let mut fields = own_fields.clone();
        let mut chain = base.as_deref();
        while let Some(b) = chain {
            fields.extend(b.own_fields.iter().cloned());
            chain = b.base.as_deref();
        }

        let header = class.header.clone();
        let mut dependent_headers: BTreeSet<String> = fields
            .iter()
            .filter_map(|f| f.ty.header.clone())
            .collect();
        if let Some(b) = &base {
            if let Some(h) = &b.ty.header {
                dependent_headers.insert(h.clone());
            }
        }
        if let Some(own) = &header {
            dependent_headers.remove(own);
        }

        ModelStruct {
            ty: self.type_ref_for_class(class),
            base,
            own_fields,
            fields,
            header,
            dependent_headers,
        }
    }

    pub fn viewmodel(&self, class: &ClassEntity) -> ViewModelDecl {
        let mut base = None;
        let mut callback = None;
        for b in &class.bases {
            if let Some(arg) = Self::callback_arg(b) {
                callback = self.callback(arg, false);
            } else if base.is_none() {
                if let TypeEntity::Class(base_class) = b {
                    base = Some(Box::new(self.viewmodel(base_class)));
                }
            }
        }

        let apis: Vec<ApiRef> = class.methods.iter().map(|m| self.api(m)).collect();

        let header = class.header.clone();
        let mut dependent_headers: BTreeSet<String> = apis
            .iter()
            .flat_map(|api| {
                api.params
                    .iter()
                    .filter_map(|p| p.ty.header.clone())
                    .chain(api.returns.header.clone())
            })
            .collect();
        if let Some(own) = &header {
            dependent_headers.remove(own);
        }

        ViewModelDecl {
            ty: self.type_ref_for_class(class),
            base,
            apis,
            callback,
            header,
            dependent_headers,
        }
    }

    pub fn service(&self, class: &ClassEntity) -> ServiceDecl {
        let apis = class
            .methods
            .iter()
            .filter(|m| m.has_codegen_tag())
            .map(|m| self.api(m))
            .collect();

        let callback = class
            .bases
            .iter()
            .find_map(Self::callback_arg)
            .and_then(|arg| self.callback(arg, true));

        ServiceDecl {
            ty: self.type_ref_for_class(class),
            apis,
            callback,
            header: class.header.clone(),
        }
    }

    pub fn enumeration(&self, en: &EnumEntity) -> ModelEnum {
        let mut ty = Self::bare_type_ref(&en.name, en.namespace.as_deref());
        ty.is_enum = true;
        ty.header = en.header.clone();
        ModelEnum {
            ty,
            constants: en.constants.clone(),
            header: en.header.clone(),
        }
    }

    fn type_ref_for_class(&self, class: &ClassEntity) -> TypeRef {
        let mut r = Self::bare_type_ref(&class.name, class.namespace.as_deref());
        r.header = class.header.clone();
        self.apply_alias(&mut r, class.alias.as_deref());
        r
    }
}
