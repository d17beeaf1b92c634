//! JSON rendering of the manifest. Document shapes follow the established
//! manifest format: one object per entity with `"model name"` /
//! `"viewmodel"` / `"service"` / `"enum name"` heads, `"def header"`
//! attribution and per-API `returns`/`params`/`access` blocks.

use serde_json::{Map, Value};

use crate::manifest::{
    ApiRef, CallbackDecl, Manifest, ModelEnum, ModelStruct, ServiceDecl, TypeRef, TypeRefTraits,
    ViewModelDecl,
};
use crate::utils::error::Result;

fn traits_string(traits: &TypeRefTraits) -> String {
    let mut s = String::new();
    if traits.is_const {
        s.push_str("const ");
    }
    if traits.is_reference() {
        s.push('&');
    }
    s
}

pub fn type_doc(ty: &TypeRef) -> Value {
    let mut doc = Map::new();
    doc.insert("type".to_string(), Value::String(ty.full_name()));
    if let Some(container) = &ty.container {
        doc.insert("container".to_string(), Value::String(container.clone()));
    }
    let traits = traits_string(&ty.traits);
    if !traits.is_empty() {
        doc.insert("traits".to_string(), Value::String(traits));
    }
    Value::Object(doc)
}

fn header_value(header: &Option<String>) -> Value {
    match header {
        Some(h) => Value::String(h.clone()),
        None => Value::Null,
    }
}

fn api_doc(api: &ApiRef) -> Value {
    let mut params = Map::new();
    for param in &api.params {
        params.insert(param.name.clone(), type_doc(&param.ty));
    }

    let mut doc = Map::new();
    doc.insert("returns".to_string(), type_doc(&api.returns));
    doc.insert("params".to_string(), Value::Object(params));
    doc.insert(
        "access".to_string(),
        Value::String(api.access.as_str().to_string()),
    );
    Value::Object(doc)
}

fn apis_doc(apis: &[ApiRef]) -> Value {
    let mut doc = Map::new();
    for api in apis {
        doc.insert(api.name.clone(), api_doc(api));
    }
    Value::Object(doc)
}

fn callback_doc(callback: &CallbackDecl) -> Value {
    let mut doc = Map::new();
    for api in callback.exposed.iter().chain(callback.unexposed.iter()) {
        doc.insert(api.name.clone(), api_doc(api));
    }
    Value::Object(doc)
}

pub fn model_doc(model: &ModelStruct) -> Value {
    let mut doc = Map::new();
    doc.insert(
        "model name".to_string(),
        Value::String(model.ty.full_name()),
    );
    doc.insert("def header".to_string(), header_value(&model.header));
    if let Some(base) = &model.base {
        doc.insert("base".to_string(), Value::String(base.ty.full_name()));
    }
    let mut fields = Map::new();
    for field in &model.fields {
        fields.insert(field.name.clone(), type_doc(&field.ty));
    }
    doc.insert("fields".to_string(), Value::Object(fields));
    Value::Object(doc)
}

pub fn enum_doc(en: &ModelEnum) -> Value {
    let mut doc = Map::new();
    doc.insert("enum name".to_string(), Value::String(en.ty.full_name()));
    doc.insert("def header".to_string(), header_value(&en.header));
    let mut constants = Map::new();
    for constant in &en.constants {
        constants.insert(constant.name.clone(), Value::from(constant.value));
    }
    doc.insert("constants".to_string(), Value::Object(constants));
    Value::Object(doc)
}

pub fn viewmodel_doc(vm: &ViewModelDecl) -> Value {
    let mut doc = Map::new();
    doc.insert("viewmodel".to_string(), Value::String(vm.ty.full_name()));
    doc.insert("def header".to_string(), header_value(&vm.header));
    if let Some(base) = &vm.base {
        doc.insert("base".to_string(), Value::String(base.ty.full_name()));
    }
    doc.insert("apis".to_string(), apis_doc(&vm.apis));
    if let Some(callback) = &vm.callback {
        doc.insert("callback apis".to_string(), callback_doc(callback));
    }
    Value::Object(doc)
}

pub fn service_doc(service: &ServiceDecl) -> Value {
    let mut doc = Map::new();
    doc.insert(
        "service".to_string(),
        Value::String(service.ty.full_name()),
    );
    doc.insert("def header".to_string(), header_value(&service.header));
    doc.insert("apis".to_string(), apis_doc(&service.apis));
    if let Some(callback) = &service.callback {
        doc.insert("callback apis".to_string(), callback_doc(callback));
    }
    Value::Object(doc)
}

pub fn manifest_doc(manifest: &Manifest) -> Value {
    let mut tool = Map::new();
    tool.insert(
        "name".to_string(),
        Value::String(env!("CARGO_PKG_NAME").to_string()),
    );
    tool.insert(
        "version".to_string(),
        Value::String(manifest.tool_version.clone()),
    );
    tool.insert(
        "generated at".to_string(),
        Value::String(manifest.generated_at.clone()),
    );

    let mut doc = Map::new();
    doc.insert("tool".to_string(), Value::Object(tool));
    doc.insert(
        "models".to_string(),
        Value::Array(manifest.models.iter().map(model_doc).collect()),
    );
    doc.insert(
        "enums".to_string(),
        Value::Array(manifest.enums.iter().map(enum_doc).collect()),
    );
    doc.insert(
        "viewmodels".to_string(),
        Value::Array(manifest.viewmodels.iter().map(viewmodel_doc).collect()),
    );
    doc.insert(
        "services".to_string(),
        Value::Array(manifest.services.iter().map(service_doc).collect()),
    );
    Value::Object(doc)
}

/// Human summary, listing only non-empty categories.
pub fn summary_line(manifest: &Manifest) -> String {
    let mut line = String::from("Parsed");
    if !manifest.models.is_empty() {
        line.push_str(&format!(" models: {}", manifest.models.len()));
    }
    if !manifest.enums.is_empty() {
        line.push_str(&format!(" enums: {}", manifest.enums.len()));
    }
    if !manifest.viewmodels.is_empty() {
        line.push_str(&format!(" viewmodels: {}", manifest.viewmodels.len()));
    }
    if !manifest.services.is_empty() {
        line.push_str(&format!(" services: {}", manifest.services.len()));
    }
    line
}

pub fn render(manifest: &Manifest, pretty: bool) -> Result<String> {
    let doc = manifest_doc(manifest);
    let rendered = if pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EnumConstant, RefKind};
    use crate::manifest::{ParamRef, TypeRefTraits};
    use std::collections::BTreeSet;

    fn type_ref(name: &str, namespace: Option<&str>) -> TypeRef {
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

    #[test]
    fn type_doc_renders_traits_as_a_qualifier_string() {
        let mut ty = type_ref("handle", Some("spark"));
        ty.traits = TypeRefTraits {
            is_const: true,
            ref_kind: Some(RefKind::Lvalue),
            ..Default::default()
        };
        let doc = type_doc(&ty);
        assert_eq!(doc["type"], "spark::handle");
        assert_eq!(doc["traits"], "const &");
    }

    #[test]
    fn enum_doc_lists_constants_with_values() {
        let en = ModelEnum {
            ty: type_ref("PresenceState", None),
            constants: vec![
                EnumConstant {
                    name: "Offline".to_string(),
                    value: 0,
                },
                EnumConstant {
                    name: "Online".to_string(),
                    value: 1,
                },
            ],
            header: Some("src/model/Presence.h".to_string()),
        };
        let doc = enum_doc(&en);
        assert_eq!(doc["enum name"], "PresenceState");
        assert_eq!(doc["def header"], "src/model/Presence.h");
        assert_eq!(doc["constants"]["Online"], 1);
    }

    #[test]
    fn viewmodel_doc_includes_apis_and_access() {
        let api = ApiRef {
            name: "setFilter".to_string(),
            returns: type_ref("void", None),
            params: vec![ParamRef {
                name: "mode".to_string(),
                ty: type_ref("int", None),
            }],
            access: crate::domain::model::Access::Public,
            is_const: false,
            is_virtual: true,
            is_abstract: true,
            is_static: false,
        };
        let vm = ViewModelDecl {
            ty: type_ref("RosterViewModel", None),
            base: None,
            apis: vec![api],
            callback: None,
            header: Some("src/viewmodel/Roster.h".to_string()),
            dependent_headers: BTreeSet::new(),
        };
        let doc = viewmodel_doc(&vm);
        assert_eq!(doc["viewmodel"], "RosterViewModel");
        assert_eq!(doc["apis"]["setFilter"]["access"], "public");
        assert_eq!(doc["apis"]["setFilter"]["params"]["mode"]["type"], "int");
        assert_eq!(doc["apis"]["setFilter"]["returns"]["type"], "void");
    }

    #[test]
    fn summary_line_skips_empty_categories() {
        let manifest = Manifest::new(
            vec![],
            vec![ModelEnum {
                ty: type_ref("PresenceState", None),
                constants: vec![],
                header: None,
            }],
            vec![],
            vec![],
        );
        assert_eq!(summary_line(&manifest), "Parsed enums: 1");
    }
}
