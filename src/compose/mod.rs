//! Lifts raw parsed declarations into the domain entity model: named types
//! are resolved against every scanned header, aliases keep their written
//! spelling, and self-referential classes resolve to back-references.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::model::{
    Api, ApiReturn, ApiTraits, ClassEntity, DeclaredClass, Entity, EnumConstant, EnumEntity,
    Field, Location, Param, TypeEntity, TypeTraits,
};
use crate::parse::decl::{ParsedHeader, RawAlias, RawClass, RawEnum, RawType};
use crate::parse::parser::parse_type_spelling;

const PRIMITIVE_NAMES: &[&str] = &[
    "void", "bool", "char", "wchar_t", "int", "float", "double", "short", "long", "unsigned",
    "signed",
];

fn is_primitive_name(name: &str) -> bool {
    PRIMITIVE_NAMES.contains(&name) || name.contains(' ')
}

fn namespace_stripped(spelling: &str) -> String {
    static NS_RE: OnceLock<Regex> = OnceLock::new();
    let re = NS_RE.get_or_init(|| Regex::new(r"[A-Za-z_0-9]+::").expect("static regex"));
    re.replace_all(spelling, "").into_owned()
}

/// Output paths never contribute header attribution.
fn project_header(path: &str) -> Option<String> {
    if path.starts_with("codegen") {
        None
    } else {
        Some(path.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
enum Symbol<'a> {
    Class { raw: &'a RawClass, path: &'a str },
    Enum { raw: &'a RawEnum, path: &'a str },
    Alias { target: &'a RawType },
}

struct SymbolTable<'a> {
    by_full_name: HashMap<String, Symbol<'a>>,
    by_bare_name: HashMap<&'a str, Vec<String>>,
}

impl<'a> SymbolTable<'a> {
    fn build(headers: &'a [&'a ParsedHeader], define_aliases: &'a [RawAlias]) -> Self {
        let mut table = SymbolTable {
            by_full_name: HashMap::new(),
            by_bare_name: HashMap::new(),
        };

        for header in headers {
            for class in &header.classes {
                let full = crate::domain::model::qualified_name(
                    class.namespace.as_deref(),
                    &class.name,
                );
                table.by_bare_name.entry(class.name.as_str()).or_default().push(full.clone());
                table.by_full_name.insert(
                    full,
                    Symbol::Class {
                        raw: class,
                        path: &header.path,
                    },
                );
            }
            for en in &header.enums {
                let full =
                    crate::domain::model::qualified_name(en.namespace.as_deref(), &en.name);
                table.by_bare_name.entry(en.name.as_str()).or_default().push(full.clone());
                table.by_full_name.insert(
                    full,
                    Symbol::Enum {
                        raw: en,
                        path: &header.path,
                    },
                );
            }
            for alias in &header.aliases {
                let full =
                    crate::domain::model::qualified_name(alias.namespace.as_deref(), &alias.name);
                table
                    .by_bare_name
                    .entry(alias.name.as_str())
                    .or_default()
                    .push(full.clone());
                table.by_full_name.insert(
                    full,
                    Symbol::Alias {
                        target: &alias.target,
                    },
                );
            }
        }

        for alias in define_aliases {
            table
                .by_bare_name
                .entry(alias.name.as_str())
                .or_default()
                .push(alias.name.clone());
            table.by_full_name.insert(
                alias.name.clone(),
                Symbol::Alias {
                    target: &alias.target,
                },
            );
        }

        table
    }

    fn lookup(&self, raw: &RawType, current_ns: Option<&str>) -> Option<Symbol<'a>> {
        let qualified = raw.qualified();
        if let Some(sym) = self.by_full_name.get(&qualified) {
            return Some(*sym);
        }
        if let Some(ns) = current_ns {
            if let Some(sym) = self.by_full_name.get(&format!("{}::{}", ns, qualified)) {
                return Some(*sym);
            }
        }
        if raw.segments.len() == 1 {
            if let Some(candidates) = self.by_bare_name.get(raw.name()) {
                if candidates.len() == 1 {
                    return self.by_full_name.get(&candidates[0]).copied();
                }
            }
        }
        None
    }
}

pub struct Composer<'a> {
    symbols: SymbolTable<'a>,
    memo: HashMap<String, ClassEntity>,
}

/// Composes the classifiable entities of the listed headers. Support headers
/// (reached through includes) only feed name resolution.
pub fn compose_entities(
    listed: &[ParsedHeader],
    support: &[ParsedHeader],
    defines: &[(String, String)],
) -> Vec<Entity> {
    let define_aliases: Vec<RawAlias> = defines
        .iter()
        .filter_map(|(name, replacement)| {
            let target = parse_type_spelling(replacement);
            if target.is_none() {
                tracing::debug!("define '{}' is not a type alias, ignoring", name);
            }
            target.map(|target| RawAlias {
                name: name.clone(),
                namespace: None,
                target,
                location: Location {
                    file: "<define>".to_string(),
                    line: 1,
                    column: 1,
                },
            })
        })
        .collect();

    let all: Vec<&ParsedHeader> = listed.iter().chain(support.iter()).collect();
    let mut composer = Composer {
        symbols: SymbolTable::build(&all, &define_aliases),
        memo: HashMap::new(),
    };

    let mut entities = Vec::new();
    for header in listed {
        for class in &header.classes {
            if !class.template_params.is_empty() {
                // Class templates only matter as containers at usage sites.
                continue;
            }
            entities.push(Entity::Class(composer.compose_class(
                class,
                &header.path,
                &mut Vec::new(),
            )));
        }
    }
    for header in listed {
        for en in &header.enums {
            entities.push(Entity::Enum(compose_enum(en, &header.path)));
        }
    }
    entities
}

fn compose_enum(raw: &RawEnum, path: &str) -> EnumEntity {
    EnumEntity {
        name: raw.name.clone(),
        namespace: raw.namespace.clone(),
        constants: raw
            .constants
            .iter()
            .map(|c| EnumConstant {
                name: c.name.clone(),
                value: c.value,
            })
            .collect(),
        header: project_header(path),
        location: raw.location.clone(),
    }
}

impl<'a> Composer<'a> {
    fn compose_class(
        &mut self,
        raw: &RawClass,
        path: &str,
        stack: &mut Vec<String>,
    ) -> ClassEntity {
        let full_name =
            crate::domain::model::qualified_name(raw.namespace.as_deref(), &raw.name);
        if let Some(done) = self.memo.get(&full_name) {
            return done.clone();
        }

        stack.push(full_name.clone());
        let ns = raw.namespace.as_deref();

        let bases = raw
            .bases
            .iter()
            .map(|b| self.resolve_type(b, ns, stack))
            .collect();

        let members = raw
            .fields
            .iter()
            .map(|f| Field {
                name: f.name.clone(),
                access: f.access,
                type_info: self.resolve_type(&f.ty, ns, stack),
                traits: TypeTraits {
                    is_const: f.ty.is_const,
                    ref_kind: f.ty.ref_kind,
                },
                init_value: f.init.clone(),
                location: f.location.clone(),
            })
            .collect();

        let methods = raw
            .methods
            .iter()
            .map(|m| Api {
                name: m.name.clone(),
                access: m.access,
                returns: ApiReturn {
                    type_info: self.resolve_type(&m.ret, ns, stack),
                    traits: TypeTraits {
                        is_const: m.ret.is_const,
                        ref_kind: m.ret.ref_kind,
                    },
                },
                params: m
                    .params
                    .iter()
                    .map(|p| Param {
                        name: p.name.clone(),
                        type_info: self.resolve_type(&p.ty, ns, stack),
                        traits: TypeTraits {
                            is_const: p.ty.is_const,
                            ref_kind: p.ty.ref_kind,
                        },
                        location: p.location.clone(),
                    })
                    .collect(),
                traits: ApiTraits {
                    is_const: m.is_const,
                    is_virtual: m.is_virtual,
                    is_abstract: m.is_pure,
                    is_static: m.is_static,
                    annotation: m.annotation.clone(),
                },
                location: m.location.clone(),
            })
            .collect();

        stack.pop();

        let entity = ClassEntity {
            name: raw.name.clone(),
            namespace: raw.namespace.clone(),
            template_args: Vec::new(),
            bases,
            members,
            methods,
            header: project_header(path),
            location: raw.location.clone(),
            annotation: raw.annotation.clone(),
            alias: None,
        };
        self.memo.insert(full_name, entity.clone());
        entity
    }

    fn resolve_type(
        &mut self,
        raw: &RawType,
        current_ns: Option<&str>,
        stack: &mut Vec<String>,
    ) -> TypeEntity {
        if raw.segments.len() == 1 && is_primitive_name(raw.name()) {
            return TypeEntity::Primitive {
                name: raw.name().to_string(),
                alias: None,
            };
        }

        if !raw.template_args.is_empty() {
            let args: Vec<TypeEntity> = raw
                .template_args
                .iter()
                .map(|a| self.resolve_type(a, current_ns, stack))
                .collect();

            let (namespace, header) = match self.symbols.lookup(raw, current_ns) {
                Some(Symbol::Class { raw: def, path }) => {
                    (def.namespace.clone(), project_header(path))
                }
                _ => (raw.namespace(), None),
            };

            return TypeEntity::Declared(DeclaredClass {
                name: raw.name().to_string(),
                namespace,
                template_args: args,
                header,
                alias: None,
            });
        }

        match self.symbols.lookup(raw, current_ns) {
            Some(Symbol::Alias { target }) => {
                let resolved = self.resolve_type(target, current_ns, stack);
                self.attach_alias(resolved, &raw.qualified())
            }
            Some(Symbol::Class { raw: def, path }) => {
                let full = crate::domain::model::qualified_name(
                    def.namespace.as_deref(),
                    &def.name,
                );
                if stack.contains(&full) {
                    return TypeEntity::Recursive {
                        name: def.name.clone(),
                        namespace: def.namespace.clone(),
                    };
                }
                if !def.template_params.is_empty() {
                    return TypeEntity::Declared(DeclaredClass {
                        name: def.name.clone(),
                        namespace: def.namespace.clone(),
                        template_args: Vec::new(),
                        header: project_header(path),
                        alias: None,
                    });
                }
                let path = path.to_string();
                TypeEntity::Class(Box::new(self.compose_class(def, &path, stack)))
            }
            Some(Symbol::Enum { raw: def, path }) => TypeEntity::Enum(compose_enum(def, path)),
            None => TypeEntity::Declared(DeclaredClass {
                name: raw.name().to_string(),
                namespace: raw.namespace(),
                template_args: Vec::new(),
                header: None,
                alias: None,
            }),
        }
    }

    /// Records the written spelling when it differs from the resolved name,
    /// namespaces ignored.
    fn attach_alias(&self, resolved: TypeEntity, written: &str) -> TypeEntity {
        let differs =
            namespace_stripped(written) != namespace_stripped(&resolved.complete_name());
        if !differs {
            return resolved;
        }
        let written = written.to_string();
        match resolved {
            TypeEntity::Primitive { name, .. } => TypeEntity::Primitive {
                name,
                alias: Some(written),
            },
            TypeEntity::Declared(mut d) => {
                d.alias = Some(written);
                TypeEntity::Declared(d)
            }
            TypeEntity::Class(mut c) => {
                c.alias = Some(written);
                TypeEntity::Class(c)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;

    fn compose_single(src: &str) -> Vec<Entity> {
        let (header, pre) = parse_source(src, "src/test/Test.h").unwrap();
        compose_entities(&[header], &[], &pre.defines)
    }

    #[test]
    fn resolves_defines_as_primitive_aliases() {
        let entities = compose_single(
            "#define ICoreFramework int\n\
             class Holder {\n\
             public:\n\
                 ICoreFramework core = 0;\n\
             };\n",
        );
        let Entity::Class(holder) = &entities[0] else {
            panic!("expected class");
        };
        let field = &holder.members[0];
        assert_eq!(field.type_info.name(), "int");
        assert_eq!(field.type_info.alias(), Some("ICoreFramework"));
    }

    #[test]
    fn resolves_template_usage_to_declared_containers() {
        let entities = compose_single(
            "#define ICoreFramework int\n\
             namespace spark {\n\
                 template <class T> class handle { T a; };\n\
             }\n\
             class IViewModel {};\n\
             class RosterViewModel : public IViewModel {\n\
             public:\n\
                 virtual void CreateInstance(const spark::handle<ICoreFramework>& core, const int& capacity);\n\
             };\n",
        );
        // The handle template itself is not an entity.
        assert!(entities.iter().all(|e| e.name() != "handle"));
        let vm = entities
            .iter()
            .find_map(|e| match e {
                Entity::Class(c) if c.name == "RosterViewModel" => Some(c),
                _ => None,
            })
            .unwrap();
        let core_param = &vm.methods[0].params[0];
        assert_eq!(core_param.type_info.complete_name(), "spark::handle<int>");
        assert_eq!(core_param.type_info.template_args()[0].alias(), Some("ICoreFramework"));
        assert!(core_param.traits.is_const);
    }

    #[test]
    fn recursive_classes_resolve_to_back_references() {
        let entities = compose_single(
            "class Node {\n\
             public:\n\
                 Node* next;\n\
                 int value = 0;\n\
             };\n",
        );
        let Entity::Class(node) = &entities[0] else {
            panic!("expected class");
        };
        assert!(matches!(
            node.members[0].type_info,
            TypeEntity::Recursive { ref name, .. } if name == "Node"
        ));
    }

    #[test]
    fn using_alias_keeps_written_spelling() {
        let entities = compose_single(
            "namespace spark { using ms_time_t = long; }\n\
             class CallRecord {\n\
             public:\n\
                 spark::ms_time_t startedAt = 0;\n\
             };\n",
        );
        let Entity::Class(record) = &entities[0] else {
            panic!("expected class");
        };
        let started = &record.members[0];
        assert_eq!(started.type_info.name(), "long");
        assert_eq!(started.type_info.alias(), Some("spark::ms_time_t"));
    }

    #[test]
    fn support_headers_resolve_but_do_not_emit() {
        let (listed, _) = parse_source(
            "class Widget : public IWidget {\n\
             public:\n\
                 virtual int refresh() = 0;\n\
             };\n",
            "src/Widget.h",
        )
        .unwrap();
        let (support, _) = parse_source("class IWidget {};\n", "framework/IWidget.h").unwrap();
        let entities = compose_entities(&[listed], &[support], &[]);
        assert_eq!(entities.len(), 1);
        let Entity::Class(widget) = &entities[0] else {
            panic!("expected class");
        };
        assert_eq!(widget.bases[0].complete_name(), "IWidget");
        assert_eq!(widget.bases[0].header(), Some("framework/IWidget.h"));
    }
}
