//! Structural rules of the binding convention, composed from the check
//! combinators. One classifier per category; each reports how far an entity
//! is from satisfying the category's shape.

use crate::classify::check::{
    all_of, all_of_short_circuit, one_of, CheckReport, CheckStatus,
};
use crate::domain::model::{
    Access, Api, ClassEntity, Entity, Field, Param, RefKind, TypeEntity,
};

pub const FACTORY_METHOD: &str = "CreateInstance";
pub const VIEWMODEL_INTERFACE: &str = "IViewModel";
pub const SERVICE_INTERFACE: &str = "IService";
pub const FRAMEWORK_HANDLE: &str = "spark::handle";
pub const FRAMEWORK_CONTEXT: &str = "ICoreFramework";
pub const CALLBACK_BASE: &str = "NotificationHelper";
pub const CODEGEN_TAG: &str = "generate_binds";
pub const EXPLICIT_TAG: &str = "explicit_codegen";

/// Fields whose constexpr initializers the scan cannot see; exempt from the
/// initialization rule.
pub const INIT_EXEMPT_FIELDS: &[&str] = &[
    "sortPriority",
    "spaceParticipantCountGroupMentionsThreshold",
    "contentIndex",
    "imgWidth",
    "imgHeight",
];

pub trait Classifier {
    fn satisfies(&self, entity: &Entity) -> CheckReport;
}

// ---------------------------------------------------------------------------
// Leaf checks
// ---------------------------------------------------------------------------

fn field_is_public(f: &Field) -> CheckReport {
    CheckReport::from_predicate(
        f.access == Access::Public,
        CheckStatus::Critical,
        || format!("{} is not public", f.name),
        Some(f.location.clone()),
    )
}

fn field_is_not_const(f: &Field) -> CheckReport {
    CheckReport::from_predicate(
        !f.traits.is_const,
        CheckStatus::Warning,
        || format!("{} is const", f.name),
        Some(f.location.clone()),
    )
}

fn field_is_not_char_ptr(f: &Field) -> CheckReport {
    let is_char = f.type_info.name() == "char";
    let is_ptr = f.traits.ref_kind == Some(RefKind::Pointer);
    CheckReport::from_predicate(
        !(is_char && is_ptr),
        CheckStatus::Critical,
        || format!("char* is not a supported type for member '{}'", f.name),
        Some(f.location.clone()),
    )
}

fn field_is_primitive(f: &Field) -> CheckReport {
    CheckReport::from_predicate(
        f.type_info.is_primitive(),
        CheckStatus::Critical,
        || format!("{} is not a primitive type", f.name),
        Some(f.location.clone()),
    )
}

fn field_is_double(f: &Field) -> CheckReport {
    CheckReport::from_predicate(
        f.type_info.name() == "double",
        CheckStatus::Critical,
        || format!("{} is not a double", f.name),
        Some(f.location.clone()),
    )
}

fn field_is_reference(f: &Field) -> CheckReport {
    CheckReport::from_predicate(
        f.traits.ref_kind.is_some(),
        CheckStatus::Critical,
        || format!("{} is not reference", f.name),
        Some(f.location.clone()),
    )
}

fn field_is_pointer(f: &Field) -> CheckReport {
    CheckReport::from_predicate(
        f.traits.ref_kind == Some(RefKind::Pointer),
        CheckStatus::Critical,
        || format!("{} is not pointer", f.name),
        Some(f.location.clone()),
    )
}

fn field_has_initial_value(f: &Field) -> CheckReport {
    CheckReport::from_predicate(
        f.init_value.is_some(),
        CheckStatus::Critical,
        || format!("{} is missing an initial value", f.name),
        Some(f.location.clone()),
    )
}

fn field_is_init_exempt(f: &Field, exempt: &[String]) -> CheckReport {
    let listed = INIT_EXEMPT_FIELDS.contains(&f.name.as_str())
        || exempt.iter().any(|e| e == &f.name);
    CheckReport::from_predicate(
        listed,
        CheckStatus::Critical,
        || format!("{} is not exempted from Initialized check", f.name),
        Some(f.location.clone()),
    )
}

/// Primitive members need a visible initializer unless they are doubles,
/// references, pointers or explicitly exempted. Violations escalate to
/// critical and are logged immediately.
fn field_is_initialized(f: &Field, exempt: &[String]) -> CheckReport {
    let not_primitive = {
        let inner = field_is_primitive(f);
        if inner.is_ok() {
            CheckReport::failed(
                CheckStatus::Critical,
                format!("{} is a primitive field", f.name),
                Some(f.location.clone()),
            )
        } else {
            CheckReport::passed()
        }
    };

    let mut report = one_of([
        not_primitive,
        all_of([
            field_is_primitive(f),
            one_of([
                field_is_reference(f),
                field_is_pointer(f),
                field_is_double(f),
            ]),
        ]),
        all_of([
            field_is_primitive(f),
            one_of([field_has_initial_value(f), field_is_init_exempt(f, exempt)]),
        ]),
    ]);

    if !report.is_ok() {
        report.status = CheckStatus::Critical;
        for error in &report.errors {
            match &error.location {
                Some(loc) => tracing::error!("{} at {}:{}", error.message, loc.file, loc.line),
                None => tracing::error!("{}", error.message),
            }
        }
    }
    report
}

fn api_is_public(m: &Api) -> CheckReport {
    CheckReport::from_predicate(
        m.access == Access::Public,
        CheckStatus::Critical,
        || format!("{} is not public", m.name),
        Some(m.location.clone()),
    )
}

fn api_is_virtual(m: &Api) -> CheckReport {
    CheckReport::from_predicate(
        m.traits.is_virtual,
        CheckStatus::Critical,
        || format!("{} is not virtual", m.name),
        Some(m.location.clone()),
    )
}

fn api_is_abstract(m: &Api) -> CheckReport {
    CheckReport::from_predicate(
        m.traits.is_abstract,
        CheckStatus::Warning,
        || format!("{} is not abstract", m.name),
        Some(m.location.clone()),
    )
}

fn api_returns_void(m: &Api) -> CheckReport {
    CheckReport::from_predicate(
        m.returns.type_info.name() == "void",
        CheckStatus::Warning,
        || format!("{} does not have a void return type", m.name),
        Some(m.location.clone()),
    )
}

fn api_is_factory(m: &Api) -> CheckReport {
    CheckReport::from_predicate(
        m.name == FACTORY_METHOD,
        CheckStatus::Critical,
        || format!("{} is not a {} factory method", m.name, FACTORY_METHOD),
        Some(m.location.clone()),
    )
}

fn param_is_const(p: &Param) -> CheckReport {
    CheckReport::from_predicate(
        p.traits.is_const,
        CheckStatus::Warning,
        || format!("{} is not const", p.name),
        Some(p.location.clone()),
    )
}

fn param_is_lvalue_ref(p: &Param) -> CheckReport {
    CheckReport::from_predicate(
        p.traits.ref_kind == Some(RefKind::Lvalue),
        CheckStatus::Warning,
        || format!("{} is not an lvalue reference", p.name),
        Some(p.location.clone()),
    )
}

/// Checks that a parameter is `container<pointed>`, accepting the written
/// alias of the pointed type (macros keep their spelling in the scan).
fn param_is_container_of(p: &Param, container: &str, pointed: &str) -> CheckReport {
    let full_name = crate::domain::model::qualified_name(
        p.type_info.namespace(),
        p.type_info.name(),
    );
    if full_name != container {
        return CheckReport::failed(
            CheckStatus::Warning,
            format!("{} is not of type {}", p.name, container),
            Some(p.location.clone()),
        );
    }

    let args = p.type_info.template_args();
    let arg_matches = args.len() == 1
        && (args[0].name() == pointed || args[0].alias() == Some(pointed));
    if !arg_matches {
        let mut report = CheckReport::failed(
            CheckStatus::Warning,
            format!("{} is not a {} to {}", p.name, container, pointed),
            Some(p.location.clone()),
        );
        report.checks_run = 2;
        return report;
    }

    let mut report = CheckReport::passed();
    report.checks_run = 2;
    report
}

// ---------------------------------------------------------------------------
// Class-level rules
// ---------------------------------------------------------------------------

fn has_only_data_members(c: &ClassEntity) -> CheckReport {
    let methods_forbidden = all_of(c.methods.iter().map(|m| {
        CheckReport::failed(
            CheckStatus::Warning,
            format!("{} is a method in a model definition", m.name),
            Some(m.location.clone()),
        )
    }))
    .labelled(
        || {
            format!(
                "{} has {} method(s) in a model definition",
                c.name,
                c.methods.len()
            )
        },
        Some(c.location.clone()),
    );

    let has_members = CheckReport::from_predicate(
        !c.members.is_empty(),
        CheckStatus::Warning,
        || format!("No members found in model definition of {}", c.name),
        Some(c.location.clone()),
    );

    methods_forbidden.and(has_members)
}

fn has_only_methods(c: &ClassEntity, kind: &str) -> CheckReport {
    let members_forbidden = all_of(c.members.iter().map(|f| {
        CheckReport::failed(
            CheckStatus::Warning,
            format!("{} is a member in a {} definition", f.name, kind),
            Some(f.location.clone()),
        )
    }))
    .labelled(
        || {
            format!(
                "{} has {} member(s) in a {} definition",
                c.name,
                c.members.len(),
                kind
            )
        },
        Some(c.location.clone()),
    );

    let has_methods = CheckReport::from_predicate(
        !c.methods.is_empty(),
        CheckStatus::Warning,
        || format!("No methods found in {} definition of {}", kind, c.name),
        Some(c.location.clone()),
    );

    members_forbidden.and(has_methods)
}

fn inherits_from(c: &ClassEntity, interface: &str) -> CheckReport {
    CheckReport::from_predicate(
        c.bases.iter().any(|b| b.name() == interface),
        CheckStatus::Critical,
        || format!("{} does not inherit from {}", c.name, interface),
        Some(c.location.clone()),
    )
}

fn factory_params_ok(m: &Api) -> CheckReport {
    let checks: Vec<Box<dyn FnOnce() -> CheckReport + '_>> = vec![
        Box::new(|| {
            CheckReport::from_predicate(
                !m.params.is_empty(),
                CheckStatus::Warning,
                || {
                    format!(
                        "{} needs to have at least one param ({})",
                        m.name, FRAMEWORK_CONTEXT
                    )
                },
                Some(m.location.clone()),
            )
        }),
        Box::new(|| {
            let const_refs = all_of(
                m.params
                    .iter()
                    .map(|p| param_is_const(p).and(param_is_lvalue_ref(p))),
            )
            .labelled(
                || format!("All parameters of {} need to be const reference", m.name),
                Some(m.location.clone()),
            );

            let has_handle = one_of(
                m.params
                    .iter()
                    .map(|p| param_is_container_of(p, FRAMEWORK_HANDLE, FRAMEWORK_CONTEXT)),
            )
            .labelled(
                || {
                    format!(
                        "{} needs to have a parameter of type {}<{}>",
                        m.name, FRAMEWORK_HANDLE, FRAMEWORK_CONTEXT
                    )
                },
                Some(m.location.clone()),
            );

            const_refs.and(has_handle)
        }),
    ];
    all_of_short_circuit(checks)
}

fn has_factory_method(c: &ClassEntity) -> CheckReport {
    let factories: Vec<&Api> = c
        .methods
        .iter()
        .filter(|m| m.name == FACTORY_METHOD)
        .collect();

    let exactly_one = CheckReport::from_predicate(
        factories.len() == 1,
        CheckStatus::Warning,
        || {
            format!(
                "There needs to be exactly one {} factory method declared",
                FACTORY_METHOD
            )
        },
        Some(c.location.clone()),
    );

    if !exactly_one.is_ok() {
        return exactly_one;
    }
    exactly_one.and(factory_params_ok(factories[0]))
}

fn callback_bases(c: &ClassEntity) -> Vec<&TypeEntity> {
    c.bases
        .iter()
        .filter(|b| b.name() == CALLBACK_BASE)
        .filter_map(|b| b.template_args().first())
        .collect()
}

fn callback_ok_if_exists(c: &ClassEntity) -> CheckReport {
    let callbacks = callback_bases(c);
    if callbacks.is_empty() {
        return CheckReport::passed();
    }
    all_of(callbacks.into_iter().map(|cb| match cb {
        TypeEntity::Class(class) => callback_shape(class).labelled(
            || format!("{} is not an OK callback", class.name),
            Some(class.location.clone()),
        ),
        other => CheckReport::failed(
            CheckStatus::Critical,
            format!("{} is not a defined callback class", other.complete_name()),
            Some(c.location.clone()),
        ),
    }))
}

fn callback_shape(c: &ClassEntity) -> CheckReport {
    let methods_ok = all_of(c.methods.iter().map(|m| {
        api_is_public(m)
            .and(api_is_virtual(m))
            .and(api_is_abstract(m))
            .and(api_returns_void(m))
    }))
    .labelled(
        || format!("{} does not satisfy all method validators", c.name),
        Some(c.location.clone()),
    );
    has_only_methods(c, "callback").and(methods_ok)
}

fn as_class(entity: &Entity) -> Result<&ClassEntity, CheckReport> {
    match entity {
        Entity::Class(c) => Ok(c),
        Entity::Enum(e) => Err(CheckReport::failed(
            CheckStatus::Critical,
            format!("{} is not a class definition", e.name),
            Some(e.location.clone()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

pub struct ModelClassifier {
    exempt: Vec<String>,
}

impl ModelClassifier {
    pub fn new(exempt: &[String]) -> Self {
        Self {
            exempt: exempt.to_vec(),
        }
    }
}

impl Classifier for ModelClassifier {
    fn satisfies(&self, entity: &Entity) -> CheckReport {
        let c = match as_class(entity) {
            Ok(c) => c,
            Err(report) => return report,
        };
        let members_ok = all_of(c.members.iter().map(|f| {
            field_is_public(f)
                .and(field_is_not_const(f))
                .and(field_is_not_char_ptr(f))
                .and(field_is_initialized(f, &self.exempt))
        }))
        .labelled(
            || format!("{} does not satisfy all member validators", c.name),
            Some(c.location.clone()),
        );
        has_only_data_members(c).and(members_ok)
    }
}

pub struct ViewModelClassifier;

impl Classifier for ViewModelClassifier {
    fn satisfies(&self, entity: &Entity) -> CheckReport {
        let c = match as_class(entity) {
            Ok(c) => c,
            Err(report) => return report,
        };
        let methods_ok = all_of(c.methods.iter().map(|m| {
            one_of([
                api_is_factory(m),
                api_is_public(m).and(api_is_virtual(m)).and(api_is_abstract(m)),
            ])
        }))
        .labelled(
            || format!("{} does not satisfy all method validators", c.name),
            Some(c.location.clone()),
        );

        inherits_from(c, VIEWMODEL_INTERFACE)
            .and(has_only_methods(c, "viewmodel"))
            .and(has_factory_method(c))
            .and(methods_ok)
            .and(callback_ok_if_exists(c))
    }
}

pub struct ServiceClassifier;

impl Classifier for ServiceClassifier {
    fn satisfies(&self, entity: &Entity) -> CheckReport {
        let c = match as_class(entity) {
            Ok(c) => c,
            Err(report) => return report,
        };
        let methods_ok = all_of(c.methods.iter().map(|m| {
            one_of([
                api_is_factory(m),
                api_is_public(m).and(api_is_virtual(m)).and(api_is_abstract(m)),
            ])
        }))
        .labelled(
            || format!("{} does not satisfy all method validators", c.name),
            Some(c.location.clone()),
        );

        inherits_from(c, SERVICE_INTERFACE)
            .and(has_only_methods(c, "service"))
            .and(methods_ok)
    }
}

pub struct CallbackClassifier;

impl Classifier for CallbackClassifier {
    fn satisfies(&self, entity: &Entity) -> CheckReport {
        match as_class(entity) {
            Ok(c) => callback_shape(c),
            Err(report) => report,
        }
    }
}

pub struct EnumClassifier;

impl Classifier for EnumClassifier {
    fn satisfies(&self, entity: &Entity) -> CheckReport {
        let e = match entity {
            Entity::Enum(e) => e,
            Entity::Class(c) => {
                return CheckReport::failed(
                    CheckStatus::Critical,
                    format!("{} is not an Enum", c.name),
                    Some(c.location.clone()),
                )
            }
        };

        // Values should start at 0 and be contiguous so they survive being
        // re-declared on the other side of the binding.
        let contiguous = e
            .constants
            .iter()
            .enumerate()
            .all(|(i, c)| c.value == i as i64);
        CheckReport::from_predicate(
            contiguous,
            CheckStatus::Warning,
            || {
                format!(
                    "constants of {} do not start at 0 and increase contiguously",
                    e.name
                )
            },
            Some(e.location.clone()),
        )
    }
}
