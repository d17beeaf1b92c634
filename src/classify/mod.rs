//! Entity classification: runs the category classifiers in order and falls
//! back to the nearest of model/viewmodel when nothing matches cleanly.

pub mod check;
pub mod rules;

use std::fmt;

use check::{CheckError, CheckReport, CheckStatus};
use rules::{
    CallbackClassifier, Classifier, EnumClassifier, ModelClassifier, ServiceClassifier,
    ViewModelClassifier,
};

use crate::domain::model::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Model,
    ViewModel,
    Enumeration,
    Service,
    /// Callbacks are valid shapes but are only emitted as part of their
    /// owning viewmodel or service, never on their own.
    Callback,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Model => "MODEL",
            Category::ViewModel => "VIEWMODEL",
            Category::Enumeration => "ENUMERATION",
            Category::Service => "SERVICE",
            Category::Callback => "CALLBACK",
            Category::Unknown => "UNCLASSIFIED",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    pub warnings_allowed: bool,
    pub suppress_errors: bool,
    pub init_exempt_fields: Vec<String>,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            warnings_allowed: true,
            suppress_errors: false,
            init_exempt_fields: Vec::new(),
        }
    }
}

fn log_outcome(entity: &Entity, label: &str, errors: &[CheckError], suppress: bool) {
    tracing::info!("Composing {} as {}", entity, label);
    if suppress {
        return;
    }
    for error in errors {
        match &error.location {
            Some(loc) => tracing::info!("  {}: {}", loc, error.message),
            None => tracing::info!("  {}", error.message),
        }
    }
}

/// Picks the closer of model/viewmodel for an entity neither matched, by
/// comparing fail rates; accepted only at warning level.
fn resolve_non_matching(
    entity: &Entity,
    model: CheckReport,
    viewmodel: CheckReport,
    opts: &ClassifyOptions,
) -> Category {
    let model_rate = model.fail_rate();
    let viewmodel_rate = viewmodel.fail_rate();
    tracing::debug!(
        "Fail rates for model: {} viewmodel: {}",
        model_rate,
        viewmodel_rate
    );

    let errors;
    if model_rate > viewmodel_rate {
        if opts.warnings_allowed && viewmodel.status == CheckStatus::Warning {
            log_outcome(entity, "VIEWMODEL", &viewmodel.errors, opts.suppress_errors);
            return Category::ViewModel;
        }
        errors = viewmodel.errors;
    } else {
        if opts.warnings_allowed && model.status == CheckStatus::Warning {
            log_outcome(entity, "MODEL", &model.errors, opts.suppress_errors);
            return Category::Model;
        }
        errors = model.errors;
    }

    log_outcome(entity, "UNCLASSIFIED", &errors, opts.suppress_errors);
    Category::Unknown
}

pub fn classify_entity(entity: &Entity, opts: &ClassifyOptions) -> Category {
    let enum_report = EnumClassifier.satisfies(entity);
    if enum_report.is_ok() {
        log_outcome(entity, "ENUMERATION", &[], opts.suppress_errors);
        return Category::Enumeration;
    }
    if matches!(entity, Entity::Enum(_))
        && opts.warnings_allowed
        && enum_report.status == CheckStatus::Warning
    {
        log_outcome(entity, "ENUMERATION", &enum_report.errors, opts.suppress_errors);
        return Category::Enumeration;
    }

    let model_report = ModelClassifier::new(&opts.init_exempt_fields).satisfies(entity);
    if model_report.is_ok() {
        log_outcome(entity, "MODEL", &[], opts.suppress_errors);
        return Category::Model;
    }

    let viewmodel_report = ViewModelClassifier.satisfies(entity);
    if viewmodel_report.is_ok() {
        log_outcome(entity, "VIEWMODEL", &[], opts.suppress_errors);
        return Category::ViewModel;
    }

    let service_report = ServiceClassifier.satisfies(entity);
    if service_report.is_ok() {
        log_outcome(entity, "SERVICE", &[], opts.suppress_errors);
        return Category::Service;
    }

    let callback_report = CallbackClassifier.satisfies(entity);
    if callback_report.is_ok() {
        log_outcome(entity, "CALLBACK, ignoring", &[], opts.suppress_errors);
        return Category::Callback;
    }

    resolve_non_matching(entity, model_report, viewmodel_report, opts)
}

/// Per-header explicit mode: when any entity in a header carries the
/// explicit-codegen annotation, only annotated entities of that header are
/// kept. Grouping is by consecutive runs, matching scan order.
pub fn filter_by_explicit_annotation(
    entities: Vec<(Entity, Category)>,
) -> Vec<(Entity, Category)> {
    let mut filtered = Vec::new();
    let mut group: Vec<(Entity, Category)> = Vec::new();
    let mut current_header: Option<Option<String>> = None;

    let flush = |group: &mut Vec<(Entity, Category)>, filtered: &mut Vec<(Entity, Category)>| {
        let explicit = group
            .iter()
            .any(|(e, _)| e.annotation() == Some(rules::EXPLICIT_TAG));
        for item in group.drain(..) {
            if !explicit || item.0.annotation() == Some(rules::EXPLICIT_TAG) {
                filtered.push(item);
            }
        }
    };

    for item in entities {
        let header = item.0.header().map(str::to_string);
        if current_header.as_ref() != Some(&header) {
            flush(&mut group, &mut filtered);
            current_header = Some(header);
        }
        group.push(item);
    }
    flush(&mut group, &mut filtered);

    filtered
}
