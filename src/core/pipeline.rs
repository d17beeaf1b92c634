use std::collections::{HashSet, VecDeque};
use std::path::{Component, Path};

use crate::classify::{classify_entity, filter_by_explicit_annotation, Category, ClassifyOptions};
use crate::compose::compose_entities;
use crate::core::{ConfigProvider, Entity, Pipeline, ScanResult, Storage};
use crate::manifest::{Builder, Manifest};
use crate::parse::{decl::ParsedHeader, parse_source, IncludeRef};
use crate::report;
use crate::utils::error::{Result, ScanError};

pub struct HeaderPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> HeaderPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    /// Candidate scan-relative paths for an include, most specific first.
    fn include_candidates(&self, include: &IncludeRef, from: &str) -> Vec<String> {
        let mut candidates = Vec::new();
        if include.quoted {
            if let Some(parent) = Path::new(from).parent() {
                candidates.push(normalize_path(&parent.join(&include.spelling)));
            }
        }
        for dir in self.config.include_paths() {
            candidates.push(normalize_path(&Path::new(dir).join(&include.spelling)));
        }
        candidates.push(normalize_path(Path::new(&include.spelling)));
        candidates.dedup();
        candidates
    }

    /// Extra `-D`-style defines from configuration, `NAME=VALUE` or `NAME`.
    fn config_defines(&self) -> Vec<(String, String)> {
        self.config
            .defines()
            .iter()
            .filter_map(|d| {
                let (name, value) = match d.split_once('=') {
                    Some((n, v)) => (n, v),
                    None => (d.as_str(), "1"),
                };
                if name.is_empty() {
                    None
                } else {
                    Some((name.to_string(), value.to_string()))
                }
            })
            .collect()
    }
}

fn normalize_path(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    parts.push("..".to_string());
                }
            }
            other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }
    parts.join("/")
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HeaderPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Entity>> {
        let mut listed: Vec<ParsedHeader> = Vec::new();
        let mut support: Vec<ParsedHeader> = Vec::new();
        let mut defines = self.config_defines();

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, bool, Option<String>)> = self
            .config
            .headers()
            .iter()
            .map(|h| (normalize_path(Path::new(h)), true, None))
            .collect();

        while let Some((path, is_listed, cached)) = queue.pop_front() {
            if !visited.insert(path.clone()) {
                continue;
            }

            let text = match cached {
                Some(text) => text,
                None => {
                    let bytes = self.storage.read_file(&path).await?;
                    String::from_utf8_lossy(&bytes).into_owned()
                }
            };

            tracing::debug!("parsing {}", path);
            let (parsed, pre) = parse_source(&text, &path)?;
            defines.extend(pre.defines);

            for include in pre.includes {
                let mut resolved = false;
                for candidate in self.include_candidates(&include, &path) {
                    if visited.contains(&candidate)
                        || queue.iter().any(|(p, _, _)| p == &candidate)
                    {
                        resolved = true;
                        break;
                    }
                    if let Ok(bytes) = self.storage.read_file(&candidate).await {
                        let content = String::from_utf8_lossy(&bytes).into_owned();
                        queue.push_back((candidate, false, Some(content)));
                        resolved = true;
                        break;
                    }
                }
                if !resolved {
                    if include.quoted {
                        return Err(ScanError::IncludeError {
                            include: include.spelling,
                            from: path,
                        });
                    }
                    // System headers are outside the scan; their types show
                    // up as declared-only references.
                    tracing::debug!("skipping system include <{}>", include.spelling);
                }
            }

            if is_listed {
                listed.push(parsed);
            } else {
                support.push(parsed);
            }
        }

        let entities = compose_entities(&listed, &support, &defines);
        tracing::info!(
            "composed {} entities from {} headers ({} support)",
            entities.len(),
            listed.len(),
            support.len()
        );
        Ok(entities)
    }

    async fn transform(&self, entities: Vec<Entity>) -> Result<ScanResult> {
        let options = ClassifyOptions {
            warnings_allowed: self.config.warnings_allowed(),
            suppress_errors: self.config.suppress_errors(),
            init_exempt_fields: self.config.init_exempt_fields().to_vec(),
        };

        let classified: Vec<(Entity, Category)> = entities
            .into_iter()
            .map(|entity| {
                let category = classify_entity(&entity, &options);
                (entity, category)
            })
            .collect();

        let classified = filter_by_explicit_annotation(classified);

        let builder = Builder::new(self.config.platform_time_type());
        let mut models = Vec::new();
        let mut enums = Vec::new();
        let mut viewmodels = Vec::new();
        let mut services = Vec::new();
        let mut unclassified = Vec::new();
        let mut ignored_callbacks = Vec::new();

        for (entity, category) in classified {
            match (category, &entity) {
                (Category::Model, Entity::Class(class)) => models.push(builder.model(class)),
                (Category::Enumeration, Entity::Enum(en)) => {
                    enums.push(builder.enumeration(en))
                }
                (Category::ViewModel, Entity::Class(class)) => {
                    viewmodels.push(builder.viewmodel(class))
                }
                (Category::Service, Entity::Class(class)) => {
                    services.push(builder.service(class))
                }
                (Category::Callback, _) => ignored_callbacks.push(entity.complete_name()),
                _ => unclassified.push(entity.complete_name()),
            }
        }

        Ok(ScanResult {
            manifest: Manifest::new(models, enums, viewmodels, services),
            unclassified,
            ignored_callbacks,
        })
    }

    async fn load(&self, result: ScanResult) -> Result<String> {
        let rendered = report::render(&result.manifest, self.config.pretty())?;
        let output_file = format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            self.config.manifest_name()
        );
        self.storage
            .write_file(&output_file, rendered.as_bytes())
            .await?;

        println!("{}", report::summary_line(&result.manifest));
        for name in &result.ignored_callbacks {
            tracing::info!("callback {} folded into its owner, not emitted", name);
        }
        for name in &result.unclassified {
            tracing::warn!("entity {} did not match any category", name);
        }

        Ok(output_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_collapses_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("./src/viewmodel/../service/Service.h")),
            "src/service/Service.h"
        );
        assert_eq!(normalize_path(Path::new("Service.h")), "Service.h");
    }
}
