use super::ast::Template;
use super::parser::Parser;
use crate::config::TemplateConfig;
use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type TemplateMap = HashMap<String, Arc<Template>>;

/// Named template cache
///
/// Templates are parsed once on `register` and rendered any number of times.
/// The engine is `Send + Sync`; rendering only takes the read lock long
/// enough to clone the `Arc`.
pub struct Engine {
    config: TemplateConfig,
    cache: RwLock<TemplateMap>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(TemplateConfig::default())
    }
}

impl Engine {
    pub fn new(config: TemplateConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Parse `source` and store it under `name`
    ///
    /// On a parse error nothing is stored and any previous entry survives.
    pub fn register(&self, name: impl Into<String>, source: &str) -> Result<Arc<Template>> {
        let name = name.into();
        let template = Parser::new(source, &self.config)?
            .parse()
            .map_err(|e| e.with_context(format!("parsing template \"{}\"", name)))?;
        let template = Arc::new(template);

        if self.write()?.insert(name.clone(), Arc::clone(&template)).is_some() {
            log::warn!("Replacing registered template \"{}\"", name);
        } else {
            log::debug!(
                "Registered template \"{}\" ({} directives)",
                name,
                template.directive_count()
            );
        }

        Ok(template)
    }

    pub fn get(&self, name: &str) -> Result<Option<Arc<Template>>> {
        Ok(self.read()?.get(name).cloned())
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(name))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn remove(&self, name: &str) -> Result<Option<Arc<Template>>> {
        Ok(self.write()?.remove(name))
    }

    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Render a registered template
    pub fn render(&self, name: &str, data: &Value) -> Result<String> {
        let template = self
            .get(name)?
            .ok_or_else(|| Error::template_not_found(name))?;
        template
            .generate(data)
            .map_err(|e| e.with_context(format!("rendering template \"{}\"", name)))
    }

    /// Parse and render `source` without caching it
    pub fn render_str(&self, source: &str, data: &Value) -> Result<String> {
        let template = Parser::new(source, &self.config)?.parse()?;
        template.generate(data)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TemplateMap>> {
        self.cache
            .read()
            .map_err(|_| Error::config("template cache lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TemplateMap>> {
        self.cache
            .write()
            .map_err(|_| Error::config("template cache lock poisoned"))
    }
}
