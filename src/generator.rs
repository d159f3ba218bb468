//! Multi-file generation
//!
//! A `Generator` holds a list of outputs, each a pair of templates: one for
//! the file name and one for the body. `generate` renders all of them against
//! the same data, e.g. the skeleton/stub wrappers produced for one IDL file.

use crate::config::TemplateConfig;
use crate::error::{ErrorContext, Result};
use crate::template::Template;
use crate::value::Value;

/// One rendered output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone)]
struct Output {
    name_source: String,
    name: Template,
    body: Template,
}

/// Renders a fixed set of named outputs from one data tree
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: TemplateConfig,
    outputs: Vec<Output>,
}

impl Generator {
    pub fn new(config: TemplateConfig) -> Self {
        Self {
            config,
            outputs: Vec::new(),
        }
    }

    /// Register an output; both templates are parsed immediately
    pub fn add_output(&mut self, name_template: &str, body_template: &str) -> Result<&mut Self> {
        let name = Template::with_config(name_template, &self.config)
            .with_context(|| format!("parsing output name \"{}\"", name_template))?;
        let body = Template::with_config(body_template, &self.config)
            .with_context(|| format!("parsing body of \"{}\"", name_template))?;

        self.outputs.push(Output {
            name_source: name_template.to_string(),
            name,
            body,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Render every output in registration order
    ///
    /// The first failure aborts the run and names the output it came from.
    pub fn generate(&self, data: &Value) -> Result<Vec<GeneratedFile>> {
        let mut files = Vec::with_capacity(self.outputs.len());

        for output in &self.outputs {
            let name = output
                .name
                .generate(data)
                .with_context(|| format!("generating name of \"{}\"", output.name_source))?;
            let content = output
                .body
                .generate(data)
                .with_context(|| format!("generating {}", name))?;

            log::debug!("Generated {} ({} bytes)", name, content.len());
            files.push(GeneratedFile { name, content });
        }

        Ok(files)
    }
}
