//! Template engine for prompt rendering using Jinja2 syntax.
//!
//! Built-in templates are compiled into the binary. Files under
//! `templates/prompts/` with the same relative name replace them at startup.

use minijinja::{Environment, Template, UndefinedBehavior, Value};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Global template environment
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// Template directory relative to the working directory
const TEMPLATE_DIR: &str = "templates/prompts";

/// Instruction budget for a single render
const RENDER_FUEL: u64 = 100_000;

/// Largest rendered prompt, in bytes
const MAX_RENDERED_BYTES: usize = 2 * 1024 * 1024;

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "generation/system.jinja",
        include_str!("../../../templates/prompts/generation/system.jinja"),
    ),
    (
        "generation/user.jinja",
        include_str!("../../../templates/prompts/generation/user.jinja"),
    ),
    (
        "refine/system.jinja",
        include_str!("../../../templates/prompts/refine/system.jinja"),
    ),
    (
        "refine/user.jinja",
        include_str!("../../../templates/prompts/refine/user.jinja"),
    ),
];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Invalid template syntax: {0}")]
    Syntax(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn new_environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Lenient);
    env.set_keep_trailing_newline(false);
    env.set_fuel(Some(RENDER_FUEL));
    env
}

/// Output buffer that refuses writes past `limit`
struct CappedOutput {
    buf: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl CappedOutput {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            overflowed: false,
        }
    }
}

impl io::Write for CappedOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len() + data.len() > self.limit {
            self.overflowed = true;
            return Err(io::Error::other("rendered prompt exceeds size limit"));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn render_capped(template: &Template<'_, '_>, ctx: Value) -> Result<String, TemplateError> {
    let mut out = CappedOutput::new(MAX_RENDERED_BYTES);
    let rendered = template.render_to_write(ctx, &mut out).map(|_| ());
    if out.overflowed {
        return Err(TemplateError::RenderError(format!(
            "output exceeds {} bytes",
            MAX_RENDERED_BYTES
        )));
    }
    rendered.map_err(|e| TemplateError::RenderError(e.to_string()))?;
    String::from_utf8(out.buf).map_err(|e| TemplateError::RenderError(e.to_string()))
}

fn init_environment() -> Environment<'static> {
    let mut env = new_environment();

    for (name, source) in BUILTIN_TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::error!("Built-in template {} failed to compile: {}", name, e);
        }
    }

    let template_path = Path::new(TEMPLATE_DIR);
    if template_path.exists() {
        load_templates_recursive(&mut env, template_path, template_path);
    }

    env
}

/// Recursively load all .jinja templates from a directory
fn load_templates_recursive(env: &mut Environment<'static>, base_path: &Path, current_path: &Path) {
    let Ok(entries) = std::fs::read_dir(current_path) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            load_templates_recursive(env, base_path, &path);
            continue;
        }
        if !path.extension().is_some_and(|ext| ext == "jinja") {
            continue;
        }
        let Ok(relative) = path.strip_prefix(base_path) else {
            continue;
        };
        // Template names always use forward slashes
        let template_name = relative.to_string_lossy().replace('\\', "/");
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                // Leaked once at startup; the environment lives for the whole process
                let static_name: &'static str = Box::leak(template_name.clone().into_boxed_str());
                let static_content: &'static str = Box::leak(content.into_boxed_str());
                if let Err(e) = env.add_template(static_name, static_content) {
                    tracing::warn!("Failed to load template {}: {}", template_name, e);
                } else {
                    tracing::debug!("Loaded template override: {}", template_name);
                }
            }
            Err(e) => tracing::warn!("Failed to read template {}: {}", path.display(), e),
        }
    }
}

/// Get the global template environment
fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

fn to_value(ctx: &HashMap<&str, Value>) -> Value {
    Value::from_iter(ctx.iter().map(|(k, v)| (*k, v.clone())))
}

/// Render a named template with the given context.
///
/// # Example
/// ```ignore
/// let mut ctx = HashMap::new();
/// ctx.insert("findings", Value::from("No acute findings"));
/// let prompt = render_template("generation/user.jinja", &ctx)?;
/// ```
pub fn render_template(
    template_name: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    render_capped(&template, to_value(ctx))
}

/// Render template source that is not registered, e.g. a stored prompt body
pub fn render_str(source: &str, ctx: &HashMap<&str, Value>) -> Result<String, TemplateError> {
    let env = new_environment();
    let template = env
        .template_from_str(source)
        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
    render_capped(&template, to_value(ctx))
}

/// Compile `source` without rendering it
pub fn check_syntax(source: &str) -> Result<(), TemplateError> {
    let env = new_environment();
    env.template_from_str(source)
        .map(|_| ())
        .map_err(|e| TemplateError::Syntax(e.to_string()))
}

#[cfg(test)]
fn template_exists(template_name: &str) -> bool {
    get_environment().get_template(template_name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_template() {
        let ctx = HashMap::new();
        let result = render_template("definitely_not_a_real_template.jinja", &ctx);
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
        assert!(!template_exists("definitely_not_a_real_template.jinja"));
    }

    #[test]
    fn test_builtins_registered() {
        for (name, _) in BUILTIN_TEMPLATES {
            assert!(template_exists(name), "{} should be registered", name);
        }
    }

    #[test]
    fn test_render_str_with_context() {
        let mut ctx = HashMap::new();
        ctx.insert("specialty_name", Value::from("Radiology"));
        let out = render_str("You write {{ specialty_name }} reports.", &ctx).unwrap();
        assert_eq!(out, "You write Radiology reports.");
    }

    #[test]
    fn test_undefined_variables_render_empty() {
        let ctx = HashMap::new();
        let out = render_str("Hello {{ nobody }}!", &ctx).unwrap();
        assert_eq!(out, "Hello !");
    }

    #[test]
    fn test_check_syntax() {
        assert!(check_syntax("Plain text with {{ variable }}").is_ok());
        assert!(matches!(
            check_syntax("{% if unclosed %}"),
            Err(TemplateError::Syntax(_))
        ));
        assert!(check_syntax("{{ broken").is_err());
    }

    #[test]
    fn test_nested_loops_run_out_of_fuel() {
        let body = "{% for a in range(3000) %}{% for b in range(3000) %}xxxxxxxxxx{% endfor %}{% endfor %}";
        assert!(check_syntax(body).is_ok());

        let ctx = HashMap::new();
        let result = render_str(body, &ctx);
        assert!(matches!(result, Err(TemplateError::RenderError(_))));
    }

    #[test]
    fn test_oversized_output_is_rejected() {
        let mut ctx = HashMap::new();
        ctx.insert("chunk", Value::from("y".repeat(MAX_RENDERED_BYTES / 2 + 1)));
        let result = render_str("{{ chunk }}{{ chunk }}", &ctx);
        match result {
            Err(TemplateError::RenderError(msg)) => assert!(msg.contains("exceeds")),
            other => panic!("expected render error, got {:?}", other),
        }

        let ok = render_str("{{ chunk }}", &ctx).unwrap();
        assert_eq!(ok.len(), MAX_RENDERED_BYTES / 2 + 1);
    }
}
