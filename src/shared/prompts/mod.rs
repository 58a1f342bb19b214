//! Prompt template rendering for report generation and refinement.
//!
//! Templates live in `templates/prompts/` and use Jinja2 syntax. A stored
//! prompt body (see `features::prompts`) replaces the built-in generation
//! system template when one resolves for the request.
//!
//! # Usage
//!
//! ```ignore
//! use crate::shared::prompts::{render_generation_messages, PromptContext};
//!
//! let ctx = PromptContext::new("radiology");
//! let (system, user) = render_generation_messages(None, &ctx, "CT head: no bleed")?;
//! ```

pub mod engine;

pub use engine::{check_syntax, render_str, render_template, TemplateError};

use chrono::Local;
use minijinja::Value;
use std::collections::HashMap;

use crate::features::specialties::registry;

/// Variables shared by every generation/refine template
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub specialty: String,
    pub specialty_name: String,
    pub date: String,
}

impl PromptContext {
    /// Context for `specialty` dated today (local time, `dd MMM yyyy`)
    pub fn new(specialty: &str) -> Self {
        Self {
            specialty: specialty.to_string(),
            specialty_name: registry::display_name(specialty).to_string(),
            date: Local::now().format("%d %b %Y").to_string(),
        }
    }

    fn base(&self) -> HashMap<&'static str, Value> {
        let mut ctx = HashMap::new();
        ctx.insert("specialty", Value::from(self.specialty.as_str()));
        ctx.insert("specialty_name", Value::from(self.specialty_name.as_str()));
        ctx.insert("date", Value::from(self.date.as_str()));
        ctx
    }
}

/// Render the `(system, user)` message pair for a generation request.
///
/// `prompt_content` is the resolved stored prompt body, if any.
pub fn render_generation_messages(
    prompt_content: Option<&str>,
    ctx: &PromptContext,
    findings: &str,
) -> Result<(String, String), TemplateError> {
    let base = ctx.base();
    let system = match prompt_content {
        Some(content) => render_str(content, &base)?,
        None => render_template("generation/system.jinja", &base)?,
    };

    let mut user_ctx = base;
    user_ctx.insert("findings", Value::from(findings));
    let user = render_template("generation/user.jinja", &user_ctx)?;

    Ok((system, user))
}

/// Render the `(system, user)` message pair for refining an existing report
pub fn render_refine_messages(
    ctx: &PromptContext,
    findings: &str,
    content: &str,
    instruction: &str,
) -> Result<(String, String), TemplateError> {
    let base = ctx.base();
    let system = render_template("refine/system.jinja", &base)?;

    let mut user_ctx = base;
    user_ctx.insert("findings", Value::from(findings));
    user_ctx.insert("content", Value::from(content));
    user_ctx.insert("instruction", Value::from(instruction));
    let user = render_template("refine/user.jinja", &user_ctx)?;

    Ok((system, user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PromptContext {
        PromptContext {
            specialty: "cardiology".to_string(),
            specialty_name: "Cardiology".to_string(),
            date: "16 Oct 2026".to_string(),
        }
    }

    #[test]
    fn test_builtin_generation_messages() {
        let (system, user) =
            render_generation_messages(None, &ctx(), "EF 55%, no wall motion abnormality").unwrap();
        assert!(system.contains("Cardiology"));
        assert!(system.contains("16 Oct 2026"));
        assert!(user.contains("EF 55%, no wall motion abnormality"));
    }

    #[test]
    fn test_stored_prompt_replaces_system_template() {
        let (system, _) = render_generation_messages(
            Some("Custom {{ specialty_name }} prompt for {{ specialty }}"),
            &ctx(),
            "findings",
        )
        .unwrap();
        assert_eq!(system, "Custom Cardiology prompt for cardiology");
    }

    #[test]
    fn test_refine_messages_include_instruction() {
        let (_, user) =
            render_refine_messages(&ctx(), "raw findings", "# Report", "Make it shorter").unwrap();
        assert!(user.contains("raw findings"));
        assert!(user.contains("# Report"));
        assert!(user.contains("Make it shorter"));
    }

    #[test]
    fn test_context_uses_registry_name() {
        assert_eq!(PromptContext::new("emergency_medicine").specialty_name, "Emergency Medicine");
    }
}
