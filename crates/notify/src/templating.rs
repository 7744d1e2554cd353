//! Minijinja template rendering for escalation messages.
//!
//! Renders subject and body templates with access to the rule, the failing
//! location, the schedule window, and the owning tenant.
//!
//! Templates are arbitrary strings (not pre-registered), so a fresh
//! [`minijinja::Environment`] is created per render call.

use crate::traits::NotifyError;

/// Context data available to escalation templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EscalationContext {
    /// Rule that fired.
    pub rule: RuleContext,
    /// Failing location, when the escalation is location-scoped.
    pub location: Option<LocationContext>,
    /// Schedule window that was checked, when present.
    pub window: Option<WindowContext>,
    /// Owning tenant identifier.
    pub tenant: String,
    /// Monitored event-type description.
    pub event_type: String,
    /// Current timestamp in ISO 8601 format.
    pub now: String,
}

/// Rule fields exposed to templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RuleContext {
    pub id: String,
    pub description: String,
}

/// Location fields exposed to templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LocationContext {
    pub code: String,
    pub name: String,
}

/// Schedule window exposed to templates (wall-clock "HH:MM" strings).
#[derive(Debug, Clone, serde::Serialize)]
pub struct WindowContext {
    pub start: String,
    pub end: String,
}

/// Renders escalation templates using minijinja.
///
/// A fresh [`minijinja::Environment`] is created per render call since
/// templates are dynamic strings, not pre-registered files.
#[derive(Debug)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Build a configured minijinja environment with custom filters and globals.
    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();

        // `lower` and `upper` are built-in with the "builtins" feature,
        // but we register explicit versions to guarantee availability.
        env.add_filter("lower", lower_filter);
        env.add_filter("upper", upper_filter);

        // Register global `env()` function for environment variable access
        env.add_function("env", env_function);

        env
    }

    /// Render a template string with the given serializable context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render<S: serde::Serialize>(
        &self,
        template_str: &str,
        ctx: &S,
    ) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Validate that a template string parses without errors.
    ///
    /// This does not evaluate the template — it only checks syntax.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom filter: lowercase a string.
fn lower_filter(value: String) -> String {
    value.to_lowercase()
}

/// Custom filter: uppercase a string.
fn upper_filter(value: String) -> String {
    value.to_uppercase()
}

/// Global function: read an environment variable by name.
///
/// Returns the variable value, or an empty string if not found
/// (with a warning logged via tracing).
fn env_function(name: String) -> String {
    match std::env::var(&name) {
        Ok(val) => val,
        Err(_) => {
            tracing::warn!(var = %name, "Environment variable not found, returning empty string");
            String::new()
        }
    }
}
