//! Planning prompt rendering via `minijinja`.
//!
//! A single template named `planning` turns a [`PlanningContext`] into the
//! text sent to the oracle. The built-in template can be replaced by a file
//! (`planning.template_path`) so operators can tune the wording without
//! recompiling. Templates see the context fields by name: `agent_id`,
//! `position`, `region`, `region_span`, `map`, `region_dimensions`,
//! `adjacent_regions`, `historical_digest`, `current_digest`.

use std::path::{Path, PathBuf};

use minijinja::Environment;
use swarm_agents::PlanningContext;

const TEMPLATE_NAME: &str = "planning";

/// The default planning prompt.
pub const BUILTIN_TEMPLATE: &str = "\
You are exploration agent {{ agent_id }} in a swarm surveying a disaster area.
The map is {{ map.width }} cells wide and {{ map.height }} cells high, divided into regions of {{ region_dimensions.width }} by {{ region_dimensions.height }} cells ({{ region_span.row }} region rows, {{ region_span.col }} region columns).
You are at cell ({{ position.x }}, {{ position.y }}) in region (row {{ region.row }}, column {{ region.col }}).
Moving up increases the row, down decreases it, right increases the column, and left decreases it.

Visits you have recorded in the adjacent regions:
{% for adjacent in adjacent_regions %}- {{ adjacent.direction }}: region (row {{ adjacent.region.row }}, column {{ adjacent.region.col }}), {{ adjacent.score }} visits
{% endfor %}
Prefer moving toward the least-explored adjacent region.

What you and your peers knew last round:
{{ historical_digest or \"Nothing yet.\" }}

What you and your peers know now:
{{ current_digest }}

Answer with the single direction to move next: up, down, left, or right.
";

/// Errors from loading or rendering the planning template.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// The template file could not be read.
    #[error("failed to read template {}: {source}", .path.display())]
    Read {
        /// The configured template path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The template failed to compile or render.
    #[error("template error: {source}")]
    Template {
        /// The underlying template error.
        #[from]
        source: minijinja::Error,
    },
}

/// Renders planning prompts.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// An engine using [`BUILTIN_TEMPLATE`].
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] if the built-in template fails to
    /// compile.
    pub fn builtin() -> Result<Self, PromptError> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, BUILTIN_TEMPLATE)?;
        Ok(Self { env })
    }

    /// An engine using `source` as the template.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] if `source` fails to compile.
    pub fn from_source(source: String) -> Result<Self, PromptError> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Self { env })
    }

    /// An engine reading its template from `path`, or the built-in one when
    /// `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Read`] if the file cannot be read and
    /// [`PromptError::Template`] if it fails to compile.
    pub fn load(path: Option<&Path>) -> Result<Self, PromptError> {
        match path {
            None => Self::builtin(),
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|source| PromptError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_source(source)
            }
        }
    }

    /// Render the prompt for one agent.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] if rendering fails.
    pub fn render(&self, context: &PlanningContext) -> Result<String, PromptError> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(context)?)
    }
}
