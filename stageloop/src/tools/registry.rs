use std::collections::HashMap;

use serde::Serialize;

use super::r#trait::Tool;
use super::{FINAL_ANSWER_DESCRIPTION, TOOL_FINAL_ANSWER};

/// Name, description and payload instruction of one tool, as shown to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub instruction: String,
}

/// Lookup of a tool name that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tool `{name}` is not registered")]
pub struct ToolLookupError {
    pub name: String,
    pub available: Vec<String>,
}

/// Tools available to one agent, keyed by name.
///
/// Registration order is kept: [`ToolRegistry::specs`] and [`ToolRegistry::render_catalogue`]
/// list tools in that order so stage prompts are reproducible. Registering a name twice
/// replaces the earlier tool in place.
///
/// The terminal tool [`TOOL_FINAL_ANSWER`] never has to be registered. When it is not,
/// the catalogue still lists it with [`FINAL_ANSWER_DESCRIPTION`].
///
/// # Examples
///
/// ```
/// use stageloop::tools::{FnTool, ToolRegistry};
///
/// let mut registry = ToolRegistry::new();
/// registry.register(FnTool::new(
///     "save_answer",
///     "Save the answer to a question",
///     r#"Required payload: {"id": "question id", "answer": "answer text"}"#,
///     |_payload| async { Ok("Answer saved successfully.".to_string()) },
/// ));
/// assert!(registry.lookup("save_answer").is_ok());
/// assert!(registry.lookup("search").is_err());
/// assert_eq!(registry.specs().len(), 2); // save_answer + final_answer
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool; a tool with the same name is replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.register_boxed(Box::new(tool))
    }

    pub fn register_boxed(&mut self, tool: Box<dyn Tool>) -> &mut Self {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&i) => self.tools[i] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.register(tool);
        self
    }

    /// Finds a registered tool by name.
    ///
    /// # Errors
    ///
    /// [`ToolLookupError`] carrying the requested name and the registered names.
    pub fn lookup(&self, name: &str) -> Result<&dyn Tool, ToolLookupError> {
        self.index
            .get(name)
            .map(|&i| self.tools[i].as_ref())
            .ok_or_else(|| ToolLookupError {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// True for the reserved name that ends the loop.
    pub fn is_terminal(name: &str) -> bool {
        name == TOOL_FINAL_ANSWER
    }

    /// Spec of `name`: the registered tool, or the built-in terminal entry.
    pub fn spec(&self, name: &str) -> Option<ToolSpec> {
        match self.lookup(name) {
            Ok(tool) => Some(spec_of(tool)),
            Err(_) if Self::is_terminal(name) => Some(final_answer_spec()),
            Err(_) => None,
        }
    }

    /// Spec of the terminal tool: the registered `final_answer` if any, else the built-in one.
    pub fn terminal_spec(&self) -> ToolSpec {
        self.lookup(TOOL_FINAL_ANSWER)
            .map(spec_of)
            .unwrap_or_else(|_| final_answer_spec())
    }

    /// Catalogue shown to the model: registered tools in order, then the terminal tool if
    /// it was not registered.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.iter().map(|t| spec_of(t.as_ref())).collect();
        if !self.contains(TOOL_FINAL_ANSWER) {
            specs.push(final_answer_spec());
        }
        specs
    }

    /// One `- name: description` line per catalogue entry.
    pub fn render_catalogue(&self) -> String {
        self.specs()
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn spec_of(tool: &dyn Tool) -> ToolSpec {
    ToolSpec {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        instruction: tool.instruction().to_string(),
    }
}

fn final_answer_spec() -> ToolSpec {
    ToolSpec {
        name: TOOL_FINAL_ANSWER.to_string(),
        description: FINAL_ANSWER_DESCRIPTION.to_string(),
        instruction: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::FnTool;

    fn tool(name: &str, result: &'static str) -> FnTool {
        FnTool::new(name, format!("{} tool", name), "{}", move |_| async move {
            Ok(result.to_string())
        })
    }

    #[test]
    fn catalogue_keeps_registration_order_and_appends_terminal() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("zeta", "z")).register(tool("alpha", "a"));
        assert_eq!(
            registry.render_catalogue(),
            format!(
                "- zeta: zeta tool\n- alpha: alpha tool\n- final_answer: {}",
                FINAL_ANSWER_DESCRIPTION
            )
        );
    }

    #[test]
    fn registered_final_answer_is_not_duplicated() {
        let registry = ToolRegistry::new().with_tool(FnTool::new(
            TOOL_FINAL_ANSWER,
            "Answer the user",
            "",
            |_| async { Ok(String::new()) },
        ));
        let specs = registry.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].description, "Answer the user");
    }

    #[tokio::test]
    async fn reregistering_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry
            .register(tool("a", "first"))
            .register(tool("b", "b"))
            .register(tool("a", "second"));
        assert_eq!(registry.names(), vec!["a", "b"]);
        let out = registry.lookup("a").unwrap().call(serde_json::Value::Null).await;
        assert_eq!(out.unwrap(), "second");
    }

    #[test]
    fn lookup_unknown_reports_available_names() {
        let registry = ToolRegistry::new().with_tool(tool("fetch", "x"));
        let err = registry.lookup("search").err().unwrap();
        assert_eq!(err.name, "search");
        assert_eq!(err.available, vec!["fetch".to_string()]);
    }

    #[test]
    fn spec_falls_back_to_builtin_terminal() {
        let registry = ToolRegistry::new();
        let spec = registry.spec(TOOL_FINAL_ANSWER).unwrap();
        assert_eq!(spec.description, FINAL_ANSWER_DESCRIPTION);
        assert!(registry.spec("missing").is_none());
    }
}
