//! One function per stage. Each takes the run state by `&mut`, makes at most one
//! completion call or one tool call, and reports what it produced for observers.

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AgentError, DecisionError};
use crate::llm::{complete, Completion, LlmClient, ResponseFormat};
use crate::prompts::{AgentPrompts, PromptStage};
use crate::state::{ActionRecord, ActiveTool, RunState, Stage};
use crate::tools::{Tool, ToolRegistry};

/// Collaborators shared by every stage of a run.
pub(crate) struct StageContext<'a> {
    pub llm: &'a dyn LlmClient,
    pub tools: &'a ToolRegistry,
    pub prompts: &'a AgentPrompts,
    pub strict_payloads: bool,
}

/// Display-ready output of one stage.
#[derive(Debug)]
pub(crate) struct StageReport {
    pub heading: &'static str,
    pub content: String,
}

/// Result of the decide stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    /// The terminal tool was chosen; skip to finalization.
    Finish,
    /// A registered tool was chosen; run describe, execute and reflect.
    Act,
}

/// Sets the stage, builds its system prompt and makes the completion call.
async fn prompt_and_complete(
    ctx: &StageContext<'_>,
    state: &mut RunState,
    stage: Stage,
    prompt: PromptStage,
    format: ResponseFormat,
) -> Result<Completion, AgentError> {
    state.current_stage = stage;
    state.system_prompt = ctx.prompts.get(prompt).resolve(state, ctx.tools).await?;
    complete(ctx.llm, &state.system_prompt, &state.messages, format).await
}

fn json_text(value: &Value) -> String {
    value.to_string()
}

pub(crate) async fn plan(
    ctx: &StageContext<'_>,
    state: &mut RunState,
) -> Result<StageReport, AgentError> {
    let completion = prompt_and_complete(
        ctx,
        state,
        Stage::Plan,
        PromptStage::Plan,
        ResponseFormat::Text,
    )
    .await?;
    state.plan = completion.to_text();
    debug!(plan_len = state.plan.len(), "plan updated");
    Ok(StageReport {
        heading: "Planning",
        content: format!("Current plan: {}", state.plan),
    })
}

pub(crate) async fn decide(
    ctx: &StageContext<'_>,
    state: &mut RunState,
) -> Result<(Decision, StageReport), AgentError> {
    let completion = prompt_and_complete(
        ctx,
        state,
        Stage::Decide,
        PromptStage::Decide,
        ResponseFormat::Json,
    )
    .await?;

    let value = match completion {
        Completion::Structured(v) => v,
        Completion::Text(raw) => return Err(DecisionError::MissingTool { raw }.into()),
    };
    let name = match value.get("tool").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => {
            return Err(DecisionError::MissingTool {
                raw: json_text(&value),
            }
            .into())
        }
    };
    let thoughts = value
        .get("_thoughts")
        .and_then(Value::as_str)
        .unwrap_or_default();
    info!(tool = %name, thoughts = %thoughts, "decision");

    let report = StageReport {
        heading: "Decision",
        content: format!("Next move: {}", json_text(&value)),
    };

    if ToolRegistry::is_terminal(&name) {
        let spec = ctx.tools.terminal_spec();
        state.active_tool = Some(ActiveTool {
            name: spec.name,
            description: spec.description,
            instruction: spec.instruction,
        });
        state.active_tool_payload = None;
        return Ok((Decision::Finish, report));
    }

    let tool = ctx
        .tools
        .lookup(&name)
        .map_err(|e| DecisionError::UnknownTool {
            name: e.name,
            available: e.available,
        })?;
    state.active_tool = Some(ActiveTool {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        instruction: tool.instruction().to_string(),
    });
    state.active_tool_payload = None;
    Ok((Decision::Act, report))
}

pub(crate) async fn describe(
    ctx: &StageContext<'_>,
    state: &mut RunState,
) -> Result<StageReport, AgentError> {
    let completion = prompt_and_complete(
        ctx,
        state,
        Stage::Describe,
        PromptStage::Describe,
        ResponseFormat::Json,
    )
    .await?;

    if ctx.strict_payloads {
        let name = state.active_tool_name().ok_or(AgentError::NoActiveTool)?;
        let tool = ctx
            .tools
            .lookup(name)
            .map_err(|e| DecisionError::UnknownTool {
                name: e.name,
                available: e.available,
            })?;
        check_payload(tool, &completion).map_err(|reason| AgentError::InvalidPayload {
            tool: name.to_string(),
            reason,
        })?;
    }

    let payload = completion.into_value();
    let content = format!("Next step description: {}", json_text(&payload));
    state.active_tool_payload = Some(payload);
    Ok(StageReport {
        heading: "Description",
        content,
    })
}

/// Strict-mode payload check: an object carrying every `required` key of the tool's schema.
fn check_payload(tool: &dyn Tool, completion: &Completion) -> Result<(), String> {
    let object = match completion {
        Completion::Structured(Value::Object(map)) => map,
        Completion::Structured(other) => {
            return Err(format!("expected a JSON object, got {}", other))
        }
        Completion::Text(raw) => return Err(format!("reply is not JSON: {}", raw)),
    };
    let Some(schema) = tool.input_schema() else {
        return Ok(());
    };
    let missing: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(Value::as_str)
                .filter(|k| !object.contains_key(*k))
                .collect()
        })
        .unwrap_or_default();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("missing required field(s): {}", missing.join(", ")))
    }
}

pub(crate) async fn execute(
    ctx: &StageContext<'_>,
    state: &mut RunState,
) -> Result<StageReport, AgentError> {
    state.current_stage = Stage::Execute;
    let name = state
        .active_tool_name()
        .ok_or(AgentError::NoActiveTool)?
        .to_string();
    let tool = ctx
        .tools
        .lookup(&name)
        .map_err(|e| DecisionError::UnknownTool {
            name: e.name,
            available: e.available,
        })?;
    let payload = state.active_tool_payload.clone().unwrap_or(Value::Null);
    debug!(tool = %name, "invoking tool");
    let result = tool
        .call(payload.clone())
        .await
        .map_err(|source| AgentError::ToolInvocation {
            tool: name.clone(),
            source,
        })?;
    let content = format!("Action result: {}", json_text(&Value::String(result.clone())));
    state.actions_taken.push(ActionRecord {
        name: name.clone(),
        payload: json_text(&payload),
        result,
        reflection: String::new(),
        tool: name,
    });
    Ok(StageReport {
        heading: "Execution",
        content,
    })
}

pub(crate) async fn reflect(
    ctx: &StageContext<'_>,
    state: &mut RunState,
) -> Result<StageReport, AgentError> {
    if state.actions_taken.is_empty() {
        state.current_stage = Stage::Reflect;
        return Err(AgentError::NoActionToReflect);
    }
    let completion = prompt_and_complete(
        ctx,
        state,
        Stage::Reflect,
        PromptStage::Reflect,
        ResponseFormat::Text,
    )
    .await?;
    let reflection = completion.to_text();
    if let Some(last) = state.actions_taken.last_mut() {
        last.reflection = reflection.clone();
    }
    Ok(StageReport {
        heading: "Reflection",
        content: reflection,
    })
}

/// Final completion; returns the answer text.
pub(crate) async fn finalize(
    ctx: &StageContext<'_>,
    state: &mut RunState,
) -> Result<(String, StageReport), AgentError> {
    let completion = prompt_and_complete(
        ctx,
        state,
        Stage::Final,
        PromptStage::FinalAnswer,
        ResponseFormat::Text,
    )
    .await?;
    let answer = completion.to_text();
    let report = StageReport {
        heading: "Final Answer",
        content: json_text(&Value::String(answer.clone())),
    };
    Ok((answer, report))
}
