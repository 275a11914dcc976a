//! Stageloop CLI binary: run one task through the plan / decide / describe / execute /
//! reflect loop and print the answer.

mod logging;
mod task;

use std::path::PathBuf;

use clap::Parser;

use task::TaskOptions;

#[derive(Parser, Debug)]
#[command(name = "stageloop")]
#[command(about = "Stageloop — answer a task with a tool-using agent loop")]
struct Args {
    /// Task for the agent (all positional words are joined)
    #[arg(required = true, trailing_var_arg = true, value_name = "TASK")]
    task: Vec<String>,

    /// Model name (default: STAGELOOP_MODEL or gpt-4o-mini)
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Iteration ceiling (default: STAGELOOP_MAX_STEPS or 15)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_steps: Option<u32>,

    /// Reject describe payloads that do not match the tool's input schema
    #[arg(long)]
    strict: bool,

    /// Directory with a stages.yaml overriding the default prompts
    #[arg(long, value_name = "DIR")]
    prompts_dir: Option<PathBuf>,

    /// Write a Markdown transcript of the run to this file (truncated at start)
    #[arg(long, value_name = "PATH", env = "STAGELOOP_TRANSCRIPT")]
    transcript: Option<PathBuf>,

    /// Print the answer together with the final run state as JSON
    #[arg(long)]
    json: bool,

    /// Do not register the web_fetcher tool
    #[arg(long)]
    no_web: bool,
}

impl From<Args> for TaskOptions {
    fn from(args: Args) -> Self {
        TaskOptions {
            task: args.task.join(" "),
            model: args.model,
            max_steps: args.max_steps,
            strict: args.strict,
            prompts_dir: args.prompts_dir,
            transcript: args.transcript,
            json: args.json,
            no_web: args.no_web,
        }
    }
}

#[tokio::main]
async fn main() {
    let env_result = config::load_and_apply("stageloop", None);
    if let Err(e) = logging::init() {
        eprintln!("stageloop: cannot open log file: {}", e);
        std::process::exit(1);
    }
    match env_result {
        Ok(applied) => tracing::debug!(?applied, "environment loaded"),
        Err(e) => tracing::warn!(error = %e, "config files ignored"),
    }

    let args = Args::parse();
    match task::run(args.into()).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!(error = %e, "task failed");
            eprintln!("stageloop: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_words_form_the_task() {
        let args = Args::try_parse_from(["stageloop", "--max-steps", "3", "what", "is", "rust?"]).unwrap();
        let opts = TaskOptions::from(args);
        assert_eq!(opts.task, "what is rust?");
        assert_eq!(opts.max_steps, Some(3));
        assert!(!opts.json);
    }

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from([
            "stageloop",
            "--model",
            "gpt-4o",
            "--strict",
            "--json",
            "--no-web",
            "--transcript",
            "log.md",
            "task",
        ])
        .unwrap();
        assert_eq!(args.model.as_deref(), Some("gpt-4o"));
        assert!(args.strict && args.json && args.no_web);
        assert_eq!(args.transcript, Some(PathBuf::from("log.md")));
    }

    #[test]
    fn zero_max_steps_rejected_by_parser() {
        assert!(Args::try_parse_from(["stageloop", "--max-steps", "0", "task"]).is_err());
    }

    #[test]
    fn task_is_required() {
        assert!(Args::try_parse_from(["stageloop"]).is_err());
    }
}
