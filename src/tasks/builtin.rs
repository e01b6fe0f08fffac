//! Catalog of the built-in targets

use std::path::Path;

use crate::brief::{BriefInput, BriefSource, PROJECT_YAML};
use crate::housekeeping::CleanScope;
use crate::style::LintOptions;
use crate::tasks::task::{Exec, Guard, Step, Task};
use crate::vars::{Var, Vars};

pub const REQUIREMENTS: &str = "requirements.txt";
pub const BRIEF_TEST: &str = "tests/test_product_brief.py";
pub const TREE_DEPTH: usize = 3;
pub const TREE_WIDE_DEPTH: usize = 5;

/// IDs of every built-in target, in catalog order
pub const BUILTIN_IDS: [&str; 18] = [
    "bootstrap",
    "init-venv",
    "install",
    "install-dev",
    "brief",
    "brief-json",
    "check-brief",
    "test",
    "lint-yaml",
    "lint",
    "style-lint",
    "style-lint-fix",
    "style-lint-json",
    "clean",
    "clean-all",
    "clean-venv",
    "tree",
    "tree-wide",
];

const BRIEF_USAGE: &str = "[error] TOPIC, AUDIENCE, PAGES and OUTPUTS are required\n\
usage: bookforge brief --topic \"<topic>\" --audience \"<audience>\" --pages 160 --outputs DOCX,PDF,EPUB";

const BRIEF_JSON_USAGE: &str = "[error] JSON is required\n\
example: bookforge brief-json '{\"topic\":\"<topic>\",\"audience\":\"<audience>\",\"target_pages\":160,\"outputs\":[\"DOCX\",\"PDF\",\"EPUB\"]}'";

/// Parameters of the `brief` and `brief-json` targets.
///
/// Values are raw strings so that emptiness can be reported as a usage error.
#[derive(Debug, Clone, Default)]
pub struct BriefParams {
    pub topic: Option<String>,
    pub audience: Option<String>,
    pub pages: Option<String>,
    pub outputs: Option<String>,
    pub json: Option<String>,
}

impl BriefParams {
    /// Read parameters from `TOPIC`, `AUDIENCE`, `PAGES`, `OUTPUTS` and `JSON`.
    #[must_use]
    pub fn from_env() -> Self {
        let get = |name: &str| std::env::var(name).ok();
        BriefParams {
            topic: get("TOPIC"),
            audience: get("AUDIENCE"),
            pages: get("PAGES"),
            outputs: get("OUTPUTS"),
            json: get("JSON"),
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Steps of the `brief` target: the stage itself, or a usage error when a parameter is missing.
#[must_use]
pub fn brief_step(params: &BriefParams) -> Step {
    let (Some(topic), Some(audience), Some(pages), Some(outputs)) = (
        non_blank(params.topic.as_ref()),
        non_blank(params.audience.as_ref()),
        non_blank(params.pages.as_ref()),
        non_blank(params.outputs.as_ref()),
    ) else {
        return Step::Usage(BRIEF_USAGE.to_string());
    };
    let Some(target_pages) = pages.parse::<u32>().ok().filter(|n| *n > 0) else {
        return Step::Usage(format!(
            "[error] PAGES must be a positive integer, got `{pages}`\n{BRIEF_USAGE}"
        ));
    };
    Step::Brief(BriefSource::Flags(BriefInput {
        topic: topic.to_string(),
        audience: audience.to_string(),
        target_pages,
        outputs: outputs
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect(),
    }))
}

/// Steps of the `brief-json` target: the raw payload is forwarded untouched.
#[must_use]
pub fn brief_json_step(params: &BriefParams) -> Step {
    match params.json.as_ref() {
        Some(json) if !json.trim().is_empty() => Step::Brief(BriefSource::Json(json.clone())),
        _ => Step::Usage(BRIEF_JSON_USAGE.to_string()),
    }
}

fn task(id: &str, description: &str, depends_on: &[&str], steps: Vec<Step>) -> Task {
    Task {
        id: id.to_string(),
        description: description.to_string(),
        depends_on: depends_on.iter().map(|d| (*d).to_string()).collect(),
        steps,
    }
}

fn style_lint(vars: &Vars) -> LintOptions {
    LintOptions {
        paths: vec![vars.get(Var::StyleGlob).to_string()],
        ..Default::default()
    }
}

/// Build every built-in target for a workspace.
#[must_use]
pub fn builtin_tasks(root: &Path, vars: &Vars, params: &BriefParams) -> Vec<Task> {
    let py = vars.program(Var::Py, root);
    let pip = vars.program(Var::Pip, root);
    let yamllint = vars.program(Var::Yamllint, root);
    let pytest = vars.program(Var::Pytest, root);
    let req_dev = vars.path(Var::ReqDev, root);

    vec![
        task(
            "bootstrap",
            "Run main.py",
            &[],
            vec![Step::Exec(Exec::new(&py).arg("main.py"))],
        ),
        task(
            "init-venv",
            "Create the virtualenv and install requirements.txt",
            &[],
            vec![
                Step::EnsureVenv,
                Step::Exec(Exec::new(&pip).arg("install").arg("--upgrade").arg("pip")),
                Step::Exec(
                    Exec::new(&pip)
                        .arg("install")
                        .arg("-r")
                        .arg(root.join(REQUIREMENTS)),
                ),
            ],
        ),
        task("install", "Alias of init-venv", &["init-venv"], vec![]),
        task(
            "install-dev",
            "Install dev requirements on top of install",
            &["install"],
            vec![Step::Exec(
                Exec::new(&pip)
                    .arg("install")
                    .arg("-r")
                    .arg(&req_dev)
                    .guard(Guard::File(req_dev.clone())),
            )],
        ),
        task(
            "brief",
            "Generate config/project.yaml from TOPIC/AUDIENCE/PAGES/OUTPUTS",
            &[],
            vec![brief_step(params)],
        ),
        task(
            "brief-json",
            "Generate config/project.yaml from a JSON payload",
            &[],
            vec![brief_json_step(params)],
        ),
        task(
            "check-brief",
            "Lint and validate config/project.yaml, then run its tests (test failures ignored)",
            &[],
            vec![
                Step::RequireFile {
                    path: root.join(PROJECT_YAML),
                    hint: "run `bookforge brief` first".to_string(),
                },
                Step::Exec(
                    Exec::new(&yamllint)
                        .arg(root.join(PROJECT_YAML))
                        .guard(Guard::Program),
                ),
                Step::ValidateBrief,
                Step::Exec(
                    Exec::new(&pytest)
                        .arg(root.join(BRIEF_TEST))
                        .arg("-q")
                        .ignore_failure(),
                ),
            ],
        ),
        task(
            "test",
            "Run the test suite (failures ignored)",
            &[],
            vec![Step::Exec(Exec::new(&pytest).arg("-q").ignore_failure())],
        ),
        task(
            "lint-yaml",
            "Lint config/ with yamllint (failures ignored)",
            &[],
            vec![Step::Exec(
                Exec::new(&yamllint)
                    .arg(root.join("config"))
                    .guard(Guard::Program)
                    .ignore_failure(),
            )],
        ),
        task("lint", "Alias of lint-yaml", &["lint-yaml"], vec![]),
        task(
            "style-lint",
            "Style-lint drafts matching STYLE_GLOB",
            &[],
            vec![Step::StyleLint(style_lint(vars))],
        ),
        task(
            "style-lint-fix",
            "Style-lint drafts and apply safe whitespace fixes",
            &[],
            vec![Step::StyleLint(LintOptions {
                fix: true,
                ..style_lint(vars)
            })],
        ),
        task(
            "style-lint-json",
            "Style-lint drafts and write the JSON report to STYLE_JSON",
            &[],
            vec![Step::StyleLint(LintOptions {
                json_out: Some(vars.path(Var::StyleJson, root)),
                ..style_lint(vars)
            })],
        ),
        task(
            "clean",
            "Remove build artifacts",
            &[],
            vec![Step::Clean(CleanScope::Build)],
        ),
        task(
            "clean-all",
            "Remove build artifacts, caches and *.pyc files",
            &["clean"],
            vec![Step::Clean(CleanScope::Caches)],
        ),
        task(
            "clean-venv",
            "Remove the virtualenv",
            &[],
            vec![Step::Clean(CleanScope::Venv)],
        ),
        task(
            "tree",
            "Show the project tree (depth 3)",
            &[],
            vec![Step::Tree { depth: TREE_DEPTH }],
        ),
        task(
            "tree-wide",
            "Show the project tree (depth 5)",
            &[],
            vec![Step::Tree {
                depth: TREE_WIDE_DEPTH,
            }],
        ),
    ]
}
