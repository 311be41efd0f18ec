//! End-to-end pipeline tests.
//!
//! The LLM is a scripted mock that replays canned responses in order and
//! records every request it receives. Execution is real: generated "code"
//! is shell script run through `ScriptExecutor` with the `sh` interpreter
//! in a temporary scratch directory.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use taskforge::error::{LlmError, PipelineError, TemplateError};
use taskforge::executor::ScriptExecutor;
use taskforge::llm::{Candidate, GenerationRequest, GenerationResponse, LlmProvider};
use taskforge::pipeline::{
    AttachmentManifest, Pipeline, PipelineConfig, PipelineOutcome, TaskRequest,
};
use taskforge::prompts::TASK_BREAKDOWN_TEMPLATE;

/// Mock provider replaying canned responses and recording requests.
struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedLlm {
    fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().expect("lock poisoned").len()
    }

    fn call_segments(&self, index: usize) -> Vec<String> {
        self.calls.lock().expect("lock poisoned")[index]
            .segments
            .clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.calls.lock().expect("lock poisoned").push(request);
        let text = self
            .responses
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .ok_or_else(|| LlmError::RequestFailed("no scripted response left".to_string()))?;
        Ok(GenerationResponse {
            model: "test-model".to_string(),
            candidates: vec![Candidate {
                text,
                finish_reason: Some("STOP".to_string()),
            }],
            usage: None,
        })
    }
}

/// Test fixture: template dir with the breakdown instructions, plus
/// breakdown and scratch dirs, wired into a config using `sh`.
struct Fixture {
    _templates: TempDir,
    _breakdowns: TempDir,
    _scratch: TempDir,
    config: PipelineConfig,
}

impl Fixture {
    fn new() -> Self {
        Self::build(true)
    }

    fn without_template() -> Self {
        Self::build(false)
    }

    fn build(write_template: bool) -> Self {
        let templates = tempfile::tempdir().expect("tempdir");
        let breakdowns = tempfile::tempdir().expect("tempdir");
        let scratch = tempfile::tempdir().expect("tempdir");

        if write_template {
            std::fs::write(
                templates
                    .path()
                    .join(format!("{}.txt", TASK_BREAKDOWN_TEMPLATE)),
                "Break the task above into numbered steps.",
            )
            .expect("write template");
        }

        let config = PipelineConfig::new()
            .with_interpreter("sh", "sh")
            .with_exec_timeout(Duration::from_secs(10))
            .with_template_dir(templates.path())
            .with_breakdown_dir(breakdowns.path())
            .with_scratch_dir(scratch.path());

        Self {
            _templates: templates,
            _breakdowns: breakdowns,
            _scratch: scratch,
            config,
        }
    }

    fn pipeline(&self, llm: Arc<ScriptedLlm>) -> Pipeline {
        let executor = Arc::new(
            ScriptExecutor::new(&self.config.interpreter, &self.config.scratch_dir)
                .with_extension(&self.config.script_extension)
                .with_timeout(self.config.exec_timeout),
        );
        Pipeline::new(llm, executor, self.config.clone())
    }
}

// Scenario 1: working code on the first attempt. One breakdown call, one
// synthesis call, one execution, result "3".
#[tokio::test]
async fn scenario_first_attempt_succeeds() {
    let fixture = Fixture::new();
    let llm = ScriptedLlm::new(vec![
        "1. add 1 and 2\n2. print the sum", // breakdown
        "echo 3",                           // code
    ]);
    let pipeline = fixture.pipeline(llm.clone());

    let outcome = pipeline
        .run(
            TaskRequest::new("1. Add two numbers"),
            AttachmentManifest::new(),
        )
        .await
        .expect("pipeline should succeed");

    assert!(outcome.is_solved());
    assert_eq!(outcome.answer_text().trim(), "3");
    assert_eq!(outcome.attempts(), 1);
    // Decomposer once, synthesizer once, no repair calls.
    assert_eq!(llm.call_count(), 2);
}

// Decomposition happens before synthesis, and the synthesis prompt carries
// the breakdown text.
#[tokio::test]
async fn decompose_once_then_synthesize_once() {
    let fixture = Fixture::new();
    let llm = ScriptedLlm::new(vec!["the breakdown text", "echo done"]);
    let pipeline = fixture.pipeline(llm.clone());

    pipeline
        .run(TaskRequest::new("do the thing"), AttachmentManifest::new())
        .await
        .expect("pipeline should succeed");

    // Call 0 is the decomposition: task text then instruction template.
    let decompose = llm.call_segments(0);
    assert_eq!(decompose.len(), 2);
    assert_eq!(decompose[0], "do the thing");
    assert!(decompose[1].contains("numbered steps"));

    // Call 1 is the synthesis: single combined prompt with the breakdown.
    let synthesize = llm.call_segments(1);
    assert_eq!(synthesize.len(), 1);
    assert!(synthesize[0].contains("the breakdown text"));
    assert!(synthesize[0].contains("do the thing"));
}

// Scenario 2: broken code on attempt 1, corrected on attempt 2. Exactly one
// repair call, result "ok".
#[tokio::test]
async fn scenario_one_repair_cycle() {
    let fixture = Fixture::new();
    let llm = ScriptedLlm::new(vec![
        "1. print ok",                      // breakdown
        "echo SyntaxError 1>&2\nexit 1",    // attempt 1 fails
        "echo ok",                          // repaired code
    ]);
    let pipeline = fixture.pipeline(llm.clone());

    let outcome = pipeline
        .run(TaskRequest::new("print ok"), AttachmentManifest::new())
        .await
        .expect("pipeline should succeed");

    assert!(outcome.is_solved());
    assert_eq!(outcome.answer_text().trim(), "ok");
    assert_eq!(outcome.attempts(), 2);
    // breakdown + synthesis + 1 repair
    assert_eq!(llm.call_count(), 3);

    // The repair prompt carried the failing code and its stderr.
    let repair = llm.call_segments(2);
    assert!(repair[0].contains("exit 1"));
    assert!(repair[0].contains("SyntaxError"));
}

// Scenario 3: every attempt fails. Exactly 2 repair calls, 3 executions,
// and the result is attempt 3's stderr.
#[tokio::test]
async fn scenario_retries_exhausted() {
    let fixture = Fixture::new();
    let llm = ScriptedLlm::new(vec![
        "1. doomed",                     // breakdown
        "echo fail-1 1>&2\nexit 1",      // attempt 1
        "echo fail-2 1>&2\nexit 1",      // attempt 2 (repair 1)
        "echo fail-3 1>&2\nexit 1",      // attempt 3 (repair 2)
    ]);
    let pipeline = fixture.pipeline(llm.clone());

    let outcome = pipeline
        .run(TaskRequest::new("impossible"), AttachmentManifest::new())
        .await
        .expect("exhaustion is a normal outcome");

    assert!(!outcome.is_solved());
    assert_eq!(outcome.answer_text().trim(), "fail-3");
    assert_eq!(outcome.attempts(), 3);
    // breakdown + synthesis + exactly 2 repairs; a 4th attempt would have
    // drained a 5th response and changed this count.
    assert_eq!(llm.call_count(), 4);

    assert!(matches!(
        outcome,
        PipelineOutcome::Exhausted { attempts: 3, .. }
    ));
}

// Scenario 4: the instruction template is missing. The request fails with a
// template error before any LLM or executor work happens.
#[tokio::test]
async fn scenario_template_missing() {
    let fixture = Fixture::without_template();
    let llm = ScriptedLlm::new(vec![]);
    let pipeline = fixture.pipeline(llm.clone());

    let err = pipeline
        .run(TaskRequest::new("anything"), AttachmentManifest::new())
        .await
        .unwrap_err();

    assert!(err.is_template_missing());
    assert!(matches!(
        err,
        PipelineError::Template(TemplateError::NotFound(ref name))
            if name == TASK_BREAKDOWN_TEMPLATE
    ));
    assert_eq!(llm.call_count(), 0);
}

// Attachment names and staged paths reach the synthesis prompt, and the
// generated code can actually read the staged file.
#[tokio::test]
async fn attachments_are_visible_to_generated_code() {
    let fixture = Fixture::new();

    let attachment_dir = tempfile::tempdir().expect("tempdir");
    let data_path = attachment_dir.path().join("numbers.txt");
    std::fs::write(&data_path, "41\n").expect("write attachment");

    let llm = ScriptedLlm::new(vec![
        "1. read numbers.txt\n2. print it",
        &format!("cat {}", data_path.display()),
    ]);
    let pipeline = fixture.pipeline(llm.clone());

    let mut manifest = AttachmentManifest::new();
    manifest.insert("numbers.txt", data_path.clone());

    let outcome = pipeline
        .run(TaskRequest::new("print the file"), manifest)
        .await
        .expect("pipeline should succeed");

    assert_eq!(outcome.answer_text().trim(), "41");

    let synth_prompt = &llm.call_segments(1)[0];
    assert!(synth_prompt.contains("numbers.txt"));
    assert!(synth_prompt.contains(&data_path.display().to_string()));
}

// Two concurrent requests never share breakdown or scratch paths: both
// complete with their own answers and leave their own breakdown files.
#[tokio::test]
async fn concurrent_requests_are_isolated() {
    let fixture = Fixture::new();

    let llm_a = ScriptedLlm::new(vec!["steps a", "echo answer-a"]);
    let llm_b = ScriptedLlm::new(vec!["steps b", "echo answer-b"]);
    let pipeline_a = fixture.pipeline(llm_a);
    let pipeline_b = fixture.pipeline(llm_b);

    let task_a = TaskRequest::new("task a");
    let task_b = TaskRequest::new("task b");
    let (id_a, id_b) = (task_a.id, task_b.id);

    let (out_a, out_b) = tokio::join!(
        pipeline_a.run(task_a, AttachmentManifest::new()),
        pipeline_b.run(task_b, AttachmentManifest::new()),
    );

    assert_eq!(out_a.expect("a succeeds").answer_text().trim(), "answer-a");
    assert_eq!(out_b.expect("b succeeds").answer_text().trim(), "answer-b");

    let breakdown_a = fixture
        .config
        .breakdown_dir
        .join(format!("breakdown-{}.txt", id_a));
    let breakdown_b = fixture
        .config
        .breakdown_dir
        .join(format!("breakdown-{}.txt", id_b));
    assert_eq!(
        std::fs::read_to_string(breakdown_a).expect("breakdown a persisted"),
        "steps a"
    );
    assert_eq!(
        std::fs::read_to_string(breakdown_b).expect("breakdown b persisted"),
        "steps b"
    );
}

// A service failure during the initial synthesis call is fatal for the
// whole request.
#[tokio::test]
async fn llm_failure_during_synthesis_is_fatal() {
    let fixture = Fixture::new();
    // Only the breakdown response is scripted; the synthesis call fails.
    let llm = ScriptedLlm::new(vec!["steps"]);
    let pipeline = fixture.pipeline(llm);

    let err = pipeline
        .run(TaskRequest::new("anything"), AttachmentManifest::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Llm(_)));
}
