use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arena_core::domain::{
    JudgeClient, JudgeClientError, JudgeStatus, ProblemId, RunRequest, RunStatus, RunToken,
    TestcaseId,
};
use async_trait::async_trait;
use judge_orchestrator::{JudgeConfig, ProblemSpec, TestcaseSpec};

/// One scripted judge response for a run.
#[derive(Debug, Clone)]
pub struct Step {
    status: u16,
    time: Option<f64>,
    memory: Option<u64>,
    compile_output: Option<String>,
}

impl Step {
    fn finished(status: u16, time: f64) -> Self {
        Self {
            status,
            time: Some(time),
            memory: Some(2048),
            compile_output: None,
        }
    }

    pub fn queued() -> Self {
        Self {
            status: 1,
            time: None,
            memory: None,
            compile_output: None,
        }
    }

    pub fn processing() -> Self {
        Self {
            status: 2,
            ..Self::queued()
        }
    }

    pub fn accepted() -> Self {
        Self::finished(3, 0.05)
    }

    pub fn wrong_answer() -> Self {
        Self::finished(4, 0.2)
    }

    pub fn runtime_error() -> Self {
        Self::finished(11, 0.01)
    }

    pub fn compile_error(output: &str) -> Self {
        Self {
            status: 6,
            compile_output: Some(output.to_string()),
            ..Self::queued()
        }
    }
}

#[derive(Default)]
struct Script {
    next_token: usize,
    batches: VecDeque<Vec<Vec<Step>>>,
    singles: VecDeque<Vec<Step>>,
    runs: HashMap<String, VecDeque<Step>>,
    failing_polls: usize,
    create_delay: Option<Duration>,
    polls: usize,
    requests: Vec<RunRequest>,
}

impl Script {
    fn register(&mut self, steps: Vec<Step>) -> RunToken {
        let token = format!("run-{}", self.next_token);
        self.next_token += 1;
        let steps = if steps.is_empty() {
            vec![Step::accepted()]
        } else {
            steps
        };
        self.runs.insert(token.clone(), steps.into());
        RunToken::new(token)
    }

    fn advance(&mut self, token: &RunToken) -> Result<RunStatus, JudgeClientError> {
        let steps = self
            .runs
            .get_mut(token.as_str())
            .ok_or_else(|| JudgeClientError::MalformedResponse(format!("unknown token {token}")))?;
        let step = if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        }
        .ok_or_else(|| JudgeClientError::MalformedResponse(format!("no script for {token}")))?;

        Ok(RunStatus {
            token: token.clone(),
            status: JudgeStatus::from_id(step.status),
            execution_time: step.time,
            memory_used: step.memory,
            stdout: None,
            compile_output: step.compile_output,
        })
    }
}

/// Judge double driven by per-run scripts. The last step of a script repeats.
#[derive(Clone, Default)]
pub struct ScriptedJudge {
    script: Arc<Mutex<Script>>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next batch; runs without a script are accepted on the first poll.
    pub fn queue_batch(&self, testcases: Vec<Vec<Step>>) {
        self.lock().batches.push_back(testcases);
    }

    pub fn queue_single(&self, steps: Vec<Step>) {
        self.lock().singles.push_back(steps);
    }

    /// Makes every batch creation take `delay` before answering.
    pub fn delay_creation(&self, delay: Duration) {
        self.lock().create_delay = Some(delay);
    }

    pub fn fail_polls(&self, count: usize) {
        self.lock().failing_polls = count;
    }

    pub fn poll_count(&self) -> usize {
        self.lock().polls
    }

    pub fn requests(&self) -> Vec<RunRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("script lock should not be poisoned")
    }
}

#[async_trait]
impl JudgeClient for ScriptedJudge {
    async fn create_batch(
        &self,
        requests: Vec<RunRequest>,
    ) -> Result<Vec<RunToken>, JudgeClientError> {
        let delay = self.lock().create_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.lock();
        let mut scripted = script.batches.pop_front().unwrap_or_default().into_iter();
        let tokens = requests
            .iter()
            .map(|_| {
                let steps = scripted.next().unwrap_or_default();
                script.register(steps)
            })
            .collect();
        script.requests.extend(requests);
        Ok(tokens)
    }

    async fn get_batch(&self, tokens: &[RunToken]) -> Result<Vec<RunStatus>, JudgeClientError> {
        let mut script = self.lock();
        script.polls += 1;
        if script.failing_polls > 0 {
            script.failing_polls -= 1;
            return Err(JudgeClientError::Unavailable("judge is down".to_string()));
        }
        tokens.iter().map(|token| script.advance(token)).collect()
    }

    async fn create_single(&self, request: RunRequest) -> Result<RunToken, JudgeClientError> {
        let mut script = self.lock();
        let steps = script.singles.pop_front().unwrap_or_default();
        script.requests.push(request);
        Ok(script.register(steps))
    }

    async fn get_single(&self, token: &RunToken) -> Result<RunStatus, JudgeClientError> {
        self.lock().advance(token)
    }
}

pub fn problem(testcases: usize) -> ProblemSpec {
    ProblemSpec {
        id: ProblemId::new(),
        time_limit_ms: 2000,
        memory_limit_kb: 65536,
        testcases: (0..testcases)
            .map(|index| TestcaseSpec {
                id: TestcaseId::new(),
                input: format!("{index}\n"),
                expected_output: format!("{}\n", index * 2),
            })
            .collect(),
    }
}

pub fn test_config() -> JudgeConfig {
    JudgeConfig::from_str(
        r#"
event_buffer_size = 256

[polling]
interval_ms = 5000
max_ticks = 10
"#,
    )
    .expect("test config should parse")
}
