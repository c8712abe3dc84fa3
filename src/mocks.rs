// ABOUTME: Record-and-replay doubles for CommandRunner and HttpClient.
// ABOUTME: Rules match on the rendered command or request; the last registered match wins.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::exec::{CommandError, CommandRunner, RunArgs, RunResult};
use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};

type CommandPredicate = Box<dyn Fn(&RunArgs, &str) -> bool + Send + Sync>;
type CommandResponder = Box<dyn Fn(&RunArgs) -> Result<RunResult, CommandError> + Send + Sync>;

/// Command runner that answers from registered rules and records every call.
///
/// Unmatched commands fail as if the binary did not exist.
#[derive(Default)]
pub struct MockCommandRunner {
    rules: Mutex<Vec<(CommandPredicate, CommandResponder)>>,
    calls: Mutex<Vec<RunArgs>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a rule. `predicate` sees the arguments and the masked command line.
    pub fn when<P>(&self, predicate: P) -> CommandExpectation<'_>
    where
        P: Fn(&RunArgs, &str) -> bool + Send + Sync + 'static,
    {
        CommandExpectation {
            runner: self,
            predicate: Box::new(predicate),
        }
    }

    /// Shorthand for a rule matching commands whose line contains `needle`.
    pub fn when_contains(&self, needle: &str) -> CommandExpectation<'_> {
        let needle = needle.to_string();
        self.when(move |_, command| command.contains(&needle))
    }

    pub fn calls(&self) -> Vec<RunArgs> {
        self.calls.lock().clone()
    }

    /// Recorded calls whose command line contains `needle`.
    pub fn calls_matching(&self, needle: &str) -> Vec<RunArgs> {
        self.calls
            .lock()
            .iter()
            .filter(|args| args.command_line().contains(needle))
            .cloned()
            .collect()
    }
}

pub struct CommandExpectation<'a> {
    runner: &'a MockCommandRunner,
    predicate: CommandPredicate,
}

impl CommandExpectation<'_> {
    pub fn respond(self, result: RunResult) {
        self.respond_with(move |_| Ok(result.clone()));
    }

    pub fn respond_with<F>(self, responder: F)
    where
        F: Fn(&RunArgs) -> Result<RunResult, CommandError> + Send + Sync + 'static,
    {
        self.runner
            .rules
            .lock()
            .push((self.predicate, Box::new(responder)));
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(
        &self,
        args: RunArgs,
        cancel: &CancellationToken,
    ) -> Result<RunResult, CommandError> {
        let command = args.command_line();
        self.calls.lock().push(args.clone());

        if cancel.is_cancelled() {
            return Err(CommandError::Cancelled { command });
        }

        let rules = self.rules.lock();
        match rules
            .iter()
            .rev()
            .find(|(predicate, _)| predicate(&args, &command))
        {
            Some((_, responder)) => responder(&args),
            None => Err(CommandError::Spawn {
                command,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no mock registered for command",
                ),
            }),
        }
    }
}

type HttpPredicate = Box<dyn Fn(&HttpRequest) -> bool + Send + Sync>;
type HttpResponder = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, HttpError> + Send + Sync>;

/// HTTP client that answers from registered rules and records every request.
///
/// Unmatched requests get a 404.
#[derive(Default)]
pub struct MockHttpClient {
    rules: Mutex<Vec<(HttpPredicate, HttpResponder)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when<P>(&self, predicate: P) -> HttpExpectation<'_>
    where
        P: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        HttpExpectation {
            client: self,
            predicate: Box::new(predicate),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Recorded requests whose path contains `needle`.
    pub fn requests_matching(&self, needle: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path().contains(needle))
            .cloned()
            .collect()
    }
}

pub struct HttpExpectation<'a> {
    client: &'a MockHttpClient,
    predicate: HttpPredicate,
}

impl HttpExpectation<'_> {
    pub fn respond(self, response: HttpResponse) {
        self.respond_with(move |_| Ok(response.clone()));
    }

    pub fn respond_with<F>(self, responder: F)
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, HttpError> + Send + Sync + 'static,
    {
        self.client
            .rules
            .lock()
            .push((self.predicate, Box::new(responder)));
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().push(request.clone());

        let rules = self.rules.lock();
        match rules.iter().rev().find(|(predicate, _)| predicate(&request)) {
            Some((_, responder)) => responder(&request),
            None => Ok(HttpResponse::empty(404)),
        }
    }
}
