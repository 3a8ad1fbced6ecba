use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("mimid.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("mimid.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("mimid.client.request_duration_seconds");

pub(crate) static SESSION_SAVES: Counter = Counter::new("mimid.sessions.saves");
pub(crate) static SESSION_SAVE_FAILURES: Counter = Counter::new("mimid.sessions.save_failures");
pub(crate) static SESSION_READ_FAILURES: Counter = Counter::new("mimid.sessions.read_failures");

pub(crate) static USAGE_INPUT_TOKENS: Counter = Counter::new("mimid.usage.input_tokens");
pub(crate) static USAGE_OUTPUT_TOKENS: Counter = Counter::new("mimid.usage.output_tokens");

pub(crate) static INTERVIEW_TURNS: Counter = Counter::new("mimid.interview.turns");
pub(crate) static INTERVIEW_AUTH_FAILURES: Counter = Counter::new("mimid.interview.auth_failures");
pub(crate) static INTERVIEW_INLINE_ERRORS: Counter =
    Counter::new("mimid.interview.inline_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_SAVES);
    collector.register_counter(&SESSION_SAVE_FAILURES);
    collector.register_counter(&SESSION_READ_FAILURES);

    collector.register_counter(&USAGE_INPUT_TOKENS);
    collector.register_counter(&USAGE_OUTPUT_TOKENS);

    collector.register_counter(&INTERVIEW_TURNS);
    collector.register_counter(&INTERVIEW_AUTH_FAILURES);
    collector.register_counter(&INTERVIEW_INLINE_ERRORS);
}
