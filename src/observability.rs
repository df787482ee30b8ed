use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("ammora.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("ammora.client.request_errors");
pub(crate) static CLIENT_REQUEST_TIMEOUTS: Counter = Counter::new("ammora.client.timeouts");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("ammora.client.request_duration_seconds");

pub(crate) static CHAT_SUBMISSIONS: Counter = Counter::new("ammora.chat.submissions");
pub(crate) static CHAT_EMPTY_SUBMISSIONS: Counter = Counter::new("ammora.chat.empty_submissions");
pub(crate) static CHAT_BUSY_REJECTIONS: Counter = Counter::new("ammora.chat.busy_rejections");
pub(crate) static CHAT_FAILURES: Counter = Counter::new("ammora.chat.failures");
pub(crate) static CHAT_CANCELLATIONS: Counter = Counter::new("ammora.chat.cancellations");

pub(crate) static HISTORY_LOADS: Counter = Counter::new("ammora.history.loads");
pub(crate) static HISTORY_LOAD_FAILURES: Counter = Counter::new("ammora.history.load_failures");

pub(crate) static SESSION_RESTORES: Counter = Counter::new("ammora.session.restores");
pub(crate) static SESSION_RESETS: Counter = Counter::new("ammora.session.resets");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_REQUEST_TIMEOUTS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CHAT_SUBMISSIONS);
    collector.register_counter(&CHAT_EMPTY_SUBMISSIONS);
    collector.register_counter(&CHAT_BUSY_REJECTIONS);
    collector.register_counter(&CHAT_FAILURES);
    collector.register_counter(&CHAT_CANCELLATIONS);

    collector.register_counter(&HISTORY_LOADS);
    collector.register_counter(&HISTORY_LOAD_FAILURES);

    collector.register_counter(&SESSION_RESTORES);
    collector.register_counter(&SESSION_RESETS);
}
