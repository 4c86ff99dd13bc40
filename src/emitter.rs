use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    catalog::random_message,
    level::Level,
    record::{ErrorDetail, LogRecord},
    sink::Sink,
};

/// Turns the iteration cursor into records and hands them to a sink.
pub struct Emitter<S, R = StdRng> {
    sink: S,
    rng: R,
    service: Option<String>,
    iteration: u64,
}

impl<S: Sink> Emitter<S> {
    /// An emitter seeded from the OS entropy source.
    pub fn new(sink: S, service: Option<String>) -> Self {
        Emitter::with_rng(sink, service, StdRng::from_entropy())
    }
}

impl<S: Sink, R: Rng> Emitter<S, R> {
    pub fn with_rng(sink: S, service: Option<String>, rng: R) -> Self {
        Emitter {
            sink,
            rng,
            service,
            iteration: 0,
        }
    }

    /// Emit the record for the current iteration, then advance the cursor.
    ///
    /// The level follows [`LEVEL_CYCLE`](crate::LEVEL_CYCLE), the message is drawn at random.
    /// Error records carry a synthesized [`ErrorDetail`] built from the message.
    pub fn emit_once(&mut self) {
        let level = Level::for_iteration(self.iteration);
        let message = random_message(&mut self.rng);
        let mut record = LogRecord::new(level, message)
            .with_service(self.service.clone())
            .with_iteration(self.iteration);
        if level == Level::Error {
            record = record.with_error(synthetic_error(message));
        }
        self.sink.write(&record);
        self.iteration += 1;
    }

    /// Iteration the next emission will use.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

fn synthetic_error(message: &str) -> ErrorDetail {
    ErrorDetail {
        message: message.to_string(),
        stack: format!(
            "Error: {}\n    at {}::Emitter::emit_once ({}:{})",
            message,
            module_path!(),
            file!(),
            line!()
        ),
        name: "Error".to_string(),
    }
}
