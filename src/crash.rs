//! Records panics in the generated log before the process goes down.

use std::{
    backtrace::Backtrace,
    env,
    panic::{self, PanicHookInfo},
    process,
    sync::Arc,
    thread,
};

use crate::{
    file_sink::WRITER_THREAD,
    level::Level,
    record::{ErrorDetail, LogRecord, ProcessInfo},
    sink::Sink,
};

/// Install a panic hook appending an error record to `sink` for every panic, on any thread.
///
/// The previously installed hook still runs afterwards, so panics keep their usual outcome.
pub fn install(sink: Arc<dyn Sink>, service: Option<String>) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        // the writer cannot log its own failure
        if thread::current().name() != Some(WRITER_THREAD) {
            sink.write(&crash_record(info, service.clone()));
            sink.flush();
        }
        previous(info);
    }));
}

fn crash_record(info: &PanicHookInfo<'_>, service: Option<String>) -> LogRecord {
    let payload = payload_text(info);
    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "<unknown>".to_string());
    let stack = format!(
        "panic: {}\n    at {}\n{}",
        payload,
        location,
        Backtrace::force_capture()
    );
    let mut record = LogRecord::new(Level::Error, format!("uncaughtException: {}", payload))
        .with_service(service)
        .with_error(ErrorDetail {
            message: payload,
            stack,
            name: "panic".to_string(),
        });
    record.exception = true;
    record.date = Some(
        chrono::Local::now()
            .format("%a %b %d %Y %H:%M:%S GMT%z")
            .to_string(),
    );
    record.process = Some(process_info());
    record
}

fn process_info() -> ProcessInfo {
    ProcessInfo {
        pid: process::id(),
        cwd: env::current_dir()
            .map(|d| d.display().to_string())
            .unwrap_or_default(),
        argv: env::args_os()
            .map(|a| a.to_string_lossy().into_owned())
            .collect(),
    }
}

fn payload_text(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
