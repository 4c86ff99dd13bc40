use std::{process::ExitCode, sync::Arc};

use synthlog::{
    console, crash, schedule, shutdown_channel, Config, Emitter, FileSink, Generator, Sink,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("synthlog: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> synthlog::Result<()> {
    let config = Config::from_env()?;
    console::init(config.diagnostics)?;

    let sink = Arc::new(FileSink::open(config.sink_options())?);
    crash::install(sink.clone() as Arc<dyn Sink>, config.service.clone());

    let (handle, shutdown) = shutdown_channel();
    ctrlc::set_handler(move || handle.request())?;

    log::info!(
        "writing to {} every {:?}",
        sink.path().display(),
        config.interval
    );
    let generator = Generator::new(Emitter::new(sink, config.service));
    generator.run(schedule(config.interval), shutdown);
    Ok(())
}
