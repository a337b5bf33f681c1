use std::{env, io, process::ExitCode};

use predict::{backend::{self, InferenceBackend}, config::Settings, inference::BurnClassifier, labels::LabelMap, logging, pipeline, response};
use tracing::debug;

const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let settings = Settings::from_env();
    // Nothing is written to stderr unless PREDICT_LOG asks for it.
    logging::init(settings.log_level).ok();
    debug!("artifact directory {}", settings.artifact_dir.display());

    let model = match BurnClassifier::<InferenceBackend>::load(&settings, backend::default_device()) {
        Ok(model) => model,
        Err(err) => {
            eprintln!("predict: {err}");
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let labels = LabelMap::load(&settings.labels_path());

    let args: Vec<String> = env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let outcome = pipeline::predict(&model, &labels, &args, &mut rand::thread_rng());

    match response::emit(&mut io::stdout().lock(), &outcome) {
        Ok(status) => ExitCode::from(status),
        Err(_) => ExitCode::FAILURE,
    }
}
