use std::process::ExitCode;

use phong_engine::app::{self, ViewerConfig};

fn main() -> ExitCode {
    let config = ViewerConfig::default().with_base_dir(env!("CARGO_MANIFEST_DIR"));

    match app::run(config) {
        Ok(report) => {
            log::info!("exiting after {} frames", report.frames);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("phong-viewer: {err:#}");
            ExitCode::FAILURE
        }
    }
}
