use std::process::ExitCode;

use particleflow::prelude::*;

const USAGE: &str = "usage: particleflow [PARTICLE_COUNT] [--wallpaper]";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = FlowConfig::default();
    let mut mode = RunMode::Windowed;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--wallpaper" => mode = RunMode::Wallpaper,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return ExitCode::SUCCESS;
            }
            count => match count.parse::<u32>() {
                Ok(count) => config = config.with_particle_count(count),
                Err(_) => {
                    eprintln!("{}", USAGE);
                    return ExitCode::FAILURE;
                }
            },
        }
    }

    match particleflow::run(config, mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
